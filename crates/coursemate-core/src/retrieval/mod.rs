//! Retrieval backend seam
//!
//! The vector store and course catalog are external collaborators. Tools
//! reach them only through [`CourseStore`]; [`InMemoryCourseStore`] is a
//! term-overlap implementation for tests and local runs.

mod memory;

pub use memory::{CourseChunk, InMemoryCourseStore};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the retrieval backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// A course filter did not resolve to any known course
    #[error("No course found matching '{0}'")]
    UnknownCourse(String),

    /// The similarity query itself failed
    #[error("{0}")]
    Query(String),

    /// The course catalog could not be read
    #[error("{0}")]
    Catalog(String),
}

/// A similarity search over course content
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchQuery {
    pub query: String,
    /// Fuzzy course name; resolved by the backend
    pub course_name: Option<String>,
    pub lesson_number: Option<u32>,
    /// Maximum hits; the backend default applies when absent
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn in_course(mut self, course_name: impl Into<String>) -> Self {
        self.course_name = Some(course_name.into());
        self
    }

    pub fn in_lesson(mut self, lesson_number: u32) -> Self {
        self.lesson_number = Some(lesson_number);
        self
    }
}

/// Metadata stored alongside each content chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub course_title: String,
    #[serde(default)]
    pub lesson_number: Option<u32>,
    #[serde(default)]
    pub chunk_index: Option<usize>,
}

/// Parallel arrays of hits, best first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Document/metadata pairs, in rank order
    pub fn hits(&self) -> impl Iterator<Item = (&String, &ChunkMetadata)> {
        self.documents.iter().zip(self.metadata.iter())
    }

    pub fn push(&mut self, document: impl Into<String>, metadata: ChunkMetadata, distance: f32) {
        self.documents.push(document.into());
        self.metadata.push(metadata);
        self.distances.push(distance);
    }
}

/// One lesson in a course outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonInfo {
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// Catalog entry for a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseMetadata {
    pub title: String,
    #[serde(default)]
    pub course_link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<LessonInfo>,
}

impl CourseMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            course_link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.course_link = Some(link.into());
        self
    }

    pub fn with_lesson(mut self, number: u32, title: impl Into<String>, link: Option<&str>) -> Self {
        self.lessons.push(LessonInfo {
            number,
            title: title.into(),
            link: link.map(str::to_string),
        });
        self
    }
}

/// Vector store plus course catalog, as consumed by the tools
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Similarity search with optional course and lesson filters
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, BackendError>;

    /// Link for a lesson, if the catalog has one
    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>, BackendError>;

    /// Resolve a fuzzy course name to its canonical title
    async fn resolve_course_name(&self, course_name: &str) -> Result<Option<String>, BackendError>;

    /// Catalog metadata for a canonical course title
    async fn course_metadata(&self, course_title: &str) -> Result<Option<CourseMetadata>, BackendError>;

    /// Titles of every course in the catalog
    async fn course_titles(&self) -> Result<Vec<String>, BackendError>;
}
