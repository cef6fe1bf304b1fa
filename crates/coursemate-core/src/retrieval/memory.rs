//! In-memory course store
//!
//! Ranks chunks by the fraction of query terms they contain. Distances are
//! `1 - overlap`, so lower is better, like a cosine distance.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{BackendError, ChunkMetadata, CourseMetadata, CourseStore, SearchQuery, SearchResults};

/// A chunk of course text with its position in the course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    pub content: String,
    pub course_title: String,
    #[serde(default)]
    pub lesson_number: Option<u32>,
    pub chunk_index: usize,
}

impl CourseChunk {
    pub fn new(course_title: impl Into<String>, lesson_number: Option<u32>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            course_title: course_title.into(),
            lesson_number,
            chunk_index: 0,
        }
    }
}

/// Course store held entirely in memory
pub struct InMemoryCourseStore {
    courses: RwLock<Vec<CourseMetadata>>,
    chunks: RwLock<Vec<CourseChunk>>,
    max_results: usize,
}

impl Default for InMemoryCourseStore {
    fn default() -> Self {
        Self::new(5)
    }
}

impl InMemoryCourseStore {
    pub fn new(max_results: usize) -> Self {
        Self {
            courses: RwLock::new(Vec::new()),
            chunks: RwLock::new(Vec::new()),
            max_results: max_results.max(1),
        }
    }

    /// Add or replace catalog metadata for a course
    pub fn add_course(&self, course: CourseMetadata) {
        let mut courses = self.courses.write();
        match courses.iter_mut().find(|c| c.title == course.title) {
            Some(existing) => *existing = course,
            None => courses.push(course),
        }
    }

    /// Append chunks; chunk indices are assigned per course in insertion order
    pub fn add_chunks(&self, chunks: impl IntoIterator<Item = CourseChunk>) {
        let mut stored = self.chunks.write();
        for mut chunk in chunks {
            chunk.chunk_index = stored.iter().filter(|c| c.course_title == chunk.course_title).count();
            stored.push(chunk);
        }
    }

    pub fn course_count(&self) -> usize {
        self.courses.read().len()
    }

    pub fn clear(&self) {
        self.courses.write().clear();
        self.chunks.write().clear();
    }

    fn terms(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    fn overlap(query_terms: &HashSet<String>, text: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let text_terms = Self::terms(text);
        let matched = query_terms.iter().filter(|t| text_terms.contains(*t)).count();
        matched as f32 / query_terms.len() as f32
    }

    fn resolve(&self, course_name: &str) -> Option<String> {
        let wanted = course_name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        let courses = self.courses.read();

        if let Some(course) = courses.iter().find(|c| c.title.to_lowercase() == wanted) {
            return Some(course.title.clone());
        }
        if let Some(course) = courses.iter().find(|c| {
            let title = c.title.to_lowercase();
            title.contains(&wanted) || wanted.contains(&title)
        }) {
            return Some(course.title.clone());
        }

        let wanted_terms = Self::terms(&wanted);
        courses
            .iter()
            .map(|c| (Self::overlap(&wanted_terms, &c.title), c))
            .filter(|(score, _)| *score > 0.0)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, c)| c.title.clone())
    }
}

#[async_trait]
impl CourseStore for InMemoryCourseStore {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, BackendError> {
        let course_title = match &query.course_name {
            Some(name) => Some(self.resolve(name).ok_or_else(|| BackendError::UnknownCourse(name.clone()))?),
            None => None,
        };

        let query_terms = Self::terms(&query.query);
        let chunks = self.chunks.read();
        let mut scored: Vec<(f32, &CourseChunk)> = chunks
            .iter()
            .filter(|c| course_title.as_ref().map_or(true, |t| &c.course_title == t))
            .filter(|c| query.lesson_number.map_or(true, |n| c.lesson_number == Some(n)))
            .map(|c| (Self::overlap(&query_terms, &c.content), c))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let limit = query.limit.unwrap_or(self.max_results);
        let mut results = SearchResults::empty();
        for (score, chunk) in scored.into_iter().take(limit) {
            results.push(
                chunk.content.clone(),
                ChunkMetadata {
                    course_title: chunk.course_title.clone(),
                    lesson_number: chunk.lesson_number,
                    chunk_index: Some(chunk.chunk_index),
                },
                1.0 - score,
            );
        }
        Ok(results)
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>, BackendError> {
        Ok(self
            .courses
            .read()
            .iter()
            .find(|c| c.title == course_title)
            .and_then(|c| c.lessons.iter().find(|l| l.number == lesson_number))
            .and_then(|l| l.link.clone()))
    }

    async fn resolve_course_name(&self, course_name: &str) -> Result<Option<String>, BackendError> {
        Ok(self.resolve(course_name))
    }

    async fn course_metadata(&self, course_title: &str) -> Result<Option<CourseMetadata>, BackendError> {
        Ok(self.courses.read().iter().find(|c| c.title == course_title).cloned())
    }

    async fn course_titles(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.courses.read().iter().map(|c| c.title.clone()).collect())
    }
}
