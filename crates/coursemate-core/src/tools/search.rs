//! Course content search tool

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{lenient_u32, parse_arguments, Tool, ToolError, ToolOutput};
use crate::retrieval::{ChunkMetadata, CourseStore, SearchQuery, SearchResults};
use crate::types::{InputSchema, SourceRecord, ToolDefinition};

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    lesson_number: Option<u32>,
}

/// Similarity search over course content, with optional course and lesson
/// filters. Every hit yields one source record.
pub struct CourseSearchTool {
    store: Arc<dyn CourseStore>,
    max_results: Option<usize>,
}

impl CourseSearchTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self {
            store,
            max_results: None,
        }
    }

    /// Cap the number of hits per search
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    fn no_results_message(args: &SearchArgs) -> String {
        let mut message = String::from("No relevant content found");
        if let Some(course) = &args.course_name {
            message.push_str(&format!(" in course '{}'", course));
        }
        if let Some(lesson) = args.lesson_number {
            message.push_str(&format!(" in lesson {}", lesson));
        }
        message.push('.');
        message
    }

    fn label(meta: &ChunkMetadata) -> String {
        match meta.lesson_number {
            Some(n) => format!("{} - Lesson {}", meta.course_title, n),
            None => meta.course_title.clone(),
        }
    }

    async fn source_for(&self, meta: &ChunkMetadata) -> SourceRecord {
        let record = SourceRecord::new(Self::label(meta));
        let Some(lesson) = meta.lesson_number else {
            return record;
        };
        // A missing link never fails the search.
        match self.store.lesson_link(&meta.course_title, lesson).await {
            Ok(Some(link)) => record.with_link(link),
            _ => record,
        }
    }

    async fn format_results(&self, results: &SearchResults) -> ToolOutput {
        let mut blocks = Vec::with_capacity(results.len());
        let mut sources = Vec::with_capacity(results.len());

        for (document, meta) in results.hits() {
            blocks.push(format!("[{}]\n{}", Self::label(meta), document));
            sources.push(self.source_for(meta).await);
        }

        ToolOutput::with_sources(blocks.join("\n\n"), sources)
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            SEARCH_TOOL_NAME,
            "Search course materials with smart course name matching and lesson filtering",
        )
        .with_schema(
            InputSchema::new()
                .required_property("query", "string", "What to search for in the course content")
                .property(
                    "course_name",
                    "string",
                    "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
                )
                .property(
                    "lesson_number",
                    "integer",
                    "Specific lesson number to search within (e.g. 1, 2, 3)",
                ),
        )
    }

    async fn execute(&self, arguments: &Value) -> Result<ToolOutput, ToolError> {
        let args: SearchArgs = parse_arguments(arguments)?;

        let query = SearchQuery {
            query: args.query.clone(),
            course_name: args.course_name.clone(),
            lesson_number: args.lesson_number,
            limit: self.max_results,
        };

        // Backend failures are reported to the engine as text.
        let results = match self.store.search(&query).await {
            Ok(results) => results,
            Err(e) => return Ok(ToolOutput::text(format!("Search error: {}", e))),
        };

        if results.is_empty() {
            return Ok(ToolOutput::text(Self::no_results_message(&args)));
        }

        Ok(self.format_results(&results).await)
    }
}
