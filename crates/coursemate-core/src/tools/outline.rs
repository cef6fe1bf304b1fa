//! Course outline tool

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_arguments, Tool, ToolError, ToolOutput};
use crate::retrieval::{CourseMetadata, CourseStore};
use crate::types::{InputSchema, ToolDefinition};

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize)]
struct OutlineArgs {
    course_name: String,
}

/// Returns a course's title, link and numbered lesson list. Produces no
/// sources.
pub struct CourseOutlineTool {
    store: Arc<dyn CourseStore>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }

    fn format_outline(course: &CourseMetadata) -> String {
        let mut lines = vec![format!("Course: {}", course.title)];
        if let Some(link) = &course.course_link {
            lines.push(format!("Course Link: {}", link));
        }
        lines.push(format!("Total Lessons: {}", course.lessons.len()));
        lines.push(String::new());
        lines.push("Lessons:".to_string());

        let mut lessons: Vec<_> = course.lessons.iter().collect();
        lessons.sort_by_key(|l| l.number);
        lines.extend(lessons.iter().map(|l| format!("Lesson {}: {}", l.number, l.title)));

        lines.join("\n")
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            OUTLINE_TOOL_NAME,
            "Get the complete outline of a course: its title, link and every lesson with its number",
        )
        .with_schema(InputSchema::new().required_property(
            "course_name",
            "string",
            "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
        ))
    }

    async fn execute(&self, arguments: &Value) -> Result<ToolOutput, ToolError> {
        let args: OutlineArgs = parse_arguments(arguments)?;

        let title = match self.store.resolve_course_name(&args.course_name).await {
            Ok(Some(title)) => title,
            Ok(None) => {
                return Ok(ToolOutput::text(format!(
                    "No course found matching '{}'",
                    args.course_name
                )))
            }
            Err(e) => return Ok(ToolOutput::text(format!("Error retrieving course outline: {}", e))),
        };

        match self.store.course_metadata(&title).await {
            Ok(Some(course)) => Ok(ToolOutput::text(Self::format_outline(&course))),
            Ok(None) => Ok(ToolOutput::text(format!("No metadata found for course '{}'", title))),
            Err(e) => Ok(ToolOutput::text(format!("Error retrieving course outline: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{BackendError, InMemoryCourseStore, SearchQuery, SearchResults};
    use serde_json::json;

    fn store() -> Arc<InMemoryCourseStore> {
        let store = InMemoryCourseStore::new(5);
        store.add_course(CourseMetadata {
            instructor: Some("Ada Lovelace".to_string()),
            ..CourseMetadata::new("Building MCP Servers")
                .with_link("https://example.com/mcp")
                .with_lesson(2, "Tools", None)
                .with_lesson(1, "Getting Started", None)
        });
        Arc::new(store)
    }

    /// Resolves every name but has no metadata, or fails on resolve
    struct PartialStore {
        fail: bool,
    }

    #[async_trait]
    impl CourseStore for PartialStore {
        async fn search(&self, _query: &SearchQuery) -> Result<SearchResults, BackendError> {
            Ok(SearchResults::empty())
        }

        async fn lesson_link(&self, _course_title: &str, _lesson_number: u32) -> Result<Option<String>, BackendError> {
            Ok(None)
        }

        async fn resolve_course_name(&self, course_name: &str) -> Result<Option<String>, BackendError> {
            if self.fail {
                Err(BackendError::Catalog("catalog offline".to_string()))
            } else {
                Ok(Some(course_name.to_string()))
            }
        }

        async fn course_metadata(&self, _course_title: &str) -> Result<Option<CourseMetadata>, BackendError> {
            Ok(None)
        }

        async fn course_titles(&self) -> Result<Vec<String>, BackendError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_outline_format() {
        let tool = CourseOutlineTool::new(store());
        let output = tool.execute(&json!({"course_name": "MCP"})).await.unwrap();

        assert_eq!(
            output.text,
            "Course: Building MCP Servers\n\
             Course Link: https://example.com/mcp\n\
             Total Lessons: 2\n\
             \n\
             Lessons:\n\
             Lesson 1: Getting Started\n\
             Lesson 2: Tools"
        );
        assert!(!output.text.contains("Ada Lovelace"));
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_course() {
        let tool = CourseOutlineTool::new(store());
        let output = tool.execute(&json!({"course_name": "Astrophysics"})).await.unwrap();
        assert_eq!(output.text, "No course found matching 'Astrophysics'");
    }

    #[tokio::test]
    async fn test_missing_metadata() {
        let tool = CourseOutlineTool::new(Arc::new(PartialStore { fail: false }));
        let output = tool.execute(&json!({"course_name": "Ghost Course"})).await.unwrap();
        assert_eq!(output.text, "No metadata found for course 'Ghost Course'");
    }

    #[tokio::test]
    async fn test_catalog_failure() {
        let tool = CourseOutlineTool::new(Arc::new(PartialStore { fail: true }));
        let output = tool.execute(&json!({"course_name": "MCP"})).await.unwrap();
        assert_eq!(output.text, "Error retrieving course outline: catalog offline");
    }

    #[tokio::test]
    async fn test_requires_course_name() {
        let tool = CourseOutlineTool::new(store());
        assert_eq!(tool.definition().input_schema.required, vec!["course_name"]);
        assert!(tool.execute(&json!({})).await.is_err());
    }
}
