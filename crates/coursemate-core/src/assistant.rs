//! Course assistant facade
//!
//! Wires a completion engine, the course tools and the orchestrator into the
//! entry points callers use: [`CourseAssistant::run_query`] followed by
//! [`CourseAssistant::collect_and_reset_sources`], or the combined
//! [`CourseAssistant::query`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::{AssistantConfig, ConfigError};
use crate::logging::Logger;
use crate::orchestrator::{Orchestrator, QueryOutcome};
use crate::providers::{create_provider, Provider, ProviderError, ProviderResult};
use crate::retrieval::{BackendError, CourseStore};
use crate::tools::{CourseOutlineTool, CourseSearchTool, DefinitionError, ToolRegistry};
use crate::types::SourceRecord;

/// Errors surfaced by the assistant facade
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type AssistantResult<T> = Result<T, AssistantError>;

/// Catalog summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// One user/assistant exchange of prior conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

impl Exchange {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Render the last `max_exchanges` exchanges as prior-conversation text
pub fn format_history(exchanges: &[Exchange], max_exchanges: usize) -> Option<String> {
    let start = exchanges.len().saturating_sub(max_exchanges);
    let recent = &exchanges[start..];
    if recent.is_empty() {
        return None;
    }
    Some(
        recent
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.user, e.assistant))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Question answering over course material
pub struct CourseAssistant {
    orchestrator: Orchestrator,
    registry: ToolRegistry,
    store: Arc<dyn CourseStore>,
    max_history: usize,
    /// Serializes `query` so registry source slots never mix two queries
    query_lock: Mutex<()>,
    logger: Arc<dyn Logger>,
}

impl CourseAssistant {
    /// Build an assistant with default settings around an existing provider
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<dyn CourseStore>,
        logger: Arc<dyn Logger>,
    ) -> AssistantResult<Self> {
        Self::with_provider(&AssistantConfig::default(), provider, store, logger)
    }

    /// Build an assistant from configuration, creating the provider
    pub fn from_config(
        config: &AssistantConfig,
        store: Arc<dyn CourseStore>,
        logger: Arc<dyn Logger>,
    ) -> AssistantResult<Self> {
        config.validate()?;
        let provider = create_provider(config, logger.clone())?;
        Self::with_provider(config, provider, store, logger)
    }

    /// Build an assistant from configuration around an existing provider
    pub fn with_provider(
        config: &AssistantConfig,
        provider: Arc<dyn Provider>,
        store: Arc<dyn CourseStore>,
        logger: Arc<dyn Logger>,
    ) -> AssistantResult<Self> {
        config.validate()?;

        let registry = ToolRegistry::new(logger.clone());
        registry.register(Arc::new(
            CourseSearchTool::new(store.clone()).with_max_results(config.max_results),
        ))?;
        registry.register(Arc::new(CourseOutlineTool::new(store.clone())))?;

        let orchestrator = Orchestrator::new(provider, logger.clone())
            .with_options(config.temperature, config.max_tokens)
            .with_max_rounds(config.max_tool_rounds)
            .with_dispatch_mode(config.dispatch);

        logger.info(&format!(
            "[CourseAssistant] Ready: provider={}, model={}, tools={}",
            config.provider,
            config.model,
            registry.len()
        ));

        Ok(Self {
            orchestrator,
            registry,
            store,
            max_history: config.max_history,
            query_lock: Mutex::new(()),
            logger,
        })
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Answer a query. Sources from a successful query stay in the registry
    /// until [`collect_and_reset_sources`](Self::collect_and_reset_sources).
    ///
    /// Leftover sources are cleared before the query starts, and a failed
    /// query leaves none behind. Queries are serialized with [`ask`](Self::ask),
    /// but collecting happens outside that lock; callers that share the
    /// assistant across tasks should prefer [`query`](Self::query).
    pub async fn run_query(&self, query: &str, history: Option<&str>) -> ProviderResult<String> {
        let _guard = self.query_lock.lock().await;
        self.registry.reset_sources();

        match self.orchestrator.run(query, history, Some(&self.registry)).await {
            Ok(outcome) => Ok(outcome.answer),
            Err(e) => {
                self.registry.reset_sources();
                self.logger.error(&format!("[CourseAssistant] Query failed: {}", e));
                Err(e)
            }
        }
    }

    /// Sources from each tool's most recent dispatch, then clear them
    pub fn collect_and_reset_sources(&self) -> Vec<SourceRecord> {
        self.registry.take_sources()
    }

    /// Answer a query and return the full outcome.
    ///
    /// Registry sources are cleared afterwards whether or not the query
    /// succeeded.
    pub async fn ask(&self, query: &str, history: Option<&str>) -> ProviderResult<QueryOutcome> {
        let _guard = self.query_lock.lock().await;
        let result = self.orchestrator.run(query, history, Some(&self.registry)).await;
        self.registry.reset_sources();

        if let Err(e) = &result {
            self.logger.error(&format!("[CourseAssistant] Query failed: {}", e));
        }
        result
    }

    /// Answer a query with the sources it used
    pub async fn query(
        &self,
        query: &str,
        history: &[Exchange],
    ) -> AssistantResult<(String, Vec<SourceRecord>)> {
        let history = format_history(history, self.max_history);
        let outcome = self.ask(query, history.as_deref()).await?;
        Ok((outcome.answer, outcome.sources))
    }

    /// Number and titles of catalogued courses
    pub async fn course_analytics(&self) -> AssistantResult<CourseAnalytics> {
        let course_titles = self.store.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::orchestrator::DispatchMode;
    use crate::providers::{CompletionResponse, MockProvider};
    use crate::retrieval::{CourseChunk, CourseMetadata, InMemoryCourseStore};
    use crate::types::ToolCall;
    use serde_json::json;

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn store() -> Arc<InMemoryCourseStore> {
        let store = InMemoryCourseStore::new(5);
        store.add_course(
            CourseMetadata::new("X")
                .with_lesson(1, "Setup", Some("https://example.com/x/1"))
                .with_lesson(2, "Embeddings", Some("https://example.com/x/2")),
        );
        store.add_course(CourseMetadata::new("Y"));
        store.add_chunks(vec![
            CourseChunk::new("X", Some(1), "Install the SDK"),
            CourseChunk::new("X", Some(2), "Lesson two explains embeddings"),
        ]);
        Arc::new(store)
    }

    fn lesson_two_script() -> Vec<CompletionResponse> {
        vec![
            CompletionResponse::tool_calls(vec![ToolCall::new(
                "toolu_1",
                "search_course_content",
                json!({"query": "lesson two", "course_name": "X", "lesson_number": 2}),
            )]),
            CompletionResponse::text("Lesson 2 of X explains embeddings."),
        ]
    }

    fn assistant(responses: Vec<CompletionResponse>) -> CourseAssistant {
        let provider = Arc::new(MockProvider::scripted(responses, logger()));
        CourseAssistant::new(provider, store(), logger()).unwrap()
    }

    #[test]
    fn test_format_history_keeps_recent_exchanges() {
        let exchanges = vec![
            Exchange::new("first", "one"),
            Exchange::new("second", "two"),
            Exchange::new("third", "three"),
        ];
        assert_eq!(
            format_history(&exchanges, 2).unwrap(),
            "User: second\nAssistant: two\nUser: third\nAssistant: three"
        );
        assert_eq!(format_history(&exchanges, 0), None);
        assert_eq!(format_history(&[], 2), None);
    }

    #[test]
    fn test_tools_registered() {
        let assistant = assistant(vec![]);
        assert_eq!(
            assistant.registry().tool_names(),
            vec!["search_course_content", "get_course_outline"]
        );
    }

    #[tokio::test]
    async fn test_lesson_two_scenario() {
        let assistant = assistant(lesson_two_script());

        let answer = assistant.run_query("What is in lesson 2 of course X?", None).await.unwrap();
        assert_eq!(answer, "Lesson 2 of X explains embeddings.");

        let sources = assistant.collect_and_reset_sources();
        assert_eq!(
            sources,
            vec![SourceRecord::new("X - Lesson 2").with_link("https://example.com/x/2")]
        );
        assert!(assistant.collect_and_reset_sources().is_empty());
    }

    #[tokio::test]
    async fn test_query_returns_sources_and_resets() {
        let assistant = assistant(lesson_two_script());

        let (answer, sources) = assistant.query("What is in lesson 2 of course X?", &[]).await.unwrap();
        assert_eq!(answer, "Lesson 2 of X explains embeddings.");
        assert_eq!(sources.len(), 1);
        assert!(assistant.collect_and_reset_sources().is_empty());
    }

    #[tokio::test]
    async fn test_query_resets_sources_on_failure() {
        // Script ends after the tool request, so the synthesis call fails.
        let mut script = lesson_two_script();
        script.pop();
        let assistant = assistant(script);

        let err = assistant.query("q", &[]).await.unwrap_err();
        assert!(matches!(err, AssistantError::Provider(_)));
        assert!(assistant.collect_and_reset_sources().is_empty());
    }

    #[tokio::test]
    async fn test_run_query_failure_leaves_no_sources() {
        let mut script = lesson_two_script();
        script.pop();
        let assistant = assistant(script);

        assert!(assistant.run_query("q", None).await.is_err());
        assert!(assistant.collect_and_reset_sources().is_empty());
    }

    #[tokio::test]
    async fn test_run_query_clears_uncollected_sources() {
        let mut script = lesson_two_script();
        script.push(CompletionResponse::text("Nothing to look up."));
        let assistant = assistant(script);

        assistant.run_query("lesson two", None).await.unwrap();
        // first query's sources are never collected
        let answer = assistant.run_query("hello", None).await.unwrap();

        assert_eq!(answer, "Nothing to look up.");
        assert!(assistant.collect_and_reset_sources().is_empty());
    }

    #[tokio::test]
    async fn test_query_folds_history() {
        let provider = Arc::new(MockProvider::fixed("ok", logger()));
        let assistant = CourseAssistant::new(provider.clone(), store(), logger()).unwrap();

        assistant
            .query("follow-up", &[Exchange::new("hi", "hello")])
            .await
            .unwrap();

        let system = &provider.requests()[0].system;
        assert!(system.ends_with("Previous conversation:\nUser: hi\nAssistant: hello"));
    }

    #[tokio::test]
    async fn test_concurrent_queries_are_serialized() {
        let provider = Arc::new(MockProvider::fixed("ok", logger()));
        let assistant = Arc::new(CourseAssistant::new(provider.clone(), store(), logger()).unwrap());

        let (a, b) = tokio::join!(assistant.query("one", &[]), assistant.query("two", &[]));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_course_analytics() {
        let analytics = assistant(vec![]).course_analytics().await.unwrap();
        assert_eq!(analytics.total_courses, 2);
        assert_eq!(analytics.course_titles, vec!["X", "Y"]);
    }

    #[test]
    fn test_from_config() {
        let config = AssistantConfig {
            provider: "mock".to_string(),
            max_tool_rounds: 3,
            dispatch: DispatchMode::Concurrent,
            ..Default::default()
        };
        let assistant = CourseAssistant::from_config(&config, store(), logger()).unwrap();
        assert_eq!(assistant.orchestrator().max_rounds(), 3);
        assert_eq!(assistant.orchestrator().dispatch_mode(), DispatchMode::Concurrent);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = AssistantConfig {
            provider: "mock".to_string(),
            max_results: 0,
            ..Default::default()
        };
        let result = CourseAssistant::from_config(&config, store(), logger());
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }
}
