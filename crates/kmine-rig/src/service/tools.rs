//! The tool set built from one configuration.

use std::sync::Arc;

use super::ChatWithDataConfig;
use crate::resolver::{AzureClientResolver, ClientResolver};
use crate::router::{FunctionRouter, RoutedAnswer};
use crate::sql::{SqlExecutor, SqlSynthesizer};
use crate::tool::{
    Answer, GreetingTool, StructuredDataTool, ToolKind, ToolRegistry, ToolSpec,
    UnstructuredDataTool,
};
use crate::TRACING_TARGET;

/// The three chat-with-data tools and the router over them.
///
/// Cheap to clone; every tool shares the same read-only configuration.
#[derive(Debug, Clone)]
pub struct ChatWithDataTools {
    router: FunctionRouter,
}

impl ChatWithDataTools {
    /// Builds the tools against Azure with the default credential chain.
    ///
    /// Invalid settings do not prevent construction: they surface when a tool
    /// resolves its client and become that tool's answer.
    pub fn new(config: ChatWithDataConfig, executor: Arc<dyn SqlExecutor>) -> Self {
        let config = Arc::new(config);
        let resolver = Arc::new(AzureClientResolver::new(config.clone()));
        Self::with_resolver(config, resolver, executor)
    }

    /// Builds the tools with a caller-provided client resolver.
    pub fn with_resolver(
        config: Arc<ChatWithDataConfig>,
        resolver: Arc<dyn ClientResolver>,
        executor: Arc<dyn SqlExecutor>,
    ) -> Self {
        if let Err(err) = config.validate() {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %err,
                "Configuration is incomplete, affected tools will answer with the error"
            );
        }

        tracing::info!(
            target: TRACING_TARGET,
            model = config.model(),
            project_client = config.use_ai_project_client,
            search_index = %config.azure_ai_search_index,
            "Building chat-with-data tools"
        );

        let registry = ToolRegistry::new(
            GreetingTool::new(config.clone(), resolver.clone()),
            StructuredDataTool::new(
                SqlSynthesizer::new(config.clone(), resolver.clone()),
                executor,
            ),
            UnstructuredDataTool::new(config.clone(), resolver.clone()),
        );
        let router = FunctionRouter::new(config, resolver, registry);
        Self { router }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &ToolRegistry {
        self.router.registry()
    }

    /// Returns the registration entries.
    pub fn specs(&self) -> &'static [ToolSpec] {
        self.registry().specs()
    }

    /// Runs the tool with this exact name; `None` if no such tool exists.
    pub async fn invoke(&self, name: &str, question: &str) -> Option<Answer> {
        self.registry().invoke(name, question).await
    }

    /// Runs a tool by kind.
    pub async fn dispatch(&self, kind: ToolKind, question: &str) -> Answer {
        self.registry().dispatch(kind, question).await
    }

    /// Lets the model pick the tool for the question.
    pub async fn route(&self, question: &str) -> RoutedAnswer {
        self.router.route(question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{StubClient, StubExecutor, StubResolver, test_config};
    use crate::sql::DryRunExecutor;
    use crate::tool::FALLBACK_ANSWER;

    fn project_mode_without_connection_string() -> ChatWithDataTools {
        let mut config = test_config();
        config.use_ai_project_client = true;
        ChatWithDataTools::new(config, Arc::new(DryRunExecutor))
    }

    #[tokio::test]
    async fn missing_connection_string_becomes_greeting_error_text() {
        let tools = project_mode_without_connection_string();
        let answer = tools.dispatch(ToolKind::Greeting, "Hello").await;
        assert_eq!(
            answer.as_text(),
            Some("configuration error: AZURE_AI_PROJECT_CONN_STRING is required for the project client")
        );

        let answer = tools.dispatch(ToolKind::ChatWithSqlDatabase, "count").await;
        assert!(answer.content().contains("AZURE_AI_PROJECT_CONN_STRING"));
    }

    #[tokio::test]
    async fn transcript_tool_ignores_project_settings() {
        let mut config = test_config();
        config.use_ai_project_client = true;
        let client = StubClient::text("grounded");
        let resolver = StubResolver::new(client.clone());

        let tools = ChatWithDataTools::with_resolver(
            Arc::new(config),
            Arc::new(resolver.clone()),
            Arc::new(StubExecutor::echo()),
        );

        let answer = tools.dispatch(ToolKind::ChatWithCallTranscripts, "why?").await;
        assert_eq!(answer.content(), "grounded");
        assert_ne!(answer.as_text(), Some(FALLBACK_ANSWER));
        assert_eq!(resolver.resolve_direct_calls(), 1);
    }

    #[tokio::test]
    async fn tools_can_run_concurrently() {
        let tools = ChatWithDataTools::with_resolver(
            Arc::new(test_config()),
            Arc::new(StubResolver::new(StubClient::text("answer"))),
            Arc::new(StubExecutor::echo()),
        );

        let handles: Vec<_> = ["Greeting", "ChatWithSQLDatabase", "ChatWithCallTranscripts"]
            .into_iter()
            .map(|name| {
                let tools = tools.clone();
                tokio::spawn(async move { tools.invoke(name, "q").await })
            })
            .collect();

        for handle in handles {
            let answer = handle.await.unwrap().unwrap();
            assert_eq!(answer.content(), "answer");
        }
    }
}
