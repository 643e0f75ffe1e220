//! Registration table of the chat-with-data tools.

use std::sync::Arc;

use kmine_azure::chat::FunctionTool;
use serde::Serialize;
use serde_json::{Value, json};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use super::{Answer, GreetingTool, StructuredDataTool, UnstructuredDataTool};
use crate::TRACING_TARGET_TOOL;

/// Description of the single tool parameter.
pub const PARAMETER_DOC: &str = "the question";

/// Name of the single tool parameter.
pub const PARAMETER_NAME: &str = "input";

/// The registered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString)]
pub enum ToolKind {
    /// Greetings and general questions.
    Greeting,
    /// Quantified results from the relational database.
    #[serde(rename = "ChatWithSQLDatabase")]
    #[strum(serialize = "ChatWithSQLDatabase")]
    ChatWithSqlDatabase,
    /// Summaries and explanations from the transcript index.
    ChatWithCallTranscripts,
}

impl ToolKind {
    /// Returns the static registration entry of this tool.
    pub fn spec(self) -> &'static ToolSpec {
        match self {
            Self::Greeting => &TOOL_SPECS[0],
            Self::ChatWithSqlDatabase => &TOOL_SPECS[1],
            Self::ChatWithCallTranscripts => &TOOL_SPECS[2],
        }
    }

    /// Looks a tool up by its exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

/// Discovery metadata of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    /// Tool kind.
    pub kind: ToolKind,
    /// Name as exposed to callers.
    pub name: &'static str,
    /// What the tool is for.
    pub description: &'static str,
    /// Documentation of the question parameter.
    pub parameter: &'static str,
}

impl ToolSpec {
    /// JSON schema of the tool arguments.
    pub fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                PARAMETER_NAME: {
                    "type": "string",
                    "description": self.parameter
                }
            },
            "required": [PARAMETER_NAME]
        })
    }

    /// Function-calling declaration of the tool.
    pub fn function_tool(&self) -> FunctionTool {
        FunctionTool::new(self.name, self.description, self.parameters_schema())
    }
}

/// Registration table, in dispatch order.
pub static TOOL_SPECS: [ToolSpec; 3] = [
    ToolSpec {
        kind: ToolKind::Greeting,
        name: GreetingTool::NAME,
        description: "Respond to any greeting or general questions",
        parameter: PARAMETER_DOC,
    },
    ToolSpec {
        kind: ToolKind::ChatWithSqlDatabase,
        name: StructuredDataTool::NAME,
        description: "Provides quantified results from the database.",
        parameter: PARAMETER_DOC,
    },
    ToolSpec {
        kind: ToolKind::ChatWithCallTranscripts,
        name: UnstructuredDataTool::NAME,
        description: "Provides summaries or detailed explanations from the search index.",
        parameter: PARAMETER_DOC,
    },
];

/// The three tools with name-based dispatch.
#[derive(Clone)]
pub struct ToolRegistry {
    greeting: Arc<GreetingTool>,
    structured: Arc<StructuredDataTool>,
    unstructured: Arc<UnstructuredDataTool>,
}

impl ToolRegistry {
    /// Creates a registry from the three tools.
    pub fn new(
        greeting: GreetingTool,
        structured: StructuredDataTool,
        unstructured: UnstructuredDataTool,
    ) -> Self {
        Self {
            greeting: Arc::new(greeting),
            structured: Arc::new(structured),
            unstructured: Arc::new(unstructured),
        }
    }

    /// Returns the registration entries.
    pub fn specs(&self) -> &'static [ToolSpec] {
        &TOOL_SPECS
    }

    /// Returns the function-calling declarations of all tools.
    pub fn function_tools(&self) -> Vec<FunctionTool> {
        ToolKind::iter().map(|kind| kind.spec().function_tool()).collect()
    }

    /// Returns whether a tool with this exact name exists.
    pub fn has_tool(&self, name: &str) -> bool {
        ToolKind::from_name(name).is_some()
    }

    /// Returns the greeting tool.
    pub fn greeting(&self) -> &Arc<GreetingTool> {
        &self.greeting
    }

    /// Returns the structured-data tool.
    pub fn structured(&self) -> &Arc<StructuredDataTool> {
        &self.structured
    }

    /// Returns the unstructured-data tool.
    pub fn unstructured(&self) -> &Arc<UnstructuredDataTool> {
        &self.unstructured
    }

    /// Runs a tool.
    pub async fn dispatch(&self, kind: ToolKind, question: &str) -> Answer {
        tracing::debug!(target: TRACING_TARGET_TOOL, tool = %kind, "Dispatching tool");
        match kind {
            ToolKind::Greeting => Answer::Text(self.greeting.answer(question).await),
            ToolKind::ChatWithSqlDatabase => Answer::Text(self.structured.answer(question).await),
            ToolKind::ChatWithCallTranscripts => self.unstructured.answer(question).await,
        }
    }

    /// Runs the tool with this exact name; `None` if no such tool exists.
    pub async fn invoke(&self, name: &str, question: &str) -> Option<Answer> {
        let kind = ToolKind::from_name(name)?;
        Some(self.dispatch(kind, question).await)
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        TOOL_SPECS.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        TOOL_SPECS.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field(
                "tools",
                &TOOL_SPECS.iter().map(|spec| spec.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{StubClient, StubExecutor, StubResolver, registry_with};

    #[test]
    fn table_matches_kinds() {
        for kind in ToolKind::iter() {
            let spec = kind.spec();
            assert_eq!(spec.kind, kind);
            assert_eq!(spec.name, kind.as_ref());
            assert_eq!(ToolKind::from_name(spec.name), Some(kind));
        }
    }

    #[test]
    fn names_and_descriptions() {
        let names: Vec<_> = TOOL_SPECS.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["Greeting", "ChatWithSQLDatabase", "ChatWithCallTranscripts"]
        );
        assert_eq!(
            ToolKind::ChatWithSqlDatabase.spec().description,
            "Provides quantified results from the database."
        );
        assert!(TOOL_SPECS.iter().all(|s| s.parameter == "the question"));
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(ToolKind::from_name("greeting"), None);
        assert_eq!(ToolKind::from_name("ChatWithSqlDatabase"), None);
        assert_eq!(ToolKind::from_name(""), None);
    }

    #[test]
    fn function_tools_declare_question_parameter() {
        let registry = registry_with(StubResolver::new(StubClient::text("x")), StubExecutor::echo());
        let tools = registry.function_tools();
        assert_eq!(tools.len(), 3);
        assert_eq!(tools[0].function.name, "Greeting");
        assert_eq!(
            tools[1].function.parameters["properties"]["input"]["description"],
            "the question"
        );
        assert_eq!(tools[2].function.parameters["required"][0], "input");
    }

    #[tokio::test]
    async fn invoke_dispatches_by_name() {
        let registry = registry_with(
            StubResolver::new(StubClient::text("Hi there!")),
            StubExecutor::echo(),
        );
        let answer = registry.invoke("Greeting", "Hello").await.unwrap();
        assert_eq!(answer, Answer::Text("Hi there!".into()));

        let answer = registry.invoke("ChatWithSQLDatabase", "count").await.unwrap();
        assert_eq!(answer.as_text(), Some("Hi there!"));
    }

    #[tokio::test]
    async fn invoke_unknown_name_is_none() {
        let registry = registry_with(StubResolver::new(StubClient::text("x")), StubExecutor::echo());
        assert!(registry.invoke("DropTables", "q").await.is_none());
        assert!(!registry.has_tool("DropTables"));
        assert_eq!(registry.len(), 3);
    }
}
