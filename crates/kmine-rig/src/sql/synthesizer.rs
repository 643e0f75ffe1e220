//! Natural-language to T-SQL generation.

use std::sync::Arc;

use kmine_azure::{ChatCompletionRequest, ChatMessage};

use crate::resolver::ClientResolver;
use crate::{ChatWithDataConfig, Error, Result, TRACING_TARGET_SQL};

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Builds the generation prompt for a question.
///
/// Names the two queryable tables and their columns, and asks for nothing
/// but the query.
pub fn sql_prompt(question: &str) -> String {
    format!(
        "A valid T-SQL query to find {question} for tables and columns provided below:
                1. Table: km_processed_data
                Columns: ConversationId,EndTime,StartTime,Content,summary,satisfied,sentiment,topic,keyphrases,complaint
                2. Table: processed_data_key_phrases
                Columns: ConversationId,key_phrase,sentiment
                Use ConversationId as the primary key as the primary key in tables for queries but not for any other operations.
                Only return the generated sql query. do not return anything else."
    )
}

/// Removes markdown code fences: every "```sql" first, then every "```".
///
/// Surrounding whitespace and newlines are kept as they are.
pub fn strip_sql_fences(text: &str) -> String {
    text.replace("```sql", "").replace("```", "")
}

/// Turns a question into SQL text with the resolved completion client.
///
/// The output is not validated; commentary or multiple statements from the
/// model are passed through.
#[derive(Clone)]
pub struct SqlSynthesizer {
    config: Arc<ChatWithDataConfig>,
    resolver: Arc<dyn ClientResolver>,
}

impl SqlSynthesizer {
    /// Creates a synthesizer.
    pub fn new(config: Arc<ChatWithDataConfig>, resolver: Arc<dyn ClientResolver>) -> Self {
        Self { config, resolver }
    }

    /// Generates a query for the question.
    pub async fn synthesize(&self, question: &str) -> Result<String> {
        let client = self.resolver.resolve().await?;

        let request = ChatCompletionRequest::builder()
            .with_model(self.config.model())
            .with_messages(vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(sql_prompt(question)),
            ])
            .with_temperature(0.0_f32)
            .build()?;

        let completion = client.complete(&request).await?;
        let raw = completion
            .into_first_choice()
            .ok_or_else(|| Error::empty_response(client.provider_name()))?
            .message
            .content
            .unwrap_or_default();

        let sql = strip_sql_fences(&raw);
        tracing::debug!(
            target: TRACING_TARGET_SQL,
            provider = client.provider_name(),
            sql_len = sql.len(),
            "Synthesized SQL query"
        );
        Ok(sql)
    }
}

impl std::fmt::Debug for SqlSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlSynthesizer")
            .field("model", &self.config.model())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use kmine_azure::Role;

    use super::*;
    use crate::mock::{StubClient, StubResolver};

    #[test]
    fn prompt_names_tables_and_question() {
        let prompt = sql_prompt("the number of calls per topic");
        assert!(prompt.starts_with("A valid T-SQL query to find the number of calls per topic"));
        assert!(prompt.contains("Table: km_processed_data"));
        assert!(prompt.contains(
            "ConversationId,EndTime,StartTime,Content,summary,satisfied,sentiment,topic,keyphrases,complaint"
        ));
        assert!(prompt.contains("Table: processed_data_key_phrases"));
        assert!(prompt.contains("ConversationId,key_phrase,sentiment"));
        assert!(prompt.contains("Only return the generated sql query."));
    }

    #[test]
    fn prompt_body_lines_are_indented_sixteen_spaces() {
        let prompt = sql_prompt("q");
        let lines: Vec<_> = prompt.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "                1. Table: km_processed_data");
        assert!(lines[1..].iter().all(|line| line.starts_with(&" ".repeat(16))
            && !line.starts_with(&" ".repeat(17))));
        assert!(prompt.ends_with("do not return anything else."));
    }

    #[test]
    fn strips_fences_and_keeps_newlines() {
        assert_eq!(
            strip_sql_fences("```sql\nSELECT COUNT(*) FROM km_processed_data\n```"),
            "\nSELECT COUNT(*) FROM km_processed_data\n"
        );
        assert_eq!(strip_sql_fences("```\nSELECT 1\n```"), "\nSELECT 1\n");
        assert_eq!(strip_sql_fences("SELECT 1"), "SELECT 1");
        assert_eq!(strip_sql_fences("a```sql```b```"), "ab");
    }

    #[test]
    fn stripped_output_never_contains_fences() {
        for raw in ["``````sql", "```sql```sql```", "`````", "x```sq```sqll"] {
            assert!(!strip_sql_fences(raw).contains("```"), "{raw:?}");
        }
    }

    #[tokio::test]
    async fn synthesize_sends_zero_temperature_request() {
        let client = StubClient::text("```sql\nSELECT COUNT(*) FROM km_processed_data\n```");
        let resolver = StubResolver::new(client.clone());
        let config = Arc::new(ChatWithDataConfig::new("https://r", "gpt-4o-mini", "k"));

        let sql = SqlSynthesizer::new(config, Arc::new(resolver.clone()))
            .synthesize("total calls")
            .await
            .unwrap();
        assert_eq!(sql, "\nSELECT COUNT(*) FROM km_processed_data\n");

        let request = client.last_request().unwrap();
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, "You are a helpful assistant.");
        assert!(request.messages[1].content.contains("total calls"));
        assert_eq!(resolver.resolve_calls(), 1);
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let client = StubClient::empty();
        let config = Arc::new(ChatWithDataConfig::new("https://r", "m", "k"));
        let err = SqlSynthesizer::new(config, Arc::new(StubResolver::new(client)))
            .synthesize("q")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyResponse(_)));
    }
}
