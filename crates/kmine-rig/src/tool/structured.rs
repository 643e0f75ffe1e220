//! Quantitative questions answered from the relational database.

use std::sync::Arc;

use super::{answer_or_error_text, truncate_chars};
use crate::sql::{SqlExecutor, SqlSynthesizer};
use crate::{Result, TRACING_TARGET_TOOL};

/// Longest result text returned, in characters.
pub const MAX_RESULT_CHARS: usize = 20_000;

/// Generates SQL for the question, runs it, and returns the result text.
#[derive(Clone)]
pub struct StructuredDataTool {
    synthesizer: SqlSynthesizer,
    executor: Arc<dyn SqlExecutor>,
}

impl StructuredDataTool {
    /// Tool name.
    pub const NAME: &'static str = "ChatWithSQLDatabase";

    /// Creates the tool.
    pub fn new(synthesizer: SqlSynthesizer, executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            synthesizer,
            executor,
        }
    }

    /// Answers the question with at most [`MAX_RESULT_CHARS`] characters of
    /// query output; on failure the error text is the answer.
    #[tracing::instrument(skip_all, fields(tool = Self::NAME, question_len = question.len()))]
    pub async fn answer(&self, question: &str) -> String {
        let answer = self.try_answer(question).await.inspect_err(|err| {
            tracing::warn!(target: TRACING_TARGET_TOOL, error = %err, "SQL answer failed");
        });
        answer_or_error_text(answer)
    }

    async fn try_answer(&self, question: &str) -> Result<String> {
        let sql = self.synthesizer.synthesize(question).await?;
        let result = self.executor.execute(&sql).await?;

        let truncated = truncate_chars(&result, MAX_RESULT_CHARS);
        if truncated.len() < result.len() {
            tracing::debug!(
                target: TRACING_TARGET_TOOL,
                result_len = result.len(),
                "Truncated query result"
            );
        }
        Ok(truncated.to_string())
    }
}

impl std::fmt::Debug for StructuredDataTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredDataTool")
            .field("synthesizer", &self.synthesizer)
            .finish_non_exhaustive()
    }
}
