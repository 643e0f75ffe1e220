//! Relational executor seam.

use async_trait::async_trait;

use crate::{Result, TRACING_TARGET_SQL};

/// Runs SQL text against the call-center database and renders the result
/// as text.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Executes the query and returns its textual result.
    async fn execute(&self, sql: &str) -> Result<String>;
}

/// Executor that runs nothing and answers with the query itself.
///
/// Lets the structured-data tool be exercised without a database.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl SqlExecutor for DryRunExecutor {
    async fn execute(&self, sql: &str) -> Result<String> {
        tracing::info!(target: TRACING_TARGET_SQL, sql = sql.trim(), "Dry run, query not executed");
        Ok(sql.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_returns_query_text() {
        let sql = "\nSELECT COUNT(*) FROM km_processed_data\n";
        assert_eq!(DryRunExecutor.execute(sql).await.unwrap(), sql);
    }
}
