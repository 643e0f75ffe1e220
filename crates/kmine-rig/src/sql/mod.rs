//! SQL generation and execution.

mod executor;
mod synthesizer;

pub use executor::{DryRunExecutor, SqlExecutor};
pub use synthesizer::{SqlSynthesizer, sql_prompt, strip_sql_fences};
