//! Subcommand execution.

use std::sync::Arc;

use anyhow::bail;
use kmine_rig::sql::DryRunExecutor;
use kmine_rig::tool::{Answer, TOOL_SPECS};
use kmine_rig::{ChatWithDataConfig, ChatWithDataTools};
use serde_json::{Value, json};

use crate::TRACING_TARGET_COMMAND;
use crate::config::Command;

/// Runs a parsed subcommand and prints its result to stdout.
pub async fn execute(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&tool_listing())?);
        }
        Command::Ask {
            tool,
            question,
            config,
        } => {
            let tools = build_tools(config);
            let Some(answer) = tools.invoke(&tool, &question).await else {
                bail!("unknown tool '{tool}'");
            };
            print_answer(&answer)?;
        }
        Command::Route { question, config } => {
            let tools = build_tools(config);
            let routed = tools.route(&question).await;
            tracing::info!(target: TRACING_TARGET_COMMAND, tool = %routed.tool, "Question routed");
            print_answer(&routed.answer)?;
        }
    }
    Ok(())
}

fn build_tools(config: ChatWithDataConfig) -> ChatWithDataTools {
    ChatWithDataTools::new(config, Arc::new(DryRunExecutor))
}

/// Name, description and argument schema of every tool.
fn tool_listing() -> Value {
    TOOL_SPECS
        .iter()
        .map(|spec| {
            json!({
                "name": spec.name,
                "description": spec.description,
                "parameters": spec.parameters_schema(),
            })
        })
        .collect()
}

/// Prints text answers as-is and grounded answers as JSON.
fn print_answer(answer: &Answer) -> anyhow::Result<()> {
    match answer {
        Answer::Text(text) => println!("{text}"),
        Answer::Choice(choice) => println!("{}", serde_json::to_string_pretty(choice)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use kmine_rig::tool::FALLBACK_ANSWER;

    use super::*;

    #[test]
    fn listing_has_every_tool() {
        let listing = tool_listing();
        let names: Vec<_> = listing
            .as_array()
            .unwrap()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            ["Greeting", "ChatWithSQLDatabase", "ChatWithCallTranscripts"]
        );
        assert_eq!(listing[0]["parameters"]["required"][0], "input");
    }

    #[tokio::test]
    async fn project_mode_without_connection_string_still_answers() {
        // Port 9 on loopback refuses connections, so no request leaves the host.
        let mut config = ChatWithDataConfig::new("http://127.0.0.1:9", "gpt-4o-mini", "key")
            .with_search("http://127.0.0.1:9", "call_transcripts", "skey");
        config.use_ai_project_client = true;
        let tools = build_tools(config);

        let greeting = tools.invoke("Greeting", "Hello").await.unwrap();
        assert_eq!(
            greeting.as_text(),
            Some("configuration error: AZURE_AI_PROJECT_CONN_STRING is required for the project client")
        );

        let transcripts = tools
            .invoke("ChatWithCallTranscripts", "why?")
            .await
            .unwrap();
        assert_eq!(transcripts.as_text(), Some(FALLBACK_ANSWER));
    }
}
