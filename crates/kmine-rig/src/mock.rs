//! Stub collaborators for testing the tools without Azure.
//!
//! This module is only available in tests or with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! kmine-rig = { version = "...", features = ["test-utils"] }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use kmine_azure::chat::{ResponseMessage, ToolCall};
use kmine_azure::{ChatCompletion, ChatCompletionRequest, Choice, CompletionClient};

use crate::resolver::ClientResolver;
use crate::sql::{SqlExecutor, SqlSynthesizer};
use crate::tool::{GreetingTool, StructuredDataTool, ToolRegistry, UnstructuredDataTool};
use crate::{ChatWithDataConfig, Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Configuration pointing at placeholder endpoints.
pub fn test_config() -> ChatWithDataConfig {
    ChatWithDataConfig::new("https://kmine-test.openai.azure.com", "gpt-4o-mini", "test-api-key")
        .with_search(
            "https://kmine-test.search.windows.net",
            "call_transcripts",
            "test-search-key",
        )
}

/// Builds a registry whose tools share one resolver.
pub fn registry_with(resolver: StubResolver, executor: StubExecutor) -> ToolRegistry {
    let config = Arc::new(test_config());
    let resolver: Arc<dyn ClientResolver> = Arc::new(resolver);
    ToolRegistry::new(
        GreetingTool::new(config.clone(), resolver.clone()),
        StructuredDataTool::new(
            SqlSynthesizer::new(config.clone(), resolver.clone()),
            Arc::new(executor),
        ),
        UnstructuredDataTool::new(config, resolver),
    )
}

#[derive(Debug, Clone)]
enum Reply {
    Completion(ChatCompletion),
    ConnectionRefused,
    Panic,
}

/// Completion client answering every request with a canned reply.
///
/// Clones share the recorded requests.
#[derive(Debug, Clone)]
pub struct StubClient {
    reply: Reply,
    requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
}

impl StubClient {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            requests: Arc::default(),
        }
    }

    /// Replies with a single choice.
    pub fn choice(choice: Choice) -> Self {
        Self::with_reply(Reply::Completion(ChatCompletion {
            choices: vec![choice],
            ..Default::default()
        }))
    }

    /// Replies with a single text choice.
    pub fn text(content: impl Into<String>) -> Self {
        Self::choice(Choice {
            message: ResponseMessage {
                content: Some(content.into()),
                ..Default::default()
            },
            finish_reason: Some("stop".into()),
            ..Default::default()
        })
    }

    /// Replies with a choice that has no content.
    pub fn no_content() -> Self {
        Self::choice(Choice::default())
    }

    /// Replies with a function call.
    pub fn tool_call(call: ToolCall) -> Self {
        Self::choice(Choice {
            message: ResponseMessage {
                tool_calls: vec![call],
                ..Default::default()
            },
            finish_reason: Some("tool_calls".into()),
            ..Default::default()
        })
    }

    /// Replies with an empty `choices` array.
    pub fn empty() -> Self {
        Self::with_reply(Reply::Completion(ChatCompletion::default()))
    }

    /// Fails as if the endpoint refused the connection.
    pub fn connection_refused() -> Self {
        Self::with_reply(Reply::ConnectionRefused)
    }

    /// Panics inside the call.
    pub fn panicking() -> Self {
        Self::with_reply(Reply::Panic)
    }

    /// Returns the most recent request.
    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Returns the number of requests received.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl CompletionClient for StubClient {
    fn provider_name(&self) -> &'static str {
        "stub"
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> kmine_core::Result<ChatCompletion> {
        lock(&self.requests).push(request.clone());
        match &self.reply {
            Reply::Completion(completion) => Ok(completion.clone()),
            Reply::ConnectionRefused => {
                Err(kmine_core::Error::network_error().with_message("connection refused"))
            }
            Reply::Panic => panic!("stub completion client panicked"),
        }
    }
}

/// Resolver handing out clones of one stub client and counting calls.
#[derive(Debug, Clone)]
pub struct StubResolver {
    client: Option<StubClient>,
    failure: Option<String>,
    resolve_calls: Arc<AtomicUsize>,
    resolve_direct_calls: Arc<AtomicUsize>,
}

impl StubResolver {
    /// Resolves to the given client in both modes.
    pub fn new(client: StubClient) -> Self {
        Self {
            client: Some(client),
            failure: None,
            resolve_calls: Arc::default(),
            resolve_direct_calls: Arc::default(),
        }
    }

    /// Fails every resolution with a configuration error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            client: None,
            failure: Some(message.into()),
            resolve_calls: Arc::default(),
            resolve_direct_calls: Arc::default(),
        }
    }

    /// Number of flag-respecting resolutions.
    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    /// Number of direct resolutions.
    pub fn resolve_direct_calls(&self) -> usize {
        self.resolve_direct_calls.load(Ordering::SeqCst)
    }

    fn client(&self) -> Result<Box<dyn CompletionClient>> {
        match (&self.client, &self.failure) {
            (Some(client), _) => Ok(Box::new(client.clone())),
            (None, Some(message)) => Err(Error::config(message)),
            (None, None) => Err(Error::config("no stub client")),
        }
    }
}

#[async_trait]
impl ClientResolver for StubResolver {
    async fn resolve(&self) -> Result<Box<dyn CompletionClient>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.client()
    }

    async fn resolve_direct(&self) -> Result<Box<dyn CompletionClient>> {
        self.resolve_direct_calls.fetch_add(1, Ordering::SeqCst);
        self.client()
    }
}

#[derive(Debug, Clone)]
enum ExecutorReply {
    Echo,
    Text(String),
    Failure(String),
}

/// Executor with a canned result that records executed queries.
#[derive(Debug, Clone)]
pub struct StubExecutor {
    reply: ExecutorReply,
    executed: Arc<Mutex<Vec<String>>>,
}

impl StubExecutor {
    fn with_reply(reply: ExecutorReply) -> Self {
        Self {
            reply,
            executed: Arc::default(),
        }
    }

    /// Returns the query text as the result.
    pub fn echo() -> Self {
        Self::with_reply(ExecutorReply::Echo)
    }

    /// Returns a fixed result.
    pub fn returning(result: impl Into<String>) -> Self {
        Self::with_reply(ExecutorReply::Text(result.into()))
    }

    /// Fails every query.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(ExecutorReply::Failure(message.into()))
    }

    /// Returns the executed queries in order.
    pub fn executed(&self) -> Vec<String> {
        lock(&self.executed).clone()
    }
}

#[async_trait]
impl SqlExecutor for StubExecutor {
    async fn execute(&self, sql: &str) -> Result<String> {
        lock(&self.executed).push(sql.to_string());
        match &self.reply {
            ExecutorReply::Echo => Ok(sql.to_string()),
            ExecutorReply::Text(text) => Ok(text.clone()),
            ExecutorReply::Failure(message) => Err(Error::executor(message)),
        }
    }
}
