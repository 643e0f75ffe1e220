#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod chat;
mod client;
mod config;
pub mod credentials;
mod data_source;
mod error;

pub use chat::{ChatCompletion, ChatCompletionRequest, ChatMessage, Choice, Role};
pub use client::{CompletionClient, DirectClient, ProjectClient};
pub use config::{
    DEFAULT_API_VERSION, DEFAULT_REQUEST_TIMEOUT_SECS, DirectClientConfig,
    DirectClientConfigBuilder, ProjectClientConfig, ProjectClientConfigBuilder,
    ProjectConnectionString, mask_secret,
};
pub use data_source::{
    AzureSearchParameters, DataSource, EmbeddingDependency, FieldsMapping, QueryType,
    SearchAuthentication,
};
pub use error::{Error, Result};

/// Tracing target for completion client operations.
pub const TRACING_TARGET_CLIENT: &str = "kmine_azure::client";
