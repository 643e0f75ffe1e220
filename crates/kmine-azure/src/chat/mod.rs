//! Chat completion wire types shared by the direct and project clients.

mod message;
mod request;
mod response;
mod tools;

pub use message::{ChatMessage, Role};
pub use request::{ChatCompletionRequest, ChatCompletionRequestBuilder};
pub use response::{ChatCompletion, Choice, MessageContext, ResponseMessage, Usage};
pub use tools::{FunctionCall, FunctionDefinition, FunctionTool, ToolCall, ToolChoice};
