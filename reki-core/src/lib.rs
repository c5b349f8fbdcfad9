pub mod agent;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod prompt;
pub mod research;
pub mod sportradar;
pub mod tools;
pub mod upstream;

// Re-export commonly used types
pub use config::Config;
pub use error::UpstreamError;
pub use models::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ToolCall,
};
pub use tools::ToolRegistry;
pub use upstream::Provider;
