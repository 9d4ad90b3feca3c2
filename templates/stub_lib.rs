//! Placeholder declarations mirroring the SDK's public surface.
//!
//! Bodies never talk to anything; they only have to type-check the way the
//! real API does so tutorial code resolves its names.
#![allow(dead_code, unused_variables)]

pub mod core {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::path::PathBuf;

    #[derive(Debug)]
    pub enum Error {
        BinaryNotFound,
        SessionNotFound(String),
        PermissionDenied(String),
        McpError(String),
        ConfigError(String),
        InvalidInput(String),
        Timeout(u64),
        SerializationError(serde_json::Error),
        Io(std::io::Error),
        ProcessError(String),
        StreamClosed,
        NotAuthenticated,
        RateLimitExceeded,
    }

    impl fmt::Display for Error {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl std::error::Error for Error {}

    impl From<serde_json::Error> for Error {
        fn from(err: serde_json::Error) -> Self {
            Error::SerializationError(err)
        }
    }

    impl From<std::io::Error> for Error {
        fn from(err: std::io::Error) -> Self {
            Error::Io(err)
        }
    }

    pub type Result<T> = std::result::Result<T, Error>;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub enum StreamFormat {
        #[default]
        Text,
        Json,
        StreamJson,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub enum SecurityLevel {
        Strict,
        #[default]
        Balanced,
        Relaxed,
        Disabled,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum ToolPermission {
        Mcp { server: String, tool: String },
        Bash { command: String },
        All,
    }

    impl ToolPermission {
        pub fn mcp(server: impl Into<String>, tool: impl Into<String>) -> Self {
            ToolPermission::Mcp {
                server: server.into(),
                tool: tool.into(),
            }
        }

        pub fn bash(command: impl Into<String>) -> Self {
            ToolPermission::Bash {
                command: command.into(),
            }
        }

        pub fn to_cli_format(&self) -> String {
            String::new()
        }

        pub fn parse_granular(permission_str: &str) -> Result<Self> {
            Ok(ToolPermission::All)
        }

        pub fn validate(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Config {
        pub system_prompt: Option<String>,
        pub append_system_prompt: Option<String>,
        pub model: Option<String>,
        pub mcp_config_path: Option<PathBuf>,
        pub allowed_tools: Option<Vec<String>>,
        pub disallowed_tools: Option<Vec<String>>,
        pub stream_format: StreamFormat,
        pub non_interactive: bool,
        pub verbose: bool,
        pub max_tokens: Option<usize>,
        pub max_turns: Option<u32>,
        pub timeout_secs: Option<u64>,
        pub continue_session: bool,
        pub resume_session_id: Option<String>,
        pub skip_permissions: bool,
        pub security_level: SecurityLevel,
    }

    impl Config {
        pub fn builder() -> ConfigBuilder {
            ConfigBuilder::new()
        }

        pub fn validate(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct ConfigBuilder {
        config: Config,
    }

    impl ConfigBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn system_prompt(self, prompt: impl Into<String>) -> Self {
            self
        }

        pub fn append_system_prompt(self, prompt: impl Into<String>) -> Self {
            self
        }

        pub fn model(self, model: impl Into<String>) -> Self {
            self
        }

        pub fn mcp_config(self, path: impl Into<PathBuf>) -> Self {
            self
        }

        pub fn allowed_tools(self, tools: Vec<String>) -> Self {
            self
        }

        pub fn disallowed_tools(self, tools: Vec<String>) -> Self {
            self
        }

        pub fn stream_format(self, format: StreamFormat) -> Self {
            self
        }

        pub fn non_interactive(self, non_interactive: bool) -> Self {
            self
        }

        pub fn max_tokens(self, max_tokens: usize) -> Self {
            self
        }

        pub fn max_turns(self, turns: u32) -> Self {
            self
        }

        pub fn timeout_secs(self, timeout_secs: u64) -> Self {
            self
        }

        pub fn verbose(self, verbose: bool) -> Self {
            self
        }

        pub fn continue_session(self) -> Self {
            self
        }

        pub fn resume_session(self, session_id: String) -> Self {
            self
        }

        pub fn skip_permissions(self, skip: bool) -> Self {
            self
        }

        pub fn security_level(self, level: SecurityLevel) -> Self {
            self
        }

        pub fn build(self) -> Result<Config> {
            Ok(self.config)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SessionId(String);

    impl SessionId {
        pub fn new(id: impl Into<String>) -> Self {
            SessionId(id.into())
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for SessionId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct TokenUsage {
        pub input_tokens: Option<u64>,
        pub output_tokens: Option<u64>,
        pub cache_creation_input_tokens: Option<u64>,
        pub cache_read_input_tokens: Option<u64>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ResponseMetadata {
        pub session_id: String,
        pub cost_usd: Option<f64>,
        pub duration_ms: Option<u64>,
        pub tokens_used: Option<TokenUsage>,
        pub model: Option<String>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ClaudeResponse {
        pub content: String,
        pub raw_json: Option<serde_json::Value>,
        pub metadata: Option<ResponseMetadata>,
    }

    impl ClaudeResponse {
        pub fn text(content: String) -> Self {
            Self {
                content,
                ..Self::default()
            }
        }

        pub fn with_json(content: String, raw_json: serde_json::Value) -> Self {
            Self {
                content,
                raw_json: Some(raw_json),
                metadata: None,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct Cost {
        pub usd: f64,
    }

    impl Cost {
        pub fn new(usd: f64) -> Self {
            Self { usd }
        }

        pub fn zero() -> Self {
            Self { usd: 0.0 }
        }

        pub fn add(&self, other: &Self) -> Self {
            Self {
                usd: self.usd + other.usd,
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Message {
        Init { meta: serde_json::Value },
        User { content: String, meta: serde_json::Value },
        Assistant { content: String, meta: serde_json::Value },
        Tool { name: String, parameters: serde_json::Value, meta: serde_json::Value },
        ToolResult { tool_name: String, result: serde_json::Value, meta: serde_json::Value },
        Error { error: String, meta: serde_json::Value },
        Result { meta: serde_json::Value, stats: serde_json::Value },
    }
}

pub mod runtime {
    use crate::core::{ClaudeResponse, Config, Message, Result, SecurityLevel, SessionId, StreamFormat};
    use futures::stream::{self, BoxStream, Stream};
    use serde::de::DeserializeOwned;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    pub struct MessageStream {
        inner: BoxStream<'static, Result<Message>>,
    }

    impl MessageStream {
        fn empty() -> Self {
            Self {
                inner: Box::pin(stream::empty()),
            }
        }
    }

    impl Stream for MessageStream {
        type Item = Result<Message>;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.inner.as_mut().poll_next(cx)
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct Client {
        config: Config,
    }

    impl Client {
        pub fn new(config: Config) -> Self {
            Self { config }
        }

        pub fn builder() -> ClientBuilder {
            ClientBuilder::new()
        }

        pub fn query(&self, query: impl Into<String>) -> QueryBuilder {
            QueryBuilder {
                query: query.into(),
            }
        }

        pub async fn send(&self, query: &str) -> Result<String> {
            Ok(String::new())
        }

        pub async fn send_full(&self, query: &str) -> Result<ClaudeResponse> {
            Ok(ClaudeResponse::default())
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct ClientBuilder {
        config: Config,
    }

    impl ClientBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn config(self, config: Config) -> Self {
            Self { config }
        }

        pub fn system_prompt(self, prompt: impl Into<String>) -> Self {
            self
        }

        pub fn append_system_prompt(self, prompt: impl Into<String>) -> Self {
            self
        }

        pub fn model(self, model: impl Into<String>) -> Self {
            self
        }

        pub fn allowed_tools(self, tools: Vec<String>) -> Self {
            self
        }

        pub fn disallowed_tools(self, tools: Vec<String>) -> Self {
            self
        }

        pub fn stream_format(self, format: StreamFormat) -> Self {
            self
        }

        pub fn verbose(self, verbose: bool) -> Self {
            self
        }

        pub fn timeout_secs(self, timeout_secs: u64) -> Self {
            self
        }

        pub fn continue_session(self) -> Self {
            self
        }

        pub fn resume_session(self, session_id: impl Into<String>) -> Self {
            self
        }

        pub fn skip_permissions(self, skip: bool) -> Self {
            self
        }

        pub fn max_turns(self, turns: u32) -> Self {
            self
        }

        pub fn security_level(self, level: SecurityLevel) -> Self {
            self
        }

        pub fn build(self) -> Result<Client> {
            Ok(Client::new(self.config))
        }
    }

    #[derive(Debug, Clone)]
    pub struct QueryBuilder {
        query: String,
    }

    impl QueryBuilder {
        pub fn session(self, session_id: SessionId) -> Self {
            self
        }

        pub fn format(self, format: StreamFormat) -> Self {
            self
        }

        pub async fn send(self) -> Result<String> {
            Ok(String::new())
        }

        pub async fn send_full(self) -> Result<ClaudeResponse> {
            Ok(ClaudeResponse::default())
        }

        pub async fn stream(self) -> Result<MessageStream> {
            Ok(MessageStream::empty())
        }

        pub async fn parse_output<T: DeserializeOwned>(self) -> Result<T> {
            Ok(serde_json::from_str("null")?)
        }
    }
}

pub use crate::core::{
    ClaudeResponse, Config, ConfigBuilder, Cost, Error, Message, ResponseMetadata, Result,
    SecurityLevel, SessionId, StreamFormat, TokenUsage, ToolPermission,
};
pub use crate::runtime::{Client, ClientBuilder, MessageStream, QueryBuilder};

pub mod prelude {
    pub use crate::core::*;
    pub use crate::runtime::{Client, ClientBuilder, MessageStream, QueryBuilder};
}
