//! `gemini-agent`: drafts project specifications through the Gemini
//! `generateContent` API.
//!
//! # Architecture
//!
//! ```text
//! ProjectAgent          ← prompt formatting, retry loop, fallback request
//!     │
//!     ▼
//! GeminiClient          ← one reqwest::Client, POST {model}:generateContent
//!     │
//!     ▼
//! extract::parse_reply  ← strip fences, close braces, repair, serde_json
//!     │
//!     ▼
//! ProjectDraft          ← typed view of the reply object
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use gemini_agent::{AgentConfig, ProjectAgent, SpecField};
//!
//! let mut config = AgentConfig::default();
//! config.client.api_key = std::env::var("GEMINI_API_KEY").ok();
//! let agent = ProjectAgent::new(config)?;
//!
//! let draft = agent.generate_project("Library Kiosk").await;
//! let fixed = agent.regenerate("Library Kiosk", &[SpecField::Architecture]).await;
//! ```

pub mod client;
pub mod draft;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod runner;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::{ClientConfig, GeminiClient};
pub use draft::{ProjectDraft, StackDraft};
pub use error::AgentError;
pub use prompt::SpecField;
pub use runner::{AgentConfig, ProjectAgent, RetryPolicy};
pub use types::{GenerateRequest, GenerateResponse, GenerationConfig};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AgentError>;
