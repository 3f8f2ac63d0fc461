use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generateContent returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse model reply as JSON: {source}\n  text: {text}")]
    Parse {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model reply contained no JSON object")]
    EmptyReply,

    #[error("No API key configured: set GEMINI_API_KEY")]
    MissingApiKey,
}
