use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("Failed to reach Cloudflare API: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cloudflare API error ({status}): {body}")]
    RemoteRequestFailed { status: StatusCode, body: String },

    #[error("Cloudflare rejected the request ({status}): {}", .messages.join("; "))]
    Rejected {
        status: StatusCode,
        messages: Vec<String>,
    },

    #[error("No zone found for {0}")]
    ZoneNotFound(String),

    #[error("Unexpected Cloudflare API response: {0}")]
    InvalidResponse(String),
}
