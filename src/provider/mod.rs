//! Outbound HTTP to GitHub and the Copilot API.

pub mod github_copilot;
pub mod http;

pub use github_copilot::{authenticated_headers, identification_headers, CopilotClient, Initiator};
