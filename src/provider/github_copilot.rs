//! Authenticated requests against the GitHub Copilot API.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use strum::{Display, EnumString, IntoStaticStr};

use crate::auth::CredentialManager;
use crate::error::AisError;

use super::http::status_to_error;

pub const COPILOT_USER_AGENT: &str = "GitHubCopilotChat/0.32.4";
pub const COPILOT_EDITOR_VERSION: &str = "vscode/1.105.1";
pub const COPILOT_EDITOR_PLUGIN_VERSION: &str = "copilot-chat/0.32.4";
pub const COPILOT_INTEGRATION_ID: &str = "vscode-chat";
pub const DEFAULT_COPILOT_API_URL: &str = "https://api.githubcopilot.com";

const COPILOT_INTENT: &str = "conversation-edits";

/// Headers the Copilot backend uses to allow-list the client.
pub fn identification_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(COPILOT_USER_AGENT));
    headers.insert(
        "editor-version",
        HeaderValue::from_static(COPILOT_EDITOR_VERSION),
    );
    headers.insert(
        "editor-plugin-version",
        HeaderValue::from_static(COPILOT_EDITOR_PLUGIN_VERSION),
    );
    headers.insert(
        "copilot-integration-id",
        HeaderValue::from_static(COPILOT_INTEGRATION_ID),
    );
    headers
}

/// Who originated a request, reported in `X-Initiator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Initiator {
    User,
    Agent,
}

impl Initiator {
    /// `Agent` when any message in the body has role `tool` or `assistant`.
    ///
    /// Anything unparsable counts as `User`; this header is advisory only.
    pub fn from_body(body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
            return Self::User;
        };
        let is_agent = value
            .get("messages")
            .and_then(|m| m.as_array())
            .is_some_and(|messages| {
                messages.iter().any(|message| {
                    matches!(
                        message.get("role").and_then(|r| r.as_str()),
                        Some("tool" | "assistant")
                    )
                })
            });
        if is_agent {
            Self::Agent
        } else {
            Self::User
        }
    }
}

/// Decorate caller headers for a Copilot request carrying `body`.
pub fn authenticated_headers(mut headers: HeaderMap, token: &str, body: &[u8]) -> HeaderMap {
    headers.remove("x-api-key");
    headers.remove(AUTHORIZATION);
    headers.extend(identification_headers());
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {token}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers.insert(
        HeaderName::from_static("openai-intent"),
        HeaderValue::from_static(COPILOT_INTENT),
    );
    let initiator: &'static str = Initiator::from_body(body).into();
    headers.insert(
        HeaderName::from_static("x-initiator"),
        HeaderValue::from_static(initiator),
    );
    headers
}

/// HTTP client that attaches a fresh Copilot token to every request.
#[derive(Debug, Clone)]
pub struct CopilotClient {
    client: reqwest::Client,
    base_url: String,
    credentials: CredentialManager,
}

impl CopilotClient {
    pub fn new(credentials: CredentialManager) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_COPILOT_API_URL.to_string(),
            credentials,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// POST a JSON body to `path` under the API base URL.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, AisError> {
        let payload = serde_json::to_vec(body)?;
        let token = self.credentials.get_token().await?;

        let mut base = HeaderMap::new();
        base.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let headers = authenticated_headers(base, &token, &payload);

        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        tracing::debug!(%url, "sending Copilot request");
        let resp = self
            .client
            .post(&url)
            .headers(headers)
            .body(payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body));
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_user_prompt_is_user_initiated() {
        let body = br#"{"messages":[{"role":"system","content":"s"},{"role":"user","content":"hi"}]}"#;
        assert_eq!(Initiator::from_body(body), Initiator::User);
    }

    #[test]
    fn tool_or_assistant_turns_are_agent_initiated() {
        let assistant = br#"{"messages":[{"role":"user"},{"role":"assistant","content":"ok"}]}"#;
        let tool = br#"{"messages":[{"role":"tool","content":"{}"}]}"#;
        assert_eq!(Initiator::from_body(assistant), Initiator::Agent);
        assert_eq!(Initiator::from_body(tool), Initiator::Agent);
    }

    #[test]
    fn unparsable_or_shapeless_bodies_default_to_user() {
        assert_eq!(Initiator::from_body(b"not json"), Initiator::User);
        assert_eq!(Initiator::from_body(b""), Initiator::User);
        assert_eq!(Initiator::from_body(br#"{"input":"hi"}"#), Initiator::User);
        assert_eq!(
            Initiator::from_body(br#"{"messages":"assistant"}"#),
            Initiator::User
        );
    }

    #[test]
    fn initiator_display_matches_header_value() {
        assert_eq!(Initiator::Agent.to_string(), "agent");
        let agent: &'static str = Initiator::Agent.into();
        assert_eq!(agent, "agent");
        let headers = authenticated_headers(
            HeaderMap::new(),
            "tok_Y",
            br#"{"messages":[{"role":"tool","content":"{}"}]}"#,
        );
        assert_eq!(headers["x-initiator"], "agent");
        assert_eq!("user".parse::<Initiator>().unwrap(), Initiator::User);
    }

    #[test]
    fn decorated_headers_replace_conflicting_credentials() {
        let mut base = HeaderMap::new();
        base.insert("x-api-key", HeaderValue::from_static("sk-wrong"));
        base.insert(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));
        base.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let headers = authenticated_headers(base, "tok_Y", br#"{"messages":[]}"#);

        assert!(headers.get("x-api-key").is_none());
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(headers[AUTHORIZATION], "Bearer tok_Y");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[USER_AGENT], COPILOT_USER_AGENT);
        assert_eq!(headers["editor-version"], COPILOT_EDITOR_VERSION);
        assert_eq!(headers["editor-plugin-version"], COPILOT_EDITOR_PLUGIN_VERSION);
        assert_eq!(headers["copilot-integration-id"], COPILOT_INTEGRATION_ID);
        assert_eq!(headers["openai-intent"], "conversation-edits");
        assert_eq!(headers["x-initiator"], "user");
    }
}
