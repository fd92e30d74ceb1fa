use chrono::{DateTime, TimeZone, Utc};

/// Short-lived Copilot API token.
///
/// # Example
/// ```
/// use ais::auth::AccessToken;
///
/// let token = AccessToken::new("tok_Y", 1_700_000_000_000);
/// assert!(token.is_valid_at(1_699_999_999_999));
/// assert!(!token.is_valid_at(1_700_000_000_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// Absolute expiry in milliseconds since the Unix epoch.
    pub expires_at_ms: i64,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at_ms: i64) -> Self {
        Self {
            token: token.into(),
            expires_at_ms,
        }
    }

    /// A token is usable strictly before its expiry instant.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.expires_at_ms > now_ms
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expires_at_ms).single()
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary_is_exclusive() {
        let token = AccessToken::new("tok", 1_000);
        assert!(token.is_valid_at(999));
        assert!(!token.is_valid_at(1_000));
        assert!(!token.is_valid_at(1_001));
    }

    #[test]
    fn expires_at_converts_milliseconds() {
        let token = AccessToken::new("tok", 4_102_444_800_000);
        let expires = token.expires_at().unwrap();
        assert_eq!(expires.timestamp(), 4_102_444_800);
    }
}
