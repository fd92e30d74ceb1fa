//! Error classification and recovery.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Storage,
    Serialization,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    Reauthenticate,
    RetryLogin,
    CheckConfiguration,
    ContactSupport,
}

impl RecoverySuggestion {
    pub fn describe(self) -> &'static str {
        match self {
            Self::RetryWithBackoff => "Try again in a moment.",
            Self::Reauthenticate => "Run `ais auth logout`, then `ais auth login`.",
            Self::RetryLogin => "Run `ais auth login` and approve the request promptly.",
            Self::CheckConfiguration => "Check your ais configuration and credential storage.",
            Self::ContactSupport => "Unexpected failure; please report it.",
        }
    }
}
