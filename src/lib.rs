//! Credentials for the Copilot-backed ais command-line assistants.
//!
//! Turns "no credentials" into a short-lived GitHub Copilot bearer token:
//! cached tokens are reused until they expire, a stored GitHub token is
//! exchanged for a fresh one, and when nothing is stored the GitHub device
//! flow runs interactively.
//!
//! # Quick Start
//!
//! ```no_run
//! use ais::prelude::*;
//!
//! # async fn example() -> ais::error::Result<()> {
//! let config = AisConfig::load(None)?;
//! let credentials = config.credential_manager()?;
//! let copilot = config.copilot_client(credentials)?;
//! let reply = copilot
//!     .post_json("/chat/completions", &serde_json::json!({
//!         "model": "gpt-4o",
//!         "messages": [{"role": "user", "content": "Hello!"}],
//!     }))
//!     .await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
