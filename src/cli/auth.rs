//! CLI auth command handlers for login, status, logout and token.

use chrono::Local;

use crate::auth::token::now_ms;
use crate::auth::CredentialManager;
use crate::error::AisError;

/// Handle `ais auth login`.
pub async fn handle_login(manager: &CredentialManager) -> Result<(), AisError> {
    let access = manager.login().await?;
    println!("✅ GitHub Copilot login successful!");
    if let Some(expires) = access.expires_at() {
        println!(
            "   Copilot token valid until {}",
            expires.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Handle `ais auth status`.
pub async fn handle_status(manager: &CredentialManager) -> Result<(), AisError> {
    let status = manager.status().await?;

    println!("🔐 GitHub Copilot\n");
    if status.has_refresh_token {
        println!("  GitHub token: ✅ Stored");
    } else {
        println!("  GitHub token: ❌ Not logged in (run `ais auth login`)");
    }

    match status.access_token {
        Some(token) if token.is_valid_at(now_ms()) => {
            let until = token
                .expires_at()
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| token.expires_at_ms.to_string());
            println!("  Copilot token: ✅ Valid until {until}");
        }
        Some(_) => println!("  Copilot token: ⚠️  Expired (refreshed on next use)"),
        None => println!("  Copilot token: ❌ None cached"),
    }
    Ok(())
}

/// Handle `ais auth logout`.
pub async fn handle_logout(manager: &CredentialManager) -> Result<(), AisError> {
    manager.logout().await?;
    println!("✅ Logged out from GitHub Copilot");
    Ok(())
}

/// Handle `ais auth token`.
pub async fn handle_token(manager: &CredentialManager) -> Result<(), AisError> {
    let token = manager.get_token().await?;
    println!("{token}");
    Ok(())
}
