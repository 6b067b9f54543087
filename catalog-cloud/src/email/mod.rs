//! Outbound verification code delivery
//!
//! Only the interface lives here; production transports implement
//! `CodeSender` and report delivery as a boolean. `AppState::code_sender`
//! carries the active sender for the client sign-in flow, which is not
//! served by this crate.

use async_trait::async_trait;

#[async_trait]
pub trait CodeSender: Send + Sync {
    /// Deliver `code` to `to`; `false` when delivery failed
    async fn send_code(&self, to: &str, code: &str) -> bool;
}

/// Writes codes to the log instead of delivering them
pub struct LogCodeSender;

#[async_trait]
impl CodeSender for LogCodeSender {
    async fn send_code(&self, to: &str, code: &str) -> bool {
        if to.trim().is_empty() || !to.contains('@') {
            tracing::warn!(to = to, "Verification code not sent: invalid recipient");
            return false;
        }
        tracing::info!(to = to, "Verification code issued");
        tracing::debug!(to = to, code = code, "Verification code");
        true
    }
}
