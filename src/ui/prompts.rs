//! Confirmation prompt with a non-interactive fallback

use super::context::UiContext;
use crate::error::{B64Error, B64Result};

/// Ask a yes/no question
///
/// `--yes` answers yes. Without a terminal the default is returned.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> B64Result<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }
    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| B64Error::Internal(format!("prompt task failed: {e}")))?
    .map_err(|e| B64Error::io("reading confirmation", e))
}
