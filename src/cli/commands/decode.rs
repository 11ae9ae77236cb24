//! Decode command - Base64 or Data URI back to text or bytes

use super::read_input;
use crate::cli::args::DecodeArgs;
use crate::codec::{decode_bytes, decode_text, inspect, DataUri, Inspection};
use crate::config::Config;
use crate::error::{B64Error, B64Result};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Execute the decode command
pub async fn execute(args: DecodeArgs, _config: &Config) -> B64Result<()> {
    let input = read_input(args.input).await?;

    if let Some(path) = &args.output {
        return write_bytes(input.trim(), path).await;
    }

    match inspect(&input) {
        Inspection::Empty => {}
        Inspection::Invalid(_) => {
            // Re-decode for the specific error
            let text = decode_text(input.trim())?;
            println!("{}", text);
        }
        inspection => println!("{}", inspection.display_text()),
    }
    Ok(())
}

/// Decode raw bytes, unwrapping a Data URI if present
async fn write_bytes(input: &str, path: &Path) -> B64Result<()> {
    let payload = DataUri::parse(input)
        .map(|uri| uri.payload)
        .unwrap_or_else(|| input.to_string());
    let bytes = decode_bytes(&payload)?;

    fs::write(path, &bytes)
        .await
        .map_err(|e| B64Error::io(format!("writing {}", path.display()), e))?;

    let ctx = UiContext::detect();
    ui::step_ok_detail(
        &ctx,
        &format!("Wrote {} bytes", bytes.len()),
        &path.display().to_string(),
    );
    Ok(())
}
