//! Encode command - text or file to Base64

use super::read_stdin;
use crate::cli::args::EncodeArgs;
use crate::codec::{encode_bytes, DataUri};
use crate::config::Config;
use crate::error::{B64Error, B64Result};
use tokio::fs;
use tracing::debug;

/// Execute the encode command
pub async fn execute(args: EncodeArgs, _config: &Config) -> B64Result<()> {
    let bytes = match (args.text, &args.file) {
        (Some(text), _) => text.into_bytes(),
        (None, Some(path)) => fs::read(path)
            .await
            .map_err(|e| B64Error::io(format!("reading {}", path.display()), e))?,
        (None, None) => strip_line_ending(read_stdin().await?),
    };
    debug!("Encoding {} bytes", bytes.len());

    println!("{}", encode(&bytes, args.mime.as_deref()));
    Ok(())
}

fn encode(bytes: &[u8], mime: Option<&str>) -> String {
    match mime {
        Some(mime) => DataUri::encode(mime, bytes).to_string(),
        None => encode_bytes(bytes),
    }
}

/// Drop the newline a shell pipe appends
fn strip_line_ending(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.ends_with(b"\n") {
        bytes.pop();
        if bytes.ends_with(b"\r") {
            bytes.pop();
        }
    }
    bytes
}
