//! CLI command implementations

pub mod cache;
pub mod config;
pub mod decode;
pub mod encode;
pub mod preview;
pub mod worker;

pub use cache::execute as cache;
pub use config::execute as config;
pub use decode::execute as decode;
pub use encode::execute as encode;
pub use preview::execute as preview;
pub use worker::execute as worker;

use crate::error::{B64Error, B64Result};
use tokio::io::AsyncReadExt;

/// Use the positional argument, or read all of stdin
async fn read_input(arg: Option<String>) -> B64Result<String> {
    if let Some(arg) = arg {
        return Ok(arg);
    }
    let bytes = read_stdin().await?;
    String::from_utf8(bytes)
        .map_err(|_| B64Error::InvalidBase64("input is not valid UTF-8".to_string()))
}

async fn read_stdin() -> B64Result<Vec<u8>> {
    let mut buf = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut buf)
        .await
        .map_err(|e| B64Error::io("reading stdin", e))?;
    Ok(buf)
}
