//! Preview command - how a Data URI would render

use super::read_input;
use crate::cli::args::{OutputFormat, PreviewArgs};
use crate::codec::{DataUri, Preview};
use crate::config::Config;
use crate::error::{B64Error, B64Result};
use crate::ui::{self, UiContext};
use serde::Serialize;

#[derive(Serialize)]
struct PreviewJson<'a> {
    mime: &'a str,
    #[serde(flatten)]
    preview: &'a Preview,
}

/// Execute the preview command
pub async fn execute(args: PreviewArgs, _config: &Config) -> B64Result<()> {
    let input = read_input(args.input).await?;
    let input = input.trim();
    let uri = DataUri::parse(input).ok_or_else(|| B64Error::InvalidDataUri(truncate(input)))?;
    let preview = Preview::classify(&uri);

    match args.format {
        OutputFormat::Json => {
            let json = PreviewJson {
                mime: &uri.mime,
                preview: &preview,
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => println!("{}", describe(&preview)),
        OutputFormat::Table => print_table(&uri, &preview),
    }
    Ok(())
}

fn print_table(uri: &DataUri, preview: &Preview) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, &uri.label());
    ui::key_value(&ctx, "MIME", &uri.mime);
    ui::key_value(&ctx, "Preview", describe(preview));

    match preview {
        Preview::Text(text) => println!("{}", text),
        Preview::TextUndecodable => {
            ui::step_warn_hint(&ctx, "Payload is not valid UTF-8", "Decode it with --output")
        }
        _ => {}
    }
}

fn describe(preview: &Preview) -> &'static str {
    match preview {
        Preview::Image => "image",
        Preview::Html => "html (sandboxed frame)",
        Preview::Pdf => "pdf (frame)",
        Preview::Text(_) => "text",
        Preview::TextUndecodable => "text (undecodable)",
        Preview::Unsupported(_) => "unsupported",
    }
}

/// Keep error messages short for long payloads
fn truncate(input: &str) -> String {
    const MAX: usize = 40;
    match input.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &input[..idx]),
        None => input.to_string(),
    }
}
