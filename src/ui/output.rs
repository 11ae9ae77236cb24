//! Status lines for command output
//!
//! Interactive terminals get `cliclack` log lines; pipes and CI get
//! bracketed plain-text tags.

use super::context::UiContext;
use console::style;

#[derive(Clone, Copy)]
enum Level {
    Ok,
    Info,
    Warn,
    Fail,
}

impl Level {
    fn tag(self) -> String {
        match self {
            Self::Ok => style("[OK]").green().to_string(),
            Self::Info => style("[INFO]").cyan().to_string(),
            Self::Warn => style("[WARN]").yellow().to_string(),
            Self::Fail => style("[FAIL]").red().to_string(),
        }
    }
}

fn emit(ctx: &UiContext, level: Level, message: &str) {
    if ctx.is_interactive() {
        let result = match level {
            Level::Ok => cliclack::log::success(message),
            Level::Info => cliclack::log::info(message),
            Level::Warn => cliclack::log::warning(message),
            Level::Fail => cliclack::log::error(message),
        };
        if result.is_ok() {
            return;
        }
    }
    println!("  {} {}", level.tag(), message);
}

/// Heading for a block of output
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.is_interactive() && cliclack::intro(style(title).cyan().bold()).is_ok() {
        return;
    }
    println!("{}", style(title).cyan().bold());
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    emit(ctx, Level::Ok, message);
}

/// Success line with a dimmed detail, e.g. a path
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    emit(
        ctx,
        Level::Ok,
        &format!("{} ({})", message, style(detail).dim()),
    );
}

pub fn step_info(ctx: &UiContext, message: &str) {
    emit(ctx, Level::Info, message);
}

/// Warning plus what to do about it
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    emit(
        ctx,
        Level::Warn,
        &format!("{} - {}", message, style(hint).dim()),
    );
}

pub fn step_error(ctx: &UiContext, message: &str) {
    emit(ctx, Level::Fail, message);
}

/// Indented secondary line
pub fn remark(_ctx: &UiContext, message: &str) {
    println!("  {}", style(message).dim());
}

pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.is_interactive() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}
