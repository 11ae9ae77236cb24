//! Terminal output helpers
//!
//! Uses `cliclack` on interactive terminals and falls back to plain tagged
//! lines when stdout is piped or running in CI.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, remark, step_error, step_info, step_ok, step_ok_detail, step_warn_hint,
};
pub use progress::TaskSpinner;
pub use prompts::confirm;
