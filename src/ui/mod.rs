//! Terminal output helpers
//!
//! Styled output in interactive terminals, plain `[OK]`-style prefixes in
//! CI and pipes. Status lines go to stderr so command output on stdout stays
//! machine-readable.
//!
//! # Example
//!
//! ```rust,ignore
//! use pkgstore::ui::{self, TaskSpinner, UiContext};
//!
//! let ctx = UiContext::detect();
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Checking out main...");
//! // ... do work ...
//! spinner.stop("Archive ready");
//!
//! ui::key_value(&ctx, "commit", "0123456789ab");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{key_value, step_info, step_ok_detail, step_warn_hint};
pub use progress::TaskSpinner;
