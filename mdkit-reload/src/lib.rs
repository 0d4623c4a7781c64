//! Hot reload for mdkit applications.
//!
//! A [`ReloadHarness`] watches source and markup files, waits for the tree to
//! go quiet, then rebuilds the application root. Rebuilding has two halves:
//!
//! - **prepare** runs on a worker thread under a timeout. It reads whatever
//!   changed (markup, config, assets) and produces a `Send` description.
//! - **mount** runs on the GUI thread and turns that description into
//!   widgets.
//!
//! If either half fails or the worker overruns its timeout, the old tree stays
//! on screen. A successful reload swaps the window root and restores the
//! window size and position that were current before the swap.
//!
//! ```no_run
//! use mdkit_components::{context::BuildContext, label::{Label, LabelArgs}};
//! use mdkit_reload::{ReloadConfig, ReloadHarness};
//! use mdkit_ui::{PxSize, Window};
//!
//! # fn main() -> anyhow::Result<()> {
//! let window = Window::new(PxSize::new(800.0, 600.0));
//! let ctx = BuildContext::new().with_window(window);
//! let mut harness = ReloadHarness::new(
//!     ReloadConfig::default().watch_paths(vec!["ui".into()]),
//!     ctx,
//!     |_changed| Ok(std::fs::read_to_string("ui/title.txt")?),
//!     |ctx, title| Ok(Label::new(ctx, LabelArgs::new(title)).into()),
//! );
//! harness.reload()?;
//! harness.watch()?;
//! loop {
//!     harness.poll();
//! #   break;
//! }
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs, clippy::unwrap_used)]

mod config;
mod error;
mod harness;
mod watcher;

pub use config::ReloadConfig;
pub use error::{ReloadError, ReloadResult};
pub use harness::{ReloadHarness, ReloadOutcome, ReloadStats};
pub use watcher::{ChangeWatcher, Debouncer};
