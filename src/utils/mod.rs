//! Process and cancellation helpers.

pub mod cancel;
pub mod process_guard;

pub use cancel::CancelToken;
pub use process_guard::{kill_tree, ProcessGuard, WaitOutcome};
