//! Edit actions for ModelStack.
//!
//! Every edit the console makes goes through an [`ActionProcessor`], which
//! decides whether the edit can be applied in place or needs a copy-on-write
//! override first, and which can revert an edit and describe it as a
//! change-set.

mod action;
mod error;
mod processor;

pub use action::{ExecutedAction, ModelAction};
pub use error::{ActionError, ActionResult};
pub use processor::ActionProcessor;
