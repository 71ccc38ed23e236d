//! State tracking module
//!
//! This module contains the error taxonomy, the per-item lifecycle status and
//! the per-domain politeness state used while a batch runs.

mod domain_state;
mod error_kind;
mod item_state;

pub use domain_state::DomainState;
pub use error_kind::ErrorKind;
pub use item_state::ItemStatus;
