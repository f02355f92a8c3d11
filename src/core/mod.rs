//! Core types shared by every part of lockforge.
//!
//! - [`LockforgeError`] - infrastructure errors that stop a resolve run
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] - convert any [`anyhow::Error`] for display
//!
//! Per-manifest failures are not modelled here; see [`crate::job::JobError`].

pub mod error;

pub use error::{ErrorContext, LockforgeError, user_friendly_error};
