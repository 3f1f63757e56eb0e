//! Client-side annotation state.
//!
//! This module contains:
//! - Annotation, rectangle and region types
//! - The per-image annotation store
//! - The editing session and stale-request tracking

mod types;
mod store;
mod session;

pub use types::*;
pub use store::*;
pub use session::*;
