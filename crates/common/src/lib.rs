//! Shared building blocks used by every crate in the workspace:
//! logging initialisation and small wire types.

pub mod types;
pub mod utils;
