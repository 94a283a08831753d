//! Domain layer types and invariants.

pub mod alias;
pub mod content;
pub mod entities;
pub mod error;
pub mod types;
