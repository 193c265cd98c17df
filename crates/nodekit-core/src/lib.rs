//! nodekit-core: Shared building blocks for the nodekit graph layer.
//!
//! This crate provides the leaf types used by every other nodekit crate:
//! - `Value` / `Attributes` for schema-less node and edge properties
//! - Attribute casts used by model schemas
//! - Layered settings loading
//! - The core error type

pub mod cast;
pub mod config;
pub mod error;
pub mod value;

pub use cast::Cast;
pub use config::Settings;
pub use error::CoreError;
pub use value::{Attributes, Value};
