//! Core layer - fundamental scene description types.
//!
//! This module provides:
//! - [`NodePath`] - Slash-delimited node addressing
//! - [`MetaData`] - Ordered key-value metadata storage
//! - [`ValueType`] / [`Value`] - Typed attribute data
//! - [`TimeCode`] - Time selection for value resolution

mod path;
mod metadata;
mod value;
mod time;

pub use path::{NodePath, is_valid_identifier};
pub use metadata::{MetaData, MetaValue};
pub use value::{Value, ValueType, ScalarKind, Role};
pub use time::TimeCode;
