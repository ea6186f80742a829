//! Domain layer
//!
//! Entities and port traits with no engine dependency.

pub mod entities;
pub mod ports;
