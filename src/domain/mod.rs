//! Domain layer - Core data model and port definitions
//!
//! This module defines the normalized pool/dataset model and the traits
//! (ports) through which the storage tool is reached.

pub mod model;
pub mod ports;

pub use model::*;
pub use ports::*;
