//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod logging;
pub mod observability;
pub mod services;
pub mod vector_index;
