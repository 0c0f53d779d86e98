// Application layer - use cases and orchestration on top of a repository

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
