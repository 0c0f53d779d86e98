mod error;
mod expense;
mod summary;

pub use error::*;
pub use expense::*;
pub use summary::*;
