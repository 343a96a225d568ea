//! MapKit Core - Shared types and errors

mod error;
mod types;

pub use error::*;
pub use types::*;
