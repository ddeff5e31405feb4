pub mod error;
pub mod report;
pub mod stats;
pub mod stream;

pub use error::K6cmpError;
