pub mod logger;

pub use logger::{QueryLog, QueryLogger};
