pub mod client;
pub mod sse;

pub use client::{ChatClient, LlmResponse};
