//! API client module for the grouped sessions backend.

mod client;
mod error;
mod types;

pub use client::{ApiClient, DEFAULT_API_BASE};
pub use error::ApiError;
pub use types::{QueryMeta, QueryResult, SankeyLink};

#[cfg(test)]
pub(crate) use types::fixtures;
