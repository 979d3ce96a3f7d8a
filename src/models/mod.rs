//! Request models.

mod query_request;

pub use query_request::{settings_url, QueryRequest};
