//! This module contains wrappers around [`axum`]'s extractors, customizing
//! error responses.

mod query;
pub use query::{Query, QueryRejection};
