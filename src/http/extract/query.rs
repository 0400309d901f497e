//! This module contains the [`Query`] extractor, a wrapper around
//! [`axum_extra::extract::Query`] that rejects with [`ProblemDetails`].

use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::problem_details::{ExtensionMembers, IntoProblemDetails, ProblemType};
use crate::http::ProblemDetails;

#[allow(clippy::missing_docs_in_private_items)]
mod base
{
	pub use axum_extra::extract::{Query, QueryRejection};
}

/// An extractor for URI query parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(base::Query), rejection(QueryRejection))]
pub struct Query<T>(pub T);

/// Rejection for the [`Query`] extractor.
#[derive(Debug, Error)]
#[error("failed to parse query string")]
pub struct QueryRejection(#[from] pub base::QueryRejection);

impl IntoResponse for QueryRejection
{
	fn into_response(self) -> Response
	{
		ProblemDetails::from(self).into_response()
	}
}

impl IntoProblemDetails for QueryRejection
{
	fn problem_type(&self) -> ProblemType
	{
		ProblemType::InvalidQueryString
	}

	fn add_extension_members(&self, ext: &mut ExtensionMembers)
	{
		ext.add("reason", &self.0.to_string());
	}
}
