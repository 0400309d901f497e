//! Session cookies.
//!
//! Sessions themselves are owned by the platform; we only read the cookie to
//! find out who is making a request, and set it after a successful login.

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, SameSite};
use thiserror::Error;
use time::Duration;

use super::{IdentityBroker, RequestContext};
use crate::http::problem_details::{IntoProblemDetails, ProblemType};
use crate::http::ProblemDetails;
use crate::platform::{self, SessionId, SessionStore};

/// The name of the HTTP cookie that will store the user's [session ID].
///
/// [session ID]: SessionId
pub const COOKIE_NAME: &str = "sso-session";

/// How long session cookies live.
const COOKIE_MAX_AGE: Duration = Duration::weeks(2);

/// Creates an HTTP cookie for a freshly created session.
///
/// Without a `domain` the cookie is scoped to the exact host that set it.
pub fn cookie(session_id: SessionId, domain: Option<&str>) -> Cookie<'static>
{
	let mut cookie = Cookie::build((COOKIE_NAME, session_id.to_string()))
		.path("/")
		.secure(cfg!(feature = "production"))
		.same_site(SameSite::Lax)
		.http_only(true)
		.max_age(COOKIE_MAX_AGE)
		.build();

	if let Some(domain) = domain {
		cookie.set_domain(domain.to_owned());
	}

	cookie
}

/// Error that can occur while figuring out who is making a request.
#[derive(Debug, Error)]
pub enum SessionRejection
{
	/// The platform failed to look up the session.
	#[error("failed to resolve session")]
	Platform(#[from] platform::Error),
}

impl IntoProblemDetails for SessionRejection
{
	fn problem_type(&self) -> ProblemType
	{
		match self {
			Self::Platform(source) => source.problem_type(),
		}
	}
}

impl IntoResponse for SessionRejection
{
	fn into_response(self) -> Response
	{
		ProblemDetails::from(self).into_response()
	}
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
	S: Send + Sync + 'static,
	IdentityBroker: FromRef<S>,
{
	type Rejection = SessionRejection;

	/// Missing, malformed, and expired session cookies all mean "not logged
	/// in". Only storage failures are rejected.
	#[tracing::instrument(
		name = "RequestContext::from_request_parts",
		skip_all,
		fields(session.id = tracing::field::Empty, user.id = tracing::field::Empty),
		err(Debug, level = "debug")
	)]
	async fn from_request_parts(
		req: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection>
	{
		if let Some(ctx) = req.extensions.get::<Self>() {
			return Ok(*ctx);
		}

		let Some(session_id) = req
			.headers
			.get_all(header::COOKIE)
			.into_iter()
			.flat_map(|value| value.to_str())
			.flat_map(|value| Cookie::split_parse_encoded(value.trim().to_owned()))
			.flatten()
			.find(|cookie| cookie.name() == COOKIE_NAME)
			.and_then(|cookie| cookie.value().parse::<SessionId>().ok())
		else {
			return Ok(Self::anonymous());
		};

		tracing::Span::current().record("session.id", format_args!("{session_id}"));

		let broker = IdentityBroker::from_ref(state);
		let ctx = broker
			.platform
			.resolve_session(session_id)
			.await?
			.map_or_else(Self::anonymous, Self::authenticated);

		if let Some(user_id) = ctx.user_id {
			tracing::Span::current().record("user.id", format_args!("{user_id}"));
		}

		req.extensions.insert(ctx);

		Ok(ctx)
	}
}

#[cfg(test)]
mod tests
{
	use std::sync::Arc;

	use axum::extract::Request;
	use axum::RequestExt;
	use url::Url;

	use super::*;
	use crate::platform::{MemoryPlatform, Platform, UserStore};
	use crate::services::AccountLinker;
	use crate::testing;

	fn broker(platform: &Arc<MemoryPlatform>) -> color_eyre::Result<IdentityBroker>
	{
		let platform = Arc::clone(platform) as Arc<dyn Platform>;
		let base_url = Url::parse("https://forum.example.org").map(Arc::new)?;
		let linker = AccountLinker::new(Arc::clone(&platform), Arc::clone(&base_url));

		Ok(IdentityBroker::new(platform, linker, base_url, None, None))
	}

	fn request(cookie: Option<&str>) -> color_eyre::Result<Request>
	{
		let mut req = Request::builder().uri("/");

		if let Some(cookie) = cookie {
			req = req.header(header::COOKIE, cookie);
		}

		Ok(req.body(Default::default())?)
	}

	#[tokio::test]
	async fn resolve_live_session() -> color_eyre::Result<()>
	{
		let platform = Arc::new(MemoryPlatform::new());
		let broker = broker(&platform)?;
		let alice = platform.create_user("Alice").await?;
		let session_id = platform.create_session(alice).await?;

		let mut req = request(Some(&format!("{COOKIE_NAME}={session_id}")))?;
		let ctx: RequestContext = req.extract_parts_with_state(&broker).await?;

		testing::assert_eq!(ctx, RequestContext::authenticated(alice));

		Ok(())
	}

	#[tokio::test]
	async fn missing_or_bogus_cookie_is_anonymous() -> color_eyre::Result<()>
	{
		let platform = Arc::new(MemoryPlatform::new());
		let broker = broker(&platform)?;

		for cookie in [None, Some("sso-session=not-a-uuid"), Some("other=1")] {
			let mut req = request(cookie)?;
			let ctx: RequestContext = req.extract_parts_with_state(&broker).await?;

			testing::assert_eq!(ctx, RequestContext::anonymous());
		}

		Ok(())
	}

	#[tokio::test]
	async fn revoked_session_is_anonymous() -> color_eyre::Result<()>
	{
		let platform = Arc::new(MemoryPlatform::new());
		let broker = broker(&platform)?;
		let alice = platform.create_user("Alice").await?;
		let session_id = platform.create_session(alice).await?;

		platform.revoke_all_sessions(alice).await?;

		let mut req = request(Some(&format!("{COOKIE_NAME}={session_id}")))?;
		let ctx: RequestContext = req.extract_parts_with_state(&broker).await?;

		testing::assert_eq!(ctx, RequestContext::anonymous());

		Ok(())
	}

	#[test]
	fn cookie_scoping() -> color_eyre::Result<()>
	{
		let session_id = SessionId::new();
		let scoped = cookie(session_id, Some("example.org"));
		let host_only = cookie(session_id, None);

		testing::assert_eq!(scoped.domain(), Some("example.org"));
		testing::assert_eq!(host_only.domain(), None);
		testing::assert_eq!(scoped.http_only(), Some(true));
		testing::assert_eq!(scoped.value(), session_id.to_string());

		Ok(())
	}
}
