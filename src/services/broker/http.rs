//! HTTP handlers for this service.

use axum::extract::State;
use axum::response::Redirect;
use axum::{routing, Router};
use axum_extra::extract::CookieJar;

use super::{session, IdentityBroker, RequestContext};
use crate::http::extract::Query;
use crate::http::ProblemDetails;
use crate::services::steam::{self, OpenIdPayload};

impl From<IdentityBroker> for Router
{
	fn from(svc: IdentityBroker) -> Self
	{
		Router::new()
			.route(steam::LOGIN_PATH, routing::get(login))
			.route(steam::CALLBACK_PATH, routing::get(callback))
			.with_state(svc)
	}
}

/// Login with Steam.
///
/// Redirects to Steam's login page.
#[tracing::instrument(err(Debug, level = "debug"))]
async fn login(State(svc): State<IdentityBroker>) -> Result<Redirect, ProblemDetails>
{
	let url = svc.strategy()?.login_url()?;

	Ok(Redirect::to(url.as_str()))
}

/// Hit by Steam after a successful login.
#[tracing::instrument(skip(svc, payload, cookies), err(Debug, level = "debug"))]
async fn callback(
	State(svc): State<IdentityBroker>,
	ctx: RequestContext,
	Query(payload): Query<OpenIdPayload>,
	cookies: CookieJar,
) -> Result<(CookieJar, Redirect), ProblemDetails>
{
	let strategy = svc.strategy()?;
	let steam_id = strategy.verify(payload).await?;
	let profile = strategy.fetch_profile(&steam_id).await?;
	let user = svc.on_callback(&ctx, &steam_id, &profile).await?;
	let cookies = match user.session_id() {
		Some(session_id) => cookies.add(session::cookie(session_id, svc.cookie_domain())),
		None => cookies,
	};

	Ok((cookies, Redirect::to(svc.base_url.as_str())))
}

#[cfg(test)]
mod tests
{
	use std::sync::Arc;

	use axum::body::Body;
	use axum::http::{header, Request, StatusCode};
	use tower::ServiceExt;
	use url::Url;

	use super::*;
	use crate::platform::{MemoryPlatform, Platform};
	use crate::services::AccountLinker;
	use crate::testing;

	fn router(api_key: Option<&str>) -> color_eyre::Result<Router>
	{
		let platform = Arc::new(MemoryPlatform::new()) as Arc<dyn Platform>;
		let base_url = Url::parse("https://forum.example.org").map(Arc::new)?;
		let linker = AccountLinker::new(Arc::clone(&platform), Arc::clone(&base_url));
		let strategy = api_key
			.map(|key| {
				steam::SteamStrategy::new(Arc::clone(&base_url), key, reqwest::Client::new())
			})
			.transpose()?;

		Ok(IdentityBroker::new(platform, linker, base_url, strategy, None).into())
	}

	#[tokio::test]
	async fn login_redirects_to_steam() -> color_eyre::Result<()>
	{
		let req = Request::get("/auth/steam").body(Body::empty())?;
		let res = router(Some("secret"))?.oneshot(req).await?;

		testing::assert_eq!(res.status(), StatusCode::SEE_OTHER);

		let location = res
			.headers()
			.get(header::LOCATION)
			.map(|value| value.to_str())
			.transpose()?
			.unwrap_or_default();

		testing::assert!(location.starts_with("https://steamcommunity.com/openid/login?"));
		testing::assert!(location.contains("auth%2Fsteam%2Fcallback"));

		Ok(())
	}

	#[tokio::test]
	async fn login_without_key_is_not_found() -> color_eyre::Result<()>
	{
		let req = Request::get("/auth/steam").body(Body::empty())?;
		let res = router(None)?.oneshot(req).await?;

		testing::assert_eq!(res.status(), StatusCode::NOT_FOUND);
		testing::assert_eq!(
			res.headers().get(header::CONTENT_TYPE).map(|value| value.as_bytes()),
			Some(&b"application/problem+json"[..])
		);

		Ok(())
	}

	#[tokio::test]
	async fn callback_rejects_garbage() -> color_eyre::Result<()>
	{
		let req = Request::get("/auth/steam/callback?openid.mode=id_res").body(Body::empty())?;
		let res = router(Some("secret"))?.oneshot(req).await?;

		testing::assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

		Ok(())
	}

	#[tokio::test]
	async fn callback_rejects_assertion_for_another_site() -> color_eyre::Result<()>
	{
		let query = serde_urlencoded::to_string([
			("openid.ns", "http://specs.openid.net/auth/2.0"),
			("openid.mode", "id_res"),
			("openid.op_endpoint", "https://steamcommunity.com/openid/login"),
			("openid.claimed_id", "https://steamcommunity.com/openid/id/76561198000000001"),
			("openid.identity", "https://steamcommunity.com/openid/id/76561198000000001"),
			("openid.return_to", "https://evil.example/auth/steam/callback"),
			("openid.response_nonce", "2024-06-15T00:36:00Z7nVIS5lDAcZe"),
			("openid.assoc_handle", "1234567890"),
			("openid.signed", "signed,op_endpoint,claimed_id,identity,return_to"),
			("openid.sig", "BK0zC//KzERs7N+NlDO0aL06+BA="),
		])?;

		let req = Request::get(format!("/auth/steam/callback?{query}")).body(Body::empty())?;
		let res = router(Some("secret"))?.oneshot(req).await?;

		testing::assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
		testing::assert!(res.headers().get(header::SET_COOKIE).is_none());

		Ok(())
	}
}
