//! HTTP handlers for this service.

use axum::extract::State;
use axum::response::Html;
use axum::{routing, Json, Router};

use super::{AdminPage, AdminService, ROUTE};
use crate::http::ProblemDetails;
use crate::services::broker::RequestContext;

impl From<AdminService> for Router
{
	fn from(svc: AdminService) -> Self
	{
		Router::new()
			.route(&format!("/admin{ROUTE}"), routing::get(render))
			.route(&format!("/api/admin{ROUTE}"), routing::get(render_json))
			.with_state(svc)
	}
}

/// Renders the admin page.
#[tracing::instrument(err(Debug, level = "debug"))]
async fn render(
	State(svc): State<AdminService>,
	ctx: RequestContext,
) -> Result<Html<String>, ProblemDetails>
{
	svc.authorize(&ctx).await?;

	Ok(Html(render_html(&svc.page())))
}

/// The data behind the admin page.
#[tracing::instrument(err(Debug, level = "debug"))]
async fn render_json(
	State(svc): State<AdminService>,
	ctx: RequestContext,
) -> Result<Json<AdminPage>, ProblemDetails>
{
	svc.authorize(&ctx).await?;

	Ok(Json(svc.page()))
}

/// Renders the admin page as HTML.
fn render_html(page: &AdminPage) -> String
{
	let status = if page.configured {
		format!(
			"<p>Steam login is <strong>enabled</strong>.</p>\n<p>Callback URL: \
			 <code>{}</code></p>",
			escape(page.callback_url.as_deref().unwrap_or_default()),
		)
	} else {
		String::from("<p>Steam login is <strong>disabled</strong>.</p>")
	};

	format!(
		"<!DOCTYPE html>\n<html>\n<head><title>Steam SSO</title></head>\n<body>\n<h1><i \
		 class=\"fa fa-steam\"></i> Steam</h1>\n{status}\n<p>Set the <code>{option}</code> option \
		 of the <code>{bundle}</code> settings to your Steam Web API key to enable \
		 it.</p>\n</body>\n</html>\n",
		option = page.settings_option,
		bundle = page.settings_bundle,
	)
}

/// Escapes text for use inside HTML.
fn escape(text: &str) -> String
{
	text.chars().fold(String::with_capacity(text.len()), |mut out, ch| {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			ch => out.push(ch),
		}

		out
	})
}

#[cfg(test)]
mod tests
{
	use std::sync::Arc;

	use axum::body::Body;
	use axum::http::{header, Request, StatusCode};
	use axum::response::Response;
	use tower::ServiceExt;
	use url::Url;

	use super::*;
	use crate::platform::{MemoryPlatform, Platform, SessionStore, UserStore};
	use crate::services::broker::session::COOKIE_NAME;
	use crate::services::steam::SteamStrategy;
	use crate::services::{AccountLinker, IdentityBroker};
	use crate::testing;

	struct Setup
	{
		platform: Arc<MemoryPlatform>,
		router: Router,
	}

	fn setup(configured: bool) -> color_eyre::Result<Setup>
	{
		let platform = Arc::new(MemoryPlatform::new());
		let base_url = Url::parse("https://forum.example.org").map(Arc::new)?;
		let linker = AccountLinker::new(
			Arc::clone(&platform) as Arc<dyn Platform>,
			Arc::clone(&base_url),
		);

		let strategy = if configured {
			Some(SteamStrategy::new(Arc::clone(&base_url), "secret", reqwest::Client::new())?)
		} else {
			None
		};

		let broker = IdentityBroker::new(
			Arc::clone(&platform) as Arc<dyn Platform>,
			linker,
			base_url,
			strategy,
			None,
		);

		Ok(Setup { platform, router: AdminService::new(broker).into() })
	}

	impl Setup
	{
		/// Creates a user and returns a session cookie for them.
		async fn login(&self, name: &str, admin: bool) -> color_eyre::Result<String>
		{
			let user_id = self.platform.create_user(name).await?;
			let session_id = self.platform.create_session(user_id).await?;

			if admin {
				self.platform.grant_administrator(user_id).await;
			}

			Ok(format!("{COOKIE_NAME}={session_id}"))
		}

		async fn get(&self, path: &str, cookie: Option<&str>) -> color_eyre::Result<Response>
		{
			let mut req = Request::get(path);

			if let Some(cookie) = cookie {
				req = req.header(header::COOKIE, cookie);
			}

			Ok(self.router.clone().oneshot(req.body(Body::empty())?).await?)
		}
	}

	#[tokio::test]
	async fn json_page() -> color_eyre::Result<()>
	{
		let setup = setup(true)?;
		let cookie = setup.login("Alice", true).await?;
		let res = setup
			.get("/api/admin/plugins/sso-steam", Some(&cookie))
			.await?;

		testing::assert_eq!(res.status(), StatusCode::OK);

		let body = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
		let page = serde_json::from_slice::<serde_json::Value>(&body)?;

		testing::assert_eq!(page["configured"], serde_json::Value::Bool(true));
		testing::assert_eq!(
			page["callback_url"],
			serde_json::json!("https://forum.example.org/auth/steam/callback")
		);
		testing::assert_eq!(page["strategy"]["callbackURL"], serde_json::json!("/auth/steam/callback"));

		Ok(())
	}

	#[tokio::test]
	async fn html_page() -> color_eyre::Result<()>
	{
		let setup = setup(false)?;
		let cookie = setup.login("Alice", true).await?;
		let res = setup.get("/admin/plugins/sso-steam", Some(&cookie)).await?;

		testing::assert_eq!(res.status(), StatusCode::OK);

		let body = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
		let html = String::from_utf8(body.to_vec())?;

		testing::assert!(html.contains("disabled"));
		testing::assert!(html.contains("<code>sso-steam</code>"));

		Ok(())
	}

	#[tokio::test]
	async fn pages_are_admin_only() -> color_eyre::Result<()>
	{
		let setup = setup(true)?;
		let member = setup.login("Bob", false).await?;

		for path in ["/admin/plugins/sso-steam", "/api/admin/plugins/sso-steam"] {
			let anonymous = setup.get(path, None).await?;
			let non_admin = setup.get(path, Some(&member)).await?;

			testing::assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED, "{path}");
			testing::assert_eq!(non_admin.status(), StatusCode::FORBIDDEN, "{path}");
		}

		Ok(())
	}

	#[test]
	fn escape_html() -> color_eyre::Result<()>
	{
		testing::assert_eq!(escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");

		Ok(())
	}
}
