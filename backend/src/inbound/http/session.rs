//! Session cookie helpers and the authenticated-session extractor.
//!
//! Handlers never touch the cookie directly: login issues it through
//! [`session_cookie`], logout clears it through [`removal_cookie`], and
//! protected handlers take an [`AuthenticatedSession`] argument, which slides
//! the idle window or answers `401 Unauthorized`.

use actix_web::cookie::Cookie;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{Error, ResolvedSession, SessionToken, User};

use super::session_config::SessionSettings;
use super::state::HttpState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Message returned whenever a request lacks a live session.
pub const LOGIN_REQUIRED: &str = "login required";

/// Build the cookie carrying `token`.
///
/// The cookie lives no longer than the absolute session lifetime.
#[must_use]
pub fn session_cookie(token: &SessionToken, settings: &SessionSettings) -> Cookie<'static> {
    let max_age = CookieDuration::try_from(settings.policy.absolute()).unwrap_or(CookieDuration::ZERO);
    Cookie::build(SESSION_COOKIE, token.as_str().to_owned())
        .path("/")
        .http_only(true)
        .secure(settings.cookie_secure)
        .same_site(settings.same_site)
        .max_age(max_age)
        .finish()
}

/// Build a cookie that makes the browser drop the session cookie.
#[must_use]
pub fn removal_cookie(settings: &SessionSettings) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(settings.cookie_secure)
        .same_site(settings.same_site)
        .finish();
    cookie.make_removal();
    cookie
}

/// Parse the session token out of a request cookie.
///
/// Missing and malformed cookies both yield `None`.
#[must_use]
pub fn token_from_cookie(cookie: Option<Cookie<'_>>) -> Option<SessionToken> {
    let cookie = cookie?;
    match SessionToken::parse(cookie.value()) {
        Ok(token) => Some(token),
        Err(error) => {
            debug!(%error, "ignoring malformed session cookie");
            None
        }
    }
}

/// A request whose session cookie resolved to a live session.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    token: SessionToken,
    session: ResolvedSession,
}

impl AuthenticatedSession {
    /// Cookie token the request carried.
    #[must_use]
    pub const fn token(&self) -> &SessionToken {
        &self.token
    }

    /// User that owns the session.
    #[must_use]
    pub fn user(&self) -> &User {
        self.session.record.user()
    }

    /// Resolved session, already touched for this request.
    #[must_use]
    pub const fn session(&self) -> &ResolvedSession {
        &self.session
    }
}

impl FromRequest for AuthenticatedSession {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = token_from_cookie(req.cookie(SESSION_COOKIE));
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
            let token = token.ok_or_else(|| Error::unauthorized(LOGIN_REQUIRED))?;
            let session = state
                .sessions
                .resolve_and_touch(&token)
                .await?
                .ok_or_else(|| Error::unauthorized(LOGIN_REQUIRED))?;
            Ok(Self { token, session })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{TestHarness, harness};
    use crate::test_support::sample_user;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use chrono::TimeDelta;
    use rstest::rstest;

    async fn whoami(session: AuthenticatedSession) -> HttpResponse {
        HttpResponse::Ok().body(session.user().username().to_string())
    }

    #[rstest]
    fn session_cookie_carries_configured_attributes() {
        let settings = SessionSettings::insecure_for_tests();
        let token = SessionToken::generate();

        let cookie = session_cookie(&token, &settings);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), token.as_str());
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.max_age(), Some(CookieDuration::hours(24)));
    }

    #[rstest]
    fn removal_cookie_expires_immediately() {
        let cookie = removal_cookie(&SessionSettings::insecure_for_tests());
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }

    #[rstest]
    #[case(None)]
    #[case(Some("not-a-token"))]
    fn unusable_cookies_yield_no_token(#[case] value: Option<&str>) {
        let cookie = value.map(|raw| Cookie::new(SESSION_COOKIE, raw.to_owned()));
        assert!(token_from_cookie(cookie).is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn live_sessions_are_extracted(harness: TestHarness) {
        let token = harness.open_session(sample_user()).await;
        let app = actix_test::init_service(
            App::new()
                .app_data(harness.data())
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/me")
                .cookie(Cookie::new(SESSION_COOKIE, token.as_str().to_owned()))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(res).await, "ada");
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_cookie_is_unauthorised(harness: TestHarness) {
        let app = actix_test::init_service(
            App::new()
                .app_data(harness.data())
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/me").to_request())
                .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn idle_sessions_are_unauthorised(harness: TestHarness) {
        let token = harness.open_session(sample_user()).await;
        harness.clock.advance(TimeDelta::hours(3));
        let app = actix_test::init_service(
            App::new()
                .app_data(harness.data())
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/me")
                .cookie(Cookie::new(SESSION_COOKIE, token.as_str().to_owned()))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
