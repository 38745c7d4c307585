//! Session API handlers.
//!
//! ```text
//! POST /api/v1/login {"username":"ada","password":"correct horse"}
//! POST /api/v1/logout
//! GET /api/v1/session
//! ```
//!
//! Paths, methods and payload types come from the contract's [`Login`],
//! [`Logout`] and [`CurrentSession`] endpoints; [`super::configure`] mounts
//! the handlers.

use actix_web::{HttpRequest, HttpResponse, web};
use realtime_contract::{CurrentSession, Endpoint, Envelope, Login, Logout};
use tracing::{debug, info};

use crate::domain::{Error, LoginCredentials, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::{
    AuthenticatedSession, SESSION_COOKIE, removal_cookie, session_cookie, token_from_cookie,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validated::Validated;

/// Authenticate a user, open a session and issue its cookie.
///
/// Unknown usernames and wrong passwords produce the same `401` envelope.
pub async fn login(
    state: web::Data<HttpState>,
    payload: Validated<<Login as Endpoint>::Request>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&request.username, &request.password)
        .map_err(map_login_validation_error)?;
    let user = state.login.authenticate(&credentials).await?;
    let body: Envelope<<Login as Endpoint>::Response> =
        Envelope::success(user.profile(), Login::SUCCESS_MESSAGE);
    let token = state.sessions.open(user).await?;
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&token, &state.settings))
        .json(body))
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    let field = match err {
        LoginValidationError::EmptyUsername => "username",
        LoginValidationError::EmptyPassword => "password",
    };
    debug!(field, "login credentials rejected");
    Error::invalid_request(err.to_string())
}

/// End the caller's session and clear its cookie.
///
/// Requests without a live session still get the cookie cleared, so the
/// endpoint is safe to repeat.
pub async fn logout(state: web::Data<HttpState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    if let Some(token) = token_from_cookie(req.cookie(SESSION_COOKIE)) {
        state.sessions.close(&token).await?;
    } else {
        info!("logout without a session cookie");
    }
    let body: Envelope<<Logout as Endpoint>::Response> =
        Envelope::success(<Logout as Endpoint>::Response::default(), Logout::SUCCESS_MESSAGE);
    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(&state.settings))
        .json(body))
}

/// Return the profile bound to the caller's session.
pub async fn current_session(
    session: AuthenticatedSession,
) -> web::Json<Envelope<<CurrentSession as Endpoint>::Response>> {
    web::Json(Envelope::success(
        session.user().profile(),
        CurrentSession::SUCCESS_MESSAGE,
    ))
}
