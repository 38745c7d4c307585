//! WebSocket inbound adapter carrying authenticated sessions into realtime
//! channels.
//!
//! Responsibilities:
//! - gate upgrade requests on a resolvable session ([`bridge`], applied by
//!   [`crate::middleware::SessionGate`])
//! - validate the upgrade origin against the allow-list
//! - run one connection task per channel that dispatches typed calls and
//!   forwards pushed events

use actix_web::http::header::{HeaderValue, ORIGIN};
use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{error, warn};
use url::Url;

use crate::domain::{ChannelIdentity, Error};
use crate::inbound::http::ApiResult;
use crate::middleware::SessionGate;

pub mod bridge;
pub mod dispatch;
pub mod hub;
pub mod operations;
mod session;
pub mod state;

use bridge::SessionBridge;

const ORIGIN_NOT_ALLOWED: &str = "origin not allowed";
const INVALID_ORIGIN: &str = "invalid Origin header";

/// Mount the gated `/ws` scope.
///
/// # Examples
/// ```no_run
/// use actix_web::App;
/// use backend::inbound::ws::{self, bridge::SessionBridge};
///
/// # fn build(bridge: SessionBridge) {
/// let app = App::new().configure(|cfg| ws::configure(cfg, bridge.clone()));
/// # }
/// ```
pub fn configure(cfg: &mut web::ServiceConfig, bridge: SessionBridge) {
    cfg.service(
        web::scope("/ws")
            .wrap(SessionGate::new(bridge))
            .service(ws_entry),
    );
}

/// Upgrade an authorised request on `/ws` to a realtime channel.
#[get("")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    identity: web::ReqData<ChannelIdentity>,
    req: HttpRequest,
    stream: Payload,
) -> ApiResult<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        warn!("missing Origin header on WebSocket upgrade");
        Error::forbidden(ORIGIN_NOT_ALLOWED)
    })?;
    if origin_iter.next().is_some() {
        warn!("multiple Origin headers on WebSocket upgrade");
        return Err(Error::invalid_request(INVALID_ORIGIN));
    }
    validate_origin(origin_header)?;

    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|err| {
        warn!(error = %err, "WebSocket upgrade failed");
        Error::invalid_request("WebSocket upgrade required")
    })?;
    let state = state.get_ref().clone();
    actix_web::rt::spawn(session::run_channel(
        state,
        identity.into_inner(),
        session,
        messages,
    ));
    Ok(response)
}

fn validate_origin(origin_header: &HeaderValue) -> Result<(), Error> {
    let origin_value = origin_header.to_str().map_err(|err| {
        error!(error = %err, "failed to parse Origin header as string");
        Error::invalid_request(INVALID_ORIGIN)
    })?;

    let origin = Url::parse(origin_value).map_err(|err| {
        error!(error = %err, "failed to parse Origin header as URL");
        Error::invalid_request(INVALID_ORIGIN)
    })?;

    if is_allowed_origin(&origin) {
        Ok(())
    } else {
        warn!(origin = origin_value, "rejected WS upgrade due to disallowed Origin");
        Err(Error::forbidden(ORIGIN_NOT_ALLOWED))
    }
}

const PRIMARY_HOST: &str = "gateway.example";
const LOCALHOST: &str = "localhost";
const ALLOWED_SUBDOMAIN_SUFFIX: &str = ".gateway.example";

/// Returns true when a parsed Origin belongs to the static allow-list.
///
/// Accepts HTTPS origins on the production domain and its subdomains, and
/// HTTP origins on localhost with a non-zero explicit port.
fn is_allowed_origin(origin: &Url) -> bool {
    let Some(host) = origin.host_str() else {
        return false;
    };

    match origin.scheme() {
        "http" if host == LOCALHOST => matches!(origin.port(), Some(port) if port != 0),
        "https" if host == PRIMARY_HOST => true,
        "https" => host.strip_suffix(ALLOWED_SUBDOMAIN_SUFFIX).is_some_and(|sub| !sub.is_empty()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).expect("valid header value")
    }

    #[rstest]
    #[case("http://localhost:3000")]
    #[case("https://gateway.example")]
    #[case("https://app.gateway.example")]
    fn accepts_configured_origins(#[case] origin: &str) {
        assert!(validate_origin(&header(origin)).is_ok());
    }

    #[rstest]
    #[case("http://localhost")]
    #[case("https://example.com")]
    #[case("wss://gateway.example")]
    fn rejects_disallowed_origins(#[case] origin: &str) {
        let err = validate_origin(&header(origin)).expect_err("origin should be rejected");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    fn rejects_unreadable_origin_headers() {
        let opaque = HeaderValue::from_bytes(&[0x80]).expect("opaque header value");
        for value in [opaque, HeaderValue::from_static("not a url")] {
            let err = validate_origin(&value).expect_err("origin should be rejected");
            assert_eq!(err.code(), ErrorCode::InvalidRequest);
        }
    }

    #[rstest]
    #[case("http://localhost:4000", true)]
    #[case("http://localhost:0", false)]
    #[case("https://gateway.example.evil.com", false)]
    fn evaluates_allow_list(#[case] origin: &str, #[case] expected: bool) {
        let parsed = Url::parse(origin).expect("url should parse");
        assert_eq!(is_allowed_origin(&parsed), expected);
    }
}
