//! Live gateway helpers shared by the integration suites.
//!
//! Each helper starts a full application (login, session, progress and
//! realtime routes) on an ephemeral port with the in-memory session store and
//! the development account (`admin` / `password`).

use std::sync::Arc;

use actix_http::error::PayloadError;
use actix_web::HttpServer;
use actix_web::cookie::SameSite;
use actix_web::dev::ServerHandle;
use actix_web::http::header;
use actix_web::web::Bytes;
use awc::{Client, ClientResponse};
use backend::domain::ExpiryPolicy;
use backend::inbound::http::session_config::SessionSettings;
use backend::outbound::session_store::MemorySessionStore;
use backend::server::{GatewayState, build_app};
use backend::test_support::development_login;
use futures::Stream;
use mockable::DefaultClock;
use serde_json::Value;

/// Origin accepted by the realtime allow-list.
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// A running gateway.
pub struct LiveGateway {
    pub base_url: String,
    pub state: GatewayState,
    pub handle: ServerHandle,
}

impl LiveGateway {
    /// URL of the realtime endpoint.
    pub fn ws_url(&self) -> String {
        format!("{}/ws", self.base_url)
    }

    /// Stop the server and wait for workers to exit.
    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

/// Session settings for plain-HTTP tests.
pub fn settings(revoke_channels_on_logout: bool) -> SessionSettings {
    SessionSettings {
        cookie_secure: false,
        same_site: SameSite::Lax,
        policy: ExpiryPolicy::default(),
        revoke_channels_on_logout,
    }
}

/// Start a gateway; must run inside an Actix system.
pub fn start_gateway(settings: SessionSettings) -> LiveGateway {
    let state = GatewayState::assemble(
        development_login(),
        Arc::new(MemorySessionStore::default()),
        Arc::new(DefaultClock),
        settings,
    )
    .expect("complete dispatcher");
    state.health.mark_ready();

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let app_state = state.clone();
    let server = HttpServer::new(move || build_app(app_state.clone()))
        .listen(listener)
        .expect("bind test server")
        .disable_signals()
        .workers(1)
        .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    LiveGateway {
        base_url: format!("http://{addr}"),
        state,
        handle,
    }
}

/// Response summary recorded by the scenarios.
#[derive(Debug)]
pub struct Recorded {
    pub status: u16,
    pub cookie: Option<String>,
    pub body: Option<Value>,
}

async fn record<S>(mut response: ClientResponse<S>) -> Recorded
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin,
{
    let status = response.status().as_u16();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_owned);
    let bytes = response.body().await.expect("response body");
    let body = serde_json::from_slice(&bytes).ok();
    Recorded {
        status,
        cookie,
        body,
    }
}

/// Log in with the given credentials.
pub async fn login(gateway: &LiveGateway, username: &str, password: &str) -> Recorded {
    let response = Client::default()
        .post(format!("{}/api/v1/login", gateway.base_url))
        .send_json(&serde_json::json!({ "username": username, "password": password }))
        .await
        .expect("login request");
    record(response).await
}

/// Log in as `admin` and return the `session=<token>` cookie pair.
pub async fn login_cookie(gateway: &LiveGateway) -> String {
    let recorded = login(gateway, "admin", "password").await;
    assert_eq!(recorded.status, 200, "development login succeeds");
    recorded.cookie.expect("session cookie")
}

/// `POST` JSON (or an empty body) with an optional session cookie.
pub async fn post(
    gateway: &LiveGateway,
    path: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Recorded {
    let mut request = Client::default().post(format!("{}{path}", gateway.base_url));
    if let Some(cookie) = cookie {
        request = request.insert_header((header::COOKIE, cookie.to_owned()));
    }
    let response = match body {
        Some(body) => request.send_json(&body).await,
        None => request.send().await,
    }
    .expect("post request");
    record(response).await
}

/// `GET` with an optional session cookie.
pub async fn get(gateway: &LiveGateway, path: &str, cookie: Option<&str>) -> Recorded {
    let mut request = Client::default().get(format!("{}{path}", gateway.base_url));
    if let Some(cookie) = cookie {
        request = request.insert_header((header::COOKIE, cookie.to_owned()));
    }
    let response = request.send().await.expect("get request");
    record(response).await
}
