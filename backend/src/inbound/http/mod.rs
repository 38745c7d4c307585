//! HTTP inbound adapter exposing the session and progress endpoints.

use actix_web::{Route, web};
use realtime_contract::{CurrentSession, Endpoint, Login, Logout, Method, PublishProgress};

pub mod error;
pub mod health;
pub mod progress;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validated;

pub use error::ApiResult;

fn route_for<E: Endpoint>() -> Route {
    match E::METHOD {
        Method::Get => web::get(),
        Method::Post => web::post(),
    }
}

/// Mount every contract endpoint at its declared method and path.
///
/// Other methods on a mounted path answer `405 Method Not Allowed`.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use backend::inbound::http;
///
/// let app = App::new().configure(http::configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource(Login::PATH).route(route_for::<Login>().to(users::login)))
        .service(web::resource(Logout::PATH).route(route_for::<Logout>().to(users::logout)))
        .service(
            web::resource(CurrentSession::PATH)
                .route(route_for::<CurrentSession>().to(users::current_session)),
        )
        .service(
            web::resource(PublishProgress::PATH)
                .route(route_for::<PublishProgress>().to(progress::publish_progress)),
        );
}
