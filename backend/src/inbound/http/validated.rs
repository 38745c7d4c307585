//! JSON body extractor that runs the validation pipeline.
//!
//! Handlers taking `Validated<T>` receive a payload that already passed
//! `T`'s schema; anything else has been answered with a single
//! `invalid_request` envelope.

use std::ops::Deref;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use realtime_contract::Validated as Schematic;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::domain::{Error, parse_payload};

/// Message for bodies that are not JSON at all.
pub const MALFORMED_BODY: &str = "request body must be valid JSON";

/// A JSON body checked against `T`'s schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    /// Unwrap the payload.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromRequest for Validated<T>
where
    T: Schematic + DeserializeOwned + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let body = web::Bytes::from_request(req, payload);
        Box::pin(async move {
            let bytes = body.await.map_err(|err| {
                debug!(error = %err, "request body could not be read");
                Error::invalid_request(MALFORMED_BODY)
            })?;
            let value: Value = serde_json::from_slice(&bytes).map_err(|err| {
                debug!(error = %err, "request body is not JSON");
                Error::invalid_request(MALFORMED_BODY)
            })?;
            parse_payload(value).map(Validated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use realtime_contract::Progress;
    use rstest::rstest;
    use serde_json::json;

    async fn echo(progress: Validated<Progress>) -> HttpResponse {
        let progress = progress.into_inner();
        HttpResponse::Ok().body(format!("{}:{}", progress.id, progress.progress_percent))
    }

    async fn post(body: &'static str) -> (StatusCode, Value) {
        let app = test::init_service(App::new().route("/", web::post().to(echo))).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/")
                .insert_header(("content-type", "application/json"))
                .set_payload(body)
                .to_request(),
        )
        .await;
        let status = res.status();
        let bytes = test::read_body(res).await;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ));
        (status, body)
    }

    #[rstest]
    #[actix_web::test]
    async fn valid_bodies_reach_the_handler_normalised() {
        let (status, body) = post(r#"{"id":" 123 ","progress_percent":42,"extra":true}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("123:42"));
    }

    #[rstest]
    #[case(r#"{"id":123,"progress_percent":42}"#, "id must be a string")]
    #[case(r#"{"id":"123","progress_percent":101}"#, "progress_percent must be between 0 and 100")]
    #[case("not json", MALFORMED_BODY)]
    #[actix_web::test]
    async fn invalid_bodies_are_one_error_envelope(#[case] body: &'static str, #[case] message: &str) {
        let (status, body) = post(body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "state": "error", "message": message }));
    }
}
