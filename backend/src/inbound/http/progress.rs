//! Progress API handler.
//!
//! ```text
//! POST /api/v1/progress {"id":"123","progress_percent":42}
//! ```
//!
//! The update is pushed as a `progress` event to every realtime channel of
//! the caller, then echoed in the response envelope.

use actix_web::web;
use realtime_contract::{Endpoint, Envelope, PublishProgress};

use crate::inbound::http::session::AuthenticatedSession;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validated::Validated;

/// Publish a progress update for the caller's jobs.
pub async fn publish_progress(
    state: web::Data<HttpState>,
    session: AuthenticatedSession,
    payload: Validated<<PublishProgress as Endpoint>::Request>,
) -> web::Json<Envelope<<PublishProgress as Endpoint>::Response>> {
    let progress = state.progress.publish(session.user(), payload.into_inner());
    web::Json(Envelope::success(progress, PublishProgress::SUCCESS_MESSAGE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::session::SESSION_COOKIE;
    use crate::inbound::http::test_utils::{TestHarness, harness};
    use crate::inbound::ws::hub::ChannelSignal;
    use crate::test_support::sample_user;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use realtime_contract::{Progress, ProgressEvent, decode_event};
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[actix_web::test]
    async fn progress_reaches_the_callers_channels(harness: TestHarness) {
        let token = harness.open_session(sample_user()).await;
        let identity = harness
            .state
            .sessions
            .authorize_channel(&token)
            .await
            .expect("resolve")
            .expect("live session");
        let mut signals = harness.hub.register(&identity);
        let app = test::init_service(
            App::new()
                .app_data(harness.data())
                .configure(crate::inbound::http::configure),
        )
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/progress")
                .cookie(Cookie::new(SESSION_COOKIE, token.as_str().to_owned()))
                .set_json(json!({ "id": "123", "progress_percent": 42 }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(
            body,
            json!({
                "state": "success",
                "data": { "id": "123", "progress_percent": 42 },
                "message": "Progress published"
            })
        );

        let Some(ChannelSignal::Push(frame)) = signals.try_recv().ok() else {
            panic!("expected a pushed frame");
        };
        let envelope = decode_event::<ProgressEvent>(frame).expect("progress event");
        assert_eq!(
            envelope.data(),
            Some(&Progress {
                id: "123".to_owned(),
                progress_percent: 42
            })
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn progress_requires_a_session(harness: TestHarness) {
        let app = test::init_service(
            App::new()
                .app_data(harness.data())
                .configure(crate::inbound::http::configure),
        )
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/progress")
                .set_json(json!({ "id": "123", "progress_percent": 42 }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({ "state": "error", "message": "login required" }));
    }
}
