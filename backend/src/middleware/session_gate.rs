//! Session gate for the realtime scope.
//!
//! Wraps the `/ws` scope so the session bridge runs on every upgrade request
//! before the WebSocket handler. Refused handshakes get a `401` error
//! envelope and are never upgraded; accepted ones carry their
//! [`ChannelIdentity`](crate::domain::ChannelIdentity) in the request
//! extensions.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage, ResponseError};
use futures_util::future::{LocalBoxFuture, Ready, ready};

use crate::domain::Error as DomainError;
use crate::inbound::http::session::SESSION_COOKIE;
use crate::inbound::ws::bridge::SessionBridge;

/// Message of the envelope returned for refused handshakes.
pub const HANDSHAKE_REJECTED: &str = "valid session required";

/// Middleware factory running the [`SessionBridge`] ahead of the wrapped
/// services.
#[derive(Clone)]
pub struct SessionGate {
    bridge: SessionBridge,
}

impl SessionGate {
    /// Gate handshakes through `bridge`.
    pub fn new(bridge: SessionBridge) -> Self {
        Self { bridge }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionGateMiddleware {
            service: Rc::new(service),
            bridge: self.bridge.clone(),
        }))
    }
}

/// Service wrapper produced by [`SessionGate`].
pub struct SessionGateMiddleware<S> {
    service: Rc<S>,
    bridge: SessionBridge,
}

impl<S, B> Service<ServiceRequest> for SessionGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let bridge = self.bridge.clone();
        Box::pin(async move {
            let cookie = req.cookie(SESSION_COOKIE);
            match bridge.authorize(cookie).await {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(_) => {
                    let response = DomainError::unauthorized(HANDSHAKE_REJECTED).error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
