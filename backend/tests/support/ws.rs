//! WebSocket-focused test helpers.
//!
//! Integration tests under `backend/tests/` compile as separate crates, so
//! sharing the socket plumbing avoids copy/paste drift between suites.

use std::time::Duration;

use actix_http::ws::CloseReason;
use actix_web::http::{StatusCode, header};
use awc::error::WsClientError;
use awc::{BoxedSocket, ws::Codec, ws::Frame, ws::Message};
use futures::{SinkExt, StreamExt};
use realtime_contract::{Operation, ServerFrame, encode_call};

/// Client side of a realtime channel.
pub type Socket = actix_codec::Framed<BoxedSocket, Codec>;

/// Open a channel, returning the rejection status when the upgrade fails.
pub async fn try_connect(
    url: &str,
    origin: &str,
    cookie: Option<&str>,
) -> Result<Socket, StatusCode> {
    let mut request = awc::Client::default()
        .ws(url)
        .set_header(header::ORIGIN, origin);
    if let Some(cookie) = cookie {
        request = request.set_header(header::COOKIE, cookie.to_owned());
    }
    match request.connect().await {
        Ok((_resp, socket)) => Ok(socket),
        Err(WsClientError::InvalidResponseStatus(status)) => Err(status),
        Err(other) => panic!("unexpected WebSocket client error: {other}"),
    }
}

/// Send a typed call as a text frame.
pub async fn send_call<O: Operation>(socket: &mut Socket, request_id: &str, args: &O::Args) {
    let text = encode_call::<O>(request_id, args).expect("encode call");
    socket
        .send(Message::Text(text.into()))
        .await
        .expect("send call");
}

/// Next non-heartbeat frame, failing after five seconds.
pub async fn next_frame(socket: &mut Socket) -> Frame {
    let wait = async {
        loop {
            let frame = socket.next().await.expect("response frame").expect("frame");
            match frame {
                Frame::Ping(_) | Frame::Pong(_) => continue,
                other => return other,
            }
        }
    };
    actix_rt::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("frame within timeout")
}

/// Next frame decoded as a reply or event.
pub async fn next_server_frame(socket: &mut Socket) -> ServerFrame {
    match next_frame(socket).await {
        Frame::Text(bytes) => serde_json::from_slice(&bytes).expect("server frame json"),
        other => panic!("expected text frame, got {other:?}"),
    }
}

/// Wait for the server to close the channel.
pub async fn expect_close(socket: &mut Socket) -> CloseReason {
    match next_frame(socket).await {
        Frame::Close(Some(reason)) => reason,
        other => panic!("expected close frame, got {other:?}"),
    }
}
