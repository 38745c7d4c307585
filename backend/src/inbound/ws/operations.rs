//! Handlers for the realtime contract operations.

use async_trait::async_trait;
use realtime_contract::{NoArgs, Progress, ReportProgress, SessionProfile, Whoami};

use crate::domain::{ChannelIdentity, Error, ProgressService};

use super::dispatch::{Dispatcher, MissingHandlers, OperationHandler};

/// `whoami`: the profile captured when the channel was authorised.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhoamiHandler;

#[async_trait]
impl OperationHandler<Whoami> for WhoamiHandler {
    async fn handle(&self, identity: &ChannelIdentity, _args: NoArgs) -> Result<SessionProfile, Error> {
        Ok(identity.user().profile())
    }
}

/// `reportProgress`: publish to the caller's channels and echo the update.
#[derive(Clone)]
pub struct ReportProgressHandler {
    progress: ProgressService,
}

impl ReportProgressHandler {
    /// Build the handler over the shared progress service.
    pub fn new(progress: ProgressService) -> Self {
        Self { progress }
    }
}

#[async_trait]
impl OperationHandler<ReportProgress> for ReportProgressHandler {
    async fn handle(&self, identity: &ChannelIdentity, args: Progress) -> Result<Progress, Error> {
        Ok(self.progress.publish(identity.user(), args))
    }
}

/// Dispatcher with a handler for every contract operation.
pub fn gateway_dispatcher(progress: ProgressService) -> Result<Dispatcher, MissingHandlers> {
    Dispatcher::builder()
        .register::<Whoami, _>(WhoamiHandler)
        .register::<ReportProgress, _>(ReportProgressHandler::new(progress))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::{SessionRecord, SessionToken};
    use crate::inbound::ws::hub::{ChannelHub, ChannelSignal};
    use crate::test_support::sample_user;
    use chrono::Utc;
    use realtime_contract::{CallFrame, ProgressEvent, decode_event, decode_reply};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[tokio::test]
    async fn report_progress_echoes_and_pushes_to_the_caller() {
        let hub = Arc::new(ChannelHub::default());
        let dispatcher =
            gateway_dispatcher(ProgressService::new(hub.clone())).expect("complete dispatcher");
        let record = SessionRecord::new(sample_user(), Utc::now());
        let identity = ChannelIdentity::authorize(SessionToken::generate().key(), &record, Utc::now());
        let mut signals = hub.register(&identity);

        let reply = dispatcher
            .dispatch(
                &identity,
                CallFrame {
                    request_id: "r7".to_owned(),
                    op: "reportProgress".to_owned(),
                    args: json!({ "id": "123", "progress_percent": 42 }),
                },
            )
            .await;

        let expected = Progress {
            id: "123".to_owned(),
            progress_percent: 42,
        };
        let (request_id, envelope) = decode_reply::<ReportProgress>(reply).expect("reply");
        assert_eq!(request_id, "r7");
        assert_eq!(envelope.data(), Some(&expected));
        let Ok(ChannelSignal::Push(frame)) = signals.try_recv() else {
            panic!("expected a progress event");
        };
        let event = decode_event::<ProgressEvent>(frame).expect("progress event");
        assert_eq!(event.data(), Some(&expected));
        assert_eq!(event.message(), "Progress updated");
    }
}
