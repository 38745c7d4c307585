//! Typed operation dispatch for realtime calls.
//!
//! Handlers implement [`OperationHandler`] for one contract operation and see
//! only its typed arguments. The [`Dispatcher`] erases them behind the wire
//! name, runs the validation pipeline and renders every outcome as a reply
//! envelope, so a handler can never answer with the wrong shape.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use realtime_contract::{CallFrame, Envelope, OPERATION_NAMES, Operation, ServerFrame};
use serde_json::Value;
use tracing::{debug, error};

use crate::domain::{ChannelIdentity, Error, TraceId, error_envelope, outcome_envelope, parse_payload};

/// Server-side implementation of contract operation `O`.
#[async_trait]
pub trait OperationHandler<O: Operation>: Send + Sync {
    /// Run the operation for the channel owner.
    async fn handle(&self, identity: &ChannelIdentity, args: O::Args) -> Result<O::Output, Error>;
}

#[async_trait]
trait ErasedHandler: Send + Sync {
    async fn call(&self, identity: &ChannelIdentity, args: Value) -> Envelope<Value>;
}

struct Typed<O, H> {
    handler: H,
    operation: PhantomData<fn() -> O>,
}

#[async_trait]
impl<O, H> ErasedHandler for Typed<O, H>
where
    O: Operation + 'static,
    H: OperationHandler<O>,
{
    async fn call(&self, identity: &ChannelIdentity, args: Value) -> Envelope<Value> {
        let outcome = match parse_payload::<O::Args>(args) {
            Ok(args) => self.handler.handle(identity, args).await,
            Err(err) => Err(err),
        };
        outcome_envelope(outcome, O::SUCCESS_MESSAGE)
            .try_map(serde_json::to_value)
            .unwrap_or_else(|err| {
                error!(operation = O::NAME, error = %err, "operation output failed to encode");
                error_envelope(&Error::internal(format!("output encoding failed: {err}")))
            })
    }
}

/// Raised when the registered handlers do not cover the contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no handler registered for operations: {}", .missing.join(", "))]
pub struct MissingHandlers {
    /// Contract operations without a handler.
    pub missing: Vec<&'static str>,
}

/// Collects handlers before the dispatcher is sealed.
#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: HashMap<&'static str, Arc<dyn ErasedHandler>>,
}

impl DispatcherBuilder {
    /// Register `handler` for operation `O`, replacing any earlier one.
    #[must_use]
    pub fn register<O, H>(mut self, handler: H) -> Self
    where
        O: Operation + 'static,
        H: OperationHandler<O> + 'static,
    {
        self.handlers.insert(
            O::NAME,
            Arc::new(Typed::<O, H> {
                handler,
                operation: PhantomData,
            }),
        );
        self
    }

    /// Contract operations that have no handler yet.
    #[must_use]
    pub fn missing_operations(&self) -> Vec<&'static str> {
        OPERATION_NAMES
            .iter()
            .copied()
            .filter(|name| !self.handlers.contains_key(name))
            .collect()
    }

    /// Seal the dispatcher; fails unless every contract operation is handled.
    pub fn build(self) -> Result<Dispatcher, MissingHandlers> {
        let missing = self.missing_operations();
        if !missing.is_empty() {
            return Err(MissingHandlers { missing });
        }
        Ok(Dispatcher {
            handlers: Arc::new(self.handlers),
        })
    }
}

/// Routes call frames to their handlers.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<HashMap<&'static str, Arc<dyn ErasedHandler>>>,
}

impl Dispatcher {
    /// Start registering handlers.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Run `call` for the channel owner and build its reply frame.
    ///
    /// Each call runs under a fresh trace id.
    pub async fn dispatch(&self, identity: &ChannelIdentity, call: CallFrame) -> ServerFrame {
        let CallFrame {
            request_id,
            op,
            args,
        } = call;
        let payload = match self.handlers.get(op.as_str()) {
            Some(handler) => {
                let trace_id = TraceId::generate();
                debug!(
                    operation = %op,
                    request_id = %request_id,
                    trace_id = %trace_id,
                    connection_id = %identity.connection_id(),
                    "dispatching realtime call"
                );
                TraceId::scope(trace_id, handler.call(identity, args)).await
            }
            None => {
                debug!(operation = %op, "unknown realtime operation");
                error_envelope(&Error::not_found(format!("unknown operation: {op}")))
            }
        };
        ServerFrame::Reply {
            request_id,
            op,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionRecord, SessionToken};
    use crate::test_support::sample_user;
    use chrono::Utc;
    use realtime_contract::{
        NoArgs, Progress, ReportProgress, SessionProfile, Whoami, decode_reply,
    };
    use rstest::{fixture, rstest};
    use serde_json::json;

    struct Profile;

    #[async_trait]
    impl OperationHandler<Whoami> for Profile {
        async fn handle(&self, identity: &ChannelIdentity, _args: NoArgs) -> Result<SessionProfile, Error> {
            Ok(identity.user().profile())
        }
    }

    struct Failing;

    #[async_trait]
    impl OperationHandler<ReportProgress> for Failing {
        async fn handle(&self, _identity: &ChannelIdentity, _args: Progress) -> Result<Progress, Error> {
            Err(Error::internal("queue unavailable"))
        }
    }

    #[fixture]
    fn identity() -> ChannelIdentity {
        let key = SessionToken::generate().key();
        let record = SessionRecord::new(sample_user(), Utc::now());
        ChannelIdentity::authorize(key, &record, Utc::now())
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::builder()
            .register::<Whoami, _>(Profile)
            .register::<ReportProgress, _>(Failing)
            .build()
            .expect("all operations handled")
    }

    fn call(op: &str, args: Value) -> CallFrame {
        CallFrame {
            request_id: "r1".to_owned(),
            op: op.to_owned(),
            args,
        }
    }

    #[rstest]
    fn build_reports_unhandled_operations() {
        let builder = Dispatcher::builder().register::<Whoami, _>(Profile);
        assert_eq!(builder.missing_operations(), vec!["reportProgress"]);
        let Err(err) = builder.build() else {
            panic!("expected missing handlers");
        };
        assert_eq!(
            err.to_string(),
            "no handler registered for operations: reportProgress"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn replies_carry_typed_output(identity: ChannelIdentity) {
        let reply = dispatcher().dispatch(&identity, call("whoami", json!({}))).await;

        let (request_id, envelope) = decode_reply::<Whoami>(reply).expect("whoami reply");
        assert_eq!(request_id, "r1");
        assert_eq!(envelope.data(), Some(&sample_user().profile()));
        assert_eq!(envelope.message(), "Session resolved");
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_arguments_never_reach_the_handler(identity: ChannelIdentity) {
        let reply = dispatcher()
            .dispatch(
                &identity,
                call("reportProgress", json!({ "id": 123, "progress_percent": 42 })),
            )
            .await;

        let (_, envelope) = decode_reply::<ReportProgress>(reply).expect("reply");
        assert_eq!(envelope, Envelope::error("id must be a string"));
    }

    #[rstest]
    #[tokio::test]
    async fn handler_failures_are_redacted(identity: ChannelIdentity) {
        let reply = dispatcher()
            .dispatch(
                &identity,
                call("reportProgress", json!({ "id": "123", "progress_percent": 42 })),
            )
            .await;

        let (_, envelope) = decode_reply::<ReportProgress>(reply).expect("reply");
        assert_eq!(envelope, Envelope::error("Internal server error"));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_operations_get_an_error_reply(identity: ChannelIdentity) {
        let reply = dispatcher().dispatch(&identity, call("dropTables", json!({}))).await;

        assert_eq!(
            reply,
            ServerFrame::Reply {
                request_id: "r1".to_owned(),
                op: "dropTables".to_owned(),
                payload: Envelope::error("unknown operation: dropTables"),
            }
        );
    }
}
