//! Operation and event contracts.
//!
//! An [`Operation`] ties a wire name to its argument and output types. Server
//! handlers are written against `O::Args`/`O::Output` and clients encode calls
//! from the same associated types, so a change on one side that the other does
//! not follow is a compile error rather than a runtime surprise.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::schema::Validated;

/// A callable realtime operation.
pub trait Operation {
    /// Wire name used in call frames.
    const NAME: &'static str;
    /// Message attached to successful replies.
    const SUCCESS_MESSAGE: &'static str;
    /// Argument payload; checked against its schema before deserialisation.
    type Args: Validated + Serialize + DeserializeOwned + Send + 'static;
    /// Result payload carried in the success envelope.
    type Output: Serialize + DeserializeOwned + Send + 'static;
}

/// A server-pushed event.
pub trait Event {
    /// Wire name used in event frames.
    const NAME: &'static str;
    /// Message attached to the pushed envelope.
    const MESSAGE: &'static str;
    /// Event payload carried in the success envelope.
    type Payload: Serialize + DeserializeOwned + Send + 'static;
}

/// Declare operation marker types and the list of their wire names.
///
/// Each entry becomes a unit struct implementing [`Operation`]; the macro also
/// emits `OPERATION_NAMES`, which servers compare against their registered
/// handlers.
macro_rules! define_operations {
    (
        $(
            $(#[$meta:meta])*
            $marker:ident => $name:literal {
                args: $args:ty,
                output: $output:ty,
                message: $message:literal $(,)?
            }
        ),* $(,)?
    ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $marker;

            impl $crate::Operation for $marker {
                const NAME: &'static str = $name;
                const SUCCESS_MESSAGE: &'static str = $message;
                type Args = $args;
                type Output = $output;
            }
        )*

        /// Wire names of every declared operation.
        pub const OPERATION_NAMES: &[&str] = &[$($name),*];
    };
}

pub(crate) use define_operations;
