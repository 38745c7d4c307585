//! Request middleware.
//!
//! Purpose: define middleware for request lifecycle concerns: trace
//! correlation for every request and the session gate in front of the
//! realtime scope.

pub mod session_gate;
pub mod trace;

pub use session_gate::SessionGate;
pub use trace::Trace;
