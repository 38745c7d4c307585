//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::web;
use rstest::fixture;

use crate::domain::{
    CredentialLoginService, CredentialRecord, ExpiryPolicy, ProgressService, SessionService,
    SessionToken, User, hash_password,
};
use crate::inbound::ws::hub::ChannelHub;
use crate::outbound::credentials::MemoryCredentialRepository;
use crate::outbound::session_store::MemorySessionStore;
use crate::test_support::{ManualClock, sample_user};

use super::session_config::SessionSettings;
use super::state::HttpState;

/// Password of [`sample_user`] in the harness credential repository.
pub const SAMPLE_PASSWORD: &str = "correct horse";

/// In-memory wiring of every HTTP dependency around a manual clock.
pub struct TestHarness {
    pub clock: Arc<ManualClock>,
    pub hub: Arc<ChannelHub>,
    pub state: HttpState,
}

impl TestHarness {
    /// State wrapped for `App::app_data`.
    pub fn data(&self) -> web::Data<HttpState> {
        web::Data::new(self.state.clone())
    }

    /// Open a session directly through the service.
    pub async fn open_session(&self, user: User) -> SessionToken {
        self.state
            .sessions
            .open(user)
            .await
            .expect("in-memory store accepts sessions")
    }
}

/// Harness with [`sample_user`] registered under [`SAMPLE_PASSWORD`].
#[fixture]
pub fn harness() -> TestHarness {
    let clock = Arc::new(ManualClock::at_fixture_time());
    let hub = Arc::new(ChannelHub::default());
    let digest = hash_password(SAMPLE_PASSWORD).expect("hashing succeeds");
    let credentials =
        MemoryCredentialRepository::default().with_record(CredentialRecord::new(sample_user(), digest));
    let sessions = SessionService::new(
        Arc::new(MemorySessionStore::default()),
        clock.clone(),
        ExpiryPolicy::default(),
    );
    let state = HttpState::new(
        Arc::new(CredentialLoginService::new(Arc::new(credentials))),
        sessions,
        ProgressService::new(hub.clone()),
        SessionSettings::insecure_for_tests(),
    );
    TestHarness { clock, hub, state }
}
