//! Test utilities shared by unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for tests and with the `test-support` feature.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::LoginService;
use crate::domain::{CredentialLoginService, User};
use crate::outbound::credentials::MemoryCredentialRepository;

/// Identifier of [`sample_user`].
pub const SAMPLE_USER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

/// A fixed, valid user.
///
/// # Panics
/// Never in practice: the literals satisfy every user invariant.
#[must_use]
pub fn sample_user() -> User {
    match User::try_from_strings(SAMPLE_USER_ID, "ada", "Ada Lovelace") {
        Ok(user) => user,
        Err(err) => panic!("sample user must be valid: {err}"),
    }
}

/// Login service holding only the bcrypt-hashed development account.
///
/// # Panics
/// If the development account cannot be hashed.
#[must_use]
pub fn development_login() -> Arc<dyn LoginService> {
    match MemoryCredentialRepository::default().with_development_account() {
        Ok(credentials) => Arc::new(CredentialLoginService::new(Arc::new(credentials))),
        Err(err) => panic!("development account must register: {err}"),
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Clock frozen at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock frozen at 2026-01-01T08:00:00Z.
    ///
    /// # Panics
    /// Never in practice: the literal timestamp is valid.
    #[must_use]
    pub fn at_fixture_time() -> Self {
        match Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).single() {
            Some(now) => Self::new(now),
            None => panic!("fixture timestamp must be valid"),
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
