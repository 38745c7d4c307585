//! Progress publication shared by the HTTP endpoint and the realtime
//! `reportProgress` operation.

use std::sync::Arc;

use realtime_contract::Progress;
use tracing::info;

use super::User;
use super::ports::ChannelRegistry;

/// Fans progress reports out to the reporting user's channels.
#[derive(Clone)]
pub struct ProgressService {
    channels: Arc<dyn ChannelRegistry>,
}

impl ProgressService {
    /// Build the service over the live channel registry.
    pub fn new(channels: Arc<dyn ChannelRegistry>) -> Self {
        Self { channels }
    }

    /// Publish `progress` on behalf of `user` and echo it back.
    #[must_use]
    pub fn publish(&self, user: &User, progress: Progress) -> Progress {
        let delivered = self.channels.publish_progress(user.id(), &progress);
        info!(
            user_id = %user.id(),
            job_id = %progress.id,
            progress_percent = progress.progress_percent,
            delivered,
            "progress published"
        );
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockChannelRegistry;
    use crate::test_support::sample_user;
    use rstest::rstest;

    #[rstest]
    fn publishes_to_the_reporting_user() {
        let user = sample_user();
        let expected_id = user.id().clone();
        let mut channels = MockChannelRegistry::new();
        channels
            .expect_publish_progress()
            .withf(move |id, progress| id == &expected_id && progress.progress_percent == 42)
            .times(1)
            .return_const(1_usize);
        let service = ProgressService::new(Arc::new(channels));

        let echoed = service.publish(
            &user,
            Progress {
                id: "123".to_owned(),
                progress_percent: 42,
            },
        );

        assert_eq!(echoed.id, "123");
    }
}
