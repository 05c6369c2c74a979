//! Job, step and event status model.
//!
//! Statuses are totally ordered by their numeric code. "Worse" means a higher
//! code, so rolling a set of statuses up is a `max`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum JobStatus {
    #[default]
    NotStarted = 0,
    Success = 1,
    Running = 2,
    Failed = 3,
    FailedOk = 4,
    Canceled = 5,
    /// Presentation only. Never stored on a job, step or event.
    ActivationRequired = 6,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::NotStarted,
        JobStatus::Success,
        JobStatus::Running,
        JobStatus::Failed,
        JobStatus::FailedOk,
        JobStatus::Canceled,
        JobStatus::ActivationRequired,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::Failed | JobStatus::FailedOk | JobStatus::Canceled
        )
    }

    pub fn is_failure(self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::FailedOk)
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            JobStatus::NotStarted => "Not started",
            JobStatus::Success => "Passed",
            JobStatus::Running => "Running",
            JobStatus::Failed => "Failed",
            JobStatus::FailedOk => "Allowed to fail",
            JobStatus::Canceled => "Canceled by user",
            JobStatus::ActivationRequired => "Requires activation",
        }
    }

    /// Short identifier used for CSS classes and badges.
    pub fn slug(self) -> &'static str {
        match self {
            JobStatus::NotStarted => "Not_Started",
            JobStatus::Success => "Passed",
            JobStatus::Running => "Running",
            JobStatus::Failed => "Failed",
            JobStatus::FailedOk => "Failed_OK",
            JobStatus::Canceled => "Canceled",
            JobStatus::ActivationRequired => "Activation_Required",
        }
    }

    /// The worst status of a set, or `None` when the set is empty.
    pub fn worst<I>(statuses: I) -> Option<Self>
    where
        I: IntoIterator<Item = JobStatus>,
    {
        statuses.into_iter().max()
    }

    /// Status to show for a job with the given stored status and activation flag.
    pub fn displayed(stored: JobStatus, active: bool) -> JobStatus {
        if !active && stored == JobStatus::NotStarted {
            JobStatus::ActivationRequired
        } else {
            stored
        }
    }

    /// Status a finished step records for its exit code.
    pub fn for_exit(exit_status: i32, allowed_to_fail: bool) -> JobStatus {
        match (exit_status, allowed_to_fail) {
            (0, _) => JobStatus::Success,
            (_, true) => JobStatus::FailedOk,
            (_, false) => JobStatus::Failed,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_follows_codes() {
        for pair in JobStatus::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].code() + 1, pair[1].code());
        }
    }

    #[test]
    fn test_from_code() {
        assert_eq!(JobStatus::from_code(4), Some(JobStatus::FailedOk));
        assert_eq!(JobStatus::from_code(7), None);
    }

    #[test]
    fn test_worst() {
        let worst = JobStatus::worst([JobStatus::Success, JobStatus::Failed, JobStatus::Running]);
        assert_eq!(worst, Some(JobStatus::Failed));
        assert_eq!(JobStatus::worst(Vec::<JobStatus>::new()), None);
    }

    #[test]
    fn test_displayed_activation_required() {
        assert_eq!(
            JobStatus::displayed(JobStatus::NotStarted, false),
            JobStatus::ActivationRequired
        );
        assert_eq!(
            JobStatus::displayed(JobStatus::NotStarted, true),
            JobStatus::NotStarted
        );
        assert_eq!(
            JobStatus::displayed(JobStatus::Canceled, false),
            JobStatus::Canceled
        );
    }

    #[test]
    fn test_for_exit() {
        assert_eq!(JobStatus::for_exit(0, true), JobStatus::Success);
        assert_eq!(JobStatus::for_exit(2, true), JobStatus::FailedOk);
        assert_eq!(JobStatus::for_exit(-9, false), JobStatus::Failed);
    }

    #[test]
    fn test_slugs() {
        assert_eq!(JobStatus::FailedOk.slug(), "Failed_OK");
        assert_eq!(JobStatus::ActivationRequired.slug(), "Activation_Required");
        assert_eq!(JobStatus::Success.to_string(), "Passed");
    }
}
