use std::collections::{BTreeMap, BTreeSet};

use crate::{Job, JobId, JobParameters, ServiceError, ValidationError};

/// Whether the job list has ever been loaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Initial,
    /// The first refresh failed; nothing to show yet, offer a retry.
    InitialFailed { message: String },
    Ready,
}

/// Outcome of the last user action, shown inline next to that action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionNotice {
    Submitted { job_id: JobId },
    SubmitRejected { message: String },
    Deleted { job_id: JobId },
    DeleteFailed { job_id: JobId, message: String },
    DownloadRejected { job_id: JobId, message: String },
}

/// Eventually-consistent local view of the jobs known to the service.
///
/// The server is the single source of truth: refresh results replace the
/// local set wholesale and the tracker never writes a job state itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobTracker {
    jobs: BTreeMap<JobId, Job>,
    phase: LoadPhase,
    polling: bool,
    refresh_in_flight: bool,
    // A refresh asked for while another was outstanding; issued once that one lands.
    refresh_queued: bool,
    // Jobs deleted while a refresh was outstanding; that refresh may still list them.
    deleted_during_refresh: BTreeSet<JobId>,
    deleting: BTreeSet<JobId>,
    submits_in_flight: usize,
    stale_error: Option<String>,
    last_submitted: Option<JobId>,
    notice: Option<ActionNotice>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn job(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.get(&job_id)
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh_in_flight
    }

    pub fn is_submitting(&self) -> bool {
        self.submits_in_flight > 0
    }

    pub fn is_deleting(&self, job_id: JobId) -> bool {
        self.deleting.contains(&job_id)
    }

    /// Message of the last failed refresh, if the list is currently stale.
    pub fn stale_error(&self) -> Option<&str> {
        self.stale_error.as_deref()
    }

    pub fn last_submitted(&self) -> Option<JobId> {
        self.last_submitted
    }

    pub fn notice(&self) -> Option<&ActionNotice> {
        self.notice.as_ref()
    }

    /// True when every known job is terminal (vacuously true when empty).
    pub fn all_terminal(&self) -> bool {
        self.jobs.values().all(Job::is_terminal)
    }

    /// Returns `true` if the poll schedule should be started.
    pub fn mount(&mut self) -> bool {
        let start = !self.polling;
        self.polling = true;
        start
    }

    /// Returns `true` if the poll schedule should be stopped.
    pub fn unmount(&mut self) -> bool {
        let stop = self.polling;
        self.polling = false;
        stop
    }

    /// Validates a submission. On success the caller issues the request.
    pub fn begin_submit(
        &mut self,
        parameters: JobParameters,
    ) -> Result<JobParameters, ValidationError> {
        match parameters.validated() {
            Ok(parameters) => {
                self.submits_in_flight += 1;
                self.notice = None;
                Ok(parameters)
            }
            Err(err) => {
                self.notice = Some(ActionNotice::SubmitRejected {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    pub fn finish_submit(&mut self, result: Result<JobId, ServiceError>) {
        self.submits_in_flight = self.submits_in_flight.saturating_sub(1);
        match result {
            Ok(job_id) => {
                self.last_submitted = Some(job_id);
                self.notice = Some(ActionNotice::Submitted { job_id });
            }
            Err(err) => {
                self.notice = Some(ActionNotice::SubmitRejected {
                    message: err.to_string(),
                });
            }
        }
    }

    /// Returns `false` while a previous refresh is still outstanding.
    pub fn begin_refresh(&mut self) -> bool {
        if self.refresh_in_flight {
            return false;
        }
        self.refresh_in_flight = true;
        true
    }

    /// Like [`begin_refresh`](Self::begin_refresh), but a refused request is
    /// remembered and reported by the next [`apply_refresh`](Self::apply_refresh).
    pub fn begin_or_queue_refresh(&mut self) -> bool {
        if self.begin_refresh() {
            return true;
        }
        self.refresh_queued = true;
        false
    }

    /// Returns `true` if a queued refresh is now due.
    pub fn apply_refresh(&mut self, result: Result<Vec<Job>, ServiceError>) -> bool {
        self.refresh_in_flight = false;
        let deleted = std::mem::take(&mut self.deleted_during_refresh);
        match result {
            Ok(jobs) => {
                self.jobs = jobs
                    .into_iter()
                    .filter(|job| !deleted.contains(&job.id))
                    .map(|job| (job.id, job))
                    .collect();
                self.phase = LoadPhase::Ready;
                self.stale_error = None;
            }
            Err(err) => {
                let message = err.to_string();
                if self.phase != LoadPhase::Ready {
                    self.phase = LoadPhase::InitialFailed {
                        message: message.clone(),
                    };
                }
                self.stale_error = Some(message);
            }
        }
        std::mem::take(&mut self.refresh_queued)
    }

    /// Returns `false` if a delete for this job is already outstanding.
    pub fn begin_delete(&mut self, job_id: JobId) -> bool {
        self.deleting.insert(job_id)
    }

    pub fn apply_delete(&mut self, job_id: JobId, result: Result<(), ServiceError>) {
        self.deleting.remove(&job_id);
        match result {
            Ok(()) => {
                self.purge(job_id);
                self.notice = Some(ActionNotice::Deleted { job_id });
            }
            Err(err) => {
                if err.is_not_found() {
                    self.purge(job_id);
                }
                self.notice = Some(ActionNotice::DeleteFailed {
                    job_id,
                    message: err.to_string(),
                });
            }
        }
    }

    pub(crate) fn set_notice(&mut self, notice: ActionNotice) {
        self.notice = Some(notice);
    }

    fn purge(&mut self, job_id: JobId) {
        self.jobs.remove(&job_id);
        if self.refresh_in_flight {
            self.deleted_during_refresh.insert(job_id);
        }
    }
}
