use thiserror::Error;

/// Submission parameters rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one channel is required")]
    EmptyChannelList,
    #[error("days back must be between 1 and 30, got {0}")]
    DaysBackOutOfRange(u32),
    #[error("limit must be between 1 and 500, got {0}")]
    LimitOutOfRange(u32),
    #[error("clips per channel must be between 1 and 100, got {0}")]
    ClipsPerChannelOutOfRange(u32),
}

/// Failure reported by (or while talking to) the job service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// 4xx other than 404: the request itself was refused.
    #[error("rejected by service: {0}")]
    Validation(String),
    /// 404: the referenced job is unknown to the service.
    #[error("not found: {0}")]
    NotFound(String),
    /// 5xx, network failure, timeout or an undecodable response.
    #[error("service unavailable: {0}")]
    Transient(String),
}

impl ServiceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}
