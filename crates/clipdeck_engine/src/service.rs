use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use clipdeck_core::{
    ChannelHighlightsParams, Clip, Job, JobId, JobParameters, ServiceError, ServiceHealth,
};
use engine_logging::{engine_debug, engine_warn};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::wire::{self, ClipList, ErrorBody, HealthRecord, JobList, PresetRecord, SubmitResponse};
use crate::{ServiceSettings, SetupError};

/// The remote job service, as seen by the engine.
#[async_trait]
pub trait JobService: Send + Sync {
    async fn submit(&self, parameters: &JobParameters) -> Result<JobId, ServiceError>;
    async fn list_jobs(&self) -> Result<Vec<Job>, ServiceError>;
    /// Not driven by the engine; jobs are followed through `list_jobs`.
    async fn get_job(&self, job_id: JobId) -> Result<Job, ServiceError>;
    async fn delete_job(&self, job_id: JobId) -> Result<(), ServiceError>;
    async fn fetch_clips(&self, job_id: JobId) -> Result<Vec<Clip>, ServiceError>;
    async fn download_artifact(&self, job_id: JobId) -> Result<Bytes, ServiceError>;
    async fn health(&self) -> Result<ServiceHealth, ServiceError>;
    async fn preset(&self, name: &str) -> Result<ChannelHighlightsParams, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct HttpJobService {
    base: Url,
    client: reqwest::Client,
    max_artifact_bytes: u64,
}

impl HttpJobService {
    pub fn new(settings: &ServiceSettings) -> Result<Self, SetupError> {
        let invalid = |reason: String| SetupError::InvalidBaseUrl {
            url: settings.base_url.clone(),
            reason,
        };
        let base = Url::parse(settings.base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("not a hierarchical url".to_string()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            base,
            client,
            max_artifact_bytes: settings.max_artifact_bytes,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        engine_debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    /// Sends `request` and returns the body of a 2xx response.
    async fn send(&self, request: RequestBuilder, subject: &str) -> Result<Bytes, ServiceError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return response.bytes().await.map_err(transport_error);
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(status_error(status, &body, subject))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        subject: &str,
    ) -> Result<T, ServiceError> {
        let body = self.send(self.request(Method::GET, segments), subject).await?;
        decode(&body)
    }
}

#[async_trait]
impl JobService for HttpJobService {
    async fn submit(&self, parameters: &JobParameters) -> Result<JobId, ServiceError> {
        let (path, body) = wire::submit_request(parameters)
            .map_err(|err| ServiceError::Validation(err.to_string()))?;
        let request = self
            .request(Method::POST, &["scrape", path])
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let body = self.send(request, "submission").await?;
        let response: SubmitResponse = decode(&body)?;
        Ok(response.job_id)
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, ServiceError> {
        let list: JobList = self.get_json(&["jobs"], "job list").await?;
        Ok(list.jobs.into_iter().filter_map(wire::decode_job).collect())
    }

    async fn get_job(&self, job_id: JobId) -> Result<Job, ServiceError> {
        let id = job_id.to_string();
        let subject = format!("job {job_id}");
        let value: serde_json::Value = self.get_json(&["jobs", id.as_str()], &subject).await?;
        wire::decode_job(value)
            .ok_or_else(|| ServiceError::Transient(format!("{subject} could not be decoded")))
    }

    async fn delete_job(&self, job_id: JobId) -> Result<(), ServiceError> {
        let id = job_id.to_string();
        self.send(self.request(Method::DELETE, &["jobs", id.as_str()]), &format!("job {job_id}"))
            .await?;
        Ok(())
    }

    async fn fetch_clips(&self, job_id: JobId) -> Result<Vec<Clip>, ServiceError> {
        let id = job_id.to_string();
        let list: ClipList = self
            .get_json(&["jobs", id.as_str(), "clips"], &format!("job {job_id}"))
            .await?;
        Ok(list.clips.into_iter().filter_map(wire::decode_clip).collect())
    }

    async fn download_artifact(&self, job_id: JobId) -> Result<Bytes, ServiceError> {
        let id = job_id.to_string();
        let subject = format!("job {job_id}");
        let response = self
            .request(Method::GET, &["jobs", id.as_str(), "download"])
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(status_error(status, &body, &subject));
        }

        let max = self.max_artifact_bytes;
        if let Some(len) = response.content_length() {
            if len > max {
                return Err(too_large(max, len));
            }
        }
        let mut artifact = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(transport_error)?;
            let next_len = artifact.len() as u64 + chunk.len() as u64;
            if next_len > max {
                return Err(too_large(max, next_len));
            }
            artifact.extend_from_slice(&chunk);
        }
        Ok(artifact.freeze())
    }

    async fn health(&self) -> Result<ServiceHealth, ServiceError> {
        let record: HealthRecord = self.get_json(&["health"], "health check").await?;
        Ok(record.into())
    }

    async fn preset(&self, name: &str) -> Result<ChannelHighlightsParams, ServiceError> {
        let record: PresetRecord = self
            .get_json(&["presets", name], &format!("preset {name}"))
            .await?;
        Ok(record.into())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(body).map_err(|err| {
        engine_warn!("Undecodable service response: {}", err);
        ServiceError::Transient(format!("undecodable response: {err}"))
    })
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    engine_warn!("Service request failed: {}", err);
    if err.is_timeout() {
        ServiceError::Transient("request timed out".to_string())
    } else {
        ServiceError::Transient(err.to_string())
    }
}

/// 404 is `NotFound`, any other 4xx is a rejection, everything else is transient.
pub(crate) fn status_error(status: StatusCode, body: &[u8], subject: &str) -> ServiceError {
    let message = ErrorBody::parse(body);
    engine_warn!(
        "Service answered {} for {}: {}",
        status,
        subject,
        message.as_deref().unwrap_or("-")
    );
    if status == StatusCode::NOT_FOUND {
        ServiceError::NotFound(message.unwrap_or_else(|| subject.to_string()))
    } else if status.is_client_error() {
        ServiceError::Validation(message.unwrap_or_else(|| status.to_string()))
    } else {
        ServiceError::Transient(message.unwrap_or_else(|| status.to_string()))
    }
}

fn too_large(max: u64, actual: u64) -> ServiceError {
    ServiceError::Transient(format!("artifact too large (max {max} bytes, got {actual})"))
}
