use async_trait::async_trait;
use engine_logging::engine_debug;

use crate::{ProbeOutcome, ServiceSettings, SetupError};

/// Asks the embed provider whether a clip's player will render.
///
/// Implementations do not enforce the selection timeout; the engine races
/// the probe against its own timer.
#[async_trait]
pub trait EmbedProbe: Send + Sync {
    async fn probe(&self, embed_url: &str) -> ProbeOutcome;
}

/// Treats a 2xx answer for the embed URL as a successful load.
#[derive(Debug, Clone)]
pub struct HttpEmbedProbe {
    client: reqwest::Client,
}

impl HttpEmbedProbe {
    pub fn new(settings: &ServiceSettings) -> Result<Self, SetupError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EmbedProbe for HttpEmbedProbe {
    async fn probe(&self, embed_url: &str) -> ProbeOutcome {
        let url = match url::Url::parse(embed_url) {
            Ok(url) => url,
            Err(err) => return ProbeOutcome::Failed(format!("invalid embed url: {err}")),
        };
        engine_debug!("Probing embed {}", url);
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Loaded,
            Ok(response) => ProbeOutcome::Failed(format!("embed answered {}", response.status())),
            Err(err) => ProbeOutcome::Failed(err.to_string()),
        }
    }
}
