use std::sync::{mpsc, Arc};

use clipdeck_core::{Effect, Msg};
use clipdeck_engine::{EngineEvent, EngineHandle, EventSink, SetupError};
use engine_logging::{engine_debug, engine_info};

use super::config::AppConfig;

/// Executes core effects on the engine and feeds engine results back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: &AppConfig, msg_tx: mpsc::Sender<Msg>) -> Result<Self, SetupError> {
        let sink = Arc::new(MsgSink { msg_tx });
        let engine =
            EngineHandle::new(&config.service_settings(), config.output_dir.clone(), sink)?;
        engine_info!(
            "Engine ready: api={} output={:?}",
            config.api_base_url,
            config.output_dir
        );
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            engine_debug!("Effect {:?}", effect);
            match effect {
                Effect::StartPolling { interval } => self.engine.start_polling(interval),
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::RefreshJobs => self.engine.refresh_jobs(),
                Effect::SubmitJob { parameters } => self.engine.submit(parameters),
                Effect::DeleteJob { job_id } => self.engine.delete(job_id),
                Effect::FetchClips { job_id } => self.engine.fetch_clips(job_id),
                Effect::DownloadArtifact { job_id } => self.engine.download(job_id),
                Effect::CheckHealth => self.engine.check_health(),
                Effect::FetchPreset { name } => self.engine.fetch_preset(name),
                Effect::BeginEmbedLoad {
                    token,
                    embed_url,
                    timeout,
                } => self.engine.begin_embed_load(token, embed_url, timeout),
                Effect::CancelEmbedLoad { token } => self.engine.cancel_embed_load(token),
            }
        }
    }
}

struct MsgSink {
    msg_tx: mpsc::Sender<Msg>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.msg_tx.send(to_msg(event));
    }
}

fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PollDue => Msg::PollTick,
        EngineEvent::JobsListed(result) => Msg::JobsRefreshed(result),
        EngineEvent::JobSubmitted(result) => Msg::JobSubmitted(result),
        EngineEvent::JobDeleted { job_id, result } => Msg::JobDeleted { job_id, result },
        EngineEvent::ClipsFetched { job_id, result } => Msg::ClipsFetched { job_id, result },
        EngineEvent::ArtifactSaved { job_id, result } => Msg::ArtifactSaved { job_id, result },
        EngineEvent::HealthChecked(result) => Msg::HealthChecked(result),
        EngineEvent::PresetFetched { name, result } => Msg::PresetFetched { name, result },
        EngineEvent::EmbedLoaded { token } => Msg::EmbedLoaded { token },
        EngineEvent::EmbedFailed { token } => Msg::EmbedFailed { token },
        EngineEvent::EmbedTimedOut { token } => Msg::EmbedTimedOut { token },
    }
}
