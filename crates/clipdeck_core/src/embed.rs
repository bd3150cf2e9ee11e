use std::time::Duration;

use crate::{Clip, Effect};

/// Identifies one selection. Every load/error/timeout signal carries the
/// token of the selection it was started for.
pub type SelectionToken = u64;

pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(10);

/// The clip currently handed to the embed provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub token: SelectionToken,
    pub clip_id: String,
    pub title: String,
    pub embed_url: String,
    pub playback_url: String,
}

impl Selection {
    fn from_clip(token: SelectionToken, clip: &Clip) -> Self {
        Self {
            token,
            clip_id: clip.id.clone(),
            title: clip.title.clone(),
            embed_url: clip.embed_url.clone(),
            playback_url: clip.playback_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmbedState {
    #[default]
    Idle,
    Loading(Selection),
    Loaded(Selection),
    /// The embed could not be confirmed; `fallback_url` opens the clip externally.
    Degraded {
        selection: Selection,
        fallback_url: String,
    },
}

impl EmbedState {
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            EmbedState::Idle => None,
            EmbedState::Loading(selection) | EmbedState::Loaded(selection) => Some(selection),
            EmbedState::Degraded { selection, .. } => Some(selection),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EmbedState::Loaded(_) | EmbedState::Degraded { .. })
    }
}

/// Load/timeout/fallback state machine for a single embed.
///
/// A selection owns exactly one pending wait (the engine's load probe and
/// timer share a cancellation handle). Every path out of `Loading` cancels
/// it, and signals for any other token are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedPlayer {
    state: EmbedState,
    last_token: SelectionToken,
    timeout: Duration,
}

impl Default for EmbedPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_EMBED_TIMEOUT)
    }
}

impl EmbedPlayer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: EmbedState::Idle,
            last_token: 0,
            timeout,
        }
    }

    pub fn state(&self) -> &EmbedState {
        &self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Token of the selection whose wait is still pending.
    pub fn pending_token(&self) -> Option<SelectionToken> {
        match &self.state {
            EmbedState::Loading(selection) => Some(selection.token),
            _ => None,
        }
    }

    pub fn fallback_link(&self) -> Option<&str> {
        match &self.state {
            EmbedState::Degraded { fallback_url, .. } => Some(fallback_url),
            _ => None,
        }
    }

    pub fn select(&mut self, clip: &Clip) -> Vec<Effect> {
        let mut effects = self.deselect();
        self.last_token += 1;
        let selection = Selection::from_clip(self.last_token, clip);

        if selection.embed_url.trim().is_empty() {
            self.state = EmbedState::Degraded {
                fallback_url: selection.playback_url.clone(),
                selection,
            };
            return effects;
        }

        effects.push(Effect::BeginEmbedLoad {
            token: selection.token,
            embed_url: selection.embed_url.clone(),
            timeout: self.timeout,
        });
        self.state = EmbedState::Loading(selection);
        effects
    }

    pub fn deselect(&mut self) -> Vec<Effect> {
        let effects = self
            .pending_token()
            .map(|token| vec![Effect::CancelEmbedLoad { token }])
            .unwrap_or_default();
        self.state = EmbedState::Idle;
        effects
    }

    pub fn on_loaded(&mut self, token: SelectionToken) -> Vec<Effect> {
        match self.take_pending(token) {
            Some(selection) => {
                self.state = EmbedState::Loaded(selection);
                vec![Effect::CancelEmbedLoad { token }]
            }
            None => Vec::new(),
        }
    }

    pub fn on_failed(&mut self, token: SelectionToken) -> Vec<Effect> {
        self.degrade(token)
    }

    pub fn on_timed_out(&mut self, token: SelectionToken) -> Vec<Effect> {
        self.degrade(token)
    }

    fn degrade(&mut self, token: SelectionToken) -> Vec<Effect> {
        match self.take_pending(token) {
            Some(selection) => {
                self.state = EmbedState::Degraded {
                    fallback_url: selection.playback_url.clone(),
                    selection,
                };
                vec![Effect::CancelEmbedLoad { token }]
            }
            None => Vec::new(),
        }
    }

    fn take_pending(&mut self, token: SelectionToken) -> Option<Selection> {
        if self.pending_token() != Some(token) {
            return None;
        }
        match std::mem::take(&mut self.state) {
            EmbedState::Loading(selection) => Some(selection),
            _ => None,
        }
    }
}
