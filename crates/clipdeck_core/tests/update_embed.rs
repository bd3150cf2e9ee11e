use std::time::Duration;

use clipdeck_core::{
    update, AppState, Clip, EmbedPlayer, EmbedState, Effect, Job, JobParameters, JobState, Msg,
    PlayerView, SelectionToken, Timing, TopClipsParams,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn clip(id: &str) -> Clip {
    Clip {
        id: id.to_string(),
        title: format!("clip {id}"),
        playback_url: format!("https://clips.example.com/{id}"),
        embed_url: format!("https://embed.example.com/?clip={id}"),
        ..Clip::default()
    }
}

fn begin_token(effects: &[Effect]) -> SelectionToken {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::BeginEmbedLoad { token, .. } => Some(*token),
            _ => None,
        })
        .expect("begin effect")
}

/// A mounted app with job 1 completed and its gallery loaded with clips a and b.
fn gallery() -> AppState {
    let job = Job {
        id: 1,
        parameters: JobParameters::TopClips(TopClipsParams::default()),
        state: JobState::Completed,
        progress: 100,
        summary: None,
        error: None,
        created_at: None,
        completed_at: None,
    };
    let (state, _) = update(AppState::new(), Msg::Mounted);
    let (state, _) = update(state, Msg::JobsRefreshed(Ok(vec![job])));
    let (state, _) = update(state, Msg::ClipsRequested { job_id: 1 });
    let (state, _) = update(
        state,
        Msg::ClipsFetched {
            job_id: 1,
            result: Ok(vec![clip("a"), clip("b")]),
        },
    );
    state
}

#[test]
fn selecting_a_clip_starts_a_bounded_load() {
    init_logging();
    let mut player = EmbedPlayer::default();
    let effects = player.select(&clip("a"));

    assert_eq!(
        effects,
        vec![Effect::BeginEmbedLoad {
            token: 1,
            embed_url: "https://embed.example.com/?clip=a".to_string(),
            timeout: Duration::from_secs(10),
        }]
    );
    assert!(matches!(player.state(), EmbedState::Loading(_)));
    assert_eq!(player.pending_token(), Some(1));
}

#[test]
fn load_before_timeout_ends_loaded_and_cancels_the_timer() {
    init_logging();
    let mut player = EmbedPlayer::default();
    let token = begin_token(&player.select(&clip("a")));

    assert_eq!(
        player.on_loaded(token),
        vec![Effect::CancelEmbedLoad { token }]
    );
    assert!(matches!(player.state(), EmbedState::Loaded(_)));

    // Firing the same timer afterwards has no observable effect.
    let before = player.clone();
    assert!(player.on_timed_out(token).is_empty());
    assert_eq!(player, before);
}

#[test]
fn timeout_without_signal_degrades_to_playback_link() {
    let mut player = EmbedPlayer::default();
    let token = begin_token(&player.select(&clip("a")));

    assert_eq!(
        player.on_timed_out(token),
        vec![Effect::CancelEmbedLoad { token }]
    );
    assert_eq!(player.fallback_link(), Some("https://clips.example.com/a"));
    assert!(player.state().is_terminal());
}

#[test]
fn error_signal_degrades_and_late_signals_are_ignored() {
    let mut player = EmbedPlayer::default();
    let token = begin_token(&player.select(&clip("a")));

    assert_eq!(player.on_failed(token), vec![Effect::CancelEmbedLoad { token }]);
    let degraded = player.clone();

    assert!(player.on_timed_out(token).is_empty());
    assert!(player.on_loaded(token).is_empty());
    assert!(player.on_failed(token).is_empty());
    assert_eq!(player, degraded);
}

#[test]
fn reselecting_cancels_the_previous_wait() {
    let mut player = EmbedPlayer::default();
    let first = begin_token(&player.select(&clip("a")));
    let effects = player.select(&clip("b"));
    let second = begin_token(&effects);

    assert_ne!(first, second);
    assert_eq!(effects[0], Effect::CancelEmbedLoad { token: first });

    // A's stale timer must not touch B.
    assert!(player.on_timed_out(first).is_empty());
    assert!(player.on_failed(first).is_empty());
    match player.state() {
        EmbedState::Loading(selection) => assert_eq!(selection.clip_id, "b"),
        other => panic!("unexpected state {other:?}"),
    }
}

#[test]
fn deselect_cancels_unconditionally_and_returns_to_idle() {
    let mut player = EmbedPlayer::default();
    let token = begin_token(&player.select(&clip("a")));

    assert_eq!(player.deselect(), vec![Effect::CancelEmbedLoad { token }]);
    assert_eq!(player.state(), &EmbedState::Idle);
    assert!(player.on_timed_out(token).is_empty());
    assert_eq!(player.state(), &EmbedState::Idle);

    // Nothing pending: deselect is a no-op.
    assert!(player.deselect().is_empty());
}

#[test]
fn clip_without_embed_goes_straight_to_fallback() {
    let mut player = EmbedPlayer::default();
    let mut bare = clip("a");
    bare.embed_url.clear();

    assert!(player.select(&bare).is_empty());
    assert_eq!(player.fallback_link(), Some("https://clips.example.com/a"));
}

#[test]
fn configured_timeout_is_used() {
    let timing = Timing {
        embed_timeout: Duration::from_millis(250),
        ..Timing::default()
    };
    let mut player = EmbedPlayer::new(timing.embed_timeout);
    match player.select(&clip("a")).as_slice() {
        [Effect::BeginEmbedLoad { timeout, .. }] => {
            assert_eq!(*timeout, Duration::from_millis(250))
        }
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn app_shows_fallback_link_after_timeout() {
    init_logging();
    let (state, effects) = update(gallery(), Msg::ClipSelected { clip_id: "a".into() });
    let token = begin_token(&effects);
    assert!(matches!(state.view().player, PlayerView::Loading { .. }));
    assert!(state.view().clips.unwrap().shown.iter().any(|card| card.selected));

    let (state, effects) = update(state, Msg::EmbedTimedOut { token });
    assert_eq!(effects, vec![Effect::CancelEmbedLoad { token }]);
    assert_eq!(
        state.view().player,
        PlayerView::Fallback {
            title: "clip a".to_string(),
            link: "https://clips.example.com/a".to_string(),
        }
    );
}

#[test]
fn app_ignores_stale_timer_after_switching_clips() {
    init_logging();
    let (state, effects) = update(gallery(), Msg::ClipSelected { clip_id: "a".into() });
    let token_a = begin_token(&effects);
    let (state, effects) = update(state, Msg::ClipSelected { clip_id: "b".into() });
    assert!(effects.contains(&Effect::CancelEmbedLoad { token: token_a }));
    let token_b = begin_token(&effects);

    let (mut state, effects) = update(state, Msg::EmbedTimedOut { token: token_a });
    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    let (mut state, _) = update(state, Msg::EmbedTimedOut { token: token_a });
    assert!(!state.consume_dirty(), "stale signal must not trigger a render");

    let (state, _) = update(state, Msg::EmbedLoaded { token: token_b });
    assert_eq!(
        state.view().player,
        PlayerView::Playing {
            title: "clip b".to_string(),
            embed_url: "https://embed.example.com/?clip=b".to_string(),
        }
    );
}

#[test]
fn selecting_an_unknown_clip_does_nothing() {
    let (state, effects) = update(gallery(), Msg::ClipSelected { clip_id: "zzz".into() });
    assert!(effects.is_empty());
    assert_eq!(state.view().player, PlayerView::Hidden);
}

#[test]
fn unmount_tears_down_the_player() {
    let (state, effects) = update(gallery(), Msg::ClipSelected { clip_id: "a".into() });
    let token = begin_token(&effects);
    let (state, effects) = update(state, Msg::Unmounted);

    assert_eq!(
        effects,
        vec![Effect::CancelEmbedLoad { token }, Effect::StopPolling]
    );
    assert_eq!(state.view().player, PlayerView::Hidden);
}
