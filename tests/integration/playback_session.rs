use crate::common::fixtures::{self, SAMPLE_SOURCE_URL, SAMPLE_STREAM_URL};
use crate::common::mocks::{FakeVoice, Gate, RecordingNotifier, ScriptedProbe};
use crate::common::{guild, other_guild, Harness};
use crate::{assert_eq, assert_matches, assert_ne, rstest};
use echo::commands::music::utils::media_resolver::{Notice, PlaybackSource, SilentNotifier};
use echo::commands::music::utils::music_manager::MusicError;
use echo::commands::music::utils::playback_manager::{MAX_FAILED_LOOP_PLAYS, PlaybackOutcome};
use echo::commands::music::utils::session::SessionMode;
use std::sync::Arc;
use std::time::Duration;

fn playing(outcome: PlaybackOutcome) -> PlaybackSource {
    match outcome {
        PlaybackOutcome::Playing(source) => source,
        PlaybackOutcome::Cancelled => panic!("playback was cancelled"),
    }
}

#[tokio::test]
async fn test_short_clip_is_downloaded_and_removed_after_finish() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let voice = FakeVoice::connected();

    let source = playing(
        harness
            .manager
            .start(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
            .await
            .unwrap(),
    );

    let path = source.cleanup_path().unwrap().to_path_buf();
    assert!(path.exists());
    assert!(path.starts_with(harness.temp_dir.path()));
    assert_eq!(
        harness.manager.session_mode(guild()).await,
        Some(SessionMode::Once)
    );
    assert_eq!(voice.played(), vec![source]);

    voice.finish_current().await;

    assert!(!harness.manager.has_session(guild()).await);
    assert!(!path.exists());
    assert_eq!(voice.disconnect_count(), 1);
    assert_eq!(voice.play_count(), 1);
}

#[tokio::test]
async fn test_long_track_is_streamed_without_temp_file() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::long_track()));
    let voice = FakeVoice::connected();
    let notifier = RecordingNotifier::default();

    let source = playing(
        harness
            .manager
            .start(guild(), SAMPLE_SOURCE_URL, voice.handle(), &notifier)
            .await
            .unwrap(),
    );

    assert_eq!(
        source,
        PlaybackSource::RemoteStream {
            url: SAMPLE_STREAM_URL.to_string()
        }
    );
    assert_eq!(harness.probe.download_count(), 0);
    assert_eq!(harness.temp_files(), 0);
    assert_eq!(
        notifier.notices(),
        vec![Notice::Streaming {
            duration: Some(Duration::from_secs(600))
        }]
    );

    voice.finish_current().await;
    assert!(!harness.manager.has_session(guild()).await);
    assert_eq!(voice.disconnect_count(), 1);
}

#[tokio::test]
async fn test_loop_resolves_once_across_replays() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let voice = FakeVoice::connected();

    let source = playing(
        harness
            .manager
            .start_loop(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
            .await
            .unwrap(),
    );

    for _ in 0..5 {
        voice.finish_current().await;
    }

    assert_eq!(harness.probe.probe_count(), 1);
    assert_eq!(harness.probe.download_count(), 1);
    assert_eq!(voice.play_count(), 6);
    assert!(voice.played().iter().all(|played| *played == source));
    assert_eq!(
        harness.manager.session_mode(guild()).await,
        Some(SessionMode::Loop)
    );
    assert_eq!(voice.disconnect_count(), 0);
}

#[tokio::test]
async fn test_stop_suppresses_loop_rearm() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let voice = FakeVoice::connected();

    let source = playing(
        harness
            .manager
            .start_loop(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
            .await
            .unwrap(),
    );
    let in_flight = voice.last_handler().unwrap();

    assert!(harness.manager.stop(guild()).await);

    // Temp file goes immediately, not on the finish notification
    assert!(!source.cleanup_path().unwrap().exists());
    assert_eq!(voice.stop_count(), 1);
    assert_eq!(voice.disconnect_count(), 1);
    assert!(!harness.manager.has_session(guild()).await);

    in_flight.finished(None).await;

    assert_eq!(voice.play_count(), 1);
    assert!(!harness.manager.has_session(guild()).await);
}

#[tokio::test]
async fn test_loop_after_stop_starts_fresh_session() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let first_voice = FakeVoice::connected();

    harness
        .manager
        .start_loop(guild(), SAMPLE_SOURCE_URL, first_voice.handle(), &SilentNotifier)
        .await
        .unwrap();
    let stale = first_voice.last_handler().unwrap();
    assert!(harness.manager.stop(guild()).await);

    // Rejoined after the stop disconnected the first call
    let second_voice = FakeVoice::connected();
    playing(
        harness
            .manager
            .start_loop(guild(), SAMPLE_SOURCE_URL, second_voice.handle(), &SilentNotifier)
            .await
            .unwrap(),
    );

    stale.finished(None).await;
    assert_eq!(
        harness.manager.session_mode(guild()).await,
        Some(SessionMode::Loop)
    );

    second_voice.finish_current().await;
    second_voice.finish_current().await;

    assert_eq!(second_voice.play_count(), 3);
    assert_eq!(first_voice.play_count(), 1);
    assert_eq!(harness.temp_files(), 1);
}

#[tokio::test]
async fn test_protected_content_plays_with_warning() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::protected_track()));
    let voice = FakeVoice::connected();
    let notifier = RecordingNotifier::default();

    let outcome = harness
        .manager
        .start(guild(), SAMPLE_SOURCE_URL, voice.handle(), &notifier)
        .await;

    assert_matches!(outcome, Ok(PlaybackOutcome::Playing(_)));
    assert_eq!(voice.play_count(), 1);
    assert_eq!(notifier.notices().first(), Some(&Notice::ProtectedContent));
}

#[rstest]
#[case::once(false)]
#[case::looped(true)]
#[tokio::test]
async fn test_probe_failure_leaves_no_session(#[case] looped: bool) {
    let harness = Harness::new(ScriptedProbe::failing());
    let voice = FakeVoice::connected();

    let result = if looped {
        harness
            .manager
            .start_loop(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
            .await
    } else {
        harness
            .manager
            .start(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
            .await
    };

    assert_matches!(result, Err(MusicError::ResolutionError(_)));
    assert!(!harness.manager.has_session(guild()).await);
    assert_eq!(voice.play_count(), 0);
    // Left connected and idle
    assert!(voice.connected_now());
    assert_eq!(voice.disconnect_count(), 0);
}

#[tokio::test]
async fn test_stop_without_session_is_noop() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::long_track()));

    assert!(!harness.manager.stop(guild()).await);
    assert!(!harness.manager.stop(guild()).await);
    assert!(!harness.manager.has_session(guild()).await);
}

#[tokio::test]
async fn test_stop_after_finish_is_noop() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::long_track()));
    let voice = FakeVoice::connected();

    harness
        .manager
        .start(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
        .await
        .unwrap();
    voice.finish_current().await;

    assert!(!harness.manager.stop(guild()).await);
    assert_eq!(voice.disconnect_count(), 1);
}

#[tokio::test]
async fn test_new_start_supersedes_previous_session() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let voice = FakeVoice::connected();

    let first = playing(
        harness
            .manager
            .start(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
            .await
            .unwrap(),
    );
    let stale = voice.last_handler().unwrap();

    let second = playing(
        harness
            .manager
            .start(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
            .await
            .unwrap(),
    );

    assert_ne!(first.cleanup_path(), second.cleanup_path());
    assert!(!first.cleanup_path().unwrap().exists());
    assert!(second.cleanup_path().unwrap().exists());
    assert_eq!(voice.stop_count(), 1);
    assert_eq!(voice.disconnect_count(), 0);

    // The old track's end must not tear down the new session
    stale.finished(None).await;
    assert_eq!(
        harness.manager.session_mode(guild()).await,
        Some(SessionMode::Once)
    );
    assert!(second.cleanup_path().unwrap().exists());
    assert_eq!(voice.disconnect_count(), 0);
}

#[tokio::test]
async fn test_stop_during_resolution_cancels_playback() {
    let gate = Arc::new(Gate::default());
    let harness = Harness::new(
        ScriptedProbe::returning(fixtures::short_clip()).gated(gate.clone()),
    );
    let voice = FakeVoice::connected();

    let pending = {
        let manager = harness.manager.clone();
        let handle = voice.handle();
        tokio::spawn(async move {
            manager
                .start_loop(guild(), SAMPLE_SOURCE_URL, handle, &SilentNotifier)
                .await
        })
    };

    gate.entered.notified().await;
    assert_eq!(
        harness.manager.session_mode(guild()).await,
        Some(SessionMode::Loop)
    );
    assert!(harness.manager.stop(guild()).await);
    gate.release.notify_one();

    let outcome = pending.await.unwrap().unwrap();

    assert_eq!(outcome, PlaybackOutcome::Cancelled);
    assert_eq!(voice.play_count(), 0);
    assert_eq!(harness.temp_files(), 0);
    assert!(!harness.manager.has_session(guild()).await);
}

#[tokio::test]
async fn test_disconnect_ends_loop() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let voice = FakeVoice::connected();

    harness
        .manager
        .start_loop(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
        .await
        .unwrap();

    voice.drop_connection();
    voice.finish_current().await;

    assert_eq!(voice.play_count(), 1);
    assert!(!harness.manager.has_session(guild()).await);
    assert_eq!(harness.temp_files(), 0);
}

#[tokio::test]
async fn test_errored_playback_rearms_loop() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::long_track()));
    let voice = FakeVoice::connected();

    harness
        .manager
        .start_loop(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
        .await
        .unwrap();

    voice.fail_current("IO(connection reset)").await;

    assert_eq!(voice.play_count(), 2);
    assert_eq!(
        harness.manager.session_mode(guild()).await,
        Some(SessionMode::Loop)
    );
    assert_eq!(voice.disconnect_count(), 0);
    assert_eq!(harness.probe.probe_count(), 1);
}

#[tokio::test]
async fn test_clean_finish_resets_loop_failures() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let voice = FakeVoice::connected();

    harness
        .manager
        .start_loop(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
        .await
        .unwrap();

    for _ in 1..MAX_FAILED_LOOP_PLAYS {
        voice.fail_current("IO(connection reset)").await;
    }
    voice.finish_current().await;
    for _ in 1..MAX_FAILED_LOOP_PLAYS {
        voice.fail_current("IO(connection reset)").await;
    }

    assert_eq!(
        harness.manager.session_mode(guild()).await,
        Some(SessionMode::Loop)
    );
    assert_eq!(voice.play_count(), 2 * MAX_FAILED_LOOP_PLAYS as usize);
    assert_eq!(voice.disconnect_count(), 0);
}

#[tokio::test]
async fn test_repeated_errors_end_loop() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let voice = FakeVoice::connected();

    harness
        .manager
        .start_loop(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
        .await
        .unwrap();

    for _ in 0..MAX_FAILED_LOOP_PLAYS {
        voice.fail_current("Decode(\"corrupt frame\")").await;
    }

    assert_eq!(voice.play_count(), MAX_FAILED_LOOP_PLAYS as usize);
    assert!(!harness.manager.has_session(guild()).await);
    assert_eq!(voice.disconnect_count(), 1);
    assert_eq!(harness.temp_files(), 0);
}

#[tokio::test]
async fn test_transport_failure_leaves_no_session() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let voice = FakeVoice::connected();
    voice.fail_next_plays();

    let result = harness
        .manager
        .start(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
        .await;

    assert_matches!(result, Err(MusicError::TransportError(_)));
    assert!(!harness.manager.has_session(guild()).await);
    assert_eq!(harness.temp_files(), 0);
    assert_eq!(voice.disconnect_count(), 1);
}

#[tokio::test]
async fn test_lost_connection_before_first_play() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let voice = FakeVoice::connected();
    voice.drop_connection();

    let result = harness
        .manager
        .start_loop(guild(), SAMPLE_SOURCE_URL, voice.handle(), &SilentNotifier)
        .await;

    assert_matches!(result, Err(MusicError::TransportError(_)));
    assert_eq!(voice.play_count(), 0);
    assert!(!harness.manager.has_session(guild()).await);
    assert_eq!(harness.temp_files(), 0);
}

#[tokio::test]
async fn test_guilds_loop_independently() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let first = FakeVoice::connected();
    let second = FakeVoice::connected();

    let (a, b) = tokio::join!(
        harness
            .manager
            .start_loop(guild(), SAMPLE_SOURCE_URL, first.handle(), &SilentNotifier),
        harness
            .manager
            .start_loop(other_guild(), SAMPLE_SOURCE_URL, second.handle(), &SilentNotifier),
    );
    let a = playing(a.unwrap());
    let b = playing(b.unwrap());

    assert_ne!(a.cleanup_path(), b.cleanup_path());
    assert_eq!(harness.temp_files(), 2);

    assert!(harness.manager.stop(guild()).await);
    second.finish_current().await;

    assert!(!harness.manager.has_session(guild()).await);
    assert_eq!(
        harness.manager.session_mode(other_guild()).await,
        Some(SessionMode::Loop)
    );
    assert_eq!(second.play_count(), 2);
    assert_eq!(second.disconnect_count(), 0);
    assert!(b.cleanup_path().unwrap().exists());
    assert_eq!(harness.temp_files(), 1);
}

#[tokio::test]
async fn test_stop_all_ends_every_session() {
    let harness = Harness::new(ScriptedProbe::returning(fixtures::short_clip()));
    let first = FakeVoice::connected();
    let second = FakeVoice::connected();

    harness
        .manager
        .start_loop(guild(), SAMPLE_SOURCE_URL, first.handle(), &SilentNotifier)
        .await
        .unwrap();
    harness
        .manager
        .start(other_guild(), SAMPLE_SOURCE_URL, second.handle(), &SilentNotifier)
        .await
        .unwrap();

    harness.manager.stop_all().await;

    assert!(!harness.manager.has_session(guild()).await);
    assert!(!harness.manager.has_session(other_guild()).await);
    assert_eq!(first.disconnect_count(), 1);
    assert_eq!(second.disconnect_count(), 1);
    assert_eq!(harness.temp_files(), 0);
}
