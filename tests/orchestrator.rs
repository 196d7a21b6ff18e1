//! Integration tests for ptt-cast.
//!
//! These wire the components manually the way the orchestrator would, using
//! the bundled mock protocol client instead of a live service. The one test
//! that needs a real decode process is marked `#[ignore]` and should be run
//! manually where ffmpeg is installed.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;

use ptt_cast::{
    classify, AudioPipeline, CastError, ConnectOptions, Credentials, DetailFlags, MockConnector,
    Orchestrator, PlayRequest, Presentation, PttConnector, ReadinessGate, SessionScript,
    ShutdownController, SourceKind, TransformOptions,
};

fn test_credentials() -> Credentials {
    Credentials {
        username: "tester".to_string(),
        password: "secret".to_string(),
        channel: "lobby".to_string(),
        auth_token: None,
    }
}

#[test]
fn test_classification_matrix() {
    let cases = [
        ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", SourceKind::VideoLink),
        ("https://music.youtube.com/watch?v=dQw4w9WgXcQ", SourceKind::VideoLink),
        ("https://youtu.be/dQw4w9WgXcQ", SourceKind::VideoLink),
        ("http://example.com/stream", SourceKind::GenericUrl),
        ("https://youtube.com/about", SourceKind::GenericUrl),
        ("track.mp3", SourceKind::LocalFile),
        ("/music/track.flac", SourceKind::LocalFile),
    ];
    for (target, expected) in cases {
        assert_eq!(classify(target), expected, "target: {target}");
    }
}

#[tokio::test]
async fn test_missing_file_exits_with_source_not_found() {
    let connector = Arc::new(MockConnector::new());
    let orchestrator = Orchestrator::builder(connector.clone()).build();

    let err = orchestrator
        .run(PlayRequest {
            target: "/no/such/file.mp3".to_string(),
            options: TransformOptions::default(),
            credentials: test_credentials(),
            channel: None,
            details: DetailFlags::all(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CastError::SourceNotFound { .. }));
    assert_eq!(err.exit_code(), 2);
    // The session must never have been opened.
    assert_eq!(connector.connect_count(), 0);
}

/// The session is not opened before the readiness event fires: with a
/// pipeline whose first chunk arrives late, the session-open timestamp must
/// be at or after the ready-event timestamp.
#[tokio::test]
async fn test_session_opens_only_after_data_is_ready() {
    const DELAY: Duration = Duration::from_millis(150);

    let (reader, mut writer) = tokio::io::duplex(1024);
    tokio::spawn(async move {
        tokio::time::sleep(DELAY).await;
        writer.write_all(&[42u8; 512]).await.unwrap();
        // Dropping the writer ends the stream.
    });

    let started = Instant::now();
    let mut gate = ReadinessGate::new(AudioPipeline::from_reader(Box::new(reader)));
    gate.wait_ready().await.unwrap();
    let ready_at = gate.ready_at().unwrap();
    assert!(started.elapsed() >= DELAY);

    let connector = MockConnector::new();
    let credentials = test_credentials();
    let report = ptt_cast::run_session(
        &connector,
        "wss://test",
        &ConnectOptions::default(),
        SessionScript {
            credentials: &credentials,
            presentation: &Presentation::empty(),
            audio: &mut gate,
            transcode: TransformOptions::default().transcode(),
        },
        &ShutdownController::new(),
    )
    .await
    .unwrap();

    assert!(report.completed);
    let opened_at = connector.session().opened_at().unwrap();
    assert!(opened_at >= ready_at);
    assert_eq!(connector.session().audio_bytes(), 512);
}

#[tokio::test]
async fn test_script_order_with_full_presentation() {
    let connector = MockConnector::new();
    let credentials = test_credentials();
    let presentation = Presentation {
        caption: Some("Artist - Title".to_string()),
        image: Some(vec![0u8; 64]),
    };

    let mut gate = ReadinessGate::new(AudioPipeline::from_reader(Box::new(Cursor::new(
        vec![7u8; 2048],
    ))));
    gate.wait_ready().await.unwrap();

    let report = ptt_cast::run_session(
        &connector,
        "wss://test",
        &ConnectOptions::default(),
        SessionScript {
            credentials: &credentials,
            presentation: &presentation,
            audio: &mut gate,
            transcode: TransformOptions::default().transcode(),
        },
        &ShutdownController::new(),
    )
    .await
    .unwrap();

    assert!(report.completed);
    assert_eq!(
        connector.session().operations(),
        vec!["login", "send_image", "send_text", "send_audio"]
    );
    assert_eq!(connector.session().close_count(), 1);
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let controller = ShutdownController::new();

    // Triggering before anything exists does nothing.
    controller.trigger().await;

    let pipeline = AudioPipeline::from_reader(Box::new(Cursor::new(vec![0u8; 16])));
    let ctl = pipeline.ctl();
    controller.track_pipeline(pipeline.ctl());

    let connector = MockConnector::new();
    let session = connector
        .connect("wss://test", &ConnectOptions::default())
        .await
        .unwrap();
    controller.track_session(Arc::downgrade(&session));

    controller.trigger().await;
    controller.trigger().await;

    assert!(ctl.is_destroyed());
    assert_eq!(connector.session().close_count(), 1);
}

/// Full local-file playback through a real decode process.
#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_local_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_test_wav(&path);

    let connector = Arc::new(MockConnector::new());
    let orchestrator = Orchestrator::builder(connector.clone()).build();

    let report = orchestrator
        .run(PlayRequest {
            target: path.display().to_string(),
            options: TransformOptions {
                volume_factor: Some(0.5),
                ..Default::default()
            },
            credentials: test_credentials(),
            channel: Some("override".to_string()),
            details: DetailFlags {
                text: true,
                image: false,
            },
        })
        .await
        .unwrap();

    assert!(report.completed);
    let session = connector.session();
    assert_eq!(session.operations(), vec!["login", "send_text", "send_audio"]);
    assert!(session.audio_bytes() > 0);
    // No tags in the generated file, so the caption is the fallback.
    assert!(session.sent_text().unwrap().ends_with("tone.wav"));
}

/// Writes one second of a 1 kHz tone as a 16 kHz mono WAV file.
fn write_test_wav(path: &Path) {
    let sample_rate: u32 = 16000;
    let samples: Vec<i16> = (0..sample_rate)
        .map(|i| ((i as f32 / 16.0).sin() * 10000.0) as i16)
        .collect();
    let data_len = (samples.len() * 2) as u32;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}
