//! Round-trip tests against real ffmpeg/ffprobe.
//!
//! These exercise the actual binaries and are skipped (with a note) when
//! ffmpeg is not installed.

use gscribe::media::probe::{FfprobeInspector, MediaInspector};
use gscribe::media::transcode::{FfmpegTranscoder, MediaTranscoder};
use std::path::PathBuf;
use std::process::Command;

fn ffmpeg_available() -> bool {
    let found = ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    });
    if !found {
        eprintln!("\n╔══════════════════════════════════════════════════════╗");
        eprintln!("║  ffmpeg/ffprobe NOT FOUND — SKIPPING ROUND-TRIP TESTS ║");
        eprintln!("║  Install: sudo apt install ffmpeg                     ║");
        eprintln!("╚══════════════════════════════════════════════════════╝\n");
    }
    found
}

/// Write a minimal 16-bit mono PCM WAV: 16 kHz, 0.25 s of silence.
fn write_test_wav(path: &PathBuf) {
    const SAMPLE_RATE: u32 = 16_000;
    const SAMPLES: u32 = SAMPLE_RATE / 4;
    let data_len = SAMPLES * 2;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
    bytes.extend_from_slice(&2u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);

    std::fs::write(path, bytes).unwrap();
}

#[tokio::test]
async fn inspect_returns_all_fields_for_a_real_file() {
    if !ffmpeg_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("tone.wav");
    write_test_wav(&wav);

    let inspector = FfprobeInspector::new();
    let metadata = inspector.inspect(&wav).await.unwrap();

    assert_eq!(metadata.filename, wav);
    assert_eq!(metadata.channels, 1);
    assert_eq!(metadata.codec_type, "audio");
    assert_eq!(metadata.sample_rate, 16_000);
    assert!(metadata.format_name.contains("wav"));
    assert!(metadata.duration > 0.0);
    assert!(metadata.duration_ts > 0);
    assert!(metadata.size > 44);
}

#[tokio::test]
async fn transcode_then_reinspect_yields_canonical_format() {
    if !ffmpeg_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("tone.wav");
    write_test_wav(&wav);

    let flac = dir.path().join("tone.flac");
    let transcoder = FfmpegTranscoder::new();
    transcoder.transcode(&wav, "flac", &flac).await.unwrap();
    assert!(flac.is_file());

    let inspector = FfprobeInspector::new();
    let metadata = inspector.inspect(&flac).await.unwrap();
    assert_eq!(metadata.format_name, "flac");
    assert_eq!(metadata.channels, 1);
}

#[tokio::test]
async fn transcode_of_corrupt_source_fails() {
    if !ffmpeg_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let garbage = dir.path().join("garbage.m4a");
    std::fs::write(&garbage, b"this is not media").unwrap();

    let transcoder = FfmpegTranscoder::new();
    let result = transcoder
        .transcode(&garbage, "flac", &dir.path().join("out.flac"))
        .await;
    assert!(result.is_err());
}
