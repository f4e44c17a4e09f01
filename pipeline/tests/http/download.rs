//! Bounded-retry download and normalization

use image::{ImageFormat, ImageReader};
use image_pipeline::config::DownloadConfig;
use image_pipeline::error::DownloadFailure;
use image_pipeline::Downloader;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crate::support::{closed_port_url, spawn};

fn downloader(work_dir: &Path) -> Downloader {
    let config = DownloadConfig {
        backoff_ms: 10,
        work_dir: Some(work_dir.to_path_buf()),
        ..Default::default()
    };
    Downloader::new(&config, "image-pipeline-tests").unwrap()
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn download_normalizes_png_to_rgb_jpeg() {
    let server = spawn().await;
    let dir = tempfile::tempdir().unwrap();

    let resource = downloader(dir.path())
        .download_with_attempts(&server.url("/large.png"), 3)
        .await
        .unwrap();

    assert!(resource.path().starts_with(dir.path()));
    assert_eq!(resource.source_url(), Some(server.url("/large.png").as_str()));

    let bytes = resource.read().unwrap();
    let reader = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .unwrap();
    assert_eq!(reader.format(), Some(ImageFormat::Jpeg));
    let decoded = reader.decode().unwrap();
    assert_eq!(decoded.color().channel_count(), 3);
    assert_eq!((decoded.width(), decoded.height()), (640, 480));

    resource.release().unwrap();
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn persistent_status_failure_uses_exactly_the_budget() {
    let server = spawn().await;
    let dir = tempfile::tempdir().unwrap();

    let err = downloader(dir.path())
        .download_with_attempts(&server.url("/unavailable.jpg"), 3)
        .await
        .unwrap_err();

    assert_eq!(err.attempts, 3);
    assert!(matches!(err.last, DownloadFailure::Status(503)));
    assert_eq!(server.hits.unavailable.load(Ordering::SeqCst), 3);
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn decode_failures_count_against_the_budget() {
    let server = spawn().await;
    let dir = tempfile::tempdir().unwrap();

    let err = downloader(dir.path())
        .download_with_attempts(&server.url("/garbage.jpg"), 2)
        .await
        .unwrap_err();

    assert_eq!(err.attempts, 2);
    assert!(matches!(err.last, DownloadFailure::Decode(_)));
    assert_eq!(server.hits.garbage.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn network_failure_reports_network_cause() {
    let dir = tempfile::tempdir().unwrap();
    let url = closed_port_url().await;

    let err = downloader(dir.path())
        .download_with_attempts(&url, 3)
        .await
        .unwrap_err();

    assert_eq!(err.attempts, 3);
    assert!(matches!(err.last, DownloadFailure::Network(_)));
}

#[tokio::test]
async fn transient_failures_recover_within_budget() {
    let server = spawn().await;
    let dir = tempfile::tempdir().unwrap();

    let resource = downloader(dir.path())
        .download_with_attempts(&server.url("/flaky.png"), 3)
        .await
        .unwrap();

    assert_eq!(server.hits.flaky.load(Ordering::SeqCst), 3);
    assert_eq!(entries(dir.path()), 1);
    drop(resource);
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn budget_too_small_for_recovery_fails() {
    let server = spawn().await;
    let dir = tempfile::tempdir().unwrap();

    let err = downloader(dir.path())
        .download_with_attempts(&server.url("/flaky.png"), 2)
        .await
        .unwrap_err();

    assert_eq!(err.attempts, 2);
    assert_eq!(server.hits.flaky.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn zero_attempts_still_tries_once() {
    let server = spawn().await;
    let dir = tempfile::tempdir().unwrap();

    let err = downloader(dir.path())
        .download_with_attempts(&server.url("/unavailable.jpg"), 0)
        .await
        .unwrap_err();

    assert_eq!(err.attempts, 1);
    assert_eq!(server.hits.unavailable.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn backoff_runs_between_attempts_only() {
    let server = spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let config = DownloadConfig {
        backoff_ms: 200,
        work_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let downloader = Downloader::new(&config, "image-pipeline-tests").unwrap();

    let started = Instant::now();
    let err = downloader
        .download_with_attempts(&server.url("/unavailable.jpg"), 2)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.attempts, 2);
    // one pause between the two attempts, none after the last
    assert!(elapsed >= Duration::from_millis(200), "no backoff: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(400), "trailing backoff: {elapsed:?}");
}
