//! Zip export tests.

mod common;

use std::io::{Cursor, Read};

use common::ScriptedSource;
use stillpick::export::{entry_name, index_width};
use stillpick::{
    DisplayHandles, ExportOptions, Sampler, SamplingOptions, SamplingRun, StillpickError, export,
    export_to_file,
};
use zip::ZipArchive;

async fn sampled_run(target: u32) -> SamplingRun {
    let mut run = SamplingRun::new(DisplayHandles::new());
    Sampler::new(SamplingOptions::new().with_target_count(target))
        .sample(&mut ScriptedSource::new(1.0), &mut run)
        .await
        .unwrap();
    run
}

fn entry_names(archive: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(archive)).unwrap();
    archive.file_names().map(str::to_string).collect::<Vec<_>>()
}

// ── Entry names ────────────────────────────────────────────────────

#[test]
fn entry_names_are_zero_padded() {
    let options = ExportOptions::new();
    assert_eq!(entry_name(1, 5, &options), "frame_01.jpg");
    assert_eq!(entry_name(12, 30, &options), "frame_12.jpg");
    assert_eq!(entry_name(1, 600, &options), "frame_001.jpg");
    assert_eq!(index_width(99, &options), 2);
    assert_eq!(index_width(100, &options), 3);
}

#[test]
fn custom_naming() {
    let options = ExportOptions::new()
        .with_prefix("still")
        .with_extension(".jpeg")
        .with_min_index_width(4);
    assert_eq!(entry_name(7, 10, &options), "still_0007.jpeg");
}

// ── Archive contents ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn five_selected_frames_become_five_entries() {
    let run = sampled_run(5).await;
    assert_eq!(run.len(), 5);

    let archive = export(run.frames(), &ExportOptions::new()).unwrap();

    let mut names = entry_names(&archive);
    assert_eq!(
        names,
        ["frame_01.jpg", "frame_02.jpg", "frame_03.jpg", "frame_04.jpg", "frame_05.jpg"]
    );
    names.sort();
    assert_eq!(names[0], "frame_01.jpg");

    let mut reader = ZipArchive::new(Cursor::new(&archive[..])).unwrap();
    for (index, frame) in run.frames().iter().enumerate() {
        let mut entry = reader.by_index(index).unwrap();
        assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, frame.raster());
    }
}

#[tokio::test(start_paused = true)]
async fn only_selected_frames_are_exported_in_order() {
    let mut run = sampled_run(5).await;
    let ids: Vec<_> = run.frames().iter().map(|frame| frame.id()).collect();
    run.toggle(ids[0]);
    run.toggle(ids[3]);

    let archive = export(run.frames(), &ExportOptions::new()).unwrap();

    assert_eq!(entry_names(&archive), ["frame_01.jpg", "frame_02.jpg", "frame_03.jpg"]);

    let mut reader = ZipArchive::new(Cursor::new(&archive[..])).unwrap();
    let mut first = Vec::new();
    reader.by_name("frame_01.jpg").unwrap().read_to_end(&mut first).unwrap();
    assert_eq!(first, run.get(ids[1]).unwrap().raster());
}

#[tokio::test(start_paused = true)]
async fn same_selection_gives_identical_archives() {
    let run = sampled_run(5).await;
    let first = export(run.frames(), &ExportOptions::new()).unwrap();
    let second = export(run.frames(), &ExportOptions::new()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn nothing_selected_is_an_error() {
    let mut run = sampled_run(5).await;
    run.set_all(false);

    let result = export(run.frames(), &ExportOptions::new());
    assert!(matches!(result, Err(StillpickError::NothingSelected)));
}

#[tokio::test(start_paused = true)]
async fn wide_runs_get_wider_indices() {
    let mut run = SamplingRun::new(DisplayHandles::new());
    Sampler::new(SamplingOptions::new().with_desired_rate(50.0))
        .sample(&mut ScriptedSource::new(3.0), &mut run)
        .await
        .unwrap();
    assert!(run.len() >= 100);

    let archive = export(run.frames(), &ExportOptions::new()).unwrap();
    let names = entry_names(&archive);

    assert_eq!(names.first().map(String::as_str), Some("frame_001.jpg"));
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(sorted, names);
}

// ── Files ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn export_to_file_writes_the_archive() {
    let run = sampled_run(5).await;
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("stills.zip");

    let written = export_to_file(run.frames(), &ExportOptions::new(), &path).unwrap();

    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk.len(), written);
    assert_eq!(entry_names(&on_disk).len(), 5);
}

#[tokio::test(start_paused = true)]
async fn failed_export_writes_no_file() {
    let mut run = sampled_run(5).await;
    run.set_all(false);
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("stills.zip");

    assert!(export_to_file(run.frames(), &ExportOptions::new(), &path).is_err());
    assert!(!path.exists());
}
