// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end session tests: open a tool, stage in-memory PDFs, run, inspect.

use std::sync::Arc;

use falzwerk_core::error::{FalzwerkError, Result};
use falzwerk_core::human_errors::Severity;
use falzwerk_core::{
    AppConfig, RotateOptions, RotationAngle, SplitMode, SplitOptions, StagedFile, ToolKind,
    ToolOptions, WatermarkOptions, WatermarkPosition,
};
use falzwerk_document::fixtures::labelled_pdf;
use falzwerk_document::{PageRasterizer, PdfReader, TransformationEngine};
use falzwerk_session::{Completion, Phase, SessionController};
use image::DynamicImage;

struct BlankPages;

impl PageRasterizer for BlankPages {
    fn render_pages(&self, pdf: &[u8], _scale: f32) -> Result<Vec<DynamicImage>> {
        let pages = PdfReader::from_bytes(pdf)?.page_count();
        Ok((0..pages).map(|_| DynamicImage::new_rgb8(4, 4)).collect())
    }
}

fn session() -> SessionController {
    let config = AppConfig::default();
    let engine = TransformationEngine::new(&config).with_rasterizer(Arc::new(BlankPages));
    SessionController::new(engine, &config)
}

fn pdf(label: &str, pages: usize) -> StagedFile {
    StagedFile::new(format!("{label}.pdf"), labelled_pdf(label, pages))
}

fn result_pages(session: &SessionController) -> Vec<String> {
    let artifact = session.result_artifact().expect("result available");
    PdfReader::from_bytes(&artifact.bytes).unwrap().page_texts()
}

#[tokio::test]
async fn merge_two_and_three_pages_gives_five_in_order() {
    let mut session = session();
    session.open_tool(ToolKind::Merge);
    session.stage(vec![pdf("A", 2)]).unwrap();
    session.stage(vec![pdf("B", 3)]).unwrap();

    session.submit().await.unwrap();

    assert_eq!(session.phase(), Phase::Ready);
    assert_eq!(result_pages(&session), ["A1", "A2", "B1", "B2", "B3"]);
}

#[tokio::test]
async fn split_all_then_merge_reproduces_the_page_sequence() {
    let mut session = session();
    session.open_tool(ToolKind::Split);
    session.stage(vec![pdf("S", 4)]).unwrap();
    session
        .set_options(ToolOptions::Split(SplitOptions {
            mode: SplitMode::All,
            range: String::new(),
        }))
        .unwrap();
    session.submit().await.unwrap();
    assert_eq!(result_pages(&session), ["S1", "S2", "S3", "S4"]);

    let split = session.result_artifact().unwrap().bytes.clone();
    session.open_tool(ToolKind::Merge);
    session.stage(vec![StagedFile::new("split.pdf", split)]).unwrap();
    session.submit().await.unwrap();
    assert_eq!(result_pages(&session), ["S1", "S2", "S3", "S4"]);
}

#[tokio::test]
async fn four_quarter_turns_restore_every_page() {
    let mut bytes = labelled_pdf("R", 3);

    for _ in 0..4 {
        let mut session = session();
        session.open_tool(ToolKind::Rotate);
        session.stage(vec![StagedFile::new("r.pdf", bytes)]).unwrap();
        session
            .set_options(ToolOptions::Rotate(RotateOptions {
                angle: RotationAngle::Deg90,
            }))
            .unwrap();
        session.submit().await.unwrap();
        bytes = session.result_artifact().unwrap().bytes.clone();
    }

    let output = PdfReader::from_bytes(&bytes).unwrap();
    for index in 0..3 {
        assert_eq!(output.page_rotation(index).unwrap() % 360, 0);
    }
}

#[tokio::test]
async fn empty_watermark_is_rejected_for_every_position() {
    for position in [
        WatermarkPosition::Center,
        WatermarkPosition::Top,
        WatermarkPosition::Bottom,
    ] {
        let mut session = session();
        session.open_tool(ToolKind::Watermark);
        session.stage(vec![pdf("W", 1)]).unwrap();
        session
            .set_options(ToolOptions::Watermark(WatermarkOptions {
                text: String::new(),
                position,
            }))
            .unwrap();

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, FalzwerkError::Validation(_)), "{position:?}");
        assert_eq!(session.phase(), Phase::AwaitingInput);
    }
}

#[tokio::test]
async fn corrupt_input_fails_then_returns_to_awaiting_input_with_files() {
    let mut session = session();
    session.open_tool(ToolKind::Compress);
    session
        .stage(vec![StagedFile::new("broken.pdf", b"this is not a PDF".to_vec())])
        .unwrap();
    let staged_before: Vec<String> = session
        .state()
        .staged_files()
        .iter()
        .map(|f| f.digest().to_string())
        .collect();

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, FalzwerkError::Transformation { .. }));
    assert_eq!(session.phase(), Phase::Failed);
    assert!(session.result_artifact().is_none());

    let message = session.failure().cloned().expect("failure message");
    assert_eq!(message.severity, Severity::Permanent);

    assert_eq!(session.acknowledge_failure().unwrap(), message);
    assert_eq!(session.phase(), Phase::AwaitingInput);
    let staged_after: Vec<String> = session
        .state()
        .staged_files()
        .iter()
        .map(|f| f.digest().to_string())
        .collect();
    assert_eq!(staged_before, staged_after);
}

#[tokio::test]
async fn switching_tools_resets_everything() {
    let mut session = session();
    session.open_tool(ToolKind::Merge);
    session.stage(vec![pdf("A", 1), pdf("B", 1)]).unwrap();
    session.submit().await.unwrap();
    assert!(session.result_artifact().is_some());

    session.open_tool(ToolKind::Rotate);

    let state = session.state();
    assert_eq!(state.active_tool(), Some(ToolKind::Rotate));
    assert!(state.staged_files().is_empty());
    assert_eq!(state.options(), Some(&ToolOptions::defaults_for(ToolKind::Rotate)));
    assert!(state.result().is_none());
    assert_eq!(state.phase(), Phase::AwaitingInput);
}

#[tokio::test]
async fn outcome_of_an_abandoned_run_is_discarded() {
    let mut session = session();
    session.open_tool(ToolKind::Merge);
    session.stage(vec![pdf("A", 1)]).unwrap();

    let run = session.begin_submit().unwrap();
    session.close();
    let outcome = run.execute().await;

    assert_eq!(session.complete(outcome).unwrap(), Completion::Discarded);
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.result_artifact().is_none());
}

#[tokio::test]
async fn switching_tools_mid_run_discards_the_outcome() {
    let mut session = session();
    session.open_tool(ToolKind::Merge);
    session.stage(vec![pdf("A", 1), pdf("B", 1)]).unwrap();

    let run = session.begin_submit().unwrap();
    assert_eq!(session.phase(), Phase::Processing);
    session.open_tool(ToolKind::Compress);
    let outcome = run.execute().await;

    assert_eq!(session.complete(outcome).unwrap(), Completion::Discarded);
    let state = session.state();
    assert_eq!(state.active_tool(), Some(ToolKind::Compress));
    assert_eq!(state.phase(), Phase::AwaitingInput);
    assert!(state.staged_files().is_empty());
    assert!(state.result().is_none());
}

#[tokio::test]
async fn switching_tools_after_a_failure_clears_it() {
    let mut session = session();
    session.open_tool(ToolKind::Rotate);
    session
        .stage(vec![StagedFile::new("broken.pdf", b"this is not a PDF".to_vec())])
        .unwrap();
    session.submit().await.unwrap_err();
    assert_eq!(session.phase(), Phase::Failed);

    session.open_tool(ToolKind::Split);

    assert_eq!(session.phase(), Phase::AwaitingInput);
    assert!(session.failure().is_none());
    assert!(session.state().staged_files().is_empty());
}

#[tokio::test]
async fn pdf_to_jpg_bundles_one_image_per_page() {
    let mut session = session();
    session.open_tool(ToolKind::DocToImage);
    session.stage(vec![pdf("J", 2)]).unwrap();
    session.submit().await.unwrap();

    let artifact = session.result_artifact().unwrap();
    assert_eq!(
        falzwerk_document::archive::entry_names(&artifact.bytes).unwrap(),
        ["page_1.jpg", "page_2.jpg"]
    );
    assert!(artifact.download_name(0).ends_with(".zip"));
}

#[test]
fn single_file_tool_rejects_two_files_without_change() {
    let mut session = session();
    session.open_tool(ToolKind::Split);
    session.stage(vec![pdf("keep", 1)]).unwrap();

    let err = session.stage(vec![pdf("x", 1), pdf("y", 1)]).unwrap_err();
    assert!(matches!(err, FalzwerkError::TooManyFiles { .. }));
    assert_eq!(session.state().staged_files()[0].name(), "keep.pdf");
}
