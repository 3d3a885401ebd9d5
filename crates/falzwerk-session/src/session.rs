// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session controller — the lifecycle of one tool-usage session.
//
//   Idle --open_tool--> AwaitingInput --submit--> Processing --ok--> Ready
//                                                            \--err--> Failed --acknowledge--> AwaitingInput
//
// Closing or switching tools returns to Idle from any phase. A run that was
// in flight when that happened still finishes, but its outcome is discarded.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use falzwerk_core::error::{FalzwerkError, Result};
use falzwerk_core::human_errors::{HumanError, humanize_error};
use falzwerk_core::{
    AppConfig, CompressOptions, DocToImageOptions, ResultArtifact, SessionId, StagedFile, ToolKind,
    ToolOptions,
};
use falzwerk_document::TransformationEngine;
use tracing::{debug, info, instrument, warn};

use crate::staging::FileStagingArea;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No tool open.
    Idle,
    /// A tool is open; files and options may change.
    AwaitingInput,
    /// A transformation is running.
    Processing,
    /// The last run succeeded and its artifact is available.
    Ready,
    /// The last run failed; see [`SessionController::failure`].
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingInput => "awaiting input",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything one session holds.
#[derive(Debug, Clone)]
pub struct SessionState {
    active_tool: Option<ToolKind>,
    staging: FileStagingArea,
    options: Option<ToolOptions>,
    phase: Phase,
    result: Option<ResultArtifact>,
}

impl SessionState {
    fn idle() -> Self {
        Self {
            active_tool: None,
            staging: FileStagingArea::new(),
            options: None,
            phase: Phase::Idle,
            result: None,
        }
    }

    pub fn active_tool(&self) -> Option<ToolKind> {
        self.active_tool
    }

    pub fn staged_files(&self) -> &[StagedFile] {
        self.staging.files()
    }

    pub fn options(&self) -> Option<&ToolOptions> {
        self.options.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> Option<&ResultArtifact> {
        self.result.as_ref()
    }
}

/// A submitted run, detached from the session so it can be awaited without
/// holding the controller.
pub struct PendingRun {
    session: SessionId,
    generation: u64,
    tool: ToolKind,
    files: Vec<StagedFile>,
    options: ToolOptions,
    engine: Arc<TransformationEngine>,
}

impl fmt::Debug for PendingRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRun")
            .field("session", &self.session)
            .field("generation", &self.generation)
            .field("tool", &self.tool)
            .field("files", &self.files.len())
            .finish_non_exhaustive()
    }
}

impl PendingRun {
    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Run the transformation to completion.
    #[instrument(skip(self), fields(session = %self.session, tool = %self.tool))]
    pub async fn execute(self) -> RunOutcome {
        let result = self.engine.run(self.tool, self.files, self.options).await;
        RunOutcome {
            generation: self.generation,
            result,
        }
    }
}

/// The result of a [`PendingRun`], to be handed back to
/// [`SessionController::complete`].
pub struct RunOutcome {
    generation: u64,
    result: Result<ResultArtifact>,
}

/// What [`SessionController::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The session moved to `Ready`.
    Applied,
    /// The session had moved on; the outcome was dropped.
    Discarded,
}

/// Drives one session through its phases.
pub struct SessionController {
    id: SessionId,
    state: SessionState,
    engine: Arc<TransformationEngine>,
    defaults: OptionDefaults,
    /// Bumped whenever a run's outcome must no longer be applied.
    generation: u64,
    failure: Option<HumanError>,
}

/// Option values configured per installation.
#[derive(Debug, Clone, Copy)]
struct OptionDefaults {
    compress: CompressOptions,
    doc_to_image: DocToImageOptions,
}

impl SessionController {
    pub fn new(engine: TransformationEngine, config: &AppConfig) -> Self {
        let id = SessionId::new();
        debug!(session = %id, "Session created");
        Self {
            id,
            state: SessionState::idle(),
            engine: Arc::new(engine),
            defaults: OptionDefaults {
                compress: CompressOptions {
                    level: config.default_compression,
                },
                doc_to_image: DocToImageOptions {
                    quality: config.default_image_quality,
                },
            },
            generation: 0,
            failure: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// The message for the most recent failed run, until acknowledged.
    pub fn failure(&self) -> Option<&HumanError> {
        self.failure.as_ref()
    }

    pub fn result_artifact(&self) -> Option<&ResultArtifact> {
        self.state.result.as_ref()
    }

    // -- Tool selection -------------------------------------------------------

    /// Open `tool`, discarding everything from the previous tool.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn open_tool(&mut self, tool: ToolKind) {
        if self.state.phase == Phase::Processing {
            info!("Abandoning in-flight run");
        }
        self.reset();
        self.state.active_tool = Some(tool);
        self.state.options = Some(self.default_options(tool));
        self.state.phase = Phase::AwaitingInput;
        info!(tool = %tool, "Tool opened");
    }

    /// Open a tool by its identifier (`merge`, `pdf-to-jpg`, ...).
    pub fn open_tool_id(&mut self, id: &str) -> Result<()> {
        let tool: ToolKind = id.parse()?;
        self.open_tool(tool);
        Ok(())
    }

    /// Return to `Idle`. An in-flight run's outcome will be discarded.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn close(&mut self) {
        self.reset();
        info!("Session closed");
    }

    fn reset(&mut self) {
        self.state = SessionState::idle();
        self.failure = None;
        self.generation += 1;
    }

    fn default_options(&self, tool: ToolKind) -> ToolOptions {
        match tool {
            ToolKind::Compress => ToolOptions::Compress(self.defaults.compress),
            ToolKind::DocToImage => ToolOptions::DocToImage(self.defaults.doc_to_image),
            other => ToolOptions::defaults_for(other),
        }
    }

    // -- Input editing --------------------------------------------------------

    /// Stage files for the active tool. Returns the number of staged files.
    pub fn stage(&mut self, files: Vec<StagedFile>) -> Result<usize> {
        let tool = self.editable_tool()?;
        let count = self.state.staging.stage(tool, files)?;
        self.inputs_changed();
        Ok(count)
    }

    /// Remove one staged file. Returns the number left.
    pub fn remove_file(&mut self, index: usize) -> Result<usize> {
        self.editable_tool()?;
        let remaining = self.state.staging.remove(index)?;
        self.inputs_changed();
        Ok(remaining)
    }

    pub fn clear_files(&mut self) -> Result<()> {
        self.editable_tool()?;
        self.state.staging.clear();
        self.inputs_changed();
        Ok(())
    }

    /// Replace the active tool's options. They are validated on submit.
    pub fn set_options(&mut self, options: ToolOptions) -> Result<()> {
        let tool = self.editable_tool()?;
        if options.kind() != tool {
            return Err(FalzwerkError::Validation(format!(
                "options for {} cannot be used with {tool}",
                options.kind()
            )));
        }
        self.state.options = Some(options);
        self.inputs_changed();
        Ok(())
    }

    /// The active tool, provided its inputs may be edited now.
    fn editable_tool(&self) -> Result<ToolKind> {
        let tool = self.state.active_tool.ok_or(FalzwerkError::NoActiveTool)?;
        if self.state.phase == Phase::Processing {
            return Err(FalzwerkError::SessionBusy);
        }
        Ok(tool)
    }

    /// A finished run no longer matches edited inputs.
    fn inputs_changed(&mut self) {
        if matches!(self.state.phase, Phase::Ready | Phase::Failed) {
            self.state.result = None;
            self.failure = None;
            self.state.phase = Phase::AwaitingInput;
        }
    }

    // -- Running --------------------------------------------------------------

    /// Check the inputs and move to `Processing`.
    ///
    /// Nothing changes when a check fails. The returned run must be executed
    /// and its outcome passed to [`SessionController::complete`].
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn begin_submit(&mut self) -> Result<PendingRun> {
        let tool = self.state.active_tool.ok_or(FalzwerkError::NoActiveTool)?;
        match self.state.phase {
            Phase::Processing => return Err(FalzwerkError::SessionBusy),
            Phase::Failed => {
                return Err(FalzwerkError::InvalidPhase(
                    "the last failure has not been acknowledged".into(),
                ));
            }
            _ => {}
        }
        if self.state.staging.is_empty() {
            return Err(FalzwerkError::NoFilesStaged);
        }

        let options = self
            .state
            .options
            .clone()
            .unwrap_or_else(|| self.default_options(tool));
        options.validate()?;

        self.state.phase = Phase::Processing;
        self.state.result = None;
        self.failure = None;
        info!(tool = %tool, files = self.state.staging.len(), "Run submitted");

        Ok(PendingRun {
            session: self.id,
            generation: self.generation,
            tool,
            files: self.state.staging.files().to_vec(),
            options,
            engine: Arc::clone(&self.engine),
        })
    }

    /// Apply a finished run.
    ///
    /// A success moves to `Ready`. A failure moves to `Failed`, records a
    /// human-readable message and is returned; staged files are kept. An
    /// outcome from before the last close or tool switch is discarded.
    #[instrument(skip(self, outcome), fields(session = %self.id))]
    pub fn complete(&mut self, outcome: RunOutcome) -> Result<Completion> {
        if outcome.generation != self.generation || self.state.phase != Phase::Processing {
            debug!(
                run_generation = outcome.generation,
                generation = self.generation,
                "Discarding outcome of an abandoned run"
            );
            return Ok(Completion::Discarded);
        }

        match outcome.result {
            Ok(artifact) => {
                info!(output_bytes = artifact.bytes.len(), "Result ready");
                self.state.result = Some(artifact);
                self.state.phase = Phase::Ready;
                Ok(Completion::Applied)
            }
            Err(err) => {
                let human = humanize_error(&err);
                warn!(%err, message = %human.message, "Run failed");
                self.failure = Some(human);
                self.state.phase = Phase::Failed;
                Err(err)
            }
        }
    }

    /// Submit, run, and apply in one step.
    pub async fn submit(&mut self) -> Result<Completion> {
        let run = self.begin_submit()?;
        let outcome = run.execute().await;
        self.complete(outcome)
    }

    /// Leave `Failed`, returning the message that was shown.
    pub fn acknowledge_failure(&mut self) -> Result<HumanError> {
        if self.state.phase != Phase::Failed {
            return Err(FalzwerkError::InvalidPhase(self.state.phase.to_string()));
        }
        self.state.phase = Phase::AwaitingInput;
        Ok(self.failure.take().unwrap_or_else(|| {
            humanize_error(&FalzwerkError::Internal("failure without a message".into()))
        }))
    }

    // -- Output ---------------------------------------------------------------

    /// Write the result into `dir` as `processed_<tool>_<millis>.<ext>` and
    /// return its path.
    #[instrument(skip(self, dir), fields(session = %self.id, dir = %dir.as_ref().display()))]
    pub fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let artifact = match (&self.state.phase, &self.state.result) {
            (Phase::Ready, Some(artifact)) => artifact,
            _ => return Err(FalzwerkError::NoArtifact),
        };

        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(artifact.download_name(chrono::Utc::now().timestamp_millis()));
        std::fs::write(&path, &artifact.bytes)?;

        info!(path = %path.display(), bytes = artifact.bytes.len(), mime = artifact.kind.mime_type(), "Result saved");
        Ok(path)
    }
}
