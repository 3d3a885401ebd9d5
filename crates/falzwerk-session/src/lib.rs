// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// falzwerk-session — One tool-usage session: staged input files, typed
// options, the run lifecycle, and the downloadable result.

pub mod session;
pub mod staging;

pub use session::{Completion, PendingRun, Phase, RunOutcome, SessionController, SessionState};
pub use staging::FileStagingArea;
