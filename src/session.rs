//! Per-interaction session state machine.
//!
//! Discrete operator events mutate the session; the scoring call is the
//! single blocking transition (`DataReady -> Requesting -> Succeeded |
//! Failed`). Everything here is terminal-agnostic so transitions and control
//! clamping are unit-testable.

use crate::dataset::LeadSource;
use crate::params::{
    ScoringParams, DEFAULT_AVG_SALES_PER_MONTH, DEFAULT_SAFE_GUARD, SAFE_GUARD_STEP,
    SALES_INPUT_STEP,
};
use crate::strategy::{RunOutcome, StrategyBundle};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Bundled,
    Upload,
}

#[derive(Debug)]
pub enum Phase {
    /// Waiting for an upload; no request can be built.
    Idle,
    /// A dataset is resolved and the Run trigger is live.
    DataReady,
    /// The blocking scoring call is outstanding.
    Requesting,
    Succeeded(StrategyBundle),
    Failed(RunFailure),
}

#[derive(Debug)]
pub enum RunFailure {
    Http { status: u16, body: String },
    Decode { message: String },
    Transport { message: String },
}

#[derive(Debug)]
pub struct Session {
    pub mode: SourceMode,
    pub upload_path: Option<PathBuf>,
    pub show_raw: bool,
    pub avg_sales_per_month: u64,
    pub safe_guard: f64,
    pub phase: Phase,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            mode: SourceMode::Bundled,
            upload_path: None,
            show_raw: false,
            avg_sales_per_month: DEFAULT_AVG_SALES_PER_MONTH,
            safe_guard: DEFAULT_SAFE_GUARD,
            phase: Phase::DataReady,
        }
    }
}

impl Session {
    /// A fresh session: bundled source already resolved (startup precondition).
    pub fn new() -> Session {
        Session::default()
    }

    /// Switch source mode. Prior results are dropped; the phase re-derives
    /// from whether the new mode has a dataset.
    pub fn set_mode(&mut self, mode: SourceMode) {
        self.mode = mode;
        self.reset_phase();
    }

    pub fn set_upload(&mut self, path: PathBuf) {
        self.upload_path = Some(path);
        self.reset_phase();
    }

    /// Forget a failed upload so the session returns to the waiting state.
    pub fn clear_upload(&mut self) {
        self.upload_path = None;
        self.reset_phase();
    }

    fn reset_phase(&mut self) {
        self.phase = match self.mode {
            SourceMode::Bundled => Phase::DataReady,
            SourceMode::Upload if self.upload_path.is_some() => Phase::DataReady,
            SourceMode::Upload => Phase::Idle,
        };
    }

    pub fn toggle_raw(&mut self) {
        self.show_raw = !self.show_raw;
    }

    /// Step the sales input by `steps` increments, clamped at zero.
    pub fn adjust_sales(&mut self, steps: i64) {
        self.avg_sales_per_month = if steps >= 0 {
            self.avg_sales_per_month
                .saturating_add(steps as u64 * SALES_INPUT_STEP)
        } else {
            self.avg_sales_per_month
                .saturating_sub(steps.unsigned_abs() * SALES_INPUT_STEP)
        };
    }

    /// Step the safeguard by `steps` increments, clamped to [0, 1]. Rounded
    /// to the step grid so repeated stepping never drifts.
    pub fn adjust_safe_guard(&mut self, steps: i64) {
        let value = self.safe_guard + steps as f64 * SAFE_GUARD_STEP;
        self.safe_guard = (value.clamp(0.0, 1.0) * 100.0).round() / 100.0;
    }

    pub fn params(&self) -> ScoringParams {
        ScoringParams {
            avg_sales_per_month: self.avg_sales_per_month,
            safe_guard: self.safe_guard,
        }
    }

    /// The source the current mode resolves to, if any.
    pub fn source(&self, bundled_leads: &Path) -> Option<LeadSource> {
        match self.mode {
            SourceMode::Bundled => Some(LeadSource::Bundled(bundled_leads.to_path_buf())),
            SourceMode::Upload => self.upload_path.clone().map(LeadSource::Upload),
        }
    }

    /// Suffix for download artifacts produced in the current mode.
    pub fn source_tag(&self) -> &'static str {
        match self.mode {
            SourceMode::Bundled => "default",
            SourceMode::Upload => "uploaded",
        }
    }

    pub fn can_run(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Requesting)
    }

    /// Enter `Requesting` if a run is allowed; a prior result is dropped, not
    /// memoized.
    pub fn begin_run(&mut self) -> bool {
        if !self.can_run() {
            return false;
        }
        self.phase = Phase::Requesting;
        true
    }

    pub fn finish_run(&mut self, outcome: RunOutcome) {
        self.phase = match outcome {
            RunOutcome::Strategy(bundle) => Phase::Succeeded(bundle),
            RunOutcome::HttpFailure { status, body } => {
                Phase::Failed(RunFailure::Http { status, body })
            }
            RunOutcome::DecodeFailure { message } => {
                Phase::Failed(RunFailure::Decode { message })
            }
        };
    }

    /// Transport-level failure: the call never produced a status code.
    pub fn fail_transport(&mut self, message: String) {
        self.phase = Phase::Failed(RunFailure::Transport { message });
    }
}
