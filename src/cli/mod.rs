//! Command-line front end

mod context;
mod merge;
mod style;

pub use context::CommandContext;
pub use merge::{RunOptions, run_automerge};

use async_trait::async_trait;
use org_automerge::merge::MergeProgress;
use org_automerge::types::{PhaseResult, Repository, RepositoryOutcome};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use style::{Stylize, check, cross};
use tracing::warn;

/// How merge progress is written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Step lines and a text report per phase
    Text,
    /// One JSON document per line for each phase, nothing else
    Json,
}

/// One line of `--json` output
#[derive(Serialize)]
struct PhaseReport<'a> {
    /// Set when the phase stopped before every repository was attempted
    cancelled: bool,
    #[serde(flatten)]
    result: &'a PhaseResult,
}

/// Terminal progress output for merge runs
///
/// Every phase is reported as soon as it completes, so a run that fails in
/// a later phase has already shown what the earlier phases merged.
pub struct CliProgress<W = anstream::Stdout> {
    mode: OutputMode,
    out: Mutex<W>,
}

impl CliProgress {
    /// Progress written to stdout
    pub fn stdout(mode: OutputMode) -> Self {
        Self::with_writer(mode, anstream::stdout())
    }
}

impl<W: Write + Send> CliProgress<W> {
    /// Progress written to any writer
    pub const fn with_writer(mode: OutputMode, out: W) -> Self {
        Self {
            mode,
            out: Mutex::new(out),
        }
    }

    fn emit(&self, line: fmt::Arguments<'_>) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!(error = %e, "failed to write progress");
        }
    }

    fn text(&self, line: fmt::Arguments<'_>) {
        if self.mode == OutputMode::Text {
            self.emit(line);
        }
    }

    /// Report a phase's buckets (JSON line or text report)
    pub fn report_phase(&self, result: &PhaseResult, cancelled: bool) {
        match self.mode {
            OutputMode::Json => {
                match serde_json::to_string(&PhaseReport { cancelled, result }) {
                    Ok(json) => self.emit(format_args!("{json}")),
                    Err(e) => warn!(error = %e, "failed to serialize phase result"),
                }
            }
            OutputMode::Text => {
                if cancelled {
                    self.emit(format_args!(
                        "{}",
                        "Cancelled, remaining repositories were not attempted".warn()
                    ));
                }
                self.emit(format_args!("\n{result}"));
            }
        }
    }

    #[cfg(test)]
    fn into_writer(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<W: Write + Send> MergeProgress for CliProgress<W> {
    async fn on_phase_start(&self, base: &str, head: &str, count: usize) {
        self.text(format_args!(
            "{} {} into {} ({} repositories)",
            "Merging".emphasis(),
            head.accent(),
            base.accent(),
            count
        ));
    }

    async fn on_repository_done(&self, repository: &Repository, outcome: &RepositoryOutcome) {
        match outcome {
            RepositoryOutcome::Succeeded(merge) => {
                self.text(format_args!(
                    "  {} {} {}",
                    check(),
                    repository.name,
                    merge.commit_hash.muted()
                ));
            }
            RepositoryOutcome::Unprocessed(_) => {
                self.text(format_args!(
                    "  {} {} {}",
                    "=".muted(),
                    repository.name,
                    "already merged".muted()
                ));
            }
            RepositoryOutcome::Failed(e) => {
                self.text(format_args!("  {} {} {}", cross(), repository.name, e.message.warn()));
            }
        }
    }

    async fn on_phase_complete(&self, result: &PhaseResult) {
        self.report_phase(result, false);
    }

    async fn on_message(&self, message: &str) {
        self.text(format_args!("{}", message.muted()));
    }
}
