//! Pipeline driver: fetch, normalize and write one request.
//!
//! Each stage short-circuits on empty input. Failures are logged and folded
//! into the returned [`PipelineReport`]; nothing here panics or aborts.

use crate::config::{PipelineConfig, ProviderKind};
use crate::data::{
    normalize, write_csv, FetchError, Fetcher, NormalizeError, NormalizedPriceTable,
    PriceProvider, ProviderError, SyntheticProvider, WriteError, WriteOutcome, YahooProvider,
};
use crate::domain::PriceRequest;
use crate::output::OutputLayout;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

/// Pipeline stage, for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Load,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Extract => "Fetching data",
            Stage::Transform => "Normalizing data",
            Stage::Load => "Writing CSV",
        }
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    Written { path: PathBuf, rows: usize },
    NoData,
    FetchFailed(ProviderError),
    NormalizeFailed(NormalizeError),
    WriteFailed { path: PathBuf, error: WriteError },
}

impl PipelineOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, PipelineOutcome::Written { .. })
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match self {
            PipelineOutcome::Written { path, rows } => {
                format!("wrote {rows} rows to {}", path.display())
            }
            PipelineOutcome::NoData => "no data returned; nothing written".to_string(),
            PipelineOutcome::FetchFailed(e) => format!("fetch failed: {e}"),
            PipelineOutcome::NormalizeFailed(e) => format!("normalization failed: {e}"),
            PipelineOutcome::WriteFailed { error, .. } => format!("write failed: {error}"),
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    pub request: PriceRequest,
    pub outcome: PipelineOutcome,
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_written()
    }
}

/// Failure of a fetch-and-normalize preview.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

impl PipelineError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, PipelineError::Fetch(e) if e.is_no_data())
    }
}

/// Progress callback for a pipeline run.
pub trait PipelineProgress {
    /// Called when a stage begins.
    fn on_stage(&self, stage: Stage, request: &PriceRequest);

    /// Called once the run has finished.
    fn on_finish(&self, report: &PipelineReport);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl PipelineProgress for StdoutProgress {
    fn on_stage(&self, stage: Stage, request: &PriceRequest) {
        println!("{}... ({request})", stage.label());
    }

    fn on_finish(&self, report: &PipelineReport) {
        match &report.outcome {
            PipelineOutcome::Written { .. } => println!("OK: {}", report.outcome.summary()),
            _ => println!("FAIL: {}", report.outcome.summary()),
        }
    }
}

/// Progress reporter that stays silent.
pub struct NoProgress;

impl PipelineProgress for NoProgress {
    fn on_stage(&self, _stage: Stage, _request: &PriceRequest) {}

    fn on_finish(&self, _report: &PipelineReport) {}
}

pub struct Pipeline {
    fetcher: Fetcher,
    layout: OutputLayout,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, layout: OutputLayout) -> Self {
        Self { fetcher, layout }
    }

    /// Build from configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ProviderError> {
        let provider: Box<dyn PriceProvider> = match config.provider.kind {
            ProviderKind::Yahoo => Box::new(YahooProvider::new(&config.provider)?),
            ProviderKind::Synthetic => Box::new(SyntheticProvider::new()),
        };
        let fetcher = Fetcher::new(provider, config.rate_limit.policy());
        Ok(Self::new(fetcher, OutputLayout::new(&config.output_dir)))
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Fetch and normalize without writing anything.
    pub fn preview(&self, request: &PriceRequest) -> Result<NormalizedPriceTable, PipelineError> {
        let raw = self.fetcher.fetch(request)?;
        Ok(normalize(raw)?)
    }

    /// Run fetch, normalize and write for one request.
    pub fn run(&self, request: &PriceRequest, progress: &dyn PipelineProgress) -> PipelineReport {
        let started = Instant::now();
        let outcome = self.run_stages(request, progress);
        let report = PipelineReport {
            request: request.clone(),
            outcome,
            elapsed: started.elapsed(),
        };
        info!(
            request = %report.request,
            success = report.is_success(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "pipeline finished"
        );
        progress.on_finish(&report);
        report
    }

    fn run_stages(&self, request: &PriceRequest, progress: &dyn PipelineProgress) -> PipelineOutcome {
        progress.on_stage(Stage::Extract, request);
        let raw = match self.fetcher.fetch(request) {
            Ok(raw) => raw,
            Err(FetchError::NoData { symbol }) => {
                warn!(symbol, "no data returned; skipping normalize and write");
                return PipelineOutcome::NoData;
            }
            Err(FetchError::Provider(e)) => {
                error!(request = %request, error = %e, "fetch failed");
                return PipelineOutcome::FetchFailed(e);
            }
        };

        progress.on_stage(Stage::Transform, request);
        let table = match normalize(raw) {
            Ok(table) => table,
            Err(e) => {
                error!(request = %request, error = %e, "normalization failed");
                return PipelineOutcome::NormalizeFailed(e);
            }
        };
        if table.is_empty() {
            warn!(request = %request, "no complete rows after normalization");
            return PipelineOutcome::NoData;
        }

        progress.on_stage(Stage::Load, request);
        let path = self.layout.generate_filename(&request.ticker, request.period);
        match write_csv(&table, &path) {
            Ok(WriteOutcome::Written { path, rows }) => PipelineOutcome::Written { path, rows },
            Ok(WriteOutcome::SkippedEmpty) => PipelineOutcome::NoData,
            Err(error) => {
                error!(path = %path.display(), error = %error, "failed to write CSV");
                PipelineOutcome::WriteFailed { path, error }
            }
        }
    }
}
