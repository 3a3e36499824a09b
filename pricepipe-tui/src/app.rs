//! Application state, owned by the main thread.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use pricepipe_core::data::{write_csv, NormalizedPriceTable, WriteOutcome};
use pricepipe_core::{OutputLayout, Period, PriceRequest, Ticker};

use crate::worker::{WorkerCommand, WorkerResponse};

/// Rows shown in the preview table.
pub const PREVIEW_ROWS: usize = 5;

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel {
    Form,
    Chart,
    Help,
}

impl Panel {
    pub fn index(self) -> usize {
        match self {
            Panel::Form => 0,
            Panel::Chart => 1,
            Panel::Help => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Form),
            1 => Some(Panel::Chart),
            2 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Form => "Stock Data Pipeline",
            Panel::Chart => "Chart",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % 3).unwrap_or(Panel::Form)
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + 2) % 3).unwrap_or(Panel::Form)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Io,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Io => "IO",
        }
    }
}

/// Which form field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Ticker,
    Period,
}

/// Ticker input and period selector.
#[derive(Debug)]
pub struct FormState {
    pub ticker_input: String,
    pub period: Period,
    pub focus: FormField,
    /// Client-side validation message for the ticker field.
    pub validation_error: Option<String>,
}

impl FormState {
    pub fn new() -> Self {
        Self {
            ticker_input: String::new(),
            period: Period::default(),
            focus: FormField::Ticker,
            validation_error: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.focus == FormField::Ticker
    }
}

/// A successfully fetched and normalized table.
#[derive(Debug, Clone)]
pub struct FetchedData {
    pub request: PriceRequest,
    pub table: NormalizedPriceTable,
    pub fetched_at: NaiveDateTime,
}

impl FetchedData {
    pub fn rows(&self) -> usize {
        self.table.height()
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.table.latest_close()
    }

    /// Close-to-close change across the whole window.
    pub fn change(&self) -> Option<f64> {
        let series = self.table.close_series();
        let first = series.first()?.1;
        let last = series.last()?.1;
        Some(last - first)
    }
}

/// Where the current request stands.
#[derive(Debug, Clone)]
pub enum FetchState {
    Idle,
    InFlight(PriceRequest),
    Loaded(Box<FetchedData>),
    NoData(PriceRequest),
    Failed { request: PriceRequest, message: String },
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Welcome,
    ErrorHistory,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Form and results
    pub form: FormState,
    pub fetch: FetchState,
    pub last_saved: Option<PathBuf>,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,

    // Paths
    pub layout: OutputLayout,
}

impl AppState {
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        layout: OutputLayout,
    ) -> Self {
        Self {
            active_panel: Panel::Form,
            running: true,
            form: FormState::new(),
            fetch: FetchState::Idle,
            last_saved: None,
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(50),
            error_scroll: 0,
            overlay: Overlay::None,
            layout,
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.fetch, FetchState::InFlight(_))
    }

    pub fn loaded(&self) -> Option<&FetchedData> {
        match &self.fetch {
            FetchState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    /// Validate the form and hand the request to the worker.
    ///
    /// An invalid ticker never reaches the worker.
    pub fn submit(&mut self) {
        if self.is_fetching() {
            self.set_warning("A fetch is already in progress");
            return;
        }

        let ticker = match Ticker::parse(&self.form.ticker_input) {
            Ok(ticker) => ticker,
            Err(e) => {
                let message = e.to_string();
                self.form.validation_error = Some(message.clone());
                self.set_warning(message);
                return;
            }
        };
        self.form.validation_error = None;
        self.form.ticker_input = ticker.to_string();

        let request = PriceRequest::new(ticker, self.form.period);
        if self.worker_tx.send(WorkerCommand::Fetch(request.clone())).is_err() {
            self.push_error(
                ErrorCategory::Data,
                "Background worker is not running".into(),
                request.to_string(),
            );
            return;
        }
        self.set_status(format!("Fetching data for {}...", request.ticker));
        self.fetch = FetchState::InFlight(request);
    }

    /// Write the loaded table to a freshly generated filename.
    pub fn save_csv(&mut self) {
        let Some(data) = self.loaded() else {
            self.set_warning("Nothing to save yet: fetch a ticker first");
            return;
        };
        let request = data.request.clone();
        let path = self
            .layout
            .generate_filename(&request.ticker, request.period);

        match write_csv(&data.table, &path) {
            Ok(WriteOutcome::Written { path, rows }) => {
                self.set_status(format!("Saved {rows} rows to {}", path.display()));
                self.last_saved = Some(path);
            }
            Ok(WriteOutcome::SkippedEmpty) => {
                self.set_warning("Table is empty; nothing saved");
            }
            Err(e) => {
                self.push_error(ErrorCategory::Io, format!("Save failed: {e}"), request.to_string());
            }
        }
    }

    /// Apply a worker response.
    pub fn handle_response(&mut self, resp: WorkerResponse) {
        match resp {
            WorkerResponse::Started { request } => {
                self.set_status(format!("Fetching data for {request}..."));
            }
            WorkerResponse::Loaded { request, table } => {
                let rows = table.height();
                self.set_status(format!("Successfully loaded {rows} days of data for {}", request.ticker));
                self.fetch = FetchState::Loaded(Box::new(FetchedData {
                    request,
                    table,
                    fetched_at: chrono::Local::now().naive_local(),
                }));
            }
            WorkerResponse::NoData { request } => {
                self.set_warning(format!("No data found for ticker: {}", request.ticker));
                self.fetch = FetchState::NoData(request);
            }
            WorkerResponse::Failed {
                request,
                category,
                message,
            } => {
                self.push_error(category, message.clone(), request.to_string());
                self.fetch = FetchState::Failed { request, message };
            }
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > 50 {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    /// Set an info status message.
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    /// Set a warning status message.
    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}
