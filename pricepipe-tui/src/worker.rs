//! Background worker thread. Fetch and normalize run here.
//!
//! Communication with the TUI main thread is via `mpsc` channels.
//! The worker owns the pipeline, so the rate limiter spans requests.

use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use pricepipe_core::data::{FetchError, NormalizedPriceTable};
use pricepipe_core::pipeline::PipelineError;
use pricepipe_core::{Pipeline, PriceRequest};

use crate::app::ErrorCategory;

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    Fetch(PriceRequest),
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    Started {
        request: PriceRequest,
    },
    Loaded {
        request: PriceRequest,
        table: NormalizedPriceTable,
    },
    NoData {
        request: PriceRequest,
    },
    Failed {
        request: PriceRequest,
        category: ErrorCategory,
        message: String,
    },
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    pipeline: Pipeline,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("pricepipe-worker".into())
        .spawn(move || worker_loop(pipeline, rx, tx))
}

fn worker_loop(pipeline: Pipeline, rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::Fetch(request)) => {
                let _ = tx.send(WorkerResponse::Started {
                    request: request.clone(),
                });
                let resp = handle_fetch(&pipeline, request);
                if tx.send(resp).is_err() {
                    break;
                }
            }
        }
    }
    info!("worker stopped");
}

fn handle_fetch(pipeline: &Pipeline, request: PriceRequest) -> WorkerResponse {
    match pipeline.preview(&request) {
        Ok(table) if table.is_empty() => WorkerResponse::NoData { request },
        Ok(table) => {
            info!(%request, rows = table.height(), "fetched");
            WorkerResponse::Loaded { request, table }
        }
        Err(e) if e.is_no_data() => {
            warn!(%request, "no data");
            WorkerResponse::NoData { request }
        }
        Err(e) => {
            warn!(%request, error = %e, "fetch failed");
            WorkerResponse::Failed {
                request,
                category: categorize(&e),
                message: e.to_string(),
            }
        }
    }
}

fn categorize(error: &PipelineError) -> ErrorCategory {
    match error {
        PipelineError::Fetch(FetchError::Provider(_)) => ErrorCategory::Network,
        _ => ErrorCategory::Data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pricepipe_core::data::{Fetcher, RateLimit, SyntheticProvider};
    use pricepipe_core::{OutputLayout, Period, Ticker};
    use std::sync::mpsc;
    use std::time::Duration;

    fn synthetic_pipeline() -> Pipeline {
        let end = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let fetcher = Fetcher::new(Box::new(SyntheticProvider::ending(end)), RateLimit::disabled());
        Pipeline::new(fetcher, OutputLayout::new("unused"))
    }

    #[test]
    fn worker_fetches_and_shuts_down() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(synthetic_pipeline(), cmd_rx, resp_tx).unwrap();

        let request = PriceRequest::new(Ticker::parse("AAPL").unwrap(), Period::OneMonth);
        cmd_tx.send(WorkerCommand::Fetch(request)).unwrap();

        let started = resp_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(started, WorkerResponse::Started { .. }));
        match resp_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            WorkerResponse::Loaded { request, table } => {
                assert_eq!(request.ticker.as_str(), "AAPL");
                assert_eq!(table.height(), 21);
            }
            other => panic!("unexpected response: {other:?}"),
        }

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn worker_exits_when_sender_dropped() {
        let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerCommand>();
        let (resp_tx, _resp_rx) = mpsc::channel();
        let handle = spawn_worker(synthetic_pipeline(), cmd_rx, resp_tx).unwrap();
        drop(cmd_tx);
        handle.join().unwrap();
    }
}
