//! Background persistence worker.
//!
//! The editor hands load/save/thumbnail requests to a worker thread that owns
//! the storage backend, and picks up the results with [`PersistenceGateway::poll_events`].
//! Nothing here ever blocks the caller.

use super::{AccessPolicy, Storage, StorageError, ThumbnailGuard};
use crate::shapes::Shape;
use serde_json::Value;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Rasterizes a shape sequence into PNG bytes for a board thumbnail.
pub trait ThumbnailRenderer: Send {
    fn render_png(&self, shapes: &[Shape], width: u32, height: u32) -> Result<Vec<u8>, String>;
}

/// Results reported back by the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// A load finished. Failures, denials and missing boards all arrive as
    /// an empty record list.
    Loaded { board: String, records: Vec<Value> },
    Saved { board: String },
    SaveFailed { board: String, error: String },
    ThumbnailStored { board: String, reference: String },
    ThumbnailFailed { board: String, error: String },
}

enum Request {
    Load {
        board: String,
    },
    Save {
        board: String,
        records: Vec<Value>,
    },
    Thumbnail {
        board: String,
        shapes: Vec<Shape>,
        width: u32,
        height: u32,
        guard: ThumbnailGuard,
    },
    Shutdown,
}

/// Handle to the persistence worker thread.
pub struct PersistenceGateway {
    requests: Option<Sender<Request>>,
    events: Receiver<GatewayEvent>,
    worker: Option<JoinHandle<()>>,
}

impl PersistenceGateway {
    /// Start a worker that drives `storage`, consulting `policy` before every
    /// load and save. Without a renderer, thumbnail requests fail.
    pub fn spawn(
        storage: Arc<dyn Storage>,
        policy: Arc<dyn AccessPolicy>,
        renderer: Option<Box<dyn ThumbnailRenderer>>,
    ) -> Self {
        let (request_tx, request_rx) = channel::<Request>();
        let (event_tx, event_rx) = channel::<GatewayEvent>();

        let worker = thread::spawn(move || {
            let worker = Worker {
                storage,
                policy,
                renderer,
            };
            while let Ok(request) = request_rx.recv() {
                let event = match request {
                    Request::Load { board } => worker.load(board),
                    Request::Save { board, records } => worker.save(board, records),
                    Request::Thumbnail {
                        board,
                        shapes,
                        width,
                        height,
                        guard,
                    } => {
                        let event = worker.thumbnail(board, &shapes, width, height);
                        drop(guard);
                        event
                    }
                    Request::Shutdown => break,
                };
                if let Some(event) = event {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }
            log::debug!("Persistence worker exiting");
        });

        Self {
            requests: Some(request_tx),
            events: event_rx,
            worker: Some(worker),
        }
    }

    fn submit(&self, request: Request) -> bool {
        match &self.requests {
            Some(tx) => tx.send(request).is_ok(),
            None => false,
        }
    }

    /// Fetch a board. The result arrives as [`GatewayEvent::Loaded`].
    pub fn load(&self, board: &str) -> bool {
        self.submit(Request::Load {
            board: board.to_string(),
        })
    }

    /// Replace a board's stored records.
    pub fn save(&self, board: &str, records: Vec<Value>) -> bool {
        self.submit(Request::Save {
            board: board.to_string(),
            records,
        })
    }

    /// Render and store a thumbnail. `guard` is held until the upload finishes.
    pub fn export_thumbnail(
        &self,
        board: &str,
        shapes: Vec<Shape>,
        width: u32,
        height: u32,
        guard: ThumbnailGuard,
    ) -> bool {
        self.submit(Request::Thumbnail {
            board: board.to_string(),
            shapes,
            width,
            height,
            guard,
        })
    }

    /// Drain finished results (non-blocking).
    pub fn poll_events(&self) -> Vec<GatewayEvent> {
        self.events.try_iter().collect()
    }

    /// Block for the next result, up to `timeout`.
    pub fn wait_event(&self, timeout: Duration) -> Option<GatewayEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Finish queued requests and stop the worker.
    ///
    /// Results of the queued requests stay available through `poll_events`.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.requests.take() {
            let _ = tx.send(Request::Shutdown);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Persistence worker panicked");
            }
        }
    }
}

impl Drop for PersistenceGateway {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    storage: Arc<dyn Storage>,
    policy: Arc<dyn AccessPolicy>,
    renderer: Option<Box<dyn ThumbnailRenderer>>,
}

impl Worker {
    fn load(&self, board: String) -> Option<GatewayEvent> {
        if !self.policy.can_load(&board) {
            log::warn!("Load of board {board} denied; opening empty");
            return Some(GatewayEvent::Loaded {
                board,
                records: Vec::new(),
            });
        }
        let records = match pollster::block_on(self.storage.load(&board)) {
            Ok(records) => {
                log::info!("Loaded board {board} ({} records)", records.len());
                records
            }
            Err(StorageError::NotFound(_)) => {
                log::debug!("Board {board} not found; opening empty");
                Vec::new()
            }
            Err(err) => {
                log::warn!("Failed to load board {board}: {err}");
                Vec::new()
            }
        };
        Some(GatewayEvent::Loaded { board, records })
    }

    fn save(&self, board: String, records: Vec<Value>) -> Option<GatewayEvent> {
        if !self.policy.can_save(&board) {
            log::warn!("Save of board {board} denied; dropped");
            return Some(GatewayEvent::SaveFailed {
                error: StorageError::Denied(board.clone()).to_string(),
                board,
            });
        }
        match pollster::block_on(self.storage.save(&board, &records)) {
            Ok(()) => {
                log::debug!("Saved board {board} ({} records)", records.len());
                Some(GatewayEvent::Saved { board })
            }
            Err(err) => {
                log::warn!("Failed to save board {board}: {err}");
                Some(GatewayEvent::SaveFailed {
                    board,
                    error: err.to_string(),
                })
            }
        }
    }

    fn thumbnail(&self, board: String, shapes: &[Shape], width: u32, height: u32) -> Option<GatewayEvent> {
        let Some(renderer) = &self.renderer else {
            log::debug!("No thumbnail renderer configured");
            return Some(GatewayEvent::ThumbnailFailed {
                board,
                error: "no renderer".to_string(),
            });
        };
        let result = renderer
            .render_png(shapes, width, height)
            .and_then(|png| pollster::block_on(self.storage.store_thumbnail(&board, png)).map_err(|e| e.to_string()));
        match result {
            Ok(reference) => {
                log::debug!("Stored thumbnail for {board} at {reference}");
                Some(GatewayEvent::ThumbnailStored { board, reference })
            }
            Err(error) => {
                log::warn!("Thumbnail export for {board} failed: {error}");
                Some(GatewayEvent::ThumbnailFailed { board, error })
            }
        }
    }
}
