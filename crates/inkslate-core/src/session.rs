//! One open board: the canvas plus its persistence and live-sync plumbing.

use crate::canvas::Canvas;
use crate::collaboration::LiveSync;
use crate::storage::{GatewayEvent, PersistenceGateway, SaveScheduler, ThumbnailThrottle};
use std::time::{Duration, Instant};

/// Drives a [`Canvas`] for one board.
///
/// The host feeds input into [`BoardSession::canvas_mut`] and calls
/// [`BoardSession::tick`] once per frame; saves, thumbnail exports and sync
/// traffic are issued from there and never block.
pub struct BoardSession {
    board: String,
    canvas: Canvas,
    gateway: PersistenceGateway,
    saves: SaveScheduler,
    thumbnails: ThumbnailThrottle,
    live: Option<LiveSync>,
    loaded: bool,
    thumbnail_reference: Option<String>,
}

impl BoardSession {
    /// Open `board`: the canvas starts empty and the stored document is
    /// requested in the background.
    pub fn open(board: impl Into<String>, canvas: Canvas, gateway: PersistenceGateway) -> Self {
        let board = board.into();
        let saves = SaveScheduler::new(Duration::from_millis(canvas.config.save_debounce_ms));
        let thumbnails = ThumbnailThrottle::new(Duration::from_millis(canvas.config.thumbnail_interval_ms));
        if !gateway.load(&board) {
            log::warn!("Persistence worker unavailable; board {board} opens empty");
        }
        Self {
            board,
            canvas,
            gateway,
            saves,
            thumbnails,
            live: None,
            loaded: false,
            thumbnail_reference: None,
        }
    }

    /// Attach a live-sync channel.
    pub fn with_live_sync(mut self, mut live: LiveSync) -> Self {
        if !self.loaded {
            live.defer_initial_push();
        }
        self.live = Some(live);
        self
    }

    pub fn board(&self) -> &str {
        &self.board
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn live_sync(&self) -> Option<&LiveSync> {
        self.live.as_ref()
    }

    pub fn live_sync_mut(&mut self) -> Option<&mut LiveSync> {
        self.live.as_mut()
    }

    /// Whether the initial load has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Reference of the most recently stored thumbnail.
    pub fn thumbnail_reference(&self) -> Option<&str> {
        self.thumbnail_reference.as_deref()
    }

    /// Process everything that happened since the last tick. Returns true if
    /// the host should repaint.
    pub fn tick(&mut self, now: Instant) -> bool {
        for event in self.gateway.poll_events() {
            self.handle_gateway_event(event);
        }

        if let Some(live) = &mut self.live {
            live.poll(&mut self.canvas);
        }

        if self.canvas.take_persist_request() {
            self.saves.request(now);
            if let Some(live) = &self.live {
                live.broadcast(self.canvas.to_records());
            }
        }

        if self.saves.take_due(now) {
            self.save(now);
        }

        self.canvas.take_repaint()
    }

    /// Issue any pending save now, ignoring the debounce window.
    pub fn flush(&mut self, now: Instant) {
        if self.canvas.take_persist_request() {
            self.saves.request(now);
            if let Some(live) = &self.live {
                live.broadcast(self.canvas.to_records());
            }
        }
        if self.saves.flush() {
            self.save(now);
        }
    }

    /// Flush, wait for the worker to finish, and apply its last results.
    pub fn close(mut self) -> Canvas {
        self.flush(Instant::now());
        self.gateway.shutdown();
        for event in self.gateway.poll_events() {
            self.handle_gateway_event(event);
        }
        if let Some(live) = &mut self.live {
            live.disconnect();
        }
        self.canvas
    }

    fn save(&mut self, now: Instant) {
        if !self.gateway.save(&self.board, self.canvas.to_records()) {
            log::warn!("Save of board {} dropped: worker unavailable", self.board);
            return;
        }
        if let Some(guard) = self.thumbnails.try_start(now) {
            let config = &self.canvas.config;
            self.gateway.export_thumbnail(
                &self.board,
                self.canvas.document.shapes().to_vec(),
                config.thumbnail_width,
                config.thumbnail_height,
                guard,
            );
        }
    }

    fn handle_gateway_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Loaded { board, records } if board == self.board => {
                self.loaded = true;
                if self.canvas.has_local_edits() {
                    log::info!("Ignoring stored copy of {board}: document already edited");
                } else {
                    self.canvas.load_records(records);
                }
                if let Some(live) = &mut self.live {
                    live.publish(self.canvas.to_records());
                }
            }
            GatewayEvent::Loaded { board, .. } => {
                log::debug!("Ignoring load result for other board {board}");
            }
            GatewayEvent::Saved { board } => log::debug!("Board {board} saved"),
            GatewayEvent::SaveFailed { board, error } => {
                log::warn!("Save of board {board} failed: {error}");
            }
            GatewayEvent::ThumbnailStored { reference, .. } => {
                self.thumbnail_reference = Some(reference);
            }
            GatewayEvent::ThumbnailFailed { board, error } => {
                log::debug!("Thumbnail for {board} not stored: {error}");
            }
        }
    }
}
