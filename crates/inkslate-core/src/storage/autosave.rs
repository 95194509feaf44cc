//! Save debouncing and thumbnail rate limiting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Default minimum time between thumbnail exports.
pub const DEFAULT_THUMBNAIL_INTERVAL: Duration = Duration::from_secs(8);

/// Decides when a requested save should be issued.
///
/// With a zero debounce every request is due immediately; otherwise a save
/// fires once no further request has arrived for the debounce window.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl SaveScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending_since: None,
        }
    }

    /// Note that the document changed at `now`.
    pub fn request(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Returns true (and clears the request) if a save should be issued now.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    /// Take any pending request regardless of the debounce window.
    pub fn flush(&mut self) -> bool {
        self.pending_since.take().is_some()
    }
}

/// Limits thumbnail exports to one per interval, and to one in flight.
///
/// Requests that arrive too soon or while an export is running are dropped,
/// not queued.
#[derive(Debug, Clone)]
pub struct ThumbnailThrottle {
    interval: Duration,
    last_started: Option<Instant>,
    busy: Arc<AtomicBool>,
}

/// Held while a thumbnail export runs; clears the busy flag when dropped.
#[derive(Debug)]
pub struct ThumbnailGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for ThumbnailGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl ThumbnailThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_started: None,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Try to start an export at `now`.
    pub fn try_start(&mut self, now: Instant) -> Option<ThumbnailGuard> {
        if let Some(last) = self.last_started {
            if now.saturating_duration_since(last) < self.interval {
                log::debug!("Thumbnail export skipped: interval not elapsed");
                return None;
            }
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Thumbnail export skipped: previous export still running");
            return None;
        }
        self.last_started = Some(now);
        Some(ThumbnailGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

impl Default for ThumbnailThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_INTERVAL)
    }
}
