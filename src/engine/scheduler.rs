use std::fmt;
use std::time::{Duration, Instant};

use super::buffer::{EditBuffer, FlushSnapshot};
use crate::error::FlushError;
use crate::store::ValueStore;

/// Time source for the settle timer. Injected so tests can move time by hand.
pub(crate) trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncState {
    /// Nothing pending.
    Idle,
    /// Edits pending; a flush happens once the settle timer expires.
    Armed,
    /// One batched write is in flight.
    Flushing,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "saved"),
            Self::Armed => write!(f, "pending"),
            Self::Flushing => write!(f, "saving"),
        }
    }
}

/// What listeners see on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyncStatus {
    pub(crate) state: SyncState,
    pub(crate) pending_count: usize,
    pub(crate) last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SyncSettings {
    pub(crate) settle_window: Duration,
    /// Timer-driven attempts after a failure before waiting for the next
    /// edit or a manual save.
    pub(crate) max_auto_retries: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            settle_window: Duration::from_secs(2),
            max_auto_retries: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BeginFlush {
    Started(FlushSnapshot),
    /// A write is already in flight; this request runs right after it.
    Queued,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct FlushReport {
    pub(crate) written: usize,
    pub(crate) cleared: usize,
    /// Edits that arrived while the write was in flight.
    pub(crate) remaining: usize,
}

type Listener = Box<dyn FnMut(&SyncStatus)>;

/// Debounces buffered edits into batched writes, one in flight at a time.
pub(crate) struct SyncScheduler<C: Clock> {
    clock: C,
    settings: SyncSettings,
    state: SyncState,
    deadline: Option<Instant>,
    queued: bool,
    failures: u32,
    pending_count: usize,
    last_error: Option<String>,
    listeners: Vec<Listener>,
}

impl<C: Clock> SyncScheduler<C> {
    pub(crate) fn new(clock: C, settings: SyncSettings) -> Self {
        Self {
            clock,
            settings,
            state: SyncState::Idle,
            deadline: None,
            queued: false,
            failures: 0,
            pending_count: 0,
            last_error: None,
            listeners: Vec::new(),
        }
    }

    pub(crate) fn state(&self) -> SyncState {
        self.state
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn status(&self) -> SyncStatus {
        SyncStatus {
            state: self.state,
            pending_count: self.pending_count,
            last_error: self.last_error.clone(),
        }
    }

    pub(crate) fn on_state_change(&mut self, listener: impl FnMut(&SyncStatus) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self) {
        let status = self.status();
        for listener in &mut self.listeners {
            listener(&status);
        }
    }

    /// True when the settle timer has run out and a flush should start.
    pub(crate) fn is_due(&self) -> bool {
        self.state == SyncState::Armed && self.deadline.is_some_and(|d| self.clock.now() >= d)
    }

    /// Time left on the settle timer, for sizing an input poll.
    pub(crate) fn time_until_due(&self) -> Option<Duration> {
        match (self.state, self.deadline) {
            (SyncState::Armed, Some(d)) => Some(d.saturating_duration_since(self.clock.now())),
            _ => None,
        }
    }

    /// Called after every buffer mutation. Restarts the settle timer.
    pub(crate) fn notify_edit(&mut self, pending: usize) {
        self.pending_count = pending;
        self.failures = 0;
        match self.state {
            SyncState::Flushing => {}
            SyncState::Idle | SyncState::Armed if pending == 0 => {
                self.state = SyncState::Idle;
                self.deadline = None;
            }
            SyncState::Idle | SyncState::Armed => {
                if self.state == SyncState::Idle {
                    tracing::debug!(pending, "sync armed");
                }
                self.state = SyncState::Armed;
                self.deadline = Some(self.clock.now() + self.settings.settle_window);
            }
        }
        self.emit();
    }

    /// Take a snapshot of the buffer and move to `Flushing`.
    pub(crate) fn begin_flush(&mut self, buffer: &EditBuffer) -> BeginFlush {
        if self.state == SyncState::Flushing {
            tracing::debug!("flush requested while another is in flight; queued");
            self.queued = true;
            return BeginFlush::Queued;
        }
        if buffer.is_empty() {
            self.pending_count = 0;
            if self.state != SyncState::Idle {
                self.state = SyncState::Idle;
                self.deadline = None;
                self.emit();
            }
            return BeginFlush::Empty;
        }

        let snapshot = buffer.snapshot();
        tracing::info!(edits = snapshot.len(), scope = %snapshot.scope, "flush started");
        self.state = SyncState::Flushing;
        self.deadline = None;
        self.emit();
        BeginFlush::Started(snapshot)
    }

    /// Resolve the in-flight write. On success the committed edits leave the
    /// buffer; on failure the buffer is left exactly as it was.
    pub(crate) fn complete_flush(
        &mut self,
        snapshot: &FlushSnapshot,
        outcome: Result<(), FlushError>,
        buffer: &mut EditBuffer,
    ) -> Result<FlushReport, FlushError> {
        let now = self.clock.now();
        let queued = std::mem::take(&mut self.queued);

        let result = match outcome {
            Ok(()) => {
                let cleared = buffer.clear(snapshot);
                self.failures = 0;
                self.last_error = None;
                self.pending_count = buffer.len();
                tracing::info!(
                    written = snapshot.len(),
                    cleared,
                    remaining = self.pending_count,
                    "flush committed"
                );
                Ok(FlushReport {
                    written: snapshot.len(),
                    cleared,
                    remaining: self.pending_count,
                })
            }
            Err(err) => {
                self.failures += 1;
                self.last_error = Some(err.to_string());
                self.pending_count = buffer.len();
                tracing::warn!(error = %err, failures = self.failures, "flush failed; edits kept");
                Err(err)
            }
        };

        self.deadline = if self.pending_count == 0 {
            None
        } else if queued {
            Some(now)
        } else if result.is_ok() || self.failures <= self.settings.max_auto_retries {
            Some(now + self.settings.settle_window)
        } else {
            None
        };
        self.state = if self.pending_count == 0 {
            SyncState::Idle
        } else {
            SyncState::Armed
        };
        self.emit();
        result
    }

    /// Snapshot, write and resolve in one step against a synchronous store.
    /// `None` when nothing was written (empty buffer or queued request).
    pub(crate) fn flush_with<S: ValueStore + ?Sized>(
        &mut self,
        buffer: &mut EditBuffer,
        store: &mut S,
    ) -> Option<Result<FlushReport, FlushError>> {
        let snapshot = match self.begin_flush(buffer) {
            BeginFlush::Started(snapshot) => snapshot,
            BeginFlush::Queued | BeginFlush::Empty => return None,
        };
        let outcome = match snapshot.duplicate_key() {
            Some(key) => Err(FlushError::Conflict(key)),
            None => store
                .upsert_facts(&snapshot.batch)
                .map(|_| ())
                .map_err(FlushError::from),
        };
        Some(self.complete_flush(&snapshot, outcome, buffer))
    }

    /// Flush if the settle timer has expired.
    pub(crate) fn tick<S: ValueStore + ?Sized>(
        &mut self,
        buffer: &mut EditBuffer,
        store: &mut S,
    ) -> Option<Result<FlushReport, FlushError>> {
        if !self.is_due() {
            return None;
        }
        self.flush_with(buffer, store)
    }

    /// Manual save: skip the settle window and write immediately.
    pub(crate) fn flush_now<S: ValueStore + ?Sized>(
        &mut self,
        buffer: &mut EditBuffer,
        store: &mut S,
    ) -> Option<Result<FlushReport, FlushError>> {
        if self.state == SyncState::Armed {
            self.deadline = None;
        }
        self.failures = 0;
        self.flush_with(buffer, store)
    }

    /// Forget timers and errors after the buffer was emptied outside a flush.
    pub(crate) fn reset(&mut self) {
        if self.state == SyncState::Flushing {
            return;
        }
        self.state = SyncState::Idle;
        self.deadline = None;
        self.queued = false;
        self.failures = 0;
        self.pending_count = 0;
        self.last_error = None;
        self.emit();
    }

    pub(crate) fn dismiss_error(&mut self) {
        if self.last_error.take().is_some() {
            self.emit();
        }
    }
}

/// Hand-driven clock for deterministic timer tests.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct ManualClock {
    now: std::rc::Rc<std::cell::Cell<Instant>>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: std::rc::Rc::new(std::cell::Cell::new(Instant::now())),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
