//! Usage counting for ranking results.
//!
//! Every pick of an emoji bumps its counter in memory right away. Writing the
//! counters to disk is debounced: each mutation records its time and arms the
//! background writer, which only writes once a full quiet period has passed
//! since the latest mutation:
//!
//! ```text
//! increment ──┬─ ranks[e] += 1, dirty = true, last_mutation = now
//!             └─ arm writer (fires at last_mutation + delay)
//!
//! on fire:   dirty && now - last_mutation >= delay  -> write snapshot
//!            otherwise                              -> nothing (a newer
//!                                                      timer is pending)
//! ```
//!
//! A burst of increments therefore costs a single write. Writes happen on the
//! writer thread and never on the caller's path. Pending increments are not
//! written when the tracker is dropped; call [`UsageTracker::flush`] for that.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;

use crate::error::{PickerError, PickerResult};

/// Emoji symbol to number of uses.
///
/// Ordered by symbol so that ties in usage count resolve the same way on
/// every call.
pub type UsageRanks = BTreeMap<String, u32>;

/// Durable storage for usage ranks.
pub trait RanksStore: Send + Sync {
    /// Read persisted ranks. Nothing persisted yet is an empty map, not an error.
    fn load(&self) -> PickerResult<UsageRanks>;

    /// Replace the persisted ranks with `ranks`.
    fn save(&self, ranks: &UsageRanks) -> PickerResult<()>;
}

/// Ranks kept as a flat JSON object, e.g. `{"👀":6,"🧡":5}`.
#[derive(Debug, Clone)]
pub struct JsonRanksFile {
    path: PathBuf,
}

impl JsonRanksFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RanksStore for JsonRanksFile {
    fn load(&self) -> PickerResult<UsageRanks> {
        if !self.path.exists() {
            tracing::debug!("No ranks file at {}", self.path.display());
            return Ok(UsageRanks::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            PickerError::RanksUnavailable(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            PickerError::RanksUnavailable(format!("cannot parse {}: {}", self.path.display(), e))
        })
    }

    /// Write to a temporary file next to the target and rename it into place,
    /// so readers never see a half-written file.
    fn save(&self, ranks: &UsageRanks) -> PickerResult<()> {
        let write = || -> PickerResult<()> {
            let parent_dir = match self.path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            fs::create_dir_all(parent_dir)?;

            let temp_file = NamedTempFile::new_in(parent_dir)?;
            {
                let mut writer = BufWriter::new(temp_file.as_file());
                serde_json::to_writer(&mut writer, ranks)?;
                writer.flush()?;
            }
            temp_file.persist(&self.path).map_err(|e| e.error)?;
            Ok(())
        };

        write().map_err(|e| {
            PickerError::WriteFailed(format!("{}: {}", self.path.display(), e))
        })
    }
}

/// Write-coalescing state. Not persisted.
#[derive(Debug, Default, Clone, Copy)]
struct PendingWrite {
    dirty: bool,
    last_mutation: Option<Instant>,
}

#[derive(Debug, Default)]
struct UsageState {
    /// `None` until first loaded from the store
    ranks: Option<UsageRanks>,
    pending: PendingWrite,
    /// Bumped on every mutation; lets readers tag derived data
    generation: u64,
}

/// Most used emojis at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankSnapshot {
    pub top: Vec<String>,
    pub generation: u64,
}

/// Statistics about tracked usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageStats {
    pub tracked_emojis: usize,
    pub total_uses: u64,
    pub max_uses: u32,
}

enum WriterMessage {
    /// A mutation happened at this instant
    Armed(Instant),
    Shutdown,
}

struct Shared {
    state: Mutex<UsageState>,
    /// Held for the whole snapshot-and-write sequence so only one write is
    /// in flight and writes land in snapshot order.
    io: Mutex<()>,
    store: Arc<dyn RanksStore>,
    write_delay: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    /// Ranks, loading them from the store on first access.
    fn ranks<'a>(&self, state: &'a mut UsageState) -> &'a mut UsageRanks {
        state.ranks.get_or_insert_with(|| match self.store.load() {
            Ok(ranks) => {
                tracing::info!("Loaded {} ranks", ranks.len());
                ranks
            }
            Err(e) => {
                tracing::warn!("{}; starting with empty usage history", e);
                UsageRanks::new()
            }
        })
    }

    fn mark_dirty(state: &mut UsageState, now: Instant) {
        state.pending.dirty = true;
        state.pending.last_mutation = Some(now);
        state.generation = state.generation.wrapping_add(1);
    }

    /// Timer expiry. Writes if the ranks are dirty and quiet long enough;
    /// returns a new deadline if a newer mutation moved the quiet period.
    fn on_timer(&self) -> Option<Instant> {
        let _io = lock(&self.io);

        let snapshot = {
            let mut state = lock(&self.state);
            if !state.pending.dirty {
                return None;
            }
            if let Some(last) = state.pending.last_mutation {
                if last.elapsed() < self.write_delay {
                    return Some(last + self.write_delay);
                }
            }
            state.pending.dirty = false;
            self.ranks(&mut state).clone()
        };

        self.write_snapshot(&snapshot);
        None
    }

    /// Synchronous write of the current ranks if they changed since the last write.
    fn flush(&self) -> PickerResult<bool> {
        let _io = lock(&self.io);

        let snapshot = {
            let mut state = lock(&self.state);
            if !state.pending.dirty {
                return Ok(false);
            }
            state.pending.dirty = false;
            self.ranks(&mut state).clone()
        };

        match self.store.save(&snapshot) {
            Ok(()) => {
                tracing::info!("Wrote usage ranks");
                Ok(true)
            }
            Err(e) => {
                lock(&self.state).pending.dirty = true;
                Err(e)
            }
        }
    }

    fn write_snapshot(&self, snapshot: &UsageRanks) {
        match self.store.save(snapshot) {
            Ok(()) => tracing::info!("Wrote usage ranks"),
            Err(e) => {
                // Stays dirty; the next mutation arms another attempt
                tracing::error!("{}", e);
                lock(&self.state).pending.dirty = true;
            }
        }
    }
}

fn writer_loop(rx: Receiver<WriterMessage>, shared: Arc<Shared>) {
    let mut deadline: Option<Instant> = None;

    loop {
        let message = match deadline {
            Some(at) => match rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                Ok(message) => Some(message),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(message) => Some(message),
                Err(_) => break,
            },
        };

        match message {
            Some(WriterMessage::Armed(at)) => {
                let fire_at = at + shared.write_delay;
                deadline = Some(deadline.map_or(fire_at, |d| d.max(fire_at)));
            }
            Some(WriterMessage::Shutdown) => break,
            None => deadline = shared.on_timer(),
        }
    }

    tracing::debug!("Ranks writer stopped");
}

/// Per-emoji usage counts with debounced persistence.
pub struct UsageTracker {
    shared: Arc<Shared>,
    tx: Sender<WriterMessage>,
    writer: Option<JoinHandle<()>>,
}

impl UsageTracker {
    /// Create a tracker backed by `store`. Nothing is read until first use.
    pub fn new(store: Arc<dyn RanksStore>, write_delay: Duration) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(UsageState::default()),
            io: Mutex::new(()),
            store,
            write_delay,
        });

        let (tx, rx) = mpsc::channel();
        let worker_shared = Arc::clone(&shared);
        let writer = thread::spawn(move || writer_loop(rx, worker_shared));

        Self {
            shared,
            tx,
            writer: Some(writer),
        }
    }

    pub fn write_delay(&self) -> Duration {
        self.shared.write_delay
    }

    /// Make sure ranks are loaded. Returns how many emojis have counts.
    pub fn load(&self) -> usize {
        let mut state = lock(&self.shared.state);
        self.shared.ranks(&mut state).len()
    }

    /// Add `amount` uses to `emoji` and schedule a write.
    pub fn increment(&self, emoji: &str, amount: u32) {
        let now = Instant::now();
        {
            let mut state = lock(&self.shared.state);
            let count = self.shared.ranks(&mut state).entry(emoji.to_string()).or_insert(0);
            *count = count.saturating_add(amount);
            Shared::mark_dirty(&mut state, now);
        }
        self.arm(now);
    }

    /// Forget an emoji's usage. Returns its previous count.
    pub fn remove(&self, emoji: &str) -> Option<u32> {
        let now = Instant::now();
        let removed = {
            let mut state = lock(&self.shared.state);
            let removed = self.shared.ranks(&mut state).remove(emoji);
            if removed.is_some() {
                Shared::mark_dirty(&mut state, now);
            }
            removed
        };

        if removed.is_some() {
            tracing::info!("Removed emoji rank for '{}'", emoji);
            self.arm(now);
        } else {
            tracing::debug!("Emoji rank not found for '{}'", emoji);
        }
        removed
    }

    /// Clear all usage and write the empty mapping immediately.
    pub fn reset(&self) -> PickerResult<()> {
        {
            let mut state = lock(&self.shared.state);
            self.shared.ranks(&mut state).clear();
            Shared::mark_dirty(&mut state, Instant::now());
        }
        self.shared.flush()?;
        tracing::info!("All emoji ranks have been reset");
        Ok(())
    }

    /// Write pending changes now instead of waiting for the writer.
    ///
    /// Returns `false` if there was nothing to write.
    pub fn flush(&self) -> PickerResult<bool> {
        self.shared.flush()
    }

    pub fn count(&self, emoji: &str) -> u32 {
        let mut state = lock(&self.shared.state);
        self.shared.ranks(&mut state).get(emoji).copied().unwrap_or(0)
    }

    /// Most used emojis first, at most `limit` of them.
    pub fn top_emojis(&self, limit: usize) -> Vec<String> {
        self.snapshot(limit).top
    }

    /// Top emojis together with the generation they were taken at.
    pub fn snapshot(&self, limit: usize) -> RankSnapshot {
        let mut state = lock(&self.shared.state);
        let top = top_from_ranks(self.shared.ranks(&mut state), limit);
        RankSnapshot {
            top,
            generation: state.generation,
        }
    }

    pub fn generation(&self) -> u64 {
        lock(&self.shared.state).generation
    }

    /// Whether there are changes not yet written to the store.
    pub fn is_dirty(&self) -> bool {
        lock(&self.shared.state).pending.dirty
    }

    pub fn stats(&self) -> UsageStats {
        let mut state = lock(&self.shared.state);
        let ranks = self.shared.ranks(&mut state);
        UsageStats {
            tracked_emojis: ranks.len(),
            total_uses: ranks.values().map(|&c| c as u64).sum(),
            max_uses: ranks.values().copied().max().unwrap_or(0),
        }
    }

    fn arm(&self, at: Instant) {
        if self.tx.send(WriterMessage::Armed(at)).is_err() {
            tracing::error!("Ranks writer is not running; usage will not be saved");
        }
    }
}

impl Drop for UsageTracker {
    fn drop(&mut self) {
        let _ = self.tx.send(WriterMessage::Shutdown);
        if let Some(handle) = self.writer.take() {
            if handle.join().is_err() {
                tracing::error!("Ranks writer panicked");
            }
        }
    }
}

/// Sort by descending count. Ties keep map order (by symbol). Zero counts
/// never rank.
fn top_from_ranks(ranks: &UsageRanks, limit: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, u32)> = ranks
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(emoji, &count)| (emoji, count))
        .collect();
    ranked.sort_by_key(|&(_, count)| std::cmp::Reverse(count));

    ranked
        .into_iter()
        .take(limit)
        .map(|(emoji, _)| emoji.clone())
        .collect()
}
