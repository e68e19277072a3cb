//! Thread-safe ingestion buffer for captured events
//!
//! All mutation (`record`, `drain`, `seal`) happens under one mutex.
//! Sequence numbers and timestamps are assigned under the same lock, so
//! arrival order, sequence order and timestamp order agree.
//!
//! Records are kept in fixed-size segments. Full segments are immutable and
//! shared through a back-linked `Arc` chain, so a reader only clones the chain
//! head and the partially filled segment (fewer than `SEGMENT_LEN` pointers)
//! under the lock. Flattening into a `Snapshot` happens after the lock is
//! released.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::assertions::Assertions;
use crate::record::{EmittedEvent, EventRecord};

/// Wall clock anchored once, advanced by a monotonic clock
#[derive(Debug, Clone, Copy)]
struct SinkClock {
    started_at: Instant,
    started_wall: DateTime<Utc>,
}

impl SinkClock {
    fn new() -> Self {
        Self {
            started_at: Instant::now(),
            started_wall: Utc::now(),
        }
    }

    fn now(&self) -> (DateTime<Utc>, Duration) {
        let offset = self.started_at.elapsed();
        let timestamp = chrono::Duration::from_std(offset)
            .ok()
            .and_then(|elapsed| self.started_wall.checked_add_signed(elapsed))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (timestamp, offset)
    }
}

const SEGMENT_LEN: usize = 64;

/// A full, immutable run of records and the segment before it
#[derive(Debug)]
struct Segment {
    records: Vec<Arc<EventRecord>>,
    previous: Option<Arc<Segment>>,
}

impl Drop for Segment {
    // Unlink iteratively so long chains do not recurse on drop
    fn drop(&mut self) {
        let mut next = self.previous.take();
        while let Some(segment) = next {
            next = match Arc::try_unwrap(segment) {
                Ok(mut owned) => owned.previous.take(),
                Err(_) => None,
            };
        }
    }
}

/// Records cut out of the sink under the lock, flattened outside it
struct Cut {
    full: Option<Arc<Segment>>,
    open: Vec<Arc<EventRecord>>,
    len: usize,
}

impl Cut {
    fn into_records(self) -> Vec<Arc<EventRecord>> {
        let mut chain: Vec<&Segment> = Vec::new();
        let mut cursor = self.full.as_deref();
        while let Some(segment) = cursor {
            chain.push(segment);
            cursor = segment.previous.as_deref();
        }

        let mut records = Vec::with_capacity(self.len);
        for segment in chain.iter().rev() {
            records.extend(segment.records.iter().cloned());
        }
        records.extend(self.open);
        records
    }
}

#[derive(Debug, Default)]
struct SinkState {
    full: Option<Arc<Segment>>,
    open: Vec<Arc<EventRecord>>,
    len: usize,
    next_seq: u64,
    sealed: bool,
}

impl SinkState {
    fn push(&mut self, record: Arc<EventRecord>) {
        self.open.push(record);
        self.len += 1;
        if self.open.len() == SEGMENT_LEN {
            let records = std::mem::replace(&mut self.open, Vec::with_capacity(SEGMENT_LEN));
            self.full = Some(Arc::new(Segment {
                records,
                previous: self.full.take(),
            }));
        }
    }

    fn cut(&self) -> Cut {
        Cut {
            full: self.full.clone(),
            open: self.open.clone(),
            len: self.len,
        }
    }

    fn take(&mut self) -> Cut {
        let len = std::mem::take(&mut self.len);
        Cut {
            full: self.full.take(),
            open: std::mem::take(&mut self.open),
            len,
        }
    }
}

/// Appender-like endpoint that a backend delivers events to
#[derive(Debug)]
pub struct CaptureSink {
    clock: SinkClock,
    state: Mutex<SinkState>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            clock: SinkClock::new(),
            state: Mutex::new(SinkState::default()),
        }
    }

    /// Wall-clock time the sink started capturing
    pub fn started_at(&self) -> DateTime<Utc> {
        self.clock.started_wall
    }

    /// Append one event
    ///
    /// Returns `false` without recording once the sink is sealed.
    pub fn record(&self, event: EmittedEvent) -> bool {
        let mut state = self.state.lock();
        if state.sealed {
            return false;
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        let (timestamp, offset) = self.clock.now();
        state.push(Arc::new(EventRecord::stamp(event, seq, timestamp, offset)));
        true
    }

    /// Immutable copy of the current sequence
    pub fn snapshot(&self) -> Snapshot {
        let (cut, sealed) = {
            let state = self.state.lock();
            (state.cut(), state.sealed)
        };
        Snapshot::from_records(cut.into_records(), sealed)
    }

    /// Atomically remove and return everything recorded so far
    ///
    /// A sealed sink is frozen: draining it returns nothing.
    pub fn drain(&self) -> Vec<Arc<EventRecord>> {
        let cut = {
            let mut state = self.state.lock();
            if state.sealed {
                return Vec::new();
            }
            state.take()
        };
        cut.into_records()
    }

    /// Freeze the sequence and return its final snapshot; idempotent
    pub fn seal(&self) -> Snapshot {
        let cut = {
            let mut state = self.state.lock();
            state.sealed = true;
            state.cut()
        };
        Snapshot::from_records(cut.into_records(), true)
    }

    pub fn is_sealed(&self) -> bool {
        self.state.lock().sealed
    }

    pub fn len(&self) -> usize {
        self.state.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CaptureSink {
    fn default() -> Self {
        Self::new()
    }
}

/// A frozen, cheaply clonable view of a sink's sequence in arrival order
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: Arc<[Arc<EventRecord>]>,
    sealed: bool,
}

impl Snapshot {
    /// An empty snapshot
    pub fn empty() -> Self {
        Self::from_records(Vec::new(), false)
    }

    fn from_records(records: Vec<Arc<EventRecord>>, sealed: bool) -> Self {
        Self {
            records: records.into(),
            sealed,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EventRecord> {
        self.records.get(index).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter().map(Arc::as_ref)
    }

    pub fn records(&self) -> &[Arc<EventRecord>] {
        &self.records
    }

    /// Whether this is the final sequence of a sealed sink
    pub fn is_final(&self) -> bool {
        self.sealed
    }

    /// Messages in arrival order
    pub fn messages(&self) -> Vec<&str> {
        self.iter().map(EventRecord::message).collect()
    }

    /// Query view over this snapshot
    pub fn assertions(&self) -> Assertions {
        Assertions::new(self.clone())
    }

    /// One JSON object per line, for dumping a capture into a failure report
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a record cannot be encoded.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for record in self.iter() {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    fn emit(sink: &CaptureSink, message: &str) -> bool {
        sink.record(EmittedEvent::new(Level::Info, "sink.test", message))
    }

    #[test]
    fn test_record_assigns_increasing_seq() {
        let sink = CaptureSink::new();
        emit(&sink, "one");
        emit(&sink, "two");
        emit(&sink, "three");

        let snapshot = sink.snapshot();
        let seqs: Vec<u64> = snapshot.iter().map(EventRecord::seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(snapshot.messages(), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let sink = CaptureSink::new();
        for i in 0..100 {
            emit(&sink, &i.to_string());
        }
        let snapshot = sink.snapshot();
        let records: Vec<&EventRecord> = snapshot.iter().collect();
        for pair in records.windows(2) {
            assert!(pair[0].timestamp() <= pair[1].timestamp());
            assert!(pair[0] < pair[1]);
        }
        assert!(records[0].timestamp() >= sink.started_at());
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_records() {
        let sink = CaptureSink::new();
        emit(&sink, "before");
        let snapshot = sink.snapshot();
        emit(&sink, "after");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(sink.len(), 2);
        assert!(!snapshot.is_final());
    }

    #[test]
    fn test_drain_empties_and_keeps_sequence_numbers() {
        let sink = CaptureSink::new();
        emit(&sink, "a");
        emit(&sink, "b");

        let drained = sink.drain();
        assert_eq!(drained.len(), 2);
        assert!(sink.snapshot().is_empty());

        emit(&sink, "c");
        let after = sink.snapshot();
        assert_eq!(after.get(0).map(EventRecord::seq), Some(2));
    }

    #[test]
    fn test_seal_freezes_sequence() {
        let sink = CaptureSink::new();
        emit(&sink, "kept");

        let sealed = sink.seal();
        assert!(sealed.is_final());
        assert!(!emit(&sink, "dropped"));
        assert!(sink.drain().is_empty());

        let again = sink.seal();
        assert_eq!(again.len(), 1);
        assert_eq!(again.messages(), vec!["kept"]);
    }

    #[test]
    fn test_order_survives_segment_boundaries() {
        let sink = CaptureSink::new();
        let total = SEGMENT_LEN * 3 + 5;
        for i in 0..total {
            emit(&sink, &i.to_string());
        }

        let snapshot = sink.snapshot();
        let seqs: Vec<u64> = snapshot.iter().map(EventRecord::seq).collect();
        assert_eq!(seqs, (0..total as u64).collect::<Vec<_>>());
        assert_eq!(sink.len(), total);

        let drained = sink.drain();
        assert_eq!(drained.len(), total);
        assert!(sink.is_empty());
        assert_eq!(snapshot.len(), total);

        emit(&sink, "next");
        assert_eq!(sink.snapshot().get(0).map(EventRecord::seq), Some(total as u64));
    }

    #[test]
    fn test_earlier_snapshot_unaffected_by_segment_rollover() {
        let sink = CaptureSink::new();
        for i in 0..SEGMENT_LEN - 1 {
            emit(&sink, &i.to_string());
        }
        let before = sink.snapshot();
        emit(&sink, "fills segment");
        emit(&sink, "starts next");

        let sealed = sink.seal();
        assert_eq!(before.len(), SEGMENT_LEN - 1);
        assert_eq!(sealed.len(), SEGMENT_LEN + 1);
        assert_eq!(sealed.messages().last(), Some(&"starts next"));
        assert!(Arc::ptr_eq(&before.records()[0], &sealed.records()[0]));
    }

    #[test]
    fn test_json_lines_one_per_record() {
        let sink = CaptureSink::new();
        emit(&sink, "first");
        emit(&sink, "second");

        let dump = sink.snapshot().to_json_lines().unwrap();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["message"], "first");
        assert_eq!(first["level"], "INFO");
        assert_eq!(first["logger_name"], "sink.test");
    }
}
