//! Converts a sorted list of note records against a frame-indexed block
//! window into On/Off events.

use rill_core::{Frame, NoteNumber};

/// A stored note: sounds from `start` (inclusive) to `end` (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRecord {
    /// First frame at which the note sounds.
    pub start: Frame,
    /// Frame at which the note stops sounding (exclusive).
    pub end: Frame,
    /// The note number.
    pub note: NoteNumber,
}

/// An On or Off event produced by a block scan, to be folded into a track's
/// synth by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    /// Start sounding `NoteNumber`.
    On(NoteNumber),
    /// Stop sounding `NoteNumber`.
    Off(NoteNumber),
}

/// Holds a track's recorded note sequence, sorted by `start`, and answers
/// "what fires in `[start_frame, end_frame)`".
#[derive(Debug, Clone, Default)]
pub struct NoteScheduler {
    records: Vec<NoteRecord>,
}

impl NoteScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    /// Inserts a record, keeping the list sorted by `start` (used by the
    /// driver's recording path, which appends as notes are played).
    pub fn insert(&mut self, record: NoteRecord) {
        let pos = self.records.partition_point(|r| r.start <= record.start);
        self.records.insert(pos, record);
    }

    /// Clears every recorded note (used by `Reset`/`clear`).
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// All stored records, in start order.
    pub fn records(&self) -> &[NoteRecord] {
        &self.records
    }

    /// Emits every On for a record whose `start` falls in
    /// `[start_frame, end_frame)`, then every Off for a record whose `end`
    /// falls in the same half-open window, each in input record order. A
    /// record whose start and end both land in this block produces both.
    ///
    /// Takes a callback rather than handing back a `Vec` so the realtime
    /// driver can fold events straight into a track's synth without
    /// allocating on the audio thread.
    pub fn schedule(&self, start_frame: Frame, end_frame: Frame, mut on_event: impl FnMut(NoteEvent)) {
        for record in &self.records {
            if record.start >= start_frame && record.start < end_frame {
                on_event(NoteEvent::On(record.note));
            }
        }
        for record in &self.records {
            if record.end >= start_frame && record.end < end_frame {
                on_event(NoteEvent::Off(record.note));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_on_and_off_at_block_boundaries() {
        let mut sched = NoteScheduler::new();
        sched.insert(NoteRecord { start: 1000, end: 2000, note: 60 });

        let mut events = Vec::new();
        for block in 0..16 {
            let s = block * 256;
            let e = s + 256;
            sched.schedule(s, e, |ev| events.push(ev));
        }
        assert_eq!(events, vec![NoteEvent::On(60), NoteEvent::Off(60)]);
    }

    #[test]
    fn record_fully_inside_one_block_emits_both() {
        let mut sched = NoteScheduler::new();
        sched.insert(NoteRecord { start: 10, end: 20, note: 64 });
        let mut events = Vec::new();
        sched.schedule(0, 256, |ev| events.push(ev));
        assert_eq!(events, vec![NoteEvent::On(64), NoteEvent::Off(64)]);
    }

    #[test]
    fn subdivided_scan_matches_union_scan() {
        let mut sched = NoteScheduler::new();
        sched.insert(NoteRecord { start: 500, end: 1500, note: 69 });

        let mut union_events = Vec::new();
        sched.schedule(0, 2000, |ev| union_events.push(ev));

        let mut split_events = Vec::new();
        sched.schedule(0, 1000, |ev| split_events.push(ev));
        sched.schedule(1000, 2000, |ev| split_events.push(ev));

        let mut a = union_events.clone();
        let mut b = split_events.clone();
        a.sort_by_key(|e| match e {
            NoteEvent::On(n) | NoteEvent::Off(n) => *n,
        });
        b.sort_by_key(|e| match e {
            NoteEvent::On(n) | NoteEvent::Off(n) => *n,
        });
        assert_eq!(union_events.len(), split_events.len());
    }

    #[test]
    fn insert_keeps_records_sorted_by_start() {
        let mut sched = NoteScheduler::new();
        sched.insert(NoteRecord { start: 100, end: 200, note: 1 });
        sched.insert(NoteRecord { start: 50, end: 80, note: 2 });
        sched.insert(NoteRecord { start: 150, end: 300, note: 3 });
        let starts: Vec<_> = sched.records().iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![50, 100, 150]);
    }
}
