//! Explicit event registration table.
//!
//! Components declare which [`EventKind`]s they consume by registering a
//! subscriber key (any small `Copy` enum the owner defines).  Routing an
//! event returns the subscribers to call and a sequence number that orders
//! events deterministically, including same-timestamp ties.

use std::collections::BTreeMap;

use crate::{EventKind, SimEvent};

/// `EventKind → subscribers` table with a monotone sequence counter.
#[derive(Debug)]
pub struct EventRegistry<S> {
    table:    BTreeMap<EventKind, Vec<S>>,
    next_seq: u64,
}

impl<S: Copy + PartialEq> EventRegistry<S> {
    pub fn new() -> Self {
        Self { table: BTreeMap::new(), next_seq: 0 }
    }

    /// Declare that `subscriber` consumes events of `kind`.  Registering the
    /// same pair twice has no effect.
    pub fn register(&mut self, kind: EventKind, subscriber: S) {
        let subs = self.table.entry(kind).or_default();
        if !subs.contains(&subscriber) {
            subs.push(subscriber);
        }
    }

    /// Subscribers of `kind`, in registration order.
    pub fn subscribers(&self, kind: EventKind) -> &[S] {
        self.table.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Assign the next sequence number to `event` and look up its
    /// subscribers.
    pub fn route(&mut self, event: &SimEvent) -> (u64, &[S]) {
        let seq = self.next_seq;
        self.next_seq += 1;
        (seq, self.subscribers(event.kind()))
    }

    /// Events routed since the last [`reset_sequence`](Self::reset_sequence).
    pub fn routed(&self) -> u64 {
        self.next_seq
    }

    /// Restart numbering for a new iteration.
    pub fn reset_sequence(&mut self) {
        self.next_seq = 0;
    }
}

impl<S: Copy + PartialEq> Default for EventRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
