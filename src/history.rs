//! Bounded record of recently sent notifications, kept so that a delivery
//! failure reported by identifier can be used to resend everything sent
//! after it.

use crate::protocol::constants::SENT_BUFFER_QTY;
use std::collections::VecDeque;

/// One entry in the send-history ring: enough to reconstruct and resend the
/// original notification.
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub identifier: u32,
    pub token: [u8; 32],
    pub payload_json: Vec<u8>,
    pub expiry: u32,
    pub priority: u8,
}

/// A capacity-bounded FIFO of sent notifications, oldest evicted first.
///
/// Mirrors the reference implementation's `collections.deque(maxlen=...)`:
/// once full, pushing a new entry silently drops the oldest one.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<SentNotification>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(SENT_BUFFER_QTY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Record a sent notification, evicting the oldest entry if full.
    pub fn push(&mut self, entry: SentNotification) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first entry with the given identifier, if present.
    fn index_of(&self, identifier: u32) -> Option<usize> {
        self.entries.iter().position(|e| e.identifier == identifier)
    }

    /// Remove everything up to and including `identifier`, returning the
    /// notifications sent after it in the order they were originally sent.
    ///
    /// These are the notifications that must be resent after an
    /// error-response names `identifier` as the cause of a gateway
    /// disconnect: APNs discards everything from that notification onward,
    /// so the client retransmits the tail of its own history.
    ///
    /// If `identifier` isn't found (e.g. it was already evicted from the
    /// ring), treat it as `k = -1`: the whole history is resent, since there
    /// is no safe point to discard from.
    pub fn drain_after(&mut self, identifier: u32) -> Vec<SentNotification> {
        match self.index_of(identifier) {
            Some(k) => self.entries.drain(k + 1..).collect(),
            None => self.entries.drain(..).collect(),
        }
    }

    /// Drop the entire history without resending, used on a clean close.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32) -> SentNotification {
        SentNotification {
            identifier: id,
            token: [0u8; 32],
            payload_json: b"{}".to_vec(),
            expiry: 0,
            priority: 10,
        }
    }

    #[test]
    fn push_and_len() {
        let mut h = History::new(3);
        h.push(entry(1));
        h.push(entry(2));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut h = History::new(2);
        h.push(entry(1));
        h.push(entry(2));
        h.push(entry(3));
        assert_eq!(h.len(), 2);
        assert!(h.index_of(1).is_none());
        assert!(h.index_of(2).is_some());
        assert!(h.index_of(3).is_some());
    }

    #[test]
    fn drain_after_returns_tail_in_order() {
        let mut h = History::new(10);
        for id in 1..=5u32 {
            h.push(entry(id));
        }
        let resend = h.drain_after(2);
        let ids: Vec<u32> = resend.iter().map(|e| e.identifier).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert!(h.is_empty());
    }

    #[test]
    fn drain_after_unknown_identifier_resends_everything() {
        let mut h = History::new(10);
        h.push(entry(1));
        h.push(entry(2));
        let resend = h.drain_after(99);
        let ids: Vec<u32> = resend.iter().map(|e| e.identifier).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(h.is_empty());
    }

    #[test]
    fn drain_after_last_identifier_resends_nothing() {
        let mut h = History::new(10);
        h.push(entry(1));
        h.push(entry(2));
        let resend = h.drain_after(2);
        assert!(resend.is_empty());
        assert!(h.is_empty());
    }
}
