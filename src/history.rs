// Bounded undo/redo log over immutable snapshots.
// A ring of `capacity` slots with a cursor that only ever grows; the live
// window of cursor values is `[tail, head)`.

use log::debug;

/// Fixed-capacity circular history with a movable cursor.
///
/// Appending at a full buffer evicts the oldest snapshot by advancing `tail`;
/// the slot is simply overwritten the next time the ring comes around.
/// Appending also drops every snapshot ahead of the cursor, so redo never
/// survives a fresh edit.
#[derive(Clone, Debug)]
pub struct HistoryBuffer<T> {
    slots: Box<[Option<T>]>,
    cursor: i64,
    head: i64,
    tail: i64,
}

impl<T> HistoryBuffer<T> {
    /// Empty buffer holding up to `capacity` snapshots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let slots = (0..capacity).map(|_| None).collect::<Vec<_>>().into_boxed_slice();
        Self { slots, cursor: -1, head: 0, tail: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Snapshots currently retrievable (`head - tail`).
    pub fn len(&self) -> usize {
        (self.head - self.tail) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Store `snapshot` just past the cursor and make it the newest tip.
    pub fn append(&mut self, snapshot: T) {
        self.cursor += 1;
        let slot = self.slot(self.cursor);
        self.slots[slot] = Some(snapshot);

        self.head = self.cursor + 1;
        let capacity = self.slots.len() as i64;
        if self.head - self.tail > capacity {
            self.tail = self.head - capacity;
        }
        debug!("history: append cursor={} window=[{}, {})", self.cursor, self.tail, self.head);
    }

    /// Snapshot under the cursor, `None` until the first append.
    pub fn current(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.slot(self.cursor)].as_ref()
    }

    /// Mutable access to the snapshot under the cursor.
    ///
    /// Only the edit in progress should go through here; older entries stay
    /// untouched once something newer has been appended.
    pub fn current_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }
        let slot = self.slot(self.cursor);
        self.slots[slot].as_mut()
    }

    /// Redo: step towards the newest snapshot. `false` at the tip.
    pub fn advance(&mut self) -> bool {
        if self.is_empty() || self.cursor + 1 >= self.head {
            return false;
        }
        self.cursor += 1;
        debug!("history: advance cursor={}", self.cursor);
        true
    }

    /// Undo: step towards the oldest retained snapshot. `false` once evicted
    /// history would be needed.
    pub fn revert(&mut self) -> bool {
        if self.is_empty() || self.cursor - 1 < self.tail {
            return false;
        }
        self.cursor -= 1;
        debug!("history: revert cursor={}", self.cursor);
        true
    }

    /// Drop the newest snapshot outright when the cursor sits on it.
    ///
    /// Like [`revert`](Self::revert) but the dropped entry is not reachable by
    /// [`advance`](Self::advance) afterwards. Snapshots evicted by the append
    /// being undone are not restored.
    pub fn retract(&mut self) -> bool {
        if self.cursor + 1 != self.head || !self.revert() {
            return false;
        }
        let dropped = self.slot(self.head - 1);
        self.slots[dropped] = None;
        self.head = self.cursor + 1;
        true
    }

    pub fn can_redo(&self) -> bool {
        !self.is_empty() && self.cursor + 1 < self.head
    }

    // Floor-style modulo: correct for any signed cursor value.
    fn slot(&self, index: i64) -> usize {
        index.rem_euclid(self.slots.len() as i64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fresh_buffer_has_nothing_to_move() {
        let mut h = HistoryBuffer::<u8>::new(4);
        assert!(h.current().is_none());
        assert!(!h.revert());
        assert!(!h.advance());

        h.append(1);
        assert_eq!(h.current(), Some(&1));
        assert!(!h.revert());
        assert!(!h.advance());
    }

    #[test]
    fn eviction_scenario() {
        let mut h = HistoryBuffer::new(3);
        for s in ['A', 'B', 'C', 'D'] {
            h.append(s);
        }
        assert_eq!(h.current(), Some(&'D'));
        assert_eq!(h.len(), 3);

        assert!(h.revert());
        assert!(h.revert());
        assert_eq!(h.current(), Some(&'B'));

        assert!(!h.revert());
        assert_eq!(h.current(), Some(&'B'));
    }

    #[test]
    fn append_prunes_redo() {
        let mut h = HistoryBuffer::new(8);
        h.append(1);
        h.append(2);
        h.append(3);
        assert!(h.revert());
        assert!(h.revert());
        assert!(h.can_redo());

        h.append(9);
        assert!(!h.advance());
        assert_eq!(h.len(), 2);
        assert!(h.revert());
        assert_eq!(h.current(), Some(&1));
        assert!(h.advance());
        assert_eq!(h.current(), Some(&9));
    }

    #[test]
    fn undo_then_redo_round_trips() {
        let mut h = HistoryBuffer::new(2);
        h.append("a");
        h.append("b");
        assert!(h.revert());
        assert_eq!(h.current(), Some(&"a"));
        assert!(h.advance());
        assert_eq!(h.current(), Some(&"b"));
        assert!(!h.advance());
    }

    #[test]
    fn ring_wraps_many_times() {
        let mut h = HistoryBuffer::new(3);
        for i in 0..100 {
            h.append(i);
        }
        assert_eq!(h.current(), Some(&99));
        assert!(h.revert());
        assert!(h.revert());
        assert_eq!(h.current(), Some(&97));
        assert!(!h.revert());
    }

    #[test]
    fn current_mut_edits_only_the_cursor_entry() {
        let mut h = HistoryBuffer::new(4);
        h.append(vec![0]);
        h.append(vec![0]);
        if let Some(top) = h.current_mut() {
            top[0] = 7;
        }
        assert!(h.revert());
        assert_eq!(h.current(), Some(&vec![0]));
        assert!(h.advance());
        assert_eq!(h.current(), Some(&vec![7]));
    }

    #[test]
    fn retract_hides_the_dropped_entry_from_redo() {
        let mut h = HistoryBuffer::new(4);
        h.append(1);
        h.append(2);
        assert!(h.retract());
        assert_eq!(h.current(), Some(&1));
        assert_eq!(h.len(), 1);
        assert!(!h.advance());
    }

    #[test]
    fn retract_refuses_off_the_tip_or_past_the_tail() {
        let mut h = HistoryBuffer::new(4);
        h.append(1);
        assert!(!h.retract());

        h.append(2);
        assert!(h.revert());
        assert!(!h.retract());
        assert_eq!(h.current(), Some(&1));
        assert!(h.can_redo());
    }

    #[test]
    fn capacity_is_at_least_one() {
        let mut h = HistoryBuffer::new(0);
        assert_eq!(h.capacity(), 1);
        h.append(5);
        h.append(6);
        assert_eq!(h.len(), 1);
        assert_eq!(h.current(), Some(&6));
    }

    proptest! {
        #[test]
        fn length_is_min_of_appends_and_capacity(capacity in 1usize..16, n in 0usize..64) {
            let mut h = HistoryBuffer::new(capacity);
            for i in 0..n {
                h.append(i);
            }
            prop_assert_eq!(h.len(), n.min(capacity));
        }

        #[test]
        fn undo_depth_is_bounded_by_capacity(capacity in 1usize..10, n in 1usize..40) {
            let mut h = HistoryBuffer::new(capacity);
            for i in 0..n {
                h.append(i);
            }
            let mut steps = 0;
            while h.revert() {
                steps += 1;
            }
            prop_assert_eq!(steps, n.min(capacity) - 1);
            prop_assert_eq!(h.current(), Some(&(n - n.min(capacity))));
        }
    }
}
