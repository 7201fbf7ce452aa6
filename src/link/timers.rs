//! Named Timer Table
//!
//! One slot per [`TimerId`]. Arming a slot that is already armed replaces
//! its deadline, so each timer class has at most one pending instance.
//! There is no cancel: re-arming is the only way to move a deadline.
//!
//! When several timers are due at once, the earliest deadline fires first;
//! equal deadlines fire in the order they were armed.

use crate::types::{Tick, TimerId};

/// Arms named timers on behalf of the link
pub trait Scheduler {
    /// Arm or re-arm `timer` to fire at or after `deadline`
    fn schedule_at(&mut self, timer: TimerId, deadline: Tick);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Slot {
    deadline: Tick,
    /// Arming order, used as the tie-break between equal deadlines
    seq: u32,
}

/// Fixed table of named one-shot timers
#[derive(Clone, Debug, Default)]
pub struct TimerTable {
    slots: [Option<Slot>; TimerId::COUNT],
    next_seq: u32,
}

impl TimerTable {
    /// Create a table with no timer armed
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [None; TimerId::COUNT],
            next_seq: 0,
        }
    }

    /// Deadline of `timer`, if armed
    #[must_use]
    pub fn deadline(&self, timer: TimerId) -> Option<Tick> {
        self.slots[timer.index()].map(|slot| slot.deadline)
    }

    /// Check if `timer` is armed
    #[must_use]
    pub fn is_armed(&self, timer: TimerId) -> bool {
        self.slots[timer.index()].is_some()
    }

    /// Number of armed timers
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Timer that fires next and its deadline
    #[must_use]
    pub fn next_due(&self) -> Option<(TimerId, Tick)> {
        TimerId::ALL
            .iter()
            .filter_map(|&id| self.slots[id.index()].map(|slot| (id, slot)))
            .min_by_key(|(_, slot)| (slot.deadline, slot.seq))
            .map(|(id, slot)| (id, slot.deadline))
    }

    /// Earliest armed deadline
    #[must_use]
    pub fn next_deadline(&self) -> Option<Tick> {
        self.next_due().map(|(_, deadline)| deadline)
    }

    /// Disarm and return the next timer if its deadline has passed
    ///
    /// Returns at most one timer per call; the caller loops to drain.
    pub fn pop_due(&mut self, now: Tick) -> Option<TimerId> {
        let (id, deadline) = self.next_due()?;
        if deadline > now {
            return None;
        }
        self.slots[id.index()] = None;
        Some(id)
    }
}

impl Scheduler for TimerTable {
    fn schedule_at(&mut self, timer: TimerId, deadline: Tick) {
        self.slots[timer.index()] = Some(Slot {
            deadline,
            seq: self.next_seq,
        });
        self.next_seq = self.next_seq.wrapping_add(1);
    }
}
