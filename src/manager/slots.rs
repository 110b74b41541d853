use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::connection::{ClientInfo, StateCell};

/// A connection held by the manager.
#[derive(Debug)]
pub struct Slot {
    pub info: ClientInfo,
    pub state: Arc<StateCell>,
    pub handle: JoinHandle<()>,
}

impl Slot {
    /// The connection has ended and the slot may be reused.
    #[inline]
    pub fn is_reclaimable(&self) -> bool {
        self.state.get().is_closed() || self.handle.is_finished()
    }
}

/// Fixed number of connection slots.
///
/// The table never grows, a full table rejects new entries.
#[derive(Debug)]
pub struct Slots {
    slots: Vec<Option<Slot>>,
}

impl Slots {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize { self.slots.len() }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize { self.iter().count() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    #[inline]
    pub fn is_full(&self) -> bool { self.slots.iter().all(Option::is_some) }

    /// Put a new entry in the first free slot, returns its index.
    ///
    /// `make` is only called if there is room.
    pub fn reserve<F>(&mut self, make: F) -> Option<usize>
    where
        F: FnOnce() -> Slot,
    {
        let index = self.slots.iter().position(Option::is_none)?;
        self.slots[index] = Some(make());
        Some(index)
    }

    /// Free a slot, returns what it held.
    #[inline]
    pub fn release(&mut self, index: usize) -> Option<Slot> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Free every slot whose connection has ended, returns how many.
    pub fn reclaim(&mut self) -> usize {
        let mut n = 0;
        for index in 0..self.slots.len() {
            if self.slots[index].as_ref().is_some_and(Slot::is_reclaimable) {
                self.release(index);
                n += 1;
            }
        }
        n
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> { self.slots.iter().flatten() }
}
