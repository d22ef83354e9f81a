//! Bounded mailboxes between green threads.
//!
//! A [`Mailbox`] is a ring buffer whose blocking operations wait by yielding to
//! the other threads until the condition clears. Nothing wakes a waiter
//! directly; it simply finds the mailbox changed the next time the scheduler
//! comes around to it.
#![cfg_attr(not(test), no_std)]

use core::cell::Cell;
use core::fmt::{self, Debug};

use klib::constants::DEFAULT_MAILBOX_CAPACITY;
use runtime::{verbose, yield_now};

/// Fixed-capacity FIFO channel with blocking `send` and `receive`.
///
/// Only `CAPACITY - 1` slots are ever occupied: `write_index == read_index`
/// means empty, and a send that would make them equal again means full.
///
/// Mailboxes are `!Sync`; threads share one through an `Rc`. Blocking never
/// times out. A sender on a mailbox nobody drains (or a receiver on one
/// nobody fills) yields forever.
pub struct Mailbox<T = i64, const CAPACITY: usize = { DEFAULT_MAILBOX_CAPACITY }> {
    write_index: Cell<usize>,
    read_index: Cell<usize>,
    values: [Cell<Option<T>>; CAPACITY],
}

impl<T, const CAPACITY: usize> Mailbox<T, CAPACITY> {
    const VALID_CAPACITY: () = assert!(CAPACITY >= 2, "a mailbox needs at least two slots");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_CAPACITY;
        Mailbox {
            write_index: Cell::new(0),
            read_index: Cell::new(0),
            values: core::array::from_fn(|_| Cell::new(None)),
        }
    }

    /// Empties the mailbox and rewinds both cursors, dropping anything unread.
    pub fn init(&mut self) {
        self.write_index.set(0);
        self.read_index.set(0);
        for slot in self.values.iter_mut() {
            *slot.get_mut() = None;
        }
    }

    /// Stores `value`, yielding for as long as the mailbox is full.
    pub fn send(&self, mut value: T) {
        let mut blocked = false;
        loop {
            match self.try_send(value) {
                Ok(()) => return,
                Err(rejected) => value = rejected,
            }
            if !blocked {
                verbose!("mailbox full; sender waiting");
                blocked = true;
            }
            yield_now();
        }
    }

    /// Stores `value` if there is room, otherwise hands it back.
    pub fn try_send(&self, value: T) -> Result<(), T> {
        let next = advance::<CAPACITY>(self.write_index.get());
        if next == self.read_index.get() {
            return Err(value);
        }
        self.values[next].set(Some(value));
        self.write_index.set(next);
        Ok(())
    }

    /// Takes the oldest unread value, yielding for as long as the mailbox is empty.
    pub fn receive(&self) -> T {
        let mut blocked = false;
        loop {
            if let Some(value) = self.try_receive() {
                return value;
            }
            if !blocked {
                verbose!("mailbox empty; receiver waiting");
                blocked = true;
            }
            yield_now();
        }
    }

    pub fn try_receive(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let next = advance::<CAPACITY>(self.read_index.get());
        self.read_index.set(next);
        let value = self.values[next].take();
        debug_assert!(value.is_some(), "published slot {} was empty", next);
        value
    }

    /// Values sent but not yet received.
    pub fn len(&self) -> usize {
        (self.write_index.get() + CAPACITY - self.read_index.get()) % CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.write_index.get() == self.read_index.get()
    }

    pub fn is_full(&self) -> bool {
        advance::<CAPACITY>(self.write_index.get()) == self.read_index.get()
    }

    /// Number of values the mailbox can hold at once: one less than `CAPACITY`.
    pub const fn capacity(&self) -> usize {
        CAPACITY - 1
    }
}

impl<T, const CAPACITY: usize> Default for Mailbox<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> Debug for Mailbox<T, CAPACITY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("capacity", &CAPACITY)
            .field("write_index", &self.write_index.get())
            .field("read_index", &self.read_index.get())
            .field("len", &self.len())
            .finish()
    }
}

#[inline]
fn advance<const CAPACITY: usize>(index: usize) -> usize {
    let next = index + 1;
    if next == CAPACITY {
        0
    } else {
        next
    }
}
