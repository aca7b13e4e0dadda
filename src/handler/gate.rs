//! FIFO Gate
//!
//! Ticket-based mutual exclusion: callers are admitted strictly in arrival order.

use std::ops::{Deref, DerefMut};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Ticket counters
#[derive(Debug, Default)]
struct Tickets {
    /// Next ticket to hand out
    next: u64,

    /// Ticket currently allowed through
    serving: u64,
}

/// Mutual exclusion around `T` with first-come-first-served hand-off
///
/// ## Concurrency:
/// - `tickets`: short critical sections to take a ticket / advance the turn
/// - `inner`: held for the whole gated span; only the ticket holder locks it,
///   so it is never contended for longer than the previous guard's drop
pub struct FifoGate<T> {
    tickets: Mutex<Tickets>,
    turn: Condvar,
    inner: Mutex<T>,
}

impl<T> FifoGate<T> {
    pub fn new(value: T) -> Self {
        Self {
            tickets: Mutex::new(Tickets::default()),
            turn: Condvar::new(),
            inner: Mutex::new(value),
        }
    }

    /// Wait for our turn, then hold the gate until the guard is dropped
    pub fn enter(&self) -> GateGuard<'_, T> {
        let mut tickets = self.tickets.lock();
        let ticket = tickets.next;
        tickets.next += 1;

        while tickets.serving != ticket {
            self.turn.wait(&mut tickets);
        }
        drop(tickets);

        GateGuard {
            inner: self.inner.lock(),
            tickets: &self.tickets,
            turn: &self.turn,
        }
    }

    /// Callers holding or waiting for the gate
    pub fn queued(&self) -> u64 {
        let tickets = self.tickets.lock();
        tickets.next - tickets.serving
    }
}

/// Exclusive access to the gated value
pub struct GateGuard<'a, T> {
    inner: MutexGuard<'a, T>,
    tickets: &'a Mutex<Tickets>,
    turn: &'a Condvar,
}

impl<T> Deref for GateGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for GateGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T> Drop for GateGuard<'_, T> {
    fn drop(&mut self) {
        // `inner` is released right after this; the next ticket holder
        // blocks on it at most until then.
        let mut tickets = self.tickets.lock();
        tickets.serving += 1;
        drop(tickets);
        self.turn.notify_all();
    }
}
