//! Busy Flags
//!
//! A [`BusyFlag`] gates one purchase control; a [`PaymentLock`] is shared by
//! every control on a page so two popups can never be open at once. Both are
//! released by dropping the guard, which covers every exit path of a flow.

use std::cell::Cell;
use std::rc::Rc;

/// Re-entrancy flag for a single control
#[derive(Clone, Debug, Default)]
pub struct BusyFlag(Rc<Cell<bool>>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.get()
    }

    /// Mark busy, or `None` if already busy
    pub fn acquire(&self) -> Option<BusyGuard> {
        if self.0.replace(true) {
            return None;
        }
        Some(BusyGuard(Rc::clone(&self.0)))
    }
}

/// Clears the flag it was acquired from when dropped
#[derive(Debug)]
pub struct BusyGuard(Rc<Cell<bool>>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Page-wide "payment in flight" lock
#[derive(Clone, Debug, Default)]
pub struct PaymentLock(BusyFlag);

impl PaymentLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.0.is_busy()
    }

    pub fn try_lock(&self) -> Option<BusyGuard> {
        self.0.acquire()
    }
}
