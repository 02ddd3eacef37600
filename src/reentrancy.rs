//! Debug-only reentrancy guard.
//!
//! User `Eq` runs in the middle of a probe. If it reaches back into the same
//! map (only possible through raw pointers or interior mutability around the
//! map), debug builds panic instead of observing a half-updated table.
//! Release builds compile the check away.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // Same auto traits in every build profile: Send, never Sync.
    _not_sync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _not_sync: PhantomData,
        }
    }

    /// Mark the owner busy until the returned guard drops.
    ///
    /// Panics in debug builds if the owner is already busy.
    #[inline]
    pub fn enter(&self) -> Busy<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "reentrancy detected: map accessed while a probe is in progress"
            );
        }
        Busy { owner: self }
    }
}

/// RAII guard returned by [`DebugReentrancy::enter`].
pub struct Busy<'a> {
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    owner: &'a DebugReentrancy,
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.busy.set(false);
    }
}
