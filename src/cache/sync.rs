//! Coordination Module
//!
//! Chooses, once per cache, how access to the cache state is serialized.

use parking_lot::{Mutex, RwLock};

// == Coordinator ==
/// Access strategy wrapping the whole cache state.
///
/// Every operation goes through [`Coordinator::exclusive`] or
/// [`Coordinator::shared`], so guards are dropped on every exit path,
/// unwinding included.
#[derive(Debug)]
pub enum Coordinator<T> {
    /// No blocking coordination. The caller serializes access; overlapping
    /// access is detected through a non-blocking `try_lock` and panics.
    Unsynchronized(Mutex<T>),
    /// One reader/writer lock held for the full duration of each operation.
    Shared(RwLock<T>),
}

impl<T> Coordinator<T> {
    // == Constructor ==
    /// Wraps `state` with the strategy selected by `thread_safe`.
    pub fn new(state: T, thread_safe: bool) -> Self {
        if thread_safe {
            Self::Shared(RwLock::new(state))
        } else {
            Self::Unsynchronized(Mutex::new(state))
        }
    }

    /// Returns true when a real lock guards the state.
    pub fn is_thread_safe(&self) -> bool {
        matches!(self, Self::Shared(_))
    }

    // == Exclusive Access ==
    /// Runs `f` with mutable access to the state.
    ///
    /// # Panics
    /// In unsynchronized mode, if another call is already inside the state.
    pub fn exclusive<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        match self {
            Self::Unsynchronized(cell) => match cell.try_lock() {
                Some(mut guard) => f(&mut guard),
                None => overlapping_access(),
            },
            Self::Shared(lock) => f(&mut lock.write()),
        }
    }

    // == Shared Access ==
    /// Runs `f` with read access to the state.
    ///
    /// # Panics
    /// In unsynchronized mode, if another call is already inside the state.
    pub fn shared<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        match self {
            Self::Unsynchronized(cell) => match cell.try_lock() {
                Some(guard) => f(&guard),
                None => overlapping_access(),
            },
            Self::Shared(lock) => f(&lock.read()),
        }
    }
}

#[cold]
fn overlapping_access() -> ! {
    panic!("cache built without thread safety was accessed concurrently; construct it with thread_safe = true to share it")
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn test_strategy_selection() {
        assert!(Coordinator::new(0, true).is_thread_safe());
        assert!(!Coordinator::new(0, false).is_thread_safe());
    }

    #[test]
    fn test_exclusive_mutates_state() {
        for thread_safe in [false, true] {
            let coordinator = Coordinator::new(1, thread_safe);
            coordinator.exclusive(|value| *value += 41);
            assert_eq!(coordinator.shared(|value| *value), 42);
        }
    }

    #[test]
    fn test_guard_released_after_panic() {
        for thread_safe in [false, true] {
            let coordinator = Coordinator::new(Vec::<u32>::new(), thread_safe);

            let result = catch_unwind(AssertUnwindSafe(|| {
                coordinator.exclusive(|_| panic!("boom"));
            }));
            assert!(result.is_err());

            // The guard was dropped while unwinding
            coordinator.exclusive(|items| items.push(1));
            assert_eq!(coordinator.shared(|items| items.len()), 1);
        }
    }

    #[test]
    fn test_unsynchronized_overlap_panics() {
        let coordinator = Coordinator::new(0, false);

        let result = catch_unwind(AssertUnwindSafe(|| {
            coordinator.exclusive(|_| coordinator.shared(|value| *value))
        }));

        assert!(result.is_err());
    }

    #[test]
    fn test_shared_mode_serializes_threads() {
        let coordinator = Coordinator::new(0u64, true);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        coordinator.exclusive(|value| *value += 1);
                    }
                });
            }
        });

        assert_eq!(coordinator.shared(|value| *value), 8000);
    }
}
