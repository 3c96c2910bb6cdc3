use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Held for the duration of one loop iteration. Dropping it clears the
/// in-flight flag on every exit path.
#[derive(Debug)]
pub struct IterationGuard {
    flag: Arc<AtomicBool>,
}

impl IterationGuard {
    /// Claims the flag, or returns `None` if an iteration already holds it.
    pub fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for IterationGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = IterationGuard::try_acquire(&flag).unwrap();
        assert!(IterationGuard::try_acquire(&flag).is_none());
        drop(guard);
        assert!(IterationGuard::try_acquire(&flag).is_some());
    }

    #[test]
    fn released_on_panic() {
        let flag = Arc::new(AtomicBool::new(false));
        let cloned = flag.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = IterationGuard::try_acquire(&cloned).unwrap();
            panic!("iteration blew up");
        });
        assert!(result.is_err());
        assert!(!flag.load(Ordering::Acquire));
    }
}
