//! Per-stage mutual exclusion within one process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A named flag that at most one run of a stage may hold.
///
/// [`SingleFlight::try_acquire`] hands out a [`FlightGuard`] that releases
/// the flag when dropped, so every exit path of the holder releases it,
/// panics included.
#[derive(Debug)]
pub struct SingleFlight {
    name: &'static str,
    busy: AtomicBool,
}

impl SingleFlight {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            busy: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Take the flag, or `None` if another run holds it.
    pub fn try_acquire(self: &Arc<Self>) -> Option<FlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        tracing::debug!(lock = self.name, "Lock acquired");
        Some(FlightGuard {
            flight: Arc::clone(self),
        })
    }
}

/// Holds a [`SingleFlight`] until dropped.
#[derive(Debug)]
pub struct FlightGuard {
    flight: Arc<SingleFlight>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.flight.busy.store(false, Ordering::Release);
        tracing::debug!(lock = self.flight.name, "Lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let flight = SingleFlight::new("audio");
        let guard = flight.try_acquire().expect("first acquire");
        assert!(flight.is_busy());
        assert!(flight.try_acquire().is_none());
        drop(guard);
        assert!(!flight.is_busy());
        assert!(flight.try_acquire().is_some());
    }

    #[tokio::test]
    async fn guard_released_when_task_panics() {
        let flight = SingleFlight::new("stitching");
        let guard = flight.try_acquire().unwrap();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("stage blew up");
        });
        assert!(handle.await.is_err());
        assert!(!flight.is_busy());
    }
}
