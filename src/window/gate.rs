//! One-shot readiness gate between a window thread and its readers.
//!
//! The window thread resolves the gate exactly once, at the end of its build
//! phase. Readers block until then. A failed build resolves the gate too, so
//! no reader waits forever on a window that can never be used.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::backend::NativeHandle;
use crate::error::ErrorKind;

/// State of a [`ReadinessGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready(NativeHandle),
    Failed(ErrorKind),
}

/// Single-fire synchronization point.
#[derive(Debug)]
pub struct ReadinessGate {
    state: Mutex<Readiness>,
    resolved: Condvar,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Readiness::Pending),
            resolved: Condvar::new(),
        }
    }

    /// Resolve the gate. Only the first call has an effect.
    pub fn resolve(&self, outcome: std::result::Result<NativeHandle, ErrorKind>) -> bool {
        let mut state = self.state.lock();
        if *state != Readiness::Pending {
            return false;
        }
        *state = match outcome {
            Ok(handle) => Readiness::Ready(handle),
            Err(kind) => Readiness::Failed(kind),
        };
        self.resolved.notify_all();
        true
    }

    /// Current state, without waiting.
    pub fn peek(&self) -> Readiness {
        *self.state.lock()
    }

    pub fn is_resolved(&self) -> bool {
        self.peek() != Readiness::Pending
    }

    /// Block until the gate resolves.
    pub fn wait(&self) -> std::result::Result<NativeHandle, ErrorKind> {
        let mut state = self.state.lock();
        while *state == Readiness::Pending {
            self.resolved.wait(&mut state);
        }
        Self::outcome(*state)
    }

    /// Block until the gate resolves or `timeout` elapses (`None`).
    pub fn wait_timeout(&self, timeout: Duration) -> Option<std::result::Result<NativeHandle, ErrorKind>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while *state == Readiness::Pending {
            if self.resolved.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        match *state {
            Readiness::Pending => None,
            resolved => Some(Self::outcome(resolved)),
        }
    }

    fn outcome(state: Readiness) -> std::result::Result<NativeHandle, ErrorKind> {
        match state {
            Readiness::Ready(handle) => Ok(handle),
            Readiness::Failed(kind) => Err(kind),
            Readiness::Pending => Err(ErrorKind::Unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn handle() -> NativeHandle {
        NativeHandle::new(42).unwrap()
    }

    #[test]
    fn test_resolves_once() {
        let gate = ReadinessGate::new();
        assert_eq!(gate.peek(), Readiness::Pending);
        assert!(gate.resolve(Ok(handle())));
        assert!(!gate.resolve(Err(ErrorKind::ContextMissing)));
        assert_eq!(gate.wait(), Ok(handle()));
    }

    #[test]
    fn test_waiters_wake_up() {
        let gate = Arc::new(ReadinessGate::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let gate = gate.clone();
                thread::spawn(move || gate.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        gate.resolve(Err(ErrorKind::WindowGenerationFailed));

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), Err(ErrorKind::WindowGenerationFailed));
        }
    }

    #[test]
    fn test_wait_timeout() {
        let gate = ReadinessGate::new();
        assert_eq!(gate.wait_timeout(Duration::from_millis(10)), None);
        gate.resolve(Ok(handle()));
        assert_eq!(gate.wait_timeout(Duration::from_millis(10)), Some(Ok(handle())));
    }
}
