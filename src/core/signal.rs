//! A binary set/clear signal that threads can sleep on.
//!
//! `wait()` suspends on a condition variable until the flag is set; nothing
//! polls. Setting the flag under the mutex also publishes every write the
//! setter made before it to whoever wakes up.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct Signal {
    flag: Mutex<bool>,
    cvar: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        match self.flag.lock() {
            Ok(flag) => flag,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Sets the flag and wakes all waiters. Idempotent.
    pub fn set(&self) {
        let mut flag = self.lock();
        *flag = true;
        self.cvar.notify_all();
    }

    /// Clears the flag and wakes anyone waiting for it to clear.
    pub fn clear(&self) {
        let mut flag = self.lock();
        *flag = false;
        self.cvar.notify_all();
    }

    pub fn is_set(&self) -> bool {
        *self.lock()
    }

    /// Blocks until the flag is set. Returns immediately if it already is.
    pub fn wait(&self) {
        let mut flag = self.lock();
        while !*flag {
            flag = self
                .cvar
                .wait(flag)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Like `wait`, but gives up after `timeout`. Returns whether the flag
    /// was set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut flag = self.lock();
        while !*flag {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            flag = match self.cvar.wait_timeout(flag, deadline - now) {
                Ok((flag, _)) => flag,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    /// Waits until the flag is cleared or `timeout` passes. Returns whether
    /// it was cleared.
    pub fn wait_cleared(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut flag = self.lock();
        while *flag {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            flag = match self.cvar.wait_timeout(flag, deadline - now) {
                Ok((flag, _)) => flag,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_cleared() {
        let signal = Signal::new();
        assert!(!signal.is_set());
        assert!(!signal.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_set_and_clear() {
        let signal = Signal::new();
        signal.set();
        signal.set();
        assert!(signal.is_set());
        signal.wait();
        signal.clear();
        assert!(!signal.is_set());
    }

    #[test]
    fn test_wakes_waiting_thread() {
        let signal = Arc::new(Signal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait_timeout(Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(10));
        signal.set();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_wakes_thread_waiting_for_clear() {
        let signal = Arc::new(Signal::new());
        assert!(signal.wait_cleared(Duration::from_millis(1)));
        signal.set();
        assert!(!signal.wait_cleared(Duration::from_millis(1)));
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait_cleared(Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(10));
        signal.clear();
        assert!(waiter.join().unwrap());
    }
}
