use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Injectable time source. Production code uses [`SystemClock`]; tests use
/// [`FixedClock`] to control TTL expiry deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to, for TTL boundary tests.
pub struct FixedClock {
    current: Mutex<SystemTime>,
}

impl FixedClock {
    pub fn new(start: SystemTime) -> Arc<Self> {
        Arc::new(FixedClock {
            current: Mutex::new(start),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap();
        *current += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        *self.current.lock().unwrap()
    }
}
