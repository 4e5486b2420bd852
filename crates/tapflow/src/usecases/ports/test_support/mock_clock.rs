use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use crate::usecases::ports::Clock;
use crate::usecases::ports::Sleeper;

const START_EPOCH_MILLIS: i64 = 1_760_000_000_000;

/// Clock that only moves when told to.
pub struct MockClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.origin + self.offset()
    }

    fn epoch_millis(&self) -> i64 {
        START_EPOCH_MILLIS + self.offset().as_millis() as i64
    }

    fn timestamp(&self) -> String {
        "2025-10-09T08:53:20+00:00".to_string()
    }
}

/// Records requested sleeps without blocking.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
