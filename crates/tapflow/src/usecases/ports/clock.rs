use std::time::Duration;
use std::time::Instant;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Wall-clock milliseconds since the Unix epoch, used for capture timestamps.
    fn epoch_millis(&self) -> i64;

    /// RFC 3339 wall-clock time.
    fn timestamp(&self) -> String;

    fn elapsed(&self, start: Instant) -> Duration {
        self.now().saturating_duration_since(start)
    }
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}
