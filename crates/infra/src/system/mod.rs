use chrono::{prelude::*, LocalResult};
use std::sync::atomic::{AtomicI64, Ordering};

// Mocking out time so that it is possible to run tests that depend on time.
pub trait ISys: Send + Sync {
    /// The current timestamp in millis
    fn get_timestamp_millis(&self) -> i64;

    fn now(&self) -> DateTime<Utc> {
        match Utc.timestamp_millis_opt(self.get_timestamp_millis()) {
            LocalResult::Single(now) => now,
            _ => Utc::now(),
        }
    }
}

/// System that gets the real time and is used when not testing
pub struct RealSys {}
impl ISys for RealSys {
    fn get_timestamp_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to
pub struct MockSys {
    timestamp_millis: AtomicI64,
}

impl MockSys {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            timestamp_millis: AtomicI64::new(now.timestamp_millis()),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.timestamp_millis
            .store(now.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.timestamp_millis
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl ISys for MockSys {
    fn get_timestamp_millis(&self) -> i64 {
        self.timestamp_millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_sys_only_moves_when_told_to() {
        let start = Utc.with_ymd_and_hms(2025, 1, 13, 8, 0, 0).unwrap();
        let sys = MockSys::new(start);
        assert_eq!(sys.now(), start);

        sys.advance(chrono::Duration::days(3));
        assert_eq!(sys.now(), Utc.with_ymd_and_hms(2025, 1, 16, 8, 0, 0).unwrap());

        sys.set(start);
        assert_eq!(sys.get_timestamp_millis(), start.timestamp_millis());
    }
}
