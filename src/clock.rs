use chrono::{Local, NaiveDate, Utc};
use std::sync::{Arc, Mutex};

/// Source of "today" for the store. Days are local calendar days.
pub trait Clock: Send {
    fn today(&self) -> NaiveDate;
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Settable clock. Clones share the same date, so a test can keep a handle
/// and move the day forward after handing a clone to the store.
#[derive(Debug, Clone)]
pub struct FixedClock {
    today: Arc<Mutex<NaiveDate>>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Arc::new(Mutex::new(today)),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        if let Ok(mut guard) = self.today.lock() {
            *guard = today;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        match self.today.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn now_millis(&self) -> i64 {
        self.today()
            .and_hms_opt(12, 0, 0)
            .map(|at| at.and_utc().timestamp_millis())
            .unwrap_or_default()
    }
}
