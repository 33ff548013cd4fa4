use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// A deadline is acceptable when it falls on or after the posting day.
pub fn deadline_not_before(deadline: DateTime<Utc>, posted: DateTime<Utc>) -> bool {
    deadline.date_naive() >= posted.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn same_day_deadline_is_accepted() {
        let posted = Utc.with_ymd_and_hms(2023, 10, 15, 18, 0, 0).unwrap();
        let deadline = Utc.with_ymd_and_hms(2023, 10, 15, 9, 0, 0).unwrap();
        assert!(deadline_not_before(deadline, posted));
        let earlier = Utc.with_ymd_and_hms(2023, 10, 14, 23, 0, 0).unwrap();
        assert!(!deadline_not_before(earlier, posted));
    }
}
