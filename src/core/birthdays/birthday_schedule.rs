use super::birthday_models::BirthdayDate;
use chrono::{DateTime, Datelike, Duration, TimeZone};

/// Time left until the next local midnight in `now`'s zone.
///
/// On DST transitions where midnight does not exist, the earliest valid
/// instant after the gap is used; failing that, a flat 24 hours.
pub fn duration_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let tomorrow = now.date_naive().succ_opt();
    let next = tomorrow
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| {
            now.timezone()
                .from_local_datetime(&midnight)
                .earliest()
                .or_else(|| {
                    now.timezone()
                        .from_local_datetime(&(midnight + Duration::hours(1)))
                        .earliest()
                })
        });

    match next {
        Some(next) => next.signed_duration_since(now.clone()),
        None => Duration::hours(24),
    }
}

/// Birthday date for `now` in its own zone.
pub fn birthday_date_of<Tz: TimeZone>(now: &DateTime<Tz>) -> BirthdayDate {
    BirthdayDate {
        month: now.month(),
        day: now.day(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::Europe::Amsterdam;

    #[test]
    fn test_until_midnight_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 22, 30, 0).unwrap();
        assert_eq!(
            duration_until_next_midnight(&now),
            Duration::minutes(90)
        );
    }

    #[test]
    fn test_exactly_midnight_waits_a_full_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(duration_until_next_midnight(&now), Duration::hours(24));
    }

    #[test]
    fn test_until_midnight_in_named_zone() {
        // 22:00 UTC is 23:00 in Amsterdam in winter
        let now = Utc
            .with_ymd_and_hms(2024, 1, 10, 22, 0, 0)
            .unwrap()
            .with_timezone(&Amsterdam);
        assert_eq!(duration_until_next_midnight(&now), Duration::hours(1));
    }

    #[test]
    fn test_birthday_date_follows_local_zone() {
        let now = Utc
            .with_ymd_and_hms(2024, 2, 28, 23, 30, 0)
            .unwrap()
            .with_timezone(&Amsterdam);
        assert_eq!(birthday_date_of(&now), BirthdayDate { day: 29, month: 2 });
    }
}
