use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::time_point::{TimeScalePoint, UtcTimestamp};

/// Calendar-derived rank used by the time axis to pick tick labels.
///
/// Discriminants leave gaps so new buckets can slot in without
/// renumbering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[repr(u8)]
pub enum TickMarkWeight {
    #[default]
    LessThanSecond = 0,
    Second = 10,
    Minute1 = 20,
    Minute5 = 21,
    Minute30 = 22,
    Hour1 = 30,
    Hour3 = 31,
    Hour6 = 32,
    Hour12 = 33,
    Day = 50,
    Month = 60,
    Year = 70,
}

/// Weight of `current` given the previous point on the scale: the coarsest
/// calendar unit that rolls over between the two, graded by how round the
/// rollover boundary is within the day.
#[must_use]
pub fn weight_by_time(current: UtcTimestamp, previous: UtcTimestamp) -> TickMarkWeight {
    let current = utc(current);
    let previous = utc(previous);

    if current.year() != previous.year() {
        return TickMarkWeight::Year;
    }
    if current.month() != previous.month() {
        return TickMarkWeight::Month;
    }
    if current.day() != previous.day() {
        return TickMarkWeight::Day;
    }
    if current.hour() != previous.hour() {
        return match current.hour() {
            hour if hour % 12 == 0 => TickMarkWeight::Hour12,
            hour if hour % 6 == 0 => TickMarkWeight::Hour6,
            hour if hour % 3 == 0 => TickMarkWeight::Hour3,
            _ => TickMarkWeight::Hour1,
        };
    }
    if current.minute() != previous.minute() {
        return match current.minute() {
            minute if minute % 30 == 0 => TickMarkWeight::Minute30,
            minute if minute % 5 == 0 => TickMarkWeight::Minute5,
            _ => TickMarkWeight::Minute1,
        };
    }
    if current.second() != previous.second() {
        return TickMarkWeight::Second;
    }
    TickMarkWeight::LessThanSecond
}

/// Recomputes weights for `points[start..]`, leaving the prefix untouched.
///
/// When `start == 0` the first point has no predecessor; it is ranked
/// against a synthetic point one average step earlier so the left edge of
/// the axis still gets a sensible label candidate.
pub fn fill_weights_from(points: &mut [TimeScalePoint], start: usize) {
    if start >= points.len() {
        return;
    }

    let mut previous = (start > 0).then(|| points[start - 1].time.timestamp);
    let mut total_step: i64 = 0;
    for point in &mut points[start..] {
        let current = point.time.timestamp;
        if let Some(previous) = previous {
            point.time_weight = weight_by_time(current, previous);
            total_step += current - previous;
        }
        previous = Some(current);
    }

    if start == 0 && points.len() > 1 {
        let average_step = (total_step as f64 / (points.len() - 1) as f64).ceil() as i64;
        let synthetic_previous = points[0].time.timestamp - average_step;
        points[0].time_weight = weight_by_time(points[0].time.timestamp, synthetic_previous);
    }
}

fn utc(timestamp: UtcTimestamp) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::{TickMarkWeight, fill_weights_from, weight_by_time};
    use crate::time::{TimePoint, TimeScalePoint, UserTime, UtcTimestamp};

    fn point(timestamp: UtcTimestamp) -> TimeScalePoint {
        TimeScalePoint {
            time_weight: TickMarkWeight::default(),
            time: TimePoint {
                timestamp,
                business_day: None,
            },
            original_time: UserTime::Timestamp(timestamp),
        }
    }

    const DAY: i64 = 86_400;

    #[test]
    fn coarser_units_outrank_finer_ones() {
        // 2019-12-31T23:59:59 → 2020-01-01T00:00:00 crosses a year.
        assert_eq!(
            weight_by_time(1_577_836_800, 1_577_836_799),
            TickMarkWeight::Year
        );
        // 2020-01-31 → 2020-02-01 crosses a month.
        assert_eq!(
            weight_by_time(1_580_515_200, 1_580_515_200 - DAY),
            TickMarkWeight::Month
        );
        // Plain midnight rollover inside a month.
        assert_eq!(
            weight_by_time(1_578_009_600, 1_578_009_600 - 3_600),
            TickMarkWeight::Day
        );
        // Noon rollover ranks higher than an odd hour.
        assert_eq!(
            weight_by_time(1_577_880_000, 1_577_880_000 - 3_600),
            TickMarkWeight::Hour12
        );
        assert_eq!(
            weight_by_time(1_577_883_600, 1_577_883_600 - 3_600),
            TickMarkWeight::Hour1
        );
        // Sub-minute and sub-second granularity.
        assert_eq!(
            weight_by_time(1_577_836_830, 1_577_836_829),
            TickMarkWeight::Second
        );
        assert_eq!(
            weight_by_time(1_577_836_830, 1_577_836_830),
            TickMarkWeight::LessThanSecond
        );
    }

    #[test]
    fn fill_assigns_tail_only_and_seeds_the_first_point() {
        let base = 1_577_836_800; // 2020-01-01 UTC
        let mut points = vec![
            point(base),
            point(base + DAY),
            point(base + 2 * DAY),
            point(base + 3 * DAY),
        ];
        fill_weights_from(&mut points, 0);
        // Daily spacing: the synthetic predecessor lands in 2019, so the
        // first point ranks as a year rollover.
        assert_eq!(points[0].time_weight, TickMarkWeight::Year);
        assert!(points[1..]
            .iter()
            .all(|point| point.time_weight == TickMarkWeight::Day));

        // A tail refill must not disturb the prefix.
        points.push(point(base + 4 * DAY));
        points[0].time_weight = TickMarkWeight::Month; // sentinel
        fill_weights_from(&mut points, 4);
        assert_eq!(points[0].time_weight, TickMarkWeight::Month);
        assert_eq!(points[4].time_weight, TickMarkWeight::Day);
    }

    #[test]
    fn single_point_keeps_default_weight() {
        let mut points = vec![point(1_577_836_800)];
        fill_weights_from(&mut points, 0);
        assert_eq!(points[0].time_weight, TickMarkWeight::LessThanSecond);
    }
}
