use std::collections::BTreeSet;

use proptest::prelude::*;

use chartlite::ChartError;
use chartlite::data::{
    DataLayer, Series, SeriesDataItem, SeriesId, SeriesType, SingleValueItem,
};
use chartlite::model::{InvalidateMask, InvalidationLevel};
use chartlite::time::UserTime;

#[derive(Debug, Clone)]
enum Op {
    Set { series: u8, points: Vec<(i64, bool)> },
    Update { series: u8, at: i64, whitespace: bool },
    Remove { series: u8 },
}

fn series_handle(tag: u8) -> Series {
    Series::new(SeriesId::new(u64::from(tag)), SeriesType::Line)
}

fn item(timestamp: i64, whitespace: bool) -> SeriesDataItem {
    if whitespace {
        SeriesDataItem::Whitespace {
            time: UserTime::Timestamp(timestamp),
        }
    } else {
        SeriesDataItem::SingleValue(SingleValueItem::new(
            UserTime::Timestamp(timestamp),
            timestamp as f64 * 0.25,
        ))
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (
            0u8..2,
            prop::collection::btree_set(0i64..48, 0..10),
            prop::collection::vec(any::<bool>(), 10),
        )
            .prop_map(|(series, times, whitespace)| Op::Set {
                series,
                points: times.into_iter().zip(whitespace).collect(),
            }),
        (0u8..2, 0i64..64, any::<bool>()).prop_map(|(series, at, whitespace)| Op::Update {
            series,
            at,
            whitespace,
        }),
        (0u8..2).prop_map(|series| Op::Remove { series }),
    ]
}

/// I1/I2: dense indexes equal to array position, propagated into every
/// mapped row. I3: per-series monotonicity. I5: base index definition.
/// Plus the index/time synchrony between the sorted view and per-series
/// lists.
fn check_invariants(layer: &DataLayer) {
    let snapshot = layer.point_snapshot();
    assert_eq!(
        snapshot.len(),
        layer.point_count(),
        "sorted sequence and timestamp map disagree"
    );
    for (position, point) in snapshot.iter().enumerate() {
        assert_eq!(point.index, position as i64);
        for row in &point.rows {
            assert_eq!(row.index, position as i64);
        }
    }
    for pair in layer.sorted_time_points().windows(2) {
        assert!(pair[0].time.timestamp < pair[1].time.timestamp);
    }

    let mut expected_base = None;
    for tag in 0u8..2 {
        let Some(rows) = layer.series_rows(SeriesId::new(u64::from(tag))) else {
            continue;
        };
        for pair in rows.windows(2) {
            assert!(pair[0].time.timestamp < pair[1].time.timestamp);
        }
        for row in rows {
            let position = layer
                .sorted_time_points()
                .iter()
                .position(|point| point.time.timestamp == row.time.timestamp)
                .expect("row timestamp must be on the shared scale");
            assert_eq!(row.index, position as i64);
        }
        if let Some(last) = rows.last() {
            expected_base = expected_base.max(Some(last.index));
        }
    }
    assert_eq!(layer.base_index(), expected_base);
}

proptest! {
    #[test]
    fn invariants_hold_under_random_operation_sequences(
        ops in prop::collection::vec(op_strategy(), 1..32)
    ) {
        let mut layer = DataLayer::new();
        for op in ops {
            match op {
                Op::Set { series, points } => {
                    let items = points
                        .iter()
                        .map(|(at, whitespace)| item(*at, *whitespace))
                        .collect();
                    layer
                        .set_series_data(series_handle(series), items)
                        .expect("sorted unique input must be accepted");
                }
                Op::Update { series, at, whitespace } => {
                    match layer.update_series_data(series_handle(series), item(at, whitespace)) {
                        Ok(_) => {}
                        Err(ChartError::UpdateOutOfOrder { .. } | ChartError::UnknownSeries(_)) => {}
                        Err(other) => panic!("unexpected update failure: {other}"),
                    }
                }
                Op::Remove { series } => {
                    layer.remove_series(series_handle(series)).expect("remove");
                }
            }
            check_invariants(&layer);
        }
    }

    /// I6: a set that only touches the suffix leaves prefix indexes and
    /// weights untouched.
    #[test]
    fn prefix_survives_suffix_only_replacement(
        base_times in prop::collection::btree_set(0i64..40, 2..12),
        extra_times in prop::collection::btree_set(40i64..60, 1..6),
    ) {
        let mut layer = DataLayer::new();
        let anchor = series_handle(0);
        let edited = series_handle(1);

        let base: Vec<i64> = base_times.iter().copied().collect();
        layer
            .set_series_data(anchor, base.iter().map(|at| item(*at, false)).collect())
            .expect("anchor");

        let weights_before: Vec<_> = layer
            .sorted_time_points()
            .iter()
            .map(|point| (point.time.timestamp, point.time_weight))
            .collect();

        let extra: BTreeSet<i64> = extra_times;
        let response = layer
            .set_series_data(edited, extra.iter().map(|at| item(*at, false)).collect())
            .expect("suffix series");

        let first_changed = response
            .time_scale
            .first_changed_point_index
            .expect("new points were introduced") as usize;
        prop_assert_eq!(first_changed, base.len());

        let weights_after: Vec<_> = layer
            .sorted_time_points()
            .iter()
            .map(|point| (point.time.timestamp, point.time_weight))
            .collect();
        prop_assert_eq!(&weights_after[..first_changed], &weights_before[..]);
        check_invariants(&layer);
    }

    /// Mask merge monotonicity: the merged global level never drops below
    /// either input.
    #[test]
    fn mask_merge_is_monotone_in_level(left in 0u8..4, right in 0u8..4) {
        fn level(tag: u8) -> InvalidationLevel {
            match tag {
                0 => InvalidationLevel::None,
                1 => InvalidationLevel::Cursor,
                2 => InvalidationLevel::Light,
                _ => InvalidationLevel::Full,
            }
        }
        let mut merged = InvalidateMask::new(level(left));
        merged.merge(&InvalidateMask::new(level(right)));
        prop_assert!(merged.full_invalidation() >= level(left));
        prop_assert!(merged.full_invalidation() >= level(right));
    }
}
