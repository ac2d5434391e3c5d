use chartlite::ChartError;
use chartlite::data::{
    DataLayer, OhlcItem, SeriesDataItem, SeriesId, Series, SeriesType, SingleValueItem,
};
use chartlite::time::{BusinessDay, UserTime};

const JAN1: i64 = 1_577_836_800; // 2020-01-01 UTC midnight
const DAY: i64 = 86_400;

fn line(raw: u64) -> Series {
    Series::new(SeriesId::new(raw), SeriesType::Line)
}

fn histogram(raw: u64) -> Series {
    Series::new(SeriesId::new(raw), SeriesType::Histogram)
}

fn date_value(date: &str, value: f64) -> SeriesDataItem {
    SeriesDataItem::SingleValue(SingleValueItem::new(
        UserTime::DateString(date.to_owned()),
        value,
    ))
}

fn ts_value(timestamp: i64, value: f64) -> SeriesDataItem {
    SeriesDataItem::SingleValue(SingleValueItem::new(UserTime::Timestamp(timestamp), value))
}

fn whitespace(timestamp: i64) -> SeriesDataItem {
    SeriesDataItem::Whitespace {
        time: UserTime::Timestamp(timestamp),
    }
}

#[test]
fn single_series_three_points() {
    let mut layer = DataLayer::new();
    let series = line(1);

    let response = layer
        .set_series_data(
            series,
            vec![
                date_value("2020-01-01", 10.0),
                date_value("2020-01-02", 11.0),
                date_value("2020-01-03", 12.0),
            ],
        )
        .expect("set data");

    let points = response.time_scale.points.as_ref().expect("points");
    assert_eq!(points.len(), 3);
    assert_eq!(response.time_scale.first_changed_point_index, Some(0));
    assert_eq!(response.time_scale.base_index, Some(2));

    let changes = response.series.get(&series.id()).expect("series entry");
    assert!(changes.info.is_none());
    let indexes: Vec<i64> = changes.data.iter().map(|row| row.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);

    // String input went through the business-day pre-pass: the canonical
    // form preserves the calendar day and the original echoes verbatim.
    assert_eq!(
        changes.data[0].time.business_day,
        Some(BusinessDay::new(2020, 1, 1))
    );
    assert_eq!(changes.data[0].time.timestamp, JAN1);
    assert_eq!(
        changes.data[0].original_time,
        UserTime::DateString("2020-01-01".to_owned())
    );
}

#[test]
fn second_series_interleaves_into_the_shared_scale() {
    let mut layer = DataLayer::new();
    let first = line(1);
    let second = histogram(2);

    layer
        .set_series_data(
            first,
            vec![
                date_value("2020-01-01", 10.0),
                date_value("2020-01-02", 11.0),
                date_value("2020-01-03", 12.0),
            ],
        )
        .expect("first series");

    let response = layer
        .set_series_data(
            second,
            vec![date_value("2020-01-02", 5.0), date_value("2020-01-04", 7.0)],
        )
        .expect("second series");

    let points = response.time_scale.points.as_ref().expect("points");
    assert_eq!(points.len(), 4);
    let timestamps: Vec<i64> = points.iter().map(|point| point.time.timestamp).collect();
    assert_eq!(
        timestamps,
        vec![JAN1, JAN1 + DAY, JAN1 + 2 * DAY, JAN1 + 3 * DAY]
    );
    assert_eq!(response.time_scale.first_changed_point_index, Some(3));

    let line_indexes: Vec<i64> = response.series[&first.id()]
        .data
        .iter()
        .map(|row| row.index)
        .collect();
    assert_eq!(line_indexes, vec![0, 1, 2]);
    let histogram_indexes: Vec<i64> = response.series[&second.id()]
        .data
        .iter()
        .map(|row| row.index)
        .collect();
    assert_eq!(histogram_indexes, vec![1, 3]);
}

#[test]
fn update_appends_a_new_tail_point() {
    let mut layer = DataLayer::new();
    let first = line(1);
    let second = histogram(2);
    seed_interleaved(&mut layer, first, second);

    let response = layer
        .update_series_data(first, date_value("2020-01-05", 13.0))
        .expect("append");

    assert_eq!(response.time_scale.first_changed_point_index, Some(4));
    assert_eq!(response.time_scale.base_index, Some(4));
    assert!(response.time_scale.points.is_some());
    let info = response.series[&first.id()].info.expect("info");
    assert!(info.last_bar_updated_or_new_bars_added_to_the_right);
}

#[test]
fn update_in_place_is_an_incremental_response() {
    let mut layer = DataLayer::new();
    let first = line(1);
    let second = histogram(2);
    seed_interleaved(&mut layer, first, second);
    layer
        .update_series_data(first, date_value("2020-01-05", 13.0))
        .expect("append");

    let response = layer
        .update_series_data(first, date_value("2020-01-05", 99.0))
        .expect("replace");

    // Minimal delta: no points, no divergence index, only the updated
    // series is echoed.
    assert_eq!(response.time_scale.first_changed_point_index, None);
    assert!(response.time_scale.points.is_none());
    assert_eq!(response.series.len(), 1);
    let last = response.series[&first.id()].data.last().expect("last row");
    assert_eq!(last.value.close(), 99.0);
    assert_eq!(last.index, 4);
}

#[test]
fn update_earlier_than_the_series_tail_is_rejected() {
    let mut layer = DataLayer::new();
    let first = line(1);
    let second = histogram(2);
    seed_interleaved(&mut layer, first, second);
    layer
        .update_series_data(first, date_value("2020-01-05", 13.0))
        .expect("append");

    let err = layer
        .update_series_data(first, date_value("2020-01-04", 0.0))
        .expect_err("older than tail");
    assert!(matches!(err, ChartError::UpdateOutOfOrder { .. }));
}

#[test]
fn whitespace_occupies_the_scale_but_not_the_series_rows() {
    let mut layer = DataLayer::new();
    let series = line(1);

    let response = layer
        .set_series_data(series, vec![whitespace(1_000), ts_value(2_000, 1.0)])
        .expect("set data");

    assert_eq!(layer.point_count(), 2);
    assert_eq!(response.time_scale.base_index, Some(1));
    let rows = &response.series[&series.id()].data;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].index, 1);
    assert_eq!(rows[0].time.timestamp, 2_000);
}

#[test]
fn set_is_idempotent_and_the_second_response_is_incremental() {
    let mut layer = DataLayer::new();
    let series = line(1);
    let items = vec![
        ts_value(1_000, 1.0),
        ts_value(2_000, 2.0),
        ts_value(3_000, 3.0),
    ];

    let first = layer
        .set_series_data(series, items.clone())
        .expect("first set");
    let rows_after_first = layer.series_rows(series.id()).expect("rows").to_vec();
    let snapshot_after_first = layer.point_snapshot();
    let weights_after_first: Vec<_> = layer
        .sorted_time_points()
        .iter()
        .map(|point| point.time_weight)
        .collect();

    let second = layer.set_series_data(series, items).expect("second set");

    assert_eq!(first.time_scale.first_changed_point_index, Some(0));
    assert_eq!(second.time_scale.first_changed_point_index, None);
    assert!(second.time_scale.points.is_none());
    // The series map still echoes the data once.
    assert_eq!(second.series[&series.id()].data, rows_after_first);

    assert_eq!(layer.point_snapshot(), snapshot_after_first);
    let weights_after_second: Vec<_> = layer
        .sorted_time_points()
        .iter()
        .map(|point| point.time_weight)
        .collect();
    assert_eq!(weights_after_second, weights_after_first);
}

#[test]
fn removing_a_series_restores_the_prior_state() {
    let mut layer = DataLayer::new();
    let first = line(1);
    let second = histogram(2);

    layer
        .set_series_data(first, vec![ts_value(1_000, 1.0), ts_value(3_000, 3.0)])
        .expect("first series");
    let snapshot_before = layer.point_snapshot();
    let rows_before = layer.series_rows(first.id()).expect("rows").to_vec();
    let base_before = layer.base_index();

    layer
        .set_series_data(second, vec![ts_value(2_000, 5.0), ts_value(4_000, 6.0)])
        .expect("second series");
    let response = layer.remove_series(second).expect("remove");

    assert_eq!(layer.point_snapshot(), snapshot_before);
    assert_eq!(layer.series_rows(first.id()).expect("rows"), &rows_before[..]);
    assert_eq!(layer.base_index(), base_before);
    assert_eq!(layer.series_rows(second.id()), None);

    // The wiped series still appears in the response, with empty data.
    let wiped = response.series.get(&second.id()).expect("wiped entry");
    assert!(wiped.data.is_empty());
}

#[test]
fn whitespace_tail_pops_then_value_reappends_at_the_same_slot() {
    let mut layer = DataLayer::new();
    let series = line(1);
    layer
        .set_series_data(series, vec![ts_value(1_000, 1.0), ts_value(2_000, 2.0)])
        .expect("seed");

    // Whitespace beyond the tail: a new scale slot, nothing popped.
    let response = layer
        .update_series_data(series, whitespace(3_000))
        .expect("whitespace append");
    assert_eq!(layer.series_rows(series.id()).expect("rows").len(), 2);
    assert_eq!(layer.point_count(), 3);
    let info = response.series[&series.id()].info.expect("info");
    assert!(!info.last_bar_updated_or_new_bars_added_to_the_right);

    // A value at the whitespace timestamp re-appends at that slot.
    layer
        .update_series_data(series, ts_value(3_000, 3.0))
        .expect("value at whitespace slot");
    let rows = layer.series_rows(series.id()).expect("rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.last().expect("tail").index, 2);

    // Whitespace at the value-bearing tail pops the trailing row.
    layer
        .update_series_data(series, whitespace(3_000))
        .expect("whitespace at tail");
    assert_eq!(layer.series_rows(series.id()).expect("rows").len(), 2);

    // A later value pushes as usual.
    layer
        .update_series_data(series, ts_value(4_000, 4.0))
        .expect("push beyond tail");
    let rows = layer.series_rows(series.id()).expect("rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.last().expect("tail").index, 3);
}

#[test]
fn replacing_with_a_shifted_dataset_reports_tail_or_left_edits() {
    let mut layer = DataLayer::new();
    let series = line(1);
    layer
        .set_series_data(series, vec![ts_value(1_000, 1.0), ts_value(2_000, 2.0)])
        .expect("seed");

    // Append-shaped replacement: both edges move right or stay.
    let response = layer
        .set_series_data(
            series,
            vec![
                ts_value(1_000, 1.0),
                ts_value(2_000, 2.5),
                ts_value(3_000, 3.0),
            ],
        )
        .expect("replace to the right");
    let info = response.series[&series.id()].info.expect("info");
    assert!(info.last_bar_updated_or_new_bars_added_to_the_right);

    // Replacement reaching further left is not an append.
    let response = layer
        .set_series_data(series, vec![ts_value(500, 0.5), ts_value(3_000, 3.0)])
        .expect("replace to the left");
    let info = response.series[&series.id()].info.expect("info");
    assert!(!info.last_bar_updated_or_new_bars_added_to_the_right);
}

#[test]
fn prefix_indexes_and_weights_survive_tail_edits() {
    let mut layer = DataLayer::new();
    let first = line(1);
    let second = histogram(2);

    layer
        .set_series_data(
            first,
            (0..5).map(|step| ts_value(JAN1 + step * DAY, step as f64)).collect(),
        )
        .expect("seed");
    let weights_before: Vec<_> = layer
        .sorted_time_points()
        .iter()
        .map(|point| point.time_weight)
        .collect();

    let response = layer
        .set_series_data(
            second,
            vec![
                ts_value(JAN1 + 2 * DAY, 1.0),
                ts_value(JAN1 + 6 * DAY, 2.0),
            ],
        )
        .expect("interleave");

    let first_changed = response
        .time_scale
        .first_changed_point_index
        .expect("changed") as usize;
    assert_eq!(first_changed, 5);
    let weights_after: Vec<_> = layer
        .sorted_time_points()
        .iter()
        .map(|point| point.time_weight)
        .collect();
    assert_eq!(&weights_after[..first_changed], &weights_before[..]);
    for (position, point) in layer.point_snapshot().iter().enumerate() {
        assert_eq!(point.index, position as i64);
    }
}

#[test]
fn mixing_time_variants_in_one_dataset_is_wrong_time_type() {
    let mut layer = DataLayer::new();
    let err = layer
        .set_series_data(
            line(1),
            vec![date_value("2020-01-01", 1.0), ts_value(JAN1 + DAY, 2.0)],
        )
        .expect_err("mixed variants");
    assert!(matches!(err, ChartError::WrongTimeType { .. }));
}

#[test]
fn candlestick_rows_carry_the_full_color_set() {
    let mut layer = DataLayer::new();
    let series = Series::new(SeriesId::new(1), SeriesType::Candlestick);
    let mut item = OhlcItem::new(UserTime::Timestamp(1_000), 10.0, 12.0, 9.0, 11.0);
    item.color = Some("#ef5350".to_owned());
    item.border_color = Some("#b71c1c".to_owned());
    item.wick_color = Some("#880e4f".to_owned());

    let response = layer
        .set_series_data(series, vec![SeriesDataItem::Ohlc(item)])
        .expect("set candle");
    let row = &response.series[&series.id()].data[0];
    assert_eq!(row.value.open(), 10.0);
    assert_eq!(row.value.high(), 12.0);
    assert_eq!(row.value.low(), 9.0);
    assert_eq!(row.value.close(), 11.0);
    assert_eq!(row.color.as_deref(), Some("#ef5350"));
    assert_eq!(row.border_color.as_deref(), Some("#b71c1c"));
    assert_eq!(row.wick_color.as_deref(), Some("#880e4f"));
}

fn seed_interleaved(layer: &mut DataLayer, first: Series, second: Series) {
    layer
        .set_series_data(
            first,
            vec![
                date_value("2020-01-01", 10.0),
                date_value("2020-01-02", 11.0),
                date_value("2020-01-03", 12.0),
            ],
        )
        .expect("first series");
    layer
        .set_series_data(
            second,
            vec![date_value("2020-01-02", 5.0), date_value("2020-01-04", 7.0)],
        )
        .expect("second series");
}
