use chart_axes::model::{
    DataLayer, MismatchDirection, PlotList, PlotRowValueIndex, SeriesDataRow, SeriesId, SeriesTime,
    TimeScale, TimeScaleOptions,
};

fn series(points: &[(i64, f64)]) -> Vec<SeriesDataRow> {
    points
        .iter()
        .map(|&(timestamp, value)| SeriesDataRow::single(SeriesTime::Timestamp(timestamp), value))
        .collect()
}

#[test]
fn merged_axis_drives_time_scale_coordinates() {
    let mut layer = DataLayer::new();
    let a = SeriesId(1);
    let b = SeriesId(2);
    layer
        .set_series_data(a, series(&[(100, 10.0), (200, 20.0), (300, 30.0)]))
        .expect("series a");
    let response = layer
        .set_series_data(b, series(&[(150, 15.0), (250, 25.0)]))
        .expect("series b");

    let mut time_scale = TimeScale::new(TimeScaleOptions {
        bar_spacing: 10.0,
        ..TimeScaleOptions::default()
    });
    time_scale.set_width(500.0).expect("width");
    time_scale.set_points(
        response.time_scale_points.expect("axis changed"),
        response.first_changed_index.expect("axis changed"),
    );
    time_scale
        .set_base_index(response.base_index)
        .expect("base index");

    // Rightmost bar sits half a spacing inside the right edge.
    let last = time_scale.index_to_coordinate(4).expect("coord");
    assert!((last - 494.0).abs() < 1e-9);
    let first = time_scale.index_to_coordinate(0).expect("coord");
    assert!((first - 454.0).abs() < 1e-9);
    assert_eq!(time_scale.coordinate_to_index(494.0).expect("index"), 4);

    // Coordinates are strictly increasing in the logical index.
    let coords: Vec<f64> = (0..5)
        .map(|index| time_scale.index_to_coordinate(index).expect("coord"))
        .collect();
    for pair in coords.windows(2) {
        assert!(pair[1] > pair[0]);
    }
}

#[test]
fn series_rows_feed_plot_list_queries() {
    let mut layer = DataLayer::new();
    let a = SeriesId(1);
    let b = SeriesId(2);
    layer
        .set_series_data(a, series(&[(100, 10.0), (200, 20.0), (300, 30.0)]))
        .expect("series a");
    layer
        .set_series_data(b, series(&[(150, 15.0), (250, 25.0)]))
        .expect("series b");

    let mut plots = PlotList::new();
    plots.set_data(layer.series_rows(a));

    // a occupies shared-axis slots 0, 2 and 4; slot 1 belongs to b alone.
    assert_eq!(
        plots.value_at(2, PlotRowValueIndex::Close, MismatchDirection::None),
        Some(20.0)
    );
    assert_eq!(
        plots.value_at(1, PlotRowValueIndex::Close, MismatchDirection::None),
        None
    );
    assert_eq!(
        plots.value_at(1, PlotRowValueIndex::Close, MismatchDirection::NearestLeft),
        Some(10.0)
    );
    assert_eq!(
        plots.value_at(1, PlotRowValueIndex::Close, MismatchDirection::NearestRight),
        Some(20.0)
    );

    let min_max = plots
        .min_max_on_range_cached(0, 4, &[PlotRowValueIndex::Close])
        .expect("non-empty range");
    assert_eq!(min_max.min, 10.0);
    assert_eq!(min_max.max, 30.0);
}

#[test]
fn single_point_update_keeps_dependents_in_sync() {
    let mut layer = DataLayer::new();
    let a = SeriesId(1);
    let response = layer
        .set_series_data(a, series(&[(100, 10.0), (200, 20.0)]))
        .expect("initial");

    let mut time_scale = TimeScale::default();
    time_scale.set_width(500.0).expect("width");
    time_scale.set_points(
        response.time_scale_points.expect("axis changed"),
        response.first_changed_index.expect("axis changed"),
    );
    time_scale
        .set_base_index(response.base_index)
        .expect("base index");
    assert_eq!(time_scale.point_count(), 2);

    // Appending a bar republishes the axis with a minimal change index.
    let response = layer
        .update_series_data(a, SeriesDataRow::single(SeriesTime::Timestamp(300), 30.0))
        .expect("append");
    assert_eq!(response.first_changed_index, Some(2));
    assert!(response.series[&a].appended_to_right);
    time_scale.set_points(
        response.time_scale_points.expect("axis changed"),
        response.first_changed_index.expect("axis changed"),
    );
    time_scale
        .set_base_index(response.base_index)
        .expect("base index");
    assert_eq!(time_scale.point_count(), 3);
    assert_eq!(time_scale.base_index(), 2);

    // Overwriting the last bar touches values only.
    let response = layer
        .update_series_data(a, SeriesDataRow::single(SeriesTime::Timestamp(300), 33.0))
        .expect("overwrite");
    assert!(response.time_scale_points.is_none());
    assert_eq!(response.series[&a].rows[2].value[3], 33.0);
}
