use chart_axes::model::{PlotList, PlotRow, PlotRowValueIndex, TimePoint};
use proptest::prelude::*;

fn build_rows(indices: &[i64]) -> Vec<PlotRow> {
    indices
        .iter()
        .map(|&index| {
            let value = (index as f64 * 0.7).sin() * 50.0 + 100.0;
            PlotRow {
                index,
                time: TimePoint::from_timestamp(index * 60),
                value: [value, value + 1.0, value - 1.0, value + 0.5],
                color: None,
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cached_min_max_matches_uncached_reference(
        indices in prop::collection::btree_set(0i64..300, 1..120),
        queries in prop::collection::vec((0i64..300, 0i64..300), 1..20),
    ) {
        let indices: Vec<i64> = indices.into_iter().collect();
        let mut plots = PlotList::new();
        plots.set_data(build_rows(&indices));

        let plot_kinds = [PlotRowValueIndex::Low, PlotRowValueIndex::High];
        for (a, b) in queries {
            let (start, end) = (a.min(b), a.max(b));
            let reference = plots.min_max_on_range(start, end, &plot_kinds);
            let cached = plots.min_max_on_range_cached(start, end, &plot_kinds);
            prop_assert_eq!(cached, reference);
            // A warm cache must agree with its own cold answer.
            let warm = plots.min_max_on_range_cached(start, end, &plot_kinds);
            prop_assert_eq!(warm, reference);
        }
    }

    #[test]
    fn chunk_boundaries_do_not_double_count_or_drop_rows(
        offset in 0i64..40,
        length in 1i64..100,
    ) {
        // A dense run of rows straddling chunk boundaries on both sides.
        let indices: Vec<i64> = (offset..offset + length).collect();
        let mut plots = PlotList::new();
        plots.set_data(build_rows(&indices));

        let cached = plots
            .min_max_on_range_cached(offset, offset + length - 1, &[PlotRowValueIndex::Close])
            .expect("non-empty");
        let reference = plots
            .min_max_on_range(offset, offset + length - 1, &[PlotRowValueIndex::Close])
            .expect("non-empty");
        prop_assert_eq!(cached, reference);
    }

    #[test]
    fn queries_outside_the_data_are_empty(
        indices in prop::collection::btree_set(100i64..200, 1..40),
    ) {
        let indices: Vec<i64> = indices.into_iter().collect();
        let mut plots = PlotList::new();
        plots.set_data(build_rows(&indices));
        prop_assert_eq!(
            plots.min_max_on_range_cached(0, 99, &[PlotRowValueIndex::Close]),
            None
        );
        prop_assert_eq!(
            plots.min_max_on_range_cached(201, 300, &[PlotRowValueIndex::Close]),
            None
        );
    }
}
