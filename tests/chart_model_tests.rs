use chartgrid::ChartModel;
use chartgrid::core::{
    DataPoint, SeriesId, SeriesKind, SeriesOptions, SeriesOptionsUpdate, TimePoint,
};
use chartgrid::extensions::{MarkerPosition, MarkerShape, SeriesMarker};
use chartgrid::model::{InvalidationLevel, TimeScaleInvalidation};

fn simple_marker(time: i64) -> SeriesMarker {
    SeriesMarker {
        time: TimePoint::UnixSeconds(time),
        position: MarkerPosition::AboveBar,
        shape: MarkerShape::ArrowDown,
        color: "black".to_owned(),
    }
}

#[test]
fn a_fresh_model_carries_one_full_render_request() {
    let mut model = ChartModel::new(800.0, 600.0).expect("model");
    let initial = model.take_pending_invalidation().expect("initial");
    assert_eq!(initial.full_invalidation(), InvalidationLevel::Full);
    assert!(model.pending_invalidation().is_none());
}

#[test]
fn back_to_back_mutations_coalesce_into_one_mask() {
    let mut model = ChartModel::new(800.0, 600.0).expect("model");
    let series = model.add_series(SeriesKind::Line, SeriesOptions::default(), 0);
    let _ = model.take_pending_invalidation();

    model
        .set_series_data(series, vec![
            DataPoint::single(100_i64, 1.0).expect("p0"),
            DataPoint::single(200_i64, 2.0).expect("p1"),
        ])
        .expect("data");
    model.set_markers(series, vec![simple_marker(150)]);
    model.fit_content().expect("fit");

    let mask = model.take_pending_invalidation().expect("coalesced");
    let pane = mask.invalidation_for_pane(0);
    assert_eq!(pane.level, InvalidationLevel::Full);
    assert!(pane.auto_scale);
    assert_eq!(
        mask.time_scale_invalidations(),
        &[TimeScaleInvalidation::FitContent]
    );

    assert!(model.take_pending_invalidation().is_none());
}

#[test]
fn state_commits_before_the_paint_phase_runs() {
    let mut model = ChartModel::new(800.0, 600.0).expect("model");
    let _ = model.add_series(SeriesKind::Line, SeriesOptions::default(), 0);
    let _ = model.add_series(SeriesKind::Histogram, SeriesOptions::default(), 1);
    let _ = model.take_pending_invalidation();

    assert!(model.set_pane_height_at(0, 450.0));

    // Heights are already consistent even though nothing painted yet.
    let sum: f64 = model.panes().iter().map(|pane| pane.height()).sum();
    assert_eq!(sum, 600.0);
    assert!((model.panes()[0].height() - 450.0).abs() <= 1e-9);

    assert!(model.pending_invalidation().is_some());
    let _ = model.take_pending_invalidation();
    assert!(model.pending_invalidation().is_none());
}

#[test]
fn operations_on_removed_series_are_silent_noops() {
    let mut model = ChartModel::new(800.0, 600.0).expect("model");
    let series = model.add_series(SeriesKind::Line, SeriesOptions::default(), 0);
    assert!(model.remove_series(series));
    assert!(!model.remove_series(series));

    model
        .set_series_data(series, vec![DataPoint::single(100_i64, 1.0).expect("p0")])
        .expect("ignored");
    assert!(!model.set_markers(series, vec![simple_marker(100)]));
    assert!(!model.apply_series_options(series, SeriesOptionsUpdate::default()));
    assert!(model.series(series).is_none());
    assert!(model.placed_markers(series).expect("place").is_empty());
    assert!(model.series(SeriesId::new(999)).is_none());
}

#[test]
fn global_axis_is_the_sorted_union_of_all_series_times() {
    let mut model = ChartModel::new(800.0, 600.0).expect("model");
    let first = model.add_series(SeriesKind::Line, SeriesOptions::default(), 0);
    let second = model.add_series(SeriesKind::Line, SeriesOptions::default(), 0);

    model
        .set_series_data(first, vec![
            DataPoint::single(100_i64, 1.0).expect("a0"),
            DataPoint::single(300_i64, 2.0).expect("a1"),
        ])
        .expect("first");
    model
        .set_series_data(second, vec![
            DataPoint::single(200_i64, 3.0).expect("b0"),
            DataPoint::single(300_i64, 4.0).expect("b1"),
            DataPoint::single(400_i64, 5.0).expect("b2"),
        ])
        .expect("second");

    let epochs: Vec<i64> = model
        .time_scale()
        .points()
        .iter()
        .map(|point| point.epoch_seconds())
        .collect();
    assert_eq!(epochs, [100, 200, 300, 400]);

    assert!(model.remove_series(second));
    let epochs: Vec<i64> = model
        .time_scale()
        .points()
        .iter()
        .map(|point| point.epoch_seconds())
        .collect();
    assert_eq!(epochs, [100, 300]);
}

#[test]
fn removing_a_pane_removes_the_series_it_hosted() {
    let mut model = ChartModel::new(800.0, 600.0).expect("model");
    let main = model.add_series(SeriesKind::Candlestick, SeriesOptions::default(), 0);
    let volume = model.add_series(SeriesKind::Histogram, SeriesOptions::default(), 1);
    assert_eq!(model.panes().len(), 2);

    let volume_pane = model.series_pane(volume).expect("pane");
    assert!(model.remove_pane(volume_pane));

    assert_eq!(model.panes().len(), 1);
    assert!(model.series(volume).is_none());
    assert!(model.series(main).is_some());
    assert_eq!(model.panes()[0].height(), 600.0);
}

#[test]
fn invalid_construction_and_resize_are_rejected() {
    assert!(ChartModel::new(0.0, 600.0).is_err());
    assert!(ChartModel::new(800.0, f64::NAN).is_err());

    let mut model = ChartModel::new(800.0, 600.0).expect("model");
    assert!(model.set_size(-1.0, 600.0).is_err());
    assert_eq!(model.width(), 800.0);
    assert_eq!(model.height(), 600.0);
}
