use chartgrid::ChartModel;
use chartgrid::core::{DEFAULT_MIN_PANE_HEIGHT, PaneId, SeriesKind, SeriesOptions};

fn model_with_panes(pane_count: usize) -> ChartModel {
    let mut model = ChartModel::new(800.0, 600.0).expect("model");
    for pane_index in 0..pane_count {
        let _ = model.add_series(SeriesKind::Line, SeriesOptions::default(), pane_index);
    }
    model
}

fn heights(model: &ChartModel) -> Vec<f64> {
    model.panes().iter().map(|pane| pane.height()).collect()
}

#[test]
fn set_height_redistributes_peers_and_keeps_the_exact_total() {
    let mut model = model_with_panes(3);
    assert_eq!(model.panes().len(), 3);

    assert!(model.set_pane_height_at(1, 300.0));
    let heights = heights(&model);
    assert!((heights[1] - 300.0).abs() <= 1e-9);
    assert!((heights[0] - 150.0).abs() <= 1e-9);
    assert!((heights[2] - 150.0).abs() <= 1e-9);
    assert_eq!(heights.iter().sum::<f64>(), 600.0);
}

#[test]
fn impossible_height_is_clamped_not_rejected() {
    let mut model = model_with_panes(3);

    assert!(model.set_pane_height_at(0, 10_000.0));
    let heights = heights(&model);
    assert!((heights[0] - (600.0 - 2.0 * DEFAULT_MIN_PANE_HEIGHT)).abs() <= 1e-9);
    assert!(heights[1] >= DEFAULT_MIN_PANE_HEIGHT - 1e-9);
    assert!(heights[2] >= DEFAULT_MIN_PANE_HEIGHT - 1e-9);
    assert_eq!(heights.iter().sum::<f64>(), 600.0);
}

#[test]
fn tiny_height_request_clamps_up_to_the_minimum() {
    let mut model = model_with_panes(2);

    assert!(model.set_pane_height_at(1, 5.0));
    let heights = heights(&model);
    assert!((heights[1] - DEFAULT_MIN_PANE_HEIGHT).abs() <= 1e-9);
    assert_eq!(heights.iter().sum::<f64>(), 600.0);
}

#[test]
fn unknown_pane_height_request_is_a_silent_noop() {
    let mut model = model_with_panes(2);
    let before = heights(&model);

    assert!(!model.set_pane_height(PaneId::new(99), 200.0));
    assert!(!model.set_pane_height_at(7, 200.0));
    assert_eq!(heights(&model), before);
}

#[test]
fn resize_rescales_panes_proportionally() {
    let mut model = model_with_panes(2);
    assert!(model.set_pane_height_at(0, 400.0));

    model.set_size(800.0, 300.0).expect("resize");
    let heights = heights(&model);
    assert!((heights[0] - 200.0).abs() <= 1e-9);
    assert!((heights[1] - 100.0).abs() <= 1e-9);
    assert_eq!(heights.iter().sum::<f64>(), 300.0);
}

#[test]
fn regions_tile_the_chart_exactly() {
    let mut model = model_with_panes(3);
    assert!(model.set_pane_height_at(1, 123.456));

    let regions = model.pane_regions();
    assert_eq!(regions[0].top, 0.0);
    for pair in regions.windows(2) {
        assert_eq!(pair[0].bottom, pair[1].top);
    }
    assert_eq!(regions.last().expect("regions").bottom, 600.0);
}

#[test]
fn last_remaining_pane_cannot_be_removed() {
    let mut model = model_with_panes(1);
    let only = model.panes()[0].id();
    assert!(!model.remove_pane(only));
    assert_eq!(model.panes().len(), 1);
    assert_eq!(model.panes()[0].height(), 600.0);
}
