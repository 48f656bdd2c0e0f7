//! Integration tests for the gradient operator, error metrics and the
//! time-series aggregator.

use approx::assert_relative_eq;
use ndarray::{Array2, Array3, Axis, s};
use ssh_eval::{
    Aggregator, BoundaryPolicy, GradientOperator, GradientOrder, Metric, MetricsError,
    ReconstructionScores, gradient_mse, mse, nan_mean, nan_percentile, nan_std, nrmse,
    relative_improvement,
};

/// Smooth synthetic SSH-like field with a few eddies.
fn eddies(rows: usize, cols: usize, t: usize) -> Array2<f64> {
    let shift = t as f64 * 0.15;
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let x = c as f64 / cols as f64;
        let y = r as f64 / rows as f64;
        0.3 * (6.0 * (x + shift)).sin() * (4.0 * y).cos() + 0.1 * (11.0 * y - 3.0 * x).sin()
    })
}

fn eddy_stack(steps: usize, rows: usize, cols: usize) -> Array3<f64> {
    let mut stack = Array3::zeros((steps, rows, cols));
    for (t, mut field) in stack.axis_iter_mut(Axis(0)).enumerate() {
        field.assign(&eddies(rows, cols, t));
    }
    stack
}

// ---------------------------------------------------------------------------
// Gradient operator
// ---------------------------------------------------------------------------

#[test]
fn test_nan_footprint_interior() {
    let mut field = Array2::from_shape_fn((5, 5), |(r, c)| (r * 5 + c) as f64);
    field[[2, 2]] = f64::NAN;

    let grad = GradientOperator::default().magnitude(field.view());
    for ((r, c), &g) in grad.indexed_iter() {
        let inside = (1..=3).contains(&r) && (1..=3).contains(&c);
        assert_eq!(
            g.is_nan(),
            inside,
            "pixel ({}, {}) NaN = {}, expected {}",
            r,
            c,
            g.is_nan(),
            inside
        );
    }
}

#[test]
fn test_nan_footprint_corner() {
    let mut field = Array2::from_shape_fn((5, 5), |(r, c)| (r * c) as f64);
    field[[0, 0]] = f64::NAN;

    for order in [GradientOrder::X, GradientOrder::Y, GradientOrder::Magnitude] {
        let grad = GradientOperator::default().apply(field.view(), order);
        for ((r, c), &g) in grad.indexed_iter() {
            let inside = r <= 1 && c <= 1;
            assert_eq!(g.is_nan(), inside, "{:?} at ({}, {})", order, r, c);
        }
    }
}

#[test]
fn test_constant_field_gradient() {
    let field = Array2::from_elem((6, 7), 3.5);

    for boundary in [
        BoundaryPolicy::Reflect101,
        BoundaryPolicy::Reflect,
        BoundaryPolicy::Replicate,
    ] {
        let grad = GradientOperator::new(boundary).magnitude(field.view());
        assert!(
            grad.iter().all(|&g| g == 0.0),
            "{:?} should give zero gradient on a constant field",
            boundary
        );
    }

    // Zero padding sees a step at the border only
    let padded = GradientOperator::new(BoundaryPolicy::Constant(0.0)).magnitude(field.view());
    assert!(padded.slice(s![1..5, 1..6]).iter().all(|&g| g == 0.0));
    assert!(padded[[0, 3]] > 0.0);
    assert!(padded[[5, 0]] > 0.0);
}

#[test]
fn test_gradient_of_plane() {
    // f = 2 * col - 3 * row
    let field = Array2::from_shape_fn((8, 8), |(r, c)| 2.0 * c as f64 - 3.0 * r as f64);
    let (dx, dy) = GradientOperator::default().components(field.view());

    assert_relative_eq!(dx[[4, 4]], 2.0, epsilon = 1e-12);
    assert_relative_eq!(dy[[4, 4]], -3.0, epsilon = 1e-12);

    let magnitude = GradientOperator::default().magnitude(field.view());
    assert_relative_eq!(magnitude[[3, 5]], 13f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn test_gradient_order_from_index() {
    assert_eq!(GradientOrder::try_from(0).unwrap(), GradientOrder::X);
    assert_eq!(GradientOrder::try_from(1).unwrap(), GradientOrder::Y);
    assert_eq!(GradientOrder::try_from(2).unwrap(), GradientOrder::Magnitude);
    assert!(GradientOrder::try_from(3).unwrap_err().is_invalid_input());
}

// ---------------------------------------------------------------------------
// Statistics and metrics
// ---------------------------------------------------------------------------

#[test]
fn test_nan_statistics() {
    let values = [1.0, f64::NAN, 3.0, 5.0, f64::NAN];
    assert_relative_eq!(nan_mean(&values).unwrap(), 3.0);
    assert_relative_eq!(nan_std(&values).unwrap(), (8.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    assert_relative_eq!(nan_percentile(&values, 50.0).unwrap(), 3.0);
    assert_relative_eq!(nan_percentile(&values, 25.0).unwrap(), 2.0);

    let missing = [f64::NAN; 4];
    assert!(nan_mean(&missing).unwrap_err().is_undefined());
    assert!(nan_percentile(&values, 101.0).unwrap_err().is_invalid_input());
}

#[test]
fn test_identical_fields_score_zero() {
    let truth = eddies(20, 24, 0);
    assert_eq!(mse(truth.view(), truth.view()).unwrap(), 0.0);
    assert_eq!(nrmse(truth.view(), truth.view()).unwrap(), 0.0);

    let op = GradientOperator::default();
    assert_eq!(gradient_mse(truth.view(), truth.view(), &op).unwrap(), 0.0);
}

#[test]
fn test_mse_ignores_offset() {
    let truth = eddies(16, 16, 2);
    let shifted = &truth + 0.75;
    assert_relative_eq!(mse(truth.view(), shifted.view()).unwrap(), 0.0, epsilon = 1e-20);
}

#[test]
fn test_nrmse_scale_invariance() {
    let truth = eddies(16, 20, 1);
    let candidate = eddies(16, 20, 3);

    let base = nrmse(truth.view(), candidate.view()).unwrap();
    let scaled = nrmse((&truth * 40.0).view(), (&candidate * 40.0).view()).unwrap();
    assert_relative_eq!(base, scaled, max_relative = 1e-12);
}

#[test]
fn test_nrmse_constant_reference() {
    let truth = Array2::from_elem((8, 8), 1.2);
    let candidate = eddies(8, 8, 0);
    let err = nrmse(truth.view(), candidate.view()).unwrap_err();
    assert!(matches!(err, MetricsError::UndefinedStatistic(_)));
}

#[test]
fn test_metrics_skip_missing_points() {
    let truth = eddies(12, 12, 0);
    let mut candidate = &truth * 0.5;
    candidate[[4, 7]] = f64::NAN;
    candidate[[9, 1]] = f64::NAN;

    for metric in [Metric::Mse, Metric::Nrmse, Metric::GradientMse] {
        let value = metric
            .evaluate(truth.view(), candidate.view(), &GradientOperator::default())
            .unwrap();
        assert!(value.is_finite() && value > 0.0, "{} = {}", metric, value);
    }
}

#[test]
fn test_shape_mismatch_rejected() {
    let a = Array2::<f64>::zeros((4, 4));
    let b = Array2::<f64>::zeros((4, 5));
    assert!(mse(a.view(), b.view()).unwrap_err().is_invalid_input());
    assert!(
        gradient_mse(a.view(), b.view(), &GradientOperator::default())
            .unwrap_err()
            .is_invalid_input()
    );
}

#[test]
fn test_reconstruction_scores() {
    let truth = eddy_stack(4, 16, 16);
    let perfect = ReconstructionScores::compute(truth.view(), truth.view()).unwrap();
    assert_eq!(perfect.mse, 0.0);
    assert_eq!(perfect.mse_grad, 0.0);
    assert!(perfect.mean_grad > 0.0);

    let flat = Array3::<f64>::zeros(truth.dim());
    let scores = ReconstructionScores::compute(truth.view(), flat.view()).unwrap();
    assert!(scores.mse > 0.0);
    assert_eq!(scores.mean_grad, 0.0);
    assert_relative_eq!(scores.mse_grad, perfect.mean_grad, max_relative = 1e-12);
}

#[test]
fn test_relative_improvement() {
    let baseline = [0.4, 0.6];
    let candidate = [0.2, 0.3];
    assert_relative_eq!(relative_improvement(&baseline, &candidate).unwrap(), 0.5);
    assert!(relative_improvement(&[0.0, 0.0], &candidate).unwrap_err().is_undefined());
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

#[test]
fn test_zero_sequences_summary() {
    let truth = Array3::<f64>::zeros((10, 5, 5));
    let candidate = Array3::<f64>::zeros((10, 5, 5));

    for metric in [Metric::Mse, Metric::GradientMse] {
        let stats = Aggregator::new(metric)
            .summary(truth.view(), candidate.view())
            .unwrap();
        assert_eq!(stats.as_array(), [0.0, 0.0, 0.0]);
    }
}

#[test]
fn test_mismatched_sequences_rejected() {
    let truth = Array3::<f64>::zeros((3, 4, 4));
    let candidate = Array3::<f64>::zeros((3, 5, 4));
    let err = Aggregator::default()
        .error_series(truth.view(), candidate.view())
        .unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn test_error_series_follows_time() {
    let truth = eddy_stack(6, 16, 16);
    // Same error pattern, growing linearly in time
    let pattern = eddies(16, 16, 7);
    let mut candidate = truth.clone();
    for (t, mut field) in candidate.axis_iter_mut(Axis(0)).enumerate() {
        field.scaled_add(0.05 * t as f64, &pattern);
    }

    let series = Aggregator::new(Metric::Mse)
        .error_series(truth.view(), candidate.view())
        .unwrap();

    assert_eq!(series.len(), 6);
    assert_eq!(series.values()[0], 0.0);
    assert!(series.values().windows(2).all(|w| w[1] > w[0]));

    let stats = series.summary().unwrap();
    assert!(stats.p5 <= stats.mean && stats.mean <= stats.p95);
}

#[test]
fn test_compare_keeps_order_and_undefined_rows() {
    let truth = eddy_stack(5, 12, 12);
    let good = &truth * 0.95;
    let poor = &truth * 0.5;
    let mut gappy = truth.clone();
    gappy.fill(f64::NAN);

    let table = Aggregator::new(Metric::Nrmse)
        .compare(
            truth.view(),
            &[
                ("poor", poor.view()),
                ("gappy", gappy.view()),
                ("good", good.view()),
            ],
        )
        .unwrap();

    let labels: Vec<&str> = table.rows().iter().map(|r| r.label()).collect();
    assert_eq!(labels, vec!["poor", "gappy", "good"]);

    let poor_mean = table.row("poor").unwrap().stats().unwrap().mean;
    let good_mean = table.row("good").unwrap().stats().unwrap().mean;
    assert_relative_eq!(poor_mean, 0.5, max_relative = 1e-9);
    assert_relative_eq!(good_mean, 0.05, max_relative = 1e-9);

    assert!(!table.row("gappy").unwrap().is_defined());
    let array = table.to_array();
    assert_eq!(array.dim(), (3, 3));
    assert!(array.row(1).iter().all(|v| v.is_nan()));
}

#[test]
fn test_compare_checks_every_shape_first() {
    let truth = eddy_stack(3, 8, 8);
    let ok = truth.clone();
    let wrong = Array3::<f64>::zeros((2, 8, 8));

    let result =
        Aggregator::default().compare(truth.view(), &[("ok", ok.view()), ("wrong", wrong.view())]);
    assert!(result.unwrap_err().is_invalid_input());
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_series_matches_serial() {
    let truth = eddy_stack(8, 16, 16);
    let candidate = &truth * 0.8 + 0.01;
    let aggregator = Aggregator::new(Metric::GradientMse);

    let serial = aggregator.error_series(truth.view(), candidate.view()).unwrap();
    let parallel = aggregator
        .error_series_parallel(truth.view(), candidate.view())
        .unwrap();
    assert_eq!(serial, parallel);
}
