//! Regression metrics: MSE, RMSE, MAE, R².

use std::collections::BTreeMap;

use crate::report::{MetricValue, MetricsReport, TaskKind};

/// Computed regression metrics.
///
/// `r2` is `None` when the ground truth has zero variance; the coefficient
/// of determination is undefined there, and the report carries an explicit
/// sentinel instead of a NaN that happens to fall out of the division.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: Option<f64>,
}

/// Compute metrics for equal-length, non-empty sequences.
///
/// Length and emptiness are validated by [`evaluate`](crate::evaluate)
/// before this is reached.
pub fn compute(y_true: &[f64], y_pred: &[f64]) -> RegressionMetrics {
    let n = y_true.len() as f64;

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let mse = ss_res / n;
    let rmse = mse.sqrt();

    let mae = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / n;

    let mean_true = y_true.iter().sum::<f64>() / n;
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();
    let r2 = if ss_tot == 0.0 {
        None
    } else {
        Some(1.0 - ss_res / ss_tot)
    };

    RegressionMetrics { mse, rmse, mae, r2 }
}

/// Build the full report, metric values plus interpretations.
pub(crate) fn report(y_true: &[f64], y_pred: &[f64]) -> MetricsReport {
    let computed = compute(y_true, y_pred);

    let mut metrics = BTreeMap::new();
    metrics.insert("MSE".to_string(), MetricValue::Number(computed.mse));
    metrics.insert("RMSE".to_string(), MetricValue::Number(computed.rmse));
    metrics.insert("MAE".to_string(), MetricValue::Number(computed.mae));
    metrics.insert(
        "R²".to_string(),
        match computed.r2 {
            Some(r2) => MetricValue::Number(r2),
            None => MetricValue::Undefined,
        },
    );

    let mut interpretation = BTreeMap::new();
    interpretation.insert(
        "MSE".to_string(),
        format!("Average squared error: {:.2}", computed.mse),
    );
    interpretation.insert(
        "RMSE".to_string(),
        format!("Average error: {:.2} (in original units)", computed.rmse),
    );
    interpretation.insert(
        "MAE".to_string(),
        format!("Average absolute error: {:.2}", computed.mae),
    );
    interpretation.insert(
        "R²".to_string(),
        match computed.r2 {
            Some(r2) => format!("Model explains {:.1}% of variance", r2 * 100.0),
            None => "R² is undefined: the ground truth has zero variance".to_string(),
        },
    );

    MetricsReport {
        task_kind: TaskKind::Regression,
        metrics,
        interpretation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_perfect_prediction() {
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        let m = compute(&y, &y);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.r2, Some(1.0));
    }

    #[test]
    fn test_known_values() {
        let y_true = [3.0, -0.5, 2.0, 7.0];
        let y_pred = [2.5, 0.0, 2.0, 8.0];
        let m = compute(&y_true, &y_pred);
        assert!((m.mse - 0.375).abs() < 1e-12);
        assert!((m.mae - 0.5).abs() < 1e-12);
        // Matches the scikit-learn reference value for this fixture.
        assert!((m.r2.expect("defined") - 0.9486081370449679).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_truth_is_undefined() {
        let m = compute(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert_eq!(m.r2, None);

        let report = report(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert_eq!(report.metrics.get("R²"), Some(&MetricValue::Undefined));
        assert!(
            report.interpretation.get("R²").expect("present").contains("zero variance")
        );
    }

    #[test]
    fn test_interpretation_formatting() {
        let report = report(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(
            report.interpretation.get("MSE"),
            Some(&"Average squared error: 0.00".to_string())
        );
        assert_eq!(
            report.interpretation.get("R²"),
            Some(&"Model explains 100.0% of variance".to_string())
        );
    }

    proptest! {
        #[test]
        fn prop_error_metrics_non_negative(
            pairs in proptest::collection::vec((-1e6f64..1e6, -1e6f64..1e6), 1..64)
        ) {
            let (y_true, y_pred): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let m = compute(&y_true, &y_pred);
            prop_assert!(m.mse >= 0.0);
            prop_assert!(m.rmse >= 0.0);
            prop_assert!(m.mae >= 0.0);
            prop_assert!((m.rmse * m.rmse - m.mse).abs() <= 1e-6 * m.mse.max(1.0));
        }

        #[test]
        fn prop_identical_inputs_give_zero_error(
            ys in proptest::collection::vec(-1e6f64..1e6, 1..64)
        ) {
            let m = compute(&ys, &ys);
            prop_assert_eq!(m.mse, 0.0);
            prop_assert_eq!(m.mae, 0.0);
        }
    }
}
