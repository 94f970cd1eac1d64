//! Classification metrics with binary or support-weighted averaging.

use std::collections::BTreeMap;

use crate::report::{MetricValue, MetricsReport, TaskKind};

/// Computed classification metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Sorted unique labels over the union of truth and predictions; this
    /// is the axis ordering of `confusion`.
    pub labels: Vec<i64>,
    /// `confusion[i][j]` counts instances with true label `labels[i]`
    /// predicted as `labels[j]`.
    pub confusion: Vec<Vec<u64>>,
}

/// Compute metrics for equal-length, non-empty sequences.
///
/// Values are coerced to integer class labels by truncation toward zero.
/// Averaging is `binary` when the ground truth holds exactly two distinct
/// labels (the greater label is the positive class), `weighted` otherwise
/// (one-vs-rest scores weighted by ground-truth support). Ratios with a
/// zero denominator resolve to 0 rather than dividing by zero.
pub fn compute(y_true: &[f64], y_pred: &[f64]) -> ClassificationMetrics {
    let truth = coerce(y_true);
    let predicted = coerce(y_pred);
    let n = truth.len() as f64;

    let mut labels: Vec<i64> = truth.iter().chain(&predicted).copied().collect();
    labels.sort_unstable();
    labels.dedup();
    let index_of = |label: i64| labels.binary_search(&label).unwrap_or(0);

    let classes = labels.len();
    let mut confusion = vec![vec![0u64; classes]; classes];
    for (t, p) in truth.iter().zip(&predicted) {
        confusion[index_of(*t)][index_of(*p)] += 1;
    }

    let accuracy = truth
        .iter()
        .zip(&predicted)
        .filter(|(t, p)| t == p)
        .count() as f64
        / n;

    // Per-class counts from the confusion matrix.
    let true_positive: Vec<u64> = (0..classes).map(|i| confusion[i][i]).collect();
    let predicted_positive: Vec<u64> = (0..classes)
        .map(|j| (0..classes).map(|i| confusion[i][j]).sum())
        .collect();
    let support: Vec<u64> = (0..classes).map(|i| confusion[i].iter().sum()).collect();

    let mut truth_labels = truth.clone();
    truth_labels.sort_unstable();
    truth_labels.dedup();

    let (precision, recall, f1) = if truth_labels.len() == 2 {
        // Binary averaging: score the positive class only.
        let positive = index_of(truth_labels[1]);
        let precision = ratio(true_positive[positive], predicted_positive[positive]);
        let recall = ratio(true_positive[positive], support[positive]);
        (precision, recall, f_score(precision, recall))
    } else {
        // Weighted averaging: one-vs-rest, weighted by support.
        let mut precision = 0.0;
        let mut recall = 0.0;
        let mut f1 = 0.0;
        for i in 0..classes {
            let weight = support[i] as f64 / n;
            let p = ratio(true_positive[i], predicted_positive[i]);
            let r = ratio(true_positive[i], support[i]);
            precision += weight * p;
            recall += weight * r;
            f1 += weight * f_score(p, r);
        }
        (precision, recall, f1)
    };

    ClassificationMetrics {
        accuracy,
        precision,
        recall,
        f1,
        labels,
        confusion,
    }
}

/// Truncate toward zero, matching integer coercion of float labels.
fn coerce(values: &[f64]) -> Vec<i64> {
    values.iter().map(|v| v.trunc() as i64).collect()
}

/// A ratio that resolves zero denominators to 0 instead of dividing.
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Build the full report, metric values plus interpretations.
pub(crate) fn report(y_true: &[f64], y_pred: &[f64]) -> MetricsReport {
    let computed = compute(y_true, y_pred);

    let mut metrics = BTreeMap::new();
    metrics.insert(
        "Accuracy".to_string(),
        MetricValue::Number(computed.accuracy),
    );
    metrics.insert(
        "Precision".to_string(),
        MetricValue::Number(computed.precision),
    );
    metrics.insert("Recall".to_string(), MetricValue::Number(computed.recall));
    metrics.insert("F1-Score".to_string(), MetricValue::Number(computed.f1));
    metrics.insert(
        "Confusion Matrix".to_string(),
        MetricValue::Matrix(computed.confusion.clone()),
    );

    let mut interpretation = BTreeMap::new();
    interpretation.insert(
        "Accuracy".to_string(),
        format!(
            "{:.1}% of predictions are correct",
            computed.accuracy * 100.0
        ),
    );
    interpretation.insert(
        "Precision".to_string(),
        format!(
            "{:.1}% of positive predictions are actually positive",
            computed.precision * 100.0
        ),
    );
    interpretation.insert(
        "Recall".to_string(),
        format!(
            "{:.1}% of actual positives were caught",
            computed.recall * 100.0
        ),
    );
    interpretation.insert(
        "F1-Score".to_string(),
        format!("Balanced score: {:.2}", computed.f1),
    );
    interpretation.insert(
        "Confusion Matrix".to_string(),
        "Rows are actual classes, columns are predicted classes".to_string(),
    );

    MetricsReport {
        task_kind: TaskKind::Classification,
        metrics,
        interpretation,
    }
}
