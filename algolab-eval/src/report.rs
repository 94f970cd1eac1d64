//! Evaluation request/report types and the metric dispatch.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classification;
use crate::error::EvalError;
use crate::regression;

/// Whether an evaluation treats values as continuous (regression) or
/// categorical (classification) outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Regression,
    Classification,
}

impl FromStr for TaskKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regression" => Ok(Self::Regression),
            "classification" => Ok(Self::Classification),
            other => Err(EvalError::InvalidTaskKind(other.to_string())),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regression => write!(f, "regression"),
            Self::Classification => write!(f, "classification"),
        }
    }
}

/// A single metric value.
///
/// `Undefined` is the explicit sentinel for metrics that have no defined
/// value on the given input (R² with zero ground-truth variance); it
/// serializes as JSON `null` rather than relying on incidental
/// floating-point behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Matrix(Vec<Vec<u64>>),
    Undefined,
}

/// Ground truth and predictions for one evaluation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub ground_truth: Vec<f64>,
    pub predictions: Vec<f64>,
    pub task_kind: TaskKind,
}

/// The full metric payload for one evaluation: values plus human-readable
/// interpretations keyed by metric name.
///
/// Derived purely from the request; identical inputs produce identical
/// reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub task_kind: TaskKind,
    pub metrics: BTreeMap<String, MetricValue>,
    pub interpretation: BTreeMap<String, String>,
}

/// Compute the metric report for a request.
///
/// Fails with [`EvalError::EmptyInput`] when either sequence is empty and
/// [`EvalError::LengthMismatch`] when the sequences differ in length.
pub fn evaluate(request: &EvaluationRequest) -> Result<MetricsReport, EvalError> {
    if request.ground_truth.is_empty() || request.predictions.is_empty() {
        return Err(EvalError::EmptyInput);
    }
    if request.ground_truth.len() != request.predictions.len() {
        return Err(EvalError::LengthMismatch {
            expected: request.ground_truth.len(),
            actual: request.predictions.len(),
        });
    }
    let report = match request.task_kind {
        TaskKind::Regression => regression::report(&request.ground_truth, &request.predictions),
        TaskKind::Classification => {
            classification::report(&request.ground_truth, &request.predictions)
        }
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind_parse() {
        assert_eq!("regression".parse::<TaskKind>(), Ok(TaskKind::Regression));
        assert_eq!(
            "classification".parse::<TaskKind>(),
            Ok(TaskKind::Classification)
        );
        assert_eq!(
            "clustering".parse::<TaskKind>(),
            Err(EvalError::InvalidTaskKind("clustering".to_string()))
        );
    }

    #[test]
    fn test_task_kind_serde() {
        assert_eq!(
            serde_json::to_string(&TaskKind::Regression).unwrap(),
            "\"regression\""
        );
        let kind: TaskKind = serde_json::from_str("\"classification\"").unwrap();
        assert_eq!(kind, TaskKind::Classification);
    }

    #[test]
    fn test_metric_value_undefined_serializes_as_null() {
        assert_eq!(
            serde_json::to_string(&MetricValue::Undefined).unwrap(),
            "null"
        );
        assert_eq!(serde_json::to_string(&MetricValue::Number(0.5)).unwrap(), "0.5");
    }

    #[test]
    fn test_empty_input_rejected() {
        let request = EvaluationRequest {
            ground_truth: vec![],
            predictions: vec![],
            task_kind: TaskKind::Regression,
        };
        assert_eq!(evaluate(&request), Err(EvalError::EmptyInput));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let request = EvaluationRequest {
            ground_truth: vec![1.0, 2.0, 3.0],
            predictions: vec![1.0, 2.0],
            task_kind: TaskKind::Regression,
        };
        assert_eq!(
            evaluate(&request),
            Err(EvalError::LengthMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_evaluate_idempotent() {
        let request = EvaluationRequest {
            ground_truth: vec![1.0, 0.0, 1.0, 1.0],
            predictions: vec![1.0, 1.0, 1.0, 0.0],
            task_kind: TaskKind::Classification,
        };
        let first = evaluate(&request).unwrap();
        let second = evaluate(&request).unwrap();
        assert_eq!(first, second);
        // Serialized forms are bit-identical too.
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_report_serde_round_trip() {
        let request = EvaluationRequest {
            ground_truth: vec![1.0, 2.0, 3.0],
            predictions: vec![1.5, 2.5, 2.5],
            task_kind: TaskKind::Regression,
        };
        let report = evaluate(&request).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let decoded: MetricsReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, decoded);
    }
}
