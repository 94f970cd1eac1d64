//! Deterministic model-evaluation metrics and chart descriptors.
//!
//! Two pure components:
//!
//! - the **evaluation engine** ([`evaluate`]) turns equal-length ground
//!   truth and prediction sequences into a [`MetricsReport`] for either
//!   regression or classification, with human-readable interpretations;
//! - the **visualization adapter** ([`charts`]) reshapes loosely typed
//!   numeric payloads into declarative, renderer-agnostic
//!   [`ChartDescriptor`]s.
//!
//! Both are stateless, non-blocking, and safe at unbounded concurrency;
//! identical inputs produce bit-identical outputs.

pub mod charts;
pub mod classification;
pub mod error;
pub mod regression;
pub mod report;

// Re-export primary types for convenient access.
pub use charts::{ChartDescriptor, ChartKind, Layout, Series, chart_descriptor, chart_descriptor_for};
pub use error::{ChartError, EvalError};
pub use report::{EvaluationRequest, MetricValue, MetricsReport, TaskKind, evaluate};
