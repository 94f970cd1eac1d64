//! Snippet executor: bounded, cancellable runs of untrusted lesson scripts.
//!
//! [`SnippetExecutor::execute`] is total — it never returns an error.
//! Every failure mode (syntax, runtime, resource, timeout) is folded into
//! the returned [`ExecutionResult`], so transport layers can serialize the
//! result without a separate error path.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SandboxLimits;
use crate::error::SnippetError;
use crate::interp::Interpreter;
use crate::parser;
use crate::value::Value;

/// A caller-constructed request to run one snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub source: String,
    /// Wall-clock budget in seconds; `None` (or 0) falls back to the
    /// executor's default limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u64>,
}

impl ExecutionRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            time_limit_secs: None,
        }
    }

    pub fn with_time_limit_secs(mut self, secs: u64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    fn time_limit(&self, limits: &SandboxLimits) -> Duration {
        match self.time_limit_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => limits.default_time_limit,
        }
    }
}

/// Structured failure information carried inside an [`ExecutionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error class name, e.g. `DivisionByZero` or `Timeout`.
    pub kind: String,
    pub message: String,
    /// Formatted single-frame trace naming the failing source line.
    pub trace: String,
}

impl ErrorDetail {
    fn from_snippet(err: &SnippetError) -> Self {
        let kind = err.kind.as_str().to_string();
        let trace = match err.line {
            Some(line) => format!(
                "Traceback (most recent call last):\n  line {line}, in <snippet>\n{kind}: {}",
                err.message
            ),
            None => format!("{kind}: {}", err.message),
        };
        Self {
            kind,
            message: err.message.clone(),
            trace,
        }
    }

    fn timeout(limit: Duration) -> Self {
        let message = format!(
            "execution exceeded the time limit of {}s",
            limit.as_secs()
        );
        Self {
            kind: "Timeout".to_string(),
            trace: format!("Timeout: {message}"),
            message,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: "InternalError".to_string(),
            trace: format!("InternalError: {message}"),
            message,
        }
    }
}

/// The complete, immutable outcome of one snippet run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub succeeded: bool,
    /// Everything the snippet printed, captured verbatim.
    pub stdout: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    /// Display strings for every surviving top-level binding.
    pub bindings: BTreeMap<String, String>,
}

/// Executes untrusted snippets inside a fresh, disposable interpreter.
///
/// The executor itself is cheap and stateless; it can be shared freely and
/// used from concurrent tasks. Each call gets its own interpreter, output
/// buffer, and cancellation flag.
pub struct SnippetExecutor {
    limits: SandboxLimits,
}

impl SnippetExecutor {
    pub fn new(limits: SandboxLimits) -> Self {
        Self { limits }
    }

    pub fn with_defaults() -> Self {
        Self::new(SandboxLimits::default())
    }

    pub fn limits(&self) -> &SandboxLimits {
        &self.limits
    }

    /// Run one snippet to completion, error, or deadline.
    ///
    /// The interpreter runs on a blocking worker; on deadline expiry the
    /// cancellation flag is raised and the worker is awaited to completion
    /// (it observes the flag at its next fuel checkpoint), so no snippet
    /// activity survives this call.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        let limit = request.time_limit(&self.limits);
        debug!(
            source_bytes = request.source.len(),
            limit_secs = limit.as_secs(),
            "executing snippet"
        );

        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);
        let limits = self.limits.clone();
        let source = request.source.clone();

        let mut handle =
            tokio::task::spawn_blocking(move || run_snippet(&source, &limits, worker_cancel));

        match tokio::time::timeout(limit, &mut handle).await {
            Ok(Ok(outcome)) => outcome.into_result(),
            Ok(Err(join_err)) => ExecutionResult {
                succeeded: false,
                stdout: String::new(),
                error: Some(ErrorDetail::internal(join_err.to_string())),
                bindings: BTreeMap::new(),
            },
            Err(_elapsed) => {
                cancel.store(true, Ordering::Relaxed);
                // Drain the worker so nothing keeps running after we return.
                let stdout = match handle.await {
                    Ok(outcome) => outcome.stdout,
                    Err(_) => String::new(),
                };
                ExecutionResult {
                    succeeded: false,
                    stdout,
                    error: Some(ErrorDetail::timeout(limit)),
                    bindings: BTreeMap::new(),
                }
            }
        }
    }
}

struct RunOutcome {
    stdout: String,
    bindings: BTreeMap<String, String>,
    error: Option<SnippetError>,
}

impl RunOutcome {
    fn into_result(self) -> ExecutionResult {
        let succeeded = self.error.is_none();
        ExecutionResult {
            succeeded,
            stdout: self.stdout,
            error: self.error.as_ref().map(ErrorDetail::from_snippet),
            bindings: self.bindings,
        }
    }
}

/// Parse and interpret one snippet on the current (blocking) thread.
fn run_snippet(source: &str, limits: &SandboxLimits, cancel: Arc<AtomicBool>) -> RunOutcome {
    if source.len() > limits.max_source_bytes {
        return RunOutcome {
            stdout: String::new(),
            bindings: BTreeMap::new(),
            error: Some(SnippetError::syntax(
                format!(
                    "snippet of {} bytes exceeds the limit of {}",
                    source.len(),
                    limits.max_source_bytes
                ),
                1,
            )),
        };
    }

    let program = match parser::parse(source) {
        Ok(program) => program,
        Err(err) => {
            return RunOutcome {
                stdout: String::new(),
                bindings: BTreeMap::new(),
                error: Some(err),
            };
        }
    };

    let mut interp = Interpreter::new(limits.clone(), cancel);
    let run = interp.run(&program);
    let (stdout, env) = interp.into_parts();
    match run {
        Ok(()) => RunOutcome {
            stdout,
            bindings: snapshot(&env, limits),
            error: None,
        },
        Err(err) => RunOutcome {
            stdout,
            bindings: BTreeMap::new(),
            error: Some(err),
        },
    }
}

/// Render every top-level binding to a display string.
///
/// Underscore-prefixed names are treated as private and skipped. A value
/// whose rendering exceeds the budget degrades to a placeholder for that
/// binding only; sibling bindings are unaffected.
fn snapshot(env: &BTreeMap<String, Value>, limits: &SandboxLimits) -> BTreeMap<String, String> {
    env.iter()
        .filter(|(name, _)| !name.starts_with('_'))
        .map(|(name, value)| {
            let rendered = value
                .render(limits.max_render_bytes)
                .unwrap_or_else(|| format!("<unrenderable: {}>", value.summary()));
            (name.clone(), rendered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn executor() -> SnippetExecutor {
        SnippetExecutor::with_defaults()
    }

    #[tokio::test]
    async fn test_print_capture() {
        let result = executor()
            .execute(&ExecutionRequest::new("print(\"x\")\nprint(\"y\")"))
            .await;
        assert!(result.succeeded);
        assert_eq!(result.stdout, "x\ny\n");
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_bindings_snapshot() {
        let result = executor()
            .execute(&ExecutionRequest::new(
                "x = 42\nys = [1, 2, 3]\n_private = 7\nname = \"ada\"",
            ))
            .await;
        assert!(result.succeeded);
        assert_eq!(result.bindings.get("x"), Some(&"42".to_string()));
        assert_eq!(result.bindings.get("ys"), Some(&"[1, 2, 3]".to_string()));
        assert_eq!(result.bindings.get("name"), Some(&"ada".to_string()));
        assert!(!result.bindings.contains_key("_private"));
    }

    #[tokio::test]
    async fn test_division_by_zero_keeps_prior_stdout() {
        let result = executor()
            .execute(&ExecutionRequest::new("print(\"before\")\nx = 1 / 0"))
            .await;
        assert!(!result.succeeded);
        assert_eq!(result.stdout, "before\n");
        let error = result.error.expect("error detail");
        assert_eq!(error.kind, "DivisionByZero");
        assert!(error.message.contains("division by zero"));
        assert!(error.trace.contains("line 2"));
    }

    #[tokio::test]
    async fn test_syntax_error() {
        let result = executor().execute(&ExecutionRequest::new("x = = 1")).await;
        assert!(!result.succeeded);
        assert_eq!(result.error.expect("error detail").kind, "SyntaxError");
        assert!(result.bindings.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_enforced() {
        let executor = SnippetExecutor::new(
            // Effectively unlimited fuel so the wall clock is the binding
            // constraint.
            SandboxLimits::default().with_fuel_limit(u64::MAX),
        );
        let request = ExecutionRequest::new("while true { }").with_time_limit_secs(1);

        let start = Instant::now();
        let result = executor.execute(&request).await;
        let elapsed = start.elapsed();

        assert!(!result.succeeded);
        assert_eq!(result.error.expect("error detail").kind, "Timeout");
        assert!(
            elapsed < Duration::from_secs(3),
            "timeout took too long: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_timeout_keeps_prior_stdout() {
        let executor =
            SnippetExecutor::new(SandboxLimits::default().with_fuel_limit(u64::MAX));
        let request =
            ExecutionRequest::new("print(\"started\")\nwhile true { }").with_time_limit_secs(1);

        let result = executor.execute(&request).await;
        assert!(!result.succeeded);
        assert_eq!(result.stdout, "started\n");
    }

    #[tokio::test]
    async fn test_fuel_exhaustion_reported() {
        let executor = SnippetExecutor::new(SandboxLimits::default().with_fuel_limit(1_000));
        let result = executor
            .execute(&ExecutionRequest::new("while true { }"))
            .await;
        assert!(!result.succeeded);
        assert_eq!(result.error.expect("error detail").kind, "OutOfFuel");
    }

    #[tokio::test]
    async fn test_unrenderable_binding_degrades() {
        let executor = SnippetExecutor::new(SandboxLimits::default().with_render_limit(8));
        let result = executor
            .execute(&ExecutionRequest::new("small = 1\nbig = zeros(100)"))
            .await;
        assert!(result.succeeded);
        assert_eq!(result.bindings.get("small"), Some(&"1".to_string()));
        assert_eq!(
            result.bindings.get("big"),
            Some(&"<unrenderable: array of 100 elements>".to_string())
        );
    }

    #[tokio::test]
    async fn test_oversized_source_rejected() {
        let executor = SnippetExecutor::new(SandboxLimits::default().with_source_limit(10));
        let result = executor
            .execute(&ExecutionRequest::new("x = 1 + 2 + 3 + 4"))
            .await;
        assert!(!result.succeeded);
        let error = result.error.expect("error detail");
        assert_eq!(error.kind, "SyntaxError");
        assert!(error.message.contains("exceeds the limit"));
    }

    #[tokio::test]
    async fn test_determinism() {
        let request = ExecutionRequest::new(
            "xs = linspace(0, 10, 11)\nprint(\"mean:\", mean(xs))\ntotal = sum(xs)",
        );
        let first = executor().execute(&request).await;
        let second = executor().execute(&request).await;
        assert_eq!(first, second);
        assert!(first.succeeded);
        assert_eq!(first.stdout, "mean: 5\n");
    }

    #[tokio::test]
    async fn test_result_serde_round_trip() {
        let result = executor()
            .execute(&ExecutionRequest::new("x = 1\nprint(x)"))
            .await;
        let json = serde_json::to_string(&result).unwrap();
        let decoded: ExecutionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, decoded);
    }

    #[tokio::test]
    async fn test_zero_time_limit_falls_back_to_default() {
        let request = ExecutionRequest::new("x = 1").with_time_limit_secs(0);
        let result = executor().execute(&request).await;
        assert!(result.succeeded);
    }
}
