//! Sandboxed execution of untrusted lesson snippets.
//!
//! Runs learner-submitted numeric snippets in an isolated, purpose-built
//! interpreter with resource limits and a wall-clock deadline. The snippet
//! language has no filesystem, network, environment, or reflection surface;
//! the only reachable host functionality is the allow-listed numeric
//! builtin table.
//!
//! ## Architecture
//!
//! ```text
//! SnippetExecutor
//!     │
//!     ├── parser (lexer → AST)
//!     │       └── SyntaxError surfaced as result data
//!     │
//!     ├── Interpreter (per-request, disposable)
//!     │       ├── Fuel metering (step budget)
//!     │       ├── Cancellation checkpoint (wall-clock deadline)
//!     │       ├── Output capture (bounded stdout buffer)
//!     │       └── Builtin table (allow-listed numeric surface)
//!     │
//!     └── SandboxLimits
//!             ├── max_fuel, max_array_len, max_output_bytes
//!             └── default wall-clock limit
//! ```
//!
//! `execute` is total: every failure — syntax, runtime, resource, timeout —
//! comes back inside the [`ExecutionResult`], never as an `Err`.

pub mod builtins;
pub mod config;
pub mod error;
pub mod executor;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod value;

// Re-export primary types for convenient access.
pub use config::SandboxLimits;
pub use error::{SnippetError, SnippetErrorKind};
pub use executor::{ErrorDetail, ExecutionRequest, ExecutionResult, SnippetExecutor};
pub use value::Value;

/// Create a [`SnippetExecutor`] with default limits.
pub fn create_executor() -> SnippetExecutor {
    SnippetExecutor::with_defaults()
}

/// Create a [`SnippetExecutor`] with custom limits.
pub fn create_executor_with_limits(limits: SandboxLimits) -> SnippetExecutor {
    SnippetExecutor::new(limits)
}

/// Check that `source` parses, without executing it.
pub fn validate_source(source: &str) -> Result<(), SnippetError> {
    parser::parse(source).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_executor() {
        let executor = create_executor();
        assert_eq!(
            executor.limits().max_fuel,
            SandboxLimits::default().max_fuel
        );
    }

    #[test]
    fn test_create_executor_with_limits() {
        let executor = create_executor_with_limits(SandboxLimits::new().with_fuel_limit(42));
        assert_eq!(executor.limits().max_fuel, 42);
    }

    #[test]
    fn test_validate_valid_source() {
        assert!(validate_source("x = mean([1, 2, 3])").is_ok());
    }

    #[test]
    fn test_validate_invalid_source() {
        let err = validate_source("while { }").unwrap_err();
        assert_eq!(err.kind, SnippetErrorKind::Syntax);
    }

    #[tokio::test]
    async fn test_end_to_end_execution() {
        let executor = create_executor();
        let request = ExecutionRequest::new(
            "xs = [1, 2, 3, 4]\nprint(\"sum:\", sum(xs))\naverage = mean(xs)",
        );
        let result = executor.execute(&request).await;

        assert!(result.succeeded);
        assert_eq!(result.stdout, "sum: 10\n");
        assert_eq!(result.bindings.get("average"), Some(&"2.5".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_isolated() {
        let executor = std::sync::Arc::new(create_executor());
        let mut handles = Vec::new();
        for i in 0..8 {
            let executor = std::sync::Arc::clone(&executor);
            handles.push(tokio::spawn(async move {
                let request =
                    ExecutionRequest::new(format!("x = {i}\nprint(\"value\", x)"));
                (i, executor.execute(&request).await)
            }));
        }
        for handle in handles {
            let (i, result) = handle.await.expect("task join");
            assert!(result.succeeded);
            assert_eq!(result.stdout, format!("value {i}\n"));
            assert_eq!(result.bindings.get("x"), Some(&i.to_string()));
        }
    }
}
