//! Query function registry
//!
//! Wraps a JMESPath runtime carrying the builtin function table plus the
//! flattening `sum`. Built once at startup and only read afterwards.

use jmespath::{Rcvar, Runtime};
use serde_json::Value;

pub mod functions;
pub use functions::FlatSum;

/// Immutable JMESPath runtime shared by every evaluation.
pub struct QueryRuntime {
    runtime: Runtime,
}

impl QueryRuntime {
    pub fn new() -> Self {
        let mut runtime = Runtime::new();
        runtime.register_builtin_functions();
        // replaces the builtin `sum`
        runtime.register_function("sum", Box::new(FlatSum));

        Self { runtime }
    }

    /// Move the runtime into process-lifetime storage.
    ///
    /// The runtime is built once and handed out by shared reference, so a
    /// leaked `&'static` can be captured by every request without an `Arc`.
    pub fn into_static(self) -> &'static QueryRuntime {
        Box::leak(Box::new(self))
    }

    /// Compile and evaluate `expression` against `root`.
    ///
    /// Returns the underlying error message on syntax or runtime failures.
    /// Paths that do not exist evaluate to `null`.
    pub fn evaluate(&self, expression: &str, root: &Rcvar) -> Result<Value, String> {
        let compiled = self
            .runtime
            .compile(expression)
            .map_err(|e| e.to_string())?;

        let result = compiled.search(root.clone()).map_err(|e| e.to_string())?;

        serde_json::to_value(&*result).map_err(|e| e.to_string())
    }
}

impl Default for QueryRuntime {
    fn default() -> Self {
        Self::new()
    }
}
