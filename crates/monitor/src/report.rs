//! Daily summary rendering.
//!
//! Combines the window description with the analyzer's opaque body into
//! one document. Templates are plain strings, so a fresh
//! [`minijinja::Environment`] is created per render call.

use logpulse_core::LogpulseError;

/// Default summary layout.
pub const DEFAULT_TEMPLATE: &str = "\
Daily request summary for {{ log_path }}
Window: {{ window_start }} to {{ window_end }}
Analyzer: {{ command }}

{{ body }}
";

/// Context data available to summary templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SummaryContext {
    pub log_path: String,
    /// RFC 3339 window bounds.
    pub window_start: String,
    pub window_end: String,
    /// Description of the analyzer invocation.
    pub command: String,
    /// Report body produced by the analysis engine (opaque).
    pub body: String,
}

/// Renders summary documents using minijinja.
#[derive(Debug)]
pub struct SummaryRenderer {
    _private: (),
}

impl SummaryRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`LogpulseError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(&self, template_str: &str, ctx: &SummaryContext) -> Result<String, LogpulseError> {
        let env = minijinja::Environment::new();
        env.render_str(template_str, ctx)
            .map_err(|e| LogpulseError::Template(e.to_string()))
    }

    /// Render with the built-in layout.
    pub fn render_default(&self, ctx: &SummaryContext) -> Result<String, LogpulseError> {
        self.render(DEFAULT_TEMPLATE, ctx)
    }
}

impl Default for SummaryRenderer {
    fn default() -> Self {
        Self::new()
    }
}
