//! CLI output formatting
//!
//! Every command renders through the same small surface: a one-line
//! outcome (`success`/`error`), indented detail lines (`info`), and a
//! structured payload for `--json` consumers (`print_json`).

/// Output format selector, derived from the global `--json` flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    /// Whether structured JSON output was requested.
    pub fn is_json(self) -> bool {
        self == OutputFormat::Json
    }
}

/// Trait for rendering command results
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &serde_json::Value);
}

/// Checkmark-and-indentation renderer for terminals
struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn print_json(&self, _value: &serde_json::Value) {
        // Structured payloads are only rendered in JSON mode.
    }
}

/// One-JSON-document-per-command renderer for scripts
struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }
    fn error(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"success": false, "error": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}

/// Picks the renderer for the requested format.
pub fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    if format.is_json() {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_json() {
        assert!(OutputFormat::Json.is_json());
        assert!(!OutputFormat::Human.is_json());
    }
}
