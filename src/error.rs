//! Structured error types for the invoice engine.
//!
//! Configuration problems (unknown language, bad color, page geometry that
//! leaves no room for the table) are rejected before anything is drawn.
//! A missing logo is *not* an error: it degrades to no logo.

use thiserror::Error;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// The language code has no label table.
    #[error("Unknown language '{0}': no label table available")]
    UnknownLanguage(String),

    /// An accent color was not `#rgb` or `#rrggbb`.
    #[error("Invalid color '{0}': expected #rgb or #rrggbb")]
    InvalidColor(String),

    /// The page geometry cannot hold the item table.
    #[error("Layout error: {0}")]
    Layout(String),

    /// JSON input failed to parse as a valid invoice document.
    #[error("Failed to parse invoice: {source}{}", hint_suffix(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    /// An image could not be read or decoded.
    #[error("Image error: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for InvoiceError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the invoice schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        InvoiceError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_hint() {
        let err: InvoiceError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.contains("Failed to parse invoice"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn truncated_input_hint() {
        let err: InvoiceError = serde_json::from_str::<serde_json::Value>("{\"a\": ")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }
}
