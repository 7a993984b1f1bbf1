pub const DEFAULT_SYMBOL: &str = "INFY.NS";

/// What the user typed into the symbol box, and whether they pressed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInput {
    pub text: String,
    pub fetch: bool,
}

impl SymbolInput {
    pub fn new(text: Option<String>, fetch: bool) -> Self {
        Self::with_default(text, fetch, DEFAULT_SYMBOL)
    }

    pub fn with_default(text: Option<String>, fetch: bool, default_symbol: &str) -> Self {
        Self {
            text: text.unwrap_or_else(|| default_symbol.to_string()),
            fetch,
        }
    }

    /// The symbol to fetch, only when the trigger fired. The text is handed on as typed; the
    /// provider is the only validator.
    pub fn triggered_symbol(&self) -> Option<&str> {
        self.fetch.then_some(self.text.as_str())
    }
}

pub fn is_trigger_value(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_text_falls_back_to_default_symbol() {
        let input = SymbolInput::new(None, false);
        assert_eq!(input.text, "INFY.NS");
        assert_eq!(input.triggered_symbol(), None);
    }

    #[test]
    fn symbol_is_passed_through_untouched_on_trigger() {
        let input = SymbolInput::new(Some("reliance.ns ".to_string()), true);
        assert_eq!(input.triggered_symbol(), Some("reliance.ns "));
    }

    #[test]
    fn no_trigger_means_no_fetch() {
        let input = SymbolInput::new(Some("TCS.NS".to_string()), false);
        assert!(input.triggered_symbol().is_none());
    }

    #[test]
    fn custom_default_symbol() {
        let input = SymbolInput::with_default(None, true, "AAPL");
        assert_eq!(input.triggered_symbol(), Some("AAPL"));
    }

    #[test]
    fn trigger_values() {
        assert!(is_trigger_value("1"));
        assert!(is_trigger_value("TRUE"));
        assert!(is_trigger_value(" on "));
        assert!(!is_trigger_value("0"));
        assert!(!is_trigger_value(""));
    }
}
