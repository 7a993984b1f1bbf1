pub mod dashboard;
pub mod domain;
pub mod ingest;
pub mod trigger;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_HISTORY_RANGE: &str = "1y";
    pub const DEFAULT_CHART_BASE_URL: &str = "https://query2.finance.yahoo.com";
    pub const DEFAULT_SUMMARY_BASE_URL: &str = "https://query2.finance.yahoo.com";
    pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
    pub const DEFAULT_USER_AGENT: &str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub default_symbol: String,
        pub history_range: String,
        pub chart_base_url: String,
        pub summary_base_url: String,
        pub cookie_url: String,
        pub user_agent: String,
        pub timeout_secs: u64,
        pub port: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                sentry_dsn: None,
                default_symbol: crate::trigger::DEFAULT_SYMBOL.to_string(),
                history_range: DEFAULT_HISTORY_RANGE.to_string(),
                chart_base_url: DEFAULT_CHART_BASE_URL.to_string(),
                summary_base_url: DEFAULT_SUMMARY_BASE_URL.to_string(),
                cookie_url: DEFAULT_COOKIE_URL.to_string(),
                user_agent: DEFAULT_USER_AGENT.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                port: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();
            let timeout_secs = match non_empty_var("DATA_PROVIDER_TIMEOUT_SECS") {
                Some(s) => s
                    .parse::<u64>()
                    .with_context(|| format!("DATA_PROVIDER_TIMEOUT_SECS is not a number: {s}"))?,
                None => defaults.timeout_secs,
            };

            Ok(Self {
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                default_symbol: non_empty_var("STOCKINFO_DEFAULT_SYMBOL")
                    .unwrap_or(defaults.default_symbol),
                history_range: non_empty_var("STOCKINFO_HISTORY_RANGE")
                    .unwrap_or(defaults.history_range),
                chart_base_url: non_empty_var("YAHOO_CHART_BASE_URL")
                    .unwrap_or(defaults.chart_base_url),
                summary_base_url: non_empty_var("YAHOO_SUMMARY_BASE_URL")
                    .unwrap_or(defaults.summary_base_url),
                cookie_url: non_empty_var("YAHOO_COOKIE_URL").unwrap_or(defaults.cookie_url),
                user_agent: non_empty_var("YAHOO_USER_AGENT").unwrap_or(defaults.user_agent),
                timeout_secs,
                port: non_empty_var("PORT"),
            })
        }

        pub fn port(&self) -> anyhow::Result<u16> {
            match self.port.as_deref() {
                Some(p) => p
                    .parse::<u16>()
                    .with_context(|| format!("PORT is not a valid port: {p}")),
                None => Ok(3000),
            }
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
