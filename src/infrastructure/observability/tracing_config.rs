/// Configuration for tracing initialization.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        // Prod defaults to machine-readable logs; LOG_FORMAT overrides.
        let json_format = std::env::var("LOG_FORMAT")
            .map(|v| v.to_lowercase() == "json")
            .unwrap_or_else(|_| environment.eq_ignore_ascii_case("prod"));
        Self {
            environment,
            json_format,
        }
    }
}
