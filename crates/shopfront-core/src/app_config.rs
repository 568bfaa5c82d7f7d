#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// What the cart does with its optimistic state when a commit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartFailurePolicy {
    /// Leave the optimistic quantity in place and report the error.
    #[default]
    KeepOptimistic,
    /// Restore the last snapshot the server confirmed.
    RevertToConfirmed,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub api_base_url: String,
    pub api_prefix: String,
    pub log_level: String,
    pub auth_token: Option<String>,
    pub request_timeout_ms: u64,
    pub user_agent: String,
    pub cart_debounce_ms: u64,
    pub cart_failure_policy: CartFailurePolicy,
    /// Ordered candidate paths for order creation; tried until one succeeds.
    pub order_create_endpoints: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("api_base_url", &self.api_base_url)
            .field("api_prefix", &self.api_prefix)
            .field("log_level", &self.log_level)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[redacted]"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("user_agent", &self.user_agent)
            .field("cart_debounce_ms", &self.cart_debounce_ms)
            .field("cart_failure_policy", &self.cart_failure_policy)
            .field("order_create_endpoints", &self.order_create_endpoints)
            .finish()
    }
}
