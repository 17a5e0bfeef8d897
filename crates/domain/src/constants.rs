//! Connector constants
//!
//! Centralized location for provider limits and protocol defaults used
//! throughout the connector.

// Provider endpoints
pub const DEFAULT_BASE_URL: &str = "https://api.lightspeedapp.com";
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://cloud.lightspeedapp.com/auth/oauth/token";
pub const ACCOUNT_PATH_PREFIX: &str = "/API/V3/Account";
pub const ORDER_ENDPOINT: &str = "/Order.json";
pub const ORDER_LINE_ENDPOINT: &str = "/OrderLine.json";

// Token lifecycle
pub const TOKEN_BUFFER_SECONDS: i64 = 120;
pub const DEFAULT_TOKEN_EXPIRATION_SECS: i64 = 3600;
/// Provider answer (HTTP 200) meaning "the token you hold is still good".
pub const TOKEN_NOT_EXPIRED_SIGNAL: &str = "Rate limit exceeded: access_token not expired";

// Rate limiting: the provider allows 3 req/s, we stay at 2 req/s.
pub const RATE_LIMIT_REQUESTS_PER_SECOND: u32 = 3;
pub const MIN_REQUEST_INTERVAL_MS: u64 = 500;
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// Retry bounds
pub const BACKOFF_FACTOR: f64 = 2.0;
pub const BACKOFF_INITIAL_DELAY_SECS: u64 = 1;
pub const MAX_RETRY_TIME_SECS: u64 = 300;
pub const MAX_REQUEST_ATTEMPTS: u32 = 5;
pub const MAX_AUTH_ATTEMPTS: u32 = 10;

// HTTP
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const ERROR_BODY_PREVIEW_CHARS: usize = 200;
pub const ERROR_LOG_PREVIEW_CHARS: usize = 2000;

// Streams
pub const BUY_ORDERS_STREAM: &str = "BuyOrders";
