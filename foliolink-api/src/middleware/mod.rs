/// Middleware modules for the API server
///
/// - `rate_limit`: per-client sliding-window rate limiting
/// - `security`: security response headers

pub mod rate_limit;
pub mod security;
