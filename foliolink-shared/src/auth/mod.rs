/// Authentication utilities
///
/// # Modules
///
/// - `token`: single-use verification tokens and the email-change request
/// - `session`: HS256 session token create/validate
/// - `checksum`: HMAC link checksums

pub mod checksum;
pub mod session;
pub mod token;
