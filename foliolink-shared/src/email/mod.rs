/// Transactional email and mailing-list membership
///
/// Both surfaces are capabilities with live and disabled variants. In
/// self-hosted installs without an email provider the disabled mailer logs
/// the message it would have sent (including invite URLs, so an operator
/// can still forward them by hand) instead of failing the calling flow.
///
/// # Modules
///
/// - `mailer`: transactional send
/// - `audience`: mailing-list subscribe/unsubscribe
/// - `templates`: HTML/text bodies for the flows in this tier

pub mod audience;
pub mod mailer;
pub mod templates;

// Re-export common types for convenience
pub use audience::Audience;
pub use mailer::{Email, EmailSettings, MailError, Mailer};
pub use templates::EmailContent;
