/// Slack integration
///
/// Fan-out of document activity events to the Slack channels a team has
/// configured. The dispatcher is deliberately fail-silent: a missing Slack
/// app configuration, a team without the integration installed, or a
/// delivery failure must never break the document view or download that
/// triggered the notification.
///
/// # Modules
///
/// - `client`: Slack Web API client (chat.postMessage)
/// - `events`: event types and the notification dispatcher
/// - `templates`: Block Kit message construction per event type

pub mod client;
pub mod events;
pub mod templates;

// Re-export common types for convenience
pub use client::{SlackApi, SlackError, SlackSettings};
pub use events::{SlackEventData, SlackEventPayload, SlackEventType, SlackNotifier};
pub use templates::SlackMessage;
