/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: health check endpoint
/// - `feature_flags`: feature-flag map per team
/// - `limits`: plan limits and usage for a team
/// - `email_change`: email-change request (issues the confirmation token)
/// - `confirm_email_change`: email-change confirmation flow
/// - `invitations`: teammate invitations
/// - `jobs`: signed inbound queue callbacks
/// - `passkeys`: passkey registration

pub mod confirm_email_change;
pub mod email_change;
pub mod feature_flags;
pub mod health;
pub mod invitations;
pub mod jobs;
pub mod limits;
pub mod passkeys;
