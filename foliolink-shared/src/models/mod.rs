/// Database models for FolioLink
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts
/// - `team`: Teams with billing plans and limit overrides
/// - `verification_token`: Single-use hashed tokens for email flows
/// - `integration`: Installed third-party integrations (Slack)

pub mod integration;
pub mod team;
pub mod user;
pub mod verification_token;
