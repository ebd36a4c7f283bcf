/// Email templates
///
/// Subject, HTML, and text bodies for the transactional mail this tier
/// sends. Plain string construction, no template engine.

use crate::email::mailer::Email;

/// Rendered email content
#[derive(Debug, Clone)]
pub struct EmailContent {
    /// Subject line
    pub subject: String,

    /// HTML body
    pub html: String,

    /// Plain-text body
    pub text: String,
}

impl EmailContent {
    /// Addresses the content to a recipient
    pub fn to(self, recipient: &str) -> Email {
        Email {
            to: recipient.to_string(),
            subject: self.subject,
            html: self.html,
            text: self.text,
        }
    }
}

/// Confirmation sent to the OLD address after an email change commits
pub fn email_updated(old_email: &str, new_email: &str) -> EmailContent {
    let subject = "Your email address has been changed".to_string();

    let text = format!(
        "The email address on your FolioLink account was changed from {} to {}.\n\n\
         If you did not request this change, contact support immediately.",
        old_email, new_email
    );

    let html = format!(
        "<p>The email address on your FolioLink account was changed from \
         <strong>{}</strong> to <strong>{}</strong>.</p>\
         <p>If you did not request this change, contact support immediately.</p>",
        old_email, new_email
    );

    EmailContent {
        subject,
        html,
        text,
    }
}

/// Invitation to join a team
pub fn teammate_invite(
    sender_name: &str,
    sender_email: &str,
    team_name: &str,
    url: &str,
) -> EmailContent {
    let subject = format!("You are invited to join {}", team_name);

    let text = format!(
        "{} ({}) has invited you to join the team {} on FolioLink.\n\n\
         Accept the invitation: {}",
        sender_name, sender_email, team_name, url
    );

    let html = format!(
        "<p><strong>{}</strong> ({}) has invited you to join the team \
         <strong>{}</strong> on FolioLink.</p>\
         <p><a href=\"{}\">Accept the invitation</a></p>",
        sender_name, sender_email, team_name, url
    );

    EmailContent {
        subject,
        html,
        text,
    }
}
