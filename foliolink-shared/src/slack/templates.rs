/// Slack message templates
///
/// Builds the Block Kit payload for each event type: a bold headline plus a
/// context line with whatever identifying fields the event carried. Missing
/// payload fields fall back to generic wording rather than suppressing the
/// notification.

use crate::slack::events::{SlackEventData, SlackEventType};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

/// A renderable Slack message: fallback text plus Block Kit blocks
#[derive(Debug, Clone, Serialize)]
pub struct SlackMessage {
    /// Plain-text fallback shown in notifications
    pub text: String,

    /// Block Kit blocks
    pub blocks: Vec<JsonValue>,
}

/// Builds the message for an event
pub fn build_message(event: &SlackEventData) -> SlackMessage {
    let headline = match event.event_type {
        SlackEventType::DocumentView => "Document viewed",
        SlackEventType::DataroomAccess => "Dataroom accessed",
        SlackEventType::DocumentDownload => "Document downloaded",
    };

    let subject = match event.event_type {
        SlackEventType::DataroomAccess => event
            .payload
            .dataroom_name
            .as_deref()
            .unwrap_or("a dataroom"),
        _ => event
            .payload
            .document_name
            .as_deref()
            .unwrap_or("a document"),
    };

    let viewer = event
        .payload
        .viewer_email
        .as_deref()
        .unwrap_or("Someone");

    let text = format!("{}: {} by {}", headline, subject, viewer);

    let mut context_parts = vec![format!("*{}* by {}", subject, viewer)];
    if let Some(link_id) = &event.payload.link_id {
        context_parts.push(format!("link `{}`", link_id));
    }

    let blocks = vec![
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(":page_facing_up: *{}*", headline),
            }
        }),
        json!({
            "type": "context",
            "elements": [{
                "type": "mrkdwn",
                "text": context_parts.join(" · "),
            }]
        }),
    ];

    SlackMessage { text, blocks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::events::SlackEventPayload;
    use uuid::Uuid;

    fn event(event_type: SlackEventType, payload: SlackEventPayload) -> SlackEventData {
        SlackEventData {
            team_id: Uuid::new_v4(),
            event_type,
            payload,
        }
    }

    #[test]
    fn test_document_view_message() {
        let message = build_message(&event(
            SlackEventType::DocumentView,
            SlackEventPayload {
                document_name: Some("Q3 Financials".to_string()),
                viewer_email: Some("cfo@example.com".to_string()),
                ..Default::default()
            },
        ));

        assert!(message.text.contains("Document viewed"));
        assert!(message.text.contains("Q3 Financials"));
        assert!(message.text.contains("cfo@example.com"));
        assert_eq!(message.blocks.len(), 2);
    }

    #[test]
    fn test_dataroom_access_uses_dataroom_name() {
        let message = build_message(&event(
            SlackEventType::DataroomAccess,
            SlackEventPayload {
                dataroom_name: Some("Series B".to_string()),
                document_name: Some("ignored".to_string()),
                ..Default::default()
            },
        ));

        assert!(message.text.contains("Dataroom accessed"));
        assert!(message.text.contains("Series B"));
        assert!(!message.text.contains("ignored"));
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let message = build_message(&event(
            SlackEventType::DocumentDownload,
            SlackEventPayload::default(),
        ));

        assert!(message.text.contains("Document downloaded"));
        assert!(message.text.contains("a document"));
        assert!(message.text.contains("Someone"));
    }

    #[test]
    fn test_link_id_appears_in_context() {
        let message = build_message(&event(
            SlackEventType::DocumentView,
            SlackEventPayload {
                link_id: Some("lnk_123".to_string()),
                ..Default::default()
            },
        ));

        let context = serde_json::to_string(&message.blocks[1]).unwrap();
        assert!(context.contains("lnk_123"));
    }
}
