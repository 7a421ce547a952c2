//! Transcript, typing indicator, indexing overlay and history banner.

use crate::session::ChatMessage;
use crate::ui::escape;

/// Placeholder shown after the last message while an answer is pending.
pub(crate) const TYPING_INDICATOR: &str = r#"<div id="typing" class="msg assistant typing" aria-label="Assistant is typing"><div class="dots"><span></span><span></span><span></span></div></div>"#;

/// The whole transcript, oldest first.
///
/// Ends with `#transcript-end`, which the page script scrolls into view
/// after every swap.
pub fn render_transcript(messages: &[ChatMessage], is_asking: bool) -> String {
    let mut html = String::from(r#"<main id="transcript" class="chat-panel" aria-live="polite">"#);
    for message in messages {
        html.push_str(&render_message(message));
    }
    if is_asking {
        html.push_str(TYPING_INDICATOR);
    }
    html.push_str(r#"<div id="transcript-end"></div></main>"#);
    html
}

fn render_message(message: &ChatMessage) -> String {
    format!(
        r#"<div class="msg {}">{}</div>"#,
        message.sender.as_str(),
        escape(&message.text)
    )
}

/// Full-screen spinner that blocks the page while documents are indexed.
pub fn render_overlay(active: bool) -> String {
    let hidden = if active { "" } else { " hidden" };
    format!(r#"<div id="overlay" class="overlay"{hidden}><div class="spinner"></div></div>"#)
}

/// Non-blocking banner explaining why the transcript started empty.
pub fn render_history_banner(notice: Option<&str>) -> String {
    notice.map_or_else(String::new, |text| {
        format!(r#"<div id="history-banner" class="banner" role="status">{}</div>"#, escape(text))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_in_order_with_sender_classes() {
        let html = render_transcript(
            &[ChatMessage::user("Q1"), ChatMessage::assistant("A1")],
            false,
        );
        let user = html.find(r#"<div class="msg user">Q1</div>"#).unwrap();
        let assistant = html.find(r#"<div class="msg assistant">A1</div>"#).unwrap();
        assert!(user < assistant);
        assert!(!html.contains("typing"));
        assert!(html.ends_with(r#"<div id="transcript-end"></div></main>"#));
    }

    #[test]
    fn test_typing_indicator_follows_last_message() {
        let html = render_transcript(&[ChatMessage::user("hi")], true);
        let user = html.find("msg user").unwrap();
        let typing = html.find(r#"id="typing""#).unwrap();
        let end = html.find("transcript-end").unwrap();
        assert!(user < typing && typing < end);
    }

    #[test]
    fn test_message_text_escaped() {
        let html = render_transcript(&[ChatMessage::assistant("<script>x</script>")], false);
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_overlay_and_banner() {
        assert!(render_overlay(false).contains(" hidden>"));
        assert!(!render_overlay(true).contains("hidden"));
        assert_eq!(render_history_banner(None), "");
        assert!(render_history_banner(Some("down")).contains(">down</div>"));
    }
}
