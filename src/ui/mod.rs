//! Server-rendered HTML for the chat page.
//!
//! Everything here returns plain `String`s: the full page for `GET /` and the
//! fragments the page swaps in after each call.
//!
//! # Structure
//!
//! - [`app`]: Document shell, stylesheet and page script
//! - [`chat`]: Header controls, transcript, input bar

pub mod app;
pub mod chat;

/// Escape text for use in element content and quoted attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b onclick="x('y')">A & B</b>"#),
            "&lt;b onclick=&quot;x(&#39;y&#39;)&quot;&gt;A &amp; B&lt;/b&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }
}
