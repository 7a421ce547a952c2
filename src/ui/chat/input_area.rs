//! Question box, Send button and suggested questions.

use std::fmt::Write;

use crate::ui::escape;

/// Input bar. Suggestions submit their text as a prefilled question.
pub fn render_input_area(input: &str, is_asking: bool, suggestions: &[String]) -> String {
    let mut chips = String::new();
    if !suggestions.is_empty() {
        chips.push_str(r#"<div class="suggestions">"#);
        for question in suggestions {
            let question = escape(question);
            let _ = write!(
                chips,
                r#"<button type="button" class="suggestion" data-question="{question}">{question}</button>"#
            );
        }
        chips.push_str("</div>");
    }

    let disabled = if is_asking { " disabled" } else { "" };
    format!(
        r#"{chips}<footer class="input-bar">
    <form id="ask-form" class="ask-form" autocomplete="off">
        <input id="question" name="question" type="text" class="text-input" placeholder="Ask me anything…" value="{input}">
        <button id="send-btn" class="btn" type="submit"{disabled}>Send</button>
    </form>
</footer>"#,
        input = escape(input),
    )
}
