//! The assembled chat page.

use crate::session::ChatSession;
use crate::ui::app::html_shell;

use super::{
    render_header, render_history_banner, render_input_area, render_overlay, render_transcript,
    render_uploads,
};

/// Everything the page needs besides the session itself.
#[derive(Debug, Clone, Copy)]
pub struct ChatPage<'a> {
    /// Title shown in the header and the browser tab.
    pub title: &'a str,
    pub session: &'a ChatSession,
    pub suggestions: &'a [String],
}

/// Render the page for one client instance.
///
/// Layout, top to bottom:
/// - overlay (hidden unless indexing)
/// - header with model picker and upload controls
/// - current file selection and any history banner
/// - transcript
/// - suggestions and input bar
pub fn render_chat_page(page: &ChatPage<'_>) -> String {
    let session = page.session;
    let body = [
        render_overlay(session.is_indexing()),
        render_header(page.title, session.model(), session.is_indexing()),
        render_uploads(&session.pending_uploads()),
        render_history_banner(session.history_notice().as_deref()),
        render_transcript(&session.messages(), session.is_asking()),
        render_input_area(&session.input(), session.is_asking(), page.suggestions),
    ]
    .concat();

    html_shell(page.title, session.id(), &body)
}
