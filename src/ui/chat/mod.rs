//! Chat page pieces.
//!
//! Element ids rendered here are what the page script in [`super::app`]
//! hooks into; keep the two in step.

mod header;
mod input_area;
mod message_list;
mod shell;

pub use header::{render_header, render_uploads};
pub use input_area::render_input_area;
pub use message_list::{render_history_banner, render_overlay, render_transcript};
pub use shell::{ChatPage, render_chat_page};
