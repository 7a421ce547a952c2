//! Header bar: title, model picker, PDF picker and the Index button.

use std::fmt::Write;

use crate::backend::PendingUpload;
use crate::model::ModelId;
use crate::ui::escape;

/// Header with the session's current model selected.
pub fn render_header(title: &str, selected: ModelId, is_indexing: bool) -> String {
    let mut options = String::new();
    for model in ModelId::ALL {
        let marker = if model == selected { " selected" } else { "" };
        let _ = write!(
            options,
            r#"<option value="{}"{marker}>{}</option>"#,
            model.as_str(),
            model.label()
        );
    }

    let (index_label, disabled) = if is_indexing {
        ("Indexing…", " disabled")
    } else {
        ("Index", "")
    };

    format!(
        r#"<header class="header">
    <h1>{title}</h1>
    <div class="controls">
        <select id="model" name="model" aria-label="Model">{options}</select>
        <label for="files" class="upload-btn">📁 Upload PDFs</label>
        <input id="files" type="file" name="files" multiple accept=".pdf" hidden>
        <button id="index-btn" class="btn" type="button"{disabled}>{index_label}</button>
    </div>
</header>"#,
        title = escape(title),
    )
}

/// The current file selection, shown under the header.
pub fn render_uploads(files: &[PendingUpload]) -> String {
    if files.is_empty() {
        return r#"<ul id="uploads" class="uploads"></ul>"#.to_string();
    }
    let mut items = String::new();
    for file in files {
        let _ = write!(
            items,
            "<li>{} <span class=\"size\">({} KB)</span></li>",
            escape(&file.file_name),
            file.size().div_ceil(1024)
        );
    }
    format!(r#"<ul id="uploads" class="uploads">{items}</ul>"#)
}
