//! Document shell, stylesheet and page script.
//!
//! No external assets: the stylesheet and script are inlined so the page works
//! from a bare `GET /`.

use crate::ui::escape;

/// Wrap page content in the HTML document.
///
/// The session id is published on `<body data-session-id>` for the script.
pub fn html_shell(title: &str, session_id: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Document question answering">
    <title>{title}</title>
    <style>{STYLES}</style>
</head>
<body data-session-id="{session_id}">
<div class="app">
{body}
</div>
<script>{SCRIPT}</script>
</body>
</html>"#,
        title = escape(title),
        session_id = escape(session_id),
    )
}

const STYLES: &str = r"
:root {
    --primary: #3b82f6;
    --primary-light: #bfdbfe;
    --primary-dark: #1e40af;
    --bg: #eff6ff;
    --text: #1e40af;
}
body, html { margin: 0; padding: 0; }
.app {
    display: flex; flex-direction: column; height: 100vh;
    background: var(--bg); color: var(--text);
    font-family: system-ui, sans-serif;
}
.overlay {
    position: fixed; inset: 0; z-index: 999;
    background: rgba(255,255,255,0.8);
    display: flex; align-items: center; justify-content: center;
}
.overlay[hidden] { display: none; }
.spinner {
    width: 48px; height: 48px; border-radius: 50%;
    border: 6px solid var(--primary-light); border-top-color: var(--primary);
    animation: spin 1s linear infinite;
}
@keyframes spin { to { transform: rotate(360deg); } }
.header {
    display: flex; justify-content: space-between; align-items: center;
    padding: 0.75rem 1rem; background: var(--primary); color: white;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
}
.header h1 { margin: 0; font-size: 1.25rem; }
.controls { display: flex; gap: 0.5rem; align-items: center; }
.controls select, .upload-btn, .btn {
    padding: 0.4rem 0.75rem; border: none; border-radius: 0.375rem;
    background: var(--primary-light); color: var(--primary-dark);
    font-size: 0.9rem; font-weight: 500; cursor: pointer;
}
.btn[disabled] { opacity: 0.5; cursor: not-allowed; }
.upload-btn:hover { background: var(--primary-dark); color: white; }
.uploads { margin: 0; padding: 0.25rem 1rem; list-style: none; font-size: 0.85rem; }
.uploads li { display: inline-block; margin-right: 1rem; }
.banner { margin: 0.5rem 1rem 0; padding: 0.5rem 0.75rem; border-radius: 0.375rem; background: #fef3c7; color: #92400e; }
.chat-panel {
    flex: 1; overflow-y: auto; padding: 1rem;
    display: flex; flex-direction: column; gap: 0.75rem;
}
.msg {
    max-width: 70%; padding: 0.75rem 1rem; border-radius: 0.75rem;
    box-shadow: 0 2px 4px rgba(0,0,0,0.05);
    white-space: pre-wrap; overflow-wrap: anywhere;
}
.msg.user {
    align-self: flex-end; background: var(--primary); color: white;
    border-bottom-right-radius: 0.2rem;
}
.msg.assistant {
    align-self: flex-start; background: white; color: var(--text);
    border-bottom-left-radius: 0.2rem;
}
.dots { display: flex; gap: 0.4rem; }
.dots span {
    width: 8px; height: 8px; border-radius: 50%; background: var(--primary);
    animation: bounce 1s infinite ease-in-out;
}
.dots span:nth-child(2) { animation-delay: 0.2s; }
.dots span:nth-child(3) { animation-delay: 0.4s; }
@keyframes bounce { 0%, 80%, 100% { transform: scale(0); } 40% { transform: scale(1); } }
.suggestions { display: flex; flex-wrap: wrap; gap: 0.5rem; padding: 0 1rem 0.5rem; }
.suggestion {
    border: 1px solid var(--primary-light); background: white; color: var(--primary-dark);
    border-radius: 9999px; padding: 0.3rem 0.8rem; cursor: pointer;
}
.input-bar { padding: 0.75rem 1rem; background: white; box-shadow: 0 -2px 4px rgba(0,0,0,0.1); }
.ask-form { display: flex; gap: 0.5rem; }
.text-input {
    flex: 1; padding: 0.75rem 1rem; font-size: 1rem; outline: none;
    border: 1px solid var(--primary-light); border-radius: 9999px;
}
.text-input:focus { border-color: var(--primary); }
";

const SCRIPT: &str = r"
(() => {
    const sessionId = document.body.dataset.sessionId;
    const base = '/chat/' + encodeURIComponent(sessionId);
    const $ = (sel) => document.querySelector(sel);

    const scrollToEnd = () => $('#transcript-end')?.scrollIntoView({ behavior: 'smooth' });

    const post = (path, body) => fetch(base + path, { method: 'POST', body });

    const bubble = (cls, text) => {
        const div = document.createElement('div');
        div.className = 'msg ' + cls;
        div.textContent = text;
        return div;
    };

    async function send(prefilled) {
        const input = $('#question');
        const question = (prefilled ?? input.value).trim();
        if (!question || $('#send-btn').disabled) return;

        const end = $('#transcript-end');
        end.before(bubble('user', question));
        const typing = bubble('assistant typing', '');
        typing.innerHTML = '<div class=dots><span></span><span></span><span></span></div>';
        end.before(typing);
        input.value = '';
        $('#send-btn').disabled = true;
        scrollToEnd();

        const form = new URLSearchParams();
        form.set(prefilled === undefined ? 'question' : 'prefilled', question);
        try {
            const res = await post('/ask', form);
            if (res.ok) {
                $('#transcript').outerHTML = await res.text();
            } else {
                typing.remove();
                alert(await res.text());
            }
        } catch (e) {
            typing.replaceWith(bubble('assistant', 'Error: ' + e.message));
        }
        $('#send-btn').disabled = false;
        scrollToEnd();
    }

    async function index() {
        const button = $('#index-btn');
        if ($('#uploads').children.length === 0) return;
        button.disabled = true;
        button.textContent = 'Indexing…';
        $('#overlay').hidden = false;
        let notice;
        try {
            const res = await post('/ingest', null);
            notice = res.ok ? (await res.json()).notice : await res.text();
        } catch (e) {
            notice = 'Index error: ' + e.message;
        }
        $('#overlay').hidden = true;
        button.disabled = false;
        button.textContent = 'Index';
        if (notice) alert(notice);
    }

    $('#ask-form').addEventListener('submit', (e) => { e.preventDefault(); send(); });
    document.querySelectorAll('.suggestion').forEach((chip) =>
        chip.addEventListener('click', () => send(chip.dataset.question)));

    $('#model').addEventListener('change', (e) => {
        const form = new URLSearchParams();
        form.set('model', e.target.value);
        post('/model', form);
    });

    $('#files').addEventListener('change', async (e) => {
        const form = new FormData();
        for (const file of e.target.files) form.append('files', file);
        const res = await post('/files', form);
        if (res.ok) $('#uploads').outerHTML = await res.text();
        else alert(await res.text());
    });

    $('#index-btn').addEventListener('click', index);
    scrollToEnd();
})();
";
