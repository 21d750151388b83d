//! Server-rendered chat page.
//!
//! The page carries the three elements the widget binds to and loads the
//! wasm bundle produced by `wasm-pack build --target web --out-dir
//! static/pkg`.

use crate::html::escape_html;

/// Path of the widget's JS glue, relative to the site root.
pub const WIDGET_SCRIPT: &str = "/static/pkg/ask_widget.js";

/// Generate the HTML shell for the application.
#[must_use]
pub fn html_shell(title: &str, content: &str) -> String {
    let title = escape_html(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <link rel="stylesheet" href="/static/app.css">
    <script type="module">
        import init from "{WIDGET_SCRIPT}";
        init();
    </script>
</head>
<body>
    <main id="app">
        <h1>{title}</h1>
        {content}
    </main>
</body>
</html>"#
    )
}

/// Chat page content.
#[must_use]
pub fn chat_content() -> &'static str {
    r#"<div id="chat-box" class="chat-box" aria-live="polite" aria-label="Chat messages"></div>
        <form id="chat-form" class="chat-form" autocomplete="off">
            <input id="user-input" name="question" type="text" placeholder="Ask a question..." aria-label="Question">
            <button type="submit">Send</button>
        </form>
        <form method="post" action="/clear_history" class="clear-form">
            <button type="submit">Clear history</button>
        </form>"#
}

/// The complete chat page.
#[must_use]
pub fn chat_page(title: &str) -> String {
    html_shell(title, chat_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_widget_elements() {
        let page = chat_page("Ask");
        assert!(page.contains(r#"id="chat-form""#));
        assert!(page.contains(r#"id="user-input""#));
        assert!(page.contains(r#"id="chat-box""#));
        assert!(page.contains(WIDGET_SCRIPT));
        assert!(page.contains(r#"action="/clear_history""#));
    }

    #[test]
    fn test_title_is_escaped() {
        let page = chat_page("<script>x</script>");
        assert!(page.contains("<title>&lt;script&gt;x&lt;/script&gt;</title>"));
    }
}
