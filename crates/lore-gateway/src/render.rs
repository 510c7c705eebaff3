//! HTML for pages and htmx fragments. Plain `format!` templates; every string
//! that came from a user or the filesystem goes through `escape_html`.

use lore_core::{escape_html, topics, ContentItem, KnowledgeBase, Topic, CONTENT_TYPES};

const HTMX: &str = "https://unpkg.com/htmx.org@1.9.12";

pub fn layout(title: &str, current_topic: Option<&str>, body: &str) -> String {
    let nav: String = topics()
        .iter()
        .map(|t| {
            let active = if Some(t.id) == current_topic { " active" } else { "" };
            format!(
                r#"<a class="nav-topic{active} {color}" href="/browse/{id}">{icon} {name}</a>"#,
                active = active,
                color = t.color,
                id = t.id,
                icon = t.icon,
                name = t.name,
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · Lore</title>
<link rel="stylesheet" href="/static/app.css">
<script src="{htmx}"></script>
</head>
<body>
<header class="site-header"><a class="brand" href="/">Lore</a><nav>{nav}<a class="nav-kb" href="/knowledge-bases">📚 Knowledge Bases</a></nav></header>
<main>{body}</main>
</body>
</html>"#,
        title = escape_html(title),
        htmx = HTMX,
        nav = nav,
        body = body,
    )
}

pub fn home_page() -> String {
    let cards: String = topics().iter().map(topic_card).collect();
    let body = format!(
        r#"<section class="hero"><h1>Explore forgotten knowledge</h1><p>Browse books, videos and presentations, or ask the assistant.</p></section><section class="topic-grid">{}</section>"#,
        cards
    );
    layout("Home", None, &body)
}

fn topic_card(t: &Topic) -> String {
    format!(
        r#"<article class="topic-card {color}"><div class="topic-icon">{icon}</div><h2>{name}</h2><p>{description}</p><div class="card-actions"><a href="/browse/{id}">Browse</a><a href="/chat/{id}">Chat</a></div></article>"#,
        color = t.color,
        icon = t.icon,
        name = t.name,
        description = t.description,
        id = t.id,
    )
}

pub fn topic_page(topic: &Topic) -> String {
    let links: String = CONTENT_TYPES
        .iter()
        .map(|ct| {
            format!(
                r#"<a class="content-type" href="/browse/{id}/{ct}">{label}</a>"#,
                id = topic.id,
                ct = ct,
                label = capitalize(ct),
            )
        })
        .collect();
    let body = format!(
        r#"<section class="topic {color}"><h1>{icon} {name}</h1><p>{description}</p><div class="content-types">{links}</div><a class="chat-link" href="/chat/{id}">Ask the {name} assistant</a></section>"#,
        color = topic.color,
        icon = topic.icon,
        name = topic.name,
        description = topic.description,
        links = links,
        id = topic.id,
    );
    layout(topic.name, Some(topic.id), &body)
}

pub fn content_page(topic: &Topic, content_type: &str, items: &[ContentItem]) -> String {
    let list = if items.is_empty() {
        r#"<p class="empty">Nothing here yet.</p>"#.to_string()
    } else {
        let rows: String = items
            .iter()
            .map(|item| {
                format!(
                    r#"<li class="content-item {kind}"><span class="title">{title}</span><span class="filename">{filename}</span></li>"#,
                    kind = escape_html(&item.kind),
                    title = escape_html(&item.title),
                    filename = escape_html(&item.filename),
                )
            })
            .collect();
        format!(r#"<ul class="content-list">{}</ul>"#, rows)
    };
    let heading = format!("{} {}", topic.name, capitalize(content_type));
    let body = format!(
        r#"<section class="topic {color}"><a href="/browse/{id}">← {name}</a><h1>{heading}</h1>{list}</section>"#,
        color = topic.color,
        id = topic.id,
        name = topic.name,
        heading = heading,
        list = list,
    );
    layout(&heading, Some(topic.id), &body)
}

/// Chat page. Unknown topic ids still render, named after the raw id.
pub fn chat_page(topic_id: &str, topic: Option<&Topic>) -> String {
    let id = escape_html(topic_id);
    let name = topic.map(|t| t.name.to_string()).unwrap_or_else(|| escape_html(topic_id));
    let icon = topic.map(|t| t.icon).unwrap_or("💬");
    let intro = format!("Ask me anything about {}.", name);
    let body = chat_panel(&format!("/chat/{}/query", id), icon, &name, &intro);
    layout(&format!("{} Chat", topic.map(|t| t.name).unwrap_or(topic_id)), topic.map(|t| t.id), &body)
}

fn chat_panel(action: &str, icon: &str, heading: &str, intro: &str) -> String {
    format!(
        r##"<section class="chat"><h1>{icon} {heading}</h1><div id="messages" class="messages"><div class="message ai-message"><div class="message-header"><span class="ai-avatar">🤖</span><strong>AI Assistant</strong></div><div class="message-content">{intro}</div></div></div><form class="chat-form" hx-post="{action}" hx-target="#messages" hx-swap="beforeend" hx-on::after-request="this.reset()"><input type="hidden" id="session_id" name="session_id" value=""><input type="text" name="message" placeholder="Type your question…" autocomplete="off"><button type="submit">Send</button></form></section>"##,
        icon = icon,
        heading = heading,
        intro = intro,
        action = action,
    )
}

pub fn knowledge_base_index(bases: &[KnowledgeBase]) -> String {
    let options: String = topics()
        .iter()
        .map(|t| format!(r#"<option value="{}">{}</option>"#, t.id, t.name))
        .collect();
    let rows = if bases.is_empty() {
        r#"<p class="empty">No knowledge bases yet.</p>"#.to_string()
    } else {
        let items: String = bases
            .iter()
            .map(|kb| {
                format!(
                    r#"<li class="kb-item"><a href="/knowledge-bases/{id}">{name}</a><span class="subject">{subject}</span><span class="count">{count} files</span></li>"#,
                    id = escape_html(&kb.id),
                    name = escape_html(&kb.name),
                    subject = escape_html(&kb.subject),
                    count = kb.file_count,
                )
            })
            .collect();
        format!(r#"<ul class="kb-list">{}</ul>"#, items)
    };
    let body = format!(
        r##"<section class="knowledge-bases"><h1>Knowledge Bases</h1><form class="kb-form" hx-post="/knowledge-bases" hx-target="#kb-result"><input type="text" name="name" placeholder="Name" required><input type="text" name="description" placeholder="Description"><select name="subject">{options}</select><button type="submit">Create</button></form><div id="kb-result"></div>{rows}</section>"##,
        options = options,
        rows = rows,
    );
    layout("Knowledge Bases", None, &body)
}

pub fn knowledge_base_page(kb: &KnowledgeBase) -> String {
    let id = escape_html(&kb.id);
    let files = if kb.files.is_empty() {
        r#"<p class="empty">No files uploaded.</p>"#.to_string()
    } else {
        let rows: String = kb
            .files
            .iter()
            .map(|f| {
                format!(
                    r#"<li class="file"><span class="filename">{name}</span><span class="size">{size} bytes</span><span class="status">{status}</span></li>"#,
                    name = escape_html(&f.filename),
                    size = f.size,
                    status = f.status.label(),
                )
            })
            .collect();
        format!(r#"<ul class="file-list">{}</ul>"#, rows)
    };
    let name = escape_html(&kb.name);
    let intro = format!("Ask me about the files in {}.", name);
    let body = format!(
        r##"<section class="kb"><h1>{name}</h1><p>{description}</p><p class="meta">Subject: {subject} · {count} files</p><form class="upload-form" hx-post="/knowledge-bases/{id}/upload" hx-encoding="multipart/form-data" hx-target="#upload-result"><input type="file" name="file"><button type="submit">Upload</button></form><div id="upload-result"></div>{files}</section>{chat}"##,
        name = name,
        description = escape_html(&kb.description),
        subject = escape_html(&kb.subject),
        count = kb.file_count,
        id = id,
        files = files,
        chat = chat_panel(&format!("/knowledge-bases/{}/query", id), "📚", &name, &intro),
    );
    layout(&kb.name, None, &body)
}

pub fn not_found_page() -> String {
    layout(
        "Not Found",
        None,
        r#"<section class="not-found"><h1>404</h1><p>That page does not exist.</p><a href="/">Back home</a></section>"#,
    )
}

/// Result line for the create and upload forms, with an optional link to the
/// knowledge base it concerns.
pub fn form_result(success: bool, message: &str, knowledge_base_id: Option<&str>) -> String {
    let class = if success { "success" } else { "error" };
    let link = knowledge_base_id
        .map(|id| format!(r#" <a href="/knowledge-bases/{}">Open</a>"#, escape_html(id)))
        .unwrap_or_default();
    format!(r#"<div class="form-result {}">{}{}</div>"#, class, escape_html(message), link)
}

/// Inline error for the chat message list.
pub fn error_fragment(message: &str) -> String {
    format!(r#"<div class="message error">{}</div>"#, escape_html(message))
}

/// One chat turn. `answer` is already sanitized markup; the user's text is
/// escaped here. The session id rides along as an out-of-band swap of the
/// form's hidden input.
pub fn chat_exchange(user_message: &str, answer: &str, session_id: Option<&str>) -> String {
    let session = session_id
        .map(|id| {
            format!(
                r#"<input type="hidden" id="session_id" name="session_id" value="{}" hx-swap-oob="true">"#,
                escape_html(id)
            )
        })
        .unwrap_or_default();
    format!(
        concat!(
            r#"<div class="message user-message"><div class="message-header"><span class="user-avatar">👤</span><strong>You</strong></div>"#,
            r#"<div class="message-content">{}</div></div>"#,
            r#"<div class="message ai-message"><div class="message-header"><span class="ai-avatar">🤖</span><strong>AI Assistant</strong></div>"#,
            r#"<div class="message-content">{}</div></div>{}"#,
        ),
        escape_html(user_message),
        paragraphs(answer),
        session,
    )
}

/// Blank-line-separated paragraphs become `<p>`, single newlines `<br>`.
fn paragraphs(answer: &str) -> String {
    answer
        .split("\n\n")
        .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_escapes_user_text_and_keeps_answer_markup() {
        let html = chat_exchange("<b>hi</b>", "<strong>Yarrow</strong>\n\nline one\nline two", None);
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("<p><strong>Yarrow</strong></p><p>line one<br>line two</p>"));
        assert!(!html.contains("hx-swap-oob"));
        assert!(!html.contains('\n'));
    }

    #[test]
    fn exchange_carries_session_out_of_band() {
        let html = chat_exchange("hi", "hello", Some("local-abc"));
        assert!(html.contains(r#"value="local-abc" hx-swap-oob="true""#));
    }

    #[test]
    fn error_fragment_matches_form_contract() {
        assert_eq!(
            error_fragment("Please enter a message"),
            r#"<div class="message error">Please enter a message</div>"#
        );
    }

    #[test]
    fn form_result_escapes_and_links() {
        assert_eq!(
            form_result(true, "Knowledge base '<Herbs>' created", Some("kb-1")),
            r#"<div class="form-result success">Knowledge base '&lt;Herbs&gt;' created <a href="/knowledge-bases/kb-1">Open</a></div>"#
        );
        assert_eq!(
            form_result(false, "No file provided", None),
            r#"<div class="form-result error">No file provided</div>"#
        );
    }

    #[test]
    fn unknown_chat_topic_uses_escaped_id() {
        let html = chat_page("<ghosts>", None);
        assert!(html.contains("&lt;ghosts&gt;"));
        assert!(!html.contains("<ghosts>"));
    }
}
