//! HTML rendering of the two pages
//!
//! [`render_page`] is a pure function of one browser's view and the shared
//! catalog: the same inputs always yield the same document. Handlers call
//! it after dispatching.

use std::fmt::Write;

use ermihadu_common::draft::{person_option_value, NEW_PERSON_OPTION};
use ermihadu_common::filter::{PersonFilter, SizeFilter};
use ermihadu_common::view::{Catalog, Page, StatusKind, ViewState, EMPTY_STATE_MESSAGE};
use ermihadu_common::{Item, Size, UploaderLabel};

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the current page
pub fn render_page(view: &ViewState, catalog: &Catalog) -> String {
    let mut body = String::new();
    render_header(&mut body, view, catalog);
    render_status(&mut body, view);
    match view.page {
        Page::List => render_list(&mut body, view, catalog),
        Page::Form => render_form(&mut body, view, catalog),
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ERMIHADU ITEMS</title>
    <link rel="stylesheet" href="/static/vault.css">
</head>
<body data-page="{page}">
<div class="vault">
{body}</div>
<script src="/static/vault.js"></script>
</body>
</html>
"#,
        page = page_name(view.page),
        body = body,
    )
}

fn page_name(page: Page) -> &'static str {
    match page {
        Page::List => "list",
        Page::Form => "form",
    }
}

fn selected(condition: bool) -> &'static str {
    if condition {
        " selected"
    } else {
        ""
    }
}

fn render_header(out: &mut String, view: &ViewState, catalog: &Catalog) {
    let (ermihadu_class, items_class) = match view.page {
        Page::Form => ("nav current", "nav"),
        Page::List => ("nav", "nav current"),
    };
    let _ = write!(
        out,
        r#"<header>
    <h1><a class="{}" href="/upload">ERMIHADU</a> <form class="inline" method="post" action="/cancel"><button class="{}" type="submit">ITEMS</button></form></h1>
"#,
        ermihadu_class, items_class
    );

    if view.page == Page::List {
        render_filters(out, view, catalog);
    }
    out.push_str("</header>\n");
}

fn render_filters(out: &mut String, view: &ViewState, catalog: &Catalog) {
    let filters = &view.filters;

    out.push_str(r#"    <div class="toolbar">
    <form class="filters" method="get" action="/">
        <select name="size" data-autosubmit>
"#);
    let _ = writeln!(
        out,
        r#"            <option value="all"{}>All Sizes</option>"#,
        selected(filters.size == SizeFilter::All)
    );
    for size in Size::ALL {
        let _ = writeln!(
            out,
            r#"            <option value="{0}"{1}>{0}</option>"#,
            size,
            selected(filters.size == SizeFilter::Only(size))
        );
    }
    out.push_str("        </select>\n        <select name=\"recency\" data-autosubmit>\n");
    for (value, label) in [("newest", "Newest First"), ("oldest", "Oldest First")] {
        let _ = writeln!(
            out,
            r#"            <option value="{}"{}>{}</option>"#,
            value,
            selected(filters.recency.as_str() == value),
            label
        );
    }
    out.push_str("        </select>\n        <select name=\"person\" data-autosubmit>\n");
    let _ = writeln!(
        out,
        r#"            <option value=""{}>All People</option>"#,
        selected(filters.person == PersonFilter::All)
    );
    for person in catalog.people.iter() {
        let is_selected = matches!(&filters.person, PersonFilter::Only(name) if name == person);
        let _ = writeln!(
            out,
            r#"            <option value="{0}"{1}>{0}</option>"#,
            escape_html(person),
            selected(is_selected)
        );
    }
    out.push_str(
        r#"        </select>
        <noscript><button type="submit">Apply</button></noscript>
    </form>
    <form method="post" action="/refresh"><button class="icon" type="submit" title="Refresh">&#x21bb;</button></form>
    <a class="icon add" href="/upload" title="Add item">+</a>
    </div>
"#,
    );
}

fn render_status(out: &mut String, view: &ViewState) {
    let Some(status) = &view.status else {
        return;
    };
    let class = match status.kind {
        StatusKind::Success => "status success",
        StatusKind::Error => "status error",
    };
    let _ = write!(
        out,
        r#"<div class="{}" role="status"><span>{}</span><form method="post" action="/dismiss"><button type="submit" title="Dismiss">&times;</button></form></div>
"#,
        class,
        escape_html(&status.text)
    );
}

fn render_list(out: &mut String, view: &ViewState, catalog: &Catalog) {
    let visible = view.visible_items(catalog);

    out.push_str("<main class=\"items\">\n");
    for item in &visible {
        render_item(out, item, view.expanded == Some(item.id));
    }
    if visible.is_empty() {
        let _ = writeln!(out, r#"<p class="empty">{}</p>"#, EMPTY_STATE_MESSAGE);
    }
    out.push_str("</main>\n");
}

fn render_item(out: &mut String, item: &Item, expanded: bool) {
    let title = escape_html(&item.title);
    let _ = writeln!(
        out,
        r#"<article class="item{}" id="item-{}">"#,
        if expanded { " expanded" } else { "" },
        item.id
    );

    if expanded && item.image_urls.len() > 1 {
        out.push_str("<div class=\"gallery\">\n");
        for (idx, url) in item.image_urls.iter().enumerate() {
            let _ = writeln!(
                out,
                r#"<img src="{}" alt="{} {}" loading="lazy">"#,
                escape_html(url),
                title,
                idx + 1
            );
        }
        out.push_str("</div>\n");
    } else if let Some(url) = item.image_urls.first() {
        let _ = writeln!(
            out,
            r#"<img class="cover" src="{}" alt="{}" loading="lazy">"#,
            escape_html(url),
            title
        );
    }

    let _ = write!(
        out,
        r#"<div class="info">
    <div class="person">{}</div>
    <div class="title">{}</div>
    <a class="read" href="/?{}={}#item-{}">{}</a>
</div>
"#,
        escape_html(&item.person),
        title,
        if expanded { "collapse" } else { "expand" },
        item.id,
        item.id,
        if expanded { "Hide" } else { "Read" }
    );

    if expanded {
        out.push_str("<div class=\"details\">\n");
        if !item.description.is_empty() {
            let _ = writeln!(
                out,
                r#"<p class="description">{}</p>"#,
                escape_html(&item.description)
            );
        }
        if !item.audio_url.is_empty() {
            let _ = writeln!(
                out,
                r#"<audio controls src="{}"></audio>"#,
                escape_html(&item.audio_url)
            );
            if !item.audio_transcript.is_empty() {
                let _ = writeln!(
                    out,
                    r#"<p class="transcript">{}</p>"#,
                    escape_html(&item.audio_transcript)
                );
            }
        }
        let _ = writeln!(
            out,
            r#"<div class="uploader">Uploaded by: {}</div>"#,
            escape_html(&item.uploader)
        );
        out.push_str("</div>\n");
    }
    out.push_str("</article>\n");
}

fn render_form(out: &mut String, view: &ViewState, catalog: &Catalog) {
    let draft = &view.draft;

    out.push_str(
        r#"<main>
<form id="item-form" class="upload" method="post" action="/submit" enctype="multipart/form-data">
<h2>Add Item</h2>
<label class="dropzone">
    <input type="file" name="images" accept="image/*" multiple>
    <span>Add images</span>
</label>
"#,
    );

    if !draft.images.is_empty() {
        out.push_str("<div class=\"previews\">\n");
        for (idx, image) in draft.images.iter().enumerate() {
            let _ = writeln!(
                out,
                r#"<div class="preview"><img src="/draft/images/{0}" alt="Preview {0}" title="{1}"><button type="submit" name="remove_image" value="{0}" formaction="/draft" formnovalidate title="Remove">&times;</button></div>"#,
                idx,
                escape_html(&image.file_name)
            );
        }
        out.push_str("</div>\n");
    }

    let _ = writeln!(
        out,
        r#"<input type="text" name="title" placeholder="Item title" value="{}">"#,
        escape_html(&draft.title)
    );

    let person_value = draft.person.selector_value();
    out.push_str("<select name=\"person\" data-person-select>\n");
    let _ = writeln!(
        out,
        r#"    <option value=""{}>Select person who gave it</option>"#,
        selected(person_value.is_empty())
    );
    for person in catalog.people.iter() {
        let value = person_option_value(person);
        let _ = writeln!(
            out,
            r#"    <option value="{}"{}>{}</option>"#,
            escape_html(&value),
            selected(person_value == value),
            escape_html(person)
        );
    }
    let _ = writeln!(
        out,
        r#"    <option value="{}"{}>+ Add new person</option>
</select>"#,
        NEW_PERSON_OPTION,
        selected(draft.person.is_new())
    );
    let new_name = if draft.person.is_new() {
        draft.person.resolved().unwrap_or_default()
    } else {
        ""
    };
    let _ = writeln!(
        out,
        r#"<input type="text" name="new_person" placeholder="Enter person's name" value="{}" data-new-person{}>"#,
        escape_html(new_name),
        if draft.person.is_new() { "" } else { " hidden" }
    );

    out.push_str("<select name=\"size\">\n");
    for size in Size::ALL {
        let _ = writeln!(
            out,
            r#"    <option value="{0}"{1}>{0}</option>"#,
            size,
            selected(draft.size == size)
        );
    }
    out.push_str("</select>\n");

    let _ = writeln!(
        out,
        r#"<textarea name="description" placeholder="Description (optional)">{}</textarea>"#,
        escape_html(&draft.description)
    );

    let recording = view.recorder.is_recording();
    let _ = writeln!(
        out,
        r#"<div class="audio">
    <button type="button" class="record{}" data-record data-recording="{}">{}</button>"#,
        if recording { " recording" } else { "" },
        recording,
        if recording { "Stop Recording" } else { "Record Audio" }
    );
    if let Some(clip) = &draft.audio {
        let _ = writeln!(
            out,
            r#"    <audio controls src="/api/audio/clip" data-bytes="{}"></audio>
    <button type="button" class="discard" data-discard-audio>Remove recording</button>"#,
            clip.bytes.len()
        );
    }
    out.push_str("</div>\n");

    let _ = writeln!(
        out,
        r#"<textarea name="audio_transcript" placeholder="Audio transcript (optional)">{}</textarea>"#,
        escape_html(&draft.audio_transcript)
    );

    out.push_str("<div class=\"uploaders\">\n<p>Who is uploading?</p>\n");
    for label in draft.uploaders() {
        let _ = writeln!(out, r#"<input type="hidden" name="uploader" value="{}">"#, label);
    }
    out.push_str("<div class=\"labels\">\n");
    for label in UploaderLabel::ALL {
        let is_selected = draft.uploaders().contains(&label);
        let _ = writeln!(
            out,
            r#"    <button type="submit" name="toggle_uploader" value="{0}" formaction="/draft" formnovalidate class="label{1}" aria-pressed="{2}">{0}</button>"#,
            label,
            if is_selected { " selected" } else { "" },
            is_selected
        );
    }
    out.push_str("</div>\n</div>\n");

    let _ = write!(
        out,
        r#"<div class="actions">
    <button type="submit" class="cancel" formaction="/cancel" formnovalidate>Cancel</button>
    <button type="submit" class="submit" data-submit{}>{}</button>
</div>
</form>
</main>
"#,
        if view.uploading { " disabled" } else { "" },
        if view.uploading { "Uploading..." } else { "Upload" }
    );
}
