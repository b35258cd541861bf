//! Server-rendered HTML pages.

use axum::http::StatusCode;
use seeker_store::Registrant;
use std::fmt::Write;

pub const NO_FACE_MESSAGE: &str = "No face detected in uploaded image.";
pub const NOT_FOUND_MESSAGE: &str = "Person not found in database.";

/// Flash message shown above a form.
pub enum Notice {
    Info(String),
    Error(String),
}

/// What the dashboard shows after a search.
pub enum SearchResult<'a> {
    Match { person: &'a Registrant, score: f32 },
    Message(&'a str),
}

/// Escape text for element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn photo_url(person: &Registrant) -> String {
    format!("/static/uploads/{}", escape(&person.photo))
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · Seeker</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 0; color: #1d2330; }}
nav {{ background: #1d2330; padding: .8rem 1.5rem; }}
nav a {{ color: #fff; margin-right: 1.2rem; text-decoration: none; }}
main {{ max-width: 60rem; margin: 2rem auto; padding: 0 1.5rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border-bottom: 1px solid #d8dce6; padding: .5rem; text-align: left; }}
img.thumb {{ height: 64px; border-radius: 4px; }}
.notice {{ padding: .7rem 1rem; border-radius: 4px; margin-bottom: 1rem; }}
.info {{ background: #e5f4ea; }}
.error {{ background: #fbe7e7; }}
form.inline {{ display: inline; }}
</style>
</head>
<body>
<nav><a href="/">Seeker</a><a href="/database">Database</a><a href="/dashboard">Search</a><a href="/about">About</a></nav>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

pub fn index() -> String {
    layout(
        "Home",
        r#"<h1>Missing person identification</h1>
<p>Register missing people with a reference photo, then search the registry with a new photo.</p>
<p><a href="/database">Register a person</a> · <a href="/dashboard">Search by photo</a></p>"#,
    )
}

pub fn about() -> String {
    layout(
        "About",
        r#"<h1>About</h1>
<p>Seeker compares the face in an uploaded photo against the reference photo of every
registered person, in registration order, and reports the first verified match.
Photos without a detectable face are skipped.</p>"#,
    )
}

fn notice_html(notice: Option<&Notice>) -> String {
    match notice {
        Some(Notice::Info(msg)) => format!(r#"<div class="notice info">{}</div>"#, escape(msg)),
        Some(Notice::Error(msg)) => format!(r#"<div class="notice error">{}</div>"#, escape(msg)),
        None => String::new(),
    }
}

pub fn database(persons: &[Registrant], notice: Option<&Notice>) -> String {
    let mut body = String::from("<h1>Registered persons</h1>\n");
    body.push_str(&notice_html(notice));
    body.push_str(
        r#"<form method="post" action="/database" enctype="multipart/form-data">
<p><label>Name <input name="name" required></label>
<label>Age <input name="age" type="number" min="0" max="150" required></label></p>
<p><label>Gender <select name="gender"><option>female</option><option>male</option><option>other</option><option value="">unknown</option></select></label>
<label>Last seen at <input name="location"></label></p>
<p><label>Photo <input name="photo" type="file" accept="image/*" required></label>
<button type="submit">Register</button></p>
</form>
"#,
    );

    if persons.is_empty() {
        body.push_str("<p>No persons registered yet.</p>");
        return layout("Database", &body);
    }

    body.push_str(
        "<table>\n<tr><th>#</th><th>Photo</th><th>Name</th><th>Age</th><th>Gender</th><th>Location</th><th>Registered</th><th></th></tr>\n",
    );
    for p in persons {
        let _ = writeln!(
            body,
            r#"<tr><td>{id}</td><td><img class="thumb" src="{url}" alt=""></td><td>{name}</td><td>{age}</td><td>{gender}</td><td>{location}</td><td>{registered}</td><td><form class="inline" method="post" action="/database/{id}/delete"><button type="submit">Remove</button></form></td></tr>"#,
            id = p.id,
            url = photo_url(p),
            name = escape(&p.name),
            age = p.age,
            gender = escape(&p.gender),
            location = escape(&p.location),
            registered = p.registered_at.format("%Y-%m-%d %H:%M"),
        );
    }
    body.push_str("</table>");
    layout("Database", &body)
}

pub fn dashboard(result: Option<&SearchResult<'_>>) -> String {
    let mut body = String::from(
        r#"<h1>Search by photo</h1>
<form method="post" action="/dashboard" enctype="multipart/form-data">
<p><input name="image" type="file" accept="image/*"> <button type="submit">Search</button></p>
</form>
"#,
    );

    match result {
        Some(SearchResult::Match { person, score }) => {
            let _ = write!(
                body,
                r#"<h2>Match found</h2>
<p><img src="{url}" alt="" style="max-height: 240px"></p>
<table>
<tr><th>Name</th><td>{name}</td></tr>
<tr><th>Age</th><td>{age}</td></tr>
<tr><th>Gender</th><td>{gender}</td></tr>
<tr><th>Location</th><td>{location}</td></tr>
<tr><th>Score</th><td>{score:.3}</td></tr>
</table>"#,
                url = photo_url(person),
                name = escape(&person.name),
                age = person.age,
                gender = escape(&person.gender),
                location = escape(&person.location),
            );
        }
        Some(SearchResult::Message(msg)) => {
            let _ = write!(body, r#"<div class="notice info">{}</div>"#, escape(msg));
        }
        None => {}
    }
    layout("Search", &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    layout(
        status.canonical_reason().unwrap_or("Error"),
        &format!(
            "<h1>{} {}</h1>\n<p>{}</p>",
            status.as_u16(),
            escape(status.canonical_reason().unwrap_or("")),
            escape(message)
        ),
    )
}
