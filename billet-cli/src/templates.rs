//! HTML templates for the index and note pages
//!
//! Rendered with minijinja; the `.html` names keep auto-escaping on.

use anyhow::Result;
use minijinja::Environment;

const INDEX: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>billet</title>
</head>
<body>
  <h1>billet</h1>
  {% if notes %}
  <h2>Recent notes</h2>
  <ul>
    {% for name in notes %}
    <li><a href="/note/{{ name }}">{{ name }}</a></li>
    {% endfor %}
  </ul>
  {% else %}
  <p>No notes yet.</p>
  {% endif %}
</body>
</html>
"#;

const NOTE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ title }}</title>
</head>
<body>
  <h1>{{ title }}</h1>
  <pre>{{ body }}</pre>
</body>
</html>
"#;

/// Build the template environment once at server start.
pub fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("index.html", INDEX)?;
    env.add_template("note.html", NOTE)?;
    Ok(env)
}
