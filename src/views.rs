use chrono::{DateTime, Local};
use url::form_urlencoded;

use crate::job::JobRecord;
use crate::utils::escape_html;

pub const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /refresh\nDisallow: /?q=\n";

/// What the index page needs to know.
pub struct IndexView<'a> {
    pub jobs: &'a [JobRecord],
    pub query: &'a str,
    pub last_updated: Option<DateTime<Local>>,
    pub show_refresh: bool,
}

/// `/` or `/?q=...`, for links and redirects that keep the current search.
pub fn index_href(query: &str) -> String {
    if query.is_empty() {
        return "/".to_string();
    }
    let encoded: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("q", query)
        .finish();
    format!("/?{}", encoded)
}

pub fn refresh_href(query: &str) -> String {
    if query.is_empty() {
        return "/refresh".to_string();
    }
    let encoded: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("q", query)
        .finish();
    format!("/refresh?{}", encoded)
}

pub fn format_last_updated(last_updated: Option<DateTime<Local>>) -> String {
    last_updated
        .map(|t| t.format("%d. %m. %Y, %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string())
}

pub fn render_index(view: &IndexView<'_>) -> String {
    let rows = view
        .jobs
        .iter()
        .map(|job| {
            format!(
                r#"      <tr>
        <td><a href="{}" target="_blank" rel="noopener">{}</a></td>
        <td>{}</td>
        <td>{}</td>
        <td>{}</td>
      </tr>"#,
                escape_html(&job.link),
                escape_html(&job.title),
                escape_html(&job.company),
                escape_html(&job.location),
                escape_html(&job.employment_type),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let refresh = if view.show_refresh {
        format!(
            r#"<a class="refresh" href="{}">Refresh listings</a>"#,
            escape_html(&refresh_href(view.query))
        )
    } else {
        String::new()
    };

    let empty = if view.jobs.is_empty() {
        r#"<p class="empty">No jobs found.</p>"#
    } else {
        ""
    };

    format!(
        r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Cocuma jobs</title>
</head>
<body>
  <h1>Cocuma jobs</h1>
  <form method="get" action="/">
    <input type="search" name="q" value="{}" placeholder="Job title or company">
    <button type="submit">Search</button>
  </form>
  <p class="meta">{} jobs &middot; last updated: {} {}</p>
  {}
  <table>
    <thead>
      <tr><th>Title</th><th>Company</th><th>Location</th><th>Type</th></tr>
    </thead>
    <tbody>
{}
    </tbody>
  </table>
</body>
</html>
"##,
        escape_html(view.query),
        view.jobs.len(),
        format_last_updated(view.last_updated),
        refresh,
        empty,
        rows,
    )
}

pub fn render_error(message: &str) -> String {
    format!(
        r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Error</title>
</head>
<body>
  <h1>Something went wrong</h1>
  <p>{}</p>
  <p><a href="/">Back to the listings</a></p>
</body>
</html>
"##,
        escape_html(message)
    )
}
