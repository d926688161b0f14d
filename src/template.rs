//! Deterministic HTML for commit summaries

use crate::commit::CommitDescriptor;

/// Longest descriptive part of a post title, in characters
pub const MAX_TITLE_CHARS: usize = 100;

/// `"{repository}: {first line of text}"`, or `"{repository}: Update"` when
/// that line is blank
pub fn title(repository: &str, text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let summary: String = first_line.chars().take(MAX_TITLE_CHARS).collect();

    if summary.is_empty() {
        format!("{}: Update", repository)
    } else {
        format!("{}: {}", repository, summary)
    }
}

/// Plain summary used whenever no generated text is available
pub fn render(commit: &CommitDescriptor) -> String {
    let mut html = String::from("<h2>Commit Details</h2>\n");
    html.push_str(&details(commit));
    html.push_str(&format!(
        "<h3>Message</h3>\n<p>{}</p>\n",
        escape(&commit.message)
    ));

    if !commit.changed_files.is_empty() {
        html.push_str("<h3>Changed Files</h3>\n<ul>\n");
        for file in &commit.changed_files {
            html.push_str(&format!(
                "<li>{} {}</li>\n",
                escape(&file.status),
                escape(&file.path)
            ));
        }
        html.push_str("</ul>\n");
    }

    html
}

/// Reference block appended under generated text
pub fn commit_details_footer(commit: &CommitDescriptor) -> String {
    let mut html =
        String::from("\n<h3>Original Commit Details</h3>\n<div class=\"commit-details\">\n");
    html.push_str(&details(commit));
    html.push_str("<h4>Changed Files:</h4>\n<ul>\n");
    for file in &commit.changed_files {
        html.push_str(&format!(
            "<li><span style='color: {}'>{}</span> {}</li>\n",
            status_color(&file.status),
            escape(&file.status),
            escape(&file.path)
        ));
    }
    html.push_str("</ul>\n</div>\n");

    html
}

/// Display color for a name-status letter; only the first character counts
pub fn status_color(status: &str) -> &'static str {
    match status.chars().next() {
        Some('A') => "green",
        Some('M') => "yellow",
        Some('D') => "red",
        Some('R') => "blue",
        Some('C') => "orange",
        Some('U') => "purple",
        _ => "gray",
    }
}

fn details(commit: &CommitDescriptor) -> String {
    format!(
        "<p><strong>Repository:</strong> {}</p>\n\
         <p><strong>Commit:</strong> <code>{}</code></p>\n\
         <p><strong>Author:</strong> {}</p>\n\
         <p><strong>Date:</strong> {}</p>\n",
        escape(&commit.repository_name),
        escape(&commit.short_id),
        escape(&commit.author),
        escape(&commit.date)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
