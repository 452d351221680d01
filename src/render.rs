use crate::error::RenderError;
use crate::types::SearchResult;
use std::fmt::Write;

const SEPARATOR: &str = "---------------------------";

/// Formats a search result as the text block sent back to the client.
///
/// ```text
/// 2 issues:
/// ---------------------------
/// Number: 1
/// User: octocat
/// Title: ...
/// URL: ...
/// ---------------------------
/// Number: 2
/// ...
/// ---------------------------
/// ```
///
/// Fails on an issue without a user; nothing is partially rendered.
pub fn render_report(result: &SearchResult) -> Result<String, RenderError> {
    let mut out = String::new();
    write!(out, "{} issues:", result.total_count)?;
    for issue in &result.items {
        let user = issue
            .user
            .as_ref()
            .ok_or(RenderError::MissingUser { number: issue.number })?;
        write!(
            out,
            "\n{}\nNumber: {}\nUser: {}\nTitle: {}\nURL: {}",
            SEPARATOR, issue.number, user.login, issue.title, issue.html_url
        )?;
    }
    if !result.items.is_empty() {
        write!(out, "\n{}", SEPARATOR)?;
    }
    Ok(out)
}
