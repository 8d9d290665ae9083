//! Markdown to HTML conversion using pulldown-cmark.
//!
//! Pages may start with TOML frontmatter delimited by `+++`:
//!
//! ```markdown
//! +++
//! title = "Hello"
//! draft = true
//! +++
//!
//! # Body
//! ```

use anyhow::{Context, Result};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use serde::Deserialize;

const FRONTMATTER_DELIMITER: &str = "+++";

/// Page metadata from frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    /// Overrides the first heading as page title.
    pub title: Option<String>,
    /// Drafts are neither rendered nor expected in the output directory.
    pub draft: bool,
}

/// Options for markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub task_lists: bool,
}

impl MarkdownOptions {
    /// Create options with all extensions enabled
    pub fn all() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
        }
    }

    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        opts
    }
}

/// Split `+++` TOML frontmatter from the body.
///
/// Returns default metadata and the whole input when there is none.
pub fn split_frontmatter(content: &str) -> Result<(PageMeta, &str)> {
    let Some(rest) = content.strip_prefix(FRONTMATTER_DELIMITER) else {
        return Ok((PageMeta::default(), content));
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return Ok((PageMeta::default(), content));
    };

    let Some((frontmatter, body)) = find_closing(rest) else {
        return Ok((PageMeta::default(), content));
    };

    let meta = toml::from_str(frontmatter).context("invalid frontmatter")?;
    Ok((meta, body))
}

/// Locate the closing delimiter line, returning (frontmatter, body).
fn find_closing(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONTMATTER_DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Text of the first heading, if any.
fn first_heading(events: &[Event<'_>]) -> Option<String> {
    let start = events
        .iter()
        .position(|e| matches!(e, Event::Start(Tag::Heading { .. })))?;

    let mut title = String::new();
    for event in &events[start + 1..] {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(text) | Event::Code(text) => title.push_str(text),
            _ => {}
        }
    }

    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Render a markdown body into a complete HTML page.
///
/// `fallback_title` is used when neither frontmatter nor a heading name the page.
pub fn render_page(
    meta: &PageMeta,
    body: &str,
    site_title: &str,
    fallback_title: &str,
) -> String {
    let events: Vec<_> =
        Parser::new_ext(body, MarkdownOptions::all().to_pulldown_options()).collect();

    let page_title = meta
        .title
        .clone()
        .or_else(|| first_heading(&events))
        .unwrap_or_else(|| fallback_title.to_string());

    let title = if site_title.is_empty() || site_title == page_title {
        page_title
    } else {
        format!("{page_title} | {site_title}")
    };

    let mut content = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut content, events.into_iter());

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n\
         </head>\n\
         <body>\n\
         {content}\
         </body>\n\
         </html>\n",
        escape_html(&title)
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
