//! Last-resort harvesting of tab links from rendered search markup.
//!
//! Tab pages follow `/tab/{artist}/{song}-{type}-{id}`, so the id, type and
//! artist can be recovered from the link alone.

use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::{SearchContext, SearchError, SearchResult, SearchStrategy};

static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));

const TAB_PATH_MARKER: &str = "/tab/";

/// Harvests `<a href=".../tab/...">` links from the search page.
pub struct AnchorSearch;

#[async_trait]
impl SearchStrategy for AnchorSearch {
    fn name(&self) -> &str {
        "anchors"
    }

    async fn attempt(&self, ctx: &SearchContext<'_>) -> Result<Vec<SearchResult>, SearchError> {
        let markup = ctx.markup().await?;
        Ok(harvest_tab_links(markup))
    }
}

/// Collect tab results from every anchor pointing at a tab page.
///
/// Anchors whose trailing segment is not purely numeric, or whose text is
/// empty, are skipped. The first anchor for each id wins.
pub fn harvest_tab_links(markup: &str) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for (href, text) in scan_anchors(markup) {
        if !href.contains(TAB_PATH_MARKER) {
            continue;
        }
        let Some(result) = result_from_link(&href, &text) else {
            continue;
        };
        if seen.insert(result.id.clone()) {
            results.push(result);
        }
    }

    results
}

fn result_from_link(href: &str, text: &str) -> Option<SearchResult> {
    let parts: Vec<&str> = href.split('-').collect();
    let id = *parts.last()?;
    if !NUMERIC_ID.is_match(id) {
        return None;
    }

    let title = strip_tags(text).trim().to_string();
    if title.is_empty() {
        return None;
    }

    Some(SearchResult {
        id: id.to_string(),
        title,
        artist: artist_from_path(href),
        tab_type: type_from_parts(&parts).unwrap_or_default().to_string(),
        url: href.to_string(),
        ..Default::default()
    })
}

/// Artist is the path segment after `tab`, de-hyphenated and title-cased.
fn artist_from_path(href: &str) -> String {
    let path = url_path(href);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    segments
        .iter()
        .position(|s| *s == "tab")
        .and_then(|i| segments.get(i + 1))
        .map(|artist| title_case(&artist.replace('-', " ")))
        .unwrap_or_default()
}

/// Type is the segment before the id; `guitar-pro` spans two segments.
fn type_from_parts(parts: &[&str]) -> Option<&'static str> {
    if parts.len() < 2 {
        return None;
    }
    let candidate = parts[parts.len() - 2];
    if candidate == "pro" && parts.len() >= 3 && parts[parts.len() - 3] == "guitar" {
        return Some("Guitar Pro");
    }

    match candidate {
        "chords" => Some("Chords"),
        "tabs" => Some("Tab"),
        "guitar" => Some("Guitar Pro"),
        "bass" => Some("Bass"),
        "drums" => Some("Drums"),
        "ukulele" => Some("Ukulele"),
        "power" => Some("Power"),
        "video" => Some("Video"),
        "official" => Some("Official"),
        _ => None,
    }
}

/// Path component of an absolute or relative URL.
fn url_path(href: &str) -> &str {
    let without_scheme = match href.find("://") {
        Some(i) => {
            let rest = &href[i + 3..];
            rest.find('/').map(|p| &rest[p..]).unwrap_or("")
        }
        None => href,
    };
    without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme)
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Yield `(href, inner_html)` for every `<a>` element carrying an href.
fn scan_anchors(doc: &str) -> Vec<(String, String)> {
    let lower = doc.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut i = 0;

    while let Some(rel) = lower[i..].find("<a") {
        let start = i + rel;
        let after = start + 2;

        // Must be `<a` followed by whitespace or `>`, not `<abbr`
        if !is_anchor_opener(&lower, start) {
            i = after;
            continue;
        }

        let Some(gt_rel) = doc[start..].find('>') else {
            break;
        };
        let opener_end = start + gt_rel;
        let opener = &doc[start..=opener_end];

        let Some(close_rel) = lower[opener_end + 1..].find("</a>") else {
            break;
        };
        let inner_start = opener_end + 1;
        let inner_end = inner_start + close_rel;

        // Unclosed anchor: the `</a>` found belongs to a later one
        if contains_anchor_opener(&lower[inner_start..inner_end]) {
            i = inner_start;
            continue;
        }

        if let Some(href) = attr_value(opener, "href") {
            out.push((href, doc[inner_start..inner_end].to_string()));
        }

        i = inner_end + "</a>".len();
    }

    out
}

fn is_anchor_opener(lower: &str, at: usize) -> bool {
    lower[at..].starts_with("<a")
        && matches!(lower.as_bytes().get(at + 2), Some(b) if b.is_ascii_whitespace() || *b == b'>')
}

fn contains_anchor_opener(lower: &str) -> bool {
    lower
        .match_indices("<a")
        .any(|(at, _)| is_anchor_opener(lower, at))
}

/// Extract a quoted or bare attribute value from a tag opener.
fn attr_value(opener: &str, name: &str) -> Option<String> {
    let lower = opener.to_ascii_lowercase();
    let needle = format!("{}=", name);

    let mut from = 0;
    let pos = loop {
        let rel = lower[from..].find(&needle)?;
        let pos = from + rel;
        // Attribute names are preceded by whitespace
        if pos > 0 && lower.as_bytes()[pos - 1].is_ascii_whitespace() {
            break pos;
        }
        from = pos + needle.len();
    };

    let val = opener[pos + needle.len()..].trim_start();
    let (quote, start_off) = match val.as_bytes().first() {
        Some(b'"') => (Some('"'), 1),
        Some(b'\'') => (Some('\''), 1),
        _ => (None, 0),
    };
    let end = match quote {
        Some(q) => val[start_off..].find(q).map(|e| start_off + e),
        None => val.find(|c: char| c.is_ascii_whitespace() || c == '>'),
    }
    .unwrap_or(val.len());

    Some(val[start_off..end].replace("&amp;", "&"))
}

/// Drop any markup inside anchor text.
fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
