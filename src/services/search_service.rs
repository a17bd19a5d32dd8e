//! In-document text search over rendered markup.
//!
//! The document is split into markup and visible text fragments. Every
//! case-insensitive occurrence of the query inside a text fragment is wrapped
//! in a `<mark>` marker carrying its 0-based position in document order.
//! Markers only ever wrap plain text, so clearing them restores the document
//! exactly.

use std::ops::Range;

use log::{debug, info};

use crate::utils::find_ignore_ascii_case;

pub const MARK_CLASS: &str = "mdview-hit";
pub const CURRENT_CLASS: &str = "mdview-current";

const MARK_PREFIX: &str = "<mark class=\"";
const MARK_CLOSE: &str = "</mark>";
/// Attribute tails written by `marker_open`, up to the match index
const PLAIN_ATTRS: &str = "mdview-hit\" data-hit=\"";
const CURRENT_ATTRS: &str = "mdview-hit mdview-current\" data-hit=\"";

/// Elements whose content is never searched
const OPAQUE_ELEMENTS: [&str; 10] = [
    "script", "style", "textarea", "title", "noscript", "template", "svg", "math", "iframe", "object",
];

/// Highlighted document and the number of markers inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSet {
    pub html: String,
    pub count: usize,
}

/// Search state for the displayed document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchService {
    query: String,
    current: Option<usize>,
    total: usize,
}

impl SearchService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Forget query and matches without touching any document
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Clear previous markers from `document` and mark every occurrence of `query`
    pub fn search(&mut self, document: &mut String, query: &str) -> usize {
        let cleared = clear_highlights(document);
        self.query = query.to_string();
        self.current = None;
        if query.is_empty() {
            debug!("Empty search query, clearing highlights");
            *document = cleared;
            self.total = 0;
            return 0;
        }

        let start_time = std::time::Instant::now();
        let found = highlight(&cleared, query);
        *document = found.html;
        self.total = found.count;
        info!(
            "Search for '{}' found {} match(es) in {}ms",
            query,
            found.count,
            start_time.elapsed().as_millis()
        );
        self.total
    }

    /// Make marker `index` the current match; out-of-range indices change nothing
    pub fn go_to(&mut self, document: &mut String, index: usize) -> bool {
        if index >= self.total {
            return false;
        }
        let (restyled, found) = select_marker(document, index);
        if found {
            *document = restyled;
            self.current = Some(index);
        }
        found
    }

    /// Advance to the following match, wrapping to the first; `None` when there is nothing to visit
    pub fn next(&mut self, document: &mut String) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        let index = self.current.map_or(0, |c| (c + 1) % self.total);
        self.go_to(document, index).then_some(index)
    }

    /// Step back to the preceding match, wrapping to the last
    pub fn previous(&mut self, document: &mut String) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        let index = self.current.map_or(self.total - 1, |c| (c + self.total - 1) % self.total);
        self.go_to(document, index).then_some(index)
    }
}

/// Replace every marker with its own text
pub fn clear_highlights(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some((before, inner, after)) = next_marker(rest) {
        out.push_str(before);
        out.push_str(inner.text);
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Mark every case-insensitive occurrence of `query` in the visible text of `html`
pub fn highlight(html: &str, query: &str) -> MatchSet {
    let needle: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return MatchSet { html: html.to_string(), count: 0 };
    }

    let mut out = String::with_capacity(html.len());
    let mut count = 0;
    for fragment in split_fragments(html) {
        match fragment {
            Fragment::Markup(range) => out.push_str(&html[range]),
            Fragment::Text(range) => {
                let mut cursor = range.start;
                for hit in find_in_text(html, range.clone(), &needle) {
                    out.push_str(&html[cursor..hit.start]);
                    out.push_str(&marker_open(count, false));
                    out.push_str(&html[hit.clone()]);
                    out.push_str(MARK_CLOSE);
                    cursor = hit.end;
                    count += 1;
                }
                out.push_str(&html[cursor..range.end]);
            }
        }
    }
    MatchSet { html: out, count }
}

/// Restyle markers so only `index` carries the current-match class
pub fn select_marker(html: &str, index: usize) -> (String, bool) {
    let mut out = String::with_capacity(html.len() + 16);
    let mut found = false;
    let mut rest = html;
    while let Some((before, inner, after)) = next_marker(rest) {
        let is_current = inner.index == index;
        found |= is_current;
        out.push_str(before);
        out.push_str(&marker_open(inner.index, is_current));
        out.push_str(inner.text);
        out.push_str(MARK_CLOSE);
        rest = after;
    }
    out.push_str(rest);
    (out, found)
}

fn marker_open(index: usize, current: bool) -> String {
    if current {
        format!("<mark class=\"{MARK_CLASS} {CURRENT_CLASS}\" data-hit=\"{index}\">")
    } else {
        format!("<mark class=\"{MARK_CLASS}\" data-hit=\"{index}\">")
    }
}

struct Marker<'a> {
    text: &'a str,
    index: usize,
}

/// Split off the first marker: text before it, the marker, and everything after.
/// Only the exact opening tags `marker_open` writes are recognised.
fn next_marker(html: &str) -> Option<(&str, Marker<'_>, &str)> {
    let mut from = 0;
    loop {
        let start = from + html[from..].find(MARK_PREFIX)?;
        from = start + MARK_PREFIX.len();
        let attrs = &html[from..];
        let Some(rest) = attrs.strip_prefix(PLAIN_ATTRS).or_else(|| attrs.strip_prefix(CURRENT_ATTRS)) else {
            continue;
        };
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if !rest[digits..].starts_with("\">") {
            continue;
        }
        let Ok(index) = rest[..digits].parse::<usize>() else {
            continue;
        };
        let body_start = html.len() - rest.len() + digits + 2;
        let close = html[body_start..].find(MARK_CLOSE)?;
        return Some((
            &html[..start],
            Marker { text: &html[body_start..body_start + close], index },
            &html[body_start + close + MARK_CLOSE.len()..],
        ));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fragment {
    Markup(Range<usize>),
    Text(Range<usize>),
}

/// Split `html` into markup and searchable text, in document order
fn split_fragments(html: &str) -> Vec<Fragment> {
    let bytes = html.as_bytes();
    let mut fragments = Vec::new();
    let mut in_head = false;
    let mut text_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }
        let Some(end) = tag_end(html, pos) else {
            pos += 1;
            continue;
        };
        if text_start < pos {
            let range = text_start..pos;
            fragments.push(if in_head { Fragment::Markup(range) } else { Fragment::Text(range) });
        }

        let mut markup_end = end;
        if let Some((closing, name)) = tag_name(&html[pos..end]) {
            match (closing, name.as_str()) {
                (false, "head") => in_head = true,
                (true, "head") | (false, "body") => in_head = false,
                (false, n) if OPAQUE_ELEMENTS.contains(&n) && !html[pos..end].ends_with("/>") => {
                    markup_end = closing_tag_end(html, end, n).unwrap_or(html.len());
                }
                _ => {}
            }
        }
        fragments.push(Fragment::Markup(pos..markup_end));
        pos = markup_end;
        text_start = pos;
    }

    if text_start < bytes.len() {
        let range = text_start..bytes.len();
        fragments.push(if in_head { Fragment::Markup(range) } else { Fragment::Text(range) });
    }
    fragments
}

/// End (exclusive) of the tag, comment or declaration starting at `start`
fn tag_end(html: &str, start: usize) -> Option<usize> {
    let rest = &html[start..];
    if rest.starts_with("<!--") {
        return Some(rest[4..].find("-->").map_or(html.len(), |i| start + 4 + i + 3));
    }
    let bytes = rest.as_bytes();
    let opens_tag = match bytes.get(1) {
        Some(b) if b.is_ascii_alphabetic() || *b == b'!' || *b == b'?' => true,
        Some(b'/') => bytes.get(2).is_some_and(|b| b.is_ascii_alphabetic()),
        _ => false,
    };
    if !opens_tag {
        return None;
    }

    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'>' => return Some(start + i + 1),
            b'=' => {
                i += 1;
                while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
                    i += 1;
                }
                if let Some(&quote) = bytes.get(i).filter(|b| **b == b'"' || **b == b'\'') {
                    i += 1 + rest[i + 1..].find(quote as char)? + 1;
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Lowercased element name of a tag and whether it closes an element
fn tag_name(tag: &str) -> Option<(bool, String)> {
    let body = tag.strip_prefix('<')?;
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (!name.is_empty()).then_some((closing, name))
}

/// End (exclusive) of the `</name>` tag closing an opaque element
fn closing_tag_end(html: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("</{name}");
    let mut search_from = from;
    loop {
        let at = search_from + find_ignore_ascii_case(&html[search_from..], &needle)?;
        let after = at + needle.len();
        match html.as_bytes().get(after) {
            Some(b) if b.is_ascii_alphanumeric() || *b == b'-' => search_from = after,
            _ => return Some(html[after..].find('>').map_or(html.len(), |i| after + i + 1)),
        }
    }
}

/// One decoded character of a text fragment and the source bytes it came from
struct Unit {
    ch: char,
    span: Range<usize>,
}

fn decode_units(html: &str, range: Range<usize>) -> Vec<Unit> {
    let text = &html[range.clone()];
    let mut units = Vec::with_capacity(text.len());
    let mut iter = text.char_indices().peekable();
    while let Some((offset, ch)) = iter.next() {
        let start = range.start + offset;
        if ch == '&' {
            if let Some((decoded, len)) = decode_entity(&text[offset..]) {
                while iter.peek().is_some_and(|(o, _)| *o < offset + len) {
                    iter.next();
                }
                units.push(Unit { ch: decoded, span: start..start + len });
                continue;
            }
        }
        units.push(Unit { ch, span: start..start + ch.len_utf8() });
    }
    units
}

/// Decode a character reference at the start of `text`, returning the char and its byte length
fn decode_entity(text: &str) -> Option<(char, usize)> {
    let end = text.get(..32.min(text.len())).unwrap_or(text).find(';')?;
    let body = &text[1..end];
    let ch = if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        char::from_u32(code)?
    } else {
        match body {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{a0}',
            _ => return None,
        }
    };
    Some((ch, end + 1))
}

/// Source byte ranges of non-overlapping matches of `needle` (already lowercased) in a text fragment
fn find_in_text(html: &str, range: Range<usize>, needle: &[char]) -> Vec<Range<usize>> {
    let units = decode_units(html, range);
    let folded: Vec<(char, usize)> = units
        .iter()
        .enumerate()
        .flat_map(|(i, u)| u.ch.to_lowercase().map(move |c| (c, i)))
        .collect();

    let starts_unit = |i: usize| i == 0 || folded[i - 1].1 != folded[i].1;
    let ends_unit = |i: usize| i + 1 == folded.len() || folded[i + 1].1 != folded[i].1;

    let mut hits = Vec::new();
    let mut i = 0;
    while i + needle.len() <= folded.len() {
        let last = i + needle.len() - 1;
        let is_hit = folded[i..=last].iter().map(|(c, _)| c).eq(needle.iter())
            && starts_unit(i)
            && ends_unit(last);
        if is_hit {
            hits.push(units[folded[i].1].span.start..units[folded[last].1].span.end);
            i = last + 1;
        } else {
            i += 1;
        }
    }
    hits
}
