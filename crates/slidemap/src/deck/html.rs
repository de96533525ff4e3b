//! Tolerant parsing of slide fragments into renderable blocks.
//!
//! Slides are hand-written HTML fragments. Only the structure the viewer
//! renders is recovered; anything else is stripped to its text.

use std::sync::LazyLock;

use regex::Regex;

use super::{Block, Inline};

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>|<p\b[^>]*>(.*?)</p\s*>|<li\b[^>]*>(.*?)</li\s*>|<blockquote\b[^>]*>(.*?)</blockquote\s*>|<hr\b[^>]*>|<div\b([^>]*)>"#,
    )
    .expect("block pattern is valid")
});

static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<(a|span)\b([^>]*)>(.*?)</(?:a|span)\s*>|<(strong|b)\b[^>]*>(.*?)</(?:strong|b)\s*>"#)
        .expect("inline pattern is valid")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));

static DATA_LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bdata-location\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("data-location pattern is valid")
});

static ELEMENT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(/?)([a-z][a-z0-9-]*)\b([^>]*)>").expect("element tag pattern is valid")
});

static ID_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("id pattern is valid")
});

static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("class pattern is valid")
});

/// Parse one slide fragment.
pub fn parse_fragment(markup: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for caps in BLOCK_RE.captures_iter(markup) {
        if let (Some(level), Some(inner)) = (caps.get(1), caps.get(2)) {
            let level = level.as_str().parse::<u8>().unwrap_or(1);
            push_text_block(&mut blocks, inner.as_str(), |inlines| Block::Heading {
                level,
                inlines,
            });
        } else if let Some(inner) = caps.get(3) {
            push_text_block(&mut blocks, inner.as_str(), |inlines| Block::Paragraph {
                inlines,
            });
        } else if let Some(inner) = caps.get(4) {
            push_text_block(&mut blocks, inner.as_str(), |inlines| Block::ListItem {
                inlines,
            });
        } else if let Some(inner) = caps.get(5) {
            push_text_block(&mut blocks, inner.as_str(), |inlines| Block::Quote {
                inlines,
            });
        } else if let Some(attrs) = caps.get(6) {
            let attrs = attrs.as_str();
            if attr_value(&ID_ATTR_RE, attrs) == Some("map") {
                blocks.push(Block::MapContainer);
            } else if has_class(attrs, "decorative-line") {
                blocks.push(Block::Divider);
            }
        } else {
            blocks.push(Block::Divider);
        }
    }
    blocks
}

fn push_text_block(blocks: &mut Vec<Block>, inner: &str, make: impl FnOnce(Vec<Inline>) -> Block) {
    let inlines = parse_inlines(inner);
    if inlines.iter().any(|i| !i.text().trim().is_empty()) {
        blocks.push(make(inlines));
    }
}

/// Parse inline markup: strong runs, location links, plain text.
pub fn parse_inlines(markup: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut last = 0;
    for caps in INLINE_RE.captures_iter(markup) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        push_plain(&mut inlines, &markup[last..whole.start]);
        last = whole.end;

        if let (Some(attrs), Some(inner)) = (caps.get(2), caps.get(3)) {
            let label = collapse_whitespace(&decode_entities(&strip_tags(inner.as_str())));
            match location_name(attrs.as_str(), &label) {
                Some(name) => inlines.push(Inline::Location { label, name }),
                None => push_plain(&mut inlines, inner.as_str()),
            }
        } else if let Some(inner) = caps.get(5) {
            let text = collapse_whitespace(&decode_entities(&strip_tags(inner.as_str())));
            if !text.is_empty() {
                inlines.push(Inline::Strong(text));
            }
        }
    }
    push_plain(&mut inlines, &markup[last..]);
    trim_edges(&mut inlines);
    inlines
}

/// Location name carried by an inline element, if it is a location link.
fn location_name(attrs: &str, label: &str) -> Option<String> {
    if let Some(caps) = DATA_LOCATION_RE.captures(attrs) {
        let value = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())?;
        let value = decode_entities(value).trim().to_string();
        if !value.is_empty() {
            return Some(value);
        }
    }
    if has_class(attrs, "location-link") && !label.is_empty() {
        return Some(label.to_string());
    }
    None
}

fn push_plain(inlines: &mut Vec<Inline>, markup: &str) {
    let text = collapse_whitespace(&decode_entities(&strip_tags(markup)));
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(prev)) = inlines.last_mut() {
        prev.push_str(&text);
    } else {
        inlines.push(Inline::Text(text));
    }
}

fn trim_edges(inlines: &mut Vec<Inline>) {
    if let Some(Inline::Text(first)) = inlines.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(Inline::Text(last)) = inlines.last_mut() {
        *last = last.trim_end().to_string();
    }
    inlines.retain(|i| !matches!(i, Inline::Text(t) if t.is_empty()));
}

/// One opening or closing tag found in a page.
struct Tag<'a> {
    name: &'a str,
    attrs: &'a str,
    closing: bool,
    start: usize,
    end: usize,
}

/// Split a pre-rendered page into the inner markup of every element carrying
/// the `slide` class (`<section class="slide">`, `<div class="slide">`, ...).
///
/// The closing tag is found by counting nested elements of the same name, so
/// a `<div class="slide">` may contain any number of inner `<div>`s. An
/// unclosed slide runs to the end of the page.
pub fn split_page(page: &str) -> Vec<String> {
    let tags: Vec<Tag<'_>> = ELEMENT_TAG_RE
        .captures_iter(page)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let attrs = caps.get(3).map_or("", |m| m.as_str());
            if attrs.trim_end().ends_with('/') {
                return None;
            }
            Some(Tag {
                name: caps.get(2)?.as_str(),
                attrs,
                closing: caps.get(1).is_some_and(|m| !m.as_str().is_empty()),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect();

    let mut slides = Vec::new();
    let mut i = 0;
    while i < tags.len() {
        let open = &tags[i];
        if open.closing || !has_class(open.attrs, "slide") {
            i += 1;
            continue;
        }

        let mut depth = 0usize;
        let mut close = None;
        for (j, tag) in tags.iter().enumerate().skip(i) {
            if !tag.name.eq_ignore_ascii_case(open.name) {
                continue;
            }
            if tag.closing {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    close = Some(j);
                    break;
                }
            } else {
                depth += 1;
            }
        }

        match close {
            Some(j) => {
                slides.push(page[open.end..tags[j].start].trim().to_string());
                i = j + 1;
            }
            None => {
                slides.push(page[open.end..].trim().to_string());
                break;
            }
        }
    }
    slides
}

fn strip_tags(markup: &str) -> String {
    // <br> is the only tag that carries spacing worth keeping
    let markup = markup.replace("<br>", " ").replace("<br/>", " ").replace("<br />", " ");
    TAG_RE.replace_all(&markup, "").into_owned()
}

/// Collapse runs of whitespace the way a browser does, keeping one leading and
/// one trailing space so adjacent runs stay separated.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&hellip;", "\u{2026}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn attr_value<'a>(pattern: &Regex, attrs: &'a str) -> Option<&'a str> {
    let caps = pattern.captures(attrs)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

fn has_class(attrs: &str, class: &str) -> bool {
    attr_value(&CLASS_ATTR_RE, attrs)
        .is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_in_document_order() {
        let markup = r#"
            <h2>The First Journey</h2>
            <p>Paul and Barnabas set out.</p>
            <ul><li>Cyprus</li><li>Galatia</li></ul>
            <div class="decorative-line"></div>
        "#;
        let blocks = parse_fragment(markup);
        assert_eq!(blocks.len(), 5);
        assert!(matches!(blocks[0], Block::Heading { level: 2, .. }));
        assert!(matches!(blocks[1], Block::Paragraph { .. }));
        assert!(matches!(blocks[2], Block::ListItem { .. }));
        assert!(matches!(blocks[3], Block::ListItem { .. }));
        assert!(matches!(blocks[4], Block::Divider));
    }

    #[test]
    fn test_map_container() {
        let blocks = parse_fragment(r#"<h2>Route</h2><div id="map" class="map"></div>"#);
        assert_eq!(blocks.last(), Some(&Block::MapContainer));
        let blocks = parse_fragment(r#"<div class="content"><p>No map here</p></div>"#);
        assert!(!blocks.contains(&Block::MapContainer));
    }

    #[test]
    fn test_location_links() {
        let inlines = parse_inlines(
            r##"They sailed from <a href="#" data-location="Seleucia Pieria">Seleucia</a> to <span class="location-link">Salamis, Cyprus</span>."##,
        );
        assert_eq!(inlines.len(), 5);
        assert_eq!(inlines[0], Inline::Text("They sailed from ".to_string()));
        assert_eq!(
            inlines[1],
            Inline::Location {
                label: "Seleucia".to_string(),
                name: "Seleucia Pieria".to_string(),
            }
        );
        assert_eq!(
            inlines[3],
            Inline::Location {
                label: "Salamis, Cyprus".to_string(),
                name: "Salamis, Cyprus".to_string(),
            }
        );
        assert_eq!(inlines[4], Inline::Text(".".to_string()));
    }

    #[test]
    fn test_plain_anchor_is_text() {
        let inlines = parse_inlines(r#"See <a href="https://example.org">the notes</a> later"#);
        assert_eq!(inlines, vec![Inline::Text("See the notes later".to_string())]);
    }

    #[test]
    fn test_strong_and_entities() {
        let inlines = parse_inlines("<strong>Acts 13&ndash;14</strong> &amp; more");
        assert_eq!(inlines[0], Inline::Strong("Acts 13\u{2013}14".to_string()));
        assert_eq!(inlines[1], Inline::Text(" & more".to_string()));
    }

    #[test]
    fn test_whitespace_collapses() {
        let blocks = parse_fragment("<p>\n   Several\n\n   lines   here\n</p>");
        let Block::Paragraph { inlines } = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(inlines, &vec![Inline::Text("Several lines here".to_string())]);
    }

    #[test]
    fn test_empty_paragraphs_skipped() {
        let blocks = parse_fragment("<p>  </p><p>&nbsp;</p><p>Kept</p>");
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_split_page() {
        let page = r#"<html><body>
            <section class="slide active"><h1>One</h1></section>
            <section class="slide"><h1>Two</h1></section>
            <section class="notes"><p>Not a slide</p></section>
        </body></html>"#;
        let slides = split_page(page);
        assert_eq!(slides, vec!["<h1>One</h1>", "<h1>Two</h1>"]);
    }

    #[test]
    fn test_split_page_div_slides_with_nested_divs() {
        let page = r#"<div class="deck">
            <div class="slide active">
                <h1>One</h1>
                <div class="content"><div class="decorative-line"></div><p>Intro</p></div>
            </div>
            <div class="slide"><h2>Two</h2><div id="map"></div></div>
            <div class="slideshow-controls"><button>Next</button></div>
        </div>"#;
        let slides = split_page(page);
        assert_eq!(slides.len(), 2);
        assert!(slides[0].starts_with("<h1>One</h1>"));
        assert!(slides[0].ends_with("<p>Intro</p></div>"));
        assert_eq!(slides[1], r#"<h2>Two</h2><div id="map"></div>"#);
        assert!(parse_fragment(&slides[1]).contains(&Block::MapContainer));
    }

    #[test]
    fn test_split_page_unclosed_slide_runs_to_end() {
        let slides = split_page(r#"<section class="slide"><h1>Last</h1>"#);
        assert_eq!(slides, vec!["<h1>Last</h1>"]);
    }

    #[test]
    fn test_class_match_is_by_word() {
        assert!(has_class(r#" class="slide active""#, "slide"));
        assert!(!has_class(r#" class="slideshow""#, "slide"));
        assert_eq!(attr_value(&ID_ATTR_RE, r#" data-id="x" id='map'"#), Some("map"));
    }
}
