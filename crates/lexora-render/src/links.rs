//! Markdown-style link splitting.
//!
//! Only the `[label](http://...)` and `[label](https://...)` forms are
//! recognized. Matching is left to right and never overlaps; everything
//! outside a match is literal text.

/// One piece of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text. May contain newlines, which render as line breaks.
    Text(&'a str),
    /// A clickable link.
    Link {
        /// Visible label.
        text: &'a str,
        /// Absolute `http`/`https` target.
        url: &'a str,
    },
}

impl<'a> Segment<'a> {
    /// Text shown to the reader: the literal text or the link label.
    #[must_use]
    pub const fn visible_text(&self) -> &'a str {
        match *self {
            Self::Text(text) | Self::Link { text, .. } => text,
        }
    }
}

/// Split `text` into literal runs and links.
#[must_use]
pub fn parse_links(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    let mut search = 0;

    while let Some(offset) = text[search..].find('[') {
        let open = search + offset;
        match link_at(text, open) {
            Some((label, url, end)) => {
                if open > last {
                    segments.push(Segment::Text(&text[last..open]));
                }
                segments.push(Segment::Link { text: label, url });
                last = end;
                search = end;
            }
            None => search = open + 1,
        }
    }

    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }

    segments
}

/// Try to read a link whose `[` is at `open`. Returns label, url and the
/// byte offset just past the closing parenthesis.
fn link_at(text: &str, open: usize) -> Option<(&str, &str, usize)> {
    let label_start = open + 1;
    let label_len = text[label_start..].find(']')?;
    if label_len == 0 {
        return None;
    }
    let label = &text[label_start..label_start + label_len];

    let target_start = label_start + label_len + 1;
    let target = text[target_start..].strip_prefix('(')?;
    let scheme_len = if target.starts_with("https://") {
        "https://".len()
    } else if target.starts_with("http://") {
        "http://".len()
    } else {
        return None;
    };

    let rest_len = target[scheme_len..].find(')')?;
    if rest_len == 0 {
        return None;
    }
    let url_len = scheme_len + rest_len;

    Some((label, &target[..url_len], target_start + 1 + url_len + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_one_segment() {
        assert_eq!(parse_links("no links here"), [Segment::Text("no links here")]);
        assert!(parse_links("").is_empty());
    }

    #[test]
    fn link_between_text() {
        let segments = parse_links("See [Civil Code](https://lex.uz/docs/111181) art. 150.");
        assert_eq!(
            segments,
            [
                Segment::Text("See "),
                Segment::Link {
                    text: "Civil Code",
                    url: "https://lex.uz/docs/111181"
                },
                Segment::Text(" art. 150."),
            ]
        );
    }

    #[test]
    fn adjacent_links() {
        let segments = parse_links("[a](http://x.uz)[b](https://y.uz)");
        assert_eq!(
            segments,
            [
                Segment::Link { text: "a", url: "http://x.uz" },
                Segment::Link { text: "b", url: "https://y.uz" },
            ]
        );
    }

    #[test]
    fn relative_and_malformed_links_stay_literal() {
        for text in [
            "[docs](/relative/path)",
            "[docs](ftp://host/file)",
            "[](https://empty.label)",
            "[docs](https://)",
            "[docs] (https://space.before)",
            "[docs](https://never-closed",
        ] {
            assert_eq!(parse_links(text), [Segment::Text(text)], "{text}");
        }
    }

    #[test]
    fn label_may_contain_open_bracket() {
        let segments = parse_links("[a [b](https://x.uz)");
        assert_eq!(segments, [Segment::Link { text: "a [b", url: "https://x.uz" }]);
    }

    #[test]
    fn failed_candidate_does_not_hide_later_link() {
        let segments = parse_links("[x] and [y](https://y.uz)");
        assert_eq!(
            segments,
            [
                Segment::Text("[x] and "),
                Segment::Link { text: "y", url: "https://y.uz" },
            ]
        );
    }

    #[test]
    fn newlines_stay_in_text_runs() {
        let segments = parse_links("line one\n[l](https://a.uz)\nline two");
        assert_eq!(segments[0], Segment::Text("line one\n"));
        assert_eq!(segments[2], Segment::Text("\nline two"));
    }

    #[test]
    fn visible_text_drops_only_markup_and_urls() {
        let text = "Per [art. 5](https://lex.uz/5), and [art. 6](http://lex.uz/6) too.";
        let visible: String = parse_links(text).iter().map(Segment::visible_text).collect();
        assert_eq!(visible, "Per art. 5, and art. 6 too.");
    }
}
