//! Decorates canonical content with highlight wrappers for display

use html_escape::encode_double_quoted_attribute;
use tracing::warn;

use crate::markup::{self, tokenize, Token};
use crate::model::Highlight;

/// Render `content` with every highlight wrapped in `<span class="{wrapper_class}">`.
///
/// Highlights are spliced right to left so earlier offsets stay valid. A
/// highlight whose text crosses tags gets one wrapper per text run, closed
/// before each tag and reopened after it. Highlights that overlap an
/// already-spliced one, fall outside the content, or start or end inside a
/// tag are skipped. `render(content, &[], _) == content`.
pub fn render(content: &str, highlights: &[Highlight], wrapper_class: &str) -> String {
    if highlights.is_empty() {
        return content.to_string();
    }

    let tags = markup::tag_ranges(content);
    let mut ordered: Vec<(usize, &Highlight)> = highlights.iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| {
        b.starting_index
            .cmp(&a.starting_index)
            .then(ib.cmp(ia))
    });

    let mut out = content.to_string();
    // Everything at or past `floor` has already been rewritten
    let mut floor = content.len();

    for (index, highlight) in ordered {
        let range = highlight.range();
        if range.is_empty() || range.end > floor {
            warn!(index, ?range, "skipping overlapping or empty highlight");
            continue;
        }
        if markup::splits_tag(&tags, range.start) || markup::splits_tag(&tags, range.end) {
            warn!(index, ?range, "skipping highlight that cuts through a tag");
            continue;
        }
        let Some(target) = content.get(range.start..range.end) else {
            warn!(index, ?range, len = content.len(), "skipping highlight outside content");
            continue;
        };

        let wrapped = wrap(target, index, highlight.comment_text(), wrapper_class);
        out.replace_range(range.start..range.end, &wrapped);
        floor = range.start;
    }

    out
}

/// Wrap each text run of `target`, passing tags through untouched
fn wrap(target: &str, index: usize, comment: Option<&str>, class: &str) -> String {
    let mut open = format!(
        r#"<span class="{}" data-index="{index}""#,
        encode_double_quoted_attribute(class)
    );
    if let Some(comment) = comment {
        open.push_str(&format!(
            r#" data-comment="{}""#,
            encode_double_quoted_attribute(comment)
        ));
    }
    open.push('>');

    let mut out = String::with_capacity(target.len() + open.len() + 7);
    for (_, token) in tokenize(target) {
        match token {
            Token::Text(text) => {
                out.push_str(&open);
                out.push_str(text);
                out.push_str("</span>");
            }
            Token::Tag(tag) => out.push_str(tag.raw()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRange;

    const CLASS: &str = "highlight";

    fn hl(start: usize, end: usize, comment: Option<&str>) -> Highlight {
        Highlight::new(TextRange::new(start, end), comment.map(str::to_string))
    }

    #[test]
    fn no_highlights_is_identity() {
        let content = "<p>Some <em>content</em></p>";
        assert_eq!(render(content, &[], CLASS), content);
    }

    #[test]
    fn plain_text_gets_single_wrapper() {
        let out = render("abcdefghij", &[hl(2, 5, None)], CLASS);
        assert_eq!(
            out,
            r#"ab<span class="highlight" data-index="0">cde</span>fghij"#
        );
    }

    #[test]
    fn wrapper_is_split_around_tags() {
        // From inside <b> through "d"
        let out = render("<b>abc</b>def", &[hl(3, 11, None)], CLASS);
        assert_eq!(
            out,
            concat!(
                r#"<b><span class="highlight" data-index="0">abc</span></b>"#,
                r#"<span class="highlight" data-index="0">d</span>ef"#
            )
        );
    }

    #[test]
    fn several_highlights_keep_their_offsets() {
        let highlights = vec![hl(0, 2, None), hl(6, 8, None), hl(3, 5, None)];
        let out = render("abcdefghij", &highlights, CLASS);
        assert_eq!(
            out,
            concat!(
                r#"<span class="highlight" data-index="0">ab</span>c"#,
                r#"<span class="highlight" data-index="2">de</span>f"#,
                r#"<span class="highlight" data-index="1">gh</span>ij"#
            )
        );
    }

    #[test]
    fn comments_are_escaped() {
        let out = render("abc", &[hl(0, 3, Some(r#"He said "hi" & left"#))], CLASS);
        assert!(out.contains("data-comment=\"He said &quot;hi&quot; &amp; left\""));
    }

    #[test]
    fn rendering_is_deterministic() {
        let highlights = vec![hl(4, 9, Some("a")), hl(0, 3, Some("b"))];
        let content = "<p>The quick brown fox</p>";
        assert_eq!(
            render(content, &highlights, CLASS),
            render(content, &highlights, CLASS)
        );
    }

    #[test]
    fn broken_highlights_are_skipped() {
        let content = "<b>abc</b>def";
        // overlaps the next one, cuts a tag, runs past the end
        let highlights = vec![hl(4, 12, None), hl(10, 12, None), hl(1, 5, None), hl(11, 40, None)];
        let out = render(content, &highlights, CLASS);
        assert_eq!(
            out,
            r#"<b>abc</b><span class="highlight" data-index="1">de</span>f"#
        );
    }

    #[test]
    fn rendered_text_is_unchanged() {
        let content = "<p>one <b>two</b> three</p>";
        let out = render(content, &[hl(5, 17, Some("x"))], CLASS);
        assert_ne!(out, content);
        assert_eq!(markup::visible_text(&out), markup::visible_text(content));
    }
}
