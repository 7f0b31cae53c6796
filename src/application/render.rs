//! HTML rendering for post bodies.

use std::fmt::Write as _;

use ammonia::clean_text;

use crate::domain::posts::PostBlock;

/// Renders post body blocks into markup. Swap implementations to change the output format.
pub trait BodyRenderer: Send + Sync {
    fn render(&self, blocks: &[PostBlock]) -> String;
}

/// Plain semantic HTML with every text node escaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlBodyRenderer;

impl BodyRenderer for HtmlBodyRenderer {
    fn render(&self, blocks: &[PostBlock]) -> String {
        let mut html = String::new();
        for block in blocks {
            match block {
                PostBlock::Paragraph(text) => {
                    let _ = write!(html, "<p>{}</p>", clean_text(text));
                }
                PostBlock::Heading { level, text } => {
                    // h1 belongs to the post title.
                    let level = (*level).clamp(2, 6);
                    let _ = write!(html, "<h{level}>{}</h{level}>", clean_text(text));
                }
                PostBlock::List(items) => {
                    html.push_str("<ul>");
                    for item in items.iter() {
                        let _ = write!(html, "<li>{}</li>", clean_text(item));
                    }
                    html.push_str("</ul>");
                }
            }
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_each_block_kind() {
        let blocks = [
            PostBlock::Heading {
                level: 2,
                text: "Why Rust?",
            },
            PostBlock::Paragraph("Fast."),
            PostBlock::List(&["one", "two"]),
        ];
        assert_eq!(
            HtmlBodyRenderer.render(&blocks),
            "<h2>Why&#32;Rust?</h2><p>Fast.</p><ul><li>one</li><li>two</li></ul>"
        );
    }

    #[test]
    fn escapes_markup_in_text() {
        let html = HtmlBodyRenderer.render(&[PostBlock::Paragraph("<script>x</script>")]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn heading_levels_are_clamped() {
        let html = HtmlBodyRenderer.render(&[
            PostBlock::Heading { level: 1, text: "a" },
            PostBlock::Heading { level: 9, text: "b" },
        ]);
        assert_eq!(html, "<h2>a</h2><h6>b</h6>");
    }
}
