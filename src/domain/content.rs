//! Helpers that derive listing fields from Markdown content.

use std::{cell::RefCell, rc::Rc};

use comrak::{Arena, Options, nodes::NodeValue, parse_document};
use lol_html::{RewriteStrSettings, element, rewrite_str};
use tracing::debug;

const SUMMARY_FALLBACK_CHARS: usize = 100;

/// Returns the stored summary, or the first 100 characters of the content
/// when no summary was written.
pub fn summary_or_excerpt(summary: &str, content: &str) -> String {
    if !summary.is_empty() {
        return summary.to_string();
    }
    content.chars().take(SUMMARY_FALLBACK_CHARS).collect()
}

/// Finds the first image the rendered content would show: a Markdown image
/// (inline or reference style) or an `<img>` inside raw HTML. Code blocks
/// and code spans are not rendered, so images in them are ignored.
pub fn extract_image(content: &str) -> Option<String> {
    let arena = Arena::new();
    let root = parse_document(&arena, content, &Options::default());

    root.descendants().find_map(|node| {
        let data = node.data.borrow();
        match &data.value {
            NodeValue::Image(link) => (!link.url.is_empty()).then(|| link.url.clone()),
            NodeValue::HtmlInline(html) => first_img_src(html),
            NodeValue::HtmlBlock(block) => first_img_src(&block.literal),
            _ => None,
        }
    })
}

fn first_img_src(html: &str) -> Option<String> {
    let found: Rc<RefCell<Option<String>>> = Rc::default();

    let outcome = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("img[src]", {
                let found = Rc::clone(&found);
                move |el| {
                    let mut slot = found.borrow_mut();
                    if slot.is_none() {
                        *slot = el
                            .get_attribute("src")
                            .map(|src| src.trim().to_string())
                            .filter(|src| !src.is_empty());
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    );
    if let Err(err) = outcome {
        debug!(target = "inkpad::content", error = %err, "Skipping unparsable HTML fragment");
        return None;
    }

    found.take()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_wins_when_present() {
        assert_eq!(summary_or_excerpt("short", "long body"), "short");
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        let content = "字".repeat(150);
        let excerpt = summary_or_excerpt("", &content);
        assert_eq!(excerpt.chars().count(), 100);
    }

    #[test]
    fn short_content_is_used_whole() {
        assert_eq!(summary_or_excerpt("", "hello"), "hello");
    }

    #[test]
    fn finds_markdown_image() {
        let content = "intro\n\n![cover](https://img.example/a.png \"Cover\") and more";
        assert_eq!(
            extract_image(content).as_deref(),
            Some("https://img.example/a.png")
        );
    }

    #[test]
    fn finds_html_image() {
        let content = "<p>x</p><IMG alt='a' src='https://img.example/b.jpg'>";
        assert_eq!(
            extract_image(content).as_deref(),
            Some("https://img.example/b.jpg")
        );
    }

    #[test]
    fn earliest_image_wins() {
        let content = "<img src=\"first.png\"> then ![x](second.png)";
        assert_eq!(extract_image(content).as_deref(), Some("first.png"));
    }

    #[test]
    fn parentheses_inside_the_url_are_kept() {
        assert_eq!(
            extract_image("![a](https://e.com/a_(b).png)").as_deref(),
            Some("https://e.com/a_(b).png")
        );
    }

    #[test]
    fn images_in_code_are_skipped() {
        let content = "```\n![fake](fake.png)\n```\n\nSee `<img src=\"inline.png\">` and ![real](real.png)";
        assert_eq!(extract_image(content).as_deref(), Some("real.png"));
    }

    #[test]
    fn reference_style_images_resolve() {
        let content = "![logo][l]\n\n[l]: https://img.example/logo.svg";
        assert_eq!(
            extract_image(content).as_deref(),
            Some("https://img.example/logo.svg")
        );
    }

    #[test]
    fn img_without_src_is_skipped() {
        let content = "<img alt=\"none\">\n\n![later](later.png)";
        assert_eq!(extract_image(content).as_deref(), Some("later.png"));
    }

    #[test]
    fn no_image_yields_none() {
        assert_eq!(extract_image("[link](https://example.com)"), None);
    }
}
