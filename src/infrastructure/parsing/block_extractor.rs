//! Product container extraction from a scrolled listing page

#![allow(clippy::uninlined_format_args)]

use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};

use super::{ParsingResult, compile_selector};
use crate::infrastructure::config::yep_savings::{resolve_url, selectors};

/// Raw content of one product container, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedBlock {
    /// Position among the containers on the page
    pub index: usize,
    /// Inner text of the title/price node, empty when the node is missing
    pub text: String,
    /// Inner text of the whole container
    pub container_text: String,
    /// Absolute image URL, empty when the container has no image
    pub image_url: String,
}

impl ExtractedBlock {
    /// First line of the block text, which carries the external id.
    pub fn id_line(&self) -> Option<&str> {
        self.text.lines().next()
    }
}

pub struct BlockExtractor {
    container: Selector,
    block_text: Selector,
    image: Selector,
    last_update: Selector,
}

impl BlockExtractor {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            container: compile_selector(selectors::PRODUCT_CONTAINER)?,
            block_text: compile_selector(selectors::BLOCK_TEXT)?,
            image: compile_selector(selectors::IMAGE)?,
            last_update: compile_selector(selectors::LAST_UPDATE)?,
        })
    }

    /// Every product container in document order. Missing fields never drop a block.
    pub fn extract(&self, html: &str) -> Vec<ExtractedBlock> {
        let document = Html::parse_document(html);

        let blocks: Vec<ExtractedBlock> = document
            .select(&self.container)
            .enumerate()
            .map(|(index, container)| self.extract_block(index, container))
            .collect();

        debug!("Extracted {} product containers", blocks.len());
        blocks
    }

    fn extract_block(&self, index: usize, container: ElementRef<'_>) -> ExtractedBlock {
        let text = match container.select(&self.block_text).next() {
            Some(node) => inner_text(node),
            None => {
                warn!("Container {} has no title/price node", index);
                String::new()
            }
        };

        let image_url = match container.select(&self.image).next() {
            Some(img) => {
                let value = img.value();
                resolve_url(value.attr("src").or_else(|| value.attr("data-src")).unwrap_or_default())
            }
            None => String::new(),
        };
        if image_url.is_empty() {
            warn!("Container {} has no image", index);
        }

        ExtractedBlock {
            index,
            text,
            container_text: inner_text(container),
            image_url,
        }
    }

    /// Text of the "last updated" node, if the page shows one.
    pub fn last_update(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let found = document
            .select(&self.last_update)
            .map(|node| {
                node.text()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .find(|text| text.contains(selectors::LAST_UPDATE_MARKER));

        if found.is_none() {
            debug!("No last update marker on the listing page");
        }
        found
    }
}

/// Elements rendered on their own line.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol",
    "p", "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Elements whose text is never rendered.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Rendered text of `element`, one trimmed line per visual line.
///
/// Lines break at block elements and `<br>`. Inline descendants such as
/// `<b>` or `<sup>` stay on the line of their parent and whitespace inside a
/// line collapses to single spaces.
pub fn inner_text(element: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    let mut line = String::new();
    collect_lines(element, &mut lines, &mut line);
    end_line(&mut lines, &mut line);
    lines.join("\n")
}

fn collect_lines(element: ElementRef<'_>, lines: &mut Vec<String>, line: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => line.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if name == "br" {
                    end_line(lines, line);
                    continue;
                }
                if HIDDEN_ELEMENTS.contains(&name) {
                    continue;
                }
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };

                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    end_line(lines, line);
                }
                collect_lines(child, lines, line);
                if block {
                    end_line(lines, line);
                }
            }
            _ => {}
        }
    }
}

fn end_line(lines: &mut Vec<String>, line: &mut String) {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        lines.push(collapsed);
    }
    line.clear();
}
