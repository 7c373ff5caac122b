//! The rendering collaborator and the DOM snapshot extraction runs against.
//!
//! A [`Browser`] navigates and hands back a [`Page`]: the rendered DOM
//! serialized once and re-parsed with `scraper`, so locating and extracting
//! never talk to a live browser and can be exercised on plain HTML.

pub mod chrome;

use std::thread;
use std::time::Duration;

use scraper::{ElementRef, Html};

use crate::error::{BrowserError, SelectorError};
use crate::site::SelectorSpec;

pub trait Browser {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Captures the DOM as it is rendered right now.
    fn snapshot(&mut self) -> Result<Page, BrowserError>;

    /// Ends the session. Safe to call more than once.
    fn release(&mut self);
}

/// Anything the candidate cascade can be run against.
pub trait Dom {
    fn find_all(&self, selector: &SelectorSpec) -> Result<Vec<ElementRef<'_>>, SelectorError>;
}

/// How long to wait after navigation before the DOM is inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePolicy {
    Immediate,
    Fixed(Duration),
}

impl SettlePolicy {
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            Self::Immediate
        } else {
            Self::Fixed(Duration::from_millis(ms))
        }
    }

    pub fn settle(&self) {
        if let Self::Fixed(delay) = self {
            thread::sleep(*delay);
        }
    }
}

pub struct Page {
    url: String,
    html: Html,
}

impl Page {
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        Self {
            url: url.into(),
            html: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Matches under `node` in document order; empty when nothing matches.
    pub fn find_within<'a>(
        node: ElementRef<'a>,
        selector: &SelectorSpec,
    ) -> Result<Vec<ElementRef<'a>>, SelectorError> {
        let compiled = selector.compile()?;
        Ok(node.select(&compiled).collect())
    }

    /// Rendered-text approximation of `node`: block elements break lines,
    /// runs of whitespace collapse, blank lines are dropped.
    pub fn text(node: ElementRef<'_>) -> String {
        let mut raw = String::new();
        push_text(node, &mut raw);
        raw.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn attribute(node: ElementRef<'_>, name: &str) -> Option<String> {
        node.value().attr(name).map(str::to_owned)
    }
}

impl Dom for Page {
    fn find_all(&self, selector: &SelectorSpec) -> Result<Vec<ElementRef<'_>>, SelectorError> {
        let compiled = selector.compile()?;
        Ok(self.html.select(&compiled).collect())
    }
}

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

const HIDDEN_TAGS: &[&str] = &["script", "style", "template", "noscript"];

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if HIDDEN_TAGS.contains(&name) {
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            push_text(child, out);
            if block {
                out.push('\n');
            }
        }
    }
}
