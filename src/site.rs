//! Selector descriptors and the per-site extraction profile.
//!
//! Everything the locator and extractor try, and in which order, lives here
//! as plain data. Update this file when the target markup drifts.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use crate::error::SelectorError;
use crate::promotion::PromotionRules;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorSpec {
    /// Element type, e.g. a custom product-card tag.
    Tag(String),
    /// A single class name.
    Class(String),
    /// Any CSS selector.
    Css(String),
}

impl SelectorSpec {
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    pub fn css(expr: impl Into<String>) -> Self {
        Self::Css(expr.into())
    }

    pub fn to_css(&self) -> String {
        match self {
            Self::Tag(name) => name.clone(),
            Self::Class(name) => format!(".{name}"),
            Self::Css(expr) => expr.clone(),
        }
    }

    pub fn compile(&self) -> Result<Selector, SelectorError> {
        let css = self.to_css();
        Selector::parse(&css).map_err(|e| SelectorError {
            reason: e.to_string(),
            css: css.clone(),
        })
    }
}

impl fmt::Display for SelectorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(name) => write!(f, "tag {name}"),
            Self::Class(name) => write!(f, "class {name}"),
            Self::Css(expr) => write!(f, "css {expr}"),
        }
    }
}

static LIRA_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d.,]*)\s*TL").expect("amount pattern compiles"));

#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Candidate strategies, first non-empty result wins.
    pub candidates: Vec<SelectorSpec>,
    /// Child element holding the displayed amount.
    pub price: SelectorSpec,
    /// Textual fallback: an amount followed by the currency token. The first
    /// capture group is handed to the price normalizer.
    pub amount_pattern: Regex,
    pub unit_selector: SelectorSpec,
    pub unit_attribute: String,
    pub default_unit: String,
    pub promotion: PromotionRules,
}

impl SiteProfile {
    pub fn migros() -> Self {
        Self {
            candidates: vec![
                SelectorSpec::tag("fe-product-card"),
                SelectorSpec::class("product-card"),
            ],
            price: SelectorSpec::class("amount"),
            amount_pattern: LIRA_AMOUNT.clone(),
            unit_selector: SelectorSpec::class("unit"),
            unit_attribute: "data-unit".to_owned(),
            default_unit: "adet".to_owned(),
            promotion: PromotionRules::default(),
        }
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::migros()
    }
}
