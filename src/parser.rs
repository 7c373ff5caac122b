use scraper::ElementRef;
use tracing::debug;

use crate::browser::Page;
use crate::models::{MISSING_PRICE, UNKNOWN_TITLE};
use crate::price::normalize_price;
use crate::site::{SelectorSpec, SiteProfile};

/// What could be read off one candidate node.
#[derive(Debug, Clone, PartialEq)]
pub struct Fields {
    pub title: String,
    pub price: f64,
    pub unit: String,
    pub promotion: String,
}

pub fn extract_fields(node: ElementRef<'_>, profile: &SiteProfile) -> Fields {
    let text = Page::text(node);

    let title = text
        .lines()
        .next()
        .map(str::to_owned)
        .unwrap_or_else(|| UNKNOWN_TITLE.into());

    let price = structural_price(node, &profile.price)
        .or_else(|| textual_price(&text, profile))
        .unwrap_or(MISSING_PRICE);

    let unit = child_text(node, &profile.unit_selector)
        .or_else(|| Page::attribute(node, &profile.unit_attribute))
        .map(|u| u.trim().to_owned())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| profile.default_unit.clone());

    Fields {
        title,
        price,
        unit,
        promotion: profile.promotion.detect(&text),
    }
}

/// First tier: the dedicated amount element, accepted only when it yields a
/// non-missing value.
fn structural_price(node: ElementRef<'_>, selector: &SelectorSpec) -> Option<f64> {
    let raw = child_text(node, selector)?;
    let price = normalize_price(&raw);
    if price == MISSING_PRICE {
        debug!(%raw, "amount element present but unreadable");
        None
    } else {
        Some(price)
    }
}

/// Second tier: an amount followed by the currency token anywhere in the text.
fn textual_price(text: &str, profile: &SiteProfile) -> Option<f64> {
    let amount = profile.amount_pattern.captures(text)?.get(1)?;
    debug!(amount = amount.as_str(), "price read from listing text");
    Some(normalize_price(amount.as_str()))
}

/// Text of the first element under `node` matching `selector`. A selector
/// that fails to compile counts as no match.
fn child_text(node: ElementRef<'_>, selector: &SelectorSpec) -> Option<String> {
    match Page::find_within(node, selector) {
        Ok(found) => found.first().map(|child| Page::text(*child)),
        Err(e) => {
            debug!("structural probe skipped: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Dom;

    fn extract(html: &str) -> Fields {
        extract_with(html, &SiteProfile::migros())
    }

    fn extract_with(html: &str, profile: &SiteProfile) -> Fields {
        let page = Page::from_html("https://example.test", html);
        let card = page.find_all(&SelectorSpec::css("#card")).unwrap()[0];
        extract_fields(card, profile)
    }

    #[test]
    fn reads_title_price_and_default_unit() {
        let fields = extract(
            "<div id='card'><h5>Pınar Süt 1 L</h5>\
             <div><span class='amount'>42,50 TL</span></div></div>",
        );
        assert_eq!(
            fields,
            Fields {
                title: "Pınar Süt 1 L".into(),
                price: 42.5,
                unit: "adet".into(),
                promotion: String::new(),
            }
        );
    }

    #[test]
    fn price_falls_back_to_text_when_amount_element_missing() {
        let fields = extract("<div id='card'><p>Köy Yumurtası 30'lu</p><p>45,90 TL</p></div>");
        assert_eq!(fields.price, 45.9);
        assert_eq!(fields.title, "Köy Yumurtası 30'lu");
    }

    #[test]
    fn text_fallback_keeps_thousands_group() {
        let fields = extract("<div id='card'><p>Kaşar Peyniri 2 kg</p><p>1.250,00 TL</p></div>");
        assert_eq!(fields.price, 1250.0);
    }

    #[test]
    fn text_fallback_skips_numbers_not_followed_by_currency() {
        let fields = extract("<div id='card'><p>Yoğurt</p><p>3 Al 2 Öde</p><p>64,95 TL</p></div>");
        assert_eq!(fields.price, 64.95);
    }

    #[test]
    fn price_falls_back_to_text_when_amount_element_unreadable() {
        let fields = extract(
            "<div id='card'><p>Makarna</p><span class='amount'>--</span><p>19,95 TL</p></div>",
        );
        assert_eq!(fields.price, 19.95);
    }

    #[test]
    fn amount_element_takes_precedence_over_text() {
        let fields = extract(
            "<div id='card'><p>Pirinç</p><p>Eski fiyat 99,90 TL</p>\
             <span class='amount'>79,90 TL</span></div>",
        );
        assert_eq!(fields.price, 79.9);
    }

    #[test]
    fn no_price_anywhere_keeps_missing_sentinel() {
        let fields = extract("<div id='card'><p>Zeytin</p><p>Stokta yok</p></div>");
        assert_eq!(fields.price, MISSING_PRICE);
        assert_eq!(fields.title, "Zeytin");
    }

    #[test]
    fn empty_candidate_has_unknown_title() {
        let fields = extract("<div id='card'><img src='x.png'></div>");
        assert_eq!(fields.title, UNKNOWN_TITLE);
        assert_eq!(fields.price, MISSING_PRICE);
        assert_eq!(fields.promotion, "");
    }

    #[test]
    fn promotion_detected_from_candidate_text() {
        let fields = extract(
            "<div id='card'><p>Yoğurt</p><p>3 Al 2 Öde</p><span class='amount'>64,95</span></div>",
        );
        assert_eq!(fields.promotion, "Kampanya Var");
    }

    #[test]
    fn unit_from_child_element_then_attribute() {
        let child = extract("<div id='card'><p>Domates</p><span class='unit'> kg </span></div>");
        assert_eq!(child.unit, "kg");

        let attr = extract("<div id='card' data-unit='500 g'><p>Soğan</p></div>");
        assert_eq!(attr.unit, "500 g");
    }

    #[test]
    fn broken_structural_selector_falls_through_to_text() {
        let mut profile = SiteProfile::migros();
        profile.price = SelectorSpec::css("span[");
        let fields = extract_with("<div id='card'><p>Ekmek</p><p>12,50 TL</p></div>", &profile);
        assert_eq!(fields.price, 12.5);
    }
}
