/// Substring markers that flag a promotional listing.
///
/// Matching favors recall: a human audits the daily file, so a false
/// positive is cheaper than a missed campaign. The matched phrase itself is
/// not kept, only the generic tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRules {
    pub markers: Vec<String>,
    pub tag: String,
}

impl PromotionRules {
    pub fn new<I, S>(markers: I, tag: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
            tag: tag.into(),
        }
    }

    /// Returns the promotion tag, or an empty string when no marker occurs in `text`.
    pub fn detect(&self, text: &str) -> String {
        if self.markers.iter().any(|m| !m.is_empty() && text.contains(m.as_str())) {
            self.tag.clone()
        } else {
            String::new()
        }
    }
}

impl Default for PromotionRules {
    fn default() -> Self {
        // "3 Al 2" is a multi-buy; "2." catches tiered offers like "2. ürün %50".
        Self::new(["3 Al 2", "2."], "Kampanya Var")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_buy_marker_yields_tag() {
        let rules = PromotionRules::default();
        assert_eq!(rules.detect("Sütaş Yoğurt\n3 Al 2 Öde\n64,95 TL"), "Kampanya Var");
    }

    #[test]
    fn tiered_discount_marker_yields_tag() {
        let rules = PromotionRules::default();
        assert_eq!(rules.detect("2. Ürün %50 İndirimli"), "Kampanya Var");
    }

    #[test]
    fn plain_listing_has_no_tag() {
        let rules = PromotionRules::default();
        assert_eq!(rules.detect("Pınar Süt 1 L\n42,50 TL"), "");
    }

    #[test]
    fn decimal_dot_in_price_is_a_tolerated_false_positive() {
        let rules = PromotionRules::default();
        assert_eq!(rules.detect("Ekmek\n12.50 TL"), "Kampanya Var");
    }

    #[test]
    fn empty_markers_never_match() {
        let rules = PromotionRules::new([""], "promo");
        assert_eq!(rules.detect("anything"), "");
    }
}
