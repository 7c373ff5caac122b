use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Title recorded when a candidate was located but carried no readable text.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Price recorded when no amount could be parsed. Consumers must read it as
/// "missing", never as a real zero price.
pub const MISSING_PRICE: f64 = 0.0;

/// One item of the configured basket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub query_term: String,
}

impl ProductQuery {
    pub fn new(query_term: impl Into<String>) -> Self {
        Self {
            query_term: query_term.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// The query term, not the matched title.
    pub name: String,
    #[serde(rename = "found_title")]
    pub matched_title: String,
    pub price: f64,
    pub unit: String,
    #[serde(rename = "campaign")]
    pub promotion_flag: String,
}

impl ProductRecord {
    pub fn has_price(&self) -> bool {
        self.price != MISSING_PRICE
    }
}

/// The dated document a run produces. Items are appended in basket order and
/// a query without a match simply has no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(rename = "date")]
    run_date: NaiveDate,
    #[serde(rename = "market")]
    source_name: String,
    #[serde(rename = "products")]
    items: Vec<ProductRecord>,
}

impl RunRecord {
    pub fn new(run_date: NaiveDate, source_name: impl Into<String>) -> Self {
        Self {
            run_date,
            source_name: source_name.into(),
            items: Vec::new(),
        }
    }

    pub fn run_date(&self) -> NaiveDate {
        self.run_date
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn items(&self) -> &[ProductRecord] {
        &self.items
    }

    pub fn push(&mut self, item: ProductRecord) {
        self.items.push(item);
    }

    /// Queries of `basket` that produced no record, in basket order.
    ///
    /// Duplicate query terms are matched one-for-one against records.
    pub fn misses<'a>(&self, basket: &'a [ProductQuery]) -> Vec<&'a str> {
        let mut unmatched: Vec<&str> = self.items.iter().map(|i| i.name.as_str()).collect();
        let mut misses = Vec::new();
        for query in basket {
            match unmatched.iter().position(|n| *n == query.query_term) {
                Some(pos) => {
                    unmatched.remove(pos);
                }
                None => misses.push(query.query_term.as_str()),
            }
        }
        misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, price: f64) -> ProductRecord {
        ProductRecord {
            name: name.to_owned(),
            matched_title: "Pınar Süt 1 L".to_owned(),
            price,
            unit: "adet".to_owned(),
            promotion_flag: String::new(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 7).unwrap()
    }

    #[test]
    fn run_record_serializes_with_artifact_field_names() {
        let mut run = RunRecord::new(date(), "Migros");
        run.push(record("süt", 42.5));

        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["date"], "2024-02-07");
        assert_eq!(value["market"], "Migros");
        let product = &value["products"][0];
        assert_eq!(product["name"], "süt");
        assert_eq!(product["found_title"], "Pınar Süt 1 L");
        assert_eq!(product["price"], 42.5);
        assert_eq!(product["unit"], "adet");
        assert_eq!(product["campaign"], "");
    }

    #[test]
    fn misses_are_basket_minus_records_in_order() {
        let basket: Vec<ProductQuery> = ["yumurta", "süt", "ekmek"]
            .into_iter()
            .map(ProductQuery::new)
            .collect();
        let mut run = RunRecord::new(date(), "Migros");
        run.push(record("süt", 42.5));

        assert_eq!(run.misses(&basket), vec!["yumurta", "ekmek"]);
    }

    #[test]
    fn misses_count_duplicate_queries_independently() {
        let basket: Vec<ProductQuery> = ["süt", "süt"].into_iter().map(ProductQuery::new).collect();
        let mut run = RunRecord::new(date(), "Migros");
        run.push(record("süt", 42.5));

        assert_eq!(run.misses(&basket), vec!["süt"]);
    }

    #[test]
    fn zero_price_reads_as_missing() {
        assert!(!record("süt", MISSING_PRICE).has_price());
        assert!(record("süt", 0.5).has_price());
    }
}
