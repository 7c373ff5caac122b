use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, info, warn};

use crate::browser::{Browser, SettlePolicy};
use crate::error::FetchError;
use crate::locator::locate;
use crate::models::{ProductQuery, ProductRecord};
use crate::parser::extract_fields;
use crate::site::SiteProfile;

/// Placeholder in the search URL template replaced by the encoded query.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Result of one query. A miss is a normal outcome, not an error.
#[derive(Debug)]
pub enum ItemOutcome {
    Hit(ProductRecord),
    Miss,
    Failed(FetchError),
}

pub fn query_url(template: &str, term: &str) -> String {
    let encoded = utf8_percent_encode(term, NON_ALPHANUMERIC).to_string();
    template.replace(QUERY_PLACEHOLDER, &encoded)
}

/// Renders one search page and turns it into an [`ItemOutcome`].
#[derive(Debug, Clone, Copy)]
pub struct ItemFetcher<'a> {
    pub search_url: &'a str,
    pub settle: SettlePolicy,
    pub profile: &'a SiteProfile,
}

impl ItemFetcher<'_> {
    /// Never panics and never aborts the caller: a panic while rendering or
    /// extracting this query becomes [`FetchError::Panicked`].
    pub fn fetch<B: Browser + ?Sized>(&self, browser: &mut B, query: &ProductQuery) -> ItemOutcome {
        let term = query.query_term.as_str();
        info!(query = term, "fetching");

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.try_fetch(browser, query)))
            .unwrap_or_else(|payload| Err(FetchError::Panicked(panic_message(payload.as_ref()))));

        match attempt {
            Ok(Some(record)) => {
                info!(
                    query = term,
                    title = %record.matched_title,
                    price = record.price,
                    campaign = %record.promotion_flag,
                    "captured"
                );
                ItemOutcome::Hit(record)
            }
            Ok(None) => {
                warn!(query = term, "no product cards found");
                ItemOutcome::Miss
            }
            Err(e) => {
                warn!(query = term, "error fetching item: {e}");
                ItemOutcome::Failed(e)
            }
        }
    }

    fn try_fetch<B: Browser + ?Sized>(
        &self,
        browser: &mut B,
        query: &ProductQuery,
    ) -> Result<Option<ProductRecord>, FetchError> {
        let term = query.query_term.as_str();
        browser.navigate(&query_url(self.search_url, term))?;
        self.settle.settle();
        let page = browser.snapshot()?;
        debug!(url = page.url(), "page captured");

        let Some(candidate) = locate(&page, &self.profile.candidates, term)? else {
            return Ok(None);
        };
        if candidate.strategy > 0 {
            debug!(query = term, strategy = candidate.strategy, "matched by fallback selector");
        }
        let fields = extract_fields(candidate.node, self.profile);

        Ok(Some(ProductRecord {
            name: term.to_owned(),
            matched_title: fields.title,
            price: fields.price,
            unit: fields.unit,
            promotion_flag: fields.promotion,
        }))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
