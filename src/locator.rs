use scraper::ElementRef;
use tracing::debug;

use crate::browser::Dom;
use crate::error::SelectorError;
use crate::site::SelectorSpec;

/// The node chosen to represent a query's listing.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub node: ElementRef<'a>,
    /// Index into the cascade of the strategy that matched.
    pub strategy: usize,
}

/// Runs `cascade` in order and returns the first node of the first strategy
/// that matches anything.
///
/// Later matches on the page are ignored on purpose: the first search result
/// is taken as the most relevant one, with no ranking. `query` only feeds the
/// logs.
pub fn locate<'d, D: Dom>(
    dom: &'d D,
    cascade: &[SelectorSpec],
    query: &str,
) -> Result<Option<Candidate<'d>>, SelectorError> {
    for (strategy, selector) in cascade.iter().enumerate() {
        let found = dom.find_all(selector)?;
        if let Some(node) = found.first().copied() {
            debug!(
                query,
                %selector,
                matches = found.len(),
                "candidate located"
            );
            return Ok(Some(Candidate { node, strategy }));
        }
        debug!(query, %selector, "no candidates for strategy");
    }
    Ok(None)
}
