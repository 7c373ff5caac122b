//! Plain-HTTP reachability check for a search page, no rendering involved.
//!
//! Useful for telling a server-rendered site from one that needs the
//! browser pipeline: if the keyword is missing from a 200 response body,
//! the listing is most likely built client-side (or the request was blocked).

use std::time::Duration;

use reqwest::redirect;
use tracing::info;

use crate::error::ProbeError;

const TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub url: String,
    pub status: u16,
    pub length: usize,
    pub has_title: bool,
    pub keyword_found: bool,
    pub currency_found: bool,
}

impl ProbeReport {
    pub fn likely_client_rendered(&self) -> bool {
        self.status == 200 && !self.keyword_found
    }
}

pub fn fetch_html(url: &str, user_agent: &str) -> Result<(u16, String), reqwest::Error> {
    let redirect_policy = redirect::Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else {
            attempt.follow()
        }
    });

    let client = reqwest::blocking::Client::builder()
        .redirect(redirect_policy)
        .timeout(TIMEOUT)
        .build()?;

    let response = client
        .get(url)
        .header("User-Agent", user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        )
        .header("Referer", "https://www.google.com/")
        .send()?;
    let status = response.status().as_u16();
    Ok((status, response.text()?))
}

pub fn probe(url: &str, keyword: &str, user_agent: &str) -> Result<ProbeReport, ProbeError> {
    let (status, body) = fetch_html(url, user_agent)?;
    let report = assess(url, status, &body, keyword);
    info!(
        url,
        status = report.status,
        length = report.length,
        keyword_found = report.keyword_found,
        currency_found = report.currency_found,
        "probe finished"
    );
    Ok(report)
}

pub fn assess(url: &str, status: u16, body: &str, keyword: &str) -> ProbeReport {
    ProbeReport {
        url: url.to_owned(),
        status,
        length: body.len(),
        has_title: body.contains("<title>"),
        keyword_found: body.to_lowercase().contains(&keyword.to_lowercase()),
        currency_found: body.contains("TL") || body.contains('₺'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_rendered_listing_is_recognized() {
        let body = "<html><head><title>Arama</title></head>\
                    <body><div>Köy YUMURTA 30'lu 99,50 TL</div></body></html>";
        let report = assess("https://a.test", 200, body, "yumurta");

        assert!(report.has_title);
        assert!(report.keyword_found);
        assert!(report.currency_found);
        assert!(!report.likely_client_rendered());
        assert_eq!(report.length, body.len());
    }

    #[test]
    fn empty_shell_looks_client_rendered() {
        let body = "<html><head><title>Migros</title></head><body><app-root></app-root></body></html>";
        let report = assess("https://m.test", 200, body, "yumurta");

        assert!(!report.keyword_found);
        assert!(!report.currency_found);
        assert!(report.likely_client_rendered());
    }

    #[test]
    fn lira_sign_counts_as_currency() {
        let report = assess("https://a.test", 200, "<p>₺45,90</p>", "süt");
        assert!(report.currency_found);
        assert!(!report.has_title);
    }

    #[test]
    fn blocked_response_is_not_called_client_rendered() {
        let report = assess("https://a.test", 403, "Access denied", "yumurta");
        assert!(!report.likely_client_rendered());
    }
}
