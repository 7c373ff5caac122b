use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser as Chrome, LaunchOptions, Tab};
use tracing::{debug, info, warn};

use super::{Browser, Page};
use crate::error::BrowserError;

#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub headless: bool,
    pub window: (u32, u32),
    pub user_agent: String,
}

struct Session {
    // Keeps the Chrome process alive for as long as the tab is in use.
    _chrome: Chrome,
    tab: Arc<Tab>,
}

/// A single Chrome process with one tab, owned exclusively by a run (or by
/// one worker of a pooled run).
pub struct ChromeBrowser {
    session: Option<Session>,
}

impl ChromeBrowser {
    pub fn launch(options: &ChromeOptions) -> Result<Self, BrowserError> {
        let user_agent = format!("--user-agent={}", options.user_agent);
        let args = vec![OsStr::new("--disable-gpu"), OsStr::new(&user_agent)];

        let launch = LaunchOptions::default_builder()
            .headless(options.headless)
            .sandbox(false)
            .window_size(Some(options.window))
            .idle_browser_timeout(Duration::from_secs(300))
            .args(args)
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let chrome = Chrome::new(launch).map_err(|e| BrowserError::Launch(e.to_string()))?;
        let tab = chrome
            .new_tab()
            .map_err(|e| BrowserError::Launch(format!("failed to open tab: {e}")))?;

        info!(
            headless = options.headless,
            width = options.window.0,
            height = options.window.1,
            "browser session started"
        );
        Ok(Self {
            session: Some(Session {
                _chrome: chrome,
                tab,
            }),
        })
    }

    fn tab(&self) -> Result<&Arc<Tab>, BrowserError> {
        self.session
            .as_ref()
            .map(|s| &s.tab)
            .ok_or(BrowserError::Released)
    }
}

impl Browser for ChromeBrowser {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| BrowserError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        debug!(url, "navigated");
        Ok(())
    }

    fn snapshot(&mut self) -> Result<Page, BrowserError> {
        let tab = self.tab()?;
        let html = tab
            .get_content()
            .map_err(|e| BrowserError::Snapshot(e.to_string()))?;
        Ok(Page::from_html(tab.get_url(), &html))
    }

    fn release(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.tab.close(false) {
                warn!("failed to close tab cleanly: {e}");
            }
            info!("browser session released");
        }
    }
}

impl Drop for ChromeBrowser {
    fn drop(&mut self) {
        self.release();
    }
}
