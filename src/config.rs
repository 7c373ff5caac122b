use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::browser::SettlePolicy;
use crate::browser::chrome::ChromeOptions;
use crate::error::ConfigError;
use crate::fetcher::QUERY_PLACEHOLDER;
use crate::models::ProductQuery;
use crate::site::SiteProfile;

pub const DEFAULT_BASKET: &[&str] = &[
    "yumurta",
    "süt",
    "tavuk göğsü",
    "pirinç",
    "makarna",
    "domates",
    "soğan",
    "patates",
    "sıvı yağ",
    "yoğurt",
    "kaşar peyniri",
    "zeytin",
    "ekmek",
];

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub source_name: String,
    /// Search URL with a `{query}` placeholder.
    pub search_url: String,
    pub settle: SettlePolicy,
    pub user_agent: String,
    pub headless: bool,
    pub window: (u32, u32),
    pub output_dir: PathBuf,
    pub basket: Vec<ProductQuery>,
    /// 1 keeps the run sequential; more opens one browser per worker.
    pub workers: usize,
    /// Pause between two requests of the same browser session.
    pub pacing: Duration,
    pub site: SiteProfile,
}

impl Config {
    pub fn chrome_options(&self) -> ChromeOptions {
        ChromeOptions {
            headless: self.headless,
            window: self.window,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BasketFile {
    pub items: Vec<String>,
}

/// Load configuration from the process environment. `main` loads `.env`
/// before this is called.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value or the basket
/// file cannot be loaded.
pub fn load_config() -> Result<Config, ConfigError> {
    build_config(|key| std::env::var(key))
}

/// Load the basket from a YAML file of the form `items: [..]`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or lists no items.
pub fn load_basket(path: &Path) -> Result<Vec<ProductQuery>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BasketFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let file: BasketFile = serde_yaml::from_str(&content)?;
    basket_from(file.items)
}

fn basket_from<I, S>(items: I) -> Result<Vec<ProductQuery>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let basket: Vec<ProductQuery> = items
        .into_iter()
        .map(|s| s.as_ref().trim().to_owned())
        .filter(|s| !s.is_empty())
        .map(ProductQuery::new)
        .collect();
    if basket.is_empty() {
        return Err(ConfigError::EmptyBasket);
    }
    Ok(basket)
}

fn build_config<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got `{other}`"))),
        }
    };

    let search_url = or_default(
        "PRICE_ARCHIVER_SEARCH_URL",
        "https://www.migros.com.tr/arama?q={query}",
    );
    if !search_url.contains(QUERY_PLACEHOLDER) {
        return Err(invalid(
            "PRICE_ARCHIVER_SEARCH_URL",
            format!("template must contain {QUERY_PLACEHOLDER}"),
        ));
    }

    let window_raw = or_default("PRICE_ARCHIVER_WINDOW", "1200x800");
    let window = parse_window(&window_raw)
        .ok_or_else(|| invalid("PRICE_ARCHIVER_WINDOW", format!("expected WxH, got `{window_raw}`")))?;

    let workers = parse_u64("PRICE_ARCHIVER_WORKERS", "1")?;
    if workers == 0 {
        return Err(invalid("PRICE_ARCHIVER_WORKERS", "must be at least 1".into()));
    }

    let basket = match lookup("PRICE_ARCHIVER_BASKET_PATH") {
        Ok(path) => load_basket(Path::new(&path))?,
        Err(_) => basket_from(DEFAULT_BASKET)?,
    };

    Ok(Config {
        source_name: or_default("PRICE_ARCHIVER_SOURCE_NAME", "Migros"),
        search_url,
        settle: SettlePolicy::from_millis(parse_u64("PRICE_ARCHIVER_SETTLE_MS", "4000")?),
        user_agent: or_default("PRICE_ARCHIVER_USER_AGENT", DEFAULT_USER_AGENT),
        headless: parse_bool("PRICE_ARCHIVER_HEADLESS", "false")?,
        window,
        output_dir: PathBuf::from(or_default("PRICE_ARCHIVER_OUTPUT_DIR", ".")),
        basket,
        workers: usize::try_from(workers).map_err(|e| invalid("PRICE_ARCHIVER_WORKERS", e.to_string()))?,
        pacing: Duration::from_millis(parse_u64("PRICE_ARCHIVER_PACING_MS", "0")?),
        site: SiteProfile::migros(),
    })
}

fn parse_window(raw: &str) -> Option<(u32, u32)> {
    let (w, h) = raw.split_once(['x', 'X'])?;
    let w = w.trim().parse().ok()?;
    let h = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}
