//! Localized price text to a plain decimal value.
//!
//! The normalizer is total: anything it cannot read becomes
//! [`MISSING_PRICE`], which is indistinguishable from a literal zero.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::MISSING_PRICE;

const CURRENCY_TOKENS: &[&str] = &["TL", "₺", "TRY"];

static NUMBER_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("number pattern compiles"));

/// Parses text such as `"99,50 TL"` or `"1.250,00 TL"` into `99.5` / `1250.0`.
///
/// Separator rules, after currency tokens and whitespace are stripped:
/// - both `.` and `,` present: the right-most one is the decimal mark
/// - only `,`: decimal comma; repeated commas are thousands groups
/// - only `.`: a single dot followed by exactly three digits is a thousands
///   group (`"1.250"` is 1250), anything else is a decimal point
pub fn normalize_price(raw: &str) -> f64 {
    let mut cleaned = raw.to_owned();
    for token in CURRENCY_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    cleaned.retain(|c| !c.is_whitespace());

    let Some(run) = NUMBER_RUN.find(&cleaned) else {
        return MISSING_PRICE;
    };
    let run = run.as_str().trim_end_matches(['.', ',']);

    match canonical_digits(run).parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => MISSING_PRICE,
    }
}

fn canonical_digits(run: &str) -> String {
    let last_dot = run.rfind('.');
    let last_comma = run.rfind(',');

    let decimal_mark = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (None, Some(_)) => {
            if run.matches(',').count() == 1 {
                Some(',')
            } else {
                None
            }
        }
        (Some(dot), None) => {
            let single = run.matches('.').count() == 1;
            let grouped = run.len() - dot - 1 == 3 && !run.starts_with("0.");
            if single && !grouped { Some('.') } else { None }
        }
        (None, None) => None,
    };

    let split_at = decimal_mark.and_then(|mark| run.rfind(mark));
    run.char_indices()
        .filter_map(|(i, c)| match c {
            _ if Some(i) == split_at => Some('.'),
            '.' | ',' => None,
            _ => Some(c),
        })
        .collect()
}
