//! Readings taken from the host trading page.
//!
//! The page itself is out of reach of this crate; whatever embeds it drops the rendered
//! text of the balance label, the order amount field and the current URL into a probe
//! directory, one file each, and [`FileProbe`] reads them back.

use std::path::PathBuf;

use url::Url;

pub const BALANCE_FILE: &str = "balance.txt";
pub const AMOUNT_FILE: &str = "amount.txt";
pub const PAGE_URL_FILE: &str = "page_url.txt";

/// Source of the page signals the engine polls.
pub trait PageProbe {
    /// Account balance currently rendered on the page.
    fn balance(&self) -> Option<f64>;
    /// Amount the user has typed into the order form, when positive.
    fn amount(&self) -> Option<f64>;
    fn page_url(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct FileProbe {
    dir: PathBuf,
}

impl FileProbe {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, name: &str) -> Option<String> {
        let path = self.dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Probe read failed");
                None
            }
        }
    }
}

impl PageProbe for FileProbe {
    fn balance(&self) -> Option<f64> {
        self.read(BALANCE_FILE).and_then(|t| parse_first_number(&t))
    }

    fn amount(&self) -> Option<f64> {
        self.read(AMOUNT_FILE).and_then(|t| parse_amount(&t))
    }

    fn page_url(&self) -> Option<String> {
        self.read(PAGE_URL_FILE)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// First decimal number in a rendered label, e.g. `"12,345.67 USDT"` gives `12345.67`.
pub fn parse_first_number(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    let bytes = cleaned.as_bytes();
    let mut start = None;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            let negative = i > 0 && bytes[i - 1] == b'-';
            start = Some(if negative { i - 1 } else { i });
            break;
        }
    }
    let start = start?;

    let mut end = start;
    if bytes[end] == b'-' {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    cleaned[start..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Typed order amount; only strictly positive values count.
pub fn parse_amount(text: &str) -> Option<f64> {
    parse_first_number(text)
        .map(f64::abs)
        .filter(|v| *v > 0.0)
}

/// Contract address of the instrument page, from a `/alpha/<chain>/<contract>` path.
///
/// Accepts a full URL or a bare path; the address is lower-cased.
pub fn contract_from_page_url(page_url: &str) -> Option<String> {
    let path = match Url::parse(page_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => page_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let idx = segments
        .iter()
        .position(|s| s.eq_ignore_ascii_case("alpha"))?;
    // The chain segment must be present before the contract.
    let contract = segments.get(idx + 2)?;
    Some(contract.to_ascii_lowercase())
}
