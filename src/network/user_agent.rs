//! Browser-like request headers
//!
//! The DuckDuckGo HTML endpoint rejects obvious bot user agents, so requests
//! go out with a realistic desktop browser string.

use rand::seq::SliceRandom;

const PLATFORMS: [&str; 4] = [
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

const CHROME_VERSIONS: [&str; 4] = ["122.0.0.0", "123.0.0.0", "124.0.0.0", "125.0.0.0"];

const FALLBACK: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                        (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Pick a desktop Chrome user agent for this process
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();

    match (PLATFORMS.choose(&mut rng), CHROME_VERSIONS.choose(&mut rng)) {
        (Some(os), Some(chrome)) => format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
            os, chrome
        ),
        _ => FALLBACK.to_string(),
    }
}

/// Accept header for HTML pages
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
}

/// Accept header for JSON APIs
pub fn accept_json() -> &'static str {
    "application/json"
}

/// Accept-Language header for a language code
pub fn accept_language(lang: &str) -> String {
    if lang.is_empty() || lang == "en" {
        "en-US,en;q=0.9".to_string()
    } else {
        format!("{},en-US;q=0.8,en;q=0.7", lang)
    }
}
