//! DuckDuckGo search engine implementation
//!
//! Scrapes the no-JavaScript HTML endpoint, which needs no credentials.

use super::traits::*;
use crate::config::EngineConfig;
use crate::error::{self, SearchError};
use crate::network::{accept_html, accept_language, HttpClient};
use crate::results::SearchResult;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

static RESULT: Lazy<Selector> = Lazy::new(|| selector(".result"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector(".result__title"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector(".result__title a"));
static SNIPPET: Lazy<Selector> = Lazy::new(|| selector(".result__snippet"));
static ANOMALY: Lazy<Selector> =
    Lazy::new(|| selector(r#"[class*="anomaly-modal"], form#challenge-form"#));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// DuckDuckGo HTML engine
pub struct DuckDuckGo {
    base_url: String,
    timeout: Duration,
    client: HttpClient,
}

impl DuckDuckGo {
    pub const HTML_URL: &'static str = "https://html.duckduckgo.com/html/";

    const UNTITLED: &'static str = "No title";

    pub fn new(client: HttpClient) -> Self {
        Self {
            base_url: Self::HTML_URL.to_string(),
            timeout: client.default_timeout(),
            client,
        }
    }

    pub fn from_config(config: &EngineConfig, client: HttpClient, timeout: Duration) -> Self {
        let engine = Self::new(client).with_timeout(timeout);
        match config.base_url {
            Some(ref url) => engine.with_base_url(url),
            None => engine,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extras are not forwarded: the HTML form only understands its own fields.
    pub fn request(&self, query: &str, options: &SearchOptions) -> EngineRequest {
        let form = vec![
            ("q".to_string(), query.to_string()),
            (
                "kl".to_string(),
                format!("{}-{}", options.country, options.language),
            ),
            (
                "kp".to_string(),
                if options.safe_search { "1" } else { "-2" }.to_string(),
            ),
        ];

        EngineRequest::post(&self.base_url)
            .header("Accept", accept_html())
            .header("Accept-Language", accept_language(&options.language))
            .form(form)
    }

    pub fn parse(
        &self,
        response: EngineResponse,
        num_results: usize,
    ) -> error::Result<Vec<SearchResult>> {
        let response = response.error_for_status(EngineKind::DuckDuckGo)?;
        let document = Html::parse_document(&response.text);

        if is_challenge(&document) {
            return Err(SearchError::Provider {
                engine: EngineKind::DuckDuckGo,
                status: Some(response.status),
                message: "request was challenged with a CAPTCHA".to_string(),
            });
        }

        Ok(collect_results(&document, num_results))
    }
}

/// Extract organic results from a DuckDuckGo HTML page, ranked from 1
pub fn parse_results(html: &str, num_results: usize) -> Vec<SearchResult> {
    collect_results(&Html::parse_document(html), num_results)
}

/// The anomaly page has a challenge modal and no result blocks
fn is_challenge(document: &Html) -> bool {
    document.select(&RESULT).next().is_none() && document.select(&ANOMALY).next().is_some()
}

fn collect_results(document: &Html, num_results: usize) -> Vec<SearchResult> {
    document
        .select(&RESULT)
        .filter(|element| !is_ad(element))
        .take(num_results)
        .zip(1u32..)
        .map(|(element, position)| {
            let title = element
                .select(&TITLE)
                .next()
                .map(text_of)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DuckDuckGo::UNTITLED.to_string());

            let link = element
                .select(&TITLE_LINK)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(unwrap_redirect)
                .unwrap_or_default();

            let snippet = element.select(&SNIPPET).next().map(text_of).unwrap_or_default();

            SearchResult::new(title, link, EngineKind::DuckDuckGo)
                .with_snippet(snippet)
                .with_position(position)
        })
        .collect()
}

fn is_ad(element: &ElementRef<'_>) -> bool {
    element.value().classes().any(|c| c == "result--ad")
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result links go through `//duckduckgo.com/l/?uddg=<target>`; return the target
pub fn unwrap_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    let Ok(url) = Url::parse(&absolute) else {
        return href.to_string();
    };

    let is_redirect = url
        .host_str()
        .map_or(false, |h| h.ends_with("duckduckgo.com"))
        && url.path().starts_with("/l/");
    if !is_redirect {
        return href.to_string();
    }

    url.query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| href.to_string())
}

#[async_trait]
impl Engine for DuckDuckGo {
    fn kind(&self) -> EngineKind {
        EngineKind::DuckDuckGo
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://duckduckgo.com")
            .official_api(false)
            .api_key_required(false)
            .results_format("HTML")
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn execute(
        &self,
        query: &str,
        num_results: usize,
        options: &SearchOptions,
    ) -> error::Result<Vec<SearchResult>> {
        if !options.extras.is_empty() {
            debug!(
                "DuckDuckGo ignores {} provider-specific parameter(s)",
                options.extras.len()
            );
        }

        let request = self.request(query, options);
        let response = self
            .client
            .execute_with_timeout(EngineKind::DuckDuckGo, request, self.timeout)
            .await?;

        self.parse(response, num_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r##"
        <html><body>
          <div class="result results_links result--ad">
            <h2 class="result__title"><a class="result__a" href="https://ads.example.com">Sponsored</a></h2>
            <a class="result__snippet">Buy now</a>
          </div>
          <div class="result results_links results_links_deep web-result">
            <h2 class="result__title">
              <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">Rust   Programming Language</a>
            </h2>
            <a class="result__snippet" href="#">A language empowering <b>everyone</b>.</a>
          </div>
          <div class="result results_links web-result">
            <h2 class="result__title"><a class="result__a" href="https://doc.rust-lang.org/book/">The Book</a></h2>
          </div>
          <div class="result results_links web-result">
            <div class="result__body">no title here</div>
          </div>
        </body></html>
    "##;

    #[test]
    fn test_parse_results() {
        let results = parse_results(PAGE, 10);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].link, "https://www.rust-lang.org/");
        assert_eq!(results[0].snippet, "A language empowering everyone.");
        assert_eq!(results[0].position, 1);
        assert_eq!(results[1].link, "https://doc.rust-lang.org/book/");
        assert_eq!(results[1].snippet, "");
        assert_eq!(results[2].title, "No title");
        assert_eq!(results[2].link, "");
        assert_eq!(results[2].position, 3);
    }

    #[test]
    fn test_parse_results_truncates() {
        let results = parse_results(PAGE, 1);
        assert_eq!(results.len(), 1);
        assert!(parse_results("<html></html>", 5).is_empty());
    }

    #[test]
    fn test_unwrap_redirect() {
        assert_eq!(
            unwrap_redirect("//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1&rut=x"),
            "https://example.com/a?b=1"
        );
        assert_eq!(unwrap_redirect("https://example.com/"), "https://example.com/");
        assert_eq!(unwrap_redirect("/relative"), "/relative");
    }

    #[test]
    fn test_request_form() {
        let ddg = DuckDuckGo::new(HttpClient::new().unwrap());
        let options = SearchOptions {
            language: "fr".to_string(),
            country: "ca".to_string(),
            safe_search: false,
            ..Default::default()
        };

        let request = ddg.request("café", &options);
        assert_eq!(request.method, HttpMethod::Post);
        let Some(RequestBody::Form(form)) = request.data else {
            panic!("expected form body");
        };
        assert!(form.contains(&("kl".to_string(), "ca-fr".to_string())));
        assert!(form.contains(&("kp".to_string(), "-2".to_string())));
    }

    #[test]
    fn test_captcha_is_provider_error() {
        let ddg = DuckDuckGo::new(HttpClient::new().unwrap());
        let response = EngineResponse {
            status: 200,
            text: r#"<div class="anomaly-modal__modal">Please complete the following challenge</div>"#
                .to_string(),
        };
        assert!(matches!(
            ddg.parse(response, 10),
            Err(SearchError::Provider { engine: EngineKind::DuckDuckGo, .. })
        ));
    }

    #[test]
    fn test_results_mentioning_captcha_are_kept() {
        let ddg = DuckDuckGo::new(HttpClient::new().unwrap());
        let response = EngineResponse {
            status: 200,
            text: r##"
                <div class="result results_links web-result">
                  <h2 class="result__title"><a class="result__a" href="https://www.google.com/recaptcha/about/">reCAPTCHA</a></h2>
                  <a class="result__snippet" href="#">A CAPTCHA service that blocks unusual traffic from bots.</a>
                </div>
            "##
            .to_string(),
        };

        let results = ddg.parse(response, 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "reCAPTCHA");
        assert_eq!(results[0].link, "https://www.google.com/recaptcha/about/");
    }

    #[tokio::test]
    async fn test_execute_against_html_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("q=ai"))
            .and(body_string_contains("kp=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let ddg = DuckDuckGo::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let results = ddg.execute("ai", 2, &SearchOptions::default()).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.source == EngineKind::DuckDuckGo));
    }

    #[tokio::test]
    async fn test_execute_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let ddg = DuckDuckGo::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let error = ddg
            .execute("ai", 5, &SearchOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(error, SearchError::Provider { status: Some(503), .. }));
    }
}
