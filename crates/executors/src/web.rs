//! Web fetch executor.
//!
//! `load_page` normalizes scheme-less URLs to https, fetches with a timeout,
//! strips script/style content, converts the remainder to text, and caps the
//! extracted text with an explicit truncation marker. The loaded page is
//! cached so `get_content`, `search_elements`, and `extract_links` operate
//! without refetching. Network failures are a distinct failure kind from
//! parse failures.

use parking_lot::Mutex;
use regex::Regex;
use reqwest::Client;
use serde_json::json;
use shared::tool::{ActionOutcome, ExecutorError, WebOperation};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Marker appended when extracted text is cut at the cap.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated]";

/// Links returned per extract_links call; the total count still reports all.
const MAX_LINKS: usize = 20;

static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").expect("valid regex")
});

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a[^>]*href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).expect("valid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

struct PageState {
    url: String,
    text: String,
    source: String,
}

pub struct WebExecutor {
    http: Client,
    text_cap: usize,
    state: Mutex<Option<PageState>>,
}

impl WebExecutor {
    pub fn new(timeout: Duration, user_agent: &str, text_cap: usize) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            text_cap,
            state: Mutex::new(None),
        }
    }

    /// Captured text of the current page, for promotion to an attachment.
    pub fn current_page_text(&self) -> Option<String> {
        self.state.lock().as_ref().map(|s| s.text.clone())
    }

    pub async fn execute(&self, op: WebOperation) -> Result<ActionOutcome, ExecutorError> {
        debug!(kind = op.kind(), "executing web operation");

        match op {
            WebOperation::LoadPage { url } => self.load_page(&url).await,
            WebOperation::GetContent => self.get_content(),
            WebOperation::SearchText { text } => self.search_text(&text),
            WebOperation::ExtractLinks => self.extract_links(),
        }
    }

    async fn load_page(&self, raw_url: &str) -> Result<ActionOutcome, ExecutorError> {
        let url = normalize_url(raw_url)?;

        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExecutorError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let source = response.text().await.map_err(|e| ExecutorError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        self.ingest(url, source)
    }

    /// Turn fetched HTML into capped text and cache the page state.
    fn ingest(&self, url: Url, source: String) -> Result<ActionOutcome, ExecutorError> {
        let stripped = SCRIPT_STYLE_RE.replace_all(&source, "");
        let text = html2text::from_read(stripped.as_bytes(), 120);

        // Collapse blank runs left behind by markup removal.
        let mut text = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.chars().count() > self.text_cap {
            text = text.chars().take(self.text_cap).collect::<String>() + TRUNCATION_MARKER;
        }

        let domain = url.host_str().unwrap_or_default().to_string();
        let length = text.chars().count();

        *self.state.lock() = Some(PageState {
            url: url.to_string(),
            text,
            source,
        });

        Ok(ActionOutcome::summary(format!(
            "Loaded {} ({} characters of text)",
            url, length
        ))
        .with_detail(json!({
            "url": url.to_string(),
            "domain": domain,
            "content_length": length,
        })))
    }

    fn get_content(&self) -> Result<ActionOutcome, ExecutorError> {
        let state = self.state.lock();
        let page = state.as_ref().ok_or(ExecutorError::NoPageLoaded)?;
        Ok(ActionOutcome::summary(format!(
            "Current page: {} ({} characters)",
            page.url,
            page.text.chars().count()
        ))
        .with_detail(json!({
            "url": page.url,
            "length": page.text.chars().count(),
            "content": page.text,
        })))
    }

    fn search_text(&self, needle: &str) -> Result<ActionOutcome, ExecutorError> {
        if needle.trim().is_empty() {
            return Err(ExecutorError::Parse("no search text provided".into()));
        }
        let state = self.state.lock();
        let page = state.as_ref().ok_or(ExecutorError::NoPageLoaded)?;

        let found = page.text.to_lowercase().contains(&needle.to_lowercase());
        let summary = if found {
            format!("Found '{}' in current page content", needle)
        } else {
            format!("'{}' not found in current page content", needle)
        };
        Ok(ActionOutcome::summary(summary).with_detail(json!({
            "url": page.url,
            "search_text": needle,
            "found": found,
        })))
    }

    fn extract_links(&self) -> Result<ActionOutcome, ExecutorError> {
        let state = self.state.lock();
        let page = state.as_ref().ok_or(ExecutorError::NoPageLoaded)?;

        let mut links = Vec::new();
        for cap in LINK_RE.captures_iter(&page.source) {
            let href = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            if !(href.starts_with("http") || href.starts_with('/')) {
                continue;
            }
            let inner = cap.get(2).map(|m| m.as_str()).unwrap_or_default();
            let text = TAG_RE.replace_all(inner, "").trim().to_string();
            links.push(json!({"text": text, "url": href}));
        }

        let total = links.len();
        links.truncate(MAX_LINKS);

        Ok(
            ActionOutcome::summary(format!("Extracted {} links ({} returned)", total, links.len()))
                .with_detail(json!({
                    "url": page.url,
                    "total_count": total,
                    "links": links,
                })),
        )
    }
}

/// Normalize a possibly scheme-less URL, defaulting to https.
fn normalize_url(raw: &str) -> Result<Url, ExecutorError> {
    let candidate = raw.trim();
    let with_scheme = if candidate.starts_with("http://") || candidate.starts_with("https://") {
        candidate.to_string()
    } else {
        format!("https://{}", candidate)
    };

    Url::parse(&with_scheme).map_err(|e| ExecutorError::Parse(format!("invalid URL {}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor(cap: usize) -> WebExecutor {
        WebExecutor::new(Duration::from_secs(5), "test-agent", cap)
    }

    const SAMPLE: &str = r#"<html><head>
        <title>Sample</title>
        <style>body { color: red; }</style>
        <script>console.log("hidden");</script>
        </head><body>
        <h1>Welcome</h1>
        <p>Plain visible text about pricing.</p>
        <a href="https://example.com/docs">Docs</a>
        <a href="/about">About <b>us</b></a>
        <a href="mailto:hi@example.com">Mail</a>
        </body></html>"#;

    #[test]
    fn bare_host_normalizes_to_https() {
        let url = normalize_url("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn explicit_scheme_is_preserved() {
        let url = normalize_url("http://example.com/page").unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn garbage_url_is_a_parse_failure() {
        let err = normalize_url("http://").unwrap_err();
        assert!(matches!(err, ExecutorError::Parse(_)));
    }

    #[test]
    fn ingest_strips_scripts_and_styles() {
        let exec = executor(5000);
        exec.ingest(normalize_url("example.com").unwrap(), SAMPLE.to_string())
            .unwrap();
        let text = exec.current_page_text().unwrap();
        assert!(text.contains("pricing"));
        assert!(!text.contains("console.log"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn long_pages_are_capped_with_marker() {
        let exec = executor(50);
        let body = format!("<html><body><p>{}</p></body></html>", "word ".repeat(100));
        exec.ingest(normalize_url("example.com").unwrap(), body)
            .unwrap();
        let text = exec.current_page_text().unwrap();
        assert!(text.ends_with(TRUNCATION_MARKER));
        let kept = text.trim_end_matches(TRUNCATION_MARKER);
        assert_eq!(kept.chars().count(), 50);
    }

    #[test]
    fn operations_without_a_page_fail_distinctly() {
        let exec = executor(5000);
        assert!(matches!(
            exec.get_content().unwrap_err(),
            ExecutorError::NoPageLoaded
        ));
        assert!(matches!(
            exec.extract_links().unwrap_err(),
            ExecutorError::NoPageLoaded
        ));
    }

    #[test]
    fn search_is_case_insensitive() {
        let exec = executor(5000);
        exec.ingest(normalize_url("example.com").unwrap(), SAMPLE.to_string())
            .unwrap();
        let hit = exec.search_text("PRICING").unwrap();
        assert!(hit.summary.starts_with("Found"));
        let miss = exec.search_text("absent-token").unwrap();
        assert!(miss.summary.contains("not found"));
    }

    #[test]
    fn extract_links_skips_non_http_and_strips_markup() {
        let exec = executor(5000);
        exec.ingest(normalize_url("example.com").unwrap(), SAMPLE.to_string())
            .unwrap();
        let outcome = exec.extract_links().unwrap();
        let detail = outcome.raw_detail.unwrap();
        assert_eq!(detail["total_count"], 2);
        assert_eq!(detail["links"][1]["text"], "About us");
        assert_eq!(detail["links"][1]["url"], "/about");
    }
}
