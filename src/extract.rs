use std::future::Future;
use std::time::Duration;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{ExtractedPage, Heading, ImageRef};

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = "WebRev-AI-Scraper/1.0";
pub const FETCH_DEADLINE: Duration = Duration::from_secs(15);
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;
pub const MAX_IMAGES: usize = 50;
pub const MAX_SNIPPETS: usize = 20;

// ── Lazy static selectors ────────────────────────────────────────────────────

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static DESCRIPTION_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static HEADING_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());
static IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static PARAGRAPH_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("Request timed out (15s limit).")]
    FetchTimeout,
    /// `status` is absent when no upstream response was ever received.
    #[error("Failed to fetch URL: {reason}")]
    FetchFailed { status: Option<u16>, reason: String },
    #[error("Invalid content type. Only HTML allowed.")]
    UnsupportedContentType,
    #[error("Page too large (>2MB).")]
    PageTooLarge,
}

// ── Extractor ────────────────────────────────────────────────────────────────

/// Fetches a page under the timeout/size/content-type guards and turns it into
/// an [`ExtractedPage`].
#[derive(Debug, Clone)]
pub struct Extractor {
    client: reqwest::Client,
    deadline: Duration,
}

impl Extractor {
    pub fn new() -> Result<Self, ExtractionError> {
        Self::with_deadline(FETCH_DEADLINE)
    }

    pub fn with_deadline(deadline: Duration) -> Result<Self, ExtractionError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ExtractionError::FetchFailed {
                status: None,
                reason: e.to_string(),
            })?;

        Ok(Self { client, deadline })
    }

    pub async fn extract(&self, url: &str) -> Result<ExtractedPage, ExtractionError> {
        let parsed = validate_url(url)?;
        let html = tokio::time::timeout(self.deadline, self.fetch_html(&parsed))
            .await
            .map_err(|_| ExtractionError::FetchTimeout)??;
        let page = extract_from_html(&html, url.trim());
        tracing::info!(
            url = %page.url,
            headings = page.headings.len(),
            images = page.image_count,
            snippets = page.content.len(),
            bytes = page.raw_size_bytes,
            "extracted page"
        );
        Ok(page)
    }

    // ── HTTP fetch ───────────────────────────────────────────────────────────

    async fn fetch_html(&self, url: &Url) -> Result<String, ExtractionError> {
        let client = &self.client;
        let response = with_www_retry(url, |target| {
            tracing::debug!("GET {}", target);
            client.get(target).send()
        })
        .await
        .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::FetchFailed {
                status: Some(status.as_u16()),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        if !is_html(&content_type) {
            return Err(ExtractionError::UnsupportedContentType);
        }

        // Soft check: the declared length may be absent or understated.
        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        if declared.is_some_and(|len| len > MAX_PAGE_BYTES as u64) {
            return Err(ExtractionError::PageTooLarge);
        }

        let html = response.text().await.map_err(transport_error)?;
        if html.len() > MAX_PAGE_BYTES {
            return Err(ExtractionError::PageTooLarge);
        }
        Ok(html)
    }
}

// ── URL validation ───────────────────────────────────────────────────────────

pub fn validate_url(url: &str) -> Result<Url, ExtractionError> {
    let parsed = Url::parse(url.trim())
        .map_err(|_| ExtractionError::InvalidUrl("Invalid URL provided".to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ExtractionError::InvalidUrl(
            "Only http and https URLs are supported".to_string(),
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ExtractionError::InvalidUrl("URL has no host".to_string()));
    }
    Ok(parsed)
}

fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

// ── Retry under the www. host variant ────────────────────────────────────────

/// Run `attempt` against `url`; on failure, run it once more against the
/// `www.` variant of the host. The second failure is returned as-is.
pub async fn with_www_retry<T, E, F, Fut>(url: &Url, mut attempt: F) -> Result<T, E>
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match attempt(url.clone()).await {
        Ok(value) => Ok(value),
        Err(first) => match www_variant(url) {
            Some(alt) => {
                tracing::info!(
                    "fetch of {} failed ({}), retrying with {}",
                    url,
                    first,
                    alt.host_str().unwrap_or_default()
                );
                attempt(alt).await
            }
            None => Err(first),
        },
    }
}

/// `None` when the host already starts with `www.` or cannot take the prefix
/// (IP literals).
pub fn www_variant(url: &Url) -> Option<Url> {
    let host = url.host_str()?;
    if host.starts_with("www.") || url.domain().is_none() {
        return None;
    }
    let mut alt = url.clone();
    alt.set_host(Some(&format!("www.{}", host))).ok()?;
    Some(alt)
}

fn transport_error(e: reqwest::Error) -> ExtractionError {
    if e.is_timeout() {
        ExtractionError::FetchTimeout
    } else {
        ExtractionError::FetchFailed {
            status: e.status().map(|s| s.as_u16()),
            reason: e.to_string(),
        }
    }
}

// ── Document parsing ─────────────────────────────────────────────────────────

pub fn extract_from_html(html: &str, url: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SEL)
        .next()
        .map(|el| collect_text(el).trim().to_string())
        .unwrap_or_default();

    let description = document
        .select(&DESCRIPTION_SEL)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let headings: Vec<Heading> = document
        .select(&HEADING_SEL)
        .map(|el| Heading {
            level: el.value().name().to_string(),
            text: collect_text(el).trim().to_string(),
        })
        .collect();

    let mut images: Vec<ImageRef> = document
        .select(&IMG_SEL)
        .filter_map(|el| {
            let src = el.value().attr("src")?.trim();
            if src.is_empty() {
                return None;
            }
            Some(ImageRef {
                src: src.to_string(),
                alt: el.value().attr("alt").unwrap_or("").trim().to_string(),
            })
        })
        .collect();
    let image_count = images.len();
    images.truncate(MAX_IMAGES);

    let content: Vec<String> = document
        .select(&PARAGRAPH_SEL)
        .map(|el| collect_text(el).trim().to_string())
        .filter(|text| !text.is_empty())
        .take(MAX_SNIPPETS)
        .collect();

    ExtractedPage {
        url: url.to_string(),
        title,
        description,
        headings,
        images,
        image_count,
        content,
        raw_size_bytes: html.len(),
    }
}

// ── DOM utility helpers ──────────────────────────────────────────────────────

/// Recursively collect all text from an element and its descendants.
fn collect_text(el: ElementRef<'_>) -> String {
    use scraper::node::Node;
    let mut parts = Vec::new();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => parts.push((&*text.text).to_string()),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    parts.push(collect_text(child_el));
                }
            }
            _ => {}
        }
    }
    parts.join("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const PAGE: &str = r#"<!doctype html>
<html>
  <head>
    <title>  Acme Widgets  </title>
    <meta name="description" content=" Widgets for everyone ">
  </head>
  <body>
    <h1> Welcome </h1>
    <img src="/a.png" alt="Logo">
    <img src="/b.png">
    <img alt="no source">
    <img src="   ">
    <p>First <b>bold</b> paragraph.</p>
    <p>   </p>
    <p>Second</p>
    <p>Third</p>
  </body>
</html>"#;

    #[test]
    fn test_extract_from_html_collects_facts() {
        let page = extract_from_html(PAGE, "https://acme.test/");
        assert_eq!(page.url, "https://acme.test/");
        assert_eq!(page.title, "Acme Widgets");
        assert_eq!(page.description, "Widgets for everyone");
        assert_eq!(
            page.headings,
            vec![Heading { level: "h1".into(), text: "Welcome".into() }]
        );
        assert_eq!(page.image_count, 2);
        assert_eq!(page.images[0], ImageRef { src: "/a.png".into(), alt: "Logo".into() });
        assert_eq!(page.images[1].alt, "");
        assert_eq!(page.content, vec!["First bold paragraph.", "Second", "Third"]);
        assert_eq!(page.raw_size_bytes, PAGE.len());
    }

    #[test]
    fn test_extract_from_html_keeps_heading_order_and_levels() {
        let html = "<h3>c</h3><h1>a</h1><h6> f </h6>";
        let page = extract_from_html(html, "https://x.test/");
        let levels: Vec<&str> = page.headings.iter().map(|h| h.level.as_str()).collect();
        assert_eq!(levels, vec!["h3", "h1", "h6"]);
        assert_eq!(page.headings[2].text, "f");
    }

    #[test]
    fn test_extract_from_html_caps_images_and_content() {
        let mut html = String::new();
        for i in 0..60 {
            html.push_str(&format!("<img src=\"/{i}.png\">"));
        }
        for i in 0..30 {
            html.push_str(&format!("<p>para {i}</p>"));
        }
        let page = extract_from_html(&html, "https://x.test/");
        assert_eq!(page.images.len(), MAX_IMAGES);
        assert_eq!(page.image_count, 60);
        assert_eq!(page.content.len(), MAX_SNIPPETS);
        assert_eq!(page.content[0], "para 0");
        assert!(page.image_count >= page.images.len());
    }

    #[test]
    fn test_extract_from_html_missing_metadata() {
        let page = extract_from_html("<p>only text</p>", "https://x.test/");
        assert_eq!(page.title, "");
        assert_eq!(page.description, "");
        assert!(page.headings.is_empty());
        assert_eq!(page.image_count, 0);
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/path").is_ok());
        assert!(validate_url("http://example.com").is_ok());
        for bad in ["", "example.com", "not a url", "ftp://example.com", "mailto:a@b.c", "https://"] {
            assert!(
                matches!(validate_url(bad), Err(ExtractionError::InvalidUrl(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_network() {
        let extractor = Extractor::new().unwrap();
        let err = extractor.extract("definitely not a url").await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidUrl(_)));
    }

    #[test]
    fn test_www_variant() {
        let url = Url::parse("https://example.com:8443/a?b=c").unwrap();
        let alt = www_variant(&url).unwrap();
        assert_eq!(alt.as_str(), "https://www.example.com:8443/a?b=c");

        assert!(www_variant(&Url::parse("https://www.example.com/").unwrap()).is_none());
        assert!(www_variant(&Url::parse("http://127.0.0.1:9/").unwrap()).is_none());
    }

    #[tokio::test]
    async fn test_retry_happens_once_with_www_prefix() {
        let calls = Mutex::new(Vec::new());
        let url = Url::parse("https://example.com/").unwrap();
        let result: Result<(), String> = with_www_retry(&url, |target| {
            calls.lock().unwrap().push(target.host_str().unwrap().to_string());
            async { Err("connection refused".to_string()) }
        })
        .await;

        assert_eq!(result.unwrap_err(), "connection refused");
        assert_eq!(*calls.lock().unwrap(), vec!["example.com", "www.example.com"]);
    }

    #[tokio::test]
    async fn test_retry_surfaces_second_failure() {
        let count = AtomicUsize::new(0);
        let url = Url::parse("https://example.com/").unwrap();
        let result: Result<(), String> = with_www_retry(&url, |target| {
            let n = count.fetch_add(1, Ordering::SeqCst);
            let host = target.host_str().unwrap().to_string();
            async move { Err(format!("attempt {n} to {host}")) }
        })
        .await;
        assert_eq!(result.unwrap_err(), "attempt 1 to www.example.com");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_retry_for_www_host() {
        let count = AtomicUsize::new(0);
        let url = Url::parse("https://www.example.com/").unwrap();
        let result: Result<(), String> = with_www_retry(&url, |_| {
            count.fetch_add(1, Ordering::SeqCst);
            async { Err("dns".to_string()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_on_success() {
        let count = AtomicUsize::new(0);
        let url = Url::parse("https://example.com/").unwrap();
        let result: Result<u8, String> = with_www_retry(&url, |_| {
            count.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
