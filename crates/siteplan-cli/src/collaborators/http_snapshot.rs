//! Page fetcher backed by reqwest, with signal extraction through scraper.

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jiff::Timestamp;
use log::debug;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use scraper::{ElementRef, Html, Selector};
use siteplan_core::{
    models::{Heading, ImageStats, LinkStats, PAYLOAD_VERSION},
    CollaboratorError, Snapshot, SnapshotProvider,
};
use url::Url;

const USER_AGENT: &str = concat!("siteplan/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;
const EXCERPT_CHARS: usize = 2000;

/// Fetches pages over HTTP(S) and turns them into [`Snapshot`]s.
pub struct HttpSnapshotProvider {
    client: Client,
}

impl HttpSnapshotProvider {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SnapshotProvider for HttpSnapshotProvider {
    async fn fetch_snapshot(&self, url: &str) -> Result<Snapshot, CollaboratorError> {
        let started = Instant::now();
        let response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Failed(format!(
                "{url} answered with HTTP {status}"
            )));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            if !is_html(content_type) {
                return Err(CollaboratorError::Failed(format!(
                    "{url} is not an HTML page ({content_type})"
                )));
            }
        }

        let final_url = match Url::parse(url) {
            Ok(requested) if &requested == response.url() => None,
            _ => Some(response.url().to_string()),
        };
        let body = response.text().await.map_err(request_error)?;
        let load_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!("Fetched {url} ({} bytes in {load_time_ms} ms)", body.len());

        parse_snapshot(
            &body,
            PageInfo {
                url,
                final_url,
                status_code: Some(status.as_u16()),
                load_time_ms: Some(load_time_ms),
            },
        )
    }
}

/// Transport facts about a fetched page.
#[derive(Debug, Clone)]
pub struct PageInfo<'a> {
    pub url: &'a str,
    pub final_url: Option<String>,
    pub status_code: Option<u16>,
    pub load_time_ms: Option<u64>,
}

/// Extracts the page signals from an HTML document.
pub fn parse_snapshot(html: &str, page: PageInfo<'_>) -> Result<Snapshot, CollaboratorError> {
    let document = Html::parse_document(html);
    let base = Url::parse(page.final_url.as_deref().unwrap_or(page.url)).ok();

    let title = first_text(&document, &selector("title")?);
    let meta_tags = meta_tags(&document, &selector("meta[content]")?);
    let canonical_url = document
        .select(&selector("link[rel~=\"canonical\"][href]")?)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(|href| resolve(base.as_ref(), href));
    let language = document
        .select(&selector("html[lang]")?)
        .next()
        .and_then(|root| root.value().attr("lang"))
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty());

    let headings = document
        .select(&selector("h1, h2, h3, h4, h5, h6")?)
        .filter_map(|heading| {
            let level = heading.value().name()[1..].parse().ok()?;
            let text = collapse_whitespace(&heading.text().collect::<String>());
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect();

    let links = link_stats(&document, &selector("a[href]")?, base.as_ref());

    let mut images = ImageStats::default();
    for image in document.select(&selector("img")?) {
        images.total += 1;
        if image.value().attr("alt").is_none() {
            images.missing_alt += 1;
        }
    }

    let words = match document.select(&selector("body")?).next() {
        Some(body) => visible_words(body),
        None => visible_words(document.root_element()),
    };
    let content_excerpt = excerpt(&words);

    Ok(Snapshot {
        version: PAYLOAD_VERSION,
        url: page.url.to_string(),
        final_url: page.final_url,
        fetched_at: Timestamp::now(),
        status_code: page.status_code,
        title,
        meta_description: meta_tags.get("description").cloned(),
        canonical_url,
        language,
        meta_tags,
        headings,
        word_count: words.len() as u64,
        links,
        images,
        load_time_ms: page.load_time_ms,
        content_excerpt,
    })
}

fn request_error(error: reqwest::Error) -> CollaboratorError {
    if error.is_timeout() {
        CollaboratorError::Timeout
    } else {
        CollaboratorError::Failed(error.to_string())
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

fn selector(css: &'static str) -> Result<Selector, CollaboratorError> {
    Selector::parse(css)
        .map_err(|e| CollaboratorError::Failed(format!("invalid selector '{css}': {e:?}")))
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

/// Named and property meta tags, keyed by lowercase name. The first
/// occurrence of a name wins.
fn meta_tags(document: &Html, selector: &Selector) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    for meta in document.select(selector) {
        let element = meta.value();
        let Some(name) = element.attr("name").or_else(|| element.attr("property")) else {
            continue;
        };
        let content = element.attr("content").unwrap_or_default().trim();
        if name.trim().is_empty() || content.is_empty() {
            continue;
        }
        tags.entry(name.trim().to_ascii_lowercase())
            .or_insert_with(|| content.to_string());
    }
    tags
}

fn link_stats(document: &Html, selector: &Selector, base: Option<&Url>) -> LinkStats {
    let mut stats = LinkStats::default();
    let base_host = base.and_then(Url::host_str);

    for anchor in document.select(selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let target = match base {
            Some(base) => base.join(href.trim()),
            None => Url::parse(href.trim()),
        };
        let Ok(target) = target else {
            continue;
        };
        if !matches!(target.scheme(), "http" | "https") {
            continue;
        }
        if target.host_str() == base_host {
            stats.internal += 1;
        } else {
            stats.external += 1;
        }
    }
    stats
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    base.and_then(|base| base.join(href.trim()).ok())
        .map(String::from)
        .unwrap_or_else(|| href.trim().to_string())
}

/// Words of the text content, skipping script-like elements.
fn visible_words(root: ElementRef<'_>) -> Vec<String> {
    root.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent()?;
            let hidden = parent.value().as_element().is_some_and(|element| {
                matches!(element.name(), "script" | "style" | "noscript" | "template")
            });
            (!hidden).then_some(text)
        })
        .flat_map(|text| text.split_whitespace())
        .map(str::to_string)
        .collect()
}

fn excerpt(words: &[String]) -> Option<String> {
    let mut excerpt = String::new();
    for word in words {
        if excerpt.len() + word.len() + 1 > EXCERPT_CHARS {
            break;
        }
        if !excerpt.is_empty() {
            excerpt.push(' ');
        }
        excerpt.push_str(word);
    }
    (!excerpt.is_empty()).then_some(excerpt)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
