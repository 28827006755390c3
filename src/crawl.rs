use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::document::ParsedDocument;
use crate::fetch::DocumentSource;
use crate::listing::{self, InvalidListing, Listing};

pub struct CrawlConfig {
    /// Index page URL with a `{page}` placeholder.
    pub index_url: String,
    /// Path prefix identifying listing detail pages, e.g. `/annonce-`.
    pub listing_prefix: String,
    pub pages: u32,
}

impl CrawlConfig {
    pub fn index_page_url(&self, page: u32) -> String {
        self.index_url.replace("{page}", &page.to_string())
    }
}

/// A listing page that failed validation.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub url: String,
    pub kind: &'static str,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct CrawlReport {
    pub listings: Vec<Listing>,
    pub rejections: Vec<Rejection>,
    pub pages: u32,
    pub links_seen: usize,
    pub duplicates: usize,
}

impl CrawlReport {
    pub fn rejections_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.rejections {
            *counts.entry(r.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn summary(&self) -> String {
        let mut s = format!(
            "{} pages, {} links ({} duplicates), {} listings kept, {} rejected",
            self.pages,
            self.links_seen,
            self.duplicates,
            self.listings.len(),
            self.rejections.len()
        );
        let by_kind = self.rejections_by_kind();
        if !by_kind.is_empty() {
            let parts: Vec<String> = by_kind.iter().map(|(k, n)| format!("{}: {}", k, n)).collect();
            s.push_str(&format!(" [{}]", parts.join(", ")));
        }
        s
    }
}

/// Walk index pages 1..=N, fetching each distinct listing once.
///
/// Invalid listings are recorded and skipped; any fetch failure aborts the run.
pub async fn crawl<S: DocumentSource>(source: &S, cfg: &CrawlConfig) -> Result<CrawlReport> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut report = CrawlReport::default();

    let pb = ProgressBar::new(cfg.pages as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} page {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    for page in 1..=cfg.pages {
        let index_url = cfg.index_page_url(page);
        let origin = Url::parse(&index_url)
            .and_then(|u| u.join("/"))
            .with_context(|| format!("Invalid index URL {}", index_url))?;

        let html = source.fetch_html(&index_url).await?;
        let links = listing_links(&ParsedDocument::parse(&html), &origin, &cfg.listing_prefix);
        report.pages += 1;
        info!(page, count = links.len(), "Found listing links");

        for url in links {
            report.links_seen += 1;
            // Marked before fetching so a link repeated on a later page is skipped.
            if !visited.insert(url.clone()) {
                report.duplicates += 1;
                debug!("Already visited {}", url);
                continue;
            }

            let html = source.fetch_html(&url).await?;
            match listing::validate(&ParsedDocument::parse(&html)) {
                Ok(listing) => report.listings.push(listing),
                Err(InvalidListing(reason)) => {
                    warn!(url = %url, reason = %reason, "Rejected listing");
                    report.rejections.push(Rejection {
                        url,
                        kind: reason.kind(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        pb.set_message(format!("{} kept", report.listings.len()));
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Crawl done: {}", report.summary());
    Ok(report)
}

/// Absolute URLs of listing links on an index page, in page order.
pub fn listing_links(doc: &ParsedDocument, origin: &Url, prefix: &str) -> Vec<String> {
    doc.hrefs()
        .iter()
        .filter_map(|href| normalize_link(origin, href, prefix))
        .collect()
}

/// Resolve `href` against the site origin and keep it if its path starts with
/// the listing prefix. The query is part of the listing identity; only the
/// fragment is dropped since it never reaches the server.
pub fn normalize_link(origin: &Url, href: &str, prefix: &str) -> Option<String> {
    let mut url = origin.join(href).ok()?;
    if !url.path().starts_with(prefix) {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

// ── Tests ──
