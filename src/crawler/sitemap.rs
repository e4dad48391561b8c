//! Sitemap discovery
//!
//! Pages are listed by `<urlset><url><loc>` documents. Sitemaps are processed in the
//! configured order and their URLs concatenated as they appear.

use crate::fetch::fetch_text;
use crate::{DistillError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

/// Lists page URLs from sitemap documents
pub struct SitemapCrawler {
    client: Client,
    max_redirects: usize,
}

impl SitemapCrawler {
    pub fn new(client: Client, max_redirects: usize) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    /// Lists the page URLs of one sitemap, in document order
    ///
    /// A sitemap that cannot be fetched or parsed is logged and contributes no URLs.
    pub async fn list_urls(&self, sitemap_url: &str) -> Vec<String> {
        match self.try_list_urls(sitemap_url).await {
            Ok(urls) => {
                tracing::info!("Sitemap {} lists {} URLs", sitemap_url, urls.len());
                urls
            }
            Err(e) => {
                tracing::warn!("Skipping sitemap {}: {}", sitemap_url, e);
                Vec::new()
            }
        }
    }

    /// Concatenates the URLs of every sitemap without de-duplication
    pub async fn collect(&self, sitemaps: &[String]) -> Vec<String> {
        let mut urls = Vec::new();
        for sitemap in sitemaps {
            urls.extend(self.list_urls(sitemap).await);
        }
        urls
    }

    async fn try_list_urls(&self, sitemap_url: &str) -> Result<Vec<String>> {
        let xml = fetch_text(&self.client, sitemap_url, self.max_redirects).await?;
        parse_urlset(&xml).map_err(|e| DistillError::SitemapParse {
            url: sitemap_url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Extracts every `<url><loc>` value from a sitemap document
///
/// Text and CDATA content are both accepted; surrounding whitespace is trimmed and
/// empty locations are skipped.
pub fn parse_urlset(xml: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut in_url = false;
    let mut in_loc = false;
    let mut loc = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"loc" if in_url => {
                    in_loc = true;
                    loc.clear();
                }
                _ => {}
            },
            Event::Text(e) if in_loc => {
                loc.push_str(&e.unescape()?);
            }
            Event::CData(e) if in_loc => {
                loc.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"loc" if in_loc => {
                    in_loc = false;
                    let trimmed = loc.trim();
                    if !trimmed.is_empty() {
                        urls.push(trimmed.to_string());
                    }
                }
                b"url" => in_url = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(urls)
}
