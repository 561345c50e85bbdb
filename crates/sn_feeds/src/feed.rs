//! RSS 2.0 / Atom feed source over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use sn_core::{Error, FeedSource, RawEntry, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RssFeedSource {
    client: Client,
}

impl RssFeedSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    fn name(&self) -> &str {
        "rss"
    }

    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Feed(format!("HTTP {} from {}", status.as_u16(), url)));
        }
        let body = response.bytes().await?;
        parse_feed(&body)
    }
}

/// Parses a feed document, trying RSS first and Atom second.
pub fn parse_feed(body: &[u8]) -> Result<Vec<RawEntry>> {
    if let Ok(channel) = rss::Channel::read_from(body) {
        return Ok(channel.items().iter().map(rss_entry).collect());
    }
    match atom_syndication::Feed::read_from(body) {
        Ok(feed) => Ok(feed.entries().iter().map(atom_entry).collect()),
        Err(e) => Err(Error::Feed(format!("neither RSS nor Atom: {}", e))),
    }
}

fn rss_entry(item: &rss::Item) -> RawEntry {
    let published = item
        .pub_date()
        .map(str::to_string)
        .or_else(|| {
            item.dublin_core_ext()
                .and_then(|dc| dc.dates().first().cloned())
        });
    let published_parsed = published.as_deref().and_then(|text| {
        DateTime::parse_from_rfc2822(text.trim())
            .or_else(|_| DateTime::parse_from_rfc3339(text.trim()))
            .ok()
            .map(|dt| dt.naive_utc())
    });

    RawEntry {
        title: item.title().map(str::to_string),
        link: item.link().map(str::to_string),
        summary: item
            .description()
            .or_else(|| item.content())
            .map(str::to_string),
        published_parsed,
        published,
    }
}

fn atom_entry(entry: &atom_syndication::Entry) -> RawEntry {
    let timestamp = entry.published().copied().unwrap_or_else(|| *entry.updated());
    let summary = entry
        .summary()
        .map(|s| s.as_str().to_string())
        .or_else(|| entry.content().and_then(|c| c.value()).map(str::to_string));

    RawEntry {
        title: Some(entry.title().as_str().to_string()),
        link: entry.links().first().map(|l| l.href().to_string()),
        summary,
        published_parsed: Some(timestamp.naive_utc()),
        published: Some(timestamp.to_rfc3339()),
    }
}
