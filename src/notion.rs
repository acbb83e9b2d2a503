//! Publishing report text to a Notion database as a new page.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::NotionCredentials;
use crate::http::{self, Replay, RetryPolicy};
use crate::output;
use crate::window;

pub const NOTION_VERSION: &str = "2022-06-28";

/// Notion rejects requests carrying more children than this.
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

/// Notion's limit on a single rich-text segment.
const MAX_TEXT_CHARS: usize = 2000;

/// The page created by [`NotionClient::publish`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishedPage {
    pub id: String,
    #[serde(default)]
    pub url: String,
}

pub struct NotionClient {
    client: reqwest::blocking::Client,
    base_url: String,
    credentials: NotionCredentials,
    retry: RetryPolicy,
}

impl NotionClient {
    pub fn new(base_url: &str, credentials: NotionCredentials, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            client: http::build_client()?,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            credentials,
            retry,
        })
    }

    /// Create a page titled `工作日报 - {date}` holding one paragraph per
    /// non-blank line of `report_text`. `date` defaults to today (UTC).
    pub fn publish(&self, report_text: &str, date: Option<&str>) -> Result<PublishedPage> {
        let date = match date {
            Some(raw) => window::format_date(window::parse_date(raw)?),
            None => window::today_utc(),
        };
        let blocks = build_blocks(report_text);
        let mut chunks = blocks.chunks(MAX_CHILDREN_PER_REQUEST);
        let first = chunks.next().unwrap_or(&[]);

        let body = page_request(&self.credentials, &date, first);
        let url = format!("{}/v1/pages", self.base_url);
        let resp = http::send_with_retry(&self.retry, Replay::ConnectOnly, &url, || {
            self.authorized(self.client.post(&url)).json(&body)
        })?;
        let page: PublishedPage = serde_json::from_str(&expect_ok(resp)?)
            .context("failed to parse Notion page response")?;
        output::verbose(&format!("created Notion page {}", page.id));

        for chunk in chunks {
            self.append_children(&page.id, chunk)?;
        }
        Ok(page)
    }

    fn append_children(&self, block_id: &str, children: &[Value]) -> Result<()> {
        let url = format!("{}/v1/blocks/{block_id}/children", self.base_url);
        let body = json!({ "children": children });
        let resp = http::send_with_retry(&self.retry, Replay::ConnectOnly, &url, || {
            self.authorized(self.client.patch(&url)).json(&body)
        })?;
        expect_ok(resp).with_context(|| format!("failed to append blocks to page {block_id}"))?;
        Ok(())
    }

    fn authorized(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        req.header("Authorization", format!("Bearer {}", self.credentials.token))
            .header("Notion-Version", NOTION_VERSION)
    }
}

/// One paragraph block per non-blank line, text kept as-is.
pub fn build_blocks(report_text: &str) -> Vec<Value> {
    report_text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(paragraph)
        .collect()
}

fn paragraph(line: &str) -> Value {
    let rich_text: Vec<Value> = split_chars(line, MAX_TEXT_CHARS)
        .into_iter()
        .map(|segment| json!({ "type": "text", "text": { "content": segment } }))
        .collect();
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": rich_text }
    })
}

fn split_chars(s: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    chars
        .chunks(max)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn page_request(credentials: &NotionCredentials, date: &str, children: &[Value]) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        credentials.title_property.clone(),
        json!({ "title": [{ "text": { "content": format!("工作日报 - {date}") } }] }),
    );
    properties.insert(
        credentials.date_property.clone(),
        json!({ "date": { "start": date } }),
    );
    json!({
        "parent": { "database_id": credentials.database_id },
        "properties": properties,
        "children": children,
    })
}

/// Body of a 200 response; anything else is an error carrying the raw status
/// and body.
fn expect_ok(resp: reqwest::blocking::Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    if status != reqwest::StatusCode::OK {
        bail!("Notion returned HTTP {}: {}", status.as_u16(), body.trim());
    }
    Ok(body)
}
