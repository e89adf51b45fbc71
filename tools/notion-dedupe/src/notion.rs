//! Minimal Notion API client — database query pagination and page
//! property updates, nothing more.

use anyhow::{Result, bail};
use serde::Deserialize;
use serde_json::{Value, json};

const NOTION_BASE_URL: &str = "https://api.notion.com";

/// One database row. Properties stay as raw JSON; the handful of
/// shapes a uid can take is read straight off `Value`.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: Value,
}

impl Page {
    /// Read the uid property as a plain string. Supports the property
    /// types a workspace realistically uses for an id column; anything
    /// else reads as empty and the row is skipped.
    pub fn uid(&self, prop: &str) -> String {
        let Some(p) = self.properties.get(prop) else {
            return String::new();
        };
        match p.get("type").and_then(Value::as_str) {
            Some("rich_text") => join_plain_text(p.get("rich_text")),
            Some("title") => join_plain_text(p.get("title")),
            Some("url") => p.get("url").and_then(Value::as_str).unwrap_or("").to_owned(),
            Some("email") => p
                .get("email")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_owned(),
            Some("number") => p
                .get("number")
                .and_then(Value::as_f64)
                .map(|n| n.to_string())
                .unwrap_or_default(),
            Some("formula") => p
                .pointer("/formula/string")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_owned(),
            _ => String::new(),
        }
    }

    pub fn is_primary(&self, prop: &str) -> bool {
        let Some(p) = self.properties.get(prop) else {
            return false;
        };
        p.get("type").and_then(Value::as_str) == Some("checkbox")
            && p.get("checkbox").and_then(Value::as_bool).unwrap_or(false)
    }
}

fn join_plain_text(fragments: Option<&Value>) -> String {
    fragments
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|t| t.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
                .trim()
                .to_owned()
        })
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<Page>,
    has_more: bool,
    next_cursor: Option<String>,
}

pub struct NotionClient {
    http: reqwest::Client,
    token: String,
    version: String,
}

impl NotionClient {
    pub fn new(token: &str, version: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            token: token.to_owned(),
            version: version.to_owned(),
        })
    }

    /// Fetch every page of the database, newest first. The created-time
    /// sort is what lets the planner treat the first row of each group
    /// as canonical.
    pub async fn query_all(&self, database_id: &str) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut body = json!({
                "page_size": 100,
                "sorts": [{ "timestamp": "created_time", "direction": "descending" }],
            });
            if let Some(c) = &cursor {
                body["start_cursor"] = json!(c);
            }

            let res = self
                .http
                .post(format!("{NOTION_BASE_URL}/v1/databases/{database_id}/query"))
                .bearer_auth(&self.token)
                .header("Notion-Version", &self.version)
                .json(&body)
                .send()
                .await?;
            if !res.status().is_success() {
                bail!("query failed: {} {}", res.status(), res.text().await?);
            }

            let data: QueryResponse = res.json().await?;
            pages.extend(data.results);
            match (data.has_more, data.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(pages)
    }

    pub async fn set_checkbox(&self, page_id: &str, prop: &str, value: bool) -> Result<()> {
        self.patch_properties(page_id, json!({ prop: { "checkbox": value } }))
            .await
    }

    pub async fn stamp_date(&self, page_id: &str, prop: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.patch_properties(page_id, json!({ prop: { "date": { "start": now } } }))
            .await
    }

    async fn patch_properties(&self, page_id: &str, properties: Value) -> Result<()> {
        let res = self
            .http
            .patch(format!("{NOTION_BASE_URL}/v1/pages/{page_id}"))
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
            .json(&json!({ "properties": properties }))
            .send()
            .await?;
        if !res.status().is_success() {
            bail!("update failed: {} {}", res.status(), res.text().await?);
        }
        Ok(())
    }
}
