//! Naver Shopping search API.

use std::{env, thread::sleep, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ureq::{Agent, AgentBuilder};

use crate::{number, reconcile::Signal};

pub mod monitor;

const ENDPOINT: &str = "https://openapi.naver.com/v1/search/shop.json";
/// Largest page the API serves.
const MAX_DISPLAY: usize = 100;
/// Largest `start` the API accepts.
const MAX_START: usize = 1000;
const PAGE_DELAY: Duration = Duration::from_millis(100);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Sort {
    /// Relevance
    #[default]
    Sim,
    /// Newest first
    Date,
    /// Cheapest first
    Asc,
    /// Most expensive first
    Dsc,
}

impl Sort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sim => "sim",
            Self::Date => "date",
            Self::Asc => "asc",
            Self::Dsc => "dsc",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    lprice: String,
    #[serde(default)]
    mall_name: String,
    #[serde(default)]
    brand: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
    pub title: String,
    pub price: f64,
    pub mall_name: String,
    pub brand: String,
    pub link: String,
    pub image: String,
}

impl From<RawItem> for SearchItem {
    fn from(x: RawItem) -> Self {
        Self {
            title: strip_tags(&x.title),
            price: number::extract(&x.lprice),
            mall_name: x.mall_name.trim().to_string(),
            brand: x.brand,
            link: x.link,
            image: x.image,
        }
    }
}

impl SearchItem {
    pub fn signal(&self) -> Signal {
        Signal::new("search").price(self.price)
    }
}

/// Titles come back with the query terms wrapped in `<b>`.
pub fn strip_tags(title: &str) -> String {
    title.replace("<b>", "").replace("</b>", "").trim().to_string()
}

pub fn parse_page(json: &str) -> Result<Vec<SearchItem>> {
    let response: Response = serde_json::from_str(json)?;
    Ok(response.items.into_iter().map(SearchItem::from).collect())
}

pub struct SearchClient {
    agent: Agent,
    client_id: String,
    client_secret: String,
}

impl SearchClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        let agent = AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();
        Self {
            agent,
            client_id,
            client_secret,
        }
    }

    pub fn from_env() -> Result<Self> {
        let client_id = env::var("NAVER_CLIENT_ID").context("NAVER_CLIENT_ID is not set")?;
        let client_secret =
            env::var("NAVER_CLIENT_SECRET").context("NAVER_CLIENT_SECRET is not set")?;
        ensure!(
            !client_id.is_empty() && !client_secret.is_empty(),
            "Naver API credentials are empty"
        );
        Ok(Self::new(client_id, client_secret))
    }

    /// One page of results. `start` is 1-based.
    pub fn page(
        &self,
        query: &str,
        display: usize,
        start: usize,
        sort: Sort,
    ) -> Result<Vec<SearchItem>> {
        let display = display.clamp(1, MAX_DISPLAY);
        let json = self
            .agent
            .get(ENDPOINT)
            .set("X-Naver-Client-Id", &self.client_id)
            .set("X-Naver-Client-Secret", &self.client_secret)
            .query("query", query)
            .query("display", &display.to_string())
            .query("start", &start.to_string())
            .query("sort", sort.as_str())
            .call()
            .with_context(|| format!("Search failed: {query}"))?
            .into_string()?;
        let items = parse_page(&json)?;
        debug!(query, start, count = items.len(), "search page");
        Ok(items)
    }

    /// Page through results until `max_results`, an empty page or the API's
    /// `start` limit. A failure after the first page keeps what was fetched.
    pub fn search(&self, query: &str, max_results: usize, sort: Sort) -> Result<Vec<SearchItem>> {
        let mut items = Vec::new();
        let mut start = 1;
        while items.len() < max_results && start <= MAX_START {
            let display = (max_results - items.len()).min(MAX_DISPLAY);
            let page = match self.page(query, display, start, sort) {
                Ok(x) => x,
                Err(err) if !items.is_empty() => {
                    warn!(query, start, "{err:#}");
                    break;
                }
                Err(err) => return Err(err),
            };
            if page.is_empty() {
                break;
            }

            items.extend(page);
            start += display;
            sleep(PAGE_DELAY);
        }
        items.truncate(max_results);
        Ok(items)
    }
}
