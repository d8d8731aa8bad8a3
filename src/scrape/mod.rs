//! Product page scraping: fetch, select fields, reconcile, compare.

use std::{collections::BTreeMap, path::Path, thread::sleep, time::Duration};

use _model::Platform;
use anyhow::{Context, Result};
use scraper::Html;
use serde::Serialize;
use tracing::{error, info, warn};
use ureq::{Agent, AgentBuilder};

use crate::{
    compare::Comparison,
    config::PlatformConfig,
    listing::Listing,
    number,
    reconcile::{reconcile, Signal},
    rules::RuleSet,
    utils::progress_bar,
};

use self::html::Page;

mod html;
mod smartstore;

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
);
const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const REQUEST_DELAY: Duration = Duration::from_secs(2);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Price,
    OriginalPrice,
    DiscountRate,
    Title,
    Stock,
    Seller,
    MaxDiscountPrice,
    MaxDiscountRate,
}

/// Raw text candidates for a field, highest priority first.
pub trait FieldSource {
    fn candidates(&self, field: Field) -> Vec<String>;

    fn first(&self, field: Field) -> Option<String> {
        self.candidates(field).into_iter().next()
    }
}

pub struct Scraper {
    platform: Platform,
    config: PlatformConfig,
    agent: Agent,
}

impl Scraper {
    pub fn new(platform: Platform, config: PlatformConfig) -> Self {
        let user_agent = match config.user_agent.as_str() {
            "" => USER_AGENT,
            x => x,
        };
        let agent = AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout))
            .user_agent(user_agent)
            .build();

        Self {
            platform,
            config,
            agent,
        }
    }

    pub fn load(platform: Platform, dir: &Path) -> Result<Self> {
        Ok(Self::new(platform, PlatformConfig::load(dir, platform)?))
    }

    pub fn fetch(&self, url: &str) -> Result<String> {
        let html = self
            .agent
            .get(url)
            .set("Accept", ACCEPT)
            .set("Accept-Language", "ko-KR,ko;q=0.9,en;q=0.8")
            .set("Referer", &self.platform.referer())
            .call()?
            .into_string()?;
        Ok(html)
    }

    pub fn scrape(&self, url: &str, rules: Option<&RuleSet>) -> Result<Listing> {
        let html = self
            .fetch(url)
            .with_context(|| format!("Failed to fetch {url}"))?;
        self.parse(url, &html, rules)
    }

    /// Built-in platform selectors are tried before the config's.
    pub fn parse(&self, url: &str, html: &str, rules: Option<&RuleSet>) -> Result<Listing> {
        let doc = Html::parse_document(html);
        let page = Page::new(&doc, &self.config.selectors);

        let mut signals = Vec::new();
        if let Some(selectors) = smartstore::selectors(self.platform) {
            signals.push(Signal::from_fields(
                self.platform.slug(),
                &Page::new(&doc, &selectors),
            ));
        }
        signals.push(Signal::from_fields("config", &page));

        let record = reconcile(&signals)?;
        let title = page.first(Field::Title).context("No title found")?;

        let mut listing = Listing::new(self.platform.slug(), title, url, record)
            .with_seller(page.first(Field::Seller), rules);
        listing.stock = page
            .first(Field::Stock)
            .map(|x| number::extract_count(&x))
            .unwrap_or(0);
        listing.max_discount_price = positive_number(&page, Field::MaxDiscountPrice);
        listing.max_discount_rate = positive_number(&page, Field::MaxDiscountRate);

        info!(
            platform = self.platform.slug(),
            title = listing.title.as_str(),
            price = listing.record.price(),
            discount_rate = listing.record.discount_rate(),
            "scraped"
        );
        Ok(listing)
    }
}

fn positive_number(page: &Page, field: Field) -> Option<f64> {
    Some(number::extract(&page.first(field)?)).filter(|x| *x > 0.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub url: String,
    pub error: String,
}

/// Scraped listings keyed by platform slug, plus everything that failed.
#[derive(Debug, Default)]
pub struct CompareRun {
    pub comparison: Comparison,
    pub listings: BTreeMap<String, Listing>,
    pub failures: Vec<Failure>,
}

pub fn load_scrapers(dir: &Path) -> BTreeMap<Platform, Scraper> {
    let mut scrapers = BTreeMap::new();
    for platform in Platform::scrapable() {
        match Scraper::load(platform, dir) {
            Ok(x) => {
                scrapers.insert(platform, x);
            }
            Err(err) => error!(platform = platform.slug(), "{err:#}"),
        }
    }
    scrapers
}

pub fn run(urls: &[String], platforms: &Path, rules: Option<&RuleSet>) -> Result<CompareRun> {
    let scrapers = load_scrapers(platforms);
    let mut run = CompareRun::default();

    info!("Comparing {} urls", urls.len());
    let pb = progress_bar(urls.len() as u64);
    for (i, url) in urls.iter().enumerate() {
        let result = match Platform::detect(url) {
            None => Err(anyhow::anyhow!("Unsupported platform")),
            Some(platform) => match scrapers.get(&platform) {
                None => Err(anyhow::anyhow!("No scraper for {platform}")),
                Some(scraper) => scraper.scrape(url, rules),
            },
        };

        match result {
            Ok(listing) => {
                run.comparison.add(listing.source.clone(), listing.record);
                run.listings.insert(listing.source.clone(), listing);
            }
            Err(err) => {
                warn!(url = url.as_str(), "{err:#}");
                run.failures.push(Failure {
                    url: url.clone(),
                    error: format!("{err:#}"),
                });
            }
        }

        pb.inc(1);
        if i + 1 < urls.len() {
            sleep(REQUEST_DELAY);
        }
    }
    pb.finish_and_clear();
    info!("Scraped {} of {} urls", run.comparison.len(), urls.len());

    Ok(run)
}
