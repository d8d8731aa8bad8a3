//! Reseller price monitoring over search results.

use std::{collections::BTreeMap, thread::sleep, time::Duration};

use _model::SellerLabel;
use anyhow::Result;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};

use super::{SearchClient, SearchItem, Sort};
use crate::{
    config::{MonitorConfig, MonitoringSettings, TargetProduct},
    listing::Listing,
    reconcile::{reconcile, Signal},
    rules::RuleSet,
    utils::progress_bar,
};

const PRODUCT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductReport {
    pub product_name: String,
    pub keyword: String,
    pub original_price: f64,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total_items: usize,
    pub filtered_items: usize,
    pub reseller_count: usize,
    /// Filtered items without a usable price.
    pub failed_items: Vec<FailedItem>,
    pub labels: BTreeMap<SellerLabel, usize>,
    /// Cheapest first.
    pub results: Vec<Listing>,
    pub timestamp: DateTime<Utc>,
}

impl ProductReport {
    pub fn lowest(&self) -> Option<&Listing> {
        self.results.first()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub mall_name: String,
    pub title: String,
    pub link: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub total_products: usize,
    pub total_resellers: usize,
    pub monitoring_timestamp: DateTime<Utc>,
    pub products: Vec<ProductReport>,
}

/// Drop titles with an excluded keyword (case-insensitive) and prices
/// outside the inclusive threshold range.
pub fn filter_items(items: &[SearchItem], settings: &MonitoringSettings) -> Vec<SearchItem> {
    let excluded = settings
        .exclude_keywords
        .iter()
        .map(|x| x.to_lowercase())
        .collect::<Vec<_>>();

    items
        .iter()
        .filter(|item| {
            let title = item.title.to_lowercase();
            !excluded.iter().any(|x| title.contains(x.as_str()))
        })
        .filter(|item| {
            item.price >= settings.min_price_threshold && item.price <= settings.max_price_threshold
        })
        .cloned()
        .collect()
}

fn listing(
    item: &SearchItem,
    product: &TargetProduct,
    rules: Option<&RuleSet>,
) -> Result<Listing, FailedItem> {
    let signals = [
        item.signal(),
        Signal::new("config").original_price(product.original_price),
    ];
    let record = reconcile(&signals).map_err(|err| {
        warn!(
            mall = item.mall_name.as_str(),
            title = item.title.as_str(),
            "{err}"
        );
        FailedItem {
            mall_name: item.mall_name.clone(),
            title: item.title.clone(),
            link: item.link.clone(),
            error: err.to_string(),
        }
    })?;

    let mut listing = Listing::new(&item.mall_name, &item.title, &item.link, record)
        .with_seller(Some(item.mall_name.clone()), rules);
    if !item.image.is_empty() {
        listing.image = Some(item.image.clone());
    }
    Ok(listing)
}

/// Build a product's report from its search outcome.
pub fn evaluate(
    product: &TargetProduct,
    search: Result<Vec<SearchItem>>,
    settings: &MonitoringSettings,
    rules: Option<&RuleSet>,
) -> ProductReport {
    let mut report = ProductReport {
        product_name: product.name.clone(),
        keyword: product.keyword.clone(),
        original_price: product.original_price,
        status: Status::Ok,
        error: None,
        total_items: 0,
        filtered_items: 0,
        reseller_count: 0,
        failed_items: Vec::new(),
        labels: BTreeMap::new(),
        results: Vec::new(),
        timestamp: Utc::now(),
    };

    let items = match search {
        Ok(x) => x,
        Err(err) => {
            error!(product = product.name.as_str(), "{err:#}");
            report.status = Status::Error;
            report.error = Some(format!("{err:#}"));
            return report;
        }
    };

    let filtered = filter_items(&items, settings);
    let (mut results, failed): (Vec<_>, Vec<_>) = filtered
        .par_iter()
        .map(|item| listing(item, product, rules))
        .collect::<Vec<_>>()
        .into_iter()
        .partition_result();
    results.sort_by(|a, b| a.record.price().total_cmp(&b.record.price()));

    report.total_items = items.len();
    report.filtered_items = filtered.len();
    report.reseller_count = results.len();
    report.failed_items = failed;
    report.labels = results
        .iter()
        .filter_map(|x| x.seller_label)
        .counts()
        .into_iter()
        .collect();
    report.results = results;

    info!(
        product = product.name.as_str(),
        total = report.total_items,
        kept = report.reseller_count,
        failed = report.failed_items.len(),
        "monitored"
    );
    report
}

pub fn summarize(products: Vec<ProductReport>) -> MonitorReport {
    MonitorReport {
        total_products: products.len(),
        total_resellers: products.iter().map(|x| x.results.len()).sum(),
        monitoring_timestamp: Utc::now(),
        products,
    }
}

pub fn run(
    client: &SearchClient,
    config: &MonitorConfig,
    sort: Sort,
    rules: Option<&RuleSet>,
) -> MonitorReport {
    let settings = &config.monitoring_settings;
    let products = &config.target_products;
    info!("Monitoring {} products", products.len());

    let pb = progress_bar(products.len() as u64);
    let mut reports = Vec::new();
    for (i, product) in products.iter().enumerate() {
        let search = client.search(&product.keyword, settings.max_results_per_product, sort);
        reports.push(evaluate(product, search, settings, rules));

        pb.inc(1);
        if i + 1 < products.len() {
            sleep(PRODUCT_DELAY);
        }
    }
    pb.finish_and_clear();

    summarize(reports)
}
