use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use _model::Platform;
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::scrape::Field;

/// Products to watch on the shopping search API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub target_products: Vec<TargetProduct>,
    #[serde(default)]
    pub monitoring_settings: MonitoringSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetProduct {
    pub name: String,
    pub keyword: String,
    /// Manufacturer list price every listing is measured against.
    pub original_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringSettings {
    pub exclude_keywords: Vec<String>,
    pub min_price_threshold: f64,
    pub max_price_threshold: f64,
    pub max_results_per_product: usize,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            exclude_keywords: Vec::new(),
            min_price_threshold: 10_000.0,
            max_price_threshold: 1_000_000.0,
            max_results_per_product: 100,
        }
    }
}

impl MonitorConfig {
    /// JSON, or YAML for `.yaml`/`.yml` files.
    pub fn load(path: &Path) -> Result<Self> {
        let text = read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = match path.extension().and_then(|x| x.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&text)?,
            _ => serde_json::from_str(&text)?,
        };
        Ok(config)
    }
}

/// CSS selectors per field, tried in order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub price: Vec<String>,
    pub original_price: Vec<String>,
    pub discount_rate: Vec<String>,
    pub title: Vec<String>,
    pub stock: Vec<String>,
    pub seller: Vec<String>,
    pub max_discount_price: Vec<String>,
    pub max_discount_rate: Vec<String>,
}

impl Selectors {
    pub fn get(&self, field: Field) -> &[String] {
        match field {
            Field::Price => &self.price,
            Field::OriginalPrice => &self.original_price,
            Field::DiscountRate => &self.discount_rate,
            Field::Title => &self.title,
            Field::Stock => &self.stock,
            Field::Seller => &self.seller,
            Field::MaxDiscountPrice => &self.max_discount_price,
            Field::MaxDiscountRate => &self.max_discount_rate,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub selectors: Selectors,
    /// Milliseconds.
    pub timeout: u64,
    pub user_agent: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            timeout: 10_000,
            user_agent: String::new(),
        }
    }
}

impl PlatformConfig {
    pub fn path(dir: &Path, platform: Platform) -> PathBuf {
        dir.join(format!("{}.json", platform.slug()))
    }

    pub fn load(dir: &Path, platform: Platform) -> Result<Self> {
        let path = Self::path(dir, platform);
        let text = read_to_string(&path)
            .with_context(|| format!("Failed to read platform config: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse platform config: {}", path.display()))
    }
}
