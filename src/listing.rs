use _model::SellerLabel;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{classify::classify, reconcile::DiscountRecord, rules::RuleSet};

/// A reconciled price with where it came from and who sells it.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    /// Platform slug for scraped pages, mall name for search results.
    pub source: String,
    pub title: String,
    pub url: String,
    pub seller: Option<String>,
    pub seller_label: Option<SellerLabel>,
    #[serde(flatten)]
    pub record: DiscountRecord,
    pub stock: u32,
    pub image: Option<String>,
    pub max_discount_price: Option<f64>,
    pub max_discount_rate: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Listing {
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        record: DiscountRecord,
    ) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            url: url.into(),
            seller: None,
            seller_label: None,
            record,
            stock: 0,
            image: None,
            max_discount_price: None,
            max_discount_rate: None,
            timestamp: Utc::now(),
        }
    }

    /// Record the seller and, when rules are loaded, its label.
    pub fn with_seller(mut self, seller: Option<String>, rules: Option<&RuleSet>) -> Self {
        self.seller_label = rules.map(|rules| classify(seller.as_deref(), rules));
        self.seller = seller;
        self
    }
}
