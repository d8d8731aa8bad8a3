//! Price reconciliation.
//!
//! A listing is usually read several ways: platform-specific selectors,
//! the generic selectors from its config, a search API field, a configured
//! list price. Each attempt is a [`Signal`]; [`reconcile`] merges them field by
//! field, in priority order, into one [`DiscountRecord`].

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use typed_floats::tf64::StrictlyPositiveFinite;

use crate::{
    number,
    scrape::{Field, FieldSource},
};

pub const GOOD_DEAL_THRESHOLD: f64 = 20.0;

/// One extraction attempt. A zero or missing value means "not found".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    pub source: String,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount_rate: Option<f64>,
}

impl Signal {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn price(mut self, x: f64) -> Self {
        self.price = Some(x);
        self
    }

    pub fn original_price(mut self, x: f64) -> Self {
        self.original_price = Some(x);
        self
    }

    pub fn discount_rate(mut self, x: f64) -> Self {
        self.discount_rate = Some(x);
        self
    }

    /// Take, per field, the first candidate that parses to a usable number.
    pub fn from_fields(source: impl Into<String>, fields: &dyn FieldSource) -> Self {
        let first = |field: Field| {
            fields
                .candidates(field)
                .iter()
                .map(|x| number::extract(x))
                .find(|x| *x > 0.0)
        };

        Self {
            source: source.into(),
            price: first(Field::Price),
            original_price: first(Field::OriginalPrice),
            discount_rate: first(Field::DiscountRate),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no usable price among {attempts} extraction attempt(s)")]
pub struct ExtractionError {
    pub attempts: usize,
}

/// A reconciled price observation. Only [`reconcile`] builds one, so the
/// discount fields always agree with the prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiscountRecord {
    price: StrictlyPositiveFinite,
    original_price: Option<StrictlyPositiveFinite>,
    discount_rate: f64,
    discount_amount: f64,
    is_discounted: bool,
    observed_rate: Option<f64>,
    derived_rate: Option<f64>,
}

impl DiscountRecord {
    fn new(
        price: StrictlyPositiveFinite,
        original_price: Option<StrictlyPositiveFinite>,
        observed_rate: Option<f64>,
    ) -> Self {
        let derived_rate = original_price
            .filter(|x| x.get() > price.get())
            .map(|x| discount_rate(price.get(), x.get()));
        let is_discounted = derived_rate.is_some();

        // an observed rate only applies while there is a discount to describe
        let discount_rate = if is_discounted {
            observed_rate.or(derived_rate).unwrap_or(0.0)
        } else {
            0.0
        };

        Self {
            price,
            original_price,
            discount_rate,
            discount_amount: original_price
                .map(|x| savings_amount(price.get(), x.get()))
                .unwrap_or(0.0),
            is_discounted,
            observed_rate,
            derived_rate,
        }
    }

    pub fn price(&self) -> f64 {
        self.price.get()
    }

    pub fn original_price(&self) -> Option<f64> {
        self.original_price.map(|x| x.get())
    }

    pub fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    pub fn discount_amount(&self) -> f64 {
        self.discount_amount
    }

    pub fn is_discounted(&self) -> bool {
        self.is_discounted
    }

    /// The rate read from the listing, kept even when it lost to the prices.
    pub fn observed_rate(&self) -> Option<f64> {
        self.observed_rate
    }

    pub fn derived_rate(&self) -> Option<f64> {
        self.derived_rate
    }

    /// Observed and derived rates both exist and disagree.
    pub fn rate_conflict(&self) -> bool {
        matches!((self.observed_rate, self.derived_rate), (Some(a), Some(b)) if a != b)
    }

    pub fn is_good_deal(&self, threshold: f64) -> bool {
        self.discount_rate >= threshold
    }
}

/// Merge signals, highest priority first, into one record.
///
/// Each field is resolved on its own: price and original price take the first
/// positive candidate, the discount rate the first observed value in
/// `(0, 100]`. Fails only when no signal has a positive price.
pub fn reconcile(signals: &[Signal]) -> Result<DiscountRecord, ExtractionError> {
    let (price, price_source) = first(signals, |x| x.price.and_then(positive)).ok_or(
        ExtractionError {
            attempts: signals.len(),
        },
    )?;
    debug!(price = price.get(), source = price_source, "price");

    let original_price = first(signals, |x| x.original_price.and_then(positive)).map(
        |(x, source)| {
            debug!(original_price = x.get(), source, "original price");
            x
        },
    );

    let observed_rate = first(signals, |x| {
        x.discount_rate.filter(|x| *x > 0.0 && *x <= 100.0)
    })
    .map(|(x, source)| {
        debug!(discount_rate = x, source, "observed rate");
        x
    });

    Ok(DiscountRecord::new(price, original_price, observed_rate))
}

fn first<T>(signals: &[Signal], field: impl Fn(&Signal) -> Option<T>) -> Option<(T, &str)> {
    signals
        .iter()
        .find_map(|x| field(x).map(|value| (value, x.source.as_str())))
}

fn positive(x: f64) -> Option<StrictlyPositiveFinite> {
    StrictlyPositiveFinite::new(x).ok()
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Percentage off `original`, rounded to two places; 0 when there is no
/// discount.
pub fn discount_rate(price: f64, original: f64) -> f64 {
    if original <= 0.0 || price >= original {
        return 0.0;
    }
    round2((original - price) / original * 100.0)
}

pub fn savings_amount(price: f64, original: f64) -> f64 {
    (original - price).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_rate() {
        let signal = Signal::new("page").price(8000.0).original_price(10000.0);
        let record = reconcile(&[signal]).unwrap();
        assert_eq!(record.price(), 8000.0);
        assert_eq!(record.original_price(), Some(10000.0));
        assert_eq!(record.discount_rate(), 20.0);
        assert_eq!(record.discount_amount(), 2000.0);
        assert!(record.is_discounted());
        assert_eq!(record.observed_rate(), None);
        assert_eq!(record.derived_rate(), Some(20.0));
    }

    #[test]
    fn observed_rate_wins() {
        let record = reconcile(&[Signal::new("page")
            .price(8000.0)
            .original_price(10000.0)
            .discount_rate(15.0)])
        .unwrap();
        assert_eq!(record.discount_rate(), 15.0);
        assert_eq!(record.observed_rate(), Some(15.0));
        assert_eq!(record.derived_rate(), Some(20.0));
        assert!(record.rate_conflict());
        assert_eq!(record.discount_amount(), 2000.0);
    }

    #[test]
    fn no_discount_when_original_is_lower() {
        let signal = Signal::new("page").price(10000.0).original_price(9000.0);
        let record = reconcile(&[signal]).unwrap();
        assert_eq!(record.discount_rate(), 0.0);
        assert!(!record.is_discounted());
        assert_eq!(record.discount_amount(), 0.0);
        assert_eq!(record.derived_rate(), None);
    }

    #[test]
    fn observed_rate_without_original_is_kept_aside() {
        let record = reconcile(&[Signal::new("page").price(10000.0).discount_rate(30.0)]).unwrap();
        assert_eq!(record.discount_rate(), 0.0);
        assert!(!record.is_discounted());
        assert_eq!(record.observed_rate(), Some(30.0));
        assert!(!record.rate_conflict());
    }

    #[test]
    fn fails_without_price() {
        assert_eq!(
            reconcile(&[
                Signal::new("sale").price(0.0),
                Signal::new("list").original_price(5000.0),
            ]),
            Err(ExtractionError { attempts: 2 })
        );
        assert!(reconcile(&[]).is_err());
        assert!(reconcile(&[Signal::new("bad").price(f64::NAN)]).is_err());
        assert!(reconcile(&[Signal::new("bad").price(-100.0)]).is_err());
    }

    #[test]
    fn idempotent() {
        let signals = [
            Signal::new("smartstore").price(7900.0).discount_rate(21.0),
            Signal::new("config").price(8500.0).original_price(10000.0),
        ];
        assert_eq!(reconcile(&signals), reconcile(&signals));
    }

    #[test]
    fn fields_merge_independently() {
        let signals = [
            Signal::new("smartstore").price(7900.0),
            Signal::new("config")
                .price(8500.0)
                .original_price(10000.0)
                .discount_rate(15.0),
        ];
        let record = reconcile(&signals).unwrap();
        assert_eq!(record.price(), 7900.0);
        assert_eq!(record.original_price(), Some(10000.0));
        assert_eq!(record.discount_rate(), 15.0);
        assert_eq!(record.derived_rate(), Some(21.0));
    }

    #[test]
    fn zero_means_absent() {
        let signals = [
            Signal::new("smartstore")
                .price(0.0)
                .original_price(0.0)
                .discount_rate(0.0),
            Signal::new("config")
                .price(12000.0)
                .original_price(15000.0)
                .discount_rate(150.0),
        ];
        let record = reconcile(&signals).unwrap();
        assert_eq!(record.price(), 12000.0);
        assert_eq!(record.original_price(), Some(15000.0));
        // 150% is not a rate; fall back to the derived one
        assert_eq!(record.observed_rate(), None);
        assert_eq!(record.discount_rate(), 20.0);
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(discount_rate(6666.0, 10000.0), 33.34);
        assert_eq!(discount_rate(2.0, 3.0), 33.33);
        assert_eq!(discount_rate(100.0, 0.0), 0.0);
        assert_eq!(discount_rate(100.0, 100.0), 0.0);
    }

    #[test]
    fn deal_helpers() {
        assert_eq!(savings_amount(8000.0, 10000.0), 2000.0);
        assert_eq!(savings_amount(12000.0, 10000.0), 0.0);

        let record = reconcile(&[Signal::new("x").price(8000.0).original_price(10000.0)]).unwrap();
        assert!(record.is_good_deal(GOOD_DEAL_THRESHOLD));
        let record = reconcile(&[Signal::new("x").price(8500.0).original_price(10000.0)]).unwrap();
        assert!(!record.is_good_deal(GOOD_DEAL_THRESHOLD));
    }
}
