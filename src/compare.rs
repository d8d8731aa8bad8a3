//! Cross-source price comparison.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::reconcile::{round2, DiscountRecord};

/// Records keyed by source id, in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct Comparison {
    entries: Vec<(String, DiscountRecord)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked {
    pub source: String,
    #[serde(flatten)]
    pub record: DiscountRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub best_price: Option<Ranked>,
    pub highest_discount: Option<Ranked>,
    pub platforms: BTreeMap<String, DiscountRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Saving {
    pub price: f64,
    pub savings: f64,
    pub savings_percentage: f64,
    pub is_better: bool,
}

impl Comparison {
    /// Insert, or overwrite in place if `source` is already present.
    pub fn add(&mut self, source: impl Into<String>, record: DiscountRecord) {
        let source = source.into();
        match self.entries.iter_mut().find(|(x, _)| *x == source) {
            Some(entry) => entry.1 = record,
            None => self.entries.push((source, record)),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &DiscountRecord)> {
        self.entries.iter().map(|(source, record)| (source.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ties go to the source added first.
    pub fn summarize(&self) -> ComparisonSummary {
        let best_price = self.pick(|candidate, best| candidate.price() < best.price());
        let highest_discount =
            self.pick(|candidate, best| candidate.discount_rate() > best.discount_rate());

        ComparisonSummary {
            total: self.entries.len(),
            best_price,
            highest_discount,
            platforms: self
                .entries
                .iter()
                .map(|(source, record)| (source.clone(), *record))
                .collect(),
        }
    }

    fn pick(&self, beats: impl Fn(&DiscountRecord, &DiscountRecord) -> bool) -> Option<Ranked> {
        let mut best: Option<&(String, DiscountRecord)> = None;
        for entry in &self.entries {
            match best {
                Some((_, record)) if !beats(&entry.1, record) => {}
                _ => best = Some(entry),
            }
        }
        best.map(|(source, record)| Ranked {
            source: source.clone(),
            record: *record,
        })
    }

    /// What each source saves against `target`.
    pub fn savings(&self, target: f64) -> BTreeMap<String, Saving> {
        self.records()
            .map(|(source, record)| {
                let savings = target - record.price();
                let savings_percentage = if target > 0.0 {
                    round2(savings / target * 100.0)
                } else {
                    0.0
                };
                let saving = Saving {
                    price: record.price(),
                    savings,
                    savings_percentage,
                    is_better: savings > 0.0,
                };
                (source.to_string(), saving)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{reconcile, Signal};

    fn record(price: f64, original: Option<f64>) -> DiscountRecord {
        let mut signal = Signal::new("test").price(price);
        if let Some(x) = original {
            signal = signal.original_price(x);
        }
        reconcile(&[signal]).unwrap()
    }

    #[test]
    fn empty_summary() {
        let summary = Comparison::default().summarize();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.best_price, None);
        assert_eq!(summary.highest_discount, None);
        assert!(summary.platforms.is_empty());
    }

    #[test]
    fn rankings() {
        let mut comparison = Comparison::default();
        comparison.add("elevenst", record(9000.0, Some(10000.0)));
        comparison.add("gmarket", record(8500.0, None));
        comparison.add("naver_smartstore", record(12000.0, Some(20000.0)));

        let summary = comparison.summarize();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.best_price.unwrap().source, "gmarket");
        let highest = summary.highest_discount.unwrap();
        assert_eq!(highest.source, "naver_smartstore");
        assert_eq!(highest.record.discount_rate(), 40.0);
        assert_eq!(summary.platforms.len(), 3);
    }

    #[test]
    fn ties_go_to_first_added() {
        let mut comparison = Comparison::default();
        comparison.add("a", record(8000.0, Some(10000.0)));
        comparison.add("b", record(8000.0, Some(10000.0)));

        let summary = comparison.summarize();
        assert_eq!(summary.best_price.unwrap().source, "a");
        assert_eq!(summary.highest_discount.unwrap().source, "a");
    }

    #[test]
    fn no_discounts_anywhere() {
        let mut comparison = Comparison::default();
        comparison.add("a", record(5000.0, None));
        comparison.add("b", record(4000.0, None));

        let summary = comparison.summarize();
        assert_eq!(summary.best_price.unwrap().source, "b");
        assert_eq!(summary.highest_discount.unwrap().source, "a");
    }

    #[test]
    fn replace_keeps_position() {
        let mut comparison = Comparison::default();
        comparison.add("a", record(5000.0, None));
        comparison.add("b", record(5000.0, None));
        comparison.add("a", record(6000.0, None));

        assert_eq!(comparison.len(), 2);
        let entries: Vec<_> = comparison.records().map(|(x, r)| (x, r.price())).collect();
        assert_eq!(entries, [("a", 6000.0), ("b", 5000.0)]);
        // "b" is now the cheapest
        assert_eq!(comparison.summarize().best_price.unwrap().source, "b");
    }

    #[test]
    fn savings_against_target() {
        let mut comparison = Comparison::default();
        comparison.add("cheap", record(7500.0, None));
        comparison.add("pricey", record(11000.0, None));

        let savings = comparison.savings(10000.0);
        assert_eq!(savings["cheap"].savings, 2500.0);
        assert_eq!(savings["cheap"].savings_percentage, 25.0);
        assert!(savings["cheap"].is_better);
        assert_eq!(savings["pricey"].savings, -1000.0);
        assert_eq!(savings["pricey"].savings_percentage, -10.0);
        assert!(!savings["pricey"].is_better);

        assert_eq!(comparison.savings(0.0)["cheap"].savings_percentage, 0.0);
    }
}
