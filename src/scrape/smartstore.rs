use _model::Platform;

use crate::config::Selectors;

// final (discounted) price before any plain price block
const PRICE: &[&str] = &[
    "#finalDscPrcArea .price strong .value",
    ".price_area .sale_price strong",
    ".price_area .final_price strong",
    ".price_area .price strong",
    ".price strong .value",
];

const ORIGINAL_PRICE: &[&str] = &[
    ".price_area .original_price_area .price",
    ".price_area .list_price",
    ".price_area .before_price",
    ".price_area .strike_price",
    ".original_price strong",
];

const DISCOUNT_RATE: &[&str] = &[
    ".price_area .discount_rate_area .rate",
    ".price_area .sale_rate_area .rate",
    ".price_area .discount_rate",
    ".price_area .sale_rate",
    ".discount_rate",
];

/// Built-in selectors tried ahead of the platform config.
pub fn selectors(platform: Platform) -> Option<Selectors> {
    if platform != Platform::NaverSmartstore {
        return None;
    }

    Some(Selectors {
        price: list(PRICE),
        original_price: list(ORIGINAL_PRICE),
        discount_rate: list(DISCOUNT_RATE),
        ..Default::default()
    })
}

fn list(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|x| x.to_string()).collect()
}
