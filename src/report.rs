use std::{
    collections::BTreeMap,
    fs::{create_dir_all, write, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    compare::ComparisonSummary,
    listing::Listing,
    reconcile::GOOD_DEAL_THRESHOLD,
    scrape::{CompareRun, Failure},
    search::monitor::MonitorReport,
    utils::won,
};

pub const COMPARISON_JSON: &str = "price_comparison.json";
pub const COMPARISON_CSV: &str = "price_comparison.csv";

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    write(path, output).with_context(|| format!("Failed to write {}", path.display()))
}

/// Excel only reads Korean text in a CSV as UTF-8 when it starts with a BOM.
fn csv_writer(path: &Path) -> Result<csv::Writer<File>> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(b"\xEF\xBB\xBF")?;
    Ok(csv::Writer::from_writer(file))
}

fn optional(x: Option<f64>) -> String {
    x.map(|x| x.to_string()).unwrap_or_default()
}

/// Writes `monitoring_results_<stamp>.json` and, when anything was found,
/// `reseller_data_<stamp>.csv`.
pub fn write_monitoring(
    report: &MonitorReport,
    dir: &Path,
    now: DateTime<Local>,
) -> Result<(PathBuf, Option<PathBuf>)> {
    create_dir_all(dir)?;
    let stamp = now.format("%Y%m%d_%H%M%S");

    let json_path = dir.join(format!("monitoring_results_{stamp}.json"));
    write_json(&json_path, report)?;

    if report.total_resellers == 0 {
        return Ok((json_path, None));
    }

    let csv_path = dir.join(format!("reseller_data_{stamp}.csv"));
    let mut wtr = csv_writer(&csv_path)?;
    wtr.write_record([
        "product_name",
        "title",
        "price",
        "original_price",
        "discount_rate",
        "discount_amount",
        "mall_name",
        "seller_label",
        "product_link",
        "image_url",
        "search_timestamp",
    ])?;
    for product in &report.products {
        for x in &product.results {
            wtr.write_record([
                product.product_name.clone(),
                x.title.clone(),
                x.record.price().to_string(),
                optional(x.record.original_price()),
                x.record.discount_rate().to_string(),
                x.record.discount_amount().to_string(),
                x.source.clone(),
                x.seller_label.map(|x| x.to_string()).unwrap_or_default(),
                x.url.clone(),
                x.image.clone().unwrap_or_default(),
                x.timestamp.to_rfc3339(),
            ])?;
        }
    }
    wtr.flush()?;

    Ok((json_path, Some(csv_path)))
}

#[derive(Serialize)]
struct ComparisonFile<'a> {
    #[serde(flatten)]
    summary: &'a ComparisonSummary,
    listings: &'a BTreeMap<String, Listing>,
    failures: &'a [Failure],
}

pub fn write_comparison(run: &CompareRun, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    create_dir_all(dir)?;

    let json_path = dir.join(COMPARISON_JSON);
    write_json(
        &json_path,
        &ComparisonFile {
            summary: &run.comparison.summarize(),
            listings: &run.listings,
            failures: &run.failures,
        },
    )?;

    let csv_path = dir.join(COMPARISON_CSV);
    let mut wtr = csv_writer(&csv_path)?;
    wtr.write_record([
        "Platform",
        "Price",
        "Discount Rate",
        "Original Price",
        "Stock",
        "URL",
    ])?;
    for (source, record) in run.comparison.records() {
        let listing = run.listings.get(source);
        wtr.write_record([
            source.to_string(),
            record.price().to_string(),
            record.discount_rate().to_string(),
            optional(record.original_price()),
            listing.map(|x| x.stock).unwrap_or(0).to_string(),
            listing.map(|x| x.url.clone()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;

    Ok((json_path, csv_path))
}

pub fn print_monitoring(report: &MonitorReport) {
    println!("Products monitored: {}", report.total_products);
    println!("Listings found: {}", report.total_resellers);

    for product in &report.products {
        println!();
        println!(
            "{} (list price {})",
            product.product_name,
            won(product.original_price)
        );
        if let Some(err) = &product.error {
            println!("  error: {err}");
            continue;
        }

        let labels = product
            .labels
            .iter()
            .map(|(label, count)| format!("{label} {count}"))
            .join(", ");
        println!("  listings: {} [{labels}]", product.reseller_count);
        if !product.failed_items.is_empty() {
            println!("  without a price: {}", product.failed_items.len());
        }
        if let Some(x) = product.lowest() {
            println!(
                "  lowest: {} ({:.1}% off) - {}",
                won(x.record.price()),
                x.record.discount_rate(),
                x.source
            );
        }
    }
}

pub fn print_comparison(run: &CompareRun, target: Option<f64>) {
    for (source, record) in run.comparison.records() {
        println!("{source}");
        if let Some(listing) = run.listings.get(source) {
            println!("  {}", listing.title);
            if let Some(label) = listing.seller_label {
                println!(
                    "  seller: {} ({label})",
                    listing.seller.as_deref().unwrap_or_default()
                );
            }
        }
        println!("  price: {}", won(record.price()));
        if let Some(x) = record.original_price() {
            println!("  original: {}", won(x));
        }
        if record.is_good_deal(GOOD_DEAL_THRESHOLD) {
            println!("  discount: {}% (good deal)", record.discount_rate());
        } else {
            println!("  discount: {}%", record.discount_rate());
        }
        if record.rate_conflict() {
            println!(
                "  note: page shows {}%, prices give {}%",
                record.observed_rate().unwrap_or_default(),
                record.derived_rate().unwrap_or_default()
            );
        }
        if let Some(listing) = run.listings.get(source) {
            if let (Some(price), Some(rate)) =
                (listing.max_discount_price, listing.max_discount_rate)
            {
                println!("  max discount: {} ({rate}%)", won(price));
            }
            println!("  stock: {}", listing.stock);
        }
    }

    let summary = run.comparison.summarize();
    if let Some(x) = summary.best_price {
        println!("\nBest price: {} at {}", won(x.record.price()), x.source);
    }
    if let Some(x) = summary.highest_discount {
        println!(
            "Highest discount: {}% at {}",
            x.record.discount_rate(),
            x.source
        );
    }
    if let Some(target) = target {
        println!("\nAgainst {}:", won(target));
        for (source, x) in run.comparison.savings(target) {
            let verdict = if x.is_better { "cheaper" } else { "not cheaper" };
            println!(
                "  {source}: {} ({}%) {verdict}",
                won(x.savings),
                x.savings_percentage
            );
        }
    }
    for failure in &run.failures {
        println!("Failed: {} ({})", failure.url, failure.error);
    }
}

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use chrono::TimeZone;

    use super::*;
    use crate::{
        config::{MonitoringSettings, TargetProduct},
        reconcile::{reconcile, Signal},
        search::{monitor, SearchItem},
    };

    fn listing(source: &str, price: f64, original: f64) -> Listing {
        let signal = Signal::new("test").price(price).original_price(original);
        let record = reconcile(&[signal]).unwrap();
        let url = format!("https://{source}/1");
        let mut listing = Listing::new(source, "Cleansing foam", url, record);
        listing.stock = 3;
        listing
    }

    #[test]
    fn comparison_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut run = CompareRun::default();
        for x in [listing("gmarket", 9000.0, 12000.0), listing("elevenst", 9500.0, 0.01)] {
            run.comparison.add(x.source.clone(), x.record);
            run.listings.insert(x.source.clone(), x);
        }
        run.failures.push(Failure {
            url: "https://example.com".to_string(),
            error: "Unsupported platform".to_string(),
        });

        let (json_path, csv_path) = write_comparison(&run, dir.path()).unwrap();
        let json = read_to_string(&json_path).unwrap();
        assert!(json.ends_with("}\n"));
        let json: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(json["total"], 2);
        assert_eq!(json["best_price"]["source"], "gmarket");
        assert_eq!(json["highest_discount"]["discount_rate"], 25.0);
        assert_eq!(json["failures"][0]["error"], "Unsupported platform");

        let csv = read_to_string(csv_path).unwrap();
        let csv = csv.strip_prefix('\u{feff}').unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Platform,Price,Discount Rate,Original Price,Stock,URL");
        assert_eq!(lines[1], "gmarket,9000,25,12000,3,https://gmarket/1");
        assert_eq!(lines[2], "elevenst,9500,0,0.01,3,https://elevenst/1");
    }

    #[test]
    fn monitoring_files() {
        let dir = tempfile::tempdir().unwrap();
        let product = TargetProduct {
            name: "Foam".to_string(),
            keyword: "foam".to_string(),
            original_price: 20000.0,
        };
        let item = SearchItem {
            title: "Foam 150ml".to_string(),
            price: 15000.0,
            mall_name: "foam mall".to_string(),
            brand: String::new(),
            link: "https://shopping.naver.com/1".to_string(),
            image: String::new(),
        };
        let settings = MonitoringSettings::default();
        let product = monitor::evaluate(&product, Ok(vec![item]), &settings, None);
        let report = monitor::summarize(vec![product]);
        let now = Local.with_ymd_and_hms(2025, 6, 2, 9, 30, 5).unwrap();

        let (json_path, csv_path) = write_monitoring(&report, dir.path(), now).unwrap();
        assert!(json_path.ends_with("monitoring_results_20250602_093005.json"));
        let csv_path = csv_path.unwrap();
        assert!(csv_path.ends_with("reseller_data_20250602_093005.csv"));

        let json = read_to_string(json_path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(json["total_resellers"], 1);
        assert_eq!(json["products"][0]["status"], "ok");
        assert_eq!(json["products"][0]["results"][0]["discount_rate"], 25.0);

        let csv = read_to_string(csv_path).unwrap();
        assert!(csv.starts_with("\u{feff}product_name,title,price,"));
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with(
            "Foam,Foam 150ml,15000,20000,25,5000,foam mall,,https://shopping.naver.com/1,,"
        ));
    }

    #[test]
    fn monitoring_without_results_skips_csv() {
        let dir = tempfile::tempdir().unwrap();
        let report = monitor::summarize(Vec::new());
        let (_, csv_path) = write_monitoring(&report, dir.path(), Local::now()).unwrap();
        assert_eq!(csv_path, None);
    }
}
