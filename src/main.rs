mod analyzer;
mod api;
mod cache;
mod catalog;
mod config;
mod imaging;
mod model;
mod storage;

use analyzer::time_patterns::DAY_NAMES;
use analyzer::{SimilarityGrouper, StatisticalAnalyzer, TimePatternAnalyzer};
use api::{AnalyticsClient, Fetched, HttpTransport};
use cache::{SystemClock, TtlCache};
use catalog::LogoCatalog;
use config::{AppConfig, load_config};
use imaging::ImageRasterizer;
use model::{BrandAnalytics, ConfidenceLevel, PricePoint};
use storage::SqliteLogoStore;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => print_usage(),
        Some("logos") => run_logos(&config, &args[1..]).await,
        Some("monthly") => run_monthly_report(&config).await,
        Some(query) => run_brand_report(&config, query).await,
    }
}

fn print_usage() {
    println!("usage: brandscope <brand query>");
    println!("       brandscope monthly");
    println!("       brandscope logos add <brand> <code> <file>");
    println!("       brandscope logos list");
    println!("       brandscope logos delete <id>");
    println!("       brandscope logos clear");
    println!("       brandscope logos find <file>");
}

fn build_client(config: &AppConfig) -> Option<AnalyticsClient> {
    let transport = match HttpTransport::new() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to build HTTP transport: {}", e);
            return None;
        }
    };
    let cache = TtlCache::new(Box::new(SystemClock));
    Some(AnalyticsClient::new(Box::new(transport), cache, config))
}

async fn run_brand_report(config: &AppConfig, query: &str) {
    let Some(mut client) = build_client(config) else {
        return;
    };

    info!("Searching brands for '{}'...", query);
    let brands = match client.search_brands(query).await {
        Fetched::Fresh(b) | Fetched::Cached(b) => b,
        Fetched::Unavailable { reason } => {
            error!("Brand search unavailable: {}", reason);
            return;
        }
    };

    let Some(brand) = brands.first() else {
        println!("no brand matched '{query}'");
        return;
    };
    println!(
        "brand: {} ({}){}",
        brand.brand_name_ja,
        brand.code,
        brand
            .brand_name_en
            .as_deref()
            .map(|en| format!(" / {en}"))
            .unwrap_or_default()
    );

    info!("Fetching analytics for {}...", brand.code);
    let analytics = match client.get_brand_analytics(&brand.code).await {
        Fetched::Fresh(a) => a,
        Fetched::Cached(a) => {
            info!("Serving analytics from cache.");
            a
        }
        Fetched::Unavailable { reason } => {
            warn!("Analytics unavailable ({}), showing empty report.", reason);
            BrandAnalytics::default_report()
        }
    };

    print_report(config, &analytics);
}

fn print_report(config: &AppConfig, analytics: &BrandAnalytics) {
    let samples: Vec<PricePoint> = analytics
        .categories
        .iter()
        .flat_map(|c| c.speed_price_data.iter().cloned())
        .collect();
    let prices: Vec<f64> = samples.iter().map(|s| s.price).collect();

    println!(
        "samples: {} across {} categories (backend total: {})",
        samples.len(),
        analytics.categories.len(),
        analytics.total_data_count
    );

    if prices.is_empty() {
        println!("no sold-price samples; skipping local analytics");
        return;
    }

    let distribution = StatisticalAnalyzer::analyze_distribution(&prices);
    println!(
        "price distribution: mean {:.0}, std-dev {:.0}, {} outliers",
        distribution.mean,
        distribution.std_dev,
        distribution.outliers.len()
    );
    for band in &distribution.bands {
        let count = prices
            .iter()
            .filter(|p| **p >= band.lower && **p < band.upper)
            .count();
        println!("  {:>9}: {:>7.0} .. {:>7.0}  ({count})", band.label, band.lower, band.upper);
    }

    let reliability = StatisticalAnalyzer::score_reliability(&samples);
    let level = match reliability.confidence {
        ConfidenceLevel::High => "high",
        ConfidenceLevel::Medium => "medium",
        ConfidenceLevel::Low => "low",
    };
    println!("reliability: {}/100 ({level})", reliability.score);
    for warning in &reliability.warnings {
        println!("  note: {warning}");
    }

    let groups = SimilarityGrouper::group_similar_products(&samples);
    println!("similar-product groups: {}", groups.len());
    for group in groups.iter().take(5) {
        println!(
            "  {} x{} (avg {:.0})",
            group.base_name,
            group.members.len(),
            group.avg_price
        );
    }

    let sold_times: Vec<String> = analytics
        .monthly_stats
        .iter()
        .flat_map(|m| m.sold_times.iter().cloned())
        .collect();
    if !sold_times.is_empty() {
        print_time_pattern(config, &sold_times);
    }

    if !analytics.price_range_analysis.is_empty() {
        let mut ranges: Vec<_> = analytics.price_range_analysis.iter().collect();
        ranges.sort_by(|a, b| a.0.cmp(b.0));
        println!("sell-through by price range:");
        for (range, stats) in ranges {
            println!("  {:>12}: {} sold, {:.1}d avg", range, stats.count, stats.avg_days);
        }
    }

    if analytics.image_analysis.with_image.count > 0 {
        println!(
            "image impact: with {:.0} avg / {:.1}d, without {:.0} avg / {:.1}d",
            analytics.image_analysis.with_image.avg_price,
            analytics.image_analysis.with_image.avg_days,
            analytics.image_analysis.without_image.avg_price,
            analytics.image_analysis.without_image.avg_days,
        );
    }
}

fn print_time_pattern(config: &AppConfig, sold_times: &[String]) {
    let analyzer = TimePatternAnalyzer::new(config.display_utc_offset_hours);
    let pattern = analyzer.analyze(sold_times);
    println!(
        "sale-time pattern (UTC{:+}): {} timestamps, {} skipped",
        config.display_utc_offset_hours, pattern.parsed, pattern.skipped
    );
    for (i, day) in DAY_NAMES.iter().enumerate() {
        println!("  {:>9}: {}", day, pattern.day_of_week[i]);
    }
    if let Some(peak) = (0..24).max_by_key(|h| pattern.hour_of_day[*h]) {
        println!("  peak hour: {:02}:00 ({} sales)", peak, pattern.hour_of_day[peak]);
    }
}

async fn run_monthly_report(config: &AppConfig) {
    let Some(mut client) = build_client(config) else {
        return;
    };

    info!("Fetching monthly analytics...");
    let months = match client.get_monthly_analytics().await {
        Fetched::Fresh(m) | Fetched::Cached(m) => m,
        Fetched::Unavailable { reason } => {
            error!("Monthly analytics unavailable: {}", reason);
            return;
        }
    };

    for month in &months {
        println!(
            "month {:>2}: {} items, avg {:.0}",
            month.month, month.item_count, month.average_price
        );
    }

    let sold_times: Vec<String> = months
        .iter()
        .flat_map(|m| m.sold_times.iter().cloned())
        .collect();
    if !sold_times.is_empty() {
        print_time_pattern(config, &sold_times);
    }
}

async fn run_logos(config: &AppConfig, args: &[String]) {
    let store = match SqliteLogoStore::new(&config.logo_db_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open logo store: {:?}", e);
            return;
        }
    };
    let catalog = LogoCatalog::new(Box::new(store), config.logo_match_threshold);

    match args {
        [cmd, brand, code, file] if cmd == "add" => match catalog.upload(brand, code, file) {
            Ok(record) => println!("stored logo {} for {}", record.id, record.brand_name),
            Err(e) => error!("Upload failed: {}", e),
        },
        [cmd] if cmd == "list" => match catalog.list() {
            Ok(records) => {
                for r in records {
                    println!("{}  {} ({})  {}", r.id, r.brand_name, r.brand_code, r.upload_date);
                }
            }
            Err(e) => error!("List failed: {}", e),
        },
        [cmd, id] if cmd == "delete" => match catalog.delete(id) {
            Ok(()) => println!("deleted {id}"),
            Err(e) => error!("Delete failed: {}", e),
        },
        [cmd] if cmd == "clear" => match catalog.clear() {
            Ok(()) => println!("logo catalog cleared"),
            Err(e) => error!("Clear failed: {}", e),
        },
        [cmd, file] if cmd == "find" => {
            let rasterizer = ImageRasterizer::new();
            match catalog.search_by_image(&rasterizer, file).await {
                Ok(matches) if matches.is_empty() => println!("no logo above threshold"),
                Ok(matches) => {
                    for m in matches {
                        println!("{:>6.1}  {} ({})", m.score, m.record.brand_name, m.record.id);
                    }
                }
                Err(e) => error!("Visual search failed: {}", e),
            }
        }
        _ => print_usage(),
    }
}
