use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::controller::ViewModel;
use crate::domain::Provenance;
use crate::output::chart;
use crate::provider::{NewsItem, RiskProfile};

#[derive(Tabled)]
struct IndexRow {
    #[tabled(rename = "Index")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Change %")]
    percent: String,
}

/// Print the reference-index panel as a styled table to stdout.
pub fn print_index_table(view: &ViewModel) {
    if view.indices.is_empty() {
        println!("{}", "Market indices unavailable".dimmed());
        return;
    }

    let rows: Vec<IndexRow> = view
        .indices
        .iter()
        .map(|index| IndexRow {
            name: index.name.clone().bold().to_string(),
            value: format_with_commas(index.value, 2),
            change: colored_delta(
                index.absolute_change,
                format!(
                    "{} {:.2}",
                    arrow(index.absolute_change),
                    index.absolute_change.abs()
                ),
            ),
            percent: colored_delta(
                index.absolute_change,
                format!("({:.2}%)", index.percent_change.abs()),
            ),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    if view.indices_provenance == Some(Provenance::Fallback) {
        println!("{}", "(stale) live index data unavailable, showing last known values".dimmed());
    }
}

/// Print the selected instrument's header, change line and charts.
pub fn print_series_view(view: &ViewModel) {
    let instrument = &view.selected_instrument;
    println!(
        "{} {}  [{}]",
        instrument.symbol.bold(),
        instrument.display_name,
        view.selected_range
    );

    if let Some(message) = &view.series_error {
        println!("{}", message.red());
        return;
    }

    if view.series.is_empty() {
        println!("{}", "No data available".dimmed());
        return;
    }

    let change_line = colored_delta(
        view.price_change,
        format!(
            "{} ${:.2} ({:.2}%)",
            arrow(view.price_change),
            view.price_change.abs(),
            view.percent_change
        ),
    );
    println!("${:.2}  {}", view.latest_price, change_line);

    if let (Some(first), Some(last)) = (view.series.first(), view.series.last()) {
        println!("{} .. {}", first.long_label, last.long_label);
    }

    println!(
        "{}",
        chart::render_price_chart(&instrument.symbol, &view.series, 96, 18)
    );
    println!(
        "{}",
        chart::render_volume_chart(&instrument.symbol, &view.series, 96, 12)
    );
}

/// Print a risk profile and its suggested alternatives to stdout.
pub fn print_risk(profile: &RiskProfile) {
    let level = match profile.risk_level.as_str() {
        "Very High" | "High" => profile.risk_level.red().bold(),
        "Moderate" => profile.risk_level.yellow().bold(),
        _ => profile.risk_level.green().bold(),
    };

    println!("{} Risk Profile", profile.ticker.bold());
    println!("Risk Level: {}  Score (1-100): {:.1}", level, profile.risk_score);
    println!(
        "Price: {}  Volatility: {:.2}%  Beta: {}",
        optional_money(profile.price),
        profile.volatility * 100.0,
        optional_fixed(profile.beta)
    );
    println!("Salary: ${}", format_with_commas(profile.user_salary, 0));
    println!("{}", profile.suggestion_message);

    if profile.suggested_stocks.is_empty() {
        println!("{}", "No alternative suggestions available at this time.".dimmed());
        return;
    }

    for stock in &profile.suggested_stocks {
        println!(
            "  {} ({}) - Price: {} (Beta: {})",
            stock.ticker.bold(),
            stock.name.as_deref().unwrap_or("-"),
            optional_money(stock.price),
            optional_fixed(stock.beta)
        );
    }
}

#[derive(Tabled)]
struct NewsRow {
    #[tabled(rename = "Headline")]
    headline: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Sentiment")]
    sentiment: String,
    #[tabled(rename = "Published")]
    timestamp: String,
}

/// Print news headlines as a styled table to stdout.
pub fn print_news_table(items: &[NewsItem]) {
    if items.is_empty() {
        println!("{}", "No news available at this time.".dimmed());
        return;
    }

    let rows: Vec<NewsRow> = items
        .iter()
        .map(|item| NewsRow {
            headline: item.headline.clone().unwrap_or_else(|| "-".to_string()),
            source: item
                .source
                .clone()
                .unwrap_or_else(|| "Unknown".to_string())
                .dimmed()
                .to_string(),
            sentiment: match item.sentiment.as_str() {
                "Positive" => item.sentiment.green().to_string(),
                "Negative" => item.sentiment.red().to_string(),
                _ => item.sentiment.clone(),
            },
            timestamp: item.timestamp.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

fn arrow(delta: f64) -> &'static str {
    if delta >= 0.0 { "↑" } else { "↓" }
}

fn colored_delta(delta: f64, text: String) -> String {
    if delta >= 0.0 {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

fn optional_money(value: Option<f64>) -> String {
    value
        .map(|v| format!("${v:.2}"))
        .unwrap_or_else(|| "N/A".to_string())
}

fn optional_fixed(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "N/A".to_string())
}

fn format_with_commas(value: f64, decimals: usize) -> String {
    let formatted = format!("{value:.decimals$}");
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let mut parts = unsigned.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();

    let mut grouped = String::new();
    for (i, ch) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let whole_formatted: String = grouped.chars().rev().collect();

    match fraction {
        Some(fraction) => format!("{sign}{whole_formatted}.{fraction}"),
        None => format!("{sign}{whole_formatted}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_with_commas_groups_thousands() {
        assert_eq!(format_with_commas(43870.35, 2), "43,870.35");
        assert_eq!(format_with_commas(999.5, 2), "999.50");
        assert_eq!(format_with_commas(85000.0, 0), "85,000");
        assert_eq!(format_with_commas(-1234567.891, 2), "-1,234,567.89");
    }

    #[test]
    fn optional_values_render_placeholder() {
        assert_eq!(optional_money(None), "N/A");
        assert_eq!(optional_money(Some(61.234)), "$61.23");
        assert_eq!(optional_fixed(Some(0.6)), "0.60");
    }

    #[test]
    fn arrow_follows_sign() {
        assert_eq!(arrow(0.0), "↑");
        assert_eq!(arrow(-0.01), "↓");
    }
}
