use serde::Serialize;

use crate::controller::ViewModel;
use crate::error::{Error, Result};
use crate::provider::{NewsItem, RiskProfile};

fn print_pretty<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Parse(format!("JSON serialize: {}", e)))?;
    println!("{}", output);
    Ok(())
}

/// Print the full view-model as formatted JSON to stdout.
pub fn print_view_model_json(view: &ViewModel) -> Result<()> {
    print_pretty(view)
}

/// Print a risk profile as formatted JSON to stdout.
pub fn print_risk_json(profile: &RiskProfile) -> Result<()> {
    print_pretty(profile)
}

/// Print news items as formatted JSON to stdout.
pub fn print_news_json(items: &[NewsItem]) -> Result<()> {
    print_pretty(items)
}
