use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::symbols;
use ratatui::text::Line;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget};

use crate::domain::DisplayPoint;

const MIN_WIDTH: u16 = 48;
const MIN_HEIGHT: u16 = 12;

/// Render a static terminal chart of the series' prices.
pub fn render_price_chart(symbol: &str, series: &[DisplayPoint], width: u16, height: u16) -> String {
    render_series(
        &format!("{symbol} Price"),
        "USD",
        series,
        |p| p.price,
        format_price_label,
        width,
        height,
    )
}

/// Render a static terminal chart of the series' traded volume.
pub fn render_volume_chart(symbol: &str, series: &[DisplayPoint], width: u16, height: u16) -> String {
    render_series(
        &format!("{symbol} Trading Volume"),
        "Shares",
        series,
        |p| p.volume as f64,
        format_volume_label,
        width,
        height,
    )
}

fn render_series(
    title: &str,
    y_title: &str,
    series: &[DisplayPoint],
    value: impl Fn(&DisplayPoint) -> f64,
    label: fn(f64) -> String,
    width: u16,
    height: u16,
) -> String {
    if series.is_empty() {
        return String::new();
    }

    let area = Rect::new(0, 0, width.max(MIN_WIDTH), height.max(MIN_HEIGHT));
    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(idx, p)| (idx as f64, value(p)))
        .collect();

    let x_max = points.len().saturating_sub(1) as f64;
    let (y_min, y_max) = y_bounds(&points);

    let first_label = series.first().map(|p| p.short_label.clone()).unwrap_or_default();
    let last_label = series.last().map(|p| p.short_label.clone()).unwrap_or_default();

    let dataset = Dataset::default()
        .graph_type(GraphType::Line)
        .marker(symbols::Marker::Braille)
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max.max(1.0)])
                .labels(vec![Line::from(first_label), Line::from(last_label)]),
        )
        .y_axis(
            Axis::default()
                .title(Line::from(y_title.to_string()))
                .bounds([y_min, y_max])
                .labels(vec![Line::from(label(y_min)), Line::from(label(y_max))]),
        );

    let mut buffer = Buffer::empty(area);
    chart.render(area, &mut buffer);
    buffer_to_string(&buffer, area)
}

fn y_bounds(points: &[(f64, f64)]) -> (f64, f64) {
    let min = points.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let max = points
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::NEG_INFINITY, f64::max);

    let span = max - min;
    if span <= f64::EPSILON {
        let padding = if max.abs() <= 1.0 {
            1.0
        } else {
            (max.abs() * 0.01).max(1.0)
        };
        (min - padding, max + padding)
    } else {
        let padding = span * 0.08;
        (min - padding, max + padding)
    }
}

fn format_price_label(value: f64) -> String {
    format!("${value:.2}")
}

fn format_volume_label(value: f64) -> String {
    format!("{:.2}M", value.max(0.0) / 1_000_000.0)
}

fn buffer_to_string(buffer: &Buffer, area: Rect) -> String {
    let mut lines = Vec::with_capacity(area.height as usize);
    for y in area.y..area.y + area.height {
        let mut line = String::new();
        for x in area.x..area.x + area.width {
            line.push_str(buffer[(x, y)].symbol());
        }

        while line.ends_with(' ') {
            line.pop();
        }

        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawPoint;
    use crate::series::normalize;

    fn sample_series() -> Vec<DisplayPoint> {
        normalize(&[
            RawPoint::new(1_700_000_000, 189.5, 51_000_000.0),
            RawPoint::new(1_700_086_400, 191.25, 48_500_000.0),
            RawPoint::new(1_700_172_800, 190.1, 50_200_000.0),
        ])
    }

    #[test]
    fn price_chart_outputs_box_with_title() {
        let rendered = render_price_chart("AAPL", &sample_series(), 60, 14);
        assert!(!rendered.is_empty());
        assert!(rendered.lines().count() >= 10);
        assert!(rendered.contains("AAPL Price"));
    }

    #[test]
    fn volume_chart_outputs_box_with_title() {
        let rendered = render_volume_chart("AAPL", &sample_series(), 60, 14);
        assert!(rendered.contains("AAPL Trading Volume"));
    }

    #[test]
    fn axis_labels_are_compact() {
        assert_eq!(format_volume_label(48_500_000.0), "48.50M");
        assert_eq!(format_price_label(6052.85), "$6052.85");
        assert_eq!(format_price_label(189.5), "$189.50");
    }

    #[test]
    fn empty_series_renders_nothing() {
        assert!(render_price_chart("AAPL", &[], 60, 14).is_empty());
    }

    #[test]
    fn flat_series_gets_padding() {
        let (lo, hi) = y_bounds(&[(0.0, 100.0), (1.0, 100.0)]);
        assert!(lo < 100.0 && hi > 100.0);
    }
}
