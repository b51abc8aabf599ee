//! SVG line chart of cumulative returns.
//!
//! One polyline per ticker on a shared date axis, percentage y-axis, and a
//! dashed black baseline at 0%. The markup is self-contained so the web page
//! can inline it without any client-side plotting library.

use crate::returns::ReturnTable;
use chrono::{Datelike, NaiveDate};

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 480.0;
const LEFT: f64 = 64.0;
const RIGHT: f64 = 24.0;
const TOP: f64 = 24.0;
const BOTTOM: f64 = 48.0;
const Y_TICKS: usize = 6;

/// Plotly's default qualitative palette.
const PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Escape text for inclusion in XML/HTML content or attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whole-percent label, e.g. `0.153` → `15%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

/// One-decimal percent label, e.g. `0.153` → `15.3%`.
pub fn format_percent_precise(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn color_for(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Render the return table as an `<svg>` element. Empty tables give an empty string.
pub fn render_returns_chart(table: &ReturnTable) -> String {
    if table.dates.is_empty() || table.tickers.is_empty() {
        return String::new();
    }

    let (min_v, max_v) = extent(table);
    let xs = x_positions(table.dates.len());
    let y_of = |v: f64| scale(v, min_v, max_v);

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" class="returns-chart" role="img"><style>text{{font-family:Arial,sans-serif;font-size:11px;fill:#444}}</style>"#
    );

    for tick in nice_ticks(min_v, max_v, Y_TICKS) {
        let y = y_of(tick);
        svg.push_str(&format!(
            r##"<line x1="{LEFT:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#eeeeee" stroke-width="1" /><text x="{tx:.2}" y="{ty:.2}" text-anchor="end">{label}</text>"##,
            x2 = WIDTH - RIGHT,
            tx = LEFT - 6.0,
            ty = y + 4.0,
            label = format_percent(tick),
        ));
    }

    time_axis(&mut svg, &table.dates, &xs);

    for (i, (ticker, column)) in table.tickers.iter().zip(&table.columns).enumerate() {
        let points = xs
            .iter()
            .zip(column)
            .filter(|(_, v)| v.is_finite())
            .map(|(x, v)| format!("{x:.2},{:.2}", y_of(*v)))
            .collect::<Vec<_>>()
            .join(" ");
        let last = column.last().copied().unwrap_or(0.0);
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{points}"><title>{name}: {last}</title></polyline>"#,
            color = color_for(i),
            name = escape(ticker),
            last = format_percent_precise(last),
        ));
    }

    // Baseline drawn last so it stays visible over the curves
    let zero = y_of(0.0);
    svg.push_str(&format!(
        r##"<line x1="{LEFT:.2}" y1="{zero:.2}" x2="{x2:.2}" y2="{zero:.2}" stroke="#000000" stroke-width="2" stroke-dasharray="6 4" class="zero-line" />"##,
        x2 = WIDTH - RIGHT,
    ));

    legend(&mut svg, &table.tickers);
    svg.push_str("</svg>");
    svg
}

fn extent(table: &ReturnTable) -> (f64, f64) {
    let (mut lo, mut hi) = (0.0_f64, 0.0_f64);
    for v in table.columns.iter().flatten().filter(|v| v.is_finite()) {
        lo = lo.min(*v);
        hi = hi.max(*v);
    }
    if (hi - lo).abs() < f64::EPSILON {
        hi = lo + 0.01;
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn scale(value: f64, min_v: f64, max_v: f64) -> f64 {
    let inner = HEIGHT - TOP - BOTTOM;
    TOP + (1.0 - (value - min_v) / (max_v - min_v)) * inner
}

fn x_positions(len: usize) -> Vec<f64> {
    let inner = WIDTH - LEFT - RIGHT;
    if len <= 1 {
        return vec![LEFT + inner / 2.0; len];
    }
    (0..len)
        .map(|i| LEFT + inner * i as f64 / (len - 1) as f64)
        .collect()
}

/// Evenly spaced "nice" tick values (1, 2, 2.5 or 5 × 10ⁿ) covering the range.
fn nice_ticks(min_v: f64, max_v: f64, target: usize) -> Vec<f64> {
    let raw = (max_v - min_v) / target.max(1) as f64;
    let magnitude = 10_f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(raw);

    let mut ticks = Vec::new();
    let mut t = (min_v / step).ceil() * step;
    while t <= max_v + step * 1e-9 {
        // Avoid printing "-0%"
        ticks.push(if t.abs() < step * 1e-9 { 0.0 } else { t });
        t += step;
    }
    ticks
}

fn time_axis(svg: &mut String, dates: &[NaiveDate], xs: &[f64]) {
    let axis_y = HEIGHT - BOTTOM;
    svg.push_str(&format!(
        r##"<line x1="{LEFT:.2}" y1="{axis_y:.2}" x2="{x2:.2}" y2="{axis_y:.2}" stroke="#000000" stroke-width="2" />"##,
        x2 = WIDTH - RIGHT,
    ));

    let span_days = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (*last - *first).num_days(),
        _ => 0,
    };
    // Monthly labels up to ~2 years, yearly beyond that
    let yearly = span_days > 800;
    let step_months = if span_days > 400 { 3 } else { 1 };

    let mut last_key = None;
    for (date, x) in dates.iter().zip(xs) {
        let key = if yearly {
            (date.year(), 0)
        } else {
            (date.year(), date.month0() / step_months)
        };
        if last_key == Some(key) {
            continue;
        }
        last_key = Some(key);
        let label = if yearly {
            date.format("%Y").to_string()
        } else {
            date.format("%b %Y").to_string()
        };
        svg.push_str(&format!(
            r##"<line x1="{x:.2}" y1="{axis_y:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="#000000" stroke-width="1" /><text x="{x:.2}" y="{ty:.2}" text-anchor="middle">{label}</text>"##,
            y2 = axis_y + 5.0,
            ty = axis_y + 18.0,
        ));
    }
}

fn legend(svg: &mut String, tickers: &[String]) {
    let x = WIDTH - RIGHT - 110.0;
    for (i, ticker) in tickers.iter().enumerate() {
        let y = TOP + 14.0 + 16.0 * i as f64;
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{ly:.2}" x2="{x2:.2}" y2="{ly:.2}" stroke="{color}" stroke-width="2" /><text x="{tx:.2}" y="{y:.2}" text-anchor="start">{name}</text>"#,
            ly = y - 4.0,
            x2 = x + 20.0,
            tx = x + 26.0,
            color = color_for(i),
            name = escape(ticker),
        ));
    }
}
