use crate::error::{Error, Result};
use crate::languages::{Distribution, LanguageShare, TOTAL_TENTHS};
use crate::stats::ActivityStats;

const CARD_WIDTH: u32 = 500;
const PADDING: u32 = 20;
const TITLE_Y: u32 = 32;

const BAR_X: u32 = PADDING;
const BAR_Y: u32 = 50;
const BAR_WIDTH: u32 = CARD_WIDTH - 2 * PADDING;
const BAR_HEIGHT: u32 = 10;

const LEGEND_TOP: u32 = 76;
const LEGEND_ROW_HEIGHT: u32 = 24;
const SWATCH_SIZE: u32 = 12;
const MAX_LABEL_CHARS: usize = 48;
const MIN_LANGUAGE_HEIGHT: u32 = 130;

const STATS_FIRST_BASELINE: u32 = 66;
const STATS_ROW_HEIGHT: u32 = 28;
const STATS_VALUE_X: u32 = 300;
const GRADE_RADIUS: u32 = 40;

const FONT_FAMILY: &str = "'Segoe UI', 'Helvetica Neue', Arial, sans-serif";
const BACKGROUND: &str = "#0d1117";
const TITLE_COLOR: &str = "#539bf5";
const TEXT_COLOR: &str = "#e6edf3";
const MUTED_COLOR: &str = "#8b949e";
const TRACK_COLOR: &str = "#30363d";
const GRADE_RING: &str = "#2b6cb0";

// Utilities for building SVG content

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Shorten labels that would run into the percentage column.
fn fit_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let mut short: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
    short.push('…');
    short
}

fn card(width: u32, height: u32, title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg"
     width="{width}" height="{height}" viewBox="0 0 {width} {height}"
     role="img" aria-label="{title}"
     font-family="{FONT_FAMILY}">

<style>
.title {{ fill: {TITLE_COLOR}; font-size: 20px; font-weight: 700; }}
.label {{ fill: {TEXT_COLOR}; font-size: 13px; font-weight: 600; }}
.value {{ fill: {TEXT_COLOR}; font-size: 13px; font-weight: 700; }}
.muted {{ fill: {MUTED_COLOR}; font-size: 13px; }}
.grade {{ fill: {TITLE_COLOR}; font-size: 22px; font-weight: 800; }}
</style>

<rect width="{width}" height="{height}" rx="12" fill="{BACKGROUND}"/>
<text x="{PADDING}" y="{TITLE_Y}" class="title">{title}</text>
{body}</svg>
"#
    )
}

/// Height of the language card for a legend of `rows` entries.
pub fn language_card_height(rows: usize) -> u32 {
    let legend_bottom = LEGEND_TOP + (rows.max(1) as u32) * LEGEND_ROW_HEIGHT + PADDING / 2;
    legend_bottom.max(MIN_LANGUAGE_HEIGHT)
}

/// Pixel width of each bar segment, in distribution order.
///
/// Every segment but the last is truncated; the last takes whatever is left
/// so the segments always cover `bar_width` exactly.
pub fn segment_widths(distribution: &Distribution, bar_width: u32) -> Result<Vec<u32>> {
    let Some((_, head)) = distribution.entries().split_last() else {
        return Ok(Vec::new());
    };

    let mut widths: Vec<u32> = head
        .iter()
        .map(|e| (u64::from(bar_width) * u64::from(e.tenths) / u64::from(TOTAL_TENTHS)) as u32)
        .collect();

    let used: u64 = widths.iter().map(|w| u64::from(*w)).sum();
    let last = u64::from(bar_width).checked_sub(used).ok_or_else(|| {
        Error::invariant(format!("segments need {used}px of a {bar_width}px bar"))
    })?;
    widths.push(last as u32);

    Ok(widths)
}

fn check_distribution(distribution: &Distribution) -> Result<()> {
    if distribution.is_empty() {
        return Ok(());
    }
    let total = distribution.total_tenths();
    if total != TOTAL_TENTHS {
        return Err(Error::invariant(format!(
            "language shares add up to {:.1}%, expected 100.0%",
            f64::from(total) / 10.0
        )));
    }
    Ok(())
}

fn build_bar(distribution: &Distribution) -> Result<String> {
    let widths = segment_widths(distribution, BAR_WIDTH)?;
    let radius = BAR_HEIGHT / 2;

    let mut out = format!(
        r#"<clipPath id="bar-clip"><rect x="{BAR_X}" y="{BAR_Y}" width="{BAR_WIDTH}" height="{BAR_HEIGHT}" rx="{radius}"/></clipPath>
<rect x="{BAR_X}" y="{BAR_Y}" width="{BAR_WIDTH}" height="{BAR_HEIGHT}" rx="{radius}" fill="{TRACK_COLOR}"/>
<g clip-path="url(#bar-clip)">
"#
    );

    let mut x = BAR_X;
    for (entry, width) in distribution.entries().iter().zip(widths) {
        if width > 0 {
            out.push_str(&format!(
                "<rect x=\"{x}\" y=\"{BAR_Y}\" width=\"{width}\" height=\"{BAR_HEIGHT}\" fill=\"{}\"/>\n",
                entry.color
            ));
        }
        x += width;
    }
    out.push_str("</g>\n");

    Ok(out)
}

fn build_legend_row(index: usize, entry: &LanguageShare) -> String {
    let top = LEGEND_TOP + index as u32 * LEGEND_ROW_HEIGHT;
    let swatch_y = top + 4;
    let baseline = top + 15;
    let text_x = PADDING + SWATCH_SIZE + 8;
    let right = CARD_WIDTH - PADDING;

    format!(
        r#"<rect x="{PADDING}" y="{swatch_y}" width="{SWATCH_SIZE}" height="{SWATCH_SIZE}" rx="3" fill="{color}"/>
<text x="{text_x}" y="{baseline}" class="{class}">{name}</text>
<text x="{right}" y="{baseline}" class="value" text-anchor="end">{percentage:.1}%</text>
"#,
        color = entry.color,
        class = if entry.is_other() { "muted" } else { "label" },
        name = escape_xml(&fit_label(&entry.language)),
        percentage = entry.percentage(),
    )
}

/// Language card: segmented bar plus one legend row per entry.
pub fn render_language_card(distribution: &Distribution) -> Result<String> {
    check_distribution(distribution)?;

    let mut body = build_bar(distribution)?;

    if distribution.is_empty() {
        let baseline = LEGEND_TOP + 15;
        body.push_str(&format!(
            "<text x=\"{PADDING}\" y=\"{baseline}\" class=\"muted\">No language data</text>\n"
        ));
    } else {
        for (i, entry) in distribution.entries().iter().enumerate() {
            body.push_str(&build_legend_row(i, entry));
        }
    }

    let height = language_card_height(distribution.entries().len());
    Ok(card(CARD_WIDTH, height, "Most Used Languages", &body))
}

/// Height of the stats card; fixed, since the row set is fixed.
fn stats_card_height(rows: usize) -> u32 {
    STATS_FIRST_BASELINE + (rows as u32 - 1) * STATS_ROW_HEIGHT + PADDING + 4
}

/// Stats card: label/value grid in fixed order, with the grade ring on the right.
pub fn render_stats_card(stats: &ActivityStats) -> String {
    let rows = stats.rows();
    let mut body = String::new();

    for (i, (label, value)) in rows.iter().enumerate() {
        let y = STATS_FIRST_BASELINE + i as u32 * STATS_ROW_HEIGHT;
        body.push_str(&format!(
            r#"<text x="{PADDING}" y="{y}" class="label">{label}</text>
<text x="{STATS_VALUE_X}" y="{y}" class="value" text-anchor="end">{value}</text>
"#
        ));
    }

    let cx = CARD_WIDTH - PADDING - GRADE_RADIUS - 30;
    let last_baseline = STATS_FIRST_BASELINE + (rows.len() as u32 - 1) * STATS_ROW_HEIGHT;
    let cy = (STATS_FIRST_BASELINE + last_baseline) / 2 - 5;
    let text_y = cy + 8;
    body.push_str(&format!(
        r#"<circle cx="{cx}" cy="{cy}" r="{GRADE_RADIUS}" stroke="{GRADE_RING}" stroke-width="6" fill="none" opacity="0.35"/>
<text x="{cx}" y="{text_y}" class="grade" text-anchor="middle">{grade}</text>
"#,
        grade = escape_xml(&stats.grade().to_string()),
    ));

    card(CARD_WIDTH, stats_card_height(rows.len()), "GitHub Stats", &body)
}
