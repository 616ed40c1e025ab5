//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use super::Report;
use crate::config::Config;
use crate::storage::{MetricRecord, RegionRecord};

/// Format a Report for human-readable terminal output.
///
/// One block per region, indented by nesting depth. Values use the
/// precision, width and notation from `config`. Colors are included when the
/// `ansi` feature is enabled.
pub fn format_report(report: &Report, config: &Config) -> String {
    let mut lines = Vec::new();
    lines.push(paint_header(&format!(
        "perfnorm report ({}, {} source{})",
        report.metadata.timing_unit,
        report.metadata.sources,
        if report.metadata.sources == 1 { "" } else { "s" }
    )));

    if report.is_empty() {
        lines.push(String::new());
        lines.push("no regions recorded".to_string());
    }

    let label_width = report
        .regions
        .iter()
        .flat_map(|r| r.metrics.iter().map(move |m| m.label.len() + 2 * r.depth))
        .max()
        .unwrap_or(0);

    for region in &report.regions {
        lines.push(String::new());
        lines.push(format_region_line(region));
        for metric in &region.metrics {
            lines.push(format_metric_line(metric, region.depth, label_width, config));
        }
    }

    let inner = lines
        .iter()
        .map(|l| strip_ansi_codes(l).chars().count())
        .max()
        .unwrap_or(0)
        + 2;

    let mut out = String::new();
    out.push_str(&format_box_top(inner));
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&format_box_line(line, inner));
        if i == 0 {
            out.push_str(&format_box_separator(inner));
        }
    }
    out.push_str(&format_box_bottom(inner));
    out
}

/// Format a single value with the configured precision, width and notation.
pub fn format_value(value: f64, config: &Config) -> String {
    ValueFormat::from_config(config).apply(value)
}

/// Number layout captured from a [`Config`] so values can be rendered
/// after the config is out of reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ValueFormat {
    width: usize,
    precision: usize,
    scientific: bool,
}

impl ValueFormat {
    pub(crate) fn from_config(config: &Config) -> Self {
        Self {
            width: config.width,
            precision: config.precision,
            scientific: config.scientific,
        }
    }

    pub(crate) fn apply(&self, value: f64) -> String {
        let (w, p) = (self.width, self.precision);
        if self.scientific {
            format!("{:>w$.p$e}", value)
        } else {
            format!("{:>w$.p$}", value)
        }
    }
}

fn format_region_line(region: &RegionRecord) -> String {
    let indent = "  ".repeat(region.depth);
    let name = if cfg!(feature = "ansi") {
        region.name.bold().to_string()
    } else {
        region.name.clone()
    };
    format!("{indent}{name}  (laps: {})", region.laps)
}

fn format_metric_line(metric: &MetricRecord, depth: usize, label_width: usize, config: &Config) -> String {
    let indent = "  ".repeat(depth);
    let pad = label_width.saturating_sub(metric.label.len() + 2 * depth);
    let label = if cfg!(feature = "ansi") {
        metric.label.cyan().to_string()
    } else {
        metric.label.clone()
    };
    let stats = &metric.stats;
    format!(
        "{indent}  {label}{}  n={:<4} sum={} mean={} min={} max={} sd={} {}",
        " ".repeat(pad),
        stats.count(),
        format_value(stats.sum(), config),
        format_value(stats.mean(), config),
        format_value(stats.min(), config),
        format_value(stats.max(), config),
        format_value(stats.stddev(), config),
        metric.unit,
    )
}

fn paint_header(s: &str) -> String {
    if cfg!(feature = "ansi") {
        s.green().bold().to_string()
    } else {
        s.to_string()
    }
}

fn format_box_top(width: usize) -> String {
    format!("\u{250C}{}\u{2510}\n", "\u{2500}".repeat(width))
}

fn format_box_bottom(width: usize) -> String {
    format!("\u{2514}{}\u{2518}\n", "\u{2500}".repeat(width))
}

fn format_box_separator(width: usize) -> String {
    format!("\u{251C}{}\u{2524}\n", "\u{2500}".repeat(width))
}

fn format_box_line(content: &str, width: usize) -> String {
    // Strip ANSI codes for length calculation
    let visible_len = strip_ansi_codes(content).chars().count();
    let padding = (width - 2).saturating_sub(visible_len);
    format!("\u{2502} {}{} \u{2502}\n", content, " ".repeat(padding))
}

/// Strip ANSI escape codes for accurate length calculation.
fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip until 'm' (end of ANSI sequence)
            while let Some(&next) = chars.peek() {
                chars.next();
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}
