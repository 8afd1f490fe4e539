//! Table formatting for the Typst report.
//!
//! Provides functions to generate Typst markup for:
//! - Run summary table
//! - Monthly returns heatmap grid
//! - Latest constituents, composition changes and daily performance tables
//! - Skipped input rows

use crate::domain::composition::CompositionChange;
use crate::domain::constituent::Constituent;
use crate::domain::observation::SkippedRow;
use crate::domain::performance::PerformanceRecord;
use crate::domain::summary::IndexSummary;
use chrono::Datelike;
use std::collections::BTreeMap;

/// Escape text for use inside Typst content brackets.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '#' | '$' | '*' | '_' | '[' | ']' | '<' | '>' | '@' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn format_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn render_run_summary(summary: &IndexSummary) -> String {
    let period = match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => format!("{} to {}", first, last),
        _ => "-".to_string(),
    };

    let rows = [
        ("Period", period),
        ("Index days", summary.index_days.to_string()),
        ("Final value", format!("{:.4}", summary.final_value)),
        ("Total return", format_pct(summary.total_return)),
        ("Annualized return", format_pct(summary.annualized_return)),
        ("Annualized volatility", format_pct(summary.annualized_volatility)),
        ("Max drawdown", format_pct(summary.max_drawdown)),
        ("Composition change days", summary.change_days.to_string()),
        ("Additions", summary.total_additions.to_string()),
        ("Removals", summary.total_removals.to_string()),
        ("Skipped rows", summary.skipped_rows.to_string()),
    ];

    let mut out = String::from("#table(\n  columns: 2,\n  align: (left, right),\n");
    out.push_str("  [*Metric*], [*Value*],\n");
    for (label, value) in rows {
        out.push_str(&format!("  [{}], [{}],\n", label, value));
    }
    out.push_str(")\n");
    out
}

pub struct MonthlyReturns {
    pub year: i32,
    pub month: u32,
    pub return_pct: f64,
}

/// Month-end to month-end change of the index value. The first month is
/// measured against the 1.0 base.
pub fn compute_monthly_returns(performance: &[PerformanceRecord]) -> Vec<MonthlyReturns> {
    let mut month_end: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for point in performance {
        month_end.insert((point.date.year(), point.date.month()), point.cumulative_value);
    }

    let mut returns = Vec::new();
    let mut prev_end = 1.0_f64;
    for ((year, month), end_value) in month_end {
        let return_pct = if prev_end > 0.0 {
            (end_value - prev_end) / prev_end
        } else {
            0.0
        };
        returns.push(MonthlyReturns {
            year,
            month,
            return_pct,
        });
        prev_end = end_value;
    }
    returns
}

pub fn format_returns_heatmap(returns: &[MonthlyReturns]) -> String {
    if returns.is_empty() {
        return "_Insufficient data for monthly returns._".to_string();
    }

    let mut years: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();
    for r in returns {
        let entry = years.entry(r.year).or_insert([None; 12]);
        entry[(r.month - 1) as usize] = Some(r.return_pct);
    }

    let mut output = String::new();
    output.push_str("#table(\n");
    output.push_str("  columns: 14,\n");
    output.push_str("  [*Year*], [*Jan*], [*Feb*], [*Mar*], [*Apr*], [*May*], [*Jun*], ");
    output.push_str("[*Jul*], [*Aug*], [*Sep*], [*Oct*], [*Nov*], [*Dec*], [*YTD*],\n");

    for (year, monthly) in years.iter() {
        output.push_str(&format!("  [{}],", year));

        let mut ytd = 1.0_f64;
        for &opt_ret in monthly.iter() {
            if let Some(ret) = opt_ret {
                ytd *= 1.0 + ret;
                output.push_str(&format!(" {},", format_heatmap_cell(ret)));
            } else {
                output.push_str(" [-],");
            }
        }
        output.push_str(&format!(" {},\n", format_heatmap_cell(ytd - 1.0)));
    }

    output.push_str(")\n");
    output
}

/// Returns (fill_color, needs_white_text) for a given return value.
fn return_color(ret: f64) -> (&'static str, bool) {
    if ret >= 0.10 {
        ("rgb(\"#006400\")", true)
    } else if ret >= 0.05 {
        ("rgb(\"#228B22\")", true)
    } else if ret >= 0.02 {
        ("rgb(\"#90EE90\")", false)
    } else if ret > 0.0 {
        ("rgb(\"#E0FFE0\")", false)
    } else if ret == 0.0 {
        ("rgb(\"#FFFFFF\")", false)
    } else if ret > -0.02 {
        ("rgb(\"#FFE0E0\")", false)
    } else if ret > -0.05 {
        ("rgb(\"#FF9090\")", false)
    } else if ret > -0.10 {
        ("rgb(\"#FF4444\")", true)
    } else {
        ("rgb(\"#8B0000\")", true)
    }
}

fn format_heatmap_cell(ret: f64) -> String {
    let (color, white_text) = return_color(ret);
    let formatted = format!("{:+.1}%", ret * 100.0);
    if white_text {
        format!("box(fill: {}, text(fill: white, [{}]))", color, formatted)
    } else {
        format!("box(fill: {}, [{}])", color, formatted)
    }
}

pub fn render_latest_constituents(constituents: &[Constituent]) -> String {
    let Some(first) = constituents.first() else {
        return "_No constituents._".to_string();
    };

    let mut out = format!("As of {}.\n\n", first.date);
    out.push_str("#table(\n  columns: 5,\n  align: (right, left, right, right, right),\n");
    out.push_str("  [*Rank*], [*Ticker*], [*Market Cap*], [*Price*], [*Weight*],\n");
    for c in constituents {
        out.push_str(&format!(
            "  [{}], [{}], [{}], [{:.2}], [{}],\n",
            c.rank,
            escape(&c.ticker),
            c.market_cap,
            c.price,
            format_pct(c.weight)
        ));
    }
    out.push_str(")\n");
    out
}

pub fn render_composition_changes(changes: &[CompositionChange]) -> String {
    if changes.is_empty() {
        return "_No composition changes._".to_string();
    }

    let mut out = String::from("#table(\n  columns: 5,\n  align: (left, right, right, left, left),\n");
    out.push_str("  [*Date*], [*Additions*], [*Removals*], [*Added*], [*Removed*],\n");
    for change in changes {
        out.push_str(&format!(
            "  [{}], [{}], [{}], [{}], [{}],\n",
            change.date,
            change.additions(),
            change.removals(),
            escape(&change.added_list()),
            escape(&change.removed_list())
        ));
    }
    out.push_str(")\n");
    out
}

pub fn render_performance_table(performance: &[PerformanceRecord]) -> String {
    if performance.is_empty() {
        return "_No performance data._".to_string();
    }

    let mut out = String::from("#table(\n  columns: 3,\n  align: (left, right, right),\n");
    out.push_str("  [*Date*], [*Daily Return*], [*Index Value*],\n");
    for point in performance {
        let daily = point
            .daily_return
            .map(format_pct)
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  [{}], [{}], [{:.4}],\n",
            point.date, daily, point.cumulative_value
        ));
    }
    out.push_str(")\n");
    out
}

pub fn render_skipped_rows(skipped: &[SkippedRow]) -> String {
    if skipped.is_empty() {
        return "_No input rows were skipped._".to_string();
    }

    let mut out = String::from("#table(\n  columns: 4,\n  align: (right, left, left, left),\n");
    out.push_str("  [*Row*], [*Date*], [*Ticker*], [*Reason*],\n");
    for row in skipped {
        out.push_str(&format!(
            "  [{}], [{}], [{}], [{}],\n",
            row.row,
            escape(&row.date),
            escape(&row.ticker),
            row.reason
        ));
    }
    out.push_str(")\n");
    out
}
