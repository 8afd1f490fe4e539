//! Typst report generation.
//!
//! Reads a Typst template (either the built-in default or a custom file via
//! `[report] template_path`), resolves all `{{PLACEHOLDER}}` markers by
//! calling helpers from `chart_svg` and `tables`, and writes the final
//! `index_report.typ`.

pub mod chart_svg;
pub mod default_template;
pub mod tables;

use crate::domain::error::IndexError;
use crate::domain::pipeline::IndexRun;
use crate::domain::summary::IndexSummary;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_FILE: &str = "index_report.typ";

/// Context for resolving template placeholders.
pub struct ReportContext<'a> {
    pub title: &'a str,
    pub run: &'a IndexRun,
    pub summary: &'a IndexSummary,
}

/// Resolve all `{{PLACEHOLDER}}`s in the given template string and return
/// the final Typst markup ready to be written to a `.typ` file.
pub fn resolve(template: &str, ctx: &ReportContext) -> String {
    let mut output = template.to_string();

    output = output.replace("{{TITLE}}", &tables::escape(ctx.title));
    output = output.replace("{{RUN_SUMMARY}}", &tables::render_run_summary(ctx.summary));
    output = output.replace(
        "{{PERFORMANCE_CHART}}",
        &chart_svg::format_value_chart(&ctx.run.performance),
    );

    let monthly = tables::compute_monthly_returns(&ctx.run.performance);
    output = output.replace("{{MONTHLY_RETURNS}}", &tables::format_returns_heatmap(&monthly));

    output = output.replace(
        "{{LATEST_CONSTITUENTS}}",
        &tables::render_latest_constituents(ctx.run.latest_constituents()),
    );
    output = output.replace(
        "{{COMPOSITION_CHANGES}}",
        &tables::render_composition_changes(&ctx.run.changes),
    );
    output = output.replace(
        "{{PERFORMANCE_TABLE}}",
        &tables::render_performance_table(&ctx.run.performance),
    );
    output = output.replace("{{SKIPPED_ROWS}}", &tables::render_skipped_rows(&ctx.run.skipped));

    output
}

pub struct TypstReportAdapter {
    title: String,
    template_path: Option<PathBuf>,
}

impl TypstReportAdapter {
    pub fn new(title: impl Into<String>, template_path: Option<PathBuf>) -> Self {
        Self {
            title: title.into(),
            template_path,
        }
    }

    fn load_template(&self) -> Result<String, IndexError> {
        match &self.template_path {
            Some(path) => fs::read_to_string(path).map_err(|e| IndexError::Export {
                path: path.display().to_string(),
                reason: format!("failed to read template: {}", e),
            }),
            None => Ok(default_template::template().to_string()),
        }
    }
}

impl ReportPort for TypstReportAdapter {
    fn write(
        &self,
        run: &IndexRun,
        summary: &IndexSummary,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, IndexError> {
        let template = self.load_template()?;
        let ctx = ReportContext {
            title: &self.title,
            run,
            summary,
        };
        let content = resolve(&template, &ctx);

        fs::create_dir_all(output_dir).map_err(|e| IndexError::Export {
            path: output_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let path = output_dir.join(REPORT_FILE);
        fs::write(&path, content).map_err(|e| IndexError::Export {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(vec![path])
    }
}
