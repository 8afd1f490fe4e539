//! Report generation port.

use crate::domain::error::IndexError;
use crate::domain::pipeline::IndexRun;
use crate::domain::summary::IndexSummary;
use std::path::{Path, PathBuf};

/// Port for rendering an index run into files under `output_dir`.
pub trait ReportPort {
    /// Returns the paths written, in a stable order.
    fn write(
        &self,
        run: &IndexRun,
        summary: &IndexSummary,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, IndexError>;
}
