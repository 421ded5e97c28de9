//! JSON run report for `lookml views --report`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};
use crate::error::{DbteaError, Result};

/// Bumped whenever a field is removed or changes meaning
pub const REPORT_FORMAT_VERSION: u32 = 1;

/// Counters over one translation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub views_generated: usize,
    pub properties_stripped: usize,
    pub types_inferred: usize,
    pub duplicate_views: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl ReportSummary {
    fn count(&mut self, diagnostic: &Diagnostic) {
        if diagnostic.code.is_stripped_property() {
            self.properties_stripped += 1;
        }
        match diagnostic.code {
            DiagnosticCode::LookmlInferredFieldType => self.types_inferred += 1,
            DiagnosticCode::LookmlDuplicateViewName => self.duplicate_views += 1,
            _ => {}
        }
        match diagnostic.severity {
            Severity::Warn => self.warnings += 1,
            Severity::Error => self.errors += 1,
            Severity::Info => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub format_version: u32,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,

    /// Generated view names in output order; unnamed views are left out
    pub views: Vec<String>,

    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new(views: Vec<String>, diagnostics: Vec<Diagnostic>) -> Self {
        let mut summary = ReportSummary {
            views_generated: views.len(),
            ..ReportSummary::default()
        };
        diagnostics.iter().for_each(|d| summary.count(d));

        Self {
            format_version: REPORT_FORMAT_VERSION,
            generated_at: Utc::now(),
            summary,
            views,
            diagnostics,
        }
    }

    /// Diagnostics about one view, in emission order
    pub fn for_view<'a>(&'a self, view: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |d| d.view.as_deref() == Some(view))
    }

    pub fn needs_review(&self) -> bool {
        self.summary.warnings > 0 || self.summary.errors > 0
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            DbteaError::invalid_input("invalid-report", "Report could not be serialized", e.to_string())
        })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DbteaError::io(parent, e))?;
        }
        std::fs::write(path, json).map_err(|e| DbteaError::io(path, e))?;
        tracing::debug!("Saved report to {}", path.display());
        Ok(())
    }
}
