//! Option checks against a concrete stream.
//!
//! [`PipelineOptions::report`](crate::PipelineOptions::report) returns a
//! [`ValidationReport`]: the hard errors that
//! [`validate`](crate::PipelineOptions::validate) would reject, plus
//! settings that are legal but unlikely to do what the caller wants for a
//! stream of that length.
//!
//! # Example
//!
//! ```
//! use shotsplit::PipelineOptions;
//!
//! let report = PipelineOptions::new().with_prefetch_depth(64).report(10);
//! assert!(report.is_valid());
//! print!("{report}");
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::configuration::PipelineOptions;

/// Findings for one set of options.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Neutral observations.
    pub info: Vec<String>,
    /// Probable mistakes that will still run.
    pub warnings: Vec<String>,
    /// Violations; constructors reject these options.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// `true` when there are no errors. Warnings are ignored.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of entries across all three lists.
    pub fn issue_count(&self) -> usize {
        self.sections().map(|(_, items)| items.len()).sum()
    }

    fn sections(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        [
            ("INFO", self.info.as_slice()),
            ("WARN", self.warnings.as_slice()),
            ("ERROR", self.errors.as_slice()),
        ]
        .into_iter()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.issue_count() == 0 {
            return writeln!(f, "No issues found.");
        }
        for (label, items) in self.sections() {
            for item in items {
                writeln!(f, "[{label}] {item}")?;
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_options(options: &PipelineOptions, frame_count: u64) -> ValidationReport {
    let mut report = ValidationReport {
        errors: options.constraint_violations(),
        ..ValidationReport::default()
    };

    let depth = options.prefetch_depth();
    let min_run = options.min_run();

    if frame_count == 0 {
        report
            .info
            .push("Stream is empty; no scenes will be produced".to_string());
    } else {
        if depth as u64 > frame_count {
            report.info.push(format!(
                "Prefetch depth {depth} exceeds the stream length; only {frame_count} fetches will be issued"
            ));
        }
        if min_run as u64 >= frame_count {
            report.info.push(format!(
                "min_run ({min_run}) covers the whole stream; at most one boundary will be accepted"
            ));
        }
    }

    if depth > 0 && options.lookahead() > depth {
        report.warnings.push(format!(
            "Lookahead ({}) is deeper than the prefetch window ({depth}); lookahead pulls will wait on fetches",
            options.lookahead()
        ));
    }

    if let Some(max_length) = options.max_scene_length()
        && max_length > 0
        && min_run >= max_length
    {
        report.warnings.push(format!(
            "min_run ({min_run}) is not below max scene length ({max_length}); forced cuts will dominate"
        ));
    }

    report
}
