//! Crate error type, analysis options and the one-call analysis entry point.

use serde::{Deserialize, Serialize};

use crate::connectivity::ConnectivityOptions;
use crate::erc::{ErcContext, ErcEngine, ErcOptions, ErcViolation, Severity};
use crate::hierarchy::{resolve_hierarchical_nets, ROOT_SHEET_PATH};
use crate::library::SymbolLibrary;
use crate::model::{Design, Net};
use crate::netclass::{auto_assign_net_classes, default_net_classes, NetClass};

#[derive(Debug, thiserror::Error)]
pub enum SchemnetError {
    #[error("Invalid wire {wire_id}: {reason}")]
    InvalidWire { wire_id: String, reason: String },
    #[error("Invalid bus label: {0}")]
    InvalidBusLabel(String),
    #[error("Unknown sheet definition: {0}")]
    UnknownSheetDef(String),
    #[error("Library JSON error: {0}")]
    LibraryJson(#[from] serde_json::Error),
}

/// Options for a full analysis run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub connectivity: ConnectivityOptions,
    pub erc: ErcOptions,
    pub assign_net_classes: bool,
    pub net_classes: Vec<NetClass>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            connectivity: ConnectivityOptions::default(),
            erc: ErcOptions::default(),
            assign_net_classes: true,
            net_classes: default_net_classes(),
        }
    }
}

/// Flattened nets of the whole design plus the root sheet's ERC findings.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub nets: Vec<Net>,
    pub violations: Vec<ErcViolation>,
    pub stats: ErcStats,
}

impl AnalysisResult {
    pub fn has_errors(&self) -> bool {
        self.stats.has_errors()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ErcStats {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl ErcStats {
    pub fn from_violations(violations: &[ErcViolation]) -> Self {
        let mut stats = Self::default();
        for v in violations {
            match v.severity {
                Severity::Error => stats.errors += 1,
                Severity::Warning => stats.warnings += 1,
                Severity::Info => stats.info += 1,
            }
        }
        stats
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.info
    }
}

/// Analysis API for host applications.
pub struct SchematicCore;

impl SchematicCore {
    /// Resolve nets across the hierarchy, optionally assign net classes, then
    /// check the root sheet. Malformed input is skipped, not rejected; call
    /// [`Design::validate`] first for a strict check.
    pub fn analyze(library: &SymbolLibrary, design: &Design, options: &AnalysisOptions) -> AnalysisResult {
        let mut nets = resolve_hierarchical_nets(library, design, &options.connectivity);
        if options.assign_net_classes {
            auto_assign_net_classes(&mut nets, &options.net_classes);
        }

        let ctx = ErcContext::new(
            library,
            &design.root,
            &design.sheet_defs,
            ROOT_SHEET_PATH,
            &options.connectivity,
        );
        let violations = ErcEngine::with_default_rules().check(&ctx, &options.erc);
        let stats = ErcStats::from_violations(&violations);

        tracing::debug!(
            "Analysis: {} nets, {} errors, {} warnings",
            nets.len(),
            stats.errors,
            stats.warnings
        );

        AnalysisResult {
            nets,
            violations,
            stats,
        }
    }
}
