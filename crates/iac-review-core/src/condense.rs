use serde::Serialize;
use serde_json::{Map, Value};

use crate::scanner::ScanDocument;

/// Upper bound on violations forwarded to the summarization service.
pub const MAX_CONDENSED_VIOLATIONS: usize = 10;
/// Marker sent instead of an empty violation list.
pub const NO_VIOLATIONS_MARKER: &str = "No violations found";

/// Condensed violation list: either the leading findings or the empty marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CondensedViolations {
    Findings(Vec<Value>),
    Marker(&'static str),
}

/// Size-bounded view of a scan document used as the summarization payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CondensedFindings {
    pub scan_summary: Map<String, Value>,
    pub violations: CondensedViolations,
}

impl CondensedFindings {
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Reduce a scan document to its summary plus the first violations in scanner order.
pub fn condense(doc: &ScanDocument) -> CondensedFindings {
    let scan_summary = doc.scan_summary().cloned().unwrap_or_default();
    let violations = match doc.violations() {
        [] => CondensedViolations::Marker(NO_VIOLATIONS_MARKER),
        all => CondensedViolations::Findings(
            all.iter().take(MAX_CONDENSED_VIOLATIONS).cloned().collect(),
        ),
    };
    CondensedFindings {
        scan_summary,
        violations,
    }
}
