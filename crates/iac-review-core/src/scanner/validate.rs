use tracing::warn;

use super::{ScanDocument, TERRAFORM_IAC_TYPE};
use crate::error::PipelineError;

/// Reject scans whose root held no valid Terraform configuration.
///
/// The first `scan_errors` entry with `iac_type == "terraform"` aborts the run
/// with its `errMsg`. Other IaC types only produce a warning.
pub fn validate_target(doc: &ScanDocument) -> Result<(), PipelineError> {
    for entry in doc.scan_errors() {
        match entry.iac_type.as_deref() {
            Some(TERRAFORM_IAC_TYPE) => {
                return Err(PipelineError::InvalidTarget {
                    iac_type: TERRAFORM_IAC_TYPE.to_string(),
                    message: entry
                        .err_msg
                        .clone()
                        .unwrap_or_else(|| "scanner reported a terraform scan error".to_string()),
                });
            }
            other => warn!(
                iac_type = other.unwrap_or("unknown"),
                message = entry.err_msg.as_deref().unwrap_or(""),
                "ignoring non-terraform scan error"
            ),
        }
    }
    if doc.scan_summary().is_none() {
        warn!("scan document has no scan_summary; treating run as violation-free");
    }
    Ok(())
}
