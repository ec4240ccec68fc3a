use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{ScanCapture, ScanRunner};
use crate::error::PipelineError;

pub const DEFAULT_SCANNER_PROGRAM: &str = "terrascan";
const SCAN_ARGS: [&str; 3] = ["scan", "-o", "json"];

/// Runs `terrascan scan -o json` against a scan root and captures stdout.
#[derive(Debug, Clone)]
pub struct TerrascanRunner {
    program: String,
    workdir: PathBuf,
}

impl TerrascanRunner {
    pub fn new(program: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl ScanRunner for TerrascanRunner {
    #[instrument(name = "run_scanner", skip(self), fields(program = %self.program, workdir = %self.workdir.display()))]
    async fn run(&self) -> Result<ScanCapture, PipelineError> {
        let output = Command::new(&self.program)
            .args(SCAN_ARGS)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| PipelineError::ScannerLaunch {
                program: self.program.clone(),
                source,
            })?;

        let capture = ScanCapture {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        debug!(
            exit_code = ?capture.exit_code,
            stdout_len = capture.stdout.len(),
            stderr = %capture.stderr.trim(),
            "scanner exited"
        );
        Ok(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureClass;

    #[tokio::test]
    async fn missing_program_is_a_launch_failure() {
        let runner = TerrascanRunner::new("iac-review-missing-scanner", ".");
        let err = runner.run().await.unwrap_err();
        assert_eq!(err.class(), FailureClass::Invocation);
        assert!(err.to_string().contains("iac-review-missing-scanner"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_from_non_zero_exit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-terrascan");
        std::fs::write(
            &script,
            "#!/bin/sh\n[ \"$1 $2 $3\" = \"scan -o json\" ] || exit 64\necho '{\"results\":{\"scan_summary\":{\"violated_policies\":1}}}'\nexit 3\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = TerrascanRunner::new(script.to_string_lossy(), dir.path());
        let capture = runner.run().await.expect("scanner should launch");
        assert_eq!(capture.exit_code, Some(3));
        assert_eq!(capture.parse().unwrap().violated_policies(), 1);
    }
}
