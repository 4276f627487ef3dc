//! Build stage: run the static site generator as a subprocess.

use std::time::{Duration, Instant};

use tracing::{info, instrument};

use kantanpress_shared::{BuildConfig, KantanError, Result};

/// Outcome of a successful site build.
#[derive(Debug)]
pub struct BuildOutput {
    /// Time the generator took.
    pub elapsed: Duration,
}

/// Invoke the configured site generator and wait for it to finish.
///
/// Stdio is inherited — the generator's own output is the user feedback.
/// A non-zero exit stops the pipeline.
#[instrument(skip_all, fields(command = %config.command))]
pub fn build_site(config: &BuildConfig) -> Result<BuildOutput> {
    let start = Instant::now();

    info!(
        command = %config.command,
        args = ?config.args,
        working_dir = %config.working_dir,
        "running site generator"
    );

    let status = std::process::Command::new(&config.command)
        .args(&config.args)
        .current_dir(&config.working_dir)
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .status()
        .map_err(|e| KantanError::Build(format!("failed to spawn '{}': {e}", config.command)))?;

    if !status.success() {
        return Err(KantanError::Build(format!(
            "'{}' exited with status {}",
            config.command,
            status.code().unwrap_or(-1)
        )));
    }

    let elapsed = start.elapsed();
    info!(elapsed_ms = elapsed.as_millis(), "site build complete");

    Ok(BuildOutput { elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> BuildConfig {
        BuildConfig {
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            working_dir: ".".into(),
        }
    }

    #[test]
    fn successful_build_returns_output() {
        let output = build_site(&shell("exit 0")).unwrap();
        assert!(output.elapsed.as_secs() < 60);
    }

    #[test]
    fn nonzero_exit_is_build_error_with_code() {
        let result = build_site(&shell("exit 3"));
        match result {
            Err(KantanError::Build(msg)) => assert!(msg.contains("status 3")),
            other => panic!("expected build error, got {other:?}"),
        }
    }

    #[test]
    fn missing_command_is_build_error() {
        let config = BuildConfig {
            command: "kantanpress-no-such-generator".into(),
            args: vec![],
            working_dir: ".".into(),
        };
        let result = build_site(&config);
        match result {
            Err(KantanError::Build(msg)) => assert!(msg.contains("failed to spawn")),
            other => panic!("expected build error, got {other:?}"),
        }
    }

    #[test]
    fn build_runs_in_working_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            command: "sh".into(),
            args: vec!["-c".into(), "echo built > marker.txt".into()],
            working_dir: tmp.path().to_string_lossy().into_owned(),
        };

        build_site(&config).unwrap();
        assert!(tmp.path().join("marker.txt").exists());
    }
}
