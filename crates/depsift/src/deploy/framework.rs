//! Framework production build command.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

use crate::{Error, Result};

/// An external build command: program followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkCommand {
    program: String,
    args: Vec<String>,
}

impl FrameworkCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Split `[program, args..]`. Fails on an empty list.
    pub fn from_parts(parts: &[String]) -> Result<Self> {
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| Error::InvalidConfig("buildCommand must not be empty".to_string()))?;
        if program.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "buildCommand program must not be blank".to_string(),
            ));
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the command in `cwd` with inherited stdio.
    ///
    /// `NODE_ENV` defaults to `production` unless the caller's environment
    /// already sets it.
    pub async fn run(&self, cwd: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if std::env::var_os("NODE_ENV").is_none() {
            cmd.env("NODE_ENV", "production");
        }

        info!(command = %self.display(), cwd = %cwd.display(), "running framework build");

        let status = cmd.status().await.map_err(|source| Error::SpawnFailed {
            command: self.display(),
            source,
        })?;

        if !status.success() {
            return Err(Error::FrameworkBuild {
                command: self.display(),
                code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts() {
        let parts = vec!["npx".to_string(), "next".to_string(), "build".to_string()];
        let cmd = FrameworkCommand::from_parts(&parts).unwrap();
        assert_eq!(cmd.display(), "npx next build");
    }

    #[test]
    fn test_from_parts_rejects_empty() {
        assert!(matches!(
            FrameworkCommand::from_parts(&[]),
            Err(Error::InvalidConfig(_))
        ));
        assert!(FrameworkCommand::from_parts(&["  ".to_string()]).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_exit_code() {
        let temp = tempfile::TempDir::new().unwrap();
        let cmd = FrameworkCommand::new("sh").arg("-c").arg("exit 3");
        let err = cmd.run(temp.path()).await.unwrap_err();
        assert!(matches!(err, Error::FrameworkBuild { code: 3, .. }));
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let temp = tempfile::TempDir::new().unwrap();
        let cmd = FrameworkCommand::new("depsift-definitely-not-a-real-binary");
        let err = cmd.run(temp.path()).await.unwrap_err();
        assert!(matches!(err, Error::SpawnFailed { .. }));
    }
}
