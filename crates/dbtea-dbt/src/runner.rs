//! dbt CLI invocation
//!
//! Commands run the `dbt` executable directly (no shell) in the project root
//! with captured output.

use dbtea_core::timing::log_duration;
use dbtea_core::{DbteaError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// dbt prints this on stdout when a run fails, even with a zero exit status
pub const DBT_ERROR_MARKER: &str = "Encountered an error";

/// A dbt subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbtCommand {
    Clean,
    Compile,
    Debug,
    Deps,
    DocsGenerate,
    DocsServe,
    List,
    Init,
    Parse,
    Rpc,
    RunOperation {
        macro_name: String,
        /// YAML/JSON dictionary passed to `--args`
        args: Option<String>,
    },
    Run,
    Seed,
    Snapshot,
    SourceFreshness,
    Test,
}

impl DbtCommand {
    /// Arguments following the executable name
    pub fn args(&self) -> Vec<String> {
        let fixed: &[&str] = match self {
            Self::Clean => &["clean"],
            Self::Compile => &["compile"],
            Self::Debug => &["debug"],
            Self::Deps => &["deps"],
            Self::DocsGenerate => &["docs", "generate"],
            Self::DocsServe => &["docs", "serve"],
            Self::List => &["list"],
            Self::Init => &["init"],
            Self::Parse => &["parse"],
            Self::Rpc => &["rpc"],
            Self::RunOperation { macro_name, args } => {
                let mut argv = vec!["run-operation".to_string(), macro_name.clone()];
                if let Some(args) = args {
                    argv.push("--args".to_string());
                    argv.push(args.clone());
                }
                return argv;
            }
            Self::Run => &["run"],
            Self::Seed => &["seed"],
            Self::Snapshot => &["snapshot"],
            Self::SourceFreshness => &["source", "freshness"],
            Self::Test => &["test"],
        };
        fixed.iter().map(|s| s.to_string()).collect()
    }

    /// Progress message logged before the command runs
    pub fn message(&self) -> String {
        match self {
            Self::Clean => "Removing dbt clean target folders from dbt project...".to_string(),
            Self::Compile => "Compiling dbt models...".to_string(),
            Self::Debug => {
                "Confirming proper dbt project setup, profile and warehouse access...".to_string()
            }
            Self::Deps => "Fetching dbt project package dependencies...".to_string(),
            Self::DocsGenerate => "Generating dbt documentation artifacts...".to_string(),
            Self::DocsServe => "Serving dbt documentation site...".to_string(),
            Self::List => "Listing dbt project resources...".to_string(),
            Self::Init => "Initializing a base dbt project...".to_string(),
            Self::Parse => "Parsing dbt project for performance details...".to_string(),
            Self::Rpc => "Starting dbt RPC server...".to_string(),
            Self::RunOperation { macro_name, .. } => {
                format!("Executing dbt macro operation {}...", macro_name)
            }
            Self::Run => "Running dbt models...".to_string(),
            Self::Seed => "Uploading dbt seed data files to data warehouse...".to_string(),
            Self::Snapshot => "Running dbt snapshots...".to_string(),
            Self::SourceFreshness => "Checking freshness of data source tables...".to_string(),
            Self::Test => "Running dbt tests to validate models...".to_string(),
        }
    }
}

/// A `--flag` or `--flag value` pair appended to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbtFlag {
    Switch(String),
    Value(String, String),
}

impl DbtFlag {
    pub fn switch(name: impl Into<String>) -> Self {
        Self::Switch(name.into())
    }

    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Value(name.into(), value.into())
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Switch(name) => vec![format!("--{}", name)],
            Self::Value(name, value) => vec![format!("--{}", name), value.clone()],
        }
    }
}

/// Captured output of a successful dbt run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbtOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs dbt commands in a project directory
#[derive(Debug, Clone)]
pub struct DbtRunner {
    executable: OsString,
    working_dir: PathBuf,
}

impl DbtRunner {
    pub fn new(working_dir: &Path) -> Self {
        Self {
            executable: OsString::from("dbt"),
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Use another executable in place of `dbt`
    pub fn with_executable(mut self, executable: impl Into<OsString>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Full argument list: command, flags, then any extra arguments
    pub fn command_line(command: &DbtCommand, flags: &[DbtFlag], extra_args: &[String]) -> Vec<String> {
        let mut argv = command.args();
        argv.extend(flags.iter().flat_map(DbtFlag::args));
        argv.extend(extra_args.iter().cloned());
        argv
    }

    /// Run `command`, failing on a spawn error, a non-zero exit status or
    /// dbt's error marker on stdout
    pub fn run(&self, command: &DbtCommand, flags: &[DbtFlag], extra_args: &[String]) -> Result<DbtOutput> {
        let argv = Self::command_line(command, flags, extra_args);
        let display_cmd = format!("{} {}", self.executable.to_string_lossy(), argv.join(" "));

        tracing::info!("{}", command.message());
        tracing::info!("Running dbt command: {}", display_cmd);

        let output = log_duration("dbt ", || {
            Command::new(&self.executable)
                .args(&argv)
                .current_dir(&self.working_dir)
                .output()
        })
        .map_err(|e| {
            DbteaError::external_call_failed(
                "dbt-command-failed",
                "dbt command could not be started",
                format!("{}: {}", display_cmd, e),
            )
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() || stdout.contains(DBT_ERROR_MARKER) {
            tracing::error!("dbt Error: {}", stdout);
            let detail = if stderr.trim().is_empty() { &stdout } else { &stderr };
            return Err(DbteaError::external_call_failed(
                "dbt-command-failed",
                "dbt command failed",
                format!("{} ({}): {}", display_cmd, output.status, detail.trim()),
            ));
        }

        tracing::debug!("Command Result:\n{}", stdout);
        Ok(DbtOutput { stdout, stderr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtea_core::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_argv() {
        assert_eq!(DbtCommand::DocsGenerate.args(), vec!["docs", "generate"]);
        assert_eq!(DbtCommand::SourceFreshness.args(), vec!["source", "freshness"]);
        assert_eq!(
            DbtCommand::RunOperation {
                macro_name: "generate_model_yaml".to_string(),
                args: Some("{model_name: orders}".to_string()),
            }
            .args(),
            vec!["run-operation", "generate_model_yaml", "--args", "{model_name: orders}"]
        );
    }

    #[test]
    fn flags_follow_command() {
        let argv = DbtRunner::command_line(
            &DbtCommand::Run,
            &[DbtFlag::switch("full-refresh"), DbtFlag::value("select", "orders")],
            &["--fail-fast".to_string()],
        );
        assert_eq!(argv, vec!["run", "--full-refresh", "--select", "orders", "--fail-fast"]);
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout() {
        let runner = DbtRunner::new(Path::new(".")).with_executable("echo");
        let output = runner.run(&DbtCommand::Compile, &[], &[]).unwrap();
        assert_eq!(output.stdout, "compile\n");
    }

    #[cfg(unix)]
    #[test]
    fn error_marker_on_stdout_fails() {
        let runner = DbtRunner::new(Path::new(".")).with_executable("echo");
        let err = runner
            .run(&DbtCommand::Run, &[], &["Encountered an error".to_string()])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalCallFailed);
        assert_eq!(err.name, "dbt-command-failed");
        assert_eq!(err.exit_code(), 102);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_fails() {
        let runner = DbtRunner::new(Path::new(".")).with_executable("false");
        let err = runner.run(&DbtCommand::Test, &[], &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalCallFailed);
    }

    #[test]
    fn missing_executable_fails() {
        let runner = DbtRunner::new(Path::new(".")).with_executable("dbtea-no-such-dbt-binary");
        let err = runner.run(&DbtCommand::Debug, &[], &[]).unwrap_err();
        assert_eq!(err.title, "dbt command could not be started");
    }
}
