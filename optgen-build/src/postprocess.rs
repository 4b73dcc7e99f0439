//! External formatting passes over the written file.

use std::fmt;
use std::path::Path;
use std::process::Command;

use log::debug;

use crate::error::{GenerateError, Result};

/// An external command run with the generated file path appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line on whitespace. `None` for a blank line.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace();
        let program = words.next()?;
        Some(Self::new(program, words))
    }

    /// `rustfmt --edition 2024`
    pub fn rustfmt() -> Self {
        Self::new("rustfmt", ["--edition", "2024"])
    }

    /// `rustfmt` with import grouping and merging enabled.
    ///
    /// The grouping options are only honoured by nightly rustfmt; stable
    /// rustfmt warns and still reorders imports.
    pub fn rustfmt_imports() -> Self {
        Self::new(
            "rustfmt",
            [
                "--edition",
                "2024",
                "--config",
                "reorder_imports=true,group_imports=StdExternalCrate,imports_granularity=Crate",
            ],
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run once against `file`. Spawn failure and non-zero exit are both errors.
    pub fn run(&self, file: &Path) -> Result<()> {
        debug!("running `{self} {}`", file.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(file)
            .output()
            .map_err(|e| GenerateError::Tool {
                tool: self.to_string(),
                status: None,
                stderr: e.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(GenerateError::Tool {
                tool: self.to_string(),
                status: Some(output.status),
                stderr,
            });
        }

        if !stderr.is_empty() {
            debug!("{}: {stderr}", self.program);
        }
        Ok(())
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Formatter followed by import organiser, both in place.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    pub formatter: ToolCommand,
    pub import_fixer: ToolCommand,
}

impl PostProcessor {
    pub fn run(&self, file: &Path) -> Result<()> {
        self.formatter.run(file)?;
        self.import_fixer.run(file)
    }
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self {
            formatter: ToolCommand::rustfmt(),
            import_fixer: ToolCommand::rustfmt_imports(),
        }
    }
}
