//! Command name to program resolution

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use carpark_core::prelude::*;

/// How to launch the program behind one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Run `script` through an interpreter command line such as `["python3", "-u"]`.
    ///
    /// Returns `None` when the interpreter list is empty.
    pub fn script(interpreter: &[String], script: &Path) -> Option<Self> {
        let (program, leading) = interpreter.split_first()?;
        let mut args = leading.to_vec();
        args.push(script.to_string_lossy().into_owned());
        Some(Self::new(program.clone(), args))
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Human-readable command line for logs
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Static lookup table from command name to [`LaunchSpec`]
#[derive(Debug, Clone, Default)]
pub struct ScriptResolver {
    entries: BTreeMap<String, LaunchSpec>,
}

impl ScriptResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a command
    pub fn insert(&mut self, command: impl Into<String>, spec: LaunchSpec) {
        self.entries.insert(command.into(), spec);
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with(mut self, command: impl Into<String>, spec: LaunchSpec) -> Self {
        self.insert(command, spec);
        self
    }

    /// Look up the launch spec for `command`
    pub fn resolve(&self, command: &str) -> Result<&LaunchSpec> {
        self.entries
            .get(command)
            .ok_or_else(|| Error::unknown_command(command))
    }

    /// Registered command names, sorted
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
