//! Task, operation, and parameter types
//!
//! A Task is one user-level automation intent. It is validated once when it is
//! built and never changes afterwards; the controller only ever reads it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DeskloopError, Result};
use crate::id::generate_task_id;

/// The automation domain a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainTag {
    Application,
    File,
    Editor,
}

impl DomainTag {
    /// Every domain, in routing order
    pub fn all() -> [DomainTag; 3] {
        [DomainTag::Application, DomainTag::File, DomainTag::Editor]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainTag::Application => "application",
            DomainTag::File => "file",
            DomainTag::Editor => "editor",
        }
    }

    /// Attempt budget used when no configuration overrides it
    pub fn default_max_attempts(&self) -> u32 {
        match self {
            DomainTag::Application => 5,
            DomainTag::File | DomainTag::Editor => 10,
        }
    }
}

impl fmt::Display for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DomainTag {
    type Err = DeskloopError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "application" | "app" => Ok(DomainTag::Application),
            "file" => Ok(DomainTag::File),
            "editor" | "vscode" => Ok(DomainTag::Editor),
            other => Err(DeskloopError::UnknownDomain(other.to_string())),
        }
    }
}

/// A named operation offered by an executor.
///
/// The serialized names are the tool names the executors answer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "open_software")]
    OpenApplication,
    #[serde(rename = "read_file")]
    ReadFile,
    #[serde(rename = "list_items")]
    ListDirectory,
    #[serde(rename = "edit_file")]
    WriteFile,
    #[serde(rename = "open_file_in_vscode")]
    OpenInEditor,
    #[serde(rename = "edit_code")]
    EditInEditor,
}

impl Operation {
    pub fn all() -> [Operation; 6] {
        [
            Operation::OpenApplication,
            Operation::ReadFile,
            Operation::ListDirectory,
            Operation::WriteFile,
            Operation::OpenInEditor,
            Operation::EditInEditor,
        ]
    }

    /// Tool name on the executor side
    pub fn wire_name(&self) -> &'static str {
        match self {
            Operation::OpenApplication => "open_software",
            Operation::ReadFile => "read_file",
            Operation::ListDirectory => "list_items",
            Operation::WriteFile => "edit_file",
            Operation::OpenInEditor => "open_file_in_vscode",
            Operation::EditInEditor => "edit_code",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|op| op.wire_name() == name)
    }

    pub fn domain(&self) -> DomainTag {
        match self {
            Operation::OpenApplication => DomainTag::Application,
            Operation::ReadFile | Operation::ListDirectory | Operation::WriteFile => DomainTag::File,
            Operation::OpenInEditor | Operation::EditInEditor => DomainTag::Editor,
        }
    }

    /// The parameter naming the resource the operation acts on.
    ///
    /// This is the parameter a refinement strategy rewrites between attempts.
    pub fn target_param(&self) -> &'static str {
        match self {
            Operation::OpenApplication => "name",
            Operation::ListDirectory => "directory_path",
            Operation::ReadFile | Operation::WriteFile | Operation::OpenInEditor | Operation::EditInEditor => {
                "file_path"
            }
        }
    }

    /// Parameters that must be present for a task to be accepted
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Operation::OpenApplication => &["name"],
            Operation::ReadFile | Operation::OpenInEditor => &["file_path"],
            Operation::ListDirectory => &["directory_path"],
            Operation::WriteFile | Operation::EditInEditor => &["file_path", "content"],
        }
    }

    /// True when the operation can change the filesystem.
    ///
    /// Opening a file in the editor counts: a missing file is created.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Operation::WriteFile | Operation::EditInEditor | Operation::OpenInEditor
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// An ordered set of string parameters.
///
/// Ordering keeps equality, hashing and display deterministic, which the
/// no-repeat check between attempts relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet(BTreeMap<String, String>);

impl ParamSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(k, v)| {
                // content can be long; it never identifies the resource
                if k == "content" && v.chars().count() > 40 {
                    let short: String = v.chars().take(40).collect();
                    format!("{}={}...", k, short)
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// One user-level automation intent routed through a control loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: String,
    description: String,
    domain: DomainTag,
    operation: Operation,
    params: ParamSet,
}

impl Task {
    /// Build and validate a task; the domain follows from the operation
    pub fn new(description: impl Into<String>, operation: Operation, params: ParamSet) -> Result<Self> {
        let task = Self {
            id: generate_task_id(),
            description: description.into(),
            domain: operation.domain(),
            operation,
            params,
        };
        task.validate()?;
        Ok(task)
    }

    /// Check the task is well-formed enough to enter a control loop.
    ///
    /// Failures here are input errors and are never retried.
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(DeskloopError::InvalidTask("description is required".into()));
        }
        if self.domain != self.operation.domain() {
            return Err(DeskloopError::InvalidTask(format!(
                "operation {} does not belong to domain {}",
                self.operation, self.domain
            )));
        }
        for key in self.operation.required_params() {
            if !self.params.contains(key) {
                return Err(DeskloopError::InvalidTask(format!(
                    "{} requires parameter '{}'",
                    self.operation, key
                )));
            }
        }
        let target = self.operation.target_param();
        if self.params.get(target).is_none_or(|v| v.trim().is_empty()) {
            return Err(DeskloopError::InvalidTask(format!("parameter '{}' must not be empty", target)));
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn domain(&self) -> DomainTag {
        self.domain
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Initial parameter set, as requested
    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    /// Value of the operation's target parameter
    pub fn target(&self) -> Option<&str> {
        self.params.get(self.operation.target_param())
    }
}
