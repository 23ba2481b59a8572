//! In-process executor for the host machine.
//!
//! Status lines follow the phrasing of the remote tool servers so that the
//! same verifier works for both.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{ListingEntry, OperationExecutor, OperationRequest, OperationResponse, format_listing};
use crate::domain::Operation;
use crate::error::Result;

/// Characters that are never valid in a path handed to an executor
const RESERVED_PATH_CHARS: &[char] = &['<', '>', '|', '"', '?', '*'];

/// Configuration for the local executor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LocalExecutorConfig {
    /// Directories searched for applications (default: `$PATH`)
    pub app_search_path: Option<Vec<PathBuf>>,
    /// Extra arguments passed to every launched application
    pub app_args: Vec<String>,
    /// Editor program used to open files
    pub editor_command: String,
    /// Arguments placed before the file path
    pub editor_args: Vec<String>,
    /// Maximum size of returned file content
    pub max_output_bytes: usize,
}

impl Default for LocalExecutorConfig {
    fn default() -> Self {
        Self {
            app_search_path: None,
            app_args: Vec::new(),
            editor_command: "code".to_string(),
            editor_args: Vec::new(),
            max_output_bytes: 100_000,
        }
    }
}

/// Executes operations against the local filesystem and process table
pub struct LocalExecutor {
    config: LocalExecutorConfig,
}

impl LocalExecutor {
    pub fn new(config: LocalExecutorConfig) -> Self {
        Self { config }
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        match &self.config.app_search_path {
            Some(dirs) => dirs.clone(),
            None => std::env::var_os("PATH")
                .map(|p| std::env::split_paths(&p).collect())
                .unwrap_or_default(),
        }
    }

    /// Find an application binary by name in the search directories
    fn resolve_application(&self, name: &str) -> Option<PathBuf> {
        let lower = name.to_lowercase();
        let candidates = [name.to_string(), lower.clone(), format!("{}.exe", lower)];
        self.search_dirs().into_iter().find_map(|dir| {
            candidates
                .iter()
                .map(|c| dir.join(c))
                .find(|p| p.is_file())
        })
    }

    async fn open_application(&self, name: &str) -> OperationResponse {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name.chars().any(char::is_control) {
            return OperationResponse::error(format!("Failed to open application: invalid application name '{}'", name))
                .with_resource(name);
        }

        let Some(binary) = self.resolve_application(name) else {
            return OperationResponse::error(format!("Failed to open application: '{}' not found", name))
                .with_resource(name);
        };

        let spawned = Command::new(&binary)
            .args(&self.config.app_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(_) => {
                log::info!("Launched {} ({})", name, binary.display());
                OperationResponse::ok(format!("Application opened successfully: {}", name))
                    .with_resource(binary.display().to_string())
            }
            Err(e) => OperationResponse::error(format!(
                "Failed to open application: {}: {}",
                describe_io_error(&e),
                name
            ))
            .with_resource(binary.display().to_string()),
        }
    }

    async fn read_file(&self, path: &str) -> OperationResponse {
        if let Some(reason) = check_path_format(path) {
            return malformed("Error reading file", path, &reason);
        }
        // Binary and non-UTF-8 files are returned lossily rather than refused.
        match tokio::fs::read(path).await {
            Ok(bytes) => OperationResponse::ok(format!(
                "File content:\n{}",
                truncate_output(String::from_utf8_lossy(&bytes).into_owned(), self.config.max_output_bytes)
            ))
            .with_resource(path),
            Err(e) => io_failure("Error reading file", path, &e),
        }
    }

    async fn list_directory(&self, path: &str) -> OperationResponse {
        if let Some(reason) = check_path_format(path) {
            return malformed("Error listing items", path, &reason);
        }
        match read_entries(Path::new(path)).await {
            Ok(entries) => {
                let mut text = format_listing(path, &entries);
                if entries.is_empty() {
                    text.push_str("\n(empty directory)");
                }
                OperationResponse::ok(text).with_resource(path)
            }
            Err(e) => io_failure("Error listing items", path, &e),
        }
    }

    async fn write_file(&self, path: &str, content: &str, append: bool) -> std::io::Result<()> {
        if append {
            let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await
        } else {
            tokio::fs::write(path, content).await
        }
    }

    async fn edit_file(&self, path: &str, content: &str, append: bool) -> OperationResponse {
        if let Some(reason) = check_path_format(path) {
            return malformed("Error writing or editing file", path, &reason);
        }
        match self.write_file(path, content, append).await {
            Ok(()) if append => {
                OperationResponse::ok(format!("Content appended successfully. Path: {}", path)).with_resource(path)
            }
            Ok(()) => OperationResponse::ok(format!("File written/edited successfully. Path: {}", path)).with_resource(path),
            Err(e) => io_failure("Error writing or editing file", path, &e),
        }
    }

    /// Launch the editor on a path that is known to exist
    fn launch_editor(&self, path: &str) -> std::result::Result<(), String> {
        Command::new(&self.config.editor_command)
            .args(&self.config.editor_args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| {
                log::warn!("Editor '{}' failed to start: {}", self.config.editor_command, e);
                format!("editor command '{}' is unavailable", self.config.editor_command)
            })
    }

    async fn open_in_editor(&self, path: &str) -> OperationResponse {
        if let Some(reason) = check_path_format(path) {
            return malformed("Error opening file in editor", path, &reason);
        }
        // Missing files are created; missing directories are not.
        if tokio::fs::metadata(path).await.is_err() {
            if let Err(e) = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await {
                return io_failure("Error opening file in editor", path, &e);
            }
        }
        match self.launch_editor(path) {
            Ok(()) => OperationResponse::ok(format!("File opened successfully in editor: {}", path)).with_resource(path),
            Err(reason) => {
                OperationResponse::error(format!("Error opening file in editor: {}", reason)).with_resource(path)
            }
        }
    }

    async fn edit_in_editor(&self, path: &str, content: &str, append: bool) -> OperationResponse {
        if let Some(reason) = check_path_format(path) {
            return malformed("Error updating code", path, &reason);
        }
        if let Err(e) = self.write_file(path, content, append).await {
            return io_failure("Error updating code", path, &e);
        }
        match self.launch_editor(path) {
            Ok(()) => OperationResponse::ok(format!(
                "Code updated successfully. Path: {}, Changes made: {} {} bytes",
                path,
                if append { "appended" } else { "wrote" },
                content.len()
            ))
            .with_resource(path),
            Err(reason) => OperationResponse::error(format!("Error updating code: {}", reason)).with_resource(path),
        }
    }
}

#[async_trait]
impl OperationExecutor for LocalExecutor {
    async fn execute(&self, request: &OperationRequest) -> Result<OperationResponse> {
        let params = &request.parameters;
        let target = request.target().unwrap_or("");
        let content = params.get("content").unwrap_or("");
        let append = params.get("append").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        log::debug!("local {} {}", request.operation, params);

        let response = match request.operation {
            Operation::OpenApplication => self.open_application(target).await,
            Operation::ReadFile => self.read_file(target).await,
            Operation::ListDirectory => self.list_directory(target).await,
            Operation::WriteFile => self.edit_file(target, content, append).await,
            Operation::OpenInEditor => self.open_in_editor(target).await,
            Operation::EditInEditor => self.edit_in_editor(target, content, append).await,
        };
        Ok(response)
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Check a path for format problems; returns the reason if it is malformed
pub fn check_path_format(path: &str) -> Option<String> {
    if path.trim().is_empty() {
        return Some("path is empty".into());
    }
    if path.contains('\0') {
        return Some("path contains a NUL byte".into());
    }
    if let Some(c) = path.chars().find(|c| RESERVED_PATH_CHARS.contains(c)) {
        return Some(format!("path contains reserved character '{}'", c));
    }
    if is_windows_style(path) {
        let first = path.chars().next();
        for (idx, c) in path.char_indices() {
            if c == ':' && !(idx == 1 && first.is_some_and(|f| f.is_ascii_alphabetic())) {
                return Some("invalid drive specifier".into());
            }
        }
    }
    None
}

/// Drive colons only mean something in Windows paths; elsewhere `:` is a
/// legal file name character.
fn is_windows_style(path: &str) -> bool {
    let mut chars = path.chars();
    let drive_prefix = chars.next().is_some_and(|c| c.is_ascii_alphanumeric()) && chars.next() == Some(':');
    cfg!(windows) || path.contains('\\') || drive_prefix
}

async fn read_entries(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    let mut rd = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            is_dir,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn describe_io_error(err: &std::io::Error) -> String {
    match err.kind() {
        ErrorKind::NotFound => "not found".into(),
        ErrorKind::PermissionDenied => "access denied".into(),
        ErrorKind::InvalidInput => "invalid path format".into(),
        _ => err.to_string(),
    }
}

fn io_failure(prefix: &str, path: &str, err: &std::io::Error) -> OperationResponse {
    OperationResponse::error(format!("{}: {}: {}", prefix, describe_io_error(err), path)).with_resource(path)
}

fn malformed(prefix: &str, path: &str, reason: &str) -> OperationResponse {
    OperationResponse::error(format!("{}: invalid path format ({}): {}", prefix, reason, path)).with_resource(path)
}

fn truncate_output(mut output: String, max_bytes: usize) -> String {
    if output.len() > max_bytes {
        let mut cut = max_bytes;
        while !output.is_char_boundary(cut) {
            cut -= 1;
        }
        output.truncate(cut);
        output.push_str("\n... [output truncated]");
    }
    output
}
