//! Default refinement strategy.
//!
//! Applications: spelling correction against known names, then cheap name
//! rewrites. Files and directories: a not-found target triggers a bounded
//! breadth-first search from the nearest listable ancestor; a malformed one
//! is normalized first and then looked up under the configured search roots.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::variants;
use super::{RefineRequest, Refinement, RefinementStrategy};
use crate::domain::{DomainTag, FailureCategory, Operation, ParamSet};
use crate::executor::{ListingEntry, OperationExecutor, OperationRequest, check_path_format, parse_listing};

/// Ancestors tried when looking for a listable starting directory
const MAX_CLIMB: usize = 16;

/// Configuration for the heuristic refiner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RefinerConfig {
    /// Application names used for spelling correction
    pub known_applications: Vec<String>,
    /// Directories where a misplaced file may live
    pub search_roots: Vec<String>,
    /// How many levels below the starting directory to search
    pub max_explore_depth: usize,
    /// Upper bound on directories listed per refinement
    pub max_explore_dirs: usize,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        let search_roots = [dirs::home_dir(), dirs::document_dir(), dirs::desktop_dir()]
            .into_iter()
            .flatten()
            .map(|p| p.display().to_string())
            .collect();

        Self {
            known_applications: [
                "notepad",
                "calculator",
                "calc",
                "code",
                "explorer",
                "mspaint",
                "terminal",
                "firefox",
                "chrome",
                "spotify",
                "slack",
                "discord",
                "teams",
                "outlook",
                "word",
                "excel",
                "powerpoint",
                "gedit",
                "vlc",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            search_roots,
            max_explore_depth: 3,
            max_explore_dirs: 64,
        }
    }
}

/// Refiner using spelling correction, path normalization and directory search
pub struct HeuristicRefiner {
    config: RefinerConfig,
    executor: Option<Arc<dyn OperationExecutor>>,
}

impl HeuristicRefiner {
    /// Refiner without directory exploration
    pub fn new(config: RefinerConfig) -> Self {
        Self { config, executor: None }
    }

    /// Use `executor` to list directories while searching for files
    pub fn with_executor(mut self, executor: Arc<dyn OperationExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn config(&self) -> &RefinerConfig {
        &self.config
    }

    fn refine_application(&self, request: &RefineRequest<'_>) -> Refinement {
        let original = request.task.target().unwrap_or_default();
        let closest: Vec<String> = variants::closest_names(original, &self.config.known_applications)
            .into_iter()
            .map(String::from)
            .collect();
        let rewrites = variants::name_variants(original);

        let candidates = if request.failure.category == FailureCategory::MalformedInput {
            rewrites.into_iter().chain(closest)
        } else {
            closest.into_iter().chain(rewrites)
        };

        let current = request.current().get("name").unwrap_or(original);
        for candidate in candidates {
            if let Some(params) = request.untried_with_target(&candidate) {
                return Refinement::retry(params, format!("trying '{}' instead of '{}'", candidate, current));
            }
        }
        give_up(request, Vec::new())
    }

    async fn refine_path(&self, request: &RefineRequest<'_>) -> Refinement {
        let key = request.task.operation().target_param();
        let original = request.task.target().unwrap_or_default();
        let current = request.current().get(key).unwrap_or(original);

        match request.failure.category {
            FailureCategory::NotFound | FailureCategory::PermissionDenied => {
                let anchor = if check_path_format(original).is_none() { original } else { current };
                let (hit, explored) = self.explore(request, anchor).await;
                if let Some((params, note)) = hit {
                    return retry_explored(params, explored, note);
                }
                if let Some((params, note)) = self.from_search_roots(request, anchor) {
                    return retry_explored(params, explored, note);
                }
                give_up(request, explored)
            }
            FailureCategory::MalformedInput | FailureCategory::Unknown => {
                let normalized = variants::path_variants(original)
                    .into_iter()
                    .chain(variants::path_variants(current));
                for candidate in normalized {
                    if let Some(params) = request.untried_with_target(&candidate) {
                        return Refinement::retry(params, format!("normalized path to '{}'", candidate));
                    }
                }
                let anchor = variants::path_variants(original)
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| original.to_string());
                if let Some((params, note)) = self.from_search_roots(request, &anchor) {
                    return Refinement::retry(params, note);
                }
                let (hit, explored) = self.explore(request, &anchor).await;
                match hit {
                    Some((params, note)) => retry_explored(params, explored, note),
                    None => give_up(request, explored),
                }
            }
        }
    }

    /// The target's file name under each search root
    fn from_search_roots(&self, request: &RefineRequest<'_>, anchor: &str) -> Option<(ParamSet, String)> {
        if !guessing_allowed(request.task.operation()) {
            return None;
        }
        let name = variants::file_name(anchor)?;
        self.config.search_roots.iter().find_map(|root| {
            let candidate = variants::join(root, name);
            request
                .untried_with_target(&candidate)
                .map(|params| (params, format!("looking for '{}' under {}", name, root)))
        })
    }

    /// Breadth-first search for an entry named like the anchor's last component
    async fn explore(&self, request: &RefineRequest<'_>, anchor: &str) -> (Option<(ParamSet, String)>, Vec<String>) {
        let mut explored = Vec::new();
        let Some(name) = variants::file_name(anchor) else {
            return (None, explored);
        };
        let operation = request.task.operation();
        let want_dir = operation == Operation::ListDirectory;

        let Some((start, entries)) = self.listable_ancestor(anchor).await else {
            return (None, explored);
        };

        let mut pending = Some(entries);
        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut guesses = Vec::new();

        while let Some((dir, depth)) = queue.pop_front() {
            if explored.len() >= self.config.max_explore_dirs {
                break;
            }
            let entries = match pending.take() {
                Some(entries) => entries,
                None => match self.list(&dir).await {
                    Some(entries) => entries,
                    None => continue,
                },
            };
            explored.push(dir.clone());

            for entry in &entries {
                let path = variants::join(&dir, &entry.name);
                if entry.is_dir == want_dir && entry.name.eq_ignore_ascii_case(name) {
                    if let Some(params) = request.untried_with_target(&path) {
                        log::debug!("Found {} after listing {} directories", path, explored.len());
                        return (Some((params, format!("found '{}' at {}", name, path))), explored);
                    }
                }
                if entry.is_dir && depth < self.config.max_explore_depth {
                    queue.push_back((path, depth + 1));
                }
            }
            guesses.push(variants::join(&dir, name));
        }

        if guessing_allowed(operation) {
            for guess in guesses {
                if let Some(params) = request.untried_with_target(&guess) {
                    return (Some((params, format!("guessing '{}'", guess))), explored);
                }
            }
        }
        (None, explored)
    }

    /// Nearest ancestor of `path` the executor can list, with its entries
    async fn listable_ancestor(&self, path: &str) -> Option<(String, Vec<ListingEntry>)> {
        let mut dir = variants::parent(path).unwrap_or_else(|| ".".to_string());
        for _ in 0..MAX_CLIMB {
            if let Some(entries) = self.list(&dir).await {
                return Some((dir, entries));
            }
            match variants::parent(&dir) {
                Some(up) if up != dir => dir = up,
                _ => break,
            }
        }
        None
    }

    async fn list(&self, dir: &str) -> Option<Vec<ListingEntry>> {
        let executor = self.executor.as_ref()?;
        let request = OperationRequest::new(
            Operation::ListDirectory,
            ParamSet::new().with("directory_path", dir),
        );
        match executor.execute(&request).await {
            Ok(response) if response.success => parse_listing(&response.detail_or_content),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Listing {} failed: {}", dir, e);
                None
            }
        }
    }
}

#[async_trait]
impl RefinementStrategy for HeuristicRefiner {
    async fn refine(&self, request: &RefineRequest<'_>) -> Refinement {
        match request.task.domain() {
            DomainTag::Application => self.refine_application(request),
            DomainTag::File | DomainTag::Editor => self.refine_path(request).await,
        }
    }
}

/// Only read-only operations may be pointed at a location that was not seen
fn guessing_allowed(operation: Operation) -> bool {
    !operation.is_mutating()
}

fn retry_explored(params: ParamSet, explored: Vec<String>, note: String) -> Refinement {
    Refinement::Retry { params, explored, note }
}

fn give_up(request: &RefineRequest<'_>, explored: Vec<String>) -> Refinement {
    let key = request.task.operation().target_param();
    Refinement::GiveUp {
        reason: format!(
            "no untried alternative for '{}' after {} failure",
            request.current().get(key).unwrap_or_default(),
            request.failure.category
        ),
        explored,
    }
}
