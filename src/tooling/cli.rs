//! CLI for browsing and reorganizing the content forest.
//!
//! Each invocation builds a fresh cache, performs one operation against the
//! content service, and prints the result. Commands that read the tree
//! expand folders on demand; `import` loads the full forest first so key
//! classification and video verdicts can see everything.

use crate::cache::ContentCache;
use crate::config::GroveConfig;
use crate::error::TreeError;
use crate::loader::TreeLoader;
use crate::mutation::MutationCoordinator;
use crate::ordering::OrderingEngine;
use crate::selector::{
    classify_key, folder_view, forest_view, ImportOutcome, ImportSelector, Selection,
};
use crate::tooling::render;
use crate::transport::{ContentTransport, FilePatch, HttpTransport};
use crate::types::{FileId, FolderId};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Grove CLI - course content tree client
#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Browse and reorganize course content folder trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Content service base URL (overrides configuration)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the master folder and the given course roots
    Roots {
        /// Course root folder ids
        #[arg(long = "course")]
        course_roots: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List a folder's immediate contents
    Ls {
        /// Folder id
        folder: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Expand a folder's subtree and print it
    Tree {
        /// Folder id
        folder: String,
        /// Maximum expansion depth below the folder
        #[arg(long)]
        depth: Option<usize>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a subfolder
    Mkdir {
        /// Parent folder id
        parent: String,
        /// Name of the new folder
        name: String,
    },
    /// Rename a folder
    Rename {
        /// Folder id
        folder: String,
        /// New name
        name: String,
    },
    /// Rename a file
    RenameFile {
        /// Containing folder id
        folder: String,
        /// File id
        file: String,
        /// New name
        name: String,
    },
    /// Delete a folder and its entire subtree
    Rm {
        /// Folder id
        folder: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Delete a file
    RmFile {
        /// Containing folder id
        folder: String,
        /// File id
        file: String,
    },
    /// Move files and folders into a destination folder
    Mv {
        /// Destination folder id
        destination: String,
        /// File ids to move
        #[arg(long = "file")]
        files: Vec<String>,
        /// Folder ids to move
        #[arg(long = "folder")]
        folders: Vec<String>,
    },
    /// Persist a new file order for a folder
    Reorder {
        /// Folder id
        folder: String,
        /// Complete new file id order
        #[arg(required = true)]
        file_ids: Vec<String>,
    },
    /// Select nodes anywhere in the forest and move them into a destination
    Import {
        /// Destination folder id
        destination: String,
        /// File or folder ids to import
        #[arg(required = true)]
        keys: Vec<String>,
        /// Only admit videos and all-video folder subtrees
        #[arg(long)]
        videos_only: bool,
        /// Course root folder ids to load alongside the master folder
        #[arg(long = "course")]
        course_roots: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Wires the cache, loader, coordinator, and selector over one transport.
pub struct CliContext {
    cache: Arc<ContentCache>,
    loader: Arc<TreeLoader>,
    coordinator: Arc<MutationCoordinator>,
    ordering: OrderingEngine,
    selector: ImportSelector,
}

impl CliContext {
    /// Create a new CLI context against the configured service.
    pub fn new(config: &GroveConfig) -> Result<Self, TreeError> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(
            &config.api,
        )?)))
    }

    /// Wire a context over an explicit transport.
    pub fn with_transport(transport: Arc<dyn ContentTransport>) -> Self {
        let cache = Arc::new(ContentCache::new());
        let loader = Arc::new(TreeLoader::new(Arc::clone(&cache), Arc::clone(&transport)));
        let coordinator = Arc::new(MutationCoordinator::new(
            Arc::clone(&cache),
            Arc::clone(&loader),
            Arc::clone(&transport),
        ));
        let ordering = OrderingEngine::new(Arc::clone(&cache), Arc::clone(&transport));
        let selector = ImportSelector::new(Arc::clone(&cache), Arc::clone(&coordinator));
        CliContext {
            cache,
            loader,
            coordinator,
            ordering,
            selector,
        }
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Execute a CLI command, returning the text to print.
    pub async fn execute(&self, command: &Commands) -> Result<String, TreeError> {
        match command {
            Commands::Roots {
                course_roots,
                format,
            } => {
                let roots = folder_ids(course_roots);
                let forest = self.loader.fetch_forest_roots(&roots).await?;
                let view = forest_view(&self.cache, &forest, &Selection::new());
                if format == "json" {
                    to_pretty_json(&view)
                } else {
                    Ok(render::format_forest_text(&view))
                }
            }
            Commands::Ls { folder, format } => {
                let id = FolderId::new(folder.clone());
                self.loader.expand(&id).await?;
                let view = folder_view(&self.cache, &Selection::new(), &id);
                if format == "json" {
                    to_pretty_json(&view)
                } else {
                    Ok(render::format_folder_listing(&view))
                }
            }
            Commands::Tree {
                folder,
                depth,
                format,
            } => {
                let id = FolderId::new(folder.clone());
                self.loader.expand_deep(&id, *depth).await?;
                let view = folder_view(&self.cache, &Selection::new(), &id);
                if format == "json" {
                    to_pretty_json(&view)
                } else {
                    Ok(render::format_folder_tree(&view))
                }
            }
            Commands::Mkdir { parent, name } => {
                let parent = FolderId::new(parent.clone());
                let created = self.coordinator.create_subfolder(&parent, name).await?;
                Ok(format!("Created folder {} under {}", created, parent))
            }
            Commands::Rename { folder, name } => {
                let id = FolderId::new(folder.clone());
                self.coordinator.rename_folder(&id, name).await?;
                Ok(format!("Renamed folder {} to \"{}\"", id, name))
            }
            Commands::RenameFile { folder, file, name } => {
                let folder = FolderId::new(folder.clone());
                let file = FileId::new(file.clone());
                self.coordinator
                    .update_file(&folder, &file, FilePatch::rename(name))
                    .await?;
                Ok(format!("Renamed file {} to \"{}\"", file, name))
            }
            Commands::Rm { folder, force } => {
                let id = FolderId::new(folder.clone());
                let node = self.loader.fetch_folder(&id).await?;
                if !force {
                    use dialoguer::Confirm;
                    let confirmed = Confirm::new()
                        .with_prompt(format!(
                            "Delete folder '{}' and all of its contents?",
                            node.name
                        ))
                        .interact()
                        .map_err(|e| {
                            TreeError::Config(format!("failed to get user input: {}", e))
                        })?;
                    if !confirmed {
                        return Ok("Deletion cancelled".to_string());
                    }
                }
                self.coordinator.delete_folder(&id).await?;
                Ok(format!("Deleted folder {}", id))
            }
            Commands::RmFile { folder, file } => {
                let folder = FolderId::new(folder.clone());
                let file = FileId::new(file.clone());
                self.coordinator.delete_file(&folder, &file).await?;
                Ok(format!("Deleted file {} from {}", file, folder))
            }
            Commands::Mv {
                destination,
                files,
                folders,
            } => {
                if files.is_empty() && folders.is_empty() {
                    return Ok("Nothing to move.".to_string());
                }
                let destination = FolderId::new(destination.clone());
                let files: Vec<FileId> =
                    files.iter().map(|s| FileId::new(s.clone())).collect();
                let folders = folder_ids(folders);
                let report = self
                    .coordinator
                    .move_nodes(&files, &folders, &destination)
                    .await?;
                Ok(render::format_move_report(&report))
            }
            Commands::Reorder { folder, file_ids } => {
                let id = FolderId::new(folder.clone());
                self.loader.expand(&id).await?;
                let order: Vec<FileId> =
                    file_ids.iter().map(|s| FileId::new(s.clone())).collect();
                self.ordering.reorder(&id, &order).await?;
                Ok(format!(
                    "Persisted new order of {} files in {}",
                    order.len(),
                    id
                ))
            }
            Commands::Import {
                destination,
                keys,
                videos_only,
                course_roots,
                format,
            } => {
                let roots = folder_ids(course_roots);
                let forest = self.loader.fetch_forest_roots(&roots).await?;
                for root in forest.roots() {
                    self.loader.expand_deep(root, None).await?;
                }

                let mut selection = Selection::new();
                for key in keys {
                    selection.insert(classify_key(&self.cache, key));
                }

                let destination = FolderId::new(destination.clone());
                match self
                    .selector
                    .import(&selection, &destination, *videos_only)
                    .await?
                {
                    ImportOutcome::NothingEligible => {
                        if format == "json" {
                            to_pretty_json(&json!({ "outcome": "nothingEligible" }))
                        } else {
                            Ok(render::format_warning(
                                "No eligible items in the selection; nothing was sent.",
                            ))
                        }
                    }
                    ImportOutcome::Moved(report) => {
                        if format == "json" {
                            to_pretty_json(&json!({
                                "outcome": "moved",
                                "movedFiles": report.moved_files,
                                "movedFolders": report.moved_folders,
                                "fileFailure": report.file_failure.as_ref().map(|e| e.to_string()),
                                "folderFailure": report.folder_failure.as_ref().map(|e| e.to_string()),
                            }))
                        } else {
                            Ok(render::format_move_report(&report))
                        }
                    }
                }
            }
        }
    }
}

fn folder_ids(raw: &[String]) -> Vec<FolderId> {
    raw.iter().map(|s| FolderId::new(s.clone())).collect()
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, TreeError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| TreeError::Config(format!("failed to encode json output: {}", e)))
}
