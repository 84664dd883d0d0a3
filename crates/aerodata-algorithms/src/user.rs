//! User-extension directory handling.
//!
//! The per-user configuration directory carries a `user_algorithms/` tree
//! with one subdirectory per category, each seeded with a module stub.
//! The tree is created on first run; at startup the scan reports what it
//! finds and registration happens through [`Catalog::register`]. Scan
//! failures are logged at ERROR and never abort startup.

use std::fs;
use std::path::{Path, PathBuf};

use aerodata_core::{CoreError, CoreResult};
use tracing::{debug, error, info};

use crate::{Catalog, Category};

/// Name of the extension tree inside the configuration directory.
pub const USER_TREE: &str = "user_algorithms";

/// Create the `user_algorithms/` tree (seven category directories, each
/// with a module stub) when absent. Returns the tree's path. Safe to call
/// repeatedly.
pub fn ensure_user_tree(config_dir: &Path) -> CoreResult<PathBuf> {
    let tree = config_dir.join(USER_TREE);
    for category in Category::ALL {
        let dir = tree.join(category.dir_name());
        fs::create_dir_all(&dir).map_err(|e| {
            CoreError::Config(format!("cannot create {}: {}", dir.display(), e))
        })?;
        let stub = dir.join("mod.rs");
        if !stub.exists() {
            let text = format!("//! User-defined {} algorithms.\n", category.dir_name());
            fs::write(&stub, text).map_err(|e| {
                CoreError::Config(format!("cannot write {}: {}", stub.display(), e))
            })?;
        }
    }
    debug!(tree = %tree.display(), "user algorithm tree ready");
    Ok(tree)
}

/// Scan the extension tree for user module files. Unreadable directories
/// are logged and skipped; the scan itself never fails.
pub fn scan_user_tree(tree: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for category in Category::ALL {
        let dir = tree.join(category.dir_name());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(dir = %dir.display(), "cannot scan user algorithms: {}", e);
                continue;
            }
        };
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    error!(dir = %dir.display(), "cannot read directory entry: {}", e);
                    continue;
                }
            };
            if path.extension().is_some_and(|ext| ext == "rs")
                && path.file_name().is_some_and(|name| name != "mod.rs")
            {
                found.push(path);
            }
        }
    }
    found
}

/// Bootstrap the user-extension machinery: ensure the tree exists under
/// the configuration directory and report discovered user modules. The
/// catalog is returned untouched apart from whatever the caller has
/// registered; compiled-in extensions register themselves through
/// [`Catalog::register`].
pub fn bootstrap(catalog: &mut Catalog, config_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let tree = ensure_user_tree(config_dir)?;
    let found = scan_user_tree(&tree);
    if !found.is_empty() {
        info!(
            modules = found.len(),
            registered = catalog.len(),
            "user algorithm modules discovered; register them via Catalog::register"
        );
    }
    Ok(found)
}
