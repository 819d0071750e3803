// crates/landandbay-harness/src/module.rs
// ============================================================================
// Module: Module Layout Checks
// Description: Offline structure validation for terraform modules.
// Purpose: Catch missing module files before any cloud resources are created.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A terraform module directory must contain `main.tf`, `variables.tf`, and
//! `outputs.tf`. The check touches only the local filesystem.

use std::path::Path;
use std::path::PathBuf;

use crate::vars::ModuleKind;

/// Files every module directory must contain.
pub const REQUIRED_MODULE_FILES: [&str; 3] = ["main.tf", "variables.tf", "outputs.tf"];

/// Module layout failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    /// The kind has no module directory.
    #[error("module kind {0} has no directory")]
    NoDirectory(ModuleKind),
    /// The module directory does not exist.
    #[error("module directory {0} does not exist")]
    MissingDirectory(String),
    /// Required files are absent.
    #[error("module {dir} is missing {}", .files.join(", "))]
    MissingFiles {
        /// Module directory.
        dir: String,
        /// Absent file names.
        files: Vec<&'static str>,
    },
}

/// Returns the directory of a module under `modules_root`.
///
/// # Errors
///
/// Returns [`ModuleError::NoDirectory`] for [`ModuleKind::Other`].
pub fn module_dir(modules_root: &Path, kind: ModuleKind) -> Result<PathBuf, ModuleError> {
    kind.dir_name().map(|name| modules_root.join(name)).ok_or(ModuleError::NoDirectory(kind))
}

/// Checks that a module directory exists and holds the required files.
///
/// # Errors
///
/// Returns [`ModuleError`] naming the missing directory or files.
pub fn validate_module_structure(
    modules_root: &Path,
    kind: ModuleKind,
) -> Result<(), ModuleError> {
    let dir = module_dir(modules_root, kind)?;
    if !dir.is_dir() {
        return Err(ModuleError::MissingDirectory(dir.display().to_string()));
    }
    let files: Vec<&'static str> =
        REQUIRED_MODULE_FILES.into_iter().filter(|file| !dir.join(file).is_file()).collect();
    if files.is_empty() {
        Ok(())
    } else {
        Err(ModuleError::MissingFiles {
            dir: dir.display().to_string(),
            files,
        })
    }
}
