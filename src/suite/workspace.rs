//! Per-case copies of the module directory
//!
//! Cases that run at the same time must not share a `.terraform` working
//! directory or local state, so each one gets its own copy in a temporary
//! directory. When the module references siblings by relative path
//! (`source = "../../"`), set `module.root` and the whole tree is copied
//! with the module at the same relative location.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::ModuleConfig;
use crate::error::{Error, Result};

/// Hidden entries are skipped, except these.
const KEPT_HIDDEN: &[&str] = &[".terraform.lock.hcl", ".terraform-version"];

pub struct Workspace {
    module: ModuleConfig,
    temp: Option<TempDir>,
}

impl Workspace {
    /// Run in place, no copy.
    pub fn in_place(module: &ModuleConfig) -> Result<Self> {
        module.validate()?;
        Ok(Self {
            module: module.clone(),
            temp: None,
        })
    }

    /// Copy `root` (or just the module directory) into a fresh temp directory.
    pub fn isolated(module: &ModuleConfig, root: Option<&Path>) -> Result<Self> {
        module.validate()?;

        let source_dir = module.directory();
        let root = root.unwrap_or(source_dir);
        let relative = relative_to(source_dir, root)?;

        let temp = tempfile::Builder::new()
            .prefix("infracheck-")
            .tempdir()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;
        copy_module_tree(root, temp.path())?;

        let copied = temp.path().join(relative);
        tracing::debug!(
            from = %source_dir.display(),
            to = %copied.display(),
            "copied module to isolated workspace"
        );
        Ok(Self {
            module: module.relocated(copied),
            temp: Some(temp),
        })
    }

    pub fn module(&self) -> &ModuleConfig {
        &self.module
    }

    /// Keep the copy on disk, e.g. because it holds state of resources that
    /// could not be destroyed. Returns where it is.
    pub fn persist(&mut self) -> PathBuf {
        match self.temp.take() {
            Some(temp) => {
                let path = temp.keep();
                tracing::warn!("kept workspace with state at {}", path.display());
                path
            }
            None => self.module.directory().to_path_buf(),
        }
    }
}

/// `dir` relative to `root`, comparing canonical paths when the plain ones
/// differ only by symlinks or `..`.
fn relative_to(dir: &Path, root: &Path) -> Result<PathBuf> {
    if let Ok(relative) = dir.strip_prefix(root) {
        return Ok(relative.to_path_buf());
    }
    let canonical = |p: &Path| p.canonicalize().map_err(|e| Error::io(p, e));
    canonical(dir)?
        .strip_prefix(canonical(root)?)
        .map(Path::to_path_buf)
        .map_err(|_| {
            Error::InvalidConfig(format!(
                "module directory {} is not inside root {}",
                dir.display(),
                root.display()
            ))
        })
}

fn should_copy(name: &str) -> bool {
    if name.ends_with(".tfstate") || name.ends_with(".tfstate.backup") {
        return false;
    }
    !name.starts_with('.') || KEPT_HIDDEN.contains(&name)
}

fn copy_module_tree(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|e| Error::io(to, e))?;
    for entry in fs::read_dir(from).map_err(|e| Error::io(from, e))? {
        let entry = entry.map_err(|e| Error::io(from, e))?;
        let name = entry.file_name();
        if !should_copy(&name.to_string_lossy()) {
            continue;
        }
        let src = entry.path();
        let dst = to.join(&name);
        let file_type = entry.file_type().map_err(|e| Error::io(&src, e))?;
        if file_type.is_dir() {
            copy_module_tree(&src, &dst)?;
        } else {
            // Follows symlinks, so linked files arrive as regular files
            fs::copy(&src, &dst).map_err(|e| Error::io(&src, e))?;
        }
    }
    Ok(())
}
