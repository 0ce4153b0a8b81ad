//! Filesystem executor.
//!
//! Every path operation checks existence and type before acting and returns
//! a specific failure kind (not found, is-directory, permission denied, io)
//! instead of a generic error.

use serde_json::json;
use shared::tool::{ActionOutcome, ExecutorError, FileOperation, WriteMode};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

pub struct FileExecutor;

impl FileExecutor {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, op: FileOperation) -> Result<ActionOutcome, ExecutorError> {
        debug!(kind = op.kind(), "executing file operation");

        match op {
            FileOperation::Read { path } => read_file(&path),
            FileOperation::Write { path, content, mode } => write_file(&path, &content, mode),
            FileOperation::List { path } => list_directory(&path),
            FileOperation::Delete { path } => delete_path(&path),
            FileOperation::Copy { src, dest } => copy_path(&src, &dest),
            FileOperation::Move { src, dest } => move_path(&src, &dest),
        }
    }
}

impl Default for FileExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> Result<ActionOutcome, ExecutorError> {
    if !path.exists() {
        return Err(ExecutorError::NotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        return Err(ExecutorError::IsDirectory(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ExecutorError::from_io(path, "error reading file", e))?;

    Ok(ActionOutcome::summary(format!(
        "Read {} characters from {}",
        content.chars().count(),
        path.display()
    ))
    .with_detail(json!({
        "path": path.display().to_string(),
        "length": content.chars().count(),
        "content": content,
    })))
}

fn write_file(path: &Path, content: &str, mode: WriteMode) -> Result<ActionOutcome, ExecutorError> {
    if path.is_dir() {
        return Err(ExecutorError::IsDirectory(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| ExecutorError::from_io(parent, "error creating directory", e))?;
        }
    }

    match mode {
        WriteMode::Overwrite => fs::write(path, content)
            .map_err(|e| ExecutorError::from_io(path, "error writing file", e))?,
        WriteMode::Append => {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ExecutorError::from_io(path, "error opening file", e))?;
            file.write_all(content.as_bytes())
                .map_err(|e| ExecutorError::from_io(path, "error writing file", e))?;
        }
    }

    Ok(ActionOutcome::summary(format!(
        "Content written to: {} ({} characters)",
        path.display(),
        content.chars().count()
    )))
}

fn list_directory(path: &Path) -> Result<ActionOutcome, ExecutorError> {
    if !path.exists() {
        return Err(ExecutorError::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(ExecutorError::NotADirectory(path.to_path_buf()));
    }

    let mut items = Vec::new();
    let entries =
        fs::read_dir(path).map_err(|e| ExecutorError::from_io(path, "error listing directory", e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| ExecutorError::from_io(path, "error listing directory", e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let meta = entry
            .metadata()
            .map_err(|e| ExecutorError::from_io(&entry.path(), "error reading metadata", e))?;
        if meta.is_dir() {
            items.push(format!("[DIR] {}", name));
        } else {
            items.push(format!("[FILE] {} ({} bytes)", name, meta.len()));
        }
    }
    items.sort();

    Ok(ActionOutcome::summary(format!(
        "Listed {} items in {}",
        items.len(),
        path.display()
    ))
    .with_detail(json!({
        "path": path.display().to_string(),
        "count": items.len(),
        "items": items,
    })))
}

fn delete_path(path: &Path) -> Result<ActionOutcome, ExecutorError> {
    if !path.exists() {
        return Err(ExecutorError::NotFound(path.to_path_buf()));
    }

    if path.is_dir() {
        fs::remove_dir_all(path)
            .map_err(|e| ExecutorError::from_io(path, "error deleting directory", e))?;
        Ok(ActionOutcome::summary(format!(
            "Directory deleted: {}",
            path.display()
        )))
    } else {
        fs::remove_file(path)
            .map_err(|e| ExecutorError::from_io(path, "error deleting file", e))?;
        Ok(ActionOutcome::summary(format!(
            "File deleted: {}",
            path.display()
        )))
    }
}

fn copy_path(src: &Path, dest: &Path) -> Result<ActionOutcome, ExecutorError> {
    if !src.exists() {
        return Err(ExecutorError::NotFound(src.to_path_buf()));
    }

    if src.is_dir() {
        copy_dir_recursive(src, dest)?;
        Ok(ActionOutcome::summary(format!(
            "Directory copied: {} -> {}",
            src.display(),
            dest.display()
        )))
    } else {
        fs::copy(src, dest).map_err(|e| ExecutorError::from_io(dest, "error copying file", e))?;
        Ok(ActionOutcome::summary(format!(
            "File copied: {} -> {}",
            src.display(),
            dest.display()
        )))
    }
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<(), ExecutorError> {
    fs::create_dir_all(dest)
        .map_err(|e| ExecutorError::from_io(dest, "error creating directory", e))?;
    let entries =
        fs::read_dir(src).map_err(|e| ExecutorError::from_io(src, "error listing directory", e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ExecutorError::from_io(src, "error listing directory", e))?;
        let target = dest.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| ExecutorError::from_io(&target, "error copying file", e))?;
        }
    }
    Ok(())
}

fn move_path(src: &Path, dest: &Path) -> Result<ActionOutcome, ExecutorError> {
    if !src.exists() {
        return Err(ExecutorError::NotFound(src.to_path_buf()));
    }

    if fs::rename(src, dest).is_err() {
        // Cross-device moves fall back to copy + delete.
        copy_path(src, dest)?;
        delete_path(src)?;
    }

    Ok(ActionOutcome::summary(format!(
        "File moved: {} -> {}",
        src.display(),
        dest.display()
    )))
}
