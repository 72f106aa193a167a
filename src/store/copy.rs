use super::{normalize_path, AttrValue, Container, Node, NodeKind};
use crate::error::{Result, StoreError};
use crate::formats::JsonContainer;
use std::fs;
use std::path::{Path, PathBuf};

/// Reduce a selection to the paths that need copying: normalized, shortest
/// first, with anything inside an already selected group dropped.
pub fn plan_copy(paths: &[String]) -> Vec<String> {
    let mut sorted: Vec<String> = paths.iter().map(|p| normalize_path(p)).collect();
    sorted.sort_by_key(|p| p.len());
    sorted.dedup();

    let mut plan: Vec<String> = Vec::new();
    for path in sorted {
        let covered = plan.iter().any(|parent| {
            let prefix = format!("{}/", parent.trim_end_matches('/'));
            path.starts_with(&prefix) || path == *parent
        });
        if !covered {
            plan.push(path);
        }
    }
    plan
}

/// Copy `paths` from `source` into a new JSON container at `dest`.
///
/// Parent groups are recreated empty; a non-empty `comment` is stored as
/// the `comment` and `description` root attributes. Paths missing from the
/// source are skipped. On failure the partially written destination is
/// removed. Returns the number of top-level items copied.
pub fn copy_items(source: &dyn Container, dest: &Path, paths: &[String], comment: &str) -> Result<usize> {
    if absolute(source.path()) == absolute(dest) {
        log::error!("source and destination are the same file: {}", dest.display());
        return Err(StoreError::SameFile(dest.to_path_buf()));
    }

    match write_copy(source, dest, paths, comment) {
        Ok(count) => {
            log::info!("copied {count} items to {}", dest.display());
            Ok(count)
        }
        Err(e) => {
            log::error!("copy to {} failed: {e}", dest.display());
            if dest.exists() {
                if let Err(rm) = fs::remove_file(dest) {
                    log::warn!("could not remove partial file {}: {rm}", dest.display());
                }
            }
            Err(e)
        }
    }
}

fn write_copy(source: &dyn Container, dest: &Path, paths: &[String], comment: &str) -> Result<usize> {
    let structure = source.load_structure()?;
    let mut out = JsonContainer::create(dest);
    if !comment.is_empty() {
        out.set_root_attribute("comment", AttrValue::from(comment));
        out.set_root_attribute("description", AttrValue::from(comment));
    }

    let mut count = 0;
    for path in plan_copy(paths) {
        let Some(node) = structure.find(&path) else {
            log::warn!("{path} not in {}, skipped", source.path().display());
            continue;
        };
        if path == "/" {
            let mut attrs = node.attributes.clone();
            if !comment.is_empty() {
                attrs.insert("comment".into(), AttrValue::from(comment));
                attrs.insert("description".into(), AttrValue::from(comment));
            }
            out.insert_group("/", attrs)?;
            for child in &node.children {
                copy_node(source, child, &mut out)?;
            }
        } else {
            copy_node(source, node, &mut out)?;
        }
        count += 1;
    }
    out.save()?;
    Ok(count)
}

fn copy_node(source: &dyn Container, node: &Node, out: &mut JsonContainer) -> Result<()> {
    match node.kind {
        NodeKind::Group => {
            out.insert_group(&node.path, node.attributes.clone())?;
            for child in &node.children {
                copy_node(source, child, out)?;
            }
        }
        NodeKind::Dataset => {
            let dataset = source.read_dataset(&node.path)?;
            out.insert_dataset(&node.path, &dataset, node.attributes.clone())?;
        }
    }
    Ok(())
}

/// Best-effort absolute form of a path that may not exist yet.
fn absolute(path: &Path) -> PathBuf {
    if let Ok(p) = fs::canonicalize(path) {
        return p;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}
