//! JSON tree documents.
//!
//! ```json
//! {
//!   "attributes": { "author": "lab" },
//!   "children": {
//!     "run_1": {
//!       "kind": "group",
//!       "children": {
//!         "trace": { "kind": "dataset", "shape": [3], "dtype": "float64", "data": [0.1, null, 0.3] }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Dataset values are row-major; `null` stands for NaN.

use crate::error::{Result, StoreError};
use crate::store::{
    child_path, path_parts, resolve_columns, Attributes, AttrValue, Container, DType, Dataset, Node,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    children: BTreeMap<String, Entry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Entry {
    Group {
        #[serde(default)]
        attributes: Attributes,
        #[serde(default)]
        children: BTreeMap<String, Entry>,
    },
    Dataset {
        #[serde(default)]
        attributes: Attributes,
        shape: Vec<usize>,
        #[serde(default)]
        dtype: DType,
        data: Vec<Option<f64>>,
    },
}

/// A container backed by a JSON document, loaded whole on open.
#[derive(Clone, Debug)]
pub struct JsonContainer {
    path: PathBuf,
    doc: Document,
}

impl JsonContainer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let doc = serde_json::from_reader(BufReader::new(file))?;
        log::debug!("loaded {}", path.display());
        Ok(Self { path, doc })
    }

    /// An empty document that will be written to `path` on [`save`](Self::save).
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            doc: Document::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.doc)?;
        log::debug!("wrote {}", self.path.display());
        Ok(())
    }

    pub fn set_root_attribute(&mut self, key: &str, value: AttrValue) {
        self.doc.attributes.insert(key.to_string(), value);
    }

    /// Create the group at `path` and any missing parents.
    pub fn require_group(&mut self, path: &str) -> Result<()> {
        self.group_children_mut(path, true).map(|_| ())
    }

    /// Add or replace a group with the given attributes, creating parents.
    /// `/` sets the root attributes.
    pub fn insert_group(&mut self, path: &str, attributes: Attributes) -> Result<()> {
        let Some((parent, name)) = split_last(path) else {
            self.doc.attributes = attributes;
            return Ok(());
        };
        let siblings = self.group_children_mut(&parent, true)?;
        match siblings.get_mut(&name) {
            Some(Entry::Group { attributes: existing, .. }) => *existing = attributes,
            Some(Entry::Dataset { .. }) => return Err(StoreError::NotAGroup(path.to_string())),
            None => {
                siblings.insert(
                    name,
                    Entry::Group {
                        attributes,
                        children: BTreeMap::new(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Add or replace a dataset, creating parents.
    pub fn insert_dataset(&mut self, path: &str, dataset: &Dataset, attributes: Attributes) -> Result<()> {
        let (parent, name) = split_last(path).ok_or_else(|| StoreError::NotADataset(path.to_string()))?;
        let expected: usize = dataset.shape.iter().product();
        if expected != dataset.values.len() {
            return Err(StoreError::Shape {
                path: path.to_string(),
                expected,
                actual: dataset.values.len(),
            });
        }
        let siblings = self.group_children_mut(&parent, true)?;
        if matches!(siblings.get(&name), Some(Entry::Group { .. })) {
            return Err(StoreError::NotADataset(path.to_string()));
        }
        siblings.insert(
            name,
            Entry::Dataset {
                attributes,
                shape: dataset.shape.clone(),
                dtype: dataset.dtype.clone(),
                data: dataset.values.iter().map(|v| v.is_finite().then_some(*v)).collect(),
            },
        );
        Ok(())
    }

    fn group_children_mut(&mut self, path: &str, create: bool) -> Result<&mut BTreeMap<String, Entry>> {
        let mut children = &mut self.doc.children;
        for part in path_parts(path) {
            if create && !children.contains_key(part) {
                children.insert(
                    part.to_string(),
                    Entry::Group {
                        attributes: Attributes::new(),
                        children: BTreeMap::new(),
                    },
                );
            }
            children = match children.get_mut(part) {
                Some(Entry::Group { children, .. }) => children,
                Some(Entry::Dataset { .. }) => return Err(StoreError::NotAGroup(path.to_string())),
                None => return Err(StoreError::NotFound(path.to_string())),
            };
        }
        Ok(children)
    }

    fn entry(&self, path: &str) -> Result<&Entry> {
        let mut children = &self.doc.children;
        let mut found: Option<&Entry> = None;
        for part in path_parts(path) {
            if let Some(Entry::Dataset { .. }) = found {
                return Err(StoreError::NotFound(path.to_string()));
            }
            let entry = children.get(part).ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            if let Entry::Group { children: next, .. } = entry {
                children = next;
            }
            found = Some(entry);
        }
        found.ok_or_else(|| StoreError::NotADataset(path.to_string()))
    }
}

impl Container for JsonContainer {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load_structure(&self) -> Result<Node> {
        let mut root = Node::root(self.doc.attributes.clone());
        root.children = build_nodes("/", &self.doc.children);
        root.sort_naturally();
        Ok(root)
    }

    fn read_dataset(&self, path: &str) -> Result<Dataset> {
        match self.entry(path)? {
            Entry::Dataset {
                attributes,
                shape,
                dtype,
                data,
            } => {
                let expected: usize = shape.iter().product();
                if expected != data.len() {
                    return Err(StoreError::Shape {
                        path: path.to_string(),
                        expected,
                        actual: data.len(),
                    });
                }
                Ok(Dataset {
                    shape: shape.clone(),
                    dtype: dtype.clone(),
                    values: data.iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
                    columns: resolve_columns(attributes, dtype, shape),
                })
            }
            Entry::Group { .. } => Err(StoreError::NotADataset(path.to_string())),
        }
    }
}

fn build_nodes(parent: &str, children: &BTreeMap<String, Entry>) -> Vec<Node> {
    children
        .iter()
        .map(|(name, entry)| {
            let path = child_path(parent, name);
            match entry {
                Entry::Group { attributes, children } => {
                    let mut node = Node::group(name, &path, attributes.clone());
                    node.children = build_nodes(&path, children);
                    node
                }
                Entry::Dataset {
                    attributes, shape, dtype, ..
                } => Node::dataset(name, &path, attributes.clone(), shape.clone(), dtype.clone()),
            }
        })
        .collect()
}

/// `(parent, name)` of a path; `None` for the root.
fn split_last(path: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = path_parts(path).collect();
    let (name, parents) = parts.split_last()?;
    Some((format!("/{}", parents.join("/")), name.to_string()))
}
