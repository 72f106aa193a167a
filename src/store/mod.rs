//! Hierarchical container model: groups and datasets addressed by
//! `/`-separated paths, each carrying a set of attributes.

pub mod copy;
pub mod labels;
pub mod sort;

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub use copy::{copy_items, plan_copy};
pub use labels::resolve_columns;
pub use sort::{natural_cmp, natural_key};

pub type Attributes = BTreeMap<String, AttrValue>;

/// An attribute value as stored in a container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<AttrValue>),
}

impl AttrValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            AttrValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The value as a list of labels. A scalar becomes a one-element list.
    pub fn as_strings(&self) -> Vec<String> {
        match self {
            AttrValue::List(items) => items.iter().map(|v| v.to_string()).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Text(s) => f.write_str(s),
            AttrValue::List(items) => {
                f.write_str("[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

/// Element type of a dataset.
///
/// Compound datasets are stored as `[records, fields]` matrices with one
/// column per named field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    #[default]
    Float64,
    Float32,
    Int64,
    Int32,
    Int16,
    Int8,
    UInt8,
    Compound(Vec<String>),
    Text,
}

impl DType {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, DType::Text | DType::Compound(_))
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Float64 => f.write_str("float64"),
            DType::Float32 => f.write_str("float32"),
            DType::Int64 => f.write_str("int64"),
            DType::Int32 => f.write_str("int32"),
            DType::Int16 => f.write_str("int16"),
            DType::Int8 => f.write_str("int8"),
            DType::UInt8 => f.write_str("uint8"),
            DType::Compound(fields) => write!(f, "compound({})", fields.join(", ")),
            DType::Text => f.write_str("text"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Group,
    Dataset,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Group => f.write_str("group"),
            NodeKind::Dataset => f.write_str("dataset"),
        }
    }
}

/// One entry of the structure tree. Datasets carry shape and dtype but no
/// values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn root(attributes: Attributes) -> Self {
        Self::group("", "/", attributes)
    }

    pub fn group(name: &str, path: &str, attributes: Attributes) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind: NodeKind::Group,
            attributes,
            shape: None,
            dtype: None,
            children: Vec::new(),
        }
    }

    pub fn dataset(name: &str, path: &str, attributes: Attributes, shape: Vec<usize>, dtype: DType) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind: NodeKind::Dataset,
            attributes,
            shape: Some(shape),
            dtype: Some(dtype),
            children: Vec::new(),
        }
    }

    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    /// Look up a descendant by absolute path. `/` is this node.
    pub fn find(&self, path: &str) -> Option<&Node> {
        let mut node = self;
        for part in path_parts(path) {
            node = node.children.iter().find(|c| c.name == part)?;
        }
        Some(node)
    }

    /// Sort children at every level in natural order.
    pub fn sort_naturally(&mut self) {
        self.children.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        for child in &mut self.children {
            child.sort_naturally();
        }
    }
}

/// Shape, type and attributes of a dataset, read without its values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub size: usize,
    pub ndim: usize,
    pub attributes: Attributes,
}

impl DatasetInfo {
    pub fn from_node(node: &Node) -> Result<Self> {
        match (&node.kind, &node.shape, &node.dtype) {
            (NodeKind::Dataset, Some(shape), Some(dtype)) => Ok(Self {
                size: shape.iter().product(),
                ndim: shape.len(),
                shape: shape.clone(),
                dtype: dtype.clone(),
                attributes: node.attributes.clone(),
            }),
            _ => Err(StoreError::NotADataset(node.path.clone())),
        }
    }
}

/// Values of a dataset in row-major order with one label per column.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub values: Vec<f64>,
    pub columns: Vec<String>,
}

impl Dataset {
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(self.values.len())
    }

    pub fn ncols(&self) -> usize {
        match self.shape.as_slice() {
            [_, cols] => *cols,
            _ => 1,
        }
    }

    /// One channel of the dataset.
    ///
    /// A 1-D dataset is its own single channel. On a 2-D dataset an
    /// out-of-range column falls back to column 0.
    pub fn column(&self, index: usize) -> Result<Vec<f64>> {
        match self.rank() {
            0 | 1 => Ok(self.values.clone()),
            2 => {
                let cols = self.ncols();
                if cols == 0 {
                    return Ok(Vec::new());
                }
                let index = if index < cols {
                    index
                } else {
                    log::debug!("column {index} out of range ({cols} columns), using 0");
                    0
                };
                Ok(self.values.iter().skip(index).step_by(cols).copied().collect())
            }
            rank => Err(StoreError::Rank(rank)),
        }
    }

    /// Column index for a label, if any column carries it.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Column named by `name`, either a label or a numeric index. Labels
    /// win over indices.
    pub fn resolve_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .or_else(|| name.trim().parse().ok().filter(|&i| i < self.ncols()))
            .ok_or_else(|| StoreError::UnknownColumn(name.to_string()))
    }

    /// Row `r` of a 1-D or 2-D dataset.
    pub fn row(&self, r: usize) -> &[f64] {
        let cols = self.ncols();
        let start = r * cols;
        self.values.get(start..start + cols).unwrap_or(&[])
    }
}

/// A readable hierarchical data file.
pub trait Container {
    fn path(&self) -> &Path;

    /// The full tree, naturally sorted at every level.
    fn load_structure(&self) -> Result<Node>;

    fn read_dataset(&self, path: &str) -> Result<Dataset>;

    /// A dataset used as the X axis of another: the whole of a 1-D
    /// dataset, the first column of a 2-D one.
    fn read_axis(&self, path: &str) -> Result<Vec<f64>> {
        let axis = self.read_dataset(path)?.column(0)?;
        log::debug!("{path}: {} axis values", axis.len());
        Ok(axis)
    }

    fn dataset_info(&self, path: &str) -> Result<DatasetInfo> {
        let root = self.load_structure()?;
        let node = root.find(path).ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        DatasetInfo::from_node(node)
    }

    /// Attributes of any node; `/` addresses the root.
    fn attributes(&self, path: &str) -> Result<Attributes> {
        let root = self.load_structure()?;
        root.find(path)
            .map(|node| node.attributes.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }
}

/// One row of the flattened tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlatItem {
    pub path: String,
    pub kind: NodeKind,
    pub attributes: Attributes,
}

/// Depth-first listing of every node below `node`.
pub fn flatten(node: &Node) -> Vec<FlatItem> {
    let mut items = Vec::new();
    for child in &node.children {
        items.push(FlatItem {
            path: child.path.clone(),
            kind: child.kind,
            attributes: child.attributes.clone(),
        });
        items.extend(flatten(child));
    }
    items
}

/// 1-D or 2-D with a numeric or compound element type.
pub fn is_plottable(info: &DatasetInfo) -> bool {
    matches!(info.ndim, 1 | 2) && (info.dtype.is_numeric() || matches!(info.dtype, DType::Compound(_)))
}

/// Non-empty components of a `/`-separated path.
pub fn path_parts(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|p| !p.is_empty())
}

/// `path` with exactly one leading `/` and no trailing one.
pub fn normalize_path(path: &str) -> String {
    let joined = path_parts(path).collect::<Vec<_>>().join("/");
    format!("/{joined}")
}

/// Join a child name onto a parent path.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" || parent.is_empty() {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Node {
        let mut root = Node::root(Attributes::new());
        let mut g = Node::group("wave_10", "/wave_10", Attributes::new());
        g.children.push(Node::dataset("b", "/wave_10/b", Attributes::new(), vec![4], DType::Float64));
        g.children.push(Node::dataset("a", "/wave_10/a", Attributes::new(), vec![2, 3, 4], DType::Float64));
        root.children.push(g);
        root.children.push(Node::group("wave_2", "/wave_2", Attributes::new()));
        root.sort_naturally();
        root
    }

    #[test]
    fn test_natural_order_at_every_level() {
        let root = tree();
        let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["wave_2", "wave_10"]);
        assert_eq!(root.children[1].children[0].name, "a");
    }

    #[test]
    fn test_find_and_flatten() {
        let root = tree();
        assert_eq!(root.find("/").map(|n| n.path.as_str()), Some("/"));
        assert_eq!(root.find("wave_10/b/").map(|n| n.kind), Some(NodeKind::Dataset));
        assert!(root.find("/nope").is_none());

        let paths: Vec<_> = flatten(&root).into_iter().map(|i| i.path).collect();
        assert_eq!(paths, vec!["/wave_2", "/wave_10", "/wave_10/a", "/wave_10/b"]);
    }

    #[test]
    fn test_dataset_info_and_plottable() {
        let root = tree();
        let info = DatasetInfo::from_node(root.find("/wave_10/a").unwrap()).unwrap();
        assert_eq!((info.ndim, info.size), (3, 24));
        assert!(!is_plottable(&info));

        let info = DatasetInfo::from_node(root.find("/wave_10/b").unwrap()).unwrap();
        assert!(is_plottable(&info));

        let text = DatasetInfo { dtype: DType::Text, ..info.clone() };
        assert!(!is_plottable(&text));
        let compound = DatasetInfo {
            dtype: DType::Compound(vec!["t".into(), "v".into()]),
            ..info
        };
        assert!(is_plottable(&compound));

        assert!(matches!(
            DatasetInfo::from_node(root.find("/wave_2").unwrap()),
            Err(StoreError::NotADataset(_))
        ));
    }

    #[test]
    fn test_column_extraction() {
        let ds = Dataset {
            shape: vec![3, 2],
            dtype: DType::Float64,
            values: vec![0.0, 10.0, 1.0, 11.0, 2.0, 12.0],
            columns: vec!["time".into(), "signal".into()],
        };
        assert_eq!(ds.column(1).unwrap(), vec![10.0, 11.0, 12.0]);
        assert_eq!(ds.column(7).unwrap(), vec![0.0, 1.0, 2.0]);
        assert_eq!(ds.column_index("signal"), Some(1));
        assert_eq!(ds.rows(), 3);
        assert_eq!(ds.ncols(), 2);
        assert_eq!(ds.row(2), &[2.0, 12.0]);
        assert!(ds.row(3).is_empty());

        let cube = Dataset { shape: vec![1, 1, 1], values: vec![0.0], ..ds };
        assert!(matches!(cube.column(0), Err(StoreError::Rank(3))));
    }

    #[test]
    fn test_resolve_column() {
        let ds = Dataset {
            shape: vec![2, 3],
            dtype: DType::Float64,
            values: vec![0.0; 6],
            columns: vec!["time".into(), "2".into(), "b".into()],
        };
        assert_eq!(ds.resolve_column("b").unwrap(), 2);
        assert_eq!(ds.resolve_column("2").unwrap(), 1);
        assert_eq!(ds.resolve_column(" 0 ").unwrap(), 0);
        assert!(matches!(ds.resolve_column("3"), Err(StoreError::UnknownColumn(_))));
        assert!(matches!(
            ds.resolve_column("/separate_axes/time"),
            Err(StoreError::UnknownColumn(c)) if c == "/separate_axes/time"
        ));

        let flat = Dataset {
            shape: vec![4],
            values: vec![0.0; 4],
            columns: vec!["Value".into()],
            ..ds
        };
        assert_eq!(flat.rows(), 4);
        assert_eq!(flat.resolve_column("Value").unwrap(), 0);
        assert!(flat.resolve_column("1").is_err());
    }

    #[test]
    fn test_attr_values() {
        let cols = AttrValue::List(vec!["time".into(), "signal".into()]);
        assert_eq!(cols.as_strings(), vec!["time", "signal"]);
        assert_eq!(AttrValue::from("x").as_strings(), vec!["x"]);
        assert_eq!(AttrValue::Int(5).as_f64(), Some(5.0));
        assert_eq!(AttrValue::from(" 2.5 ").as_f64(), Some(2.5));
        assert_eq!(cols.to_string(), "[time, signal]");
    }

    #[test]
    fn test_paths() {
        assert_eq!(normalize_path("a/b/"), "/a/b");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(child_path("/", "a"), "/a");
        assert_eq!(child_path("/a", "b"), "/a/b");
    }
}
