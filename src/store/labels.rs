use super::{Attributes, DType};

/// Column labels for a dataset.
///
/// Lookup order: `columns` attribute, `fields` attribute, compound field
/// names, then generated names (`Value` for 1-D, `Column_i` for 2-D,
/// `Dim_i` over the last axis otherwise).
pub fn resolve_columns(attributes: &Attributes, dtype: &DType, shape: &[usize]) -> Vec<String> {
    if let Some(cols) = attributes.get("columns").or_else(|| attributes.get("fields")) {
        return cols.as_strings();
    }
    if let DType::Compound(fields) = dtype {
        return fields.clone();
    }
    match shape {
        [] | [_] => vec!["Value".to_string()],
        [_, cols] => (0..*cols).map(|i| format!("Column_{i}")).collect(),
        [.., last] => (0..*last).map(|i| format!("Dim_{i}")).collect(),
    }
}

/// Label for column `index`, or a generated one when the list is short.
pub fn column_label(columns: &[String], index: usize) -> String {
    columns.get(index).cloned().unwrap_or_else(|| format!("Column_{index}"))
}
