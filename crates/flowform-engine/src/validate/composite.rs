use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde_json::Value;

use flowform_spec::{Element, ElementType, TableColumn};

pub(super) fn check(kind: ElementType, element: &Element, value: Option<&Value>) -> Option<String> {
    match kind {
        ElementType::Table => check_table(element, value),
        ElementType::FileUpload => check_upload(element, value),
        ElementType::Replicating => check_replicating(element, value),
        _ => None,
    }
}

fn check_table(element: &Element, value: Option<&Value>) -> Option<String> {
    let Some(rows) = value.and_then(Value::as_array) else {
        return None;
    };
    let constraint = element.constraint.as_ref()?;
    if let Some(min) = constraint.min_rows
        && rows.len() < min
    {
        return Some("the table has too few rows".into());
    }
    if let Some(max) = constraint.max_rows
        && rows.len() > max
    {
        return Some("the table has too many rows".into());
    }
    for column in constraint.columns.iter().filter(|column| column.required) {
        if rows.iter().any(|row| cell_is_empty(row, column)) {
            return Some(format!(
                "column '{}' requires a value in every row",
                column.label.as_deref().unwrap_or(&column.id)
            ));
        }
    }
    None
}

fn cell_is_empty(row: &Value, column: &TableColumn) -> bool {
    match row.get(&column.id) {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn check_upload(element: &Element, value: Option<&Value>) -> Option<String> {
    let Some(files) = value.and_then(Value::as_array) else {
        return None;
    };
    let constraint = element.constraint.as_ref()?;
    if let Some(max) = constraint.max_files
        && files.len() > max
    {
        return Some("too many files".into());
    }
    let matcher = extension_matcher(&constraint.extensions);
    for file in files {
        let (name, size) = file_facts(file);
        if let Some(matcher) = &matcher
            && !matcher.is_match(name)
        {
            return Some("file type is not allowed".into());
        }
        if let Some(limit) = constraint.max_size_bytes
            && let Some(size) = size
            && size > limit
        {
            return Some("file exceeds the maximum size".into());
        }
    }
    None
}

/// A file entry is either a bare name or an object with `name` and `size`.
fn file_facts(file: &Value) -> (&str, Option<u64>) {
    match file {
        Value::String(name) => (name.as_str(), None),
        Value::Object(map) => (
            map.get("name").and_then(Value::as_str).unwrap_or(""),
            map.get("size").and_then(Value::as_u64),
        ),
        _ => ("", None),
    }
}

fn extension_matcher(extensions: &[String]) -> Option<GlobSet> {
    if extensions.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for extension in extensions {
        let pattern = if extension.contains('*') {
            extension.clone()
        } else {
            format!("*.{}", extension.trim_start_matches('.'))
        };
        match GlobBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(error) => {
                log::warn!("ignoring invalid extension pattern '{pattern}': {error}");
            }
        }
    }
    builder.build().ok()
}

fn check_replicating(element: &Element, value: Option<&Value>) -> Option<String> {
    let records = value.and_then(Value::as_array).map(Vec::len).unwrap_or(0);
    let constraint = element.constraint.as_ref()?;
    if let Some(min) = constraint.min_records
        && records < min
    {
        return Some("not enough entries".into());
    }
    if let Some(max) = constraint.max_records
        && records > max
    {
        return Some("too many entries".into());
    }
    None
}
