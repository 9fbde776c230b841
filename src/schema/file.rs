//! File upload checks.
//!
//! A file field holds a list of `{name, size}` records. The check activates
//! when the node is a file input (`x-jsf-presentation.inputType == "file"`)
//! or declares `accept` / `maxFileSize`.

use serde_json::Value;

use super::{format_number, SchemaObject};
use crate::error::{ErrorKind, SchemaError};
use crate::path::JsonPath;

const BYTES_PER_KIB: f64 = 1024.0;

struct FileEntry<'v> {
    name: &'v str,
    size: f64,
}

pub(super) fn validate_file(node: &SchemaObject, value: &Value, path: &JsonPath) -> Vec<SchemaError> {
    let Some(presentation) = &node.presentation else {
        return Vec::new();
    };
    let is_file_input = presentation.input_type.as_deref() == Some("file")
        || presentation.accept.is_some()
        || presentation.max_file_size.is_some();
    if !is_file_input || value.is_null() {
        return Vec::new();
    }

    let Some(files) = parse_files(value) else {
        return vec![node.violation(ErrorKind::FileStructure, path, value, "Not a valid file.")];
    };

    let mut errors = Vec::new();
    if let Some(limit) = &presentation.max_file_size {
        let max_bytes = limit.as_f64().unwrap_or(f64::INFINITY) * BYTES_PER_KIB;
        if files.iter().any(|file| file.size > max_bytes) {
            errors.push(node.violation(
                ErrorKind::MaxFileSize,
                path,
                value,
                format!("File size too large. The limit is {} KB.", format_number(limit)),
            ));
        }
    }

    if let Some(accept) = &presentation.accept {
        let allowed = accepted_extensions(accept);
        if !files.is_empty() && !allowed.is_empty() && !files.iter().any(|f| has_extension(f.name, &allowed)) {
            errors.push(node.violation(
                ErrorKind::Accept,
                path,
                value,
                format!("Unsupported file format. The acceptable formats are {}.", accept),
            ));
        }
    }

    errors
}

fn parse_files(value: &Value) -> Option<Vec<FileEntry<'_>>> {
    value
        .as_array()?
        .iter()
        .map(|entry| {
            Some(FileEntry {
                name: entry.get("name")?.as_str()?,
                size: entry.get("size")?.as_f64()?,
            })
        })
        .collect()
}

fn accepted_extensions(accept: &str) -> Vec<String> {
    accept
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn has_extension(name: &str, allowed: &[String]) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}
