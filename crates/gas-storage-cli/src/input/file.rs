use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Load a pricing request (or any JSON document) from `path`.
///
/// Errors name the resolved path so a relative `--input` is easy to trace.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let file = resolve_path(path)?;
    let contents = fs::read_to_string(&file)
        .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("Invalid JSON request in '{}': {}", file.display(), e).into())
}

/// Resolve `path` against the working directory and require that it names
/// an existing regular file. No sandboxing: any readable path is accepted.
pub fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let resolved = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    match fs::metadata(&resolved) {
        Ok(meta) if meta.is_file() => Ok(resolved),
        Ok(_) => Err(format!("Not a file: {}", resolved.display()).into()),
        Err(_) => Err(format!("File not found: {}", resolved.display()).into()),
    }
}
