//! Maps untrusted URL paths onto the served root.

use std::path::{Component, Path, PathBuf};

use crate::error::ServeError;

/// Percent-decodes a raw URL path.
///
/// Unlike [`urlencoding::decode`], a `%` that is not followed by two hex
/// digits is an error rather than being passed through.
pub fn decode_request_path(raw: &str) -> Result<String, ServeError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while let Some(offset) = bytes[i..].iter().position(|&b| b == b'%') {
        let at = i + offset;
        let well_formed = bytes
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(ServeError::InvalidEncoding(raw.to_string()));
        }
        i = at + 3;
    }

    let decoded = urlencoding::decode(raw)
        .map_err(|_| ServeError::InvalidEncoding(raw.to_string()))?
        .into_owned();
    if decoded.contains('\0') {
        return Err(ServeError::InvalidEncoding(raw.to_string()));
    }
    Ok(decoded)
}

/// Lexically collapses `.`, `..` and repeated separators.
///
/// `..` at the filesystem root stays at the root, the same way the kernel
/// treats `/..`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str())
            }
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
        }
    }
    out
}

/// Resolves `request_path` (prefix already stripped, still percent-encoded)
/// against `root`.
///
/// The decoded path is joined first and normalized afterwards, then checked
/// to still lie under `root`. `root` must already be absolute and normalized.
pub fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, ServeError> {
    let decoded = decode_request_path(request_path)?;

    let mut joined = root.to_path_buf();
    for segment in decoded.split('/').filter(|s| !s.is_empty()) {
        joined.push(segment);
    }
    let resolved = normalize(&joined);

    if !resolved.starts_with(root) {
        return Err(ServeError::PathTraversal {
            requested: decoded,
            resolved,
        });
    }
    Ok(resolved)
}

/// The resolved path relative to `root`, as plain (decoded) segments.
pub fn relative_segments(root: &Path, resolved: &Path) -> Vec<String> {
    resolved
        .strip_prefix(root)
        .map(|rel| {
            rel.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
