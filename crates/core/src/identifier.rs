//! Upload identifiers derived from client-supplied file names.

use std::fmt;

/// Maximum identifier length in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// The key under which an upload is placed on disk.
///
/// An identifier is always a single safe path component: it can be joined
/// onto a storage root without escaping it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validate a bare identifier.
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(crate::Error::InvalidIdentifier(
                "identifier cannot be empty".to_string(),
            ));
        }
        if id.len() > MAX_IDENTIFIER_LEN {
            return Err(crate::Error::InvalidIdentifier(format!(
                "identifier must be at most {MAX_IDENTIFIER_LEN} bytes, got {}",
                id.len()
            )));
        }
        if id.starts_with('.') {
            return Err(crate::Error::InvalidIdentifier(format!(
                "identifier cannot start with '.': {id}"
            )));
        }
        if id.contains("..") {
            return Err(crate::Error::InvalidIdentifier(format!(
                "identifier cannot contain '..': {id}"
            )));
        }
        for c in id.chars() {
            if !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.') {
                return Err(crate::Error::InvalidIdentifier(format!(
                    "invalid character in identifier: {c:?}"
                )));
            }
        }
        Ok(Self(id))
    }

    /// Split an uploaded file name into an identifier and its extension.
    ///
    /// The extension is whatever follows the final dot. Leading dots never
    /// start an extension, so `.env` has none. File names carrying a
    /// directory part are rejected rather than stripped.
    pub fn from_file_name(file_name: &str) -> crate::Result<(Self, Option<String>)> {
        if file_name.contains('/') || file_name.contains('\\') {
            return Err(crate::Error::InvalidIdentifier(format!(
                "file name cannot contain a path separator: {file_name}"
            )));
        }

        let (stem, extension) = split_extension(file_name);
        Ok((Self::new(stem)?, extension.map(str::to_string)))
    }

    /// Get the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    let leading_dots = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name[leading_dots..].rfind('.') {
        Some(pos) => {
            let dot = leading_dots + pos;
            (&file_name[..dot], Some(&file_name[dot + 1..]))
        }
        None => (file_name, None),
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
