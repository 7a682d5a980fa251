use crate::{StorageError, StorageResult};

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: char = '/';

/// Storage path manipulation over a single separator character.
///
/// Purely computational: never touches any storage. Components are trimmed
/// and empty components are dropped, so `" /a//b / "` and `"/a/b"` denote the
/// same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathBuilder {
    separator: char,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
        }
    }
}

impl PathBuilder {
    /// Create a path builder for `separator`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidSeparator`] unless `separator` is exactly
    /// one non-whitespace character.
    pub fn new(separator: &str) -> StorageResult<Self> {
        let mut chars = separator.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() => Ok(Self { separator: c }),
            _ => Err(StorageError::InvalidSeparator(separator.to_owned())),
        }
    }

    /// The separator character.
    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Split `path` into trimmed, non-empty components.
    #[must_use]
    pub fn components<'a>(&self, path: &'a str) -> Vec<&'a str> {
        path.split(self.separator)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Build one path from path-like elements.
    ///
    /// Every element is split into its components first, so elements may
    /// themselves contain separators. An absolute path starts with the
    /// separator.
    #[must_use]
    pub fn build<I, S>(&self, elements: I, absolute: bool) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        if absolute {
            path.push(self.separator);
        }

        let mut first = true;
        for element in elements {
            for component in self.components(element.as_ref()) {
                if !first {
                    path.push(self.separator);
                }
                path.push_str(component);
                first = false;
            }
        }
        path
    }

    /// Normalize `path`: trimmed components, no doubled or trailing
    /// separators, absoluteness preserved.
    #[must_use]
    pub fn sanitize(&self, path: &str) -> String {
        self.build(self.components(path), self.is_absolute(path))
    }

    /// The parent of `path`, or `None` if it has no parent.
    #[must_use]
    pub fn dirname(&self, path: &str) -> Option<String> {
        let mut components = self.components(path);
        components.pop();
        if components.is_empty() {
            return None;
        }
        Some(self.build(components, self.is_absolute(path)))
    }

    /// Whether `path` starts with the separator once trimmed.
    #[must_use]
    pub fn is_absolute(&self, path: &str) -> bool {
        path.trim().starts_with(self.separator)
    }
}
