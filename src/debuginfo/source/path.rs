//! Document path normalization.
//!
//! Two spellings of one file must end up as the same document. With a base directory
//! configured, relative paths are joined to it and `.`/`..` segments are folded; both
//! `/` and `\` separate segments, and the output uses the base directory's separator. Without a base directory the literal text is kept
//! byte for byte.
//!
//! Comparison downstream is exact: letter case and trailing whitespace are significant.

/// Resolves raw directive/source paths to the normalized document key.
#[derive(Debug, Clone, Default)]
pub struct PathNormalizer {
    base_directory: Option<String>,
}

impl PathNormalizer {
    /// Create a normalizer; `None` keeps paths verbatim.
    #[must_use]
    pub fn new(base_directory: Option<String>) -> Self {
        PathNormalizer { base_directory }
    }

    /// The configured base directory.
    #[must_use]
    pub fn base_directory(&self) -> Option<&str> {
        self.base_directory.as_deref()
    }

    /// Normalize `raw`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use symscope::debuginfo::source::PathNormalizer;
    ///
    /// let normalizer = PathNormalizer::new(Some("/src/app".to_string()));
    /// assert_eq!(normalizer.normalize("./lib/../a.cs"), "/src/app/a.cs");
    /// assert_eq!(normalizer.normalize("/other/./b.cs"), "/other/b.cs");
    ///
    /// let verbatim = PathNormalizer::new(None);
    /// assert_eq!(verbatim.normalize("./lib/../a.cs"), "./lib/../a.cs");
    /// ```
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let Some(base) = self.base_directory.as_deref() else {
            return raw.to_string();
        };

        // The base directory alone picks the separator, so mixed spellings fold together.
        let separator = if base.contains('\\') { '\\' } else { '/' };

        if root_of(raw).is_some() {
            let (root, rest) = split_root(raw);
            return assemble(&root, rest, separator);
        }

        let (root, base_rest) = split_root(base);
        let joined = if base_rest.is_empty() {
            raw.to_string()
        } else {
            format!("{base_rest}{separator}{raw}")
        };
        assemble(&root, &joined, separator)
    }
}

/// Length of the root prefix (`/`, `\`, `C:\`, `C:/`, `C:`), if the path is rooted.
fn root_of(path: &str) -> Option<usize> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        if bytes.len() >= 3 && matches!(bytes[2], b'/' | b'\\') {
            return Some(3);
        }
        return Some(2);
    }
    match bytes.first() {
        Some(b'/' | b'\\') => Some(1),
        _ => None,
    }
}

fn split_root(path: &str) -> (String, &str) {
    match root_of(path) {
        Some(len) => (path[..len].to_string(), &path[len..]),
        None => (String::new(), path),
    }
}

fn assemble(root: &str, rest: &str, separator: char) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if root.is_empty() {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let root: String = root
        .chars()
        .map(|c| if c == '/' || c == '\\' { separator } else { c })
        .collect();
    let mut normalized = root;
    let mut separator_buf = [0u8; 4];
    normalized.push_str(&segments.join(separator.encode_utf8(&mut separator_buf)));
    normalized
}
