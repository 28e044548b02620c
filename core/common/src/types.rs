//! Common types used throughout Skylift.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A destination path inside the remote drive, independent of any local
/// filesystem path.
///
/// The path `a/b/c` addresses the folder `c` under `b` under `a`,
/// relative to the drive root. Components never contain separators;
/// percent-encoding for URLs happens at request-construction time, not
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemotePath {
    components: Vec<String>,
}

impl RemotePath {
    /// Create a root path (the drive root itself).
    pub fn root() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Create a path from string components.
    ///
    /// # Errors
    /// - Returns error if any component is empty or contains a separator
    pub fn from_components(components: Vec<String>) -> crate::Result<Self> {
        for comp in &components {
            if comp.is_empty() {
                return Err(crate::Error::InvalidInput(
                    "Path component cannot be empty".to_string(),
                ));
            }
            if comp.contains('/') || comp.contains('\\') {
                return Err(crate::Error::InvalidInput(
                    "Path component cannot contain separators".to_string(),
                ));
            }
        }
        Ok(Self { components })
    }

    /// Parse a path string into a RemotePath.
    ///
    /// Uses '/' as separator; leading and trailing separators are
    /// ignored, so `videos/raw`, `/videos/raw` and `videos/raw/` are
    /// the same path.
    pub fn parse(path: &str) -> crate::Result<Self> {
        let path = path.trim_start_matches('/').trim_end_matches('/');
        if path.is_empty() {
            return Ok(Self::root());
        }

        let components: Vec<String> = path.split('/').map(String::from).collect();
        Self::from_components(components)
    }

    /// Check if this is the root path.
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Path components in order, root first.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Append a component, returning the extended path.
    ///
    /// # Errors
    /// - Returns error if the component is invalid
    pub fn join(&self, component: &str) -> crate::Result<Self> {
        let mut components = self.components.clone();
        components.push(component.to_string());
        Self::from_components(components)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}
