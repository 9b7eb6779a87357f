//! Slash-delimited node paths.

use crate::util::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Absolute path to a node, e.g. `/asset/model/guide`.
///
/// The pseudo-root is `/`. Every other path is a sequence of identifier
/// segments with no trailing slash.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(String);

/// True for names usable as a path segment: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl NodePath {
    /// The pseudo-root path `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and validate an absolute path.
    pub fn parse(s: &str) -> Result<Self> {
        if s == "/" {
            return Ok(Self::root());
        }
        let Some(rest) = s.strip_prefix('/') else {
            return Err(Error::InvalidPath(format!("{s} (not absolute)")));
        };
        if rest.split('/').any(|seg| !is_valid_identifier(seg)) {
            return Err(Error::InvalidPath(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Check if this is the pseudo-root.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment, empty for the root.
    pub fn name(&self) -> &str {
        if self.is_root() {
            return "";
        }
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Iterate over the segments from the top down.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments (0 for the root).
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(i) => Some(Self(self.0[..i].to_string())),
            None => None,
        }
    }

    /// Append a child segment.
    pub fn child(&self, name: &str) -> Result<NodePath> {
        if !is_valid_identifier(name) {
            return Err(Error::InvalidPath(format!("{}/{}", self.0.trim_end_matches('/'), name)));
        }
        if self.is_root() {
            Ok(Self(format!("/{name}")))
        } else {
            Ok(Self(format!("{}/{}", self.0, name)))
        }
    }

    /// The first-level ancestor (or self), `None` for the root.
    pub fn top_level(&self) -> Option<NodePath> {
        self.segments().next().map(|s| Self(format!("/{s}")))
    }

    /// Every ancestor from the first level down to and including self.
    pub fn ancestors_and_self(&self) -> Vec<NodePath> {
        let mut out = Vec::with_capacity(self.depth());
        let mut current = String::new();
        for seg in self.segments() {
            current.push('/');
            current.push_str(seg);
            out.push(Self(current.clone()));
        }
        out
    }

    /// True if `other` is this path or one of its ancestors.
    pub fn has_prefix(&self, other: &NodePath) -> bool {
        if other.is_root() {
            return true;
        }
        self.0 == other.0
            || (self.0.starts_with(&other.0) && self.0.as_bytes().get(other.0.len()) == Some(&b'/'))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl FromStr for NodePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert!(NodePath::parse("/").unwrap().is_root());
        assert_eq!(NodePath::parse("/asset/model").unwrap().depth(), 2);
        assert!(NodePath::parse("asset").is_err());
        assert!(NodePath::parse("/asset/").is_err());
        assert!(NodePath::parse("/asset//model").is_err());
        assert!(NodePath::parse("/1asset").is_err());
    }

    #[test]
    fn test_navigation() {
        let p = NodePath::parse("/asset/model/guide").unwrap();
        assert_eq!(p.name(), "guide");
        assert_eq!(p.parent().unwrap().as_str(), "/asset/model");
        assert_eq!(p.top_level().unwrap().as_str(), "/asset");
        assert_eq!(NodePath::parse("/asset").unwrap().parent(), Some(NodePath::root()));
        assert_eq!(NodePath::root().parent(), None);

        let box_path = p.child("box").unwrap();
        assert_eq!(box_path.as_str(), "/asset/model/guide/box");
        assert_eq!(NodePath::root().child("a").unwrap().as_str(), "/a");
        assert!(p.child("bad name").is_err());
    }

    #[test]
    fn test_prefix() {
        let p = NodePath::parse("/asset/model").unwrap();
        assert!(p.has_prefix(&NodePath::parse("/asset").unwrap()));
        assert!(p.has_prefix(&p));
        assert!(p.has_prefix(&NodePath::root()));
        assert!(!p.has_prefix(&NodePath::parse("/ass").unwrap()));
    }

    #[test]
    fn test_ancestors() {
        let p = NodePath::parse("/a/b/c").unwrap();
        let names: Vec<_> = p.ancestors_and_self().iter().map(|a| a.to_string()).collect();
        assert_eq!(names, vec!["/a", "/a/b", "/a/b/c"]);
    }
}
