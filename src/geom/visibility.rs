//! Purpose and visibility of scene nodes.
//!
//! Both are token attributes that can be authored on any node:
//! - `purpose`: `default`, `render`, `proxy` or `guide`. Unauthored purpose
//!   is inherited from the parent.
//! - `visibility`: `inherited` or `invisible`. An invisible node hides its
//!   whole subtree.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::TimeCode;
use crate::scene::{NodeId, Stage};
use crate::util::{Error, Result};

/// Purpose attribute name.
pub const PURPOSE_ATTR: &str = "purpose";

/// Visibility attribute name.
pub const VISIBILITY_ATTR: &str = "visibility";

/// Node purpose, used to filter which geometry counts for a bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    #[default]
    Default,
    Render,
    Proxy,
    Guide,
}

impl Purpose {
    /// All purposes, in extents-hint order.
    pub const ALL: [Self; 4] = [Self::Default, Self::Render, Self::Proxy, Self::Guide];

    /// Parse a purpose token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "default" => Some(Self::Default),
            "render" => Some(Self::Render),
            "proxy" => Some(Self::Proxy),
            "guide" => Some(Self::Guide),
            _ => None,
        }
    }

    /// Token as authored.
    pub const fn as_token(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Render => "render",
            Self::Proxy => "proxy",
            Self::Guide => "guide",
        }
    }

    /// Position in an `extentsHint` array.
    pub const fn hint_index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Node visibility state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Visibility is deferred to the parent.
    #[default]
    Inherited,
    /// Node and its subtree are hidden.
    Invisible,
}

impl Visibility {
    /// Parse a visibility token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "inherited" => Some(Self::Inherited),
            "invisible" => Some(Self::Invisible),
            _ => None,
        }
    }

    /// Check if this is explicitly hidden.
    pub fn is_invisible(self) -> bool {
        matches!(self, Self::Invisible)
    }
}

/// Whether bounds computation honours authored visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityPolicy {
    /// Hidden geometry still contributes.
    #[default]
    Ignore,
    /// Invisible nodes prune their subtree.
    Respect,
}

fn token_attr<'a>(stage: &'a Stage, id: NodeId, name: &str, time: TimeCode) -> Result<Option<&'a str>> {
    let Some(value) = stage.composed_attribute(id, name).and_then(|a| a.get(time)) else {
        return Ok(None);
    };
    match value.as_token() {
        Some(token) => Ok(Some(token)),
        None => Err(Error::geometry(
            stage.path_of(id).map(|p| p.as_str()).unwrap_or("?"),
            format!("{name} is a {}, expected a token", value.describe()),
        )),
    }
}

/// Purpose authored on a node or the nodes it references, `None` when
/// unauthored.
pub fn authored_purpose(stage: &Stage, id: NodeId, time: TimeCode) -> Result<Option<Purpose>> {
    let Some(token) = token_attr(stage, id, PURPOSE_ATTR, time)? else {
        return Ok(None);
    };
    match Purpose::from_token(token) {
        Some(p) => Ok(Some(p)),
        None => {
            tracing::warn!("{:?}: unknown purpose {:?}, using default", stage.path_of(id), token);
            Ok(Some(Purpose::Default))
        }
    }
}

/// Visibility authored on a node or the nodes it references.
pub fn get_visibility(stage: &Stage, id: NodeId, time: TimeCode) -> Result<Visibility> {
    Ok(token_attr(stage, id, VISIBILITY_ATTR, time)?
        .and_then(Visibility::from_token)
        .unwrap_or_default())
}

/// Computed purpose: the nearest authored purpose on the node or an ancestor.
pub fn compute_purpose(stage: &Stage, id: NodeId, time: TimeCode) -> Result<Purpose> {
    let mut current = Some(id);
    while let Some(n) = current {
        if let Some(p) = authored_purpose(stage, n, time)? {
            return Ok(p);
        }
        current = stage.node(n).and_then(|node| node.parent());
    }
    Ok(Purpose::Default)
}

/// Check if the node or any ancestor is invisible.
pub fn is_invisible(stage: &Stage, id: NodeId, time: TimeCode) -> Result<bool> {
    let mut current = Some(id);
    while let Some(n) = current {
        if get_visibility(stage, n, time)?.is_invisible() {
            return Ok(true);
        }
        current = stage.node(n).and_then(|node| node.parent());
    }
    Ok(false)
}
