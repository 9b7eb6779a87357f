//! In-memory scene graph.
//!
//! A [`Stage`] owns an arena of [`Node`]s addressed by [`NodeId`] and by
//! [`NodePath`]. Index 0 is always the pseudo-root `/`.

use std::collections::HashMap;

use smallvec::{smallvec, SmallVec};

use crate::core::{MetaData, MetaValue, NodePath, TimeCode, Value, ValueType};
use crate::geom::NodeKind;
use crate::util::{Error, Result};

/// Handle to a node within one stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// How a node was introduced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Specifier {
    /// Concrete definition.
    #[default]
    Def,
    /// Override of opinions without defining.
    Over,
    /// Abstract node, not part of the rendered scene.
    Class,
}

impl Specifier {
    /// Keyword as written in scene documents.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Def => "def",
            Self::Over => "over",
            Self::Class => "class",
        }
    }
}

/// Node reference, by id or by path string.
#[derive(Clone, Copy, Debug)]
pub enum NodeRef<'a> {
    Id(NodeId),
    Path(&'a str),
}

impl From<NodeId> for NodeRef<'_> {
    fn from(id: NodeId) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a str> for NodeRef<'a> {
    fn from(path: &'a str) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a String> for NodeRef<'a> {
    fn from(path: &'a String) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a NodePath> for NodeRef<'a> {
    fn from(path: &'a NodePath) -> Self {
        Self::Path(path.as_str())
    }
}

/// Named, typed attribute with an optional default and time samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    name: String,
    value_type: ValueType,
    /// Declared `uniform` (not time-varying).
    pub uniform: bool,
    /// Declared `custom` (not part of the node's schema).
    pub custom: bool,
    default: Option<Value>,
    samples: Vec<(f64, Value)>,
}

impl Attribute {
    /// Create an attribute with no value.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            uniform: false,
            custom: false,
            default: None,
            samples: Vec::new(),
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Authored default value.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Time samples, sorted by time.
    pub fn samples(&self) -> &[(f64, Value)] {
        &self.samples
    }

    /// Check if any value is authored.
    pub fn has_value(&self) -> bool {
        self.default.is_some() || !self.samples.is_empty()
    }

    /// Resolve the value at `time`.
    ///
    /// The default time code reads the default value only. A numeric time
    /// uses held interpolation over samples, falling back to the default.
    pub fn get(&self, time: TimeCode) -> Option<&Value> {
        match time {
            TimeCode::Default => self.default.as_ref(),
            TimeCode::At(t) => {
                if self.samples.is_empty() {
                    return self.default.as_ref();
                }
                let idx = self.samples.partition_point(|(st, _)| *st <= t);
                Some(&self.samples[idx.saturating_sub(1)].1)
            }
        }
    }

    /// Author the default value, checked against the declared type.
    pub fn set(&mut self, value: Value) -> Result<()> {
        self.default = Some(self.value_type.conform(value)?);
        Ok(())
    }

    /// Author a time sample, replacing any sample at the same time.
    pub fn set_sample(&mut self, time: f64, value: Value) -> Result<()> {
        let value = self.value_type.conform(value)?;
        let idx = self.samples.partition_point(|(st, _)| *st < time);
        match self.samples.get_mut(idx) {
            Some((st, v)) if *st == time => *v = value,
            _ => self.samples.insert(idx, (time, value)),
        }
        Ok(())
    }

    fn retype(&mut self, value_type: ValueType) {
        self.value_type = value_type;
        self.default = None;
        self.samples.clear();
    }
}

/// A node in the scene graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    path: NodePath,
    kind: NodeKind,
    specifier: Specifier,
    meta_data: MetaData,
    reference: Option<NodePath>,
    attributes: Vec<Attribute>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(path: NodePath, kind: NodeKind, specifier: Specifier, parent: Option<NodeId>) -> Self {
        Self {
            path,
            kind,
            specifier,
            meta_data: MetaData::new(),
            reference: None,
            attributes: Vec::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// Full path.
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Schema type.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Specifier.
    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    /// Node metadata.
    pub fn meta_data(&self) -> &MetaData {
        &self.meta_data
    }

    /// Internal reference target, if any.
    pub fn reference(&self) -> Option<&NodePath> {
        self.reference.as_ref()
    }

    /// Attributes in authoring order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Parent node, `None` for the pseudo-root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in authoring order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// In-memory scene graph.
#[derive(Clone, Debug)]
pub struct Stage {
    identifier: String,
    meta_data: MetaData,
    nodes: Vec<Node>,
    index: HashMap<NodePath, NodeId>,
    frozen: bool,
}

impl PartialEq for Stage {
    fn eq(&self, other: &Self) -> bool {
        // Node ids are arena positions; compare the graphs by path.
        self.meta_data == other.meta_data
            && self.nodes.len() == other.nodes.len()
            && self.nodes.iter().all(|n| {
                other
                    .node_at(&n.path)
                    .and_then(|id| other.node(id))
                    .is_some_and(|o| {
                        o.kind == n.kind
                            && o.specifier == n.specifier
                            && o.meta_data == n.meta_data
                            && o.reference == n.reference
                            && o.attributes == n.attributes
                            && o.children.iter().map(|c| &other.nodes[c.0].path).eq(
                                n.children.iter().map(|c| &self.nodes[c.0].path),
                            )
                    })
            })
    }
}

impl Stage {
    /// Create an empty stage with just the pseudo-root.
    pub fn new(identifier: impl Into<String>) -> Self {
        let root = NodePath::root();
        let mut index = HashMap::new();
        index.insert(root.clone(), NodeId(0));
        Self {
            identifier: identifier.into(),
            meta_data: MetaData::new(),
            nodes: vec![Node::new(root, NodeKind::Untyped, Specifier::Def, None)],
            index,
            frozen: false,
        }
    }

    /// Location this stage was opened from or will be saved to.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Stage-level metadata.
    pub fn meta_data(&self) -> &MetaData {
        &self.meta_data
    }

    /// Set a stage-level metadata entry.
    pub fn set_meta_data(&mut self, key: impl Into<String>, value: MetaValue) -> Result<()> {
        self.check_writable()?;
        self.meta_data.set(key, value);
        Ok(())
    }

    /// The pseudo-root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Node id at an exact path.
    pub fn node_at(&self, path: &NodePath) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    /// Resolve a node reference, failing with [`Error::NodeNotFound`].
    pub fn resolve<'a>(&self, node: impl Into<NodeRef<'a>>) -> Result<NodeId> {
        match node.into() {
            NodeRef::Id(id) if id.0 < self.nodes.len() => Ok(id),
            NodeRef::Id(id) => Err(Error::NodeNotFound(format!("#{}", id.0))),
            NodeRef::Path(s) => NodePath::parse(s)
                .ok()
                .and_then(|p| self.node_at(&p))
                .ok_or_else(|| Error::NodeNotFound(s.to_string())),
        }
    }

    /// Path of a node.
    pub fn path_of(&self, id: NodeId) -> Option<&NodePath> {
        self.node(id).map(Node::path)
    }

    /// Number of nodes, not counting the pseudo-root.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Node named by the `defaultPrim` metadata, if it exists.
    pub fn default_node(&self) -> Option<NodeId> {
        let name = self.meta_data.get(MetaData::DEFAULT_PRIM_KEY)?.as_str()?;
        let path = NodePath::root().child(name).ok()?;
        self.node_at(&path)
    }

    /// Set the default node to a top-level node.
    pub fn set_default_node(&mut self, id: NodeId) -> Result<()> {
        let path = self.path_of(id).ok_or_else(|| Error::NodeNotFound(format!("#{}", id.0)))?;
        if path.depth() != 1 {
            return Err(Error::InvalidPath(format!("{path} (default node must be top-level)")));
        }
        let name = path.name().to_string();
        self.set_meta_data(MetaData::DEFAULT_PRIM_KEY, MetaValue::Token(name))
    }

    /// Children of a node (empty for unknown ids).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// Depth-first pre-order traversal below `id` (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// Freeze the stage; every later mutation fails with [`Error::Frozen`].
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Make a stored snapshot writable again.
    pub(crate) fn thaw(&mut self) {
        self.frozen = false;
    }

    /// Check if the stage is frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Define a node of `kind` at `path`, creating untyped ancestors.
    ///
    /// Idempotent: an existing node is reused, retyped if its kind differs,
    /// and promoted to a definition if it was only an override.
    pub fn define_node(&mut self, path: &NodePath, kind: NodeKind) -> Result<NodeId> {
        let id = self.upsert(path, Specifier::Def)?;
        let node = &mut self.nodes[id.0];
        node.specifier = Specifier::Def;
        if node.kind != kind {
            tracing::trace!("define {} as {}", path, kind);
            node.kind = kind;
        }
        Ok(id)
    }

    /// Get or create a node at `path` with the given specifier, leaving an
    /// existing node's kind and specifier untouched.
    pub fn upsert(&mut self, path: &NodePath, specifier: Specifier) -> Result<NodeId> {
        self.check_writable()?;
        if path.is_root() {
            return Err(Error::InvalidPath("cannot define the pseudo-root".into()));
        }
        if let Some(id) = self.node_at(path) {
            return Ok(id);
        }
        let mut parent = self.root();
        for ancestor in path.ancestors_and_self() {
            parent = match self.node_at(&ancestor) {
                Some(id) => id,
                None => {
                    let spec = if &ancestor == path { specifier } else { Specifier::Def };
                    let id = NodeId(self.nodes.len());
                    self.nodes.push(Node::new(ancestor.clone(), NodeKind::Untyped, spec, Some(parent)));
                    self.nodes[parent.0].children.push(id);
                    self.index.insert(ancestor, id);
                    id
                }
            };
        }
        Ok(parent)
    }

    /// Set the kind of an existing node.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) -> Result<()> {
        self.node_mut(id)?.kind = kind;
        Ok(())
    }

    /// Set a node metadata entry.
    pub fn set_node_meta_data(&mut self, id: NodeId, key: impl Into<String>, value: MetaValue) -> Result<()> {
        self.node_mut(id)?.meta_data.set(key, value);
        Ok(())
    }

    /// Set the internal reference of a node.
    pub fn set_reference(&mut self, id: NodeId, target: NodePath) -> Result<()> {
        self.node_mut(id)?.reference = Some(target);
        Ok(())
    }

    /// Create (or retype) an attribute and return it for authoring.
    ///
    /// An existing attribute with the same type is returned unchanged; one
    /// with a different type is retyped and its values cleared.
    pub fn create_attribute(&mut self, id: NodeId, name: &str, value_type: ValueType) -> Result<&mut Attribute> {
        if !name.split(':').all(crate::core::is_valid_identifier) {
            return Err(Error::other(format!("invalid attribute name: {name:?}")));
        }
        let node = self.node_mut(id)?;
        if node.path.is_root() {
            return Err(Error::InvalidPath("the pseudo-root has no attributes".into()));
        }
        let pos = match node.attributes.iter().position(|a| a.name == name) {
            Some(pos) => {
                if node.attributes[pos].value_type != value_type {
                    node.attributes[pos].retype(value_type);
                }
                pos
            }
            None => {
                node.attributes.push(Attribute::new(name, value_type));
                node.attributes.len() - 1
            }
        };
        Ok(&mut node.attributes[pos])
    }

    /// Create an attribute and author its default value.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value_type: ValueType, value: Value) -> Result<()> {
        self.create_attribute(id, name, value_type)?.set(value)
    }

    /// Attribute of a node by name.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&Attribute> {
        self.node(id)?.attribute(name)
    }

    /// A node followed by the nodes its reference chain points at.
    ///
    /// The walk stops at a dangling target or at the first node already in
    /// the chain.
    pub fn composition_chain(&self, id: NodeId) -> SmallVec<[NodeId; 4]> {
        let mut chain: SmallVec<[NodeId; 4]> = smallvec![id];
        let mut current = id;
        while let Some(target) = self.node(current).and_then(Node::reference).and_then(|p| self.node_at(p)) {
            if chain.contains(&target) {
                break;
            }
            chain.push(target);
            current = target;
        }
        chain
    }

    /// Schema type after composition: the first typed node along the
    /// reference chain.
    pub fn composed_kind(&self, id: NodeId) -> &NodeKind {
        static UNTYPED: NodeKind = NodeKind::Untyped;
        self.composition_chain(id)
            .into_iter()
            .filter_map(|n| self.node(n))
            .map(Node::kind)
            .find(|k| **k != NodeKind::Untyped)
            .unwrap_or(&UNTYPED)
    }

    /// Attribute after composition.
    ///
    /// The nearest node along the reference chain holding a value wins, so
    /// local opinions override the referenced node's and the referenced node
    /// fills in what is not authored locally. A declaration without any value
    /// is returned only when no node along the chain has one.
    pub fn composed_attribute(&self, id: NodeId, name: &str) -> Option<&Attribute> {
        let mut declared = None;
        for n in self.composition_chain(id) {
            if let Some(attr) = self.attribute(n, name) {
                if attr.has_value() {
                    return Some(attr);
                }
                declared.get_or_insert(attr);
            }
        }
        declared
    }

    fn check_writable(&self) -> Result<()> {
        if self.frozen {
            Err(Error::Frozen(self.identifier.clone()))
        } else {
            Ok(())
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.check_writable()?;
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| Error::NodeNotFound(format!("#{}", id.0)))
    }
}
