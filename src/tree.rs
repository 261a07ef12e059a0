use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::events::{CollectionStyle, Comment, ScalarStyle};
use crate::source::Location;
use crate::yaml::{Yaml, parse_f64, resolve_scalar};

/// One parsed document: its root node, framing flags and anchor table.
#[derive(Debug, Default)]
pub struct Document {
    pub root: Option<Node>,
    pub version: Option<(u32, u32)>,
    pub implicit_start: bool,
    pub implicit_end: bool,
    pub location: Option<Location>,
    pub(crate) anchors: HashMap<String, Node>,
}

impl Document {
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// The node a `*name` alias refers to, if its anchor was recorded.
    pub fn resolve_alias(&self, name: &str) -> Option<Node> {
        self.anchors.get(name).cloned()
    }

    /// Resolve the document into a plain value.
    pub fn to_yaml(&self) -> Yaml {
        self.to_yaml_strict(false)
    }

    pub(crate) fn to_yaml_strict(&self, strict_integer: bool) -> Yaml {
        match &self.root {
            Some(root) => root.resolve(&self.anchors, strict_integer, &mut Vec::new()),
            None => Yaml::Null,
        }
    }
}

/// A shared, interior-mutable tree node.
///
/// Cloning a `Node` clones the handle, not the node; `ptr_eq` is identity.
/// Alias resolution and user-built sharing both hand out clones of the same
/// handle, which is what the emitter's repeat detection keys on.
#[derive(Clone)]
pub struct Node {
    data: Rc<RefCell<NodeData>>,
}

#[derive(Debug)]
pub struct NodeData {
    pub kind: NodeKind,
    pub anchor: Option<String>,
    pub tag: Option<String>,
    pub location: Option<Location>,
    pub leading: Vec<Comment>,
    pub trailing: Vec<Comment>,
}

#[derive(Debug)]
pub enum NodeKind {
    Scalar {
        value: String,
        style: ScalarStyle,
    },
    Sequence {
        children: Vec<Node>,
        style: CollectionStyle,
    },
    Mapping {
        pairs: Vec<(Node, Node)>,
        style: CollectionStyle,
    },
    Alias {
        name: String,
    },
}

impl Node {
    fn from_kind(kind: NodeKind) -> Self {
        Node {
            data: Rc::new(RefCell::new(NodeData {
                kind,
                anchor: None,
                tag: None,
                location: None,
                leading: Vec::new(),
                trailing: Vec::new(),
            })),
        }
    }

    pub fn scalar(value: impl Into<String>) -> Self {
        Node::scalar_styled(value, ScalarStyle::Plain)
    }

    pub fn scalar_styled(value: impl Into<String>, style: ScalarStyle) -> Self {
        Node::from_kind(NodeKind::Scalar {
            value: value.into(),
            style,
        })
    }

    pub fn sequence(style: CollectionStyle) -> Self {
        Node::from_kind(NodeKind::Sequence {
            children: Vec::new(),
            style,
        })
    }

    pub fn mapping(style: CollectionStyle) -> Self {
        Node::from_kind(NodeKind::Mapping {
            pairs: Vec::new(),
            style,
        })
    }

    pub fn alias(name: impl Into<String>) -> Self {
        Node::from_kind(NodeKind::Alias { name: name.into() })
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    pub(crate) fn id(&self) -> *const RefCell<NodeData> {
        Rc::as_ptr(&self.data)
    }

    pub fn data(&self) -> Ref<'_, NodeData> {
        self.data.borrow()
    }

    pub fn data_mut(&self) -> RefMut<'_, NodeData> {
        self.data.borrow_mut()
    }

    pub fn location(&self) -> Option<Location> {
        self.data().location.clone()
    }

    pub fn set_location(&self, location: Location) {
        self.data_mut().location = Some(location);
    }

    pub fn anchor(&self) -> Option<String> {
        self.data().anchor.clone()
    }

    pub fn set_anchor(&self, anchor: Option<String>) {
        self.data_mut().anchor = anchor;
    }

    pub fn tag(&self) -> Option<String> {
        self.data().tag.clone()
    }

    pub fn set_tag(&self, tag: Option<String>) {
        self.data_mut().tag = tag;
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.data().kind, NodeKind::Scalar { .. })
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.data().kind, NodeKind::Sequence { .. })
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.data().kind, NodeKind::Mapping { .. })
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.data().kind, NodeKind::Alias { .. })
    }

    pub fn scalar_value(&self) -> Option<String> {
        match &self.data().kind {
            NodeKind::Scalar { value, .. } => Some(value.clone()),
            _ => None,
        }
    }

    /// Children in document order: sequence items, or mapping keys and
    /// values interleaved. Scalars and aliases have none.
    pub fn children(&self) -> Vec<Node> {
        match &self.data().kind {
            NodeKind::Sequence { children, .. } => children.clone(),
            NodeKind::Mapping { pairs, .. } => pairs
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn push_leading(&self, comment: Comment) {
        self.data_mut().leading.push(comment);
    }

    pub fn push_trailing(&self, comment: Comment) {
        self.data_mut().trailing.push(comment);
    }

    pub fn seq_len(&self) -> usize {
        match &self.data().kind {
            NodeKind::Sequence { children, .. } => children.len(),
            _ => 0,
        }
    }

    pub fn seq_get(&self, index: usize) -> Option<Node> {
        match &self.data().kind {
            NodeKind::Sequence { children, .. } => children.get(index).cloned(),
            _ => None,
        }
    }

    pub fn seq_push(&self, node: Node) {
        if let NodeKind::Sequence { children, .. } = &mut self.data_mut().kind {
            children.push(node);
        }
    }

    pub fn seq_insert(&self, index: usize, node: Node) {
        if let NodeKind::Sequence { children, .. } = &mut self.data_mut().kind {
            children.insert(index.min(children.len()), node);
        }
    }

    pub fn seq_remove(&self, index: usize) -> Option<Node> {
        if let NodeKind::Sequence { children, .. } = &mut self.data_mut().kind {
            if index < children.len() {
                return Some(children.remove(index));
            }
        }
        None
    }

    pub fn map_insert(&self, key: Node, value: Node) {
        if let NodeKind::Mapping { pairs, .. } = &mut self.data_mut().kind {
            pairs.push((key, value));
        }
    }

    /// Remove the first pair whose key is a scalar equal to `key`.
    pub fn map_remove(&self, key: &str) -> Option<(Node, Node)> {
        if let NodeKind::Mapping { pairs, .. } = &mut self.data_mut().kind {
            let index = pairs
                .iter()
                .position(|(k, _)| k.scalar_value().as_deref() == Some(key))?;
            return Some(pairs.remove(index));
        }
        None
    }

    /// The value for a scalar key, if present.
    pub fn map_get(&self, key: &str) -> Option<Node> {
        match &self.data().kind {
            NodeKind::Mapping { pairs, .. } => pairs
                .iter()
                .find(|(k, _)| k.scalar_value().as_deref() == Some(key))
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn resolve(
        &self,
        anchors: &HashMap<String, Node>,
        strict_integer: bool,
        active: &mut Vec<*const RefCell<NodeData>>,
    ) -> Yaml {
        let ptr = self.id();
        if active.contains(&ptr) {
            // A cyclic alias has no value representation.
            return Yaml::BadValue;
        }
        active.push(ptr);
        let data = self.data();
        let out = match &data.kind {
            NodeKind::Scalar { value, style } => {
                resolve_tagged_scalar(value, *style, data.tag.as_deref(), strict_integer)
            }
            NodeKind::Sequence { children, .. } => Yaml::Array(
                children
                    .iter()
                    .map(|c| c.resolve(anchors, strict_integer, active))
                    .collect(),
            ),
            NodeKind::Mapping { pairs, .. } => {
                let mut hash = crate::linked_hash_map::LinkedHashMap::with_capacity(pairs.len());
                for (k, v) in pairs {
                    hash.insert(
                        k.resolve(anchors, strict_integer, active),
                        v.resolve(anchors, strict_integer, active),
                    );
                }
                Yaml::Hash(hash)
            }
            NodeKind::Alias { name } => match anchors.get(name) {
                Some(target) => target.resolve(anchors, strict_integer, active),
                None => Yaml::BadValue,
            },
        };
        active.pop();
        out
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.data().fmt(f)
    }
}

pub(crate) fn resolve_tagged_scalar(
    value: &str,
    style: ScalarStyle,
    tag: Option<&str>,
    strict_integer: bool,
) -> Yaml {
    match tag {
        Some("tag:yaml.org,2002:str") | Some("!") => Yaml::String(value.to_owned()),
        Some("tag:yaml.org,2002:null") => Yaml::Null,
        Some("tag:yaml.org,2002:bool") => match value {
            "true" | "True" | "TRUE" => Yaml::Boolean(true),
            "false" | "False" | "FALSE" => Yaml::Boolean(false),
            _ => Yaml::BadValue,
        },
        Some("tag:yaml.org,2002:int") => match resolve_scalar(value, strict_integer) {
            i @ Yaml::Integer(_) => i,
            _ => Yaml::BadValue,
        },
        Some("tag:yaml.org,2002:float") => match parse_f64(value) {
            Some(_) => Yaml::Real(value.to_owned()),
            None => Yaml::BadValue,
        },
        // Unknown application tags keep their string form.
        Some(_) => Yaml::String(value.to_owned()),
        None if style == ScalarStyle::Plain => resolve_scalar(value, strict_integer),
        None => Yaml::String(value.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_mutation() {
        let seq = Node::sequence(CollectionStyle::Block);
        seq.seq_push(Node::scalar("a"));
        seq.seq_push(Node::scalar("c"));
        seq.seq_insert(1, Node::scalar("b"));
        let values: Vec<_> = (0..seq.seq_len())
            .filter_map(|i| seq.seq_get(i)?.scalar_value())
            .collect();
        assert_eq!(values, ["a", "b", "c"]);
        assert_eq!(seq.seq_remove(0).and_then(|n| n.scalar_value()).as_deref(), Some("a"));
        assert_eq!(seq.seq_len(), 2);
    }

    #[test]
    fn cyclic_alias_resolves_to_bad_value() {
        let seq = Node::sequence(CollectionStyle::Block);
        seq.set_anchor(Some("a".into()));
        seq.seq_push(Node::alias("a"));
        let mut anchors = HashMap::new();
        anchors.insert("a".to_string(), seq.clone());
        let value = seq.resolve(&anchors, false, &mut Vec::new());
        assert_eq!(value, Yaml::Array(vec![Yaml::BadValue]));
    }

    #[test]
    fn shared_handles_are_identical() {
        let node = Node::scalar("x");
        let copy = node.clone();
        assert!(node.ptr_eq(&copy));
        assert!(!node.ptr_eq(&Node::scalar("x")));
    }
}
