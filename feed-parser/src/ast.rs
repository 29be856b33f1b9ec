//! Incremental tree assembly with mis-nest repair.
//!
//! Nodes are allocated from an arena that lives for exactly one tree; links
//! between nodes are arena indices. The builder keeps a stack of open nodes
//! and a per-name counter of currently open tags. Closing the root moves the
//! arena out as a [`Tree`] and resets the builder for the next subtree.

use crate::token::OpenTag;
use std::collections::HashMap;

/// Name given to text nodes in the chain.
pub const TEXT_NODE_NAME: &str = "TEXT_NODE";

/// Role of a node in the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An element produced by an opening tag.
    Open,
    /// A transient closing-tag event; never retained in a tree.
    Close,
    /// A text segment, stored as a sibling in the chain.
    Text,
}

/// One node of the discovery chain.
///
/// Trees flatten into a singly linked chain ordered by depth-first discovery:
/// the order in which tokens streamed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Tag name, or [`TEXT_NODE_NAME`] for text.
    pub name: String,
    /// Role of this node.
    pub kind: NodeKind,
    /// Attribute map carried over from the opening tag.
    pub attrs: Option<HashMap<String, String>>,
    /// Text content; empty for elements.
    pub content: String,
    next: Option<usize>,
}

impl Node {
    /// An element node from a decoded opening tag.
    pub fn element(tag: OpenTag) -> Self {
        Self {
            name: tag.name,
            kind: NodeKind::Open,
            attrs: tag.attrs,
            content: String::new(),
            next: None,
        }
    }

    /// A closing event for `name`.
    pub fn closing(name: String) -> Self {
        Self {
            name,
            kind: NodeKind::Close,
            attrs: None,
            content: String::new(),
            next: None,
        }
    }

    /// A text node holding already-scrubbed content.
    pub fn text(content: String) -> Self {
        Self {
            name: TEXT_NODE_NAME.to_string(),
            kind: NodeKind::Text,
            attrs: None,
            content,
            next: None,
        }
    }

    /// The `class` attribute value, or the empty string when absent.
    pub fn class_attr(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    /// Looks up an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.as_ref()?.get(key).map(String::as_str)
    }
}

/// A completed subtree: the arena of its nodes plus the root index.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    root: usize,
}

impl Tree {
    /// The node whose close finished this tree.
    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    /// Walks the chain from the root in discovery order.
    pub fn iter(&self) -> Chain<'_> {
        Chain {
            nodes: &self.nodes,
            current: Some(self.root),
        }
    }
}

/// Iterator over a tree's discovery chain.
pub struct Chain<'a> {
    nodes: &'a [Node],
    current: Option<usize>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let id = self.current?;
        let node = &self.nodes[id];
        self.current = node.next;
        Some(node)
    }
}

/// Stack-based incremental tree builder tolerant of unbalanced markup.
#[derive(Debug, Default)]
pub struct AstBuilder {
    arena: Vec<Node>,
    stack: Vec<usize>,
    tag_counts: HashMap<String, u32>,
    root: Option<usize>,
}

impl AstBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tree is currently under construction.
    pub fn is_building(&self) -> bool {
        self.root.is_some()
    }

    /// The topmost open node, if any.
    pub fn pending(&self) -> Option<&Node> {
        self.stack.last().map(|&id| &self.arena[id])
    }

    /// Pushes an opened node onto the stack. The first node appended after a
    /// reset becomes the root.
    pub fn append_open(&mut self, node: Node) {
        *self.tag_counts.entry(node.name.clone()).or_insert(0) += 1;

        let id = self.arena.len();
        self.arena.push(node);
        self.stack.push(id);

        if self.root.is_none() {
            self.root = Some(id);
        }
    }

    /// Pops open nodes for a closing tag named `name`.
    ///
    /// A close with no matching open is dropped. When the popped node does
    /// not match, the markup lost a close somewhere: the skipped node is
    /// auto-closed by linking it as the tail of the next candidate, and
    /// popping continues until the names match or the stack drains. Closing
    /// the root finishes the tree and resets the builder.
    pub fn close_tag(&mut self, name: &str) -> Option<Tree> {
        let count = self.tag_counts.get_mut(name)?;
        *count -= 1;
        if *count == 0 {
            self.tag_counts.remove(name);
        }

        let mut target = self.stack.pop()?;
        while self.arena[target].name != name {
            let skipped = target;
            match self.stack.pop() {
                Some(parent) => {
                    target = parent;
                    let tail = self.tail_of(target);
                    self.arena[tail].next = Some(skipped);
                }
                // Stack drained without a match; nothing left to repair.
                None => break,
            }
        }

        if self.arena[target].name == name {
            if let Some(&parent) = self.stack.last() {
                let tail = self.tail_of(parent);
                self.arena[tail].next = Some(target);
            }
        }

        if self.root == Some(target) {
            let nodes = std::mem::take(&mut self.arena);
            self.reset();
            return Some(Tree {
                nodes,
                root: target,
            });
        }
        None
    }

    /// Clears all building state.
    pub fn reset(&mut self) {
        self.arena.clear();
        self.stack.clear();
        self.tag_counts.clear();
        self.root = None;
    }

    fn tail_of(&self, mut id: usize) -> usize {
        while let Some(next) = self.arena[id].next {
            id = next;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::{AstBuilder, Node, Tree, TEXT_NODE_NAME};
    use crate::token::OpenTag;
    use pretty_assertions::assert_eq;

    fn element(name: &str) -> Node {
        Node::element(OpenTag {
            name: name.to_string(),
            attrs: None,
        })
    }

    fn chain_names(tree: &Tree) -> Vec<&str> {
        tree.iter().map(|node| node.name.as_str()).collect()
    }

    #[test]
    fn well_formed_markup_preserves_discovery_order() {
        let mut builder = AstBuilder::new();
        builder.append_open(element("div"));
        builder.append_open(element("h1"));
        builder.append_open(Node::text("Hi".into()));
        assert!(builder.close_tag("h1").is_none());
        let tree = builder.close_tag("div").expect("root close completes");

        assert_eq!(chain_names(&tree), vec!["div", "h1", TEXT_NODE_NAME]);
        assert!(builder.tag_counts.is_empty());
        assert!(!builder.is_building());
    }

    #[test]
    fn sibling_subtrees_chain_in_order() {
        let mut builder = AstBuilder::new();
        builder.append_open(element("ul"));
        builder.append_open(element("li"));
        assert!(builder.close_tag("li").is_none());
        builder.append_open(element("li"));
        assert!(builder.close_tag("li").is_none());
        let tree = builder.close_tag("ul").expect("root close completes");

        assert_eq!(chain_names(&tree), vec!["ul", "li", "li"]);
    }

    #[test]
    fn misnested_close_repairs_by_auto_closing() {
        let mut builder = AstBuilder::new();
        builder.append_open(element("a"));
        builder.append_open(element("b"));
        let tree = builder.close_tag("a").expect("root close completes");

        assert_eq!(chain_names(&tree), vec!["a", "b"]);
        assert!(builder.pending().is_none());

        // The trailing </b> finds no open tag and is dropped.
        assert!(builder.close_tag("b").is_none());
        assert!(builder.tag_counts.is_empty());
    }

    #[test]
    fn unmatched_close_is_dropped() {
        let mut builder = AstBuilder::new();
        builder.append_open(element("div"));
        assert!(builder.close_tag("span").is_none());
        assert_eq!(builder.pending().map(|node| node.name.as_str()), Some("div"));
    }

    #[test]
    fn text_nodes_become_chain_siblings() {
        let mut builder = AstBuilder::new();
        builder.append_open(element("p"));
        builder.append_open(element("b"));
        builder.append_open(Node::text("x".into()));
        let tree = builder.close_tag("p").expect("root close completes");

        assert_eq!(chain_names(&tree), vec!["p", "b", TEXT_NODE_NAME]);
        let text = tree.iter().last().expect("text node");
        assert_eq!(text.content, "x");
    }

    #[test]
    fn builder_is_reusable_after_completion() {
        let mut builder = AstBuilder::new();
        builder.append_open(element("li"));
        builder.close_tag("li").expect("first tree");

        builder.append_open(element("li"));
        builder.append_open(Node::text("two".into()));
        let tree = builder.close_tag("li").expect("second tree");
        assert_eq!(chain_names(&tree), vec!["li", TEXT_NODE_NAME]);
    }
}
