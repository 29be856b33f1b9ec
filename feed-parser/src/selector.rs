//! Predicates deciding which top-level open tags start a subtree.

use crate::ast::{AstBuilder, Node, Tree};
use std::sync::Mutex;

/// Completion callback invoked with each finished tree.
pub type TreeCallback = Box<dyn Fn(&Tree) + Send + Sync>;

/// Receiver for the parse driver's token fan-out. Each selector owns its own
/// tree builder; implementations must tolerate concurrent calls for distinct
/// tokens never arriving (the driver barriers between tokens) but may be
/// invoked from different threads.
pub trait Selector: Send + Sync {
    /// Handles an opening (or text) event.
    fn on_open(&self, node: Node);
    /// Handles a closing event.
    fn on_close(&self, node: Node);
    /// Whether a subtree is under construction.
    fn has_pending(&self) -> bool;
}

/// Selects subtrees whose root carries one of the configured class fragments.
///
/// Matching is loose substring containment over the `class` attribute value,
/// so `["foo"]` matches `class="prefix-foo-bar"`. An element without a class
/// attribute is matched against its tag name instead, and an empty fragment
/// list accepts any top-level open.
pub struct ClassSelector {
    ast: Mutex<AstBuilder>,
    classes: Vec<String>,
    on_tree: TreeCallback,
}

impl ClassSelector {
    /// Builds a selector for `classes` reporting finished trees to `on_tree`.
    pub fn new(classes: Vec<String>, on_tree: TreeCallback) -> Self {
        Self {
            ast: Mutex::new(AstBuilder::new()),
            classes,
            on_tree,
        }
    }

    fn matches(&self, node: &Node) -> bool {
        if self.classes.is_empty() {
            return true;
        }
        let class_attr = node.class_attr();
        if class_attr.is_empty() {
            return self
                .classes
                .iter()
                .any(|fragment| node.name.contains(fragment.as_str()));
        }
        contains_class(class_attr, &self.classes)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AstBuilder> {
        self.ast
            .lock()
            .unwrap_or_else(|_| panic!("selector tree builder mutex poisoned"))
    }
}

impl Selector for ClassSelector {
    fn on_open(&self, node: Node) {
        let mut ast = self.lock();
        if ast.is_building() {
            ast.append_open(node);
            return;
        }
        if self.matches(&node) {
            ast.append_open(node);
        }
    }

    fn on_close(&self, node: Node) {
        let completed = self.lock().close_tag(&node.name);
        if let Some(tree) = completed {
            (self.on_tree)(&tree);
        }
    }

    fn has_pending(&self) -> bool {
        self.lock().pending().is_some()
    }
}

/// Whether any configured fragment appears inside the class attribute value.
pub fn contains_class(class_attr: &str, fragments: &[String]) -> bool {
    fragments
        .iter()
        .any(|fragment| class_attr.contains(fragment.as_str()))
}
