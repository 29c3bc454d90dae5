//! Style engine context
//!
//! Owns every piece of shared mutable state the cascade touches: the
//! resolved-style cache, the per-rule property-id memos, the base-style
//! table, the resource table, per-node sheet attachments and inline
//! overrides, and the per-node resolved map. Constructed explicitly and
//! passed by reference; there are no process statics to clear behind
//! anyone's back.
//!
//! Resolution is synchronous and single-threaded by contract: it runs
//! on the owning UI thread when a subtree is marked dirty, never
//! re-entrantly. A multi-threaded embedder must serialize writers to
//! this engine.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use alder_tree::{ElementTree, NodeId};

use crate::cache::{StyleCache, StyleStats, fold_hash};
use crate::resolved::{ResolvedStyle, StyleValue};
use crate::schema::{PropertyId, RulePropertyCache};
use crate::sheet::StyleSheet;
use crate::values::ResourceId;
use crate::walker::CascadeWalker;

/// Registry of resource paths the embedder has loaded
///
/// Id 0 is reserved for the placeholder asset substituted when a
/// texture path cannot be resolved.
#[derive(Debug)]
pub struct ResourceTable {
    map: HashMap<Box<str>, ResourceId>,
    next: u32,
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTable {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            next: 1,
        }
    }

    /// Register a path, returning its id (existing id if repeated)
    pub fn register(&mut self, path: &str) -> ResourceId {
        if let Some(&id) = self.map.get(path) {
            return id;
        }
        let id = ResourceId(self.next);
        self.next += 1;
        self.map.insert(path.into(), id);
        id
    }

    /// Look up a path without registering
    pub fn resolve(&self, path: &str) -> Option<ResourceId> {
        self.map.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Per-node inline override declarations
///
/// The salt folds into the node's cache key so records stay
/// content-addressable: nodes with identical matches and identical
/// inline sets share one record.
#[derive(Debug, Default)]
pub(crate) struct InlineDeclarations {
    pub declarations: Vec<(PropertyId, StyleValue)>,
    pub salt: u64,
}

impl InlineDeclarations {
    fn recompute_salt(&mut self) {
        let mut salt = 0xcbf2_9ce4_8422_2325;
        for (id, value) in &self.declarations {
            salt = fold_hash(salt, id.index() as u64);
            salt = fold_hash(salt, hash_style_value(value));
        }
        self.salt = salt;
    }
}

fn hash_style_value(value: &StyleValue) -> u64 {
    let mut hasher = DefaultHasher::new();
    std::mem::discriminant(value).hash(&mut hasher);
    match value {
        StyleValue::Unset => {}
        StyleValue::Float(v) => v.to_bits().hash(&mut hasher),
        StyleValue::Int(v) => v.hash(&mut hasher),
        StyleValue::Bool(v) => v.hash(&mut hasher),
        StyleValue::Color(v) => v.hash(&mut hasher),
        StyleValue::Keyword(v) => v.hash(&mut hasher),
        StyleValue::Resource(v) => v.hash(&mut hasher),
        StyleValue::Str(v) => v.hash(&mut hasher),
    }
    hasher.finish()
}

/// The style cascade & resolution engine
#[derive(Debug, Default)]
pub struct StyleEngine {
    pub(crate) cache: StyleCache,
    pub(crate) rule_props: RulePropertyCache,
    pub(crate) base_styles: HashMap<Box<str>, Vec<(PropertyId, StyleValue)>>,
    pub(crate) resources: ResourceTable,
    pub(crate) attachments: HashMap<NodeId, Vec<Arc<StyleSheet>>>,
    pub(crate) inline: HashMap<NodeId, InlineDeclarations>,
    pub(crate) resolved: HashMap<NodeId, Arc<ResolvedStyle>>,
    pub(crate) stats: StyleStats,
}

impl StyleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sheet at a subtree root
    ///
    /// The sheet's selectors apply to the root and everything below it.
    /// Attach order is cascade order for equal specificities.
    pub fn attach_sheet(&mut self, tree: &mut ElementTree, node: NodeId, sheet: Arc<StyleSheet>) {
        tracing::debug!("attaching sheet {:?} at node {}", sheet.id(), node.0);
        self.attachments.entry(node).or_default().push(sheet);
        tree.mark_subtree_styles_dirty(node);
    }

    /// Remove every sheet attached at this node
    pub fn detach_sheets(&mut self, tree: &mut ElementTree, node: NodeId) {
        if self.attachments.remove(&node).is_some() {
            tree.mark_subtree_styles_dirty(node);
        }
    }

    /// Resolve styles for the subtree rooted at `node`
    ///
    /// Subtrees with both dirty flags clear are skipped, so the cost is
    /// proportional to what changed, not to tree size. Runs to
    /// completion before returning.
    pub fn apply_styles(&mut self, tree: &mut ElementTree, node: NodeId) {
        CascadeWalker::new(self, tree).run(node);
    }

    /// Resolve styles for every root in the tree
    pub fn apply_styles_all(&mut self, tree: &mut ElementTree) {
        let roots: Vec<NodeId> = (0..tree.len() as u32)
            .map(NodeId)
            .filter(|&id| tree.get(id).is_some_and(|e| e.parent.is_none()))
            .collect();
        for root in roots {
            self.apply_styles(tree, root);
        }
    }

    /// Mark every sheet-owning subtree as needing re-resolution
    ///
    /// Used when sheet assets are hot-reloaded out from under the tree.
    /// The whole subtree is dirtied: a changed sheet invalidates the
    /// matched-rule set of every descendant, not just the root's.
    pub fn dirty_style_sheets(&mut self, tree: &mut ElementTree) {
        let nodes: Vec<NodeId> = self.attachments.keys().copied().collect();
        for node in nodes {
            tree.mark_subtree_styles_dirty(node);
        }
    }

    /// The resolved style attached to a node by the last pass
    pub fn resolved(&self, node: NodeId) -> Option<&Arc<ResolvedStyle>> {
        self.resolved.get(&node)
    }

    /// Register the specificity-0 seed values for one element type
    ///
    /// Shorthand ids have no slot of their own and are rejected.
    pub fn set_base_style(&mut self, type_name: &str, properties: Vec<(PropertyId, StyleValue)>) {
        for (id, _) in &properties {
            if id.is_shorthand() {
                tracing::warn!("base style for '{}' uses shorthand {:?}, dropped", type_name, id);
                return;
            }
        }
        self.base_styles.insert(type_name.into(), properties);
    }

    /// Set an inline/instance override on one node
    ///
    /// Inline values sit at the maximum specificity tier and win over
    /// any matched rule. Shorthand ids are rejected; set the four
    /// scalar sub-properties instead.
    pub fn set_inline(
        &mut self,
        tree: &mut ElementTree,
        node: NodeId,
        id: PropertyId,
        value: StyleValue,
    ) {
        if id.is_shorthand() {
            tracing::warn!("inline override with shorthand {:?} ignored", id);
            return;
        }
        let entry = self.inline.entry(node).or_default();
        match entry.declarations.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, existing_value)) => *existing_value = value,
            None => entry.declarations.push((id, value)),
        }
        entry.recompute_salt();
        tree.mark_styles_dirty(node);
    }

    /// Drop every inline override on one node
    pub fn clear_inline(&mut self, tree: &mut ElementTree, node: NodeId) {
        if self.inline.remove(&node).is_some() {
            tree.mark_styles_dirty(node);
        }
    }

    /// Register a loadable resource path
    pub fn register_resource(&mut self, path: &str) -> ResourceId {
        self.resources.register(path)
    }

    /// Resolve a resource-kind custom property against the table
    pub fn custom_resource(&self, style: &ResolvedStyle, name: &str) -> Option<ResourceId> {
        let path = style.custom_resource_path(name)?;
        let id = self.resources.resolve(path);
        if id.is_none() {
            tracing::warn!("unresolved resource '{}' for custom property '{}'", path, name);
        }
        id
    }

    /// Drop the resolved-style cache and the per-rule schema memos
    ///
    /// The per-node resolved map is kept; elements hold their last
    /// record until their subtree is next marked dirty and re-resolved.
    pub fn clear_caches(&mut self) {
        tracing::debug!(
            "clearing style caches ({} records, {} rule memos)",
            self.cache.len(),
            self.rule_props.len()
        );
        self.cache.clear();
        self.rule_props.clear();
        self.stats.full_clears += 1;
    }

    /// Counters for this engine's passes
    pub fn stats(&self) -> &StyleStats {
        &self.stats
    }

    /// The shared resolved-style cache
    pub fn cache(&self) -> &StyleCache {
        &self.cache
    }
}
