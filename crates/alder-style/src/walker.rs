//! Cascade walker
//!
//! Depth-first pre-order traversal that activates selector-chain
//! matchers as it descends and collects, per element, the complex
//! selectors whose whole chain matched.
//!
//! Matchers obey stack discipline: the stack length is recorded when an
//! element is entered and truncated back when it is left, so neither the
//! matchers pushed for its attached sheets nor the clones advanced onto
//! its descendants can leak into a sibling subtree.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use alder_tree::{ElementTree, NodeId};
use smallvec::SmallVec;

use crate::apply;
use crate::cache::fold_hash;
use crate::engine::StyleEngine;
use crate::matcher::matches_simple;
use crate::sheet::{Combinator, StyleSheet};

/// One active selector-chain position
///
/// Created when a subtree root's sheets are pushed; advanced by cloning
/// as links match; discarded when the owning subtree is left.
#[derive(Debug)]
struct Matcher {
    sheet: Arc<StyleSheet>,
    selector_index: u32,
    /// Link of the chain this matcher is waiting to match
    chain_index: u32,
    /// Depth this matcher becomes eligible at
    min_depth: u32,
    /// Child combinator: eligible at exactly `min_depth`, then expired
    exact_depth: bool,
}

/// A complex selector whose full chain matched one element
#[derive(Debug, Clone)]
pub(crate) struct MatchedRule {
    pub sheet: Arc<StyleSheet>,
    pub selector_index: u32,
    pub specificity: i32,
}

/// One style pass over a dirty subtree
pub(crate) struct CascadeWalker<'e, 't> {
    engine: &'e mut StyleEngine,
    tree: &'t mut ElementTree,
    matchers: Vec<Matcher>,
}

impl<'e, 't> CascadeWalker<'e, 't> {
    pub fn new(engine: &'e mut StyleEngine, tree: &'t mut ElementTree) -> Self {
        Self {
            engine,
            tree,
            matchers: Vec::new(),
        }
    }

    /// Resolve the subtree rooted at `root`
    ///
    /// Sheets attached on the path above `root` still apply inside the
    /// subtree, so their matchers are first advanced down the ancestor
    /// path without restyling anything.
    pub fn run(&mut self, root: NodeId) {
        let mut path: Vec<NodeId> = self.tree.ancestors(root).collect();
        path.reverse();
        for (depth, &node) in path.iter().enumerate() {
            self.push_sheets(node, depth as u32);
            let _ = self.match_element(node, depth as u32);
        }
        self.resolve(root, path.len() as u32);
    }

    fn resolve(&mut self, node: NodeId, depth: u32) {
        let Some(element) = self.tree.get(node) else {
            return;
        };
        if !element.needs_style_pass() {
            self.engine.stats.subtrees_skipped += 1;
            return;
        }
        let styles_dirty = element.styles_dirty;

        let watermark = self.matchers.len();
        self.push_sheets(node, depth);
        let matched = self.match_element(node, depth);

        // An element on a dirty path keeps its record; only its own
        // flag forces a rebuild
        if styles_dirty {
            self.attach(node, &matched);
        }

        let children: SmallVec<[NodeId; 8]> = self.tree.children(node).collect();
        for child in children {
            self.resolve(child, depth + 1);
        }

        self.tree.clear_dirty(node);
        self.matchers.truncate(watermark);
    }

    /// Activate matchers for sheets attached at this element
    fn push_sheets(&mut self, node: NodeId, depth: u32) {
        let Some(sheets) = self.engine.attachments.get(&node) else {
            return;
        };
        for sheet in sheets {
            for selector_index in 0..sheet.selectors().len() as u32 {
                self.matchers.push(Matcher {
                    sheet: Arc::clone(sheet),
                    selector_index,
                    chain_index: 0,
                    min_depth: depth,
                    exact_depth: false,
                });
            }
        }
    }

    /// Evaluate every eligible matcher against this element
    ///
    /// Clones advanced to the next chain link are pushed for the
    /// element's descendants and are not evaluated here; fully matched
    /// chains are returned in discovery order.
    fn match_element(&mut self, node: NodeId, depth: u32) -> SmallVec<[MatchedRule; 8]> {
        let mut matched = SmallVec::new();
        let eligible_end = self.matchers.len();

        for index in 0..eligible_end {
            let (sheet, selector_index, chain_index) = {
                let matcher = &self.matchers[index];
                let eligible = if matcher.exact_depth {
                    depth == matcher.min_depth
                } else {
                    depth >= matcher.min_depth
                };
                if !eligible {
                    continue;
                }
                (
                    Arc::clone(&matcher.sheet),
                    matcher.selector_index,
                    matcher.chain_index,
                )
            };

            let (full_match, next_is_child, specificity) = {
                let Some(element) = self.tree.get(node) else {
                    return matched;
                };
                let selector = &sheet.selectors()[selector_index as usize];
                let link = &selector.links[chain_index as usize];
                if !matches_simple(self.tree, element, &link.selector) {
                    continue;
                }
                let next = (chain_index + 1) as usize;
                if next < selector.links.len() {
                    (false, selector.links[next].combinator == Combinator::Child, 0)
                } else {
                    (true, false, selector.specificity)
                }
            };

            if full_match {
                matched.push(MatchedRule {
                    sheet,
                    selector_index,
                    specificity,
                });
            } else {
                self.matchers.push(Matcher {
                    sheet,
                    selector_index,
                    chain_index: chain_index + 1,
                    min_depth: depth + 1,
                    exact_depth: next_is_child,
                });
            }
        }

        matched
    }

    /// Look up or build the resolved record and attach it to the node
    fn attach(&mut self, node: NodeId, matched: &[MatchedRule]) {
        let Some(element) = self.tree.get(node) else {
            return;
        };
        let type_name = self.tree.resolve(element.type_name);

        let salt = self.engine.inline.get(&node).map_or(0, |decls| decls.salt);
        let key = cache_key(type_name, matched, salt);

        let style = match self.engine.cache.get(key) {
            Some(style) => {
                self.engine.stats.cache_hits += 1;
                style
            }
            None => {
                self.engine.stats.cache_misses += 1;
                let base = self.engine.base_styles.get(type_name).map(|v| v.as_slice());
                let style = apply::build_resolved_style(
                    base,
                    matched,
                    self.engine.inline.get(&node),
                    &mut self.engine.rule_props,
                    &self.engine.resources,
                );
                let style = Arc::new(style);
                self.engine.cache.insert(key, Arc::clone(&style));
                style
            }
        };

        self.engine.resolved.insert(node, style);
        self.engine.stats.nodes_restyled += 1;
    }
}

/// Cache key for one element's cascade result
///
/// Seeded from the element's type name, then folded per matched rule
/// with a fixed multiply-xor combiner over the rule identity and its
/// specificity. Inline overrides contribute a per-node salt.
fn cache_key(type_name: &str, matched: &[MatchedRule], inline_salt: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    type_name.hash(&mut hasher);
    let mut key = hasher.finish();

    for rule in matched {
        key = fold_hash(key, rule.sheet.id().rule_key(rule.selector_index));
        key = fold_hash(key, rule.specificity as u64);
    }
    if inline_salt != 0 {
        key = fold_hash(key, inline_salt);
    }
    key
}
