//! End-to-end cascade tests
//!
//! Exercises the full pipeline: sheet build, dirty-scoped walking,
//! selector matching, specificity-ordered application, and the shared
//! resolved-style cache.

use std::sync::Arc;

use alder_style::{
    Color, CustomProperty, PropertyId, RuleBuilder, SelectorBuilder, SheetBuilder,
    SimpleSelectorBuilder, StyleEngine, StyleSheet, StyleValue,
};
use alder_tree::{ElementTree, NodeId, PseudoStates};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn simple() -> SimpleSelectorBuilder {
    SimpleSelectorBuilder::new()
}

/// panel root with one button child, returned as (tree, root, button)
fn panel_with_button() -> (ElementTree, NodeId, NodeId) {
    let mut tree = ElementTree::new();
    let root = tree.create_element("panel");
    let button = tree.create_element("button");
    tree.append_child(root, button).unwrap();
    (tree, root, button)
}

#[test]
fn test_higher_specificity_wins_regardless_of_order() {
    init_logging();

    let build = |id_rule_first: bool| -> Arc<StyleSheet> {
        let id_rule = (
            SelectorBuilder::simple(simple().id("confirm")),
            RuleBuilder::new().float("width", 100.0),
        );
        let class_rule = (
            SelectorBuilder::simple(simple().class("primary")),
            RuleBuilder::new().float("width", 50.0),
        );
        let builder = SheetBuilder::new();
        let builder = if id_rule_first {
            builder.rule(id_rule.0, id_rule.1).rule(class_rule.0, class_rule.1)
        } else {
            builder.rule(class_rule.0, class_rule.1).rule(id_rule.0, id_rule.1)
        };
        builder.build().unwrap()
    };

    for id_rule_first in [true, false] {
        let (mut tree, root, button) = panel_with_button();
        tree.set_id(button, "confirm");
        tree.add_class(button, "primary");

        let mut engine = StyleEngine::new();
        engine.attach_sheet(&mut tree, root, build(id_rule_first));
        engine.apply_styles(&mut tree, root);

        let style = engine.resolved(button).unwrap();
        assert_eq!(
            style.float(PropertyId::Width),
            Some(100.0),
            "id rule must win with id_rule_first={id_rule_first}"
        );
    }
}

#[test]
fn test_equal_specificity_later_rule_wins() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();
    tree.add_class(button, "primary");
    tree.add_class(button, "wide");

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().class("primary")),
            RuleBuilder::new().float("width", 50.0),
        )
        .rule(
            SelectorBuilder::simple(simple().class("wide")),
            RuleBuilder::new().float("width", 80.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);

    // Both rules have specificity 10; the one discovered later wins
    let style = engine.resolved(button).unwrap();
    assert_eq!(style.float(PropertyId::Width), Some(80.0));
}

#[test]
fn test_later_attached_sheet_wins_ties() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();
    tree.add_class(button, "primary");

    let first = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().class("primary")),
            RuleBuilder::new().color("color", Color::rgb(255, 0, 0)),
        )
        .build()
        .unwrap();
    let second = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().class("primary")),
            RuleBuilder::new().color("color", Color::rgb(0, 0, 255)),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, first);
    engine.attach_sheet(&mut tree, root, second);
    engine.apply_styles(&mut tree, root);

    let style = engine.resolved(button).unwrap();
    assert_eq!(style.color(PropertyId::Color), Some(Color::rgb(0, 0, 255)));
}

#[test]
fn test_shorthand_expansion_through_pipeline() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("button")),
            RuleBuilder::new().floats("margin", &[1.0, 2.0, 3.0]),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);

    let style = engine.resolved(button).unwrap();
    assert_eq!(style.float(PropertyId::MarginTop), Some(1.0));
    assert_eq!(style.float(PropertyId::MarginRight), Some(2.0));
    assert_eq!(style.float(PropertyId::MarginBottom), Some(3.0));
    assert_eq!(style.float(PropertyId::MarginLeft), Some(2.0));
}

#[test]
fn test_identical_elements_share_one_record() {
    init_logging();
    let mut tree = ElementTree::new();
    let root = tree.create_element("panel");
    let a = tree.create_element("button");
    let b = tree.create_element("button");
    tree.append_child(root, a).unwrap();
    tree.append_child(root, b).unwrap();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("button")),
            RuleBuilder::new().float("width", 40.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);

    let style_a = Arc::clone(engine.resolved(a).unwrap());
    let style_b = Arc::clone(engine.resolved(b).unwrap());
    assert!(Arc::ptr_eq(&style_a, &style_b));
    assert_eq!(engine.stats().cache_misses, 2); // root + first button
    assert_eq!(engine.stats().cache_hits, 1); // second button
}

#[test]
fn test_resolution_is_idempotent_and_cache_clear_rebuilds_equal() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("button")),
            RuleBuilder::new().float("width", 40.0).float("--depth", 2.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);
    let first = Arc::clone(engine.resolved(button).unwrap());

    // No dirty flags in between: the very same record stays attached
    engine.apply_styles(&mut tree, root);
    let second = Arc::clone(engine.resolved(button).unwrap());
    assert!(Arc::ptr_eq(&first, &second));

    // Dirtied but unchanged: the cache serves the identical record
    tree.mark_styles_dirty(button);
    engine.apply_styles(&mut tree, root);
    assert!(Arc::ptr_eq(&first, engine.resolved(button).unwrap()));

    // After a full clear, re-resolution builds a value-equal record
    engine.clear_caches();
    tree.mark_styles_dirty(button);
    engine.apply_styles(&mut tree, root);
    let rebuilt = Arc::clone(engine.resolved(button).unwrap());
    assert_eq!(*first, *rebuilt);
}

#[test]
fn test_sibling_subtree_unaffected_by_scoped_sheet() {
    init_logging();
    let mut tree = ElementTree::new();
    let root = tree.create_element("panel");
    let section_a = tree.create_element("box");
    let section_b = tree.create_element("box");
    let label_a = tree.create_element("label");
    let label_b = tree.create_element("label");
    tree.append_child(root, section_a).unwrap();
    tree.append_child(root, section_b).unwrap();
    tree.append_child(section_a, label_a).unwrap();
    tree.append_child(section_b, label_b).unwrap();

    let scoped = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("label")),
            RuleBuilder::new().float("font-size", 20.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, section_a, scoped);
    engine.apply_styles(&mut tree, root);

    let styled = engine.resolved(label_a).unwrap();
    assert_eq!(styled.float(PropertyId::FontSize), Some(20.0));

    // The sheet was attached inside subtree A; its matchers must not
    // leak into the sibling subtree
    let unstyled = engine.resolved(label_b).unwrap();
    assert!(!unstyled.is_set(PropertyId::FontSize));
}

#[test]
fn test_child_combinator_is_depth_exact() {
    init_logging();
    let mut tree = ElementTree::new();
    let root = tree.create_element("panel");
    let child = tree.create_element("button");
    let grandchild = tree.create_element("button");
    tree.append_child(root, child).unwrap();
    tree.append_child(child, grandchild).unwrap();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("panel"))
                .child(simple().type_name("button")),
            RuleBuilder::new().float("width", 10.0),
        )
        .rule(
            SelectorBuilder::simple(simple().type_name("panel"))
                .descendant(simple().type_name("button")),
            RuleBuilder::new().float("height", 5.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);

    let direct = engine.resolved(child).unwrap();
    assert_eq!(direct.float(PropertyId::Width), Some(10.0));
    assert_eq!(direct.float(PropertyId::Height), Some(5.0));

    // Child combinator expired below its exact depth; descendant kept
    // matching
    let deep = engine.resolved(grandchild).unwrap();
    assert!(!deep.is_set(PropertyId::Width));
    assert_eq!(deep.float(PropertyId::Height), Some(5.0));
}

#[test]
fn test_pseudo_class_requires_state() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("button").pseudo("hover")),
            RuleBuilder::new().color("background-color", Color::rgb(40, 40, 40)),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);
    assert!(!engine.resolved(button).unwrap().is_set(PropertyId::BackgroundColor));

    tree.insert_pseudo_state(button, PseudoStates::HOVER);
    engine.apply_styles(&mut tree, root);
    assert_eq!(
        engine.resolved(button).unwrap().color(PropertyId::BackgroundColor),
        Some(Color::rgb(40, 40, 40))
    );
}

#[test]
fn test_pseudo_class_negation() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("button").pseudo("enabled")),
            RuleBuilder::new().float("opacity", 1.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);

    // No Disabled bit set: :enabled matches
    assert_eq!(engine.resolved(button).unwrap().float(PropertyId::Opacity), Some(1.0));

    tree.insert_pseudo_state(button, PseudoStates::DISABLED);
    engine.apply_styles(&mut tree, root);
    assert!(!engine.resolved(button).unwrap().is_set(PropertyId::Opacity));
}

#[test]
fn test_clean_subtrees_are_skipped() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("button")),
            RuleBuilder::new().float("width", 40.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);

    let restyled = engine.stats().nodes_restyled;
    let before = Arc::clone(engine.resolved(button).unwrap());

    // Nothing was dirtied: the pass must not revisit the subtree
    engine.apply_styles(&mut tree, root);
    assert_eq!(engine.stats().nodes_restyled, restyled);
    assert!(engine.stats().subtrees_skipped >= 1);
    assert!(Arc::ptr_eq(&before, engine.resolved(button).unwrap()));
}

#[test]
fn test_path_dirty_restyles_only_the_dirty_leaf() {
    init_logging();
    let mut tree = ElementTree::new();
    let root = tree.create_element("panel");
    let middle = tree.create_element("box");
    let leaf = tree.create_element("label");
    tree.append_child(root, middle).unwrap();
    tree.append_child(middle, leaf).unwrap();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().class("big")),
            RuleBuilder::new().float("font-size", 22.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);
    let restyled = engine.stats().nodes_restyled;

    tree.add_class(leaf, "big");
    engine.apply_styles(&mut tree, root);

    // Only the leaf itself was rebuilt; root and middle sat on the
    // dirty path without property work
    assert_eq!(engine.stats().nodes_restyled, restyled + 1);
    assert_eq!(engine.resolved(leaf).unwrap().float(PropertyId::FontSize), Some(22.0));
}

#[test]
fn test_base_style_seeds_at_specificity_zero() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("button")),
            RuleBuilder::new().float("font-size", 14.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.set_base_style(
        "button",
        vec![
            (PropertyId::FontSize, StyleValue::Float(11.0)),
            (PropertyId::Opacity, StyleValue::Float(0.9)),
        ],
    );
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);

    let style = engine.resolved(button).unwrap();
    // Matched rule beats the seed; untouched seed values remain
    assert_eq!(style.float(PropertyId::FontSize), Some(14.0));
    assert_eq!(style.float(PropertyId::Opacity), Some(0.9));
    assert_eq!(style.slot(PropertyId::Opacity).specificity, 0);
}

#[test]
fn test_inline_override_beats_id_selector() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();
    tree.set_id(button, "confirm");

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().id("confirm")),
            RuleBuilder::new().float("width", 100.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.set_inline(&mut tree, button, PropertyId::Width, StyleValue::Float(250.0));
    engine.apply_styles(&mut tree, root);

    let style = engine.resolved(button).unwrap();
    assert_eq!(style.float(PropertyId::Width), Some(250.0));

    // Clearing the override restores the cascade value
    engine.clear_inline(&mut tree, button);
    engine.apply_styles(&mut tree, root);
    assert_eq!(engine.resolved(button).unwrap().float(PropertyId::Width), Some(100.0));
}

#[test]
fn test_custom_property_read_through_engine() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("button")),
            RuleBuilder::new().float("--glow-strength", 1.5),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);

    let style = engine.resolved(button).unwrap();
    let mut glow = CustomProperty::<f32>::default();
    assert!(style.apply_custom_property("--glow-strength", &mut glow));
    assert_eq!(glow.value, 1.5);
    assert_eq!(glow.specificity, 1);

    // Declared float, read as bool: zero value, warning logged
    let mut wrong = CustomProperty::<bool>::default();
    assert!(!style.apply_custom_property("--glow-strength", &mut wrong));
    assert!(!wrong.value);
}

#[test]
fn test_dirty_style_sheets_forces_reresolution() {
    init_logging();
    let (mut tree, root, button) = panel_with_button();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("button")),
            RuleBuilder::new().float("width", 40.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);
    engine.apply_styles(&mut tree, root);
    let restyled = engine.stats().nodes_restyled;

    engine.dirty_style_sheets(&mut tree);
    engine.apply_styles(&mut tree, root);
    assert!(engine.stats().nodes_restyled > restyled);
    assert_eq!(engine.resolved(button).unwrap().float(PropertyId::Width), Some(40.0));
}

#[test]
fn test_whole_tree_entry_point() {
    init_logging();
    let mut tree = ElementTree::new();
    let root_a = tree.create_element("panel");
    let root_b = tree.create_element("panel");
    let leaf_a = tree.create_element("label");
    let leaf_b = tree.create_element("label");
    tree.append_child(root_a, leaf_a).unwrap();
    tree.append_child(root_b, leaf_b).unwrap();

    let sheet_a = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("label")),
            RuleBuilder::new().float("font-size", 10.0),
        )
        .build()
        .unwrap();
    let sheet_b = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("label")),
            RuleBuilder::new().float("font-size", 16.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root_a, sheet_a);
    engine.attach_sheet(&mut tree, root_b, sheet_b);
    engine.apply_styles_all(&mut tree);

    assert_eq!(engine.resolved(leaf_a).unwrap().float(PropertyId::FontSize), Some(10.0));
    assert_eq!(engine.resolved(leaf_b).unwrap().float(PropertyId::FontSize), Some(16.0));
}

#[test]
fn test_subtree_resolution_sees_ancestor_sheets() {
    init_logging();
    let mut tree = ElementTree::new();
    let root = tree.create_element("panel");
    let section = tree.create_element("box");
    let label = tree.create_element("label");
    tree.append_child(root, section).unwrap();
    tree.append_child(section, label).unwrap();

    let sheet = SheetBuilder::new()
        .rule(
            SelectorBuilder::simple(simple().type_name("panel"))
                .descendant(simple().type_name("label")),
            RuleBuilder::new().float("font-size", 18.0),
        )
        .build()
        .unwrap();

    let mut engine = StyleEngine::new();
    engine.attach_sheet(&mut tree, root, sheet);

    // Resolve only the inner subtree: the sheet attached above it must
    // still apply, including the cross-boundary descendant chain
    engine.apply_styles(&mut tree, section);
    assert_eq!(engine.resolved(label).unwrap().float(PropertyId::FontSize), Some(18.0));
}
