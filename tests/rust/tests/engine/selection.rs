//! Agent source selection

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tests::{Agent, MockSource, SelectionCriteria, Source, SourceRegistry};

/// a: default+recursive, b: default, c: recursive, d: neither (needs key)
fn registry() -> SourceRegistry {
    SourceRegistry::new(vec![
        MockSource::new("a").with_recursive(true).into_arc(),
        MockSource::new("b").into_arc(),
        MockSource::new("c")
            .with_default(false)
            .with_recursive(true)
            .into_arc(),
        MockSource::new("d")
            .with_default(false)
            .with_needs_key(true)
            .into_arc(),
    ])
}

fn selected(criteria: SelectionCriteria) -> Vec<String> {
    Agent::new(&registry(), &criteria)
        .source_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Resolution order
// =============================================================================

#[test]
fn test_no_criteria_selects_default_sources() {
    assert_eq!(selected(SelectionCriteria::new()), vec!["a", "b"]);
}

#[test]
fn test_use_all_selects_whole_registry() {
    assert_eq!(selected(SelectionCriteria::all()), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_use_all_ignores_include_list() {
    let criteria = SelectionCriteria::all().with_sources(["a"]);
    assert_eq!(selected(criteria), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_include_list_replaces_defaults() {
    let criteria = SelectionCriteria::new().with_sources(["c", "d"]);
    assert_eq!(selected(criteria), vec!["c", "d"]);
}

#[test]
fn test_exclude_applies_after_use_all() {
    let criteria = SelectionCriteria::all().excluding(["b", "d"]);
    assert_eq!(selected(criteria), vec!["a", "c"]);
}

#[test]
fn test_exclude_applies_after_defaults() {
    let criteria = SelectionCriteria::new().excluding(["a"]);
    assert_eq!(selected(criteria), vec!["b"]);
}

#[test]
fn test_exclude_applies_after_include() {
    let criteria = SelectionCriteria::new()
        .with_sources(["a", "c"])
        .excluding(["c"]);
    assert_eq!(selected(criteria), vec!["a"]);
}

#[test]
fn test_recursive_only_filters_every_resolution() {
    assert_eq!(
        selected(SelectionCriteria::new().with_recursive_only(true)),
        vec!["a"]
    );
    assert_eq!(
        selected(SelectionCriteria::all().with_recursive_only(true)),
        vec!["a", "c"]
    );
    assert_eq!(
        selected(
            SelectionCriteria::new()
                .with_sources(["b", "d"])
                .with_recursive_only(true)
        ),
        Vec::<String>::new()
    );
}

// =============================================================================
// Names
// =============================================================================

#[test]
fn test_unknown_names_are_dropped() {
    let criteria = SelectionCriteria::new().with_sources(["a", "zzz"]);
    assert_eq!(selected(criteria), vec!["a"]);

    let criteria = SelectionCriteria::new().excluding(["zzz"]);
    assert_eq!(selected(criteria), vec!["a", "b"]);
}

#[test]
fn test_only_unknown_names_select_nothing() {
    let agent = Agent::new(
        &registry(),
        &SelectionCriteria::new().with_sources(["nope", "nada"]),
    );
    assert!(agent.is_empty());
}

#[test]
fn test_names_match_case_insensitively() {
    let criteria = SelectionCriteria::new()
        .with_sources(["A", "C", "D"])
        .excluding(["d"]);
    assert_eq!(selected(criteria), vec!["a", "c"]);
}

#[test]
fn test_duplicate_includes_collapse() {
    let criteria = SelectionCriteria::new().with_sources(["a", "A", "a"]);
    assert_eq!(selected(criteria), vec!["a"]);
}

// =============================================================================
// Shared instances
// =============================================================================

#[test]
fn test_agent_holds_registry_instances() {
    let registry = registry();
    let agent = Agent::new(&registry, &SelectionCriteria::new().with_sources(["b"]));

    let held = agent.sources().next().expect("one source");
    let registered = registry.get("b").expect("registered");

    assert!(Arc::ptr_eq(held, registered));
}

#[test]
fn test_builtin_defaults_include_fofa() {
    let registry = SourceRegistry::with_all_sources();
    let agent = Agent::new(&registry, &SelectionCriteria::new());

    assert!(agent.contains("fofa"));
    assert!(agent.sources().all(|s| s.is_default()));
}
