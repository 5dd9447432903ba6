//! Topic graph construction.
//!
//! Records in, graph out. Construction never fails: every malformed input
//! (duplicate id, unknown reference, cyclic edge) degrades to a warning plus a
//! defined structural fallback, and the caller always gets a navigable graph.
//! Given identical input order the output is fully deterministic; first-wins
//! deduplication makes it input-order dependent on purpose.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::model::{NodeRecord, ParseError};
use crate::reference::NodeRef;

use super::autolink;
use super::warnings::{Warning, WarningKind, Warnings};
use super::{FlowNode, TopicGraph};

/// Build the graph for one topic out of a flat record collection.
///
/// `records` may span topics; everything outside `topic` is ignored.
/// `external_repos` is consulted for name membership only; remote references
/// are never dereferenced here. `parse_errors` are attached verbatim, filtered
/// to the topic.
pub fn build_graph(
    records: &[NodeRecord],
    topic: &str,
    external_repos: &HashSet<String>,
    parse_errors: &[ParseError],
) -> TopicGraph {
    let mut graph = TopicGraph {
        topic: topic.to_string(),
        nodes: HashMap::new(),
        order: Vec::new(),
        children: HashMap::new(),
        roots: Vec::new(),
        warnings: Warnings::new(),
        parse_errors: Vec::new(),
    };

    // First registration wins; later records with the same id only warn.
    for record in records.iter().filter(|r| r.topic == topic) {
        if graph.nodes.contains_key(&record.id) {
            graph.warnings.push(
                Warning::new(
                    WarningKind::DuplicateId,
                    record.id.clone(),
                    format!(
                        "node id '{}' is already defined in topic '{}'",
                        record.id, topic
                    ),
                )
                .at(record.location.clone()),
            );
            continue;
        }
        graph.order.push(record.id.clone());
        graph
            .nodes
            .insert(record.id.clone(), FlowNode::from_record(record));
    }

    resolve_dependencies(&mut graph, external_repos);
    resolve_declared_children(&mut graph, external_repos);

    graph.roots.sort_unstable();
    for list in graph.children.values_mut() {
        list.sort_unstable();
    }

    autolink::auto_link(&mut graph);
    detect_cycles(&mut graph);

    graph.parse_errors = parse_errors
        .iter()
        .filter(|e| e.topic.as_deref() == Some(topic))
        .cloned()
        .collect();

    graph
}

/// Build every topic present in `records` or in topic-carrying parse errors,
/// keyed and ordered by topic name.
pub fn build_topics(
    records: &[NodeRecord],
    parse_errors: &[ParseError],
    external_repos: &HashSet<String>,
) -> BTreeMap<String, TopicGraph> {
    let mut topics: BTreeSet<&str> = records.iter().map(|r| r.topic.as_str()).collect();
    topics.extend(parse_errors.iter().filter_map(|e| e.topic.as_deref()));

    topics
        .into_iter()
        .map(|topic| {
            (
                topic.to_string(),
                build_graph(records, topic, external_repos, parse_errors),
            )
        })
        .collect()
}

/// Turn declared dependencies into child edges. Nodes whose dependency cannot
/// be resolved locally stay navigable as roots, whether the reference is
/// remote, unknown or malformed.
fn resolve_dependencies(graph: &mut TopicGraph, external_repos: &HashSet<String>) {
    let TopicGraph {
        topic,
        nodes,
        order,
        children,
        roots,
        warnings,
        ..
    } = graph;

    for id in order.iter() {
        let Some(node) = nodes.get(id) else { continue };
        let Some(dep) = node.dependency.clone() else {
            roots.push(id.clone());
            continue;
        };
        let location = node.location.clone();

        match NodeRef::classify(&dep) {
            NodeRef::Local(target) if nodes.contains_key(target) => {
                children
                    .entry(target.to_string())
                    .or_default()
                    .push(id.clone());
            }
            NodeRef::Remote { repo, .. } if external_repos.contains(repo) => {
                // Owned by another repository's graph; still an entry point here.
                roots.push(id.clone());
            }
            NodeRef::Remote { repo, .. } => {
                warnings.push(
                    Warning::new(
                        WarningKind::MissingDependency,
                        id.clone(),
                        format!("dependency '{dep}' names unconfigured repository '{repo}'"),
                    )
                    .at(location),
                );
                roots.push(id.clone());
            }
            _ => {
                warnings.push(
                    Warning::new(
                        WarningKind::MissingDependency,
                        id.clone(),
                        format!("dependency '{dep}' does not exist in topic '{topic}'"),
                    )
                    .at(location),
                );
                roots.push(id.clone());
            }
        }
    }
}

/// Add edges for declared children lists. References already present in the
/// parent's child list (for instance via a dependency declared on the other
/// end) are skipped by exact string match. Remote references are added
/// unconditionally; unknown local references are dropped.
fn resolve_declared_children(graph: &mut TopicGraph, external_repos: &HashSet<String>) {
    let TopicGraph {
        topic,
        nodes,
        order,
        children,
        warnings,
        ..
    } = graph;

    for id in order.iter() {
        let Some(node) = nodes.get(id) else { continue };
        if node.declared_children.is_empty() {
            continue;
        }
        let location = node.location.clone();

        for raw in &node.declared_children {
            let already = children
                .get(id)
                .map_or(false, |list| list.iter().any(|c| c == raw));
            if already {
                continue;
            }

            match NodeRef::classify(raw) {
                NodeRef::Remote { repo, .. } => {
                    if !external_repos.contains(repo) {
                        warnings.push(
                            Warning::new(
                                WarningKind::MissingDependency,
                                id.clone(),
                                format!("child '{raw}' names unconfigured repository '{repo}'"),
                            )
                            .at(location.clone()),
                        );
                    }
                    children.entry(id.clone()).or_default().push(raw.clone());
                }
                NodeRef::Local(target) if nodes.contains_key(target) => {
                    children.entry(id.clone()).or_default().push(raw.clone());
                }
                _ => {
                    warnings.push(
                        Warning::new(
                            WarningKind::MissingDependency,
                            id.clone(),
                            format!("child '{raw}' does not exist in topic '{topic}'"),
                        )
                        .at(location.clone()),
                    );
                }
            }
        }
    }
}

/// Advisory cycle detection: depth-first traversal from every root with an
/// explicit work stack, flagging each node that closes a loop exactly once.
/// Edges are left in place; consumers guard their own traversals.
fn detect_cycles(graph: &mut TopicGraph) {
    enum Step<'a> {
        Enter(&'a str),
        Exit(&'a str),
    }

    let TopicGraph {
        nodes,
        children,
        roots,
        warnings,
        ..
    } = graph;

    let mut visited: HashSet<&str> = HashSet::new();
    let mut active: HashSet<&str> = HashSet::new();
    let mut flagged: HashSet<&str> = HashSet::new();
    let mut stack: Vec<Step<'_>> = Vec::new();

    for root in roots.iter() {
        if visited.contains(root.as_str()) {
            continue;
        }
        stack.push(Step::Enter(root.as_str()));

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) => {
                    if active.contains(id) {
                        if flagged.insert(id) {
                            let mut warning = Warning::new(
                                WarningKind::CycleDetected,
                                id,
                                format!("node '{id}' closes a dependency cycle"),
                            );
                            if let Some(node) = nodes.get(id) {
                                warning = warning.at(node.location.clone());
                            }
                            warnings.push(warning);
                        }
                        continue;
                    }
                    if !visited.insert(id) {
                        continue;
                    }
                    active.insert(id);
                    stack.push(Step::Exit(id));
                    if let Some(kids) = children.get(id) {
                        for child in kids.iter().rev() {
                            stack.push(Step::Enter(child.as_str()));
                        }
                    }
                }
                Step::Exit(id) => {
                    active.remove(id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceLocation;

    fn rec(topic: &str, id: &str) -> NodeRecord {
        NodeRecord {
            topic: topic.to_string(),
            id: id.to_string(),
            step: format!("step for {id}"),
            dependency: None,
            dependency_note: None,
            children: None,
            links: Vec::new(),
            location: SourceLocation::new("flows/test.rs", 1),
        }
    }

    fn with_dep(mut record: NodeRecord, dep: &str) -> NodeRecord {
        record.dependency = Some(dep.to_string());
        record
    }

    fn with_children(mut record: NodeRecord, children: &[&str]) -> NodeRecord {
        record.children = Some(children.iter().map(|c| c.to_string()).collect());
        record
    }

    fn repos(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn assert_sorted(list: &[String]) {
        assert!(
            list.windows(2).all(|w| w[0] <= w[1]),
            "not sorted: {list:?}"
        );
    }

    #[test]
    fn empty_input_builds_empty_graph() {
        let graph = build_graph(&[], "checkout", &HashSet::new(), &[]);
        assert_eq!(graph.node_count(), 0);
        assert!(graph.roots().is_empty());
        assert!(graph.warnings().is_empty());
    }

    #[test]
    fn records_from_other_topics_are_ignored() {
        let records = vec![rec("checkout", "A"), rec("signup", "B")];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.node("A").is_some());
        assert!(graph.node("B").is_none());
    }

    #[test]
    fn duplicate_id_keeps_first_record_and_warns_once() {
        let mut second = rec("checkout", "X");
        second.step = "the impostor".to_string();
        second.location = SourceLocation::new("flows/other.rs", 9);
        let records = vec![rec("checkout", "X"), second];

        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);

        assert_eq!(graph.node("X").map(|n| n.step.as_str()), Some("step for X"));
        let duplicates: Vec<_> = graph.warnings().of_kind(WarningKind::DuplicateId).collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(
            duplicates[0].location,
            Some(SourceLocation::new("flows/other.rs", 9))
        );
    }

    #[test]
    fn unknown_dependency_warns_and_stays_a_root() {
        let records = vec![with_dep(rec("checkout", "A"), "GHOST")];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);

        assert_eq!(graph.roots(), ["A".to_string()]);
        let missing: Vec<_> = graph
            .warnings()
            .of_kind(WarningKind::MissingDependency)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].node_id, "A");
    }

    #[test]
    fn recognized_remote_dependency_roots_without_warning() {
        let records = vec![with_dep(rec("checkout", "A"), "billing@NODE-1")];
        let graph = build_graph(&records, "checkout", &repos(&["billing"]), &[]);

        assert_eq!(graph.roots(), ["A".to_string()]);
        assert!(graph.warnings().is_empty());
    }

    #[test]
    fn unrecognized_remote_dependency_roots_with_warning() {
        let records = vec![with_dep(rec("checkout", "A"), "billing@NODE-1")];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);

        // Root membership is identical either way; only the warning differs.
        assert_eq!(graph.roots(), ["A".to_string()]);
        assert_eq!(
            graph
                .warnings()
                .of_kind(WarningKind::MissingDependency)
                .count(),
            1
        );
    }

    #[test]
    fn local_dependency_becomes_child_edge() {
        let records = vec![rec("checkout", "A"), with_dep(rec("checkout", "B"), "A")];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);

        assert_eq!(graph.roots(), ["A".to_string()]);
        assert_eq!(graph.children("A"), ["B".to_string()]);
        assert!(graph.warnings().is_empty());
    }

    #[test]
    fn declared_child_already_implied_by_dependency_is_not_doubled() {
        let records = vec![
            with_children(rec("checkout", "A"), &["B"]),
            with_dep(rec("checkout", "B"), "A"),
        ];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);
        assert_eq!(graph.children("A"), ["B".to_string()]);
    }

    #[test]
    fn unknown_local_child_is_dropped_with_warning() {
        let records = vec![with_children(rec("checkout", "A"), &["GHOST"])];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);

        assert!(graph.children("A").is_empty());
        assert!(!graph.has_children("A"));
        assert_eq!(
            graph
                .warnings()
                .of_kind(WarningKind::MissingDependency)
                .count(),
            1
        );
    }

    #[test]
    fn remote_child_is_added_unconditionally() {
        let records = vec![with_children(rec("checkout", "A"), &["billing@INV-1"])];

        let recognized = build_graph(&records, "checkout", &repos(&["billing"]), &[]);
        assert_eq!(recognized.children("A"), ["billing@INV-1".to_string()]);
        assert!(recognized.warnings().is_empty());

        let unrecognized = build_graph(&records, "checkout", &HashSet::new(), &[]);
        assert_eq!(unrecognized.children("A"), ["billing@INV-1".to_string()]);
        assert_eq!(
            unrecognized
                .warnings()
                .of_kind(WarningKind::MissingDependency)
                .count(),
            1
        );
    }

    #[test]
    fn numeric_sequence_autolinks_into_a_chain() {
        let records = vec![
            rec("checkout", "S-001"),
            rec("checkout", "S-2"),
            rec("checkout", "S-03"),
        ];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);

        assert_eq!(graph.roots(), ["S-001".to_string()]);
        assert!(graph.children("S-001").contains(&"S-2".to_string()));
        assert!(graph.children("S-2").contains(&"S-03".to_string()));
        // Backfill lands on the graph's node, not on the caller's record.
        assert_eq!(
            graph.node("S-2").and_then(|n| n.dependency.as_deref()),
            Some("S-001")
        );
        assert!(records.iter().all(|r| r.dependency.is_none()));
    }

    #[test]
    fn explicit_dependency_blocks_inferred_successor_edge() {
        let records = vec![
            rec("checkout", "S-001"),
            rec("checkout", "S-2"),
            with_dep(rec("checkout", "S-03"), "S-001"),
        ];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);

        assert!(!graph.children("S-2").contains(&"S-03".to_string()));
        assert_eq!(
            graph.children("S-001"),
            ["S-03".to_string(), "S-2".to_string()]
        );
        assert_eq!(graph.roots(), ["S-001".to_string()]);
    }

    #[test]
    fn numeric_collision_is_won_by_record_order() {
        let records = vec![
            rec("checkout", "S-01"),
            rec("checkout", "S-1"),
            rec("checkout", "S-2"),
        ];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);
        assert_eq!(graph.children("S-01"), ["S-2".to_string()]);
        assert!(graph.children("S-1").is_empty());

        let flipped = vec![
            rec("checkout", "S-1"),
            rec("checkout", "S-01"),
            rec("checkout", "S-2"),
        ];
        let graph = build_graph(&flipped, "checkout", &HashSet::new(), &[]);
        assert_eq!(graph.children("S-1"), ["S-2".to_string()]);
        assert!(graph.children("S-01").is_empty());
    }

    #[test]
    fn declared_children_cycle_is_flagged_and_build_terminates() {
        let records = vec![
            with_children(rec("checkout", "A"), &["B"]),
            with_children(rec("checkout", "B"), &["A"]),
        ];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);

        assert!(
            graph
                .warnings()
                .of_kind(WarningKind::CycleDetected)
                .count()
                >= 1
        );
        // Edges stay in place; the graph is still fully queryable.
        assert_eq!(graph.children("A"), ["B".to_string()]);
        assert_eq!(graph.children("B"), ["A".to_string()]);
    }

    #[test]
    fn cycle_warnings_are_deduplicated_per_closing_node() {
        // Two paths into the same loop must not double-report it.
        let records = vec![
            with_children(rec("checkout", "R"), &["A", "B"]),
            with_children(rec("checkout", "A"), &["B"]),
            with_children(rec("checkout", "B"), &["A"]),
        ];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);
        let cycle_nodes: Vec<_> = graph
            .warnings()
            .of_kind(WarningKind::CycleDetected)
            .map(|w| w.node_id.clone())
            .collect();
        let mut deduped = cycle_nodes.clone();
        deduped.dedup();
        assert_eq!(cycle_nodes, deduped);
    }

    #[test]
    fn identical_input_builds_identical_graphs() {
        let records = vec![
            rec("checkout", "S-01"),
            rec("checkout", "S-1"),
            with_dep(rec("checkout", "B"), "GHOST"),
            with_children(rec("checkout", "A"), &["B", "billing@INV-1"]),
        ];
        let errors = vec![ParseError {
            kind: crate::model::ParseErrorKind::MissingStep,
            topic: Some("checkout".to_string()),
            message: "node 'Z' has no step text".to_string(),
            location: SourceLocation::new("flows/test.rs", 40),
        }];
        let repos = repos(&["billing"]);

        let first = build_graph(&records, "checkout", &repos, &errors);
        let second = build_graph(&records, "checkout", &repos, &errors);
        assert_eq!(first, second);
    }

    #[test]
    fn roots_and_child_lists_are_sorted() {
        let records = vec![
            rec("checkout", "zeta"),
            rec("checkout", "alpha"),
            with_children(rec("checkout", "mid"), &["zeta", "alpha"]),
        ];
        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);

        assert_sorted(graph.roots());
        for node in graph.nodes() {
            assert_sorted(graph.children(&node.id));
        }
    }

    #[test]
    fn children_of_unknown_id_is_empty() {
        let graph = build_graph(&[], "checkout", &HashSet::new(), &[]);
        assert!(graph.children("nope").is_empty());
        assert!(!graph.has_children("nope"));
    }

    #[test]
    fn parse_errors_are_filtered_by_topic() {
        let error = |topic: Option<&str>| ParseError {
            kind: crate::model::ParseErrorKind::MissingId,
            topic: topic.map(str::to_string),
            message: "tag without id".to_string(),
            location: SourceLocation::new("flows/test.rs", 3),
        };
        let errors = vec![error(Some("checkout")), error(Some("signup")), error(None)];

        let graph = build_graph(&[], "checkout", &HashSet::new(), &errors);
        assert_eq!(graph.parse_errors().len(), 1);
        assert_eq!(graph.parse_errors()[0].topic.as_deref(), Some("checkout"));
    }

    #[test]
    fn build_topics_covers_record_and_error_topics() {
        let records = vec![rec("checkout", "A"), rec("signup", "B")];
        let errors = vec![ParseError {
            kind: crate::model::ParseErrorKind::MissingStep,
            topic: Some("refund".to_string()),
            message: "node 'R' has no step text".to_string(),
            location: SourceLocation::new("flows/refund.rs", 7),
        }];
        let graphs = build_topics(&records, &errors, &HashSet::new());

        let topics: Vec<_> = graphs.keys().cloned().collect();
        assert_eq!(topics, ["checkout", "refund", "signup"]);
        assert_eq!(graphs["refund"].node_count(), 0);
        assert_eq!(graphs["refund"].parse_errors().len(), 1);
    }

    #[test]
    fn dependency_note_is_carried_onto_the_graph_node() {
        let mut record = with_dep(rec("checkout", "B"), "A");
        record.dependency_note = Some("only after fraud review".to_string());
        let records = vec![rec("checkout", "A"), record];

        let graph = build_graph(&records, "checkout", &HashSet::new(), &[]);
        assert_eq!(
            graph.node("B").and_then(|n| n.dependency_note.as_deref()),
            Some("only after fraud review")
        );
    }
}
