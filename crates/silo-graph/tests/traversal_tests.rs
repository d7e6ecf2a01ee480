//! Integration tests for ownership traversal over a shared graph.

use silo_graph::{GraphFact, GraphStore, CONTROL_PREDICATES, DEFAULT_MAX_DEPTH};
use std::sync::Arc;
use std::thread;

fn financial_graph() -> GraphStore {
    let mut graph = GraphStore::new();
    graph.ingest_fact("ShellCompany_X", "owned_by", "HoldingCompany_Y");
    graph.ingest_fact("HoldingCompany_Y", "controlled_by", "Mr_Smith");
    graph.ingest_fact("Mr_Smith", "is_board_member_of", "MegaCorp");
    graph
}

// =============================================================================
// Beneficial-owner scenario
// =============================================================================

#[test]
fn test_default_depth_covers_full_chain() {
    let lines = financial_graph().query_relationships("ShellCompany_X", DEFAULT_MAX_DEPTH);
    assert_eq!(
        lines,
        vec![
            "ShellCompany_X --[owned_by]--> HoldingCompany_Y",
            "HoldingCompany_Y --[controlled_by]--> Mr_Smith",
            "Mr_Smith --[is_board_member_of]--> MegaCorp",
        ]
    );
}

#[test]
fn test_lines_parse_back_into_facts() {
    let graph = financial_graph();
    let facts: Vec<GraphFact> = graph
        .query_relationships("ShellCompany_X", DEFAULT_MAX_DEPTH)
        .iter()
        .map(|line| line.parse().unwrap())
        .collect();

    let rebuilt = GraphStore::from_facts(facts);
    assert_eq!(
        rebuilt.query_relationships("ShellCompany_X", DEFAULT_MAX_DEPTH),
        graph.query_relationships("ShellCompany_X", DEFAULT_MAX_DEPTH)
    );
}

#[test]
fn test_ultimate_owner_is_mr_smith() {
    let owners = financial_graph().beneficial_owners("ShellCompany_X", &CONTROL_PREDICATES, 10);
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].owner, "Mr_Smith");
    assert_eq!(owners[0].intermediaries(), vec!["HoldingCompany_Y"]);
}

#[test]
fn test_depth_limit_cuts_owner_chain() {
    let owners = financial_graph().beneficial_owners("ShellCompany_X", &CONTROL_PREDICATES, 1);
    assert_eq!(owners[0].owner, "HoldingCompany_Y");
}

// =============================================================================
// Shared read-only access
// =============================================================================

#[test]
fn test_concurrent_readers() {
    let graph = Arc::new(financial_graph());
    let expected = graph.query_relationships("ShellCompany_X", 3);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let graph = Arc::clone(&graph);
            thread::spawn(move || {
                let entity = if i % 2 == 0 { "ShellCompany_X" } else { "Unknown_Co" };
                (i, graph.query_relationships(entity, 3))
            })
        })
        .collect();

    for handle in handles {
        let (i, lines) = handle.join().unwrap();
        if i % 2 == 0 {
            assert_eq!(lines, expected);
        } else {
            assert_eq!(lines, vec!["No knowledge found for Unknown_Co"]);
        }
    }
}

#[test]
fn test_large_cyclic_graph_terminates() {
    let mut graph = GraphStore::new();
    for i in 0..1_000 {
        graph.ingest_fact(format!("n{}", i), "owned_by", format!("n{}", (i + 1) % 1_000));
        graph.ingest_fact(format!("n{}", i), "controlled_by", format!("n{}", (i * 7) % 1_000));
    }

    let lines = graph.query_relationships("n0", 5);
    assert!(!lines.is_empty());
    assert!(lines.len() <= 2 * 1_000);
}
