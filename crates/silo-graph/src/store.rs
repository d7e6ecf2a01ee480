//! In-memory graph store
//!
//! Ingestion takes `&mut self`; every query takes `&self`. Build the store
//! up front, then share it as `Arc<GraphStore>` so concurrent traversals run
//! without locks.
use crate::fact::{GraphError, GraphFact};
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// Every ingested fact, duplicates included, in ingestion order
    facts: Vec<GraphFact>,
    /// Adjacency list: subject -> indexes into `facts`
    outgoing: HashMap<String, Vec<usize>>,
    /// Subjects and objects
    nodes: HashSet<String>,
}

/// One resolved controller and the edges leading to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipChain {
    pub owner: String,
    pub path: Vec<GraphFact>,
}

impl OwnershipChain {
    /// Entities between the queried entity and the owner
    pub fn intermediaries(&self) -> Vec<&str> {
        let hops = self.path.len().saturating_sub(1);
        self.path[..hops].iter().map(|f| f.object.as_str()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct FactFile {
    facts: Vec<GraphFact>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_facts<I>(facts: I) -> Self
    where
        I: IntoIterator<Item = GraphFact>,
    {
        let mut store = Self::new();
        for fact in facts {
            store.ingest(fact);
        }
        store
    }

    /// Load from YAML of the form `facts: [{subject, predicate, object}]`
    pub fn from_yaml(yaml: &str) -> Result<Self, GraphError> {
        let file: FactFile =
            serde_yaml::from_str(yaml).map_err(|e| GraphError::InvalidFacts(e.to_string()))?;
        Ok(Self::from_facts(file.facts))
    }

    pub fn ingest_fact(
        &mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) {
        self.ingest(GraphFact::new(subject, predicate, object));
    }

    pub fn ingest(&mut self, fact: GraphFact) {
        let index = self.facts.len();
        self.nodes.insert(fact.subject.clone());
        self.nodes.insert(fact.object.clone());
        self.outgoing
            .entry(fact.subject.clone())
            .or_default()
            .push(index);
        self.facts.push(fact);
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.nodes.contains(entity)
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Outgoing edges of `entity` in ingestion order
    pub fn outgoing(&self, entity: &str) -> impl Iterator<Item = &GraphFact> + '_ {
        self.outgoing
            .get(entity)
            .into_iter()
            .flatten()
            .map(move |&i| &self.facts[i])
    }

    /// Breadth-first edges reachable from `entity` within `max_depth` hops.
    ///
    /// Each node is expanded at most once and each distinct fact is yielded
    /// once, so cycles and duplicate ingestion cannot grow the result.
    /// Returns `None` when `entity` is not in the graph.
    pub fn traverse(&self, entity: &str, max_depth: usize) -> Option<Vec<&GraphFact>> {
        let root = self.nodes.get(entity)?;

        let mut edges = Vec::new();
        let mut discovered: HashSet<&str> = HashSet::from([root.as_str()]);
        let mut yielded: HashSet<&GraphFact> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(root.as_str(), 0)]);

        while let Some((node, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for fact in self.outgoing(node) {
                if !yielded.insert(fact) {
                    continue;
                }
                edges.push(fact);
                if discovered.insert(fact.object.as_str()) {
                    queue.push_back((fact.object.as_str(), depth + 1));
                }
            }
        }

        Some(edges)
    }

    /// Evidence lines for `entity`: one `"{s} --[{p}]--> {o}"` per traversed
    /// edge, or a single "No knowledge found" line when the entity is unknown.
    pub fn query_relationships(&self, entity: &str, max_depth: usize) -> Vec<String> {
        match self.traverse(entity, max_depth) {
            Some(edges) => {
                tracing::debug!(entity, max_depth, edges = edges.len(), "graph traversal");
                edges.into_iter().map(ToString::to_string).collect()
            }
            None => {
                tracing::debug!(entity, "entity not in graph");
                vec![format!("No knowledge found for {}", entity)]
            }
        }
    }

    /// Resolve the ultimate controllers of `entity`.
    ///
    /// Follows only edges whose predicate is in `control_predicates`, depth
    /// first in ingestion order. A chain ends at a node with no further
    /// control edge or at `max_depth`. Nodes already on the current path are
    /// never re-entered, so circular holdings terminate.
    pub fn beneficial_owners(
        &self,
        entity: &str,
        control_predicates: &[&str],
        max_depth: usize,
    ) -> Vec<OwnershipChain> {
        let mut chains = Vec::new();
        if !self.contains(entity) || max_depth == 0 {
            return chains;
        }

        let mut on_path = vec![entity];
        let mut path = Vec::new();
        self.walk_control(entity, control_predicates, max_depth, &mut on_path, &mut path, &mut chains);
        chains
    }

    fn walk_control<'a>(
        &'a self,
        node: &str,
        control_predicates: &[&str],
        max_depth: usize,
        on_path: &mut Vec<&'a str>,
        path: &mut Vec<&'a GraphFact>,
        chains: &mut Vec<OwnershipChain>,
    ) {
        let next: Vec<&GraphFact> = if path.len() < max_depth {
            self.outgoing(node)
                .filter(|f| control_predicates.contains(&f.predicate.as_str()))
                .filter(|f| !on_path.contains(&f.object.as_str()))
                .collect()
        } else {
            Vec::new()
        };

        if next.is_empty() {
            if !path.is_empty() {
                chains.push(OwnershipChain {
                    owner: node.to_string(),
                    path: path.iter().map(|f| (*f).clone()).collect(),
                });
            }
            return;
        }

        for fact in next {
            on_path.push(fact.object.as_str());
            path.push(fact);
            self.walk_control(&fact.object, control_predicates, max_depth, on_path, path, chains);
            path.pop();
            on_path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CONTROL_PREDICATES;

    fn ownership_graph() -> GraphStore {
        let mut graph = GraphStore::new();
        graph.ingest_fact("A", "owned_by", "B");
        graph.ingest_fact("B", "controlled_by", "C");
        graph.ingest_fact("C", "is_board_member_of", "D");
        graph
    }

    #[test]
    fn test_depth_two_stops_early() {
        let lines = ownership_graph().query_relationships("A", 2);
        assert_eq!(lines, vec!["A --[owned_by]--> B", "B --[controlled_by]--> C"]);
    }

    #[test]
    fn test_depth_three_reaches_board() {
        let lines = ownership_graph().query_relationships("A", 3);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "C --[is_board_member_of]--> D");
    }

    #[test]
    fn test_unknown_entity_soft_miss() {
        let lines = ownership_graph().query_relationships("Nobody", 3);
        assert_eq!(lines, vec!["No knowledge found for Nobody"]);
    }

    #[test]
    fn test_sink_node_has_no_edges() {
        assert!(ownership_graph().query_relationships("D", 3).is_empty());
    }

    #[test]
    fn test_zero_depth() {
        assert!(ownership_graph().query_relationships("A", 0).is_empty());
    }

    #[test]
    fn test_breadth_first_order() {
        let mut graph = GraphStore::new();
        graph.ingest_fact("root", "owned_by", "left");
        graph.ingest_fact("left", "owned_by", "left_parent");
        graph.ingest_fact("root", "owned_by", "right");
        graph.ingest_fact("right", "owned_by", "right_parent");

        let lines = graph.query_relationships("root", 2);
        assert_eq!(
            lines,
            vec![
                "root --[owned_by]--> left",
                "root --[owned_by]--> right",
                "left --[owned_by]--> left_parent",
                "right --[owned_by]--> right_parent",
            ]
        );
    }

    #[test]
    fn test_cycle_terminates() {
        let mut graph = GraphStore::new();
        graph.ingest_fact("A", "owned_by", "B");
        graph.ingest_fact("B", "owned_by", "A");
        graph.ingest_fact("A", "owns", "A");

        let lines = graph.query_relationships("A", 50);
        assert_eq!(
            lines,
            vec!["A --[owned_by]--> B", "A --[owns]--> A", "B --[owned_by]--> A"]
        );
    }

    #[test]
    fn test_duplicate_ingestion_same_result() {
        let mut graph = ownership_graph();
        let before = graph.query_relationships("A", 3);
        graph.ingest_fact("A", "owned_by", "B");
        graph.ingest_fact("B", "controlled_by", "C");

        assert_eq!(graph.fact_count(), 5);
        assert_eq!(graph.query_relationships("A", 3), before);
    }

    #[test]
    fn test_parallel_predicates_both_reported() {
        let mut graph = GraphStore::new();
        graph.ingest_fact("A", "owned_by", "B");
        graph.ingest_fact("A", "controlled_by", "B");

        let lines = graph.query_relationships("A", 1);
        assert_eq!(lines, vec!["A --[owned_by]--> B", "A --[controlled_by]--> B"]);
    }

    #[test]
    fn test_beneficial_owner_chain() {
        let owners = ownership_graph().beneficial_owners("A", &CONTROL_PREDICATES, 5);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].owner, "C");
        assert_eq!(owners[0].intermediaries(), vec!["B"]);
        assert_eq!(owners[0].path.len(), 2);
    }

    #[test]
    fn test_beneficial_owner_split_control() {
        let mut graph = GraphStore::new();
        graph.ingest_fact("Target", "owned_by", "Fund_1");
        graph.ingest_fact("Target", "owned_by", "Fund_2");
        graph.ingest_fact("Fund_1", "controlled_by", "Alice");
        graph.ingest_fact("Fund_2", "controlled_by", "Bob");

        let owners: Vec<String> = graph
            .beneficial_owners("Target", &CONTROL_PREDICATES, 5)
            .into_iter()
            .map(|c| c.owner)
            .collect();
        assert_eq!(owners, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_beneficial_owner_circular_holding() {
        let mut graph = GraphStore::new();
        graph.ingest_fact("A", "owned_by", "B");
        graph.ingest_fact("B", "owned_by", "A");

        let owners = graph.beneficial_owners("A", &CONTROL_PREDICATES, 10);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].owner, "B");
    }

    #[test]
    fn test_beneficial_owner_unknown_entity() {
        assert!(ownership_graph()
            .beneficial_owners("Z", &CONTROL_PREDICATES, 5)
            .is_empty());
    }

    #[test]
    fn test_load_from_yaml() {
        let graph = GraphStore::from_yaml(
            r#"
facts:
  - { subject: A, predicate: owned_by, object: B }
  - { subject: B, predicate: controlled_by, object: C }
"#,
        )
        .unwrap();
        assert_eq!(graph.fact_count(), 2);
        assert_eq!(graph.node_count(), 3);
        assert!(graph.contains("C"));
    }
}
