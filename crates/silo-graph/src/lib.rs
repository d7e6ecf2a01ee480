//! Silo Graph: directed labeled facts and multi-hop relationship queries
//!
//! Answers the beneficial-owner question ("who ultimately controls X?") by
//! walking outgoing `owned_by` / `controlled_by` edges.
//!
//! # Example
//!
//! ```
//! use silo_graph::GraphStore;
//!
//! let mut graph = GraphStore::new();
//! graph.ingest_fact("ShellCompany_X", "owned_by", "HoldingCompany_Y");
//! graph.ingest_fact("HoldingCompany_Y", "controlled_by", "Mr_Smith");
//!
//! let lines = graph.query_relationships("ShellCompany_X", 2);
//! assert_eq!(lines, vec![
//!     "ShellCompany_X --[owned_by]--> HoldingCompany_Y",
//!     "HoldingCompany_Y --[controlled_by]--> Mr_Smith",
//! ]);
//!
//! let owners = graph.beneficial_owners("ShellCompany_X", &["owned_by", "controlled_by"], 5);
//! assert_eq!(owners[0].owner, "Mr_Smith");
//! ```

pub mod fact;
pub mod store;

pub use fact::{GraphError, GraphFact};
pub use store::{GraphStore, OwnershipChain};

/// Deep enough for entity → holding → controlling person → board seat
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Predicates that transfer control up an ownership chain
pub const CONTROL_PREDICATES: [&str; 2] = ["owned_by", "controlled_by"];
