//! Graph facts and their evidence-line encoding
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("GRAPH/malformed edge line: {0}")]
    MalformedEdge(String),
    #[error("GRAPH/invalid fact file: {0}")]
    InvalidFacts(String),
}

/// A directed edge `subject --[predicate]--> object`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphFact {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl GraphFact {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.subject == self.object
    }
}

impl fmt::Display for GraphFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --[{}]--> {}", self.subject, self.predicate, self.object)
    }
}

impl FromStr for GraphFact {
    type Err = GraphError;

    /// Parse a line previously produced by `Display`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || GraphError::MalformedEdge(line.to_string());

        let (subject, rest) = line.split_once(" --[").ok_or_else(malformed)?;
        let (predicate, object) = rest.split_once("]--> ").ok_or_else(malformed)?;

        let (subject, predicate, object) = (subject.trim(), predicate.trim(), object.trim());
        if subject.is_empty() || predicate.is_empty() || object.is_empty() {
            return Err(malformed());
        }
        Ok(Self::new(subject, predicate, object))
    }
}
