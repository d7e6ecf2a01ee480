//! Entity extraction for graph lookups.
//!
//! Graph entities are identifiers of capitalized segments joined by
//! underscores: `ShellCompany_X`, `HoldingCompany_Y`, `Mr_Smith`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ENTITY_ID: Regex =
        Regex::new(r"\b[A-Z][A-Za-z0-9]*(?:_[A-Za-z0-9]+)+\b").unwrap();
}

/// Entity identifiers in order of first appearance, without repeats
pub fn extract_entities(text: &str) -> Vec<String> {
    let mut entities: Vec<String> = Vec::new();
    for m in ENTITY_ID.find_iter(text) {
        let entity = m.as_str();
        if !entities.iter().any(|e| e == entity) {
            entities.push(entity.to_string());
        }
    }
    entities
}

/// Pick the query's primary subject: the first entity `is_known` accepts,
/// falling back to the first entity mentioned at all.
pub fn primary_subject(text: &str, is_known: impl Fn(&str) -> bool) -> Option<String> {
    let entities = extract_entities(text);
    entities
        .iter()
        .find(|e| is_known(e))
        .or_else(|| entities.first())
        .cloned()
}
