//! The in-memory RDF graph model: an ordered, insertion-order-preserving
//! sequence of [`Triple`]s with alias-aware lookup and idempotent append.

use crate::vocab::{RDF_TYPE, RDF_TYPE_SHORT};
use std::fmt;

/// An immutable RDF statement. Subjects and predicates are always IRI
/// references in their angle-bracketed wire form (e.g. `<http://x/s>`);
/// objects are either IRI references in the same form or literals in their
/// quoted wire form (optionally carrying `@lang` or `^^<iri>`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub is_object_literal: bool,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        is_object_literal: bool,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            is_object_literal,
        }
    }

    /// The one-triple-per-line canonical textual form: `subject predicate object .\n`.
    pub fn to_line(&self) -> String {
        format!("{} {} {} .\n", self.subject, self.predicate, self.object)
    }

    fn predicate_matches(&self, predicate: &str) -> bool {
        predicates_equal(&self.predicate, predicate)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// Compares two predicate tokens treating the bare `a` shorthand as
/// equivalent to the full `rdf:type` IRI.
pub fn predicates_equal(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let normalize = |p: &str| if p == RDF_TYPE_SHORT { RDF_TYPE } else { p };
    normalize(a) == normalize(b)
}

/// An ordered collection of triples. Duplicate `(s, p, o)` triples (modulo
/// the `a`/`rdf:type` predicate alias) are elided on append.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: Vec<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triples(triples: Vec<Triple>) -> Self {
        let mut graph = Self::new();
        for triple in triples {
            graph.append(triple);
        }
        graph
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Appends a triple unless an exact `(s, p, o)` match already exists
    /// (predicate compared with the `a`/`rdf:type` alias). If the existing
    /// match used the `a` shorthand and the new triple supplies the full
    /// IRI, the existing triple's predicate is upgraded in place.
    pub fn append(&mut self, triple: Triple) {
        if let Some(existing) = self.triples.iter_mut().find(|t| {
            t.subject == triple.subject
                && t.predicate_matches(&triple.predicate)
                && t.object == triple.object
        }) {
            if existing.predicate == RDF_TYPE_SHORT && triple.predicate != RDF_TYPE_SHORT {
                existing.predicate = triple.predicate;
            }
            return;
        }
        self.triples.push(triple);
    }

    /// Appends every triple of `other`, in order.
    pub fn append_graph(&mut self, other: Graph) {
        for triple in other.triples {
            self.append(triple);
        }
    }

    /// Index of the first triple matching subject and predicate (alias-aware).
    fn find_index(&self, subject: &str, predicate: &str) -> Option<usize> {
        self.triples
            .iter()
            .position(|t| t.subject == subject && t.predicate_matches(predicate))
    }

    /// The first triple matching subject and predicate, if any.
    pub fn find(&self, subject: &str, predicate: &str) -> Option<&Triple> {
        self.find_index(subject, predicate).map(|i| &self.triples[i])
    }

    /// A mutable reference to the first triple matching subject and
    /// predicate, if any. Callers should not hold this past their next
    /// mutation of the graph.
    pub fn find_mut(&mut self, subject: &str, predicate: &str) -> Option<&mut Triple> {
        let idx = self.find_index(subject, predicate)?;
        Some(&mut self.triples[idx])
    }

    /// The first triple matching subject, predicate and object exactly.
    pub fn find_triple(&self, subject: &str, predicate: &str, object: &str) -> Option<&Triple> {
        self.triples.iter().find(|t| {
            t.subject == subject && t.predicate_matches(predicate) && t.object == object
        })
    }

    pub fn has(&self, subject: &str, predicate: &str, object: &str) -> bool {
        self.find_triple(subject, predicate, object).is_some()
    }

    pub fn has_predicate(&self, subject: &str, predicate: &str) -> bool {
        self.find(subject, predicate).is_some()
    }

    pub fn get_object(&self, subject: &str, predicate: &str) -> Option<&str> {
        self.find(subject, predicate).map(|t| t.object.as_str())
    }

    /// Overwrites the object of the first matching `(s, p)` triple, or
    /// appends a new triple if none exists.
    pub fn set_object(&mut self, subject: &str, predicate: &str, object: impl Into<String>, is_object_literal: bool) {
        let object = object.into();
        if let Some(existing) = self.find_mut(subject, predicate) {
            existing.object = object;
            existing.is_object_literal = is_object_literal;
            return;
        }
        self.append(Triple::new(subject, predicate, object, is_object_literal));
    }

    /// Removes the first triple matching `(s, p, o)` exactly. Returns
    /// whether a triple was removed.
    pub fn delete(&mut self, subject: &str, predicate: &str, object: &str) -> bool {
        let before = self.triples.len();
        self.triples
            .retain(|t| !(t.subject == subject && t.predicate_matches(predicate) && t.object == object));
        self.triples.len() != before
    }

    pub fn is_rdf_source(&self, subject: &str) -> bool {
        self.has(subject, RDF_TYPE, crate::vocab::ldp::RDF_SOURCE)
    }

    pub fn is_basic_container(&self, subject: &str) -> bool {
        self.has(subject, RDF_TYPE, crate::vocab::ldp::BASIC_CONTAINER)
    }

    /// Returns `(membership_resource, has_member_relation)` if the subject
    /// declares both — the signature of a Direct Container.
    pub fn direct_container_info(&self, subject: &str) -> Option<(String, String)> {
        let membership = self.get_object(subject, crate::vocab::ldp::MEMBERSHIP_RESOURCE)?;
        let relation = self.get_object(subject, crate::vocab::ldp::HAS_MEMBER_RELATION)?;
        Some((membership.to_string(), relation.to_string()))
    }

    /// Concatenation of each triple's line form, in insertion order.
    pub fn serialize(&self) -> String {
        self.triples.iter().map(Triple::to_line).collect()
    }

    /// A copy of this graph with every `(subject, predicate, _)` triple
    /// elided (alias-aware). Used to honor the "minimal container"
    /// preference, which asks that `ldp:contains` triples be left out of
    /// the returned representation.
    pub fn without_predicate(&self, subject: &str, predicate: &str) -> Graph {
        let triples = self
            .triples
            .iter()
            .filter(|t| !(t.subject == subject && t.predicate_matches(predicate)))
            .cloned()
            .collect();
        Graph { triples }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(s, p, o, false)
    }

    #[test]
    fn append_is_idempotent() {
        let mut g = Graph::new();
        g.append(t("<s>", "<p>", "<o>"));
        g.append(t("<s>", "<p>", "<o>"));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn a_and_rdf_type_are_aliased_for_lookup() {
        let mut g = Graph::new();
        g.append(t("<s>", "a", "<http://x/Thing>"));
        assert!(g.has("<s>", RDF_TYPE, "<http://x/Thing>"));
        assert!(g.has("<s>", "a", "<http://x/Thing>"));
    }

    #[test]
    fn full_predicate_upgrades_bare_a_in_place() {
        let mut g = Graph::new();
        g.append(t("<s>", "a", "<http://x/Thing>"));
        g.append(t("<s>", RDF_TYPE, "<http://x/Thing>"));
        assert_eq!(g.len(), 1);
        assert_eq!(g.iter().next().unwrap().predicate, RDF_TYPE);
    }

    #[test]
    fn set_object_overwrites_existing_triple() {
        let mut g = Graph::new();
        g.append(t("<s>", "<p>", "<o1>"));
        g.set_object("<s>", "<p>", "<o2>", false);
        assert_eq!(g.len(), 1);
        assert_eq!(g.get_object("<s>", "<p>"), Some("<o2>"));
    }

    #[test]
    fn set_object_appends_when_absent() {
        let mut g = Graph::new();
        g.set_object("<s>", "<p>", "<o>", false);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn delete_removes_matching_triple_and_reports_it() {
        let mut g = Graph::new();
        g.append(t("<s>", "<p>", "<o>"));
        assert!(g.delete("<s>", "<p>", "<o>"));
        assert!(g.is_empty());
        assert!(!g.delete("<s>", "<p>", "<o>"));
    }

    #[test]
    fn serialize_preserves_insertion_order() {
        let mut g = Graph::new();
        g.append(t("<s>", "<p1>", "<o1>"));
        g.append(t("<s>", "<p2>", "<o2>"));
        assert_eq!(g.serialize(), "<s> <p1> <o1> .\n<s> <p2> <o2> .\n");
    }

    #[test]
    fn without_predicate_elides_only_matching_triples() {
        let mut g = Graph::new();
        g.append(t("<s>", crate::vocab::ldp::CONTAINS, "<child1>"));
        g.append(t("<s>", crate::vocab::ldp::CONTAINS, "<child2>"));
        g.append(t("<s>", crate::vocab::dc::TITLE, "\"Hi\""));
        let minimal = g.without_predicate("<s>", crate::vocab::ldp::CONTAINS);
        assert_eq!(minimal.len(), 1);
        assert_eq!(minimal.get_object("<s>", crate::vocab::dc::TITLE), Some("\"Hi\""));
    }

    #[test]
    fn direct_container_info_requires_both_predicates() {
        let mut g = Graph::new();
        g.append(t("<s>", crate::vocab::ldp::MEMBERSHIP_RESOURCE, "<target>"));
        assert!(g.direct_container_info("<s>").is_none());
        g.append(t("<s>", crate::vocab::ldp::HAS_MEMBER_RELATION, "<rel>"));
        assert_eq!(
            g.direct_container_info("<s>"),
            Some(("<target>".to_string(), "<rel>".to_string()))
        );
    }
}
