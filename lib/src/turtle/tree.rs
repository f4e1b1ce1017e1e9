//! Transient parse-time structure accumulating `subject -> predicate -> object`
//! fan-out, rendered into an ordered list of triples once a full document has
//! been parsed.
//!
//! Each subject owns an ordered list of predicate nodes; each predicate node
//! owns an ordered list of object strings. No shared ownership is needed:
//! the tree is built bottom-up and consumed once, so everything is owned
//! outright.

use crate::graph::Triple;

struct PredicateNode {
    predicate: String,
    objects: Vec<(String, bool)>,
}

struct SubjectNode {
    subject: String,
    predicates: Vec<PredicateNode>,
}

/// Accumulates triples for an entire document during parsing.
#[derive(Default)]
pub struct Tree {
    subjects: Vec<SubjectNode>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subject(&mut self, subject: impl Into<String>) {
        self.subjects.push(SubjectNode {
            subject: subject.into(),
            predicates: Vec::new(),
        });
    }

    /// Adds a predicate under the most recently added subject.
    pub fn add_predicate(&mut self, predicate: impl Into<String>) {
        let subject = self
            .subjects
            .last_mut()
            .expect("add_predicate called before add_subject");
        subject.predicates.push(PredicateNode {
            predicate: predicate.into(),
            objects: Vec::new(),
        });
    }

    /// Adds an object under the most recently added predicate of the most
    /// recently added subject. `is_literal` records whether the object text
    /// is a quoted literal (vs. an IRI reference).
    pub fn add_object(&mut self, object: impl Into<String>, is_literal: bool) {
        let subject = self
            .subjects
            .last_mut()
            .expect("add_object called before add_subject");
        let predicate = subject
            .predicates
            .last_mut()
            .expect("add_object called before add_predicate");
        predicate.objects.push((object.into(), is_literal));
    }

    /// Rewrites every subject and object equal to `placeholder` to `replacement`.
    /// Used to apply `@base` to bare `<>` terms.
    pub fn substitute(&mut self, placeholder: &str, replacement: &str) {
        for subject in &mut self.subjects {
            if subject.subject == placeholder {
                subject.subject = replacement.to_string();
            }
            for predicate in &mut subject.predicates {
                for (object, is_literal) in &mut predicate.objects {
                    if !*is_literal && object == placeholder {
                        *object = replacement.to_string();
                    }
                }
            }
        }
    }

    /// Renders the tree into triples, in first-subject/first-predicate/
    /// first-object fan-out order.
    pub fn into_triples(self) -> Vec<Triple> {
        let mut triples = Vec::new();
        for subject in self.subjects {
            for predicate in subject.predicates {
                for (object, is_literal) in predicate.objects {
                    triples.push(Triple::new(
                        subject.subject.clone(),
                        predicate.predicate.clone(),
                        object,
                        is_literal,
                    ));
                }
            }
        }
        triples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_in_fan_out_order() {
        let mut tree = Tree::new();
        tree.add_subject("<s>");
        tree.add_predicate("<p1>");
        tree.add_object("<o1>", false);
        tree.add_object("<o2>", false);
        tree.add_predicate("<p2>");
        tree.add_object("<o3>", false);

        let triples = tree.into_triples();
        assert_eq!(
            triples.iter().map(|t| t.object.clone()).collect::<Vec<_>>(),
            vec!["<o1>", "<o2>", "<o3>"]
        );
    }

    #[test]
    fn substitute_rewrites_bare_subject_and_object() {
        let mut tree = Tree::new();
        tree.add_subject("<>");
        tree.add_predicate("<p>");
        tree.add_object("<>", false);
        tree.substitute("<>", "<http://example/x>");
        let triples = tree.into_triples();
        assert_eq!(triples[0].subject, "<http://example/x>");
        assert_eq!(triples[0].object, "<http://example/x>");
    }

    #[test]
    fn substitute_does_not_rewrite_literal_objects() {
        let mut tree = Tree::new();
        tree.add_subject("<s>");
        tree.add_predicate("<p>");
        tree.add_object("<>", true);
        tree.substitute("<>", "<http://example/x>");
        assert_eq!(tree.into_triples()[0].object, "<>");
    }
}
