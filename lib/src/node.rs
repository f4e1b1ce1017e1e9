//! The unit of resource identity: a graph (plus, for non-RDF sources, a
//! binary payload) backed by a [`Store`], with derived classification and
//! headers.

use crate::error::{Error, Result};
use crate::graph::{Graph, Triple};
use crate::settings::Settings;
use crate::store::Store;
use crate::vocab::{self, ldp, RDF_TYPE};
use std::collections::HashMap;
use std::io::Read;

/// A multi-valued header mapping, preserving the order values were pushed
/// in (significant for `Link`, where `describedby` must precede the type
/// links on non-RDF responses).
pub type Headers = HashMap<String, Vec<String>>;

/// A loaded or newly constructed resource.
#[derive(Debug, Clone)]
pub struct Node {
    uri: String,
    subject: String,
    store: Store,
    is_rdf: bool,
    graph: Graph,
    binary: Vec<u8>,
    is_basic_container: bool,
    is_direct_container: bool,
    membership_resource: Option<String>,
    has_member_relation: Option<String>,
    headers: Headers,
}

impl Node {
    fn new(settings: &Settings, path: &str) -> Self {
        let uri = settings.uri_for_path(path);
        let subject = format!("<{uri}>");
        let store = Store::new(settings.path_on_disk(path));
        Self {
            uri,
            subject,
            store,
            is_rdf: true,
            graph: Graph::new(),
            binary: Vec::new(),
            is_basic_container: false,
            is_direct_container: false,
            membership_resource: None,
            has_member_relation: None,
            headers: Headers::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn is_rdf(&self) -> bool {
        self.is_rdf
    }

    pub fn is_basic_container(&self) -> bool {
        self.is_basic_container
    }

    pub fn is_direct_container(&self) -> bool {
        self.is_direct_container
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn binary(&self) -> &[u8] {
        &self.binary
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn membership_resource(&self) -> Option<&str> {
        self.membership_resource.as_deref()
    }

    /// This node's graph as it should be returned to a caller, honoring the
    /// "minimal container" preference by eliding `ldp:contains` triples.
    pub fn content_graph(&self, minimal_container: bool) -> Graph {
        if minimal_container && self.is_basic_container {
            self.graph.without_predicate(&self.subject, ldp::CONTAINS)
        } else {
            self.graph.clone()
        }
    }

    pub fn etag(&self) -> &str {
        self.graph
            .get_object(&self.subject, vocab::server::ETAG)
            .expect("a loaded or saved node always carries an etag triple")
    }

    pub fn content_type(&self) -> &str {
        if self.is_rdf {
            return "text/turtle";
        }
        self.graph
            .get_object(&self.subject, vocab::server::CONTENT_TYPE)
            .unwrap_or("application/binary")
    }

    /// Loads a node's metadata (and, if requested and the node is non-RDF,
    /// its binary payload) from its store.
    pub(crate) fn load(settings: &Settings, path: &str, include_body: bool) -> Result<Self> {
        let mut node = Self::new(settings, path);
        node.load_meta()?;
        if node.is_rdf || !include_body {
            return Ok(node);
        }
        node.binary = node.store.read_data()?;
        Ok(node)
    }

    fn load_meta(&mut self) -> Result<()> {
        if !self.store.exists() {
            return Err(Error::NodeNotFound);
        }
        let meta = self.store.read_meta()?;
        let graph = crate::turtle::parse(&meta, &self.subject)?;
        self.install_graph(graph);
        Ok(())
    }

    /// Constructs a brand new RDF source node at `path` from parsed body
    /// triples, stamps server-managed properties, and persists it.
    ///
    /// Rejects a caller-supplied graph that already sets a server-managed
    /// predicate (the same check `patch` applies).
    pub(crate) fn create_rdf(settings: &Settings, path: &str, triples: &str) -> Result<Self> {
        let mut node = Self::new(settings, path);
        let graph = crate::turtle::parse(triples, &node.subject)?;
        check_no_server_managed_predicate(&graph)?;
        node.write_rdf(graph)?;
        Ok(node)
    }

    /// As [`Node::create_rdf`], but for a non-RDF source: `triples` carries
    /// only the server-synthesized metadata (typically a content-type
    /// triple), and `reader` is the binary payload.
    pub(crate) fn create_non_rdf(
        settings: &Settings,
        path: &str,
        triples: &str,
        reader: impl Read,
    ) -> Result<Self> {
        let mut node = Self::new(settings, path);
        let graph = crate::turtle::parse(triples, &node.subject)?;
        check_no_server_managed_predicate(&graph)?;
        node.write_non_rdf(graph, reader)?;
        Ok(node)
    }

    /// Replaces this node's RDF body. The caller has already checked the
    /// ETag and resource kind.
    pub(crate) fn replace_rdf(&mut self, triples: &str) -> Result<()> {
        let graph = crate::turtle::parse(triples, &self.subject)?;
        self.write_rdf(graph)
    }

    /// Replaces this node's binary body. `triples`, if non-empty, supplies
    /// replacement metadata (e.g. a new content-type triple).
    pub(crate) fn replace_non_rdf(&mut self, triples: &str, reader: impl Read) -> Result<()> {
        let graph = if triples.is_empty() {
            self.graph.clone()
        } else {
            crate::turtle::parse(triples, &self.subject)?
        };
        self.write_non_rdf(graph, reader)
    }

    /// Merges `triples` into this node's graph. Rejects server-managed
    /// predicates. Does not rotate the ETag.
    pub(crate) fn patch(&mut self, triples: &str) -> Result<()> {
        if !self.is_rdf {
            return Err(Error::CannotPatchNonRdf);
        }
        let incoming = crate::turtle::parse(triples, &self.subject)?;
        check_no_server_managed_predicate(&incoming)?;
        self.graph.append_graph(incoming);
        self.store.save_meta(&self.graph.serialize())?;
        Ok(())
    }

    /// Appends `(self, ldp:contains, child)` to this container's meta
    /// file, and, if this is a Direct Container, projects membership onto
    /// the configured external resource.
    pub(crate) fn add_child(&self, settings: &Settings, child: &Node) -> Result<()> {
        let triple = Triple::new(self.subject.clone(), ldp::CONTAINS, child.subject.clone(), false);
        self.store.append_meta(&triple.to_line())?;

        if self.is_direct_container {
            self.add_direct_container_child(settings, child)?;
        }
        Ok(())
    }

    fn add_direct_container_child(&self, settings: &Settings, child: &Node) -> Result<()> {
        let membership_resource = self
            .membership_resource
            .as_deref()
            .expect("is_direct_container implies membership_resource is set");
        let relation = self
            .has_member_relation
            .clone()
            .expect("is_direct_container implies has_member_relation is set");

        let target_uri = strip_angle_brackets(membership_resource);
        let target_path = settings.path_for_uri(target_uri);
        let target = Self::load(settings, &target_path, false)?;

        let triple = Triple::new(target.subject.clone(), relation, child.subject.clone(), false);
        target.store.append_meta(&triple.to_line())
    }

    /// Deletes the `(self, ldp:contains, uri)` triple and re-saves this
    /// container's meta file. Fails if no such triple exists.
    pub(crate) fn remove_contains_uri(&mut self, uri: &str) -> Result<()> {
        if !self.graph.delete(&self.subject.clone(), ldp::CONTAINS, uri) {
            return Err(Error::NodeNotFound);
        }
        self.store.save_meta(&self.graph.serialize())?;
        Ok(())
    }

    pub(crate) fn delete(&self) -> Result<()> {
        self.store.delete()
    }

    fn write_rdf(&mut self, mut graph: Graph) -> Result<()> {
        if graph.direct_container_info(&self.subject).is_some() {
            graph.append(Triple::new(
                self.subject.clone(),
                ldp::INSERTED_CONTENT_RELATION,
                ldp::MEMBER_SUBJECT,
                false,
            ));
        }
        self.graph = graph;
        self.stamp_etag();
        self.graph.append(Triple::new(self.subject.clone(), RDF_TYPE, ldp::RESOURCE, false));
        self.graph.append(Triple::new(self.subject.clone(), RDF_TYPE, ldp::RDF_SOURCE, false));
        self.graph.append(Triple::new(self.subject.clone(), RDF_TYPE, ldp::CONTAINER, false));
        self.graph.append(Triple::new(self.subject.clone(), RDF_TYPE, ldp::BASIC_CONTAINER, false));
        self.derive_classification();
        self.store.save_meta(&self.graph.serialize())
    }

    fn write_non_rdf(&mut self, mut graph: Graph, reader: impl Read) -> Result<()> {
        self.graph = std::mem::take(&mut graph);
        self.stamp_etag();
        self.graph.append(Triple::new(self.subject.clone(), RDF_TYPE, ldp::RESOURCE, false));
        self.graph.append(Triple::new(self.subject.clone(), RDF_TYPE, ldp::NON_RDF_SOURCE, false));
        self.install_graph(self.graph.clone());
        self.store.save_meta(&self.graph.serialize())?;
        self.store.save_data(reader)?;
        self.binary = self.store.read_data()?;
        Ok(())
    }

    fn stamp_etag(&mut self) {
        self.graph.set_object(&self.subject.clone(), vocab::server::ETAG, calculate_etag(), true);
    }

    /// Installs a freshly loaded or constructed graph, deriving
    /// classification flags and headers from it.
    fn install_graph(&mut self, graph: Graph) {
        self.graph = graph;
        self.derive_classification();
    }

    /// Re-derives classification flags and headers from `self.graph`,
    /// without replacing it.
    fn derive_classification(&mut self) {
        self.is_rdf = self.graph.is_rdf_source(&self.subject);
        if self.is_rdf {
            self.set_as_rdf();
        } else {
            self.set_as_non_rdf();
        }
    }

    fn set_as_rdf(&mut self) {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), vec!["text/turtle".to_string()]);

        self.is_basic_container = self.graph.is_basic_container(&self.subject);
        let allow = if self.is_basic_container {
            "GET, HEAD, POST, PUT, PATCH"
        } else {
            "GET, HEAD, PUT, PATCH"
        };
        headers.insert("Allow".to_string(), vec![allow.to_string()]);
        headers.insert("Accept-Post".to_string(), vec!["text/turtle".to_string()]);
        headers.insert("Accept-Patch".to_string(), vec!["text/turtle".to_string()]);
        headers.insert("Etag".to_string(), vec![self.etag().to_string()]);

        let mut links = vec![link_header(ldp::RESOURCE)];
        if self.is_basic_container {
            links.push(link_header(ldp::CONTAINER));
            links.push(link_header(ldp::BASIC_CONTAINER));
            match self.graph.direct_container_info(&self.subject) {
                Some((membership, relation)) => {
                    self.is_direct_container = true;
                    self.membership_resource = Some(membership);
                    self.has_member_relation = Some(relation);
                    links.push(link_header(ldp::DIRECT_CONTAINER));
                }
                None => {
                    self.is_direct_container = false;
                    self.membership_resource = None;
                    self.has_member_relation = None;
                }
            }
        } else {
            self.is_direct_container = false;
        }
        headers.insert("Link".to_string(), links);
        self.headers = headers;
    }

    fn set_as_non_rdf(&mut self) {
        self.is_basic_container = false;
        self.is_direct_container = false;
        self.binary = Vec::new();

        let mut headers = Headers::new();
        let describedby = format!("<{}?metadata=yes>; rel=\"describedby\"", self.uri);
        headers.insert(
            "Link".to_string(),
            vec![describedby, link_header(ldp::RESOURCE), link_header(ldp::NON_RDF_SOURCE)],
        );
        headers.insert("Allow".to_string(), vec!["GET, HEAD, PUT".to_string()]);
        headers.insert("Content-Type".to_string(), vec![self.content_type().to_string()]);
        headers.insert("Etag".to_string(), vec![self.etag().to_string()]);
        self.headers = headers;
    }
}

/// Rejects a caller-supplied graph that sets any server-managed predicate
/// (the LDP type family, `ldp:contains`, `ldp:constrainedBy`, or the
/// server's own `etag` predicate) — shared by creation and `patch`.
fn check_no_server_managed_predicate(graph: &Graph) -> Result<()> {
    for triple in graph.iter() {
        if vocab::is_server_managed_predicate(&triple.predicate) {
            return Err(Error::ServerManagedProperty);
        }
    }
    Ok(())
}

fn link_header(ldp_type: &str) -> String {
    format!("{ldp_type}; rel=\"type\"")
}

fn strip_angle_brackets(text: &str) -> &str {
    text.strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(text)
}

fn calculate_etag() -> String {
    let now = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    format!("\"{}\"", now.replace(':', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings(dir: &std::path::Path) -> Settings {
        Settings::new("http://localhost:9001", dir)
    }

    #[test]
    fn create_rdf_stamps_server_managed_types_and_etag() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path());
        let node = Node::create_rdf(&settings, "/hello", "<> <http://purl.org/dc/terms/title> \"Hi\" .").unwrap();
        assert!(node.is_rdf());
        assert!(node.graph().has(node.subject(), RDF_TYPE, ldp::RESOURCE));
        assert!(node.graph().has(node.subject(), RDF_TYPE, ldp::RDF_SOURCE));
        assert!(node.is_basic_container());
        assert!(!node.etag().is_empty());
    }

    #[test]
    fn create_non_rdf_derives_content_type_from_triples() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path());
        let triples = format!(
            "{} {} \"text/plain\" .\n",
            "<http://localhost:9001/file>",
            vocab::server::CONTENT_TYPE
        );
        let node = Node::create_non_rdf(&settings, "/file", &triples, &b"payload"[..]).unwrap();
        assert!(!node.is_rdf());
        assert_eq!(node.content_type(), "text/plain");
        assert_eq!(node.binary(), b"payload");
    }

    #[test]
    fn create_rdf_rejects_server_managed_predicate_in_the_body() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path());
        let err = Node::create_rdf(
            &settings,
            "/hello",
            "<> <http://www.w3.org/ns/ldp#contains> <http://x> .",
        )
        .unwrap_err();
        assert!(matches!(err, Error::ServerManagedProperty));
    }

    #[test]
    fn patch_rejects_server_managed_predicate() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path());
        let mut node = Node::create_rdf(&settings, "/hello", "").unwrap();
        let err = node
            .patch("<> <http://www.w3.org/ns/ldp#contains> <http://x> .")
            .unwrap_err();
        assert!(matches!(err, Error::ServerManagedProperty));
    }

    #[test]
    fn patch_merges_triples_without_rotating_etag() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path());
        let mut node = Node::create_rdf(&settings, "/hello", "").unwrap();
        let etag_before = node.etag().to_string();
        node.patch("<> <http://purl.org/dc/terms/title> \"Hi\" .").unwrap();
        assert_eq!(node.etag(), etag_before);
        assert_eq!(
            node.graph().get_object(node.subject(), "<http://purl.org/dc/terms/title>"),
            Some("\"Hi\"")
        );
    }

    #[test]
    fn load_round_trips_a_created_node() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path());
        Node::create_rdf(&settings, "/hello", "").unwrap();
        let loaded = Node::load(&settings, "/hello", true).unwrap();
        assert!(loaded.is_rdf());
        assert!(loaded.is_basic_container());
    }

    #[test]
    fn load_missing_node_reports_not_found() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path());
        let err = Node::load(&settings, "/missing", true).unwrap_err();
        assert!(matches!(err, Error::NodeNotFound));
    }
}
