//! The resource lifecycle coordinator: the single entry point an HTTP
//! dispatch layer (or a test) drives. Orchestrates slug resolution, the
//! [`Minter`], serialized store creation, [`Node`] construction, and
//! Direct Container side effects.

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::minter::Minter;
use crate::node::Node;
use crate::paths;
use crate::settings::Settings;
use crate::store::Store;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

const DEFAULT_SLUG_PREFIX: &str = "node";

/// `GET`/`HEAD` representation preferences, carried through from the HTTP
/// layer's `Prefer` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetPreferences {
    /// Elide `ldp:contains` triples from a container's representation.
    pub minimal_container: bool,
    /// Inline the direct container's membership resource triples into a
    /// supplementary graph alongside the node itself.
    pub membership: bool,
}

/// The result of [`Coordinator::get_node`]: the node plus, when requested
/// and applicable, the membership resource's graph.
pub struct NodeView {
    pub node: Node,
    pub membership_graph: Option<Graph>,
}

/// Orchestrates every write and read path named in the specification.
/// Cheap to clone: the minter and store-creation queue are each a shared
/// channel handle to one background thread, mirroring the way the original
/// implementation's `Server` carries its channels by value.
#[derive(Clone)]
pub struct Coordinator {
    settings: Settings,
    minter: Minter,
    creator: ResourceCreator,
}

impl Coordinator {
    /// Builds a coordinator for `settings`, creating the data directory and
    /// the root container if absent.
    pub fn new(settings: Settings) -> Result<Self> {
        std::fs::create_dir_all(settings.data_path())?;
        let minter = Minter::new(settings.id_file())?;
        let creator = ResourceCreator::new();
        let coordinator = Self {
            settings,
            minter,
            creator,
        };
        coordinator.bootstrap_root();
        Ok(coordinator)
    }

    /// Creates the root container on first start, exactly as the original
    /// `createRoot` does. Panics only on an I/O failure other than the root
    /// simply not existing yet — there is no caller to hand a
    /// construction-time error to.
    fn bootstrap_root(&self) {
        match self.get_head("/") {
            Ok(_) => return,
            Err(Error::NodeNotFound) => {}
            Err(e) => panic!("error reading root node: {e}"),
        }
        self.create_rdf_source("", ".", ".")
            .unwrap_or_else(|e| panic!("could not create root node: {e}"));
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Loads a node and, per `preferences`, its supplementary views.
    pub fn get_node(&self, path: &str, preferences: GetPreferences) -> Result<NodeView> {
        let node = Node::load(&self.settings, path, true)?;
        let membership_graph = if preferences.membership {
            self.membership_graph_for(&node)?
        } else {
            None
        };
        Ok(NodeView {
            node,
            membership_graph,
        })
    }

    fn membership_graph_for(&self, node: &Node) -> Result<Option<Graph>> {
        let Some(membership) = node.membership_resource() else {
            return Ok(None);
        };
        let target_path = self.settings.path_for_uri(strip_angle_brackets(membership));
        let target = Node::load(&self.settings, &target_path, false)?;
        Ok(Some(target.graph().clone()))
    }

    /// Loads metadata only, no body.
    pub fn get_head(&self, path: &str) -> Result<Node> {
        Node::load(&self.settings, path, false)
    }

    /// `POST`: creates a new RDF source under `parent_path`.
    pub fn create_rdf_source(&self, triples: &str, parent_path: &str, slug: &str) -> Result<Node> {
        let path = self.new_path_from_slug(parent_path, slug)?;
        match self.creator.create(self.settings.path_on_disk(&path)) {
            Ok(()) => {}
            Err(Error::AlreadyExists) => {
                if slug.is_empty() {
                    // The server-minted slug collided; retry once with a
                    // freshly minted one, exactly as the specification requires.
                    return self.create_rdf_source(triples, parent_path, "");
                }
                return Err(Error::DuplicateNode);
            }
            Err(Error::CreateDeleted) => {
                if slug.is_empty() {
                    return self.create_rdf_source(triples, parent_path, "");
                }
                return Err(Error::CreateDeleted);
            }
            Err(e) => return Err(e),
        }
        let node = Node::create_rdf(&self.settings, &path, triples)?;
        if !paths::is_root_path(&path) {
            self.add_node_to_container(&node, parent_path)?;
        }
        Ok(node)
    }

    /// `POST`: creates a new Non-RDF source under `parent_path`. `triples`
    /// carries only the server-synthesized metadata (typically a
    /// `server:contentType` line the HTTP layer built from the request's
    /// `Content-Type`).
    pub fn create_non_rdf_source<R: Read>(
        &self,
        reader: R,
        parent_path: &str,
        slug: &str,
        triples: &str,
    ) -> Result<Node> {
        let path = self.new_path_from_slug(parent_path, slug)?;
        match self.creator.create(self.settings.path_on_disk(&path)) {
            Ok(()) => {}
            Err(Error::AlreadyExists) => {
                if slug.is_empty() {
                    return self.create_non_rdf_source(reader, parent_path, "", triples);
                }
                return Err(Error::DuplicateNode);
            }
            Err(Error::CreateDeleted) => {
                if slug.is_empty() {
                    return self.create_non_rdf_source(reader, parent_path, "", triples);
                }
                return Err(Error::CreateDeleted);
            }
            Err(e) => return Err(e),
        }
        let node = Node::create_non_rdf(&self.settings, &path, triples, reader)?;
        if !paths::is_root_path(&path) {
            self.add_node_to_container(&node, parent_path)?;
        }
        Ok(node)
    }

    /// `PUT`: creates-or-replaces an RDF source. `parent_path`/`slug`
    /// together name the target the same way `POST` does (the HTTP layer is
    /// expected to have split the request path into the two).
    pub fn replace_rdf_source(
        &self,
        triples: &str,
        parent_path: &str,
        slug: &str,
        etag: &str,
    ) -> Result<Node> {
        let path = self.new_path_from_slug(parent_path, slug)?;
        match self.creator.create(self.settings.path_on_disk(&path)) {
            Ok(()) => {
                let node = Node::create_rdf(&self.settings, &path, triples)?;
                if !paths::is_root_path(&path) {
                    self.add_node_to_container(&node, parent_path)?;
                }
                Ok(node)
            }
            Err(Error::AlreadyExists) => {
                let mut node = Node::load(&self.settings, &path, true)?;
                if !node.is_rdf() {
                    return Err(Error::CannotReplaceKindMismatch);
                }
                self.check_etag(&node, etag)?;
                node.replace_rdf(triples)?;
                Ok(node)
            }
            Err(e) => Err(e),
        }
    }

    /// `PUT`: creates-or-replaces a Non-RDF source at the full target `path`.
    pub fn replace_non_rdf_source(
        &self,
        reader: impl Read,
        path: &str,
        etag: &str,
        triples: &str,
    ) -> Result<Node> {
        if paths::is_root_path(path) {
            return Err(Error::CannotReplaceKindMismatch);
        }
        match self.creator.create(self.settings.path_on_disk(path)) {
            Ok(()) => {
                let node = Node::create_non_rdf(&self.settings, path, triples, reader)?;
                let parent_path = paths::parent_path(path);
                self.add_node_to_container(&node, &parent_path)?;
                Ok(node)
            }
            Err(Error::AlreadyExists) => {
                let mut node = Node::load(&self.settings, path, true)?;
                if node.is_rdf() {
                    return Err(Error::CannotReplaceKindMismatch);
                }
                self.check_etag(&node, etag)?;
                node.replace_non_rdf(triples, reader)?;
                Ok(node)
            }
            Err(e) => Err(e),
        }
    }

    /// `PATCH`: merges triples into an existing RDF source.
    pub fn patch_node(&self, path: &str, triples: &str) -> Result<Node> {
        let mut node = Node::load(&self.settings, path, false)?;
        node.patch(triples)?;
        Ok(node)
    }

    /// `DELETE`: tombstones a resource and unlinks it from its parent.
    pub fn delete_node(&self, path: &str) -> Result<()> {
        if paths::is_root_path(path) {
            return Err(Error::CannotDeleteRoot);
        }
        let node = Node::load(&self.settings, path, false)?;
        let parent_path = paths::parent_path(path);
        let mut parent = self.get_container(&parent_path)?;
        parent.remove_contains_uri(node.subject())?;
        node.delete()
    }

    fn new_path_from_slug(&self, parent_path: &str, slug: &str) -> Result<String> {
        if parent_path == "." && slug == "." {
            return Ok("/".to_string());
        }
        let slug = if slug.is_empty() {
            self.minter.mint(DEFAULT_SLUG_PREFIX)
        } else {
            slug.to_string()
        };
        if !paths::is_valid_slug(&slug) {
            return Err(Error::InvalidSlug(slug));
        }
        Ok(paths::uri_concat(parent_path, &slug))
    }

    fn add_node_to_container(&self, node: &Node, parent_path: &str) -> Result<()> {
        let container = self.get_container(parent_path)?;
        container.add_child(&self.settings, node)
    }

    fn get_container(&self, path: &str) -> Result<Node> {
        if paths::is_root_path(path) {
            return Node::load(&self.settings, "/", false);
        }
        let node = Node::load(&self.settings, path, false)?;
        if !node.is_basic_container() {
            return Err(Error::ParentNotContainer);
        }
        Ok(node)
    }

    fn check_etag(&self, node: &Node, etag: &str) -> Result<()> {
        if etag.is_empty() {
            return Err(Error::EtagMissing);
        }
        if node.etag() != etag {
            return Err(Error::EtagMismatch);
        }
        Ok(())
    }
}

fn strip_angle_brackets(text: &str) -> &str {
    text.strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(text)
}

/// Serializes store creation across concurrent callers through a dedicated
/// background thread, the way [`Minter`] serializes ID allocation. Mirrors
/// the original's `nextResource` channel in `server.Server`.
#[derive(Clone)]
struct ResourceCreator {
    requests: mpsc::Sender<(PathBuf, mpsc::Sender<CreateOutcome>)>,
}

enum CreateOutcome {
    Created,
    AlreadyExists,
    CreateDeleted,
    Io(String),
}

impl ResourceCreator {
    fn new() -> Self {
        let (requests, inbox) = mpsc::channel::<(PathBuf, mpsc::Sender<CreateOutcome>)>();
        thread::spawn(move || {
            while let Ok((dir, reply)) = inbox.recv() {
                let outcome = match Store::new(dir).create() {
                    Ok(()) => CreateOutcome::Created,
                    Err(Error::AlreadyExists) => CreateOutcome::AlreadyExists,
                    Err(Error::CreateDeleted) => CreateOutcome::CreateDeleted,
                    Err(e) => CreateOutcome::Io(e.to_string()),
                };
                let _ = reply.send(outcome);
            }
        });
        Self { requests }
    }

    fn create(&self, dir: PathBuf) -> Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.requests
            .send((dir, reply_tx))
            .expect("resource creator thread terminated unexpectedly");
        match reply_rx
            .recv()
            .expect("resource creator thread terminated unexpectedly")
        {
            CreateOutcome::Created => Ok(()),
            CreateOutcome::AlreadyExists => Err(Error::AlreadyExists),
            CreateOutcome::CreateDeleted => Err(Error::CreateDeleted),
            CreateOutcome::Io(message) => {
                Err(Error::Io(io::Error::new(io::ErrorKind::Other, message)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn coordinator(dir: &std::path::Path) -> Coordinator {
        let settings = Settings::new("http://localhost:9001", dir);
        Coordinator::new(settings).unwrap()
    }

    #[test]
    fn bootstraps_a_root_container_on_first_start() {
        let dir = tempdir().unwrap();
        let coordinator = coordinator(dir.path());
        let root = coordinator.get_head("/").unwrap();
        assert!(root.is_basic_container());
    }

    #[test]
    fn create_rdf_source_with_slug_then_duplicate_slug_fails() {
        let dir = tempdir().unwrap();
        let coordinator = coordinator(dir.path());
        let node = coordinator
            .create_rdf_source("<> <http://purl.org/dc/terms/title> \"Hi\" .", "/", "hello")
            .unwrap();
        assert_eq!(node.uri(), "http://localhost:9001/hello");

        let err = coordinator
            .create_rdf_source("", "/", "hello")
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateNode));
    }

    #[test]
    fn create_rdf_source_without_slug_mints_one() {
        let dir = tempdir().unwrap();
        let coordinator = coordinator(dir.path());
        let node = coordinator.create_rdf_source("", "/", "").unwrap();
        assert!(node.uri().starts_with("http://localhost:9001/node"));
    }

    #[test]
    fn create_establishes_parent_containment() {
        let dir = tempdir().unwrap();
        let coordinator = coordinator(dir.path());
        let child = coordinator.create_rdf_source("", "/", "hello").unwrap();
        let parent = coordinator.get_head("/").unwrap();
        assert!(parent.graph().has(
            parent.subject(),
            crate::vocab::ldp::CONTAINS,
            child.subject()
        ));
    }

    #[test]
    fn delete_then_recreate_is_rejected_as_create_deleted() {
        let dir = tempdir().unwrap();
        let coordinator = coordinator(dir.path());
        coordinator.create_rdf_source("", "/", "hello").unwrap();
        coordinator.delete_node("/hello").unwrap();
        assert!(matches!(
            coordinator.get_node("/hello", GetPreferences::default()),
            Err(Error::NodeNotFound)
        ));
        let err = coordinator
            .create_rdf_source("", "/", "hello")
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateNode));
    }

    #[test]
    fn replace_requires_etag_when_resource_exists() {
        let dir = tempdir().unwrap();
        let coordinator = coordinator(dir.path());
        let created = coordinator.create_rdf_source("", "/", "hello").unwrap();

        let err = coordinator
            .replace_rdf_source("", "/", "hello", "")
            .unwrap_err();
        assert!(matches!(err, Error::EtagMissing));

        let err = coordinator
            .replace_rdf_source("", "/", "hello", "\"stale\"")
            .unwrap_err();
        assert!(matches!(err, Error::EtagMismatch));

        let replaced = coordinator
            .replace_rdf_source("", "/", "hello", created.etag())
            .unwrap();
        assert_eq!(replaced.uri(), created.uri());
    }

    #[test]
    fn direct_container_child_is_projected_onto_membership_resource() {
        let dir = tempdir().unwrap();
        let coordinator = coordinator(dir.path());
        coordinator.create_rdf_source("", "/", "target").unwrap();
        let dc_triples = "<> <http://www.w3.org/ns/ldp#membershipResource> <http://localhost:9001/target> .\n\
             <> <http://www.w3.org/ns/ldp#hasMemberRelation> <http://example/has> .\n";
        coordinator
            .create_rdf_source(dc_triples, "/", "dc")
            .unwrap();
        let child = coordinator.create_rdf_source("", "/dc", "child").unwrap();

        let target = coordinator.get_head("/target").unwrap();
        assert!(target
            .graph()
            .has(target.subject(), "<http://example/has>", child.subject()));
    }

    #[test]
    fn patch_rejects_server_managed_predicate() {
        let dir = tempdir().unwrap();
        let coordinator = coordinator(dir.path());
        coordinator.create_rdf_source("", "/", "hello").unwrap();
        let err = coordinator
            .patch_node(
                "/hello",
                "<> <http://www.w3.org/ns/ldp#contains> <http://x> .",
            )
            .unwrap_err();
        assert!(matches!(err, Error::ServerManagedProperty));
    }

    #[test]
    fn delete_root_is_rejected() {
        let dir = tempdir().unwrap();
        let coordinator = coordinator(dir.path());
        assert!(matches!(
            coordinator.delete_node("/"),
            Err(Error::CannotDeleteRoot)
        ));
    }

    #[test]
    fn post_under_non_container_is_rejected() {
        let dir = tempdir().unwrap();
        let coordinator = coordinator(dir.path());
        let triples = format!(
            "{} {} \"text/plain\" .\n",
            "<http://localhost:9001/file>",
            crate::vocab::server::CONTENT_TYPE
        );
        coordinator
            .create_non_rdf_source(&b"x"[..], "/", "file", &triples)
            .unwrap();
        let err = coordinator
            .create_rdf_source("", "/file", "child")
            .unwrap_err();
        assert!(matches!(err, Error::ParentNotContainer));
    }
}
