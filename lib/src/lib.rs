//! Core of a Linked Data Platform (LDP) server.
//!
//! This crate owns the four subsystems named in the specification: a
//! hand-written Turtle/N-Triples [`turtle`] parser, the in-memory [`graph`]
//! model, the filesystem-backed [`store`] and [`node`] repository, and the
//! [`coordinator`] that drives resource lifecycle operations (create,
//! replace, patch, delete) with ETag-based optimistic concurrency and
//! Direct Container side effects.
//!
//! HTTP method routing, status-code translation and process bootstrap are
//! deliberately outside this crate's scope — see the `server` crate for a
//! thin binary built on top of [`Coordinator`].

pub mod coordinator;
pub mod error;
pub mod graph;
pub mod minter;
pub mod node;
pub mod paths;
pub mod settings;
pub mod store;
pub mod turtle;
pub mod vocab;

pub use coordinator::{Coordinator, GetPreferences, NodeView};
pub use error::{Error, Result, TextPosition};
pub use graph::{Graph, Triple};
pub use node::{Headers, Node};
pub use settings::Settings;
