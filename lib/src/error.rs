use std::fmt;
use std::io;

/// A `(line, column)` position inside parsed Turtle text, both 0-indexed,
/// counted in Unicode code points (not bytes).
///
/// Modeled on `oxttl`'s `TextPosition`, trimmed to a single point: the
/// hand-written tokenizer this crate uses reports one position per failure
/// rather than a start/end range.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TextPosition {
    pub line: u64,
    pub column: u64,
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line + 1, self.column + 1)
    }
}

/// The stable error taxonomy surfaced by `ldp_core` to its caller (an HTTP
/// dispatch layer, a CLI, or a test harness). Every variant corresponds to
/// an entry in the specification's error table.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The path has no live store.
    #[error("node not found")]
    NodeNotFound,
    /// Creation was attempted at an existing live path with a user-supplied slug.
    #[error("node already exists")]
    DuplicateNode,
    /// Creation was attempted at a tombstoned path.
    #[error("node was deleted and cannot be re-created at this path")]
    CreateDeleted,
    /// Internal store-level duplicate; the coordinator translates this into
    /// `DuplicateNode` or `CreateDeleted` depending on context.
    #[error("store already exists at this path")]
    AlreadyExists,
    /// Replacement was attempted without `If-Match`.
    #[error("etag missing")]
    EtagMissing,
    /// `If-Match` did not match the current ETag.
    #[error("etag mismatch")]
    EtagMismatch,
    /// The caller tried to set a reserved predicate.
    #[error("attempted to set a server-managed property")]
    ServerManagedProperty,
    /// POST/PUT was attempted under a path that is not a container.
    #[error("parent is not a container")]
    ParentNotContainer,
    /// DELETE was attempted on the root container.
    #[error("the root node cannot be deleted")]
    CannotDeleteRoot,
    /// PATCH targeted a non-RDF source.
    #[error("cannot patch a non-RDF source")]
    CannotPatchNonRdf,
    /// PUT attempted an RDF body onto a non-RDF source, or vice versa.
    #[error("cannot replace a resource of this kind with one of the other kind")]
    CannotReplaceKindMismatch,
    /// The slug failed validation.
    #[error("invalid slug: {0}")]
    InvalidSlug(String),
    /// A Turtle parse failure, with the position of the offending token.
    #[error("parse error at {position}: {message}")]
    ParseError {
        position: TextPosition,
        message: String,
    },
    /// An underlying filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
