//! Vocabulary URIs, written as the angle-bracketed or bare token forms they
//! take on the wire, since that is the comparison unit the rest of the crate
//! works with (see [`crate::graph`]).

pub const RDF_TYPE: &str = "<http://www.w3.org/1999/02/22-rdf-syntax-ns#type>";
pub const RDF_TYPE_SHORT: &str = "a";

pub mod ldp {
    pub const RESOURCE: &str = "<http://www.w3.org/ns/ldp#Resource>";
    pub const RDF_SOURCE: &str = "<http://www.w3.org/ns/ldp#RDFSource>";
    pub const NON_RDF_SOURCE: &str = "<http://www.w3.org/ns/ldp#NonRDFSource>";
    pub const CONTAINER: &str = "<http://www.w3.org/ns/ldp#Container>";
    pub const BASIC_CONTAINER: &str = "<http://www.w3.org/ns/ldp#BasicContainer>";
    pub const DIRECT_CONTAINER: &str = "<http://www.w3.org/ns/ldp#DirectContainer>";
    pub const CONTAINS: &str = "<http://www.w3.org/ns/ldp#contains>";
    pub const MEMBERSHIP_RESOURCE: &str = "<http://www.w3.org/ns/ldp#membershipResource>";
    pub const HAS_MEMBER_RELATION: &str = "<http://www.w3.org/ns/ldp#hasMemberRelation>";
    pub const INSERTED_CONTENT_RELATION: &str =
        "<http://www.w3.org/ns/ldp#insertedContentRelation>";
    pub const MEMBER_SUBJECT: &str = "<http://www.w3.org/ns/ldp#MemberSubject>";
    pub const CONSTRAINED_BY: &str = "<http://www.w3.org/ns/ldp#constrainedBy>";
}

pub mod dc {
    pub const TITLE: &str = "<http://purl.org/dc/terms/title>";
    pub const CREATED: &str = "<http://purl.org/dc/terms/created>";
}

/// Server-managed predicates, in the server's own (made-up, unregistered)
/// namespace: they never appear on the wire in a request, only in the
/// stored meta file and in the `server:contentType` triple the HTTP layer
/// synthesizes for non-RDF creation.
pub mod server {
    pub const ETAG: &str = "<http://ldp-server/ns#etag>";
    pub const CONTENT_TYPE: &str = "<http://ldp-server/ns#contentType>";
}

/// Predicates a client is never allowed to set directly via PATCH/PUT/POST
/// triples — they are entirely server-managed.
pub fn is_server_managed_predicate(predicate: &str) -> bool {
    let normalized = if predicate == RDF_TYPE_SHORT {
        RDF_TYPE
    } else {
        predicate
    };
    matches!(
        normalized,
        RDF_TYPE | ldp::CONTAINS | ldp::CONSTRAINED_BY | server::ETAG
    )
}
