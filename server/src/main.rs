use anyhow::{Context, Result};
use clap::Parser;
use ldp_core::coordinator::GetPreferences;
use ldp_core::{Coordinator, Error, Settings};
use oxhttp::model::{HeaderName, HeaderValue, Request, Response, Status};
use oxhttp::Server;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_BODY_SIZE: u64 = 0x0400_0000;

#[derive(Parser)]
#[command(about, version)]
/// Linked Data Platform HTTP server.
struct Args {
    /// Host and port to listen to.
    #[arg(short, long, default_value = "localhost:9001")]
    bind: String,
    /// Directory in which resources are persisted.
    #[arg(short, long, default_value = "data")]
    data: PathBuf,
    /// Externally visible root URI clients should use to address this server.
    ///
    /// Defaults to `http://<bind>`.
    #[arg(long)]
    root_uri: Option<String>,
}

pub fn main() -> Result<()> {
    let args = Args::parse();
    let root_uri = args
        .root_uri
        .unwrap_or_else(|| format!("http://{}", args.bind));
    let settings = Settings::new(root_uri, args.data);
    let coordinator =
        Coordinator::new(settings).context("could not initialize the resource store")?;

    let mut server = Server::new(move |request| {
        eprintln!("{} {}", request.method().as_ref(), request.url().path());
        handle_request(request, &coordinator).unwrap_or_else(error_response)
    });
    server.set_global_timeout(HTTP_TIMEOUT);
    server.set_server_name(concat!("ldp_server/", env!("CARGO_PKG_VERSION")))?;
    eprintln!("Listening for requests at http://{}", &args.bind);
    server.listen(args.bind)?;
    Ok(())
}

fn handle_request(request: &mut Request, coordinator: &Coordinator) -> Result<Response, Error> {
    let path = request.url().path().to_string();
    match request.method().as_ref() {
        "GET" => get(request, coordinator, &path, true),
        "HEAD" => get(request, coordinator, &path, false),
        "POST" => post(request, coordinator, &path),
        "PUT" => put(request, coordinator, &path),
        "PATCH" => patch(request, coordinator, &path),
        "DELETE" => delete(coordinator, &path),
        "OPTIONS" => options(coordinator, &path),
        _ => Ok(Response::builder(Status::METHOD_NOT_ALLOWED).build()),
    }
}

/// `GET`/`HEAD /path`: fetch (or describe) a resource, honoring `If-None-Match`
/// and the `Prefer` header's `minimal-container`/membership preferences.
fn get(
    request: &Request,
    coordinator: &Coordinator,
    path: &str,
    with_body: bool,
) -> Result<Response, Error> {
    let preferences = preferences_from_prefer_header(request);
    let view = coordinator.get_node(path, preferences)?;
    let node = &view.node;

    if let Some(if_none_match) = header_value(request, "If-None-Match") {
        if if_none_match == node.etag() {
            let response = Response::builder(Status::NOT_MODIFIED).build();
            return Ok(apply_headers(response, node.headers()));
        }
    }

    if !with_body {
        let response = Response::builder(Status::OK).build();
        return Ok(apply_headers(response, node.headers()));
    }
    let response = if node.is_rdf() {
        let graph = node.content_graph(preferences.minimal_container);
        let mut body = graph.serialize();
        if let Some(membership) = &view.membership_graph {
            body.push_str(&membership.serialize());
        }
        Response::builder(Status::OK).with_body(body)
    } else {
        Response::builder(Status::OK).with_body(node.binary().to_vec())
    };
    Ok(apply_headers(response, node.headers()))
}

/// `POST /path`: create a child under the container at `path`.
fn post(request: &mut Request, coordinator: &Coordinator, path: &str) -> Result<Response, Error> {
    let slug = header_value(request, "Slug").unwrap_or_default();
    let node = if is_rdf_content_type(request) {
        let body = read_body_to_string(request)?;
        coordinator.create_rdf_source(&body, path, &slug)?
    } else {
        let triples = synthesize_content_type_triple(&content_type_header(request));
        let body = read_body_to_end(request)?;
        coordinator.create_non_rdf_source(&body[..], path, &slug, &triples)?
    };
    let mut response = apply_headers(Response::builder(Status::CREATED).build(), node.headers());
    if let Ok(location) = HeaderValue::from_str(node.uri()) {
        response.headers_mut().append(HeaderName::LOCATION, location);
    }
    Ok(response)
}

/// `PUT /path`: create-or-replace. `If-Match` is required when replacing.
fn put(request: &mut Request, coordinator: &Coordinator, path: &str) -> Result<Response, Error> {
    let etag = header_value(request, "If-Match").unwrap_or_default();
    let (parent_path, slug) = ldp_core::paths::dir_base(path);

    let node = if is_rdf_content_type(request) {
        let body = read_body_to_string(request)?;
        coordinator.replace_rdf_source(&body, &parent_path, &slug, &etag)?
    } else {
        let triples = synthesize_content_type_triple(&content_type_header(request));
        let body = read_body_to_end(request)?;
        coordinator.replace_non_rdf_source(&body[..], path, &etag, &triples)?
    };
    let response = apply_headers(Response::builder(Status::CREATED).build(), node.headers());
    Ok(response)
}

/// `PATCH /path`: merge triples into an existing RDF source.
fn patch(request: &mut Request, coordinator: &Coordinator, path: &str) -> Result<Response, Error> {
    let body = read_body_to_string(request)?;
    let node = coordinator.patch_node(path, &body)?;
    Ok(apply_headers(Response::builder(Status::OK).build(), node.headers()))
}

/// `DELETE /path`: tombstone the resource and unlink it from its parent.
fn delete(coordinator: &Coordinator, path: &str) -> Result<Response, Error> {
    coordinator.delete_node(path)?;
    Ok(Response::builder(Status::OK).build())
}

/// `OPTIONS /path`: echo the headers a client would get from `GET`, with no body.
fn options(coordinator: &Coordinator, path: &str) -> Result<Response, Error> {
    let node = coordinator.get_head(path)?;
    Ok(apply_headers(Response::builder(Status::OK).build(), node.headers()))
}

fn preferences_from_prefer_header(request: &Request) -> GetPreferences {
    let mut preferences = GetPreferences::default();
    if let Some(prefer) = header_value(request, "Prefer") {
        preferences.minimal_container = prefer.contains("minimal-container");
        preferences.membership = prefer.contains("membership");
    }
    preferences
}

fn is_rdf_content_type(request: &Request) -> bool {
    content_type_header(request).contains("turtle")
}

fn content_type_header(request: &Request) -> String {
    header_value(request, "Content-Type").unwrap_or_default()
}

/// Synthesizes the `server:contentType` triple the coordinator expects
/// alongside a Non-RDF source's body, from the request's `Content-Type`.
fn synthesize_content_type_triple(content_type: &str) -> String {
    if content_type.is_empty() {
        String::new()
    } else {
        format!(
            "<> {} \"{}\" .\n",
            ldp_core::vocab::server::CONTENT_TYPE,
            content_type
        )
    }
}

fn read_body_to_string(request: &mut Request) -> Result<String, Error> {
    let mut buffer = String::new();
    request
        .body_mut()
        .take(MAX_BODY_SIZE)
        .read_to_string(&mut buffer)
        .map_err(Error::Io)?;
    Ok(buffer)
}

fn read_body_to_end(request: &mut Request) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    request
        .body_mut()
        .take(MAX_BODY_SIZE)
        .read_to_end(&mut buffer)
        .map_err(Error::Io)?;
    Ok(buffer)
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    let header = HeaderName::from_str(name).ok()?;
    request
        .header(&header)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Copies `headers` (built by `ldp_core::Node`) onto `response`, preserving
/// multi-value order — significant for `Link`, where `describedby` must
/// precede the type links on Non-RDF responses.
fn apply_headers(mut response: Response, headers: &ldp_core::Headers) -> Response {
    for (name, values) in headers {
        let Ok(header_name) = HeaderName::from_str(name) else {
            continue;
        };
        for value in values {
            if let Ok(header_value) = HeaderValue::from_str(value) {
                response.headers_mut().append(header_name.clone(), header_value);
            }
        }
    }
    response
}

fn error_response(error: Error) -> Response {
    let (status, constrained_by) = match &error {
        Error::NodeNotFound => (Status::NOT_FOUND, None),
        Error::DuplicateNode | Error::CreateDeleted | Error::AlreadyExists => {
            (Status::CONFLICT, None)
        }
        Error::EtagMissing => (Status::PRECONDITION_REQUIRED, None),
        Error::EtagMismatch => (Status::PRECONDITION_FAILED, None),
        Error::ServerManagedProperty => {
            (Status::CONFLICT, Some(ldp_core::vocab::ldp::CONSTRAINED_BY))
        }
        Error::ParentNotContainer
        | Error::CannotPatchNonRdf
        | Error::CannotReplaceKindMismatch
        | Error::CannotDeleteRoot
        | Error::InvalidSlug(_)
        | Error::ParseError { .. } => (Status::BAD_REQUEST, None),
        Error::Io(_) => (Status::INTERNAL_SERVER_ERROR, None),
    };
    let mut response = Response::builder(status).with_body(error.to_string());
    if let Some(rel) = constrained_by {
        if let Ok(value) = HeaderValue::from_str(&format!("{rel}; rel=\"ldp:constrainedBy\"")) {
            response.headers_mut().append(HeaderName::LINK, value);
        }
    }
    response
}
