//! Static asset serving: the embedded stylesheet bundle and on-disk post images.

use std::io::ErrorKind;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};
use mime_guess::{Mime, MimeGuess};

use crate::application::error::ErrorReport;
use crate::infra::images::{ImageError, ImageStorage};

static STYLESHEETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

/// Long-lived caching for files compiled into the binary.
const EMBEDDED_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
/// Post images live on disk and may be replaced between deploys.
const DISK_CACHE_CONTROL: &str = "public, max-age=3600";

/// Serve the embedded stylesheet bundle under `/static`.
pub async fn serve_embedded(Path(path): Path<String>) -> Response {
    let source = "infra::assets::serve_embedded";
    match resolve_embedded(&STYLESHEETS, &path) {
        Some(file) => build_response(
            Bytes::from_static(file),
            mime_guess::from_path(&path),
            EMBEDDED_CACHE_CONTROL,
        ),
        None => not_found_response(source),
    }
}

/// Serve a post image from the configured images directory.
pub async fn serve_image(
    State(images): State<Arc<ImageStorage>>,
    Path(path): Path<String>,
) -> Response {
    let source = "infra::assets::serve_image";
    match images.read(&path).await {
        Ok(bytes) => build_response(
            Bytes::from(bytes),
            mime_guess::from_path(&path),
            DISK_CACHE_CONTROL,
        ),
        Err(ImageError::InvalidPath) => rejected_response(source, StatusCode::BAD_REQUEST),
        Err(ImageError::Io(err)) if err.kind() == ErrorKind::NotFound => not_found_response(source),
        Err(ImageError::Io(err)) => {
            let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
            ErrorReport::from_error(source, StatusCode::INTERNAL_SERVER_ERROR, &err)
                .attach(&mut response);
            response
        }
    }
}

fn not_found_response(source: &'static str) -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    ErrorReport::from_message(source, StatusCode::NOT_FOUND, "Static asset not found")
        .attach(&mut response);
    response
}

fn rejected_response(source: &'static str, status: StatusCode) -> Response {
    let mut response = status.into_response();
    ErrorReport::from_message(source, status, "Static asset request rejected")
        .attach(&mut response);
    response
}

fn resolve_embedded(bundle: &'static Dir<'static>, path: &str) -> Option<&'static [u8]> {
    let candidate = path.trim_start_matches('/');

    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        // Avoid directory traversal and disallow directory listings.
        return None;
    }

    bundle.get_file(candidate).map(|file| file.contents())
}

fn build_response(bytes: Bytes, mime: MimeGuess, cache_control: &'static str) -> Response {
    let mime: Mime = mime.first_or_octet_stream();
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );

    response
}
