//! Shared helpers for integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::Request,
    http::{header, Method},
};
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use std::{io, path::Path};

pub const BOUNDARY: &str = "----ToolkitBoundary7MA4YWxkTrZu0gW";

// Small enough that no single frame trips a body limit.
const CHUNK: usize = 16 * 1024;

/// One multipart part; `filename: None` makes it a plain form field
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub data: Vec<u8>,
}

impl<'a> Part<'a> {
    pub fn file(filename: &'a str, data: Vec<u8>) -> Self {
        Self {
            name: "files",
            filename: Some(filename),
            data,
        }
    }

    pub fn field(name: &'a str, value: &str) -> Self {
        Self {
            name,
            filename: None,
            data: value.as_bytes().to_vec(),
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Body delivered in small frames, as a network peer would
pub fn chunked_body(data: Vec<u8>) -> Body {
    let chunks: Vec<io::Result<Bytes>> = data
        .chunks(CHUNK)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    Body::from_stream(stream::iter(chunks))
}

pub fn multipart_request(parts: &[Part<'_>]) -> Request {
    axum::http::Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(chunked_body(multipart_body(parts)))
        .unwrap()
}

/// Multipart request whose body fails after `keep` bytes
pub fn aborted_request(parts: &[Part<'_>], keep: usize) -> Request {
    let body = multipart_body(parts);
    let mut chunks: Vec<io::Result<Bytes>> = body[..keep.min(body.len())]
        .chunks(CHUNK)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    chunks.push(Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")));

    axum::http::Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from_stream(stream::iter(chunks)))
        .unwrap()
}

/// Multipart request whose body delivers `keep` bytes and then never ends
pub fn stalled_request(parts: &[Part<'_>], keep: usize) -> Request {
    let body = multipart_body(parts);
    let chunks: Vec<io::Result<Bytes>> = body[..keep.min(body.len())]
        .chunks(CHUNK)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    let stream = stream::iter(chunks).chain(stream::pending());

    axum::http::Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from_stream(stream))
        .unwrap()
}

/// `len` bytes starting with a JPEG/JFIF signature
pub fn jpeg(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
    data.extend((0..len.saturating_sub(data.len())).map(|i| (i % 251) as u8));
    data.truncate(len);
    data
}

/// `len` bytes starting with a PDF signature
pub fn pdf(len: usize) -> Vec<u8> {
    let mut data = b"%PDF-1.4\n".to_vec();
    data.resize(len.max(data.len()), b'%');
    data
}

pub fn dir_entries(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
