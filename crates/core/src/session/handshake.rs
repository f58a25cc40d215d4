//! Handshake negotiation: send the `GET`, then learn the stream's framing.
//!
//! Two facts are recovered from the response before any frame is read:
//!
//! - the **boundary token** from `Content-Type: multipart/...; boundary=...`
//! - the **skip-lines offset**: how many lines separate a part's
//!   `Content-Length` header from the first JPEG byte (`FF D8`)
//!
//! The offset is measured once, on the first part, and assumed to hold for
//! every later part. Servers that vary their part headers from frame to frame
//! are not supported.

use std::io::{Read, Write};

use crate::endpoint::Endpoint;
use crate::error::{MjpegError, ProtocolErrorKind, Result};
use crate::protocol::HttpRequest;
use crate::protocol::headers;
use crate::transport::StreamReader;

/// Framing parameters learned from the response preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub boundary: Vec<u8>,
    /// Lines between `Content-Length` and the image data. `-1` only when the
    /// SOI marker sits on the `Content-Length` line itself.
    pub skip_lines: i32,
}

pub fn negotiate<S: Read + Write>(
    reader: &mut StreamReader<S>,
    endpoint: &Endpoint,
) -> Result<Handshake> {
    let request = HttpRequest::for_endpoint(endpoint);
    reader.write_all(request.serialize().as_bytes())?;
    tracing::debug!(
        path = %request.path,
        auth = request.get_header("Authorization").is_some(),
        "request sent"
    );

    let boundary = read_boundary(reader)?;
    drain_headers(reader)?;
    let skip_lines = measure_skip_lines(reader)?;

    Ok(Handshake {
        boundary,
        skip_lines,
    })
}

/// Scan response headers for the multipart content type.
fn read_boundary<S: Read>(reader: &mut StreamReader<S>) -> Result<Vec<u8>> {
    while let Some(line) = reader.read_line()? {
        if headers::is_blank(line) {
            break;
        }
        if headers::is_multipart_content_type(line) {
            return headers::parse_boundary(line).ok_or(MjpegError::Protocol {
                kind: ProtocolErrorKind::MalformedContentType,
            });
        }
    }

    Err(MjpegError::Protocol {
        kind: ProtocolErrorKind::MissingBoundary,
    })
}

/// Discard the remaining response headers, up to and including the blank line.
fn drain_headers<S: Read>(reader: &mut StreamReader<S>) -> Result<()> {
    loop {
        match reader.read_line()? {
            Some(line) if headers::is_blank(line) => return Ok(()),
            Some(_) => {}
            None => return Err(MjpegError::premature_end("reading response headers")),
        }
    }
}

/// Count the lines from the first part's `Content-Length` to its SOI line.
fn measure_skip_lines<S: Read>(reader: &mut StreamReader<S>) -> Result<i32> {
    let mut at_soi = loop {
        let line = reader
            .read_line()?
            .ok_or_else(|| MjpegError::premature_end("looking for the first Content-Length"))?;
        if headers::is_content_length(line) {
            break headers::starts_with_soi(line);
        }
    };

    let mut skip_lines = -1;
    while !at_soi {
        let line = reader
            .read_line()?
            .ok_or_else(|| MjpegError::premature_end("looking for the first JPEG marker"))?;
        skip_lines += 1;
        at_soi = headers::starts_with_soi(line);
    }

    Ok(skip_lines)
}
