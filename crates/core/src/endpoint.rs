//! Target URL of an MJPEG stream.
//!
//! Only the subset of URL syntax that camera servers actually use is
//! accepted:
//!
//! ```text
//! http://[user[:pass]@]host[:port]/path[?query]
//! ```
//!
//! The query string is kept verbatim (no percent-decoding), which matters for
//! servers like mjpg-streamer that expect `?action=stream?dummy=param.mjpg`.

use base64::prelude::{BASE64_STANDARD, Engine as _};

use crate::error::{MjpegError, Result};

/// Port used when the URL does not name one.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Parsed view of a stream URL. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Path component, always starting with `/`.
    pub path: String,
    /// Query string without the leading `?`. `None` when absent or empty.
    pub query: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = |reason: &str| MjpegError::InvalidUrl(format!("{reason}: {url}"));

        let (scheme, rest) = url
            .trim()
            .split_once("://")
            .ok_or_else(|| invalid("missing scheme"))?;
        if !scheme.eq_ignore_ascii_case("http") {
            return Err(invalid("unsupported scheme"));
        }

        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);

        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let (authority, target) = rest.split_at(authority_end);

        let (userinfo, hostport) = match authority.rsplit_once('@') {
            Some((userinfo, hostport)) => (Some(userinfo), hostport),
            None => (None, authority),
        };

        let (username, password) = match userinfo {
            Some(info) => match info.split_once(':') {
                Some((user, pass)) => (Some(user.to_string()), Some(pass.to_string())),
                None => (Some(info.to_string()), None),
            },
            None => (None, None),
        };

        let (host, port) = split_host_port(hostport).ok_or_else(|| invalid("bad host or port"))?;
        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        Ok(Endpoint {
            host: host.to_string(),
            port: port.unwrap_or(DEFAULT_HTTP_PORT),
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
            username,
            password,
        })
    }

    /// Path sent on the request line: `path` or `path?query`.
    pub fn request_path(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// Base64 of `username:password` for HTTP Basic authentication.
    ///
    /// `None` when the URL carried no user-info. A missing password is
    /// encoded as an empty one.
    pub fn basic_credentials(&self) -> Option<String> {
        let username = self.username.as_deref()?;
        let password = self.password.as_deref().unwrap_or("");
        Some(BASE64_STANDARD.encode(format!("{username}:{password}")))
    }
}

/// Split `host[:port]` or `[v6addr][:port]`. Returns `None` on a bad port.
fn split_host_port(hostport: &str) -> Option<(&str, Option<u16>)> {
    let (host, port) = if let Some(bracketed) = hostport.strip_prefix('[') {
        let (host, after) = bracketed.split_once(']')?;
        match after {
            "" => (host, None),
            _ => (host, Some(after.strip_prefix(':')?)),
        }
    } else {
        match hostport.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (hostport, None),
        }
    };

    match port {
        None | Some("") => Some((host, None)),
        Some(port) => port.parse::<u16>().ok().map(|p| (host, Some(p))),
    }
}
