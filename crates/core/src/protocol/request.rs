use crate::endpoint::Endpoint;

/// A minimal HTTP/1.1 `GET` request.
///
/// Serializes to the request line and headers joined by `\r\n` and
/// terminated by an empty line:
///
/// ```text
/// GET /?action=stream HTTP/1.1\r\n
/// Host: camera.local\r\n
/// Authorization: Basic YWxpY2U6c2VjcmV0\r\n
/// \r\n
/// ```
///
/// Uses a builder pattern — chain [`add_header`](Self::add_header), then
/// call [`serialize`](Self::serialize).
#[must_use]
pub struct HttpRequest {
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(path: &str) -> Self {
        HttpRequest {
            path: path.to_string(),
            headers: Vec::new(),
        }
    }

    /// The stream request for `endpoint`: `Host`, plus `Authorization` when
    /// the URL carried credentials. No other headers are sent.
    pub fn for_endpoint(endpoint: &Endpoint) -> Self {
        let request = HttpRequest::get(&endpoint.request_path()).add_header("Host", &endpoint.host);
        match endpoint.basic_credentials() {
            Some(token) => request.add_header("Authorization", &format!("Basic {token}")),
            None => request,
        }
    }

    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Look up a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn serialize(&self) -> String {
        let mut lines = vec![format!("GET {} HTTP/1.1", self.path)];
        lines.extend(
            self.headers
                .iter()
                .map(|(name, value)| format!("{name}: {value}")),
        );
        let mut request = lines.join("\r\n");
        request.push_str("\r\n\r\n");
        request
    }
}
