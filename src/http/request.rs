//! Immutable HTTP request values.
//!
//! A [`Request`] is built once by the embedding runtime and never mutated
//! afterwards. Cloning is cheap enough for fan-out: the body buffer is a
//! reference-counted [`Bytes`].

use bytes::Bytes;

use super::{Headers, Method};
use crate::negotiate::{AcceptSpec, CharsetSpec, ContentType};

/// A request or response body: bytes plus the content type they were
/// declared with. The two are inseparable — content without a declared type
/// does not occur in this model.
#[derive(Debug, Clone)]
pub struct Body {
    content_type: ContentType,
    bytes: Bytes,
}

impl Body {
    pub fn new(content_type: ContentType, bytes: impl Into<Bytes>) -> Self {
        Self {
            content_type,
            bytes: bytes.into(),
        }
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// An inbound HTTP request, immutable once constructed.
///
/// # Examples
///
/// ```
/// use manifold::http::{Method, Request};
/// use manifold::negotiate::ContentType;
///
/// let request = Request::new(Method::Put, "/maths")
///     .header("Accept", "text/xml")
///     .entity(ContentType::new("text", "html"), "<int>42</int>");
///
/// assert_eq!(request.uri(), "/maths");
/// assert!(request.body().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: String,
    headers: Headers,
    body: Option<Body>,
}

impl Request {
    /// Starts a request for the given method and URI.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Appends a header. Repeated names are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attaches a body with its declared content type.
    #[must_use]
    pub fn entity(mut self, content_type: ContentType, bytes: impl Into<Bytes>) -> Self {
        self.body = Some(Body::new(content_type, bytes));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// The parsed `Accept` preferences; empty when the header is absent,
    /// meaning anything is acceptable.
    pub fn accept(&self) -> AcceptSpec {
        self.headers
            .joined("accept")
            .map_or_else(AcceptSpec::default, |v| AcceptSpec::parse(&v))
    }

    /// The parsed `Accept-Charset` preferences; empty when the header is
    /// absent.
    pub fn accept_charset(&self) -> CharsetSpec {
        self.headers
            .joined("accept-charset")
            .map_or_else(CharsetSpec::default, |v| CharsetSpec::parse(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiate::ContentTypeRange;

    #[test]
    fn builder_assembles_all_parts() {
        let req = Request::new(Method::Post, "/things")
            .header("Accept", "application/json")
            .entity(ContentType::new("application", "json"), r#"{"n":1}"#);

        assert_eq!(req.method(), &Method::Post);
        assert_eq!(req.uri(), "/things");
        let body = req.body().unwrap();
        assert_eq!(body.content_type(), &ContentType::new("application", "json"));
        assert_eq!(body.bytes(), br#"{"n":1}"#);
    }

    #[test]
    fn accept_parses_repeated_headers_as_one_list() {
        let req = Request::new(Method::Get, "/")
            .header("Accept", "text/xml;q=0.8")
            .header("Accept", "text/*;q=0.2");
        let spec = req.accept();
        assert_eq!(spec.entries().len(), 2);
        assert_eq!(spec.entries()[1].range, ContentTypeRange::new("text", "*"));
    }

    #[test]
    fn absent_accept_headers_mean_anything_goes() {
        let req = Request::new(Method::Get, "/");
        assert!(req.accept().is_empty());
        assert!(req.accept_charset().is_empty());
    }

    #[test]
    fn clone_shares_the_body_buffer() {
        let req = Request::new(Method::Put, "/x")
            .entity(ContentType::new("text", "plain"), Bytes::from_static(b"hello"));
        let clone = req.clone();
        assert_eq!(clone.body().unwrap().bytes(), req.body().unwrap().bytes());
    }
}
