//! HTTP response values built through a fluent API.

use bytes::Bytes;

use super::request::Body;
use super::{Headers, StatusCode};
use crate::negotiate::ContentType;

/// An HTTP response: status, headers, and an optional typed body.
///
/// Built fluently and treated as immutable afterwards. Attaching an entity
/// also materializes the `Content-Type` header so that the header always
/// reflects exactly the negotiated (media-type, subtype, charset).
///
/// # Examples
///
/// ```
/// use manifold::http::{Response, StatusCode};
/// use manifold::negotiate::ContentType;
///
/// let response = Response::new(StatusCode::Ok)
///     .entity(ContentType::with_charset("text", "xml", "UTF-8"), "<int>84</int>");
///
/// assert_eq!(response.headers().get("content-type"), Some("text/xml; charset=UTF-8"));
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Option<Body>,
}

impl Response {
    /// Creates a response with the given status and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Appends a response header. Repeated names are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attaches a body with the given content type and sets the
    /// `Content-Type` header to match it.
    #[must_use]
    pub fn entity(mut self, content_type: ContentType, bytes: impl Into<Bytes>) -> Self {
        self.headers.remove("content-type");
        self.headers.insert("Content-Type", content_type.to_string());
        self.body = Some(Body::new(content_type, bytes));
        self
    }

    /// Convenience constructor for plain-text diagnostic responses
    /// (`text/plain; charset=UTF-8`).
    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::new(status).entity(
            ContentType::with_charset("text", "plain", "UTF-8"),
            text.into().into_bytes(),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// The content type of the body, if one is attached.
    pub fn content_type(&self) -> Option<&ContentType> {
        self.body.as_ref().map(Body::content_type)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}
