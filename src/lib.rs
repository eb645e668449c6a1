//! # manifold
//!
//! The request-handling core of an HTTP service toolkit: fan-out dispatch
//! with arbitration, and content negotiation between typed handlers and byte
//! representations.
//!
//! A [`Dispatcher`] owns a dynamically attachable set of handlers. Each
//! request is fanned out to every attached handler concurrently; their
//! results are folded into exactly one response — or a 404 when nobody
//! answers, a 4xx when handlers declined for negotiation reasons, and a 500
//! when one fails or times out. [`EntityBinder`] lifts a typed async
//! function into a handler by negotiating a decoder for the request body and
//! an encoder plus charset for the response body against the codecs'
//! declared capabilities.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use manifold::codec::Json;
//! use manifold::dispatch::Dispatcher;
//! use manifold::entity::EntityBinder;
//! use manifold::http::{Method, Request};
//! use manifold::negotiate::ContentType;
//!
//! #[tokio::main]
//! async fn main() {
//!     let dispatcher = Dispatcher::default();
//!     dispatcher.attach(Arc::new(
//!         EntityBinder::new(|n: i64| async move { Ok(n + 1) })
//!             .unmarshaller(Json::new())
//!             .marshaller(Json::new()),
//!     ));
//!
//!     let request = Request::new(Method::Post, "/increment")
//!         .header("Accept", "application/json")
//!         .entity(ContentType::new("application", "json"), "41");
//!
//!     let response = dispatcher.dispatch(request).await;
//!     assert_eq!(response.status().as_u16(), 200);
//! }
//! ```

pub mod codec;
pub mod dispatch;
pub mod entity;
pub mod http;
pub mod negotiate;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use dispatch::{Dispatcher, Handler, HandlerError, HandlerId, HandlerOutcome, handler_fn};
pub use entity::EntityBinder;
pub use http::{Body, Headers, Method, Request, Response, StatusCode};
pub use negotiate::{AcceptSpec, CharsetSpec, ContentType, ContentTypeRange, Rejection};
