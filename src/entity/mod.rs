//! Typed handler binding — decode, call, encode.
//!
//! [`EntityBinder`] turns a typed async function `T -> Result<R, _>` into a
//! raw [`Handler`]: it negotiates a decoder for the request body, invokes the
//! function, then negotiates an encoder and charset for the response body.
//! Every call produces exactly one of a response, a rejection, or a failure.

use std::future::Future;
use std::sync::Arc;

use crate::codec::{Marshaller, Unmarshaller};
use crate::dispatch::{Handler, HandlerError, HandlerFuture, HandlerOutcome};
use crate::http::{Request, Response, StatusCode};
use crate::negotiate::{self, ContentType, ContentTypeRange, Rejection};

/// Binds a typed async function to declared codec capabilities.
///
/// Unmarshallers and marshallers are consulted in the order they were added;
/// that order is the negotiation tie-break. At least one of each must be
/// added before the binder is attached, or every request with a body will be
/// rejected as undecodable.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use manifold::codec::Json;
/// use manifold::dispatch::Dispatcher;
/// use manifold::entity::EntityBinder;
///
/// let doubler = EntityBinder::new(|n: i64| async move { Ok(n * 2) })
///     .unmarshaller(Json::new())
///     .marshaller(Json::new());
///
/// let dispatcher = Dispatcher::default();
/// dispatcher.attach(Arc::new(doubler));
/// ```
pub struct EntityBinder<T, R, F> {
    unmarshallers: Vec<Arc<dyn Unmarshaller<T>>>,
    marshallers: Vec<Arc<dyn Marshaller<R>>>,
    func: Arc<F>,
}

impl<T, R, F, Fut> EntityBinder<T, R, F>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
{
    /// Creates a binder around `func` with no codecs yet.
    pub fn new(func: F) -> Self {
        Self {
            unmarshallers: Vec::new(),
            marshallers: Vec::new(),
            func: Arc::new(func),
        }
    }

    /// Adds a candidate decoder for the request body.
    #[must_use]
    pub fn unmarshaller(mut self, unmarshaller: impl Unmarshaller<T> + 'static) -> Self {
        self.unmarshallers.push(Arc::new(unmarshaller));
        self
    }

    /// Adds a candidate encoder for the response body.
    #[must_use]
    pub fn marshaller(mut self, marshaller: impl Marshaller<R> + 'static) -> Self {
        self.marshallers.push(Arc::new(marshaller));
        self
    }
}

impl<T, R, F, Fut> Handler for EntityBinder<T, R, F>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
{
    fn call(&self, request: Request) -> HandlerFuture {
        let unmarshallers = self.unmarshallers.clone();
        let marshallers = self.marshallers.clone();
        let func = Arc::clone(&self.func);

        Box::pin(async move {
            // Declared content with zero bytes counts as no entity.
            let Some(body) = request.body().filter(|b| !b.bytes().is_empty()) else {
                return Ok(HandlerOutcome::Rejected(Rejection::EntityExpected));
            };

            let ranges: Vec<&[ContentTypeRange]> =
                unmarshallers.iter().map(|u| u.ranges()).collect();
            let decoder = match negotiate::select_decoder(body.content_type(), &ranges) {
                Ok(index) => &unmarshallers[index],
                Err(rejection) => return Ok(HandlerOutcome::Rejected(rejection)),
            };

            // A matched representation with a malformed payload is the
            // handler's failure, not a negotiation rejection.
            let value: T = decoder
                .unmarshal(body.content_type(), body.bytes())
                .map_err(|e| HandlerError::Internal(e.to_string()))?;

            let result = (func)(value).await?;

            let producible: Vec<&[ContentType]> =
                marshallers.iter().map(|m| m.produces()).collect();
            let selection = match negotiate::select_encoder(
                &request.accept(),
                &request.accept_charset(),
                &producible,
            ) {
                Ok(selection) => selection,
                Err(rejection) => return Ok(HandlerOutcome::Rejected(rejection)),
            };

            let bytes = marshallers[selection.marshaller]
                .marshal(&result, &selection.content_type)
                .map_err(|e| HandlerError::Internal(e.to_string()))?;

            Ok(HandlerOutcome::Response(
                Response::new(StatusCode::Ok).entity(selection.content_type, bytes),
            ))
        })
    }
}
