//! Fan-out dispatch — route one request to every attached handler and
//! arbitrate their concurrent results into exactly one response.
//!
//! [`Dispatcher`] owns the ordered collection of attached handlers. Each
//! [`dispatch`](Dispatcher::dispatch) call snapshots that collection once,
//! invokes every handler concurrently under a shared time budget, and folds
//! their outcomes commutatively: the first committed response wins, later
//! responses are discarded as duplicates, rejections accumulate into a
//! deduplicated set that is surfaced only when no handler produced a
//! response, and the first observed failure aborts the whole dispatch.
//!
//! The caller always receives exactly one well-formed [`Response`]: 404 when
//! no handler answers, a mapped 4xx for negotiation rejections, the
//! handler's own status for domain errors, and 500 for anything else.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::http::{Request, Response, StatusCode};
use crate::negotiate::{self, ContentType, ContentTypeRange, Rejection};

/// Time budget a dispatch grants each handler unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How a single handler concluded one request.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// The handler produced a response; it competes in the arbitration fold.
    Response(Response),
    /// The handler had nothing to say about this request.
    NoResponse,
    /// The handler declined for a negotiation reason; surfaced only when no
    /// handler responds.
    Rejected(Rejection),
}

/// A handler-raised failure. Any failure aborts the whole dispatch.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A domain error carrying the status the handler wants the client to
    /// see. Propagated as that response, never retried.
    #[error("{message}")]
    Domain { status: StatusCode, message: String },

    /// Anything else — decode faults, panics, timeouts. Mapped to a generic
    /// 500 response.
    #[error("{0}")]
    Internal(String),
}

/// Boxed future returned by [`Handler::call`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<HandlerOutcome, HandlerError>> + Send>>;

/// A request handler attachable to a [`Dispatcher`].
///
/// Implementations must be shareable across tasks; one handler may serve
/// arbitrarily many concurrent dispatches.
pub trait Handler: Send + Sync {
    fn call(&self, request: Request) -> HandlerFuture;
}

// Adapter turning an async closure into a Handler.
struct FnHandler<F> {
    func: F,
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerOutcome, HandlerError>> + Send + 'static,
{
    fn call(&self, request: Request) -> HandlerFuture {
        Box::pin((self.func)(request))
    }
}

/// Wraps an async function as a [`Handler`].
///
/// # Examples
///
/// ```
/// use manifold::dispatch::{handler_fn, HandlerOutcome};
///
/// let handler = handler_fn(|_req| async { Ok(HandlerOutcome::NoResponse) });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(func: F) -> impl Handler + 'static
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerOutcome, HandlerError>> + Send + 'static,
{
    FnHandler { func }
}

/// Opaque handle identifying one attachment.
///
/// Identity is the handle, not the handler: attaching the same handler twice
/// yields two distinct registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Clone)]
struct Registration {
    id: HandlerId,
    handler: Arc<dyn Handler>,
}

/// Owner of the attached-handler collection and entry point for dispatch.
///
/// Attach and detach are the only mutations; every dispatch reads the
/// collection as a consistent snapshot taken at its start, so a concurrent
/// attach or detach never partially affects an in-flight dispatch.
pub struct Dispatcher {
    registrations: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher whose handlers are each bounded by `timeout`
    /// per dispatch.
    pub fn new(timeout: Duration) -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            timeout,
        }
    }

    /// Attaches a handler at the front of the collection (most recently
    /// attached first) and returns its registration handle.
    pub fn attach(&self, handler: Arc<dyn Handler>) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut registrations = self.write_lock();
        registrations.insert(0, Registration { id, handler });
        debug!(handler = ?id, count = registrations.len(), "handler attached");
        id
    }

    /// Detaches every registration with the given handle. Returns `true`
    /// when something was removed; a no-op on unknown handles.
    pub fn detach(&self, id: HandlerId) -> bool {
        let mut registrations = self.write_lock();
        let before = registrations.len();
        registrations.retain(|reg| reg.id != id);
        let removed = registrations.len() < before;
        if removed {
            debug!(handler = ?id, count = registrations.len(), "handler detached");
        }
        removed
    }

    /// Number of currently attached handlers.
    pub fn handler_count(&self) -> usize {
        self.read_lock().len()
    }

    /// Dispatches `request` to every attached handler and arbitrates their
    /// results into one response.
    ///
    /// Suspends the caller until the fold resolves, the time budget elapses,
    /// or a handler fails. Handler completion order is unconstrained; the
    /// fold does not depend on it. Once the dispatch completes, straggling
    /// handler tasks are abandoned and their eventual results discarded.
    pub async fn dispatch(&self, request: Request) -> Response {
        let snapshot: Vec<Registration> = self.read_lock().clone();
        let uri = request.uri().to_owned();

        if snapshot.is_empty() {
            debug!(uri = %uri, "no handler attached");
            return no_service(&uri);
        }

        debug!(
            method = %request.method(),
            uri = %uri,
            handlers = snapshot.len(),
            "dispatching"
        );

        let mut tasks = JoinSet::new();
        for registration in snapshot {
            let request = request.clone();
            let budget = self.timeout;
            tasks.spawn(async move {
                let result = match tokio::time::timeout(
                    budget,
                    registration.handler.call(request),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(HandlerError::Internal(format!(
                        "handler timed out after {budget:?}"
                    ))),
                };
                (registration.id, result)
            });
        }

        let mut winner: Option<Response> = None;
        let mut rejections: Vec<Rejection> = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let (id, result) = match joined {
                Ok(pair) => pair,
                Err(join_error) => {
                    error!(uri = %uri, error = %join_error, "handler task failed");
                    tasks.abort_all();
                    return failure_response(&HandlerError::Internal(join_error.to_string()));
                }
            };

            match result {
                Ok(HandlerOutcome::Response(response)) => {
                    if winner.is_some() {
                        warn!(handler = ?id, uri = %uri, "duplicate response discarded");
                    } else {
                        winner = Some(response);
                    }
                }
                Ok(HandlerOutcome::NoResponse) => {}
                Ok(HandlerOutcome::Rejected(rejection)) => {
                    if !rejections.contains(&rejection) {
                        rejections.push(rejection);
                    }
                }
                Err(error) => {
                    warn!(handler = ?id, uri = %uri, error = %error, "handler failed — aborting dispatch");
                    tasks.abort_all();
                    return failure_response(&error);
                }
            }
        }

        match winner {
            Some(response) => response,
            None if !rejections.is_empty() => rejection_response(&rejections),
            None => {
                debug!(uri = %uri, "no handler produced a response");
                no_service(&uri)
            }
        }
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, Vec<Registration>> {
        self.registrations
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Registration>> {
        self.registrations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

fn no_service(uri: &str) -> Response {
    Response::text(StatusCode::NotFound, format!("No service available for {uri}"))
}

fn failure_response(error: &HandlerError) -> Response {
    match error {
        HandlerError::Domain { status, message } => Response::text(*status, message.clone()),
        HandlerError::Internal(_) => Response::text(
            StatusCode::InternalServerError,
            "The request could not be handled due to an internal server error",
        ),
    }
}

// Maps an accumulated rejection set to one client-visible response.
// Precedence: a missing entity outranks an undecodable one, which outranks
// an unencodable response; lists from rejections of the same kind are merged.
fn rejection_response(rejections: &[Rejection]) -> Response {
    if rejections.iter().any(|r| matches!(r, Rejection::EntityExpected)) {
        return Response::text(
            StatusCode::BadRequest,
            "Request entity expected but not supplied",
        );
    }

    let mut acceptable: Vec<&ContentTypeRange> = Vec::new();
    for rejection in rejections {
        if let Rejection::UnsupportedRequestContentType(ranges) = rejection {
            for range in ranges {
                if !acceptable.contains(&range) {
                    acceptable.push(range);
                }
            }
        }
    }
    if !acceptable.is_empty() {
        return Response::text(
            StatusCode::UnsupportedMediaType,
            format!(
                "The request's Content-Type must be one of: {}",
                negotiate::join(&acceptable)
            ),
        );
    }

    let mut producible: Vec<&ContentType> = Vec::new();
    for rejection in rejections {
        if let Rejection::UnacceptedResponseContentType(types) = rejection {
            for content_type in types {
                if !producible.contains(&content_type) {
                    producible.push(content_type);
                }
            }
        }
    }
    Response::text(
        StatusCode::NotAcceptable,
        format!(
            "Resource representation is only available with these Content-Types: {}",
            negotiate::join(&producible)
        ),
    )
}
