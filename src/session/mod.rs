//! Prediction session state machine.
//!
//! This module owns the one piece of real mutable state in the crate: the
//! lifecycle of the current prediction request. The controller mediates
//! exactly one request at a time and exposes a deterministic [`Phase`] to
//! the presentation layer.
//!
//! # State machine
//!
//! ```text
//! Idle --request accepted--> Pending
//! Pending --source ok-------> Fulfilled
//! Pending --source error----> Failed
//! Fulfilled --reset()-------> Idle
//! Failed --reset()/retry----> Idle
//! (request while not Idle, or while a call is in flight: ignored)
//! ```
//!
//! There is no terminal state; the machine cycles for the life of a
//! session. There is no cancellation: once a request enters `Pending` it
//! runs to completion, and its resolution is always applied (`reset()`
//! during `Pending` is a no-op, so no discard path exists).
//!
//! # Concurrency
//!
//! A single atomic in-flight flag is the sole gate against duplicate
//! concurrent requests; duplicate calls (double-click, repeated key events)
//! are silently ignored until resolution. Phase transitions publish through
//! a `tokio::sync::watch` channel, which makes each transition atomic and
//! gives observers change notifications for free.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::prediction::PredictionResult;
use crate::source::PredictionSource;

/// Lifecycle phase of the current prediction request.
///
/// Exactly one phase is active at any observation point. `Fulfilled`
/// always carries a valid result; `Failed` carries none.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// No request outstanding, no result shown.
    Idle,
    /// A request was accepted and the source call is running.
    Pending,
    /// The source resolved; the result is on display.
    Fulfilled(PredictionResult),
    /// The source failed; a retry affordance is on display.
    Failed,
}

impl Phase {
    /// Get the stored result, if any.
    #[must_use]
    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            Self::Fulfilled(result) => Some(result),
            _ => None,
        }
    }

    /// Short phase name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Fulfilled(_) => "fulfilled",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of a `request_prediction` call.
///
/// `Ignored` is the deliberate idempotent-ignore policy, not a failure:
/// no error, no state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The request was accepted and ran to resolution.
    Accepted,
    /// The session was busy or not idle; nothing happened.
    Ignored,
}

/// Clears the in-flight flag on every exit path, including cancellation.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Mediates exactly one prediction request at a time.
///
/// The controller owns the session phase exclusively; no other component
/// mutates it. The wired [`PredictionSource`] is a stateless service from
/// the controller's perspective and is selected at construction time.
///
/// # Example
///
/// ```rust,ignore
/// let controller = SessionController::new(Arc::new(LocalSource::new()));
///
/// let outcome = controller.request_prediction().await;
/// if let Phase::Fulfilled(result) = controller.phase() {
///     println!("{} {}", result.theme.icon(), result.text);
/// }
/// controller.reset();
/// ```
pub struct SessionController {
    /// The wired prediction source.
    source: Arc<dyn PredictionSource>,
    /// Phase storage and change notification in one place.
    phase: watch::Sender<Phase>,
    /// Sole gate against concurrent duplicate requests.
    in_flight: AtomicBool,
    /// Unique session identifier, for log correlation.
    session_id: String,
    /// When this session was created.
    started_at: DateTime<Utc>,
}

impl SessionController {
    /// Create a controller in the `Idle` phase.
    #[must_use]
    pub fn new(source: Arc<dyn PredictionSource>) -> Self {
        let (phase, _) = watch::channel(Phase::Idle);
        let session_id = Uuid::new_v4().to_string();
        debug!(session_id = %session_id, source = source.source_name(), "session created");
        Self {
            source,
            phase,
            in_flight: AtomicBool::new(false),
            session_id,
            started_at: Utc::now(),
        }
    }

    /// Get the current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase.borrow().clone()
    }

    /// Subscribe to phase-change notifications.
    ///
    /// This is the presentation boundary: renderers observe phases here and
    /// feed user intent back through [`Self::request_prediction`] and
    /// [`Self::reset`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Get the unique session identifier.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the session creation time.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Request one prediction and drive it to resolution.
    ///
    /// Accepted only when the phase is `Idle` and no call is in flight;
    /// otherwise this is a no-op returning [`RequestOutcome::Ignored`]. On
    /// acceptance the phase moves to `Pending`, the source is awaited, and
    /// the phase settles on `Fulfilled` or `Failed`. The in-flight flag is
    /// cleared on every exit path so the session can never get stuck.
    pub async fn request_prediction(&self) -> RequestOutcome {
        if !matches!(*self.phase.borrow(), Phase::Idle) {
            debug!(session_id = %self.session_id, "request ignored: not idle");
            return RequestOutcome::Ignored;
        }

        // swap is the authoritative gate: of several racing callers only
        // the first sees `false` here.
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!(session_id = %self.session_id, "request ignored: already in flight");
            return RequestOutcome::Ignored;
        }
        let guard = InFlightGuard(&self.in_flight);

        self.phase.send_replace(Phase::Pending);
        debug!(session_id = %self.session_id, source = self.source.source_name(), "request accepted");

        match self.source.fetch_prediction().await {
            Ok(result) => {
                drop(guard);
                info!(
                    session_id = %self.session_id,
                    theme = %result.theme,
                    "prediction fulfilled"
                );
                self.phase.send_replace(Phase::Fulfilled(result));
            }
            Err(e) => {
                drop(guard);
                warn!(session_id = %self.session_id, error = %e, "prediction failed");
                self.phase.send_replace(Phase::Failed);
            }
        }

        RequestOutcome::Accepted
    }

    /// Return to `Idle`, discarding any stored result.
    ///
    /// Callable from `Fulfilled` or `Failed`; from `Idle` or `Pending` it
    /// is a no-op. Returns whether a transition happened.
    pub fn reset(&self) -> bool {
        let changed = self.phase.send_if_modified(|phase| match phase {
            Phase::Fulfilled(_) | Phase::Failed => {
                *phase = Phase::Idle;
                true
            }
            Phase::Idle | Phase::Pending => false,
        });
        if changed {
            debug!(session_id = %self.session_id, "session reset to idle");
        }
        changed
    }

    /// Leave the `Failed` phase and allow a fresh request.
    ///
    /// Semantically identical to [`Self::reset`]; kept as a distinct
    /// affordance for the error-state retry action.
    pub fn retry_from_error(&self) -> bool {
        self.reset()
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session_id", &self.session_id)
            .field("phase", &self.phase.borrow().name())
            .field("source", &self.source.source_name())
            .finish()
    }
}
