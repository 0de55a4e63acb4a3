//! Session bootstrap: turns the route a visitor lands on into an active quiz
//! session, resolving short links and deep links first.
//!
//! The controller is an explicit state machine driven by two events, a route
//! change and a lookup completion. Every route change issues a fresh
//! [`MountToken`]; a completion carrying any other token is discarded, and a
//! torn-down mount has no current token at all. Navigation and store writes
//! happen only while handling an event whose token is current.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use quizlink_core::constants::{ACTIVE_SESSION_KEY, BASELINE_QUIZ_TYPE};
use quizlink_core::{
    CanonicalQuizTarget, CoreError, Namespace, NavigationTarget, QuizType, Route, RouteRequest,
    SessionContext,
};
use quizlink_storage::{KeyedState, SessionAccessor, StorageContext};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::deep_link::{self, DeepLinkDecision};
use crate::error::ServiceError;
use crate::navigator::Navigator;
use crate::short_link::{ShortLinkOutcome, ShortLinkResolver};

/// Identity of one route mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MountToken(u64);

/// Why a bootstrap attempt failed. The UI renders "quiz not found" for both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum BootstrapError {
    UnknownQuizType(String),
    InvalidRoute(String),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownQuizType(quiz) => write!(f, "unknown quiz type: {quiz}"),
            Self::InvalidRoute(route) => write!(f, "invalid route: {route}"),
        }
    }
}

impl From<CoreError> for BootstrapError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownQuizType(quiz) => Self::UnknownQuizType(quiz),
            other => Self::InvalidRoute(other.to_string()),
        }
    }
}

impl From<ServiceError> for BootstrapError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(core) => core.into(),
            other => Self::InvalidRoute(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BootstrapState {
    Idle,
    /// A short-link lookup is outstanding. The UI shows a neutral loader.
    Resolving { token: MountToken, short_code: String },
    /// `redirected` is set when entering this state navigated the visitor.
    Resolved { session: SessionContext, target: CanonicalQuizTarget, redirected: bool },
    NotFound,
    Error { error: BootstrapError },
}

/// Result of a route change: the new token and the short code to look up, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub token: MountToken,
    pub pending_lookup: Option<String>,
}

pub struct BootstrapController {
    resolver: ShortLinkResolver,
    navigator: Arc<dyn Navigator>,
    ctx: StorageContext,
    active: KeyedState<Option<SessionContext>>,
    state: watch::Sender<BootstrapState>,
    current: Mutex<Option<MountToken>>,
    next_token: AtomicU64,
    session: Mutex<Option<SessionAccessor>>,
    /// Where the start action leads when the current route set one.
    start: Mutex<Option<CanonicalQuizTarget>>,
}

impl fmt::Debug for BootstrapController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapController")
            .field("context", &self.ctx)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl BootstrapController {
    #[must_use]
    pub fn new(
        ctx: StorageContext,
        resolver: ShortLinkResolver,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let active = ctx.keyed(Namespace::root().key(ACTIVE_SESSION_KEY), None);
        let (state, _initial_rx) = watch::channel(BootstrapState::Idle);
        Self {
            resolver,
            navigator,
            ctx,
            active,
            state,
            current: Mutex::new(None),
            next_token: AtomicU64::new(1),
            session: Mutex::new(None),
            start: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> BootstrapState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BootstrapState> {
        self.state.subscribe()
    }

    /// The persisted active session pointer.
    #[must_use]
    pub fn active_session(&self) -> Option<SessionContext> {
        self.active.get()
    }

    /// Answers and progress of the resolved session, once there is one.
    #[must_use]
    pub fn session(&self) -> Option<SessionAccessor> {
        lock(&self.session).clone()
    }

    /// Handle a route change. Supersedes whatever the previous mount was doing.
    ///
    /// The navigator is called after the controller lock is released.
    pub fn route_changed(&self, request: RouteRequest) -> RouteChange {
        let mut current = lock(&self.current);
        let token = self.issue_token();
        *current = Some(token);
        *lock(&self.start) = None;
        tracing::debug!(token = token.0, route = ?request.route, "Route changed");

        let mut navigation = None;
        let pending_lookup = match request.route {
            Route::ShortLink { code } => {
                self.state.send_replace(BootstrapState::Resolving { token, short_code: code.clone() });
                Some(code)
            },
            Route::Entry { quiz_type } => {
                match deep_link::normalize(quiz_type, &request.params) {
                    Ok(DeepLinkDecision::Redirect { target }) => {
                        navigation = self.enter_resolved(&target, true);
                    },
                    Ok(DeepLinkDecision::Stay { start }) => {
                        self.restore(Some(start.quiz_type));
                        *lock(&self.start) = Some(start);
                    },
                    Err(e) => self.fail(e.into()),
                }
                None
            },
            Route::Quiz => {
                match deep_link::effective_quiz_type(BASELINE_QUIZ_TYPE, &request.params) {
                    Ok(quiz_type) if request.params.has_link_signal() => {
                        let target = CanonicalQuizTarget::direct_link(
                            quiz_type,
                            request.params.key().map(str::to_owned),
                            request.params.doctor().map(str::to_owned),
                        );
                        navigation = self.enter_resolved(&target, false);
                    },
                    Ok(_) => {
                        let hint = request.params.explicit_type().and_then(|t| t.parse().ok());
                        self.restore(hint);
                    },
                    Err(e) => self.fail(e.into()),
                }
                None
            },
            Route::Share { quiz_type, doctor_id } => {
                navigation =
                    self.enter_resolved(&CanonicalQuizTarget::share(quiz_type, doctor_id), false);
                None
            },
        };
        drop(current);
        if let Some(target) = navigation {
            self.navigator.navigate(&target);
        }
        RouteChange { token, pending_lookup }
    }

    /// Parse `url` and handle it as a route change. Unparseable routes put
    /// the controller into [`BootstrapState::Error`].
    pub fn route_url(&self, url: &str) -> RouteChange {
        match RouteRequest::parse(url) {
            Ok(request) => self.route_changed(request),
            Err(e) => {
                let mut current = lock(&self.current);
                let token = self.issue_token();
                *current = Some(token);
                *lock(&self.start) = None;
                self.fail(e.into());
                RouteChange { token, pending_lookup: None }
            },
        }
    }

    /// Apply a settled lookup. Returns `false` when `token` is no longer
    /// current; nothing is written or navigated in that case.
    pub fn lookup_completed(&self, token: MountToken, outcome: ShortLinkOutcome) -> bool {
        let current = lock(&self.current);
        if *current != Some(token) {
            tracing::debug!(token = token.0, "Discarding stale lookup result");
            return false;
        }
        let navigation = match outcome {
            ShortLinkOutcome::Resolved { target } => self.enter_resolved(&target, true),
            ShortLinkOutcome::NotFound => {
                self.state.send_replace(BootstrapState::NotFound);
                Some(NavigationTarget::NotFound)
            },
            ShortLinkOutcome::UnknownQuizType { quiz_type } => {
                self.fail(BootstrapError::UnknownQuizType(quiz_type));
                None
            },
        };
        drop(current);
        if let Some(target) = navigation {
            self.navigator.navigate(&target);
        }
        true
    }

    /// Unmount. Only the current mount can be torn down; later lookups
    /// carrying `token` are discarded.
    pub fn teardown(&self, token: MountToken) -> bool {
        let mut current = lock(&self.current);
        if *current != Some(token) {
            return false;
        }
        *current = None;
        self.state.send_replace(BootstrapState::Idle);
        tracing::debug!(token = token.0, "Route unmounted");
        true
    }

    /// The explicit "start quiz" action. An entry route without link
    /// parameters starts a single quiz with no doctor or key attached; any
    /// other resolved route continues the resolved session.
    pub fn start_quiz(&self) -> Option<NavigationTarget> {
        let BootstrapState::Resolved { session, .. } = self.state() else {
            return None;
        };
        let start = lock(&self.start).clone().unwrap_or_else(|| session.target());
        let target = NavigationTarget::Quiz(start);
        self.navigator.navigate(&target);
        Some(target)
    }

    /// Mount `request` and drive its lookup, if any, on the runtime.
    #[must_use]
    pub fn mount(self: &Arc<Self>, request: RouteRequest) -> MountHandle {
        let change = self.route_changed(request);
        self.spawn(change)
    }

    #[must_use]
    pub fn mount_url(self: &Arc<Self>, url: &str) -> MountHandle {
        let change = self.route_url(url);
        self.spawn(change)
    }

    fn spawn(self: &Arc<Self>, change: RouteChange) -> MountHandle {
        let task = self.spawn_lookup(&change);
        MountHandle { controller: Arc::clone(self), token: change.token, task }
    }

    fn spawn_lookup(self: &Arc<Self>, change: &RouteChange) -> Option<JoinHandle<()>> {
        let code = change.pending_lookup.clone()?;
        let controller = Arc::clone(self);
        let token = change.token;
        Some(tokio::spawn(async move {
            let outcome = controller.resolver.resolve(&code).await;
            controller.lookup_completed(token, outcome);
        }))
    }

    fn issue_token(&self) -> MountToken {
        MountToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    /// Use the persisted session if it matches `hint`, otherwise start and
    /// persist a fresh one.
    fn restore(&self, hint: Option<QuizType>) {
        // Another context may have switched sessions since this mirror was read.
        self.active.reload();
        let persisted = self
            .active
            .get()
            .filter(|session| hint.is_none_or(|quiz| quiz == session.quiz_type));
        let session = match persisted {
            Some(session) => {
                tracing::debug!(quiz = %session.quiz_type, "Restoring persisted session");
                session
            },
            None => {
                let fresh = SessionContext::fresh(hint.unwrap_or(BASELINE_QUIZ_TYPE), Utc::now());
                let stale = self.ctx.clear_namespace(&fresh.namespace());
                tracing::info!(quiz = %fresh.quiz_type, stale, "Starting fresh session");
                self.active.set(Some(fresh.clone()));
                fresh
            },
        };
        self.open_session(&session);
        let target = session.target();
        self.state.send_replace(BootstrapState::Resolved { session, target, redirected: false });
    }

    /// Persist the session addressed by `target` and enter `Resolved`.
    /// Returns where to navigate when `navigate` is set.
    fn enter_resolved(
        &self,
        target: &CanonicalQuizTarget,
        navigate: bool,
    ) -> Option<NavigationTarget> {
        self.active.reload();
        let mut session = SessionContext::from_target(target, Utc::now());
        if let Some(existing) = self.active.get().filter(|s| s.same_identity(&session)) {
            session.started_at = existing.started_at;
        }
        self.active.set(Some(session.clone()));
        self.open_session(&session);
        tracing::info!(
            quiz = %session.quiz_type,
            doctor = session.doctor_id.as_deref().unwrap_or_default(),
            path = %target.path(),
            "Session resolved"
        );
        self.state.send_replace(BootstrapState::Resolved {
            session,
            target: target.clone(),
            redirected: navigate,
        });
        navigate.then(|| NavigationTarget::Quiz(target.clone()))
    }

    fn open_session(&self, session: &SessionContext) {
        let accessor = SessionAccessor::open(&self.ctx, session.namespace());
        *lock(&self.session) = Some(accessor);
    }

    fn fail(&self, error: BootstrapError) {
        tracing::warn!(error = %error, "Bootstrap failed");
        self.state.send_replace(BootstrapState::Error { error });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mounted route. Dropping it unmounts: the in-flight lookup is aborted and
/// its result, should it still arrive, is discarded.
#[derive(Debug)]
pub struct MountHandle {
    controller: Arc<BootstrapController>,
    token: MountToken,
    task: Option<JoinHandle<()>>,
}

impl MountHandle {
    #[must_use]
    pub const fn token(&self) -> MountToken {
        self.token
    }

    /// Wait for the outstanding lookup, if any, and return the state it left.
    pub async fn settled(&mut self) -> BootstrapState {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "Lookup task failed");
                }
            }
        }
        self.controller.state()
    }

    /// Move this mount to a new route, superseding the in-flight lookup.
    pub fn route_changed(&mut self, request: RouteRequest) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let change = self.controller.route_changed(request);
        self.task = self.controller.spawn_lookup(&change);
        self.token = change.token;
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.controller.teardown(self.token);
    }
}
