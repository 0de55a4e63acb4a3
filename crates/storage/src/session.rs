//! Per-session quiz progress handed to the quiz UI.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::keyed::KeyedState;
use crate::origin::StorageContext;
use quizlink_core::constants::{ANSWERS_KEY, CURRENT_STEP_KEY};
use quizlink_core::Namespace;

/// Answers keyed by question id.
pub type Answers = BTreeMap<String, Value>;

/// Accessor for one session's answers and current step, bound to the
/// session's namespace. The quiz UI calls it on every answer and step change.
#[derive(Debug, Clone)]
pub struct SessionAccessor {
    namespace: Namespace,
    answers: Arc<KeyedState<Answers>>,
    current_step: Arc<KeyedState<u32>>,
}

impl SessionAccessor {
    #[must_use]
    pub fn open(ctx: &StorageContext, namespace: Namespace) -> Self {
        let answers = Arc::new(ctx.keyed(namespace.key(ANSWERS_KEY), Answers::new()));
        let current_step = Arc::new(ctx.keyed(namespace.key(CURRENT_STEP_KEY), 0u32));
        Self { namespace, answers, current_step }
    }

    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    #[must_use]
    pub fn answers(&self) -> Answers {
        self.answers.get()
    }

    pub fn record_answer(&self, question_id: &str, answer: Value) {
        let question_id = question_id.to_owned();
        self.answers.update(move |current| {
            let mut next = current.clone();
            next.insert(question_id, answer);
            next
        });
    }

    #[must_use]
    pub fn current_step(&self) -> u32 {
        self.current_step.get()
    }

    pub fn set_step(&self, step: u32) {
        self.current_step.set(step);
    }

    /// Move to the next step and return it.
    pub fn advance(&self) -> u32 {
        self.current_step.update(|step| step.saturating_add(1));
        self.current_step.get()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.get().is_empty() && self.current_step.get() == 0
    }

    /// Drop all progress of this session.
    pub fn reset(&self) {
        self.answers.clear();
        self.current_step.clear();
    }

    #[must_use]
    pub fn answers_state(&self) -> &Arc<KeyedState<Answers>> {
        &self.answers
    }

    #[must_use]
    pub fn step_state(&self) -> &Arc<KeyedState<u32>> {
        &self.current_step
    }

    /// Follow changes made to this session by other contexts.
    #[must_use]
    pub fn spawn_sync(&self) -> Vec<JoinHandle<()>> {
        vec![self.answers.spawn_sync(), self.current_step.spawn_sync()]
    }
}
