//! Chat Command Interpreter.
//!
//! A finite-state text matcher: `command` parses input into a tagged
//! command, `session` drives the state machine, and the reward-bearing
//! side effects go through a [`Backend`].

pub mod canned;
pub mod command;
pub mod drills;
pub mod session;

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::client::ApiClient;
use crate::ledger::{Grant, GrantOutcome};
use crate::server::AppContext;
use crate::tutor::{GeneratedProblem, LearningContext};

pub use command::{is_correct, Command};
pub use session::{ChatReply, ChatSession, ChatState, QuizKind};

pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Server operations the interpreter depends on.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate_problem(&self, ctx: &LearningContext)
        -> Result<GeneratedProblem, BackendError>;
    async fn explain(&self, question: &str, ctx: &LearningContext) -> Result<String, BackendError>;
    async fn update_progress(&self, user_id: u64) -> Result<GrantOutcome, BackendError>;
    async fn easter_egg(&self, user_id: u64) -> Result<GrantOutcome, BackendError>;
}

#[async_trait]
impl Backend for ApiClient {
    async fn generate_problem(
        &self,
        ctx: &LearningContext,
    ) -> Result<GeneratedProblem, BackendError> {
        Ok(ApiClient::generate_problem(self, ctx).await?)
    }

    async fn explain(&self, question: &str, ctx: &LearningContext) -> Result<String, BackendError> {
        Ok(ApiClient::explain(self, question, ctx).await?)
    }

    async fn update_progress(&self, user_id: u64) -> Result<GrantOutcome, BackendError> {
        Ok(ApiClient::update_progress(self, user_id).await?.outcome)
    }

    async fn easter_egg(&self, user_id: u64) -> Result<GrantOutcome, BackendError> {
        Ok(ApiClient::easter_egg(self, user_id).await?.outcome)
    }
}

/// Runs the interpreter against an in-process context, no HTTP hop.
pub struct LocalBackend {
    ctx: Arc<AppContext>,
}

impl LocalBackend {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn generate_problem(
        &self,
        ctx: &LearningContext,
    ) -> Result<GeneratedProblem, BackendError> {
        Ok(self.ctx.tutor.generate_problem(ctx).await?)
    }

    async fn explain(&self, question: &str, ctx: &LearningContext) -> Result<String, BackendError> {
        Ok(self.ctx.tutor.explain(question, ctx).await?)
    }

    async fn update_progress(&self, user_id: u64) -> Result<GrantOutcome, BackendError> {
        Ok(self.ctx.ledger.grant(user_id, Grant::Progress, Utc::now())?)
    }

    async fn easter_egg(&self, user_id: u64) -> Result<GrantOutcome, BackendError> {
        Ok(self.ctx.ledger.grant(user_id, Grant::EasterEgg, Utc::now())?)
    }
}
