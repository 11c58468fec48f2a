//! Command plumbing
//!
//! Commands are structs whose fields are their parameters. Each one names itself through
//! [`Operation`] and does its work through [`Execute`], returning an [`ExecutionResult`] that
//! says whether the outcome belongs in the activity log.

use crate::types::LogEntry;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// Static metadata every command carries
pub trait Operation {
    /// Verb, e.g. "move"
    fn verb(&self) -> &'static str;

    /// Noun, e.g. "item"
    fn noun(&self) -> &'static str;

    /// One-line human description
    fn description(&self) -> &'static str;

    /// Canonical op string, e.g. "move item"
    fn op_string(&self) -> String {
        format!("{} {}", self.verb(), self.noun())
    }
}

/// Implement [`Operation`] for a command struct
macro_rules! operation {
    ($ty:ty, verb = $verb:literal, noun = $noun:literal, description = $desc:literal) => {
        impl $crate::operation::Operation for $ty {
            fn verb(&self) -> &'static str {
                $verb
            }

            fn noun(&self) -> &'static str {
                $noun
            }

            fn description(&self) -> &'static str {
                $desc
            }
        }
    };
}
pub(crate) use operation;

/// Run a command against a context
#[async_trait]
pub trait Execute<C, E>: Operation + Send + Sync
where
    C: Send + Sync,
{
    async fn execute(&self, ctx: &C) -> ExecutionResult<Value, E>;
}

/// What a command produced, and whether that belongs in the activity log
///
/// Successful mutations carry their [`LogEntry`]. Reads and no-op moves come back
/// [`Unlogged`](Self::Unlogged). A failure carries an entry only when the command was a
/// mutation.
pub enum ExecutionResult<T, E> {
    Logged { value: T, log_entry: LogEntry },
    Unlogged { value: T },
    Failed {
        error: E,
        log_entry: Option<LogEntry>,
    },
}

impl<T, E> ExecutionResult<T, E> {
    /// The entry to append to the activity log, if any
    pub fn log_entry(&self) -> Option<&LogEntry> {
        match self {
            Self::Logged { log_entry, .. } => Some(log_entry),
            Self::Failed { log_entry, .. } => log_entry.as_ref(),
            Self::Unlogged { .. } => None,
        }
    }

    pub fn should_log(&self) -> bool {
        self.log_entry().is_some()
    }

    /// Separate the command's outcome from its log entry
    pub fn split(self) -> (Result<T, E>, Option<LogEntry>) {
        match self {
            Self::Logged { value, log_entry } => (Ok(value), Some(log_entry)),
            Self::Unlogged { value } => (Ok(value), None),
            Self::Failed { error, log_entry } => (Err(error), log_entry),
        }
    }

    /// Drop the log entry and keep the outcome
    pub fn into_result(self) -> Result<T, E> {
        self.split().0
    }
}

/// Outcome of a mutating command body before it is wrapped for logging
pub(crate) enum Mutation {
    /// State changed
    Applied(Value),
    /// Request was valid but changed nothing
    Unchanged(Value),
}

/// Time a mutating command body and wrap its outcome with a log entry
pub(crate) async fn logged<Op, Fut, E>(op: &Op, body: Fut) -> ExecutionResult<Value, E>
where
    Op: Operation + Serialize,
    Fut: std::future::Future<Output = Result<Mutation, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let input = serde_json::to_value(op).unwrap_or(Value::Null);
    let result = body.await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(Mutation::Applied(value)) => ExecutionResult::Logged {
            log_entry: LogEntry::success(op.op_string(), input, value.clone(), duration_ms),
            value,
        },
        Ok(Mutation::Unchanged(value)) => ExecutionResult::Unlogged { value },
        Err(error) => {
            let message = error.to_string();
            ExecutionResult::Failed {
                error,
                log_entry: Some(LogEntry::failure(
                    op.op_string(),
                    input,
                    &message,
                    duration_ms,
                )),
            }
        }
    }
}

/// Wrap a read-only command body
pub(crate) async fn unlogged<Fut, E>(body: Fut) -> ExecutionResult<Value, E>
where
    Fut: std::future::Future<Output = Result<Value, E>>,
{
    match body.await {
        Ok(value) => ExecutionResult::Unlogged { value },
        Err(error) => ExecutionResult::Failed {
            error,
            log_entry: None,
        },
    }
}
