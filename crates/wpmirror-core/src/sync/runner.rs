//! One fetch, decide, persist cycle over the whole source collection.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{decide, Decision};
use crate::models::{Post, PostId};
use crate::source::PostSource;
use crate::state::RunState;
use crate::storage::{SnapshotKey, SnapshotStore};
use crate::{Error, Result};

/// Step at which a single item failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    /// Record could not be parsed into a post
    Parse,
    /// Existence check or snapshot read failed
    Decide,
    /// Serializing or storing the snapshot failed
    Write,
}

/// A post that could not be synchronized during a cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub post_id: Option<PostId>,
    pub stage: FailureStage,
    pub reason: String,
}

impl ItemFailure {
    fn new(post_id: Option<PostId>, stage: FailureStage, error: &Error) -> Self {
        Self {
            post_id,
            stage,
            reason: error.to_string(),
        }
    }
}

/// Summary of a completed cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Records returned by the source, parsed or not
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failures: Vec<ItemFailure>,
}

impl RunReport {
    fn new(run_id: Uuid, started_at: DateTime<Utc>, fetched: usize) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: started_at,
            fetched,
            created: 0,
            updated: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    fn record(&mut self, decision: Decision) {
        match decision {
            Decision::Create => self.created += 1,
            Decision::Update => self.updated += 1,
            Decision::Skip => self.skipped += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Snapshots written during the cycle.
    pub const fn writes(&self) -> usize {
        self.created + self.updated
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Drives sync cycles for one source and one store.
///
/// Items are processed strictly in source order. A failure on one post is
/// recorded in the report and the cycle moves on; only a failed fetch fails
/// the cycle. At most one cycle runs at a time per runner.
pub struct SyncRunner<S, B> {
    source: S,
    store: B,
    state: Mutex<RunState>,
}

impl<S, B> SyncRunner<S, B>
where
    S: PostSource,
    B: SnapshotStore,
{
    pub fn new(source: S, store: B) -> Self {
        Self {
            source,
            store,
            state: Mutex::new(RunState::Idle),
        }
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn store(&self) -> &B {
        &self.store
    }

    /// Current state; `Running` while a cycle holds the runner.
    pub fn state(&self) -> RunState {
        self.state
            .try_lock()
            .map_or(RunState::Running, |state| *state)
    }

    /// Run one full cycle.
    ///
    /// Returns [`Error::RunInProgress`] without touching the source or store
    /// when another cycle is still running, and the fetch error when the
    /// source cannot be read. Per-post failures land in the report.
    pub async fn run_cycle(&self) -> Result<RunReport> {
        let Ok(mut state) = self.state.try_lock() else {
            tracing::warn!("Skipping sync cycle: previous cycle still running");
            return Err(Error::RunInProgress);
        };
        *state = RunState::Running;

        let run_id = Uuid::now_v7();
        let started_at = Utc::now();
        tracing::info!(%run_id, "Sync cycle started");

        let fetched = match self.source.fetch_posts().await {
            Ok(fetched) => fetched,
            Err(error) => {
                *state = RunState::Failed;
                tracing::error!(%run_id, %error, "Sync cycle failed");
                return Err(error);
            }
        };

        let mut report = RunReport::new(run_id, started_at, fetched.len());

        for rejected in fetched.rejected {
            tracing::warn!(
                %run_id,
                index = rejected.index,
                post_id = ?rejected.id_hint,
                error = %rejected.reason,
                "Skipping malformed post record"
            );
            report.failures.push(ItemFailure {
                post_id: rejected.id_hint,
                stage: FailureStage::Parse,
                reason: rejected.reason,
            });
        }

        for post in &fetched.posts {
            match self.sync_post(post).await {
                Ok(decision) => {
                    match decision {
                        Decision::Skip => tracing::info!(
                            %run_id,
                            post_id = %post.id,
                            %decision,
                            "Post unchanged in store, skipping"
                        ),
                        Decision::Create | Decision::Update => tracing::info!(
                            %run_id,
                            post_id = %post.id,
                            %decision,
                            "Post snapshot written"
                        ),
                    }
                    report.record(decision);
                }
                Err(failure) => {
                    tracing::error!(
                        %run_id,
                        post_id = %post.id,
                        stage = ?failure.stage,
                        error = %failure.reason,
                        "Failed to sync post"
                    );
                    report.failures.push(failure);
                }
            }
        }

        report.finished_at = Utc::now();
        *state = RunState::Completed;
        tracing::info!(
            %run_id,
            fetched = report.fetched,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed(),
            "Sync cycle completed"
        );

        Ok(report)
    }

    async fn sync_post(&self, post: &Post) -> std::result::Result<Decision, ItemFailure> {
        let decision = decide(post, &self.store)
            .await
            .map_err(|error| ItemFailure::new(Some(post.id), FailureStage::Decide, &error))?;
        if !decision.writes() {
            return Ok(decision);
        }

        let write_failure =
            |error: Error| ItemFailure::new(Some(post.id), FailureStage::Write, &error);
        let bytes = post.to_snapshot().map_err(write_failure)?;
        self.store
            .write(&SnapshotKey::for_post(post.id), &bytes, decision.overwrites())
            .await
            .map_err(write_failure)?;

        Ok(decision)
    }
}
