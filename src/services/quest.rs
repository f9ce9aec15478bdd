// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Quest lifecycle orchestration.
//!
//! Handles the core workflow:
//! 1. Accept a quest (create the instance)
//! 2. Start it (open a progress-evaluator session)
//! 3. Feed raw samples through the evaluator
//! 4. On goal-met, complete atomically against Firestore
//! 5. Abandon tears the session down and removes the instance
//!
//! Evaluator sessions are in-memory, keyed by (user, quest). A process
//! restart drops them; the client re-starts the quest while the instance
//! document keeps its lifecycle status.

use std::sync::Arc;

use dashmap::DashMap;
use geo::Point;

use crate::db::{CompletionOutcome, FirestoreDb};
use crate::engine::{ProgressEvaluator, Sample, SampleOutcome};
use crate::error::{AppError, Result};
use crate::models::{ActivityType, QuestStatus, UserAccount, UserQuest};
use crate::time_utils::{format_utc_rfc3339, today_utc};

type SessionKey = (String, String);

/// Orchestrates quest lifecycle and in-flight progress evaluation.
#[derive(Clone)]
pub struct QuestService {
    db: FirestoreDb,
    sessions: Arc<DashMap<SessionKey, ProgressEvaluator>>,
}

/// What feeding a sample produced.
#[derive(Debug)]
pub enum SampleResult {
    /// Goal not yet met
    Pending {
        progress: Option<f64>,
        remaining_km: Option<f64>,
    },
    /// This sample completed the quest
    Completed(CompletionOutcome),
    /// The sample did not apply (wrong kind, or arrived after completion)
    Ignored,
}

impl QuestService {
    pub fn new(db: FirestoreDb) -> Self {
        Self {
            db,
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Create the caller's account document if it does not exist yet.
    pub async fn ensure_profile(&self, user_id: &str) -> Result<UserAccount> {
        if let Some(existing) = self.db.get_user(user_id).await? {
            return Ok(existing);
        }
        let account = UserAccount::new(user_id, &format_utc_rfc3339(chrono::Utc::now()));
        self.db.upsert_user(&account).await?;
        tracing::info!(user_id, "Created user account");
        Ok(account)
    }

    /// Accept a quest: create the instance in the Accepted state.
    pub async fn accept_quest(&self, user_id: &str, quest_id: &str) -> Result<UserQuest> {
        let quest = self
            .db
            .get_quest(quest_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quest {} not found", quest_id)))?;

        if quest.status != "active" {
            return Err(AppError::BadRequest(format!(
                "Quest {} is not available",
                quest_id
            )));
        }

        if self.db.get_user_quest(user_id, quest_id).await?.is_some() {
            return Err(AppError::BadRequest(format!(
                "Quest {} already accepted",
                quest_id
            )));
        }

        let instance =
            UserQuest::accept(user_id, quest_id, &format_utc_rfc3339(chrono::Utc::now()));
        self.db.set_user_quest(&instance).await?;

        tracing::info!(user_id, quest_id, "Quest accepted");
        Ok(instance)
    }

    /// Start an accepted quest: advance the lifecycle and open the
    /// evaluator session. Active quests need the destination the client
    /// picked from its surroundings.
    pub async fn start_quest(
        &self,
        user_id: &str,
        quest_id: &str,
        destination: Option<Point<f64>>,
    ) -> Result<UserQuest> {
        let quest = self
            .db
            .get_quest(quest_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quest {} not found", quest_id)))?;

        let mut instance = self
            .db
            .get_user_quest(user_id, quest_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quest {} not accepted", quest_id)))?;

        instance.status = instance.status.transition(QuestStatus::InProgress)?;
        instance.started_at = Some(format_utc_rfc3339(chrono::Utc::now()));

        if quest.activity_type == ActivityType::Active && destination.is_none() {
            return Err(AppError::BadRequest(
                "Active quests need a destination".to_string(),
            ));
        }

        let evaluator = ProgressEvaluator::for_quest(&quest, destination).ok_or_else(|| {
            AppError::BadRequest(format!("Quest {} has no usable goal", quest_id))
        })?;

        self.db.set_user_quest(&instance).await?;
        self.sessions
            .insert(session_key(user_id, quest_id), evaluator);

        tracing::info!(user_id, quest_id, "Quest started");
        Ok(instance)
    }

    /// Feed one raw sample through the quest's evaluator.
    ///
    /// On goal-met the completion is applied atomically and the session
    /// removed; the outcome carries the banner for the client.
    pub async fn observe_sample(
        &self,
        user_id: &str,
        quest_id: &str,
        sample: Sample,
    ) -> Result<SampleResult> {
        let key = session_key(user_id, quest_id);

        // Scope the map guard: nothing async may run while it is held.
        let (outcome, progress, remaining_km) = {
            let mut entry = self.sessions.get_mut(&key).ok_or_else(|| {
                AppError::BadRequest(format!("Quest {} is not in progress", quest_id))
            })?;
            let outcome = entry.observe(sample);
            let remaining_km = match entry.value() {
                ProgressEvaluator::Distance(eval) => eval.remaining_km(),
                _ => None,
            };
            (outcome, entry.progress(), remaining_km)
        };

        match outcome {
            SampleOutcome::Pending => Ok(SampleResult::Pending {
                progress,
                remaining_km,
            }),
            SampleOutcome::Ignored => Ok(SampleResult::Ignored),
            SampleOutcome::GoalMet => {
                let quest = self
                    .db
                    .get_quest(quest_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Quest {} not found", quest_id)))?;

                let result = self
                    .db
                    .complete_quest_atomic(user_id, &quest, today_utc())
                    .await;

                // The session is spent either way; late samples must not
                // re-trigger completion.
                self.sessions.remove(&key);

                match result? {
                    Some(outcome) => Ok(SampleResult::Completed(outcome)),
                    None => Ok(SampleResult::Ignored),
                }
            }
        }
    }

    /// Abandon a quest from any non-completed state: tear down the
    /// session and remove the instance record.
    pub async fn abandon_quest(&self, user_id: &str, quest_id: &str) -> Result<()> {
        let instance = self
            .db
            .get_user_quest(user_id, quest_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quest {} not accepted", quest_id)))?;

        // Validates the lifecycle (completed quests cannot be abandoned)
        instance.status.transition(QuestStatus::Abandoned)?;

        self.sessions.remove(&session_key(user_id, quest_id));
        self.db.delete_user_quest(user_id, quest_id).await?;

        tracing::info!(user_id, quest_id, "Quest abandoned");
        Ok(())
    }

    /// Record a pedometer sample (cumulative steps today).
    pub async fn record_steps(&self, user_id: &str, steps_today: u32) -> Result<Option<UserAccount>> {
        let today = today_utc();
        self.db
            .update_user_stats(user_id, |account| {
                crate::engine::reconcile::apply_step_sample(account, steps_today, today);
            })
            .await
    }

    /// Record a daily check-in.
    pub async fn check_in(&self, user_id: &str) -> Result<Option<UserAccount>> {
        let today = today_utc();
        self.db
            .update_user_stats(user_id, |account| {
                crate::engine::reconcile::apply_check_in(account, today);
            })
            .await
    }

    /// Whether an evaluator session is open (for tests and diagnostics).
    pub fn has_session(&self, user_id: &str, quest_id: &str) -> bool {
        self.sessions.contains_key(&session_key(user_id, quest_id))
    }
}

fn session_key(user_id: &str, quest_id: &str) -> SessionKey {
    (user_id.to_string(), quest_id.to_string())
}
