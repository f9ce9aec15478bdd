// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (account/stat storage)
//! - Quests (template reference data)
//! - UserQuests (per-user acceptance records)
//! - MasterAchievements (badge definitions)
//!
//! Quest completion runs as a single Firestore transaction so racing
//! completions for the same user retry with fresh data instead of
//! losing increments.

use chrono::NaiveDate;
use futures_util::{stream, StreamExt};

use crate::db::collections;
use crate::engine::{achievements, reconcile};
use crate::error::AppError;
use crate::models::{AchievementDef, QuestStatus, QuestTemplate, UserAccount, UserQuest};
use crate::time_utils::format_utc_rfc3339;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Build the composite document id for a user's quest instance.
pub fn user_quest_doc_id(user_id: &str, quest_id: &str) -> String {
    format!(
        "{}_{}",
        urlencoding::encode(user_id),
        urlencoding::encode(quest_id)
    )
}

/// What a successful quest completion produced.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// Transient banner for the client ("+200 XP · 200 kcal burned")
    pub banner: String,
    pub xp: u32,
    pub level: u32,
    pub title: String,
    pub quests_this_week: u32,
    /// Achievement titles unlocked by this completion
    pub unlocked: Vec<String>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user account by id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserAccount>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user account.
    pub async fn upsert_user(&self, user: &UserAccount) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Quest Template Operations ───────────────────────────────

    /// Get a quest template by id.
    pub async fn get_quest(&self, quest_id: &str) -> Result<Option<QuestTemplate>, AppError> {
        let quest: Option<QuestTemplate> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::QUESTS)
            .obj()
            .one(quest_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(quest.map(|mut q| {
            q.id = quest_id.to_string();
            q
        }))
    }

    /// List active quest templates, ordered by title.
    pub async fn list_active_quests(&self) -> Result<Vec<QuestTemplate>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::QUESTS)
            .filter(|q| q.field("status").eq("active"))
            .order_by([(
                "title",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Batch upsert quest templates (reference-data seeding).
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn batch_upsert_quests(&self, quests: &[QuestTemplate]) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(quests.to_vec())
            .map(|quest| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::QUESTS)
                    .document_id(&quest.id)
                    .object(&quest)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    // ─── Achievement Definition Operations ───────────────────────

    /// List all master achievement definitions.
    pub async fn list_achievement_defs(&self) -> Result<Vec<AchievementDef>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MASTER_ACHIEVEMENTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Batch upsert achievement definitions (reference-data seeding).
    pub async fn batch_upsert_achievements(
        &self,
        defs: &[AchievementDef],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(defs.to_vec())
            .map(|def| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::MASTER_ACHIEVEMENTS)
                    .document_id(&def.id)
                    .object(&def)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    // ─── User Quest Instance Operations ──────────────────────────

    /// Get a user's quest instance.
    pub async fn get_user_quest(
        &self,
        user_id: &str,
        quest_id: &str,
    ) -> Result<Option<UserQuest>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_QUESTS)
            .obj()
            .one(&user_quest_doc_id(user_id, quest_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a user's quest instance.
    pub async fn set_user_quest(&self, instance: &UserQuest) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_QUESTS)
            .document_id(user_quest_doc_id(&instance.user_id, &instance.quest_id))
            .object(instance)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a user's quest instance (abandonment).
    ///
    /// A single delete: the record is removed, not flagged.
    pub async fn delete_user_quest(&self, user_id: &str, quest_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USER_QUESTS)
            .document_id(user_quest_doc_id(user_id, quest_id))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List a user's open (accepted or in-progress) quest instances.
    pub async fn list_open_user_quests(&self, user_id: &str) -> Result<Vec<UserQuest>, AppError> {
        let user_id = user_id.to_string();
        let instances: Vec<UserQuest> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USER_QUESTS)
            .filter(move |q| q.field("userId").eq(user_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(instances
            .into_iter()
            .filter(|i| !i.status.is_terminal())
            .collect())
    }

    /// List a user's completed quest instances, newest first, with
    /// cursor pagination (`before` is an exclusive completedAt bound).
    pub async fn list_completed_quests(
        &self,
        user_id: &str,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<UserQuest>, AppError> {
        let user_id = user_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USER_QUESTS);

        let query = if let Some(before) = before {
            let before = before.to_string();
            query.filter(move |q| {
                q.for_all([
                    q.field("userId").eq(user_id.clone()),
                    q.field("status").eq("completed"),
                    q.field("completedAt").less_than(before.clone()),
                ])
            })
        } else {
            query.filter(move |q| {
                q.for_all([
                    q.field("userId").eq(user_id.clone()),
                    q.field("status").eq("completed"),
                ])
            })
        };

        query
            .order_by([(
                "completedAt",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic Quest Completion ─────────────────────────────────

    /// Atomically complete a quest: advance the instance lifecycle,
    /// reconcile user stats, and award achievements in one transaction.
    ///
    /// If another request modifies the user document concurrently,
    /// Firestore retries the transaction with fresh data, preventing the
    /// lost-update race between two completions.
    ///
    /// Returns `Ok(None)` when there is nothing to do: the user document
    /// is missing (logged and aborted, no retry) or the instance was
    /// already completed (idempotent skip enforced at the instance layer).
    pub async fn complete_quest_atomic(
        &self,
        user_id: &str,
        quest: &QuestTemplate,
        today: NaiveDate,
    ) -> Result<Option<CompletionOutcome>, AppError> {
        let now = format_utc_rfc3339(chrono::Utc::now());

        // Missing account: log and abort without failing the caller.
        if self.get_user(user_id).await?.is_none() {
            tracing::warn!(user_id, quest_id = %quest.id, "User not found, aborting completion");
            return Ok(None);
        }

        // Reference data is immutable; read it outside the transaction.
        let defs = self.list_achievement_defs().await?;

        // Begin a transaction
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Read the account and instance within the transaction,
        //    registering both documents for conflict detection.
        let account: Option<UserAccount> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read user in transaction: {}", e))
            })?;

        let Some(mut account) = account else {
            let _ = transaction.rollback().await;
            tracing::warn!(user_id, "User vanished during completion");
            return Ok(None);
        };

        let instance: Option<UserQuest> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_QUESTS)
            .obj()
            .one(&user_quest_doc_id(user_id, &quest.id))
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read instance in transaction: {}", e))
            })?;

        let Some(mut instance) = instance else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!(
                "Quest {} not accepted by user",
                quest.id
            )));
        };

        // 2. Replay protection: a completed instance stays completed.
        if instance.status == QuestStatus::Completed {
            tracing::debug!(
                user_id,
                quest_id = %quest.id,
                "Quest already completed (idempotent skip)"
            );
            let _ = transaction.rollback().await;
            return Ok(None);
        }

        // 3. Advance the lifecycle; invalid transitions abort.
        instance.status = match instance.status.transition(QuestStatus::Completed) {
            Ok(status) => status,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e);
            }
        };
        instance.completed_at = Some(now.clone());
        instance.progress = Some(1.0);

        // 4. Reconcile stats and award achievements in memory.
        reconcile::apply_quest_completion(&mut account, quest, today);
        let unlocked = achievements::award(&mut account, &defs);

        // 5. Add both writes to the transaction.
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_QUESTS)
            .document_id(user_quest_doc_id(user_id, &quest.id))
            .object(&instance)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add instance to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&account)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        // 6. Commit atomically.
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id,
            quest_id = %quest.id,
            xp = account.xp,
            level = account.level,
            unlocked = ?unlocked,
            "Quest completed atomically"
        );

        Ok(Some(CompletionOutcome {
            banner: reconcile::completion_banner(quest),
            xp: account.xp,
            level: account.level,
            title: account.title.clone(),
            quests_this_week: account.quests_this_week,
            unlocked,
        }))
    }

    // ─── Non-transactional Stat Updates ──────────────────────────

    /// Apply a read-modify-write update to the user document, then
    /// re-evaluate achievements. Used by the step and check-in paths.
    ///
    /// Missing account: log and abort, matching the completion path.
    pub async fn update_user_stats<F>(
        &self,
        user_id: &str,
        mutate: F,
    ) -> Result<Option<UserAccount>, AppError>
    where
        F: FnOnce(&mut UserAccount),
    {
        let Some(mut account) = self.get_user(user_id).await? else {
            tracing::warn!(user_id, "User not found, skipping stat update");
            return Ok(None);
        };

        mutate(&mut account);

        let defs = self.list_achievement_defs().await?;
        achievements::award(&mut account, &defs);

        self.upsert_user(&account).await?;
        Ok(Some(account))
    }
}
