//! RwLock-backed map stores.

use async_trait::async_trait;
use chrono::Utc;
use drumbeat_core::{
    AccountHealth, AccountProfile, ContentPiece, Keyword, ReviewQueueItem, Run, RunStatus,
    TokenSet,
};
use drumbeat_error::{DrumbeatResult, StoreError, StoreErrorKind};
use drumbeat_interface::{
    AccountStore, ContentStore, KeywordStore, ReviewQueueStore, RunStore, TokenStore,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory run store enforcing terminal-status monotonicity.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: RwLock<HashMap<Uuid, Run>>,
}

impl MemoryRunStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str, id: Uuid) -> StoreError {
    StoreError::new(StoreErrorKind::NotFound(format!("{what} {id}")))
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn create(&self, run: Run) -> DrumbeatResult<()> {
        self.runs.write().await.insert(run.id, run);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DrumbeatResult<Run> {
        self.runs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("run", id).into())
    }

    async fn append_result(&self, id: Uuid, result: JsonValue) -> DrumbeatResult<()> {
        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&id).ok_or_else(|| not_found("run", id))?;
        if run.status.is_terminal() {
            return Err(StoreError::new(StoreErrorKind::RunTerminal(id.to_string())).into());
        }
        run.result = Some(merge_results(run.result.take(), result));
        Ok(())
    }

    async fn complete(&self, id: Uuid, result: JsonValue) -> DrumbeatResult<()> {
        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&id).ok_or_else(|| not_found("run", id))?;
        if run.status.is_terminal() {
            return Err(StoreError::new(StoreErrorKind::RunTerminal(id.to_string())).into());
        }
        run.status = RunStatus::Completed;
        run.result = Some(merge_results(run.result.take(), result));
        run.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> DrumbeatResult<()> {
        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&id).ok_or_else(|| not_found("run", id))?;
        if run.status.is_terminal() {
            return Err(StoreError::new(StoreErrorKind::RunTerminal(id.to_string())).into());
        }
        run.status = RunStatus::Failed;
        run.error = Some(error.to_string());
        run.completed_at = Some(Utc::now());
        Ok(())
    }
}

/// Merge a partial result payload into what the run already holds.
///
/// Object payloads merge key-by-key (new keys win); anything else replaces.
fn merge_results(existing: Option<JsonValue>, incoming: JsonValue) -> JsonValue {
    match (existing, incoming) {
        (Some(JsonValue::Object(mut base)), JsonValue::Object(update)) => {
            for (k, v) in update {
                base.insert(k, v);
            }
            JsonValue::Object(base)
        }
        (_, incoming) => incoming,
    }
}

/// In-memory content-piece store.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    pieces: RwLock<HashMap<Uuid, ContentPiece>>,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn insert(&self, piece: ContentPiece) -> DrumbeatResult<()> {
        self.pieces.write().await.insert(piece.id, piece);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DrumbeatResult<ContentPiece> {
        self.pieces
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("content piece", id).into())
    }

    async fn update(&self, piece: ContentPiece) -> DrumbeatResult<()> {
        let mut pieces = self.pieces.write().await;
        if !pieces.contains_key(&piece.id) {
            return Err(not_found("content piece", piece.id).into());
        }
        pieces.insert(piece.id, piece);
        Ok(())
    }
}

/// In-memory review-queue store.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    items: RwLock<HashMap<Uuid, ReviewQueueItem>>,
}

impl MemoryQueueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewQueueStore for MemoryQueueStore {
    async fn insert(&self, item: ReviewQueueItem) -> DrumbeatResult<()> {
        self.items.write().await.insert(item.id, item);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DrumbeatResult<ReviewQueueItem> {
        self.items
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("queue item", id).into())
    }

    async fn update(&self, item: ReviewQueueItem) -> DrumbeatResult<()> {
        let mut items = self.items.write().await;
        if !items.contains_key(&item.id) {
            return Err(not_found("queue item", item.id).into());
        }
        items.insert(item.id, item);
        Ok(())
    }
}

/// In-memory keyword store keyed by `(account, lowercased text)`.
#[derive(Debug, Default)]
pub struct MemoryKeywordStore {
    keywords: RwLock<HashMap<(Uuid, String), Keyword>>,
}

impl MemoryKeywordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeywordStore for MemoryKeywordStore {
    async fn upsert(&self, keyword: Keyword) -> DrumbeatResult<()> {
        let key = (keyword.account_id, keyword.text.to_lowercase());
        let mut keywords = self.keywords.write().await;
        match keywords.get_mut(&key) {
            Some(existing) => {
                if let Some(new_pos) = keyword.position {
                    existing.previous_position = existing.position;
                    existing.position = Some(new_pos);
                    existing.best_position = match existing.best_position {
                        Some(best) => Some(best.min(new_pos)),
                        None => Some(new_pos),
                    };
                    existing.last_checked_at = keyword.last_checked_at.or(existing.last_checked_at);
                }
                if keyword.search_volume.is_some() {
                    existing.search_volume = keyword.search_volume;
                }
                if keyword.difficulty.is_some() {
                    existing.difficulty = keyword.difficulty;
                }
                existing.kind = keyword.kind;
                existing.source = keyword.source;
            }
            None => {
                keywords.insert(key, keyword);
            }
        }
        Ok(())
    }

    async fn list_for_account(&self, account_id: Uuid) -> DrumbeatResult<Vec<Keyword>> {
        Ok(self
            .keywords
            .read()
            .await
            .values()
            .filter(|k| k.account_id == account_id)
            .cloned()
            .collect())
    }
}

/// In-memory account store.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, AccountProfile>>,
}

impl MemoryAccountStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account, returning its id.
    pub async fn seed(&self, profile: AccountProfile) -> Uuid {
        let id = profile.id;
        self.accounts.write().await.insert(id, profile);
        id
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get(&self, id: Uuid) -> DrumbeatResult<AccountProfile> {
        self.accounts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("account", id).into())
    }

    async fn list(&self) -> DrumbeatResult<Vec<AccountProfile>> {
        let mut accounts: Vec<_> = self.accounts.read().await.values().cloned().collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn set_health(&self, id: Uuid, health: AccountHealth) -> DrumbeatResult<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(&id).ok_or_else(|| not_found("account", id))?;
        account.health = health;
        Ok(())
    }
}

/// In-memory token store.
///
/// Holds token sets in plain memory; the contract's at-rest encryption
/// applies to durable backends.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<Uuid, TokenSet>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self, account_id: Uuid) -> DrumbeatResult<Option<TokenSet>> {
        Ok(self.tokens.read().await.get(&account_id).cloned())
    }

    async fn save(&self, account_id: Uuid, tokens: TokenSet) -> DrumbeatResult<()> {
        self.tokens.write().await.insert(account_id, tokens);
        Ok(())
    }

    async fn clear(&self, account_id: Uuid) -> DrumbeatResult<()> {
        self.tokens.write().await.remove(&account_id);
        Ok(())
    }
}
