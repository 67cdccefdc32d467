//! Store traits for the persistence layer.
//!
//! The production persistence layer is an external collaborator; only the
//! consumed interface is specified here. `drumbeat_store` provides
//! in-memory implementations for tests and embedders without a database.

use async_trait::async_trait;
use drumbeat_core::{
    AccountHealth, AccountProfile, ContentPiece, Keyword, ReviewQueueItem, Run, TokenSet,
};
use drumbeat_error::DrumbeatResult;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Run-tracking store.
///
/// Implementations must enforce status monotonicity: once a run is
/// `Completed` or `Failed` it is terminal, and `complete`/`fail` against it
/// is a `StoreError`.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Insert a fresh `Running` record.
    async fn create(&self, run: Run) -> DrumbeatResult<()>;

    /// Fetch a run by id.
    async fn get(&self, id: Uuid) -> DrumbeatResult<Run>;

    /// Append a partial result payload to a running record.
    async fn append_result(&self, id: Uuid, result: JsonValue) -> DrumbeatResult<()>;

    /// Mark a run completed, exactly once, with its result summary.
    async fn complete(&self, id: Uuid, result: JsonValue) -> DrumbeatResult<()>;

    /// Mark a run failed, exactly once, recording the error verbatim.
    async fn fail(&self, id: Uuid, error: &str) -> DrumbeatResult<()>;
}

/// Content-piece store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert a new content piece.
    async fn insert(&self, piece: ContentPiece) -> DrumbeatResult<()>;

    /// Fetch a piece by id.
    async fn get(&self, id: Uuid) -> DrumbeatResult<ContentPiece>;

    /// Replace a stored piece (status changes, publication fields).
    async fn update(&self, piece: ContentPiece) -> DrumbeatResult<()>;
}

/// Review-queue store.
#[async_trait]
pub trait ReviewQueueStore: Send + Sync {
    /// Insert a new queue item.
    async fn insert(&self, item: ReviewQueueItem) -> DrumbeatResult<()>;

    /// Fetch an item by id.
    async fn get(&self, id: Uuid) -> DrumbeatResult<ReviewQueueItem>;

    /// Replace a stored item (status transitions, rollback data).
    async fn update(&self, item: ReviewQueueItem) -> DrumbeatResult<()>;
}

/// Keyword store keyed by the unique `(account, lowercased text)` pair.
#[async_trait]
pub trait KeywordStore: Send + Sync {
    /// Insert or update a keyword; concurrent runs for the same account
    /// converge on the unique key rather than duplicate.
    async fn upsert(&self, keyword: Keyword) -> DrumbeatResult<()>;

    /// All keywords tracked for an account.
    async fn list_for_account(&self, account_id: Uuid) -> DrumbeatResult<Vec<Keyword>>;
}

/// Account store.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch an account profile by id.
    async fn get(&self, id: Uuid) -> DrumbeatResult<AccountProfile>;

    /// All managed accounts, regardless of health.
    async fn list(&self) -> DrumbeatResult<Vec<AccountProfile>>;

    /// Flip an account's connectivity flag.
    async fn set_health(&self, id: Uuid, health: AccountHealth) -> DrumbeatResult<()>;
}

/// OAuth token store.
///
/// Token sets are encrypted at rest; encryption is the implementation's
/// concern and callers only ever see decrypted `TokenSet` values. Mutated
/// only by the token manager.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored token set for an account, if any.
    async fn load(&self, account_id: Uuid) -> DrumbeatResult<Option<TokenSet>>;

    /// Persist a token set for an account.
    async fn save(&self, account_id: Uuid, tokens: TokenSet) -> DrumbeatResult<()>;

    /// Remove any stored tokens for an account.
    async fn clear(&self, account_id: Uuid) -> DrumbeatResult<()>;
}
