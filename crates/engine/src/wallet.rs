//! Wallet session collaborator
//!
//! The wallet owns connection, signing and submission. The engine only
//! consumes it through this trait, injected into the controller.

use async_trait::async_trait;
use mirror_core::{
    AccountAddress, Confirmation, EntryFunctionPayload, PendingTransaction, Result, TxHash,
};

#[async_trait]
pub trait WalletSession: Send + Sync {
    /// Connected account, `None` when no session exists
    fn account(&self) -> Option<AccountAddress>;

    /// Ask the wallet to connect; `None` if the user declined
    async fn connect(&self) -> Result<Option<AccountAddress>>;

    /// Sign and submit a payload.
    ///
    /// Fails with `Error::UserRejected` or `Error::Signing`.
    async fn sign_and_submit(&self, payload: &EntryFunctionPayload) -> Result<PendingTransaction>;

    /// Resolve once the transaction is committed. Fails with `Error::Chain`.
    async fn wait_for_transaction(&self, hash: &TxHash) -> Result<Confirmation>;
}
