//! Transaction submitter
//!
//! Builds contract-call payloads and drives them through the wallet:
//! sign and submit, then wait for the chain to confirm.

use crate::wallet::WalletSession;
use mirror_core::{
    AccountAddress, AmountScale, CallArg, Confirmation, ContractConfig, ContractFunction,
    EntryFunctionPayload, Error, ErrorKind, LeaderAddress, Result, RuleSet, OCTAS_PER_UNIT,
};
use mirror_persistence::{sqlite, Database};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// `follow_leader(leader, max_trade_size, allowed_tokens, delay, stop_loss, enabled)`
///
/// Wire types per slot: leader string, trade size per `AmountScale`, string
/// list, delay as a u64 string, stop loss as a JSON number, bool.
pub fn build_follow_payload(
    contract: &ContractConfig,
    leader: &LeaderAddress,
    rules: &RuleSet,
) -> Result<EntryFunctionPayload> {
    rules.validate()?;
    let args = vec![
        CallArg::Text(leader.as_str().to_string()),
        encode_trade_size(rules.max_trade_size, contract.amount_scale)?,
        CallArg::TextList(rules.allowed_tokens.clone()),
        CallArg::U64(rules.delay_seconds),
        CallArg::Number(rules.stop_loss_percent),
        CallArg::Bool(rules.enabled),
    ];
    Ok(EntryFunctionPayload::new(
        contract,
        ContractFunction::FollowLeader,
        args,
    ))
}

/// `unfollow_leader(leader)`
pub fn build_unfollow_payload(
    contract: &ContractConfig,
    leader: &LeaderAddress,
) -> EntryFunctionPayload {
    EntryFunctionPayload::new(
        contract,
        ContractFunction::UnfollowLeader,
        vec![CallArg::Text(leader.as_str().to_string())],
    )
}

/// `update_rules(max_trade_size, allowed_tokens, delay, stop_loss)`
pub fn build_update_payload(
    contract: &ContractConfig,
    rules: &RuleSet,
) -> Result<EntryFunctionPayload> {
    rules.validate()?;
    let args = vec![
        encode_trade_size(rules.max_trade_size, contract.amount_scale)?,
        CallArg::TextList(rules.allowed_tokens.clone()),
        CallArg::U64(rules.delay_seconds),
        CallArg::Number(rules.stop_loss_percent),
    ];
    Ok(EntryFunctionPayload::new(
        contract,
        ContractFunction::UpdateRules,
        args,
    ))
}

/// Encode the max trade size in the unit the contract expects.
///
/// `Whole` is always a JSON number; `Octas` is always a u64 string.
pub fn encode_trade_size(size: f64, scale: AmountScale) -> Result<CallArg> {
    match scale {
        AmountScale::Whole => Ok(CallArg::Number(size)),
        AmountScale::Octas => {
            let octas = checked_octas((size * OCTAS_PER_UNIT).round()).ok_or_else(|| {
                Error::validation(format!("max trade size {} is out of range in octas", size))
            })?;
            Ok(CallArg::U64(octas))
        }
    }
}

/// `u64::MAX as f64` rounds up to 2^64, which itself does not fit
fn checked_octas(scaled: f64) -> Option<u64> {
    if !scaled.is_finite() || scaled < 1.0 || scaled >= u64::MAX as f64 {
        return None;
    }
    Some(scaled as u64)
}

/// Held while a submission is in flight; releasing it clears the pending flag
pub struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Submits payloads through the wallet, one at a time
pub struct TransactionSubmitter {
    wallet: Arc<dyn WalletSession>,
    contract: ContractConfig,
    pending: AtomicBool,
    journal: Option<Database>,
}

impl TransactionSubmitter {
    pub fn new(wallet: Arc<dyn WalletSession>, contract: ContractConfig) -> Self {
        Self {
            wallet,
            contract,
            pending: AtomicBool::new(false),
            journal: None,
        }
    }

    /// Record every submission in the local journal
    pub fn with_journal(mut self, db: Database) -> Self {
        self.journal = Some(db);
        self
    }

    pub fn contract(&self) -> &ContractConfig {
        &self.contract
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Claim the single submission slot, or fail if one is already in flight
    pub fn try_begin(&self) -> Result<SubmissionGuard<'_>> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::SubmissionPending)?;
        Ok(SubmissionGuard {
            flag: &self.pending,
        })
    }

    /// Sign, submit and wait for confirmation.
    ///
    /// Wallet failures surface as signing errors; anything after the wallet
    /// returned a hash surfaces as a chain error.
    pub async fn submit(
        &self,
        _guard: &SubmissionGuard<'_>,
        account: &AccountAddress,
        payload: &EntryFunctionPayload,
        leader: Option<&LeaderAddress>,
    ) -> Result<Confirmation> {
        let function = payload
            .contract_function()
            .map(|f| f.name())
            .unwrap_or("unknown");
        let journal_id = self.journal_begin(account, function, leader, payload).await;

        info!("Submitting {} for {}", function, account.short());

        let pending = match self.wallet.sign_and_submit(payload).await {
            Ok(pending) => pending,
            Err(e) => {
                let err = as_signing_error(e);
                warn!("{} was not submitted: {}", function, err);
                self.journal_fail(journal_id, &err).await;
                return Err(err);
            }
        };

        debug!("{} submitted as {}", function, pending.hash);
        self.journal_submitted(journal_id, pending.hash.as_str()).await;

        let outcome = match self.wallet.wait_for_transaction(&pending.hash).await {
            Ok(c) if c.success => Ok(c),
            Ok(c) => Err(Error::Chain(format!(
                "transaction {} failed: {}",
                c.hash, c.vm_status
            ))),
            Err(e) => Err(as_chain_error(e)),
        };

        match outcome {
            Ok(confirmation) => {
                info!(
                    "{} confirmed: {} (version {:?})",
                    function, confirmation.hash, confirmation.version
                );
                self.journal_confirm(journal_id).await;
                Ok(confirmation)
            }
            Err(err) => {
                warn!("{} did not confirm: {}", function, err);
                self.journal_fail(journal_id, &err).await;
                Err(err)
            }
        }
    }

    async fn journal_begin(
        &self,
        account: &AccountAddress,
        function: &str,
        leader: Option<&LeaderAddress>,
        payload: &EntryFunctionPayload,
    ) -> Option<i64> {
        let db = self.journal.as_ref()?;
        let payload_json = serde_json::to_string(payload).unwrap_or_default();
        match sqlite::begin_submission(
            db.pool(),
            account.as_str(),
            function,
            leader.map(|l| l.as_str()),
            &payload_json,
        )
        .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to journal submission: {}", e);
                None
            }
        }
    }

    async fn journal_submitted(&self, id: Option<i64>, hash: &str) {
        if let (Some(db), Some(id)) = (&self.journal, id) {
            if let Err(e) = sqlite::mark_submitted(db.pool(), id, hash).await {
                warn!("Failed to journal submission {}: {}", id, e);
            }
        }
    }

    async fn journal_confirm(&self, id: Option<i64>) {
        if let (Some(db), Some(id)) = (&self.journal, id) {
            if let Err(e) = sqlite::mark_confirmed(db.pool(), id).await {
                warn!("Failed to journal submission {}: {}", id, e);
            }
        }
    }

    async fn journal_fail(&self, id: Option<i64>, err: &Error) {
        if let (Some(db), Some(id)) = (&self.journal, id) {
            if let Err(e) = sqlite::mark_failed(db.pool(), id, &err.to_string()).await {
                warn!("Failed to journal submission {}: {}", id, e);
            }
        }
    }
}

fn as_signing_error(err: Error) -> Error {
    match err.kind() {
        ErrorKind::Signing => err,
        _ => Error::Signing(err.to_string()),
    }
}

fn as_chain_error(err: Error) -> Error {
    match err {
        Error::Chain(_) => err,
        other => Error::Chain(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract() -> ContractConfig {
        ContractConfig::new("0x1", "mirror_trading")
    }

    fn leader() -> LeaderAddress {
        LeaderAddress::parse("0xlead").unwrap()
    }

    #[test]
    fn test_follow_argument_order() {
        let payload = build_follow_payload(&contract(), &leader(), &RuleSet::default()).unwrap();
        assert_eq!(payload.function, "0x1::mirror_trading::follow_leader");
        let args = serde_json::to_value(&payload.function_arguments).unwrap();
        assert_eq!(
            args,
            json!(["0xlead", 100.0, ["APT", "USDC", "USDT"], "5", 10.0, true])
        );
    }

    #[test]
    fn test_unfollow_has_only_leader() {
        let payload = build_unfollow_payload(&contract(), &leader());
        assert_eq!(payload.function_arguments, vec![CallArg::Text("0xlead".into())]);
    }

    #[test]
    fn test_update_argument_order() {
        let rules = RuleSet {
            max_trade_size: 12.5,
            stop_loss_percent: 7.5,
            delay_seconds: 0,
            ..RuleSet::default()
        };
        let payload = build_update_payload(&contract(), &rules).unwrap();
        assert_eq!(payload.function, "0x1::mirror_trading::update_rules");
        let args = serde_json::to_value(&payload.function_arguments).unwrap();
        assert_eq!(args, json!([12.5, ["APT", "USDC", "USDT"], "0", 7.5]));
    }

    #[test]
    fn test_octas_scaling() {
        let contract = contract().with_amount_scale(AmountScale::Octas);
        let payload = build_follow_payload(&contract, &leader(), &RuleSet::default()).unwrap();
        assert_eq!(payload.function_arguments[1], CallArg::U64(10_000_000_000));

        assert_eq!(
            encode_trade_size(0.5, AmountScale::Octas).unwrap(),
            CallArg::U64(50_000_000)
        );
        assert!(encode_trade_size(1e30, AmountScale::Octas).is_err());
        assert!(encode_trade_size(1e-9, AmountScale::Octas).is_err());

        assert_eq!(checked_octas(18_446_744_073_709_551_616.0), None);
        assert_eq!(
            checked_octas(18_446_744_073_709_547_520.0),
            Some(18_446_744_073_709_547_520)
        );
    }

    #[test]
    fn test_slot_types_do_not_depend_on_value() {
        for (size, stop) in [(100.0, 10.0), (12.5, 7.5)] {
            let rules = RuleSet {
                max_trade_size: size,
                stop_loss_percent: stop,
                ..RuleSet::default()
            };
            let payload = build_follow_payload(&contract(), &leader(), &rules).unwrap();
            assert_eq!(payload.function_arguments[1], CallArg::Number(size));
            assert_eq!(payload.function_arguments[3], CallArg::U64(5));
            assert_eq!(payload.function_arguments[4], CallArg::Number(stop));
        }
    }

    #[test]
    fn test_unnormalized_tokens_never_build() {
        let rules = RuleSet {
            allowed_tokens: vec!["apt".into(), "APT".into(), "apt".into()],
            ..RuleSet::default()
        };
        assert!(matches!(
            build_follow_payload(&contract(), &leader(), &rules),
            Err(Error::Validation(_))
        ));
        assert!(build_update_payload(&contract(), &rules).is_err());
    }

    #[test]
    fn test_invalid_rules_never_build() {
        let rules = RuleSet {
            stop_loss_percent: 0.0,
            ..RuleSet::default()
        };
        assert!(matches!(
            build_follow_payload(&contract(), &leader(), &rules),
            Err(Error::Validation(_))
        ));
        assert!(build_update_payload(&contract(), &rules).is_err());
    }

    #[test]
    fn test_error_reclassification() {
        assert_eq!(as_signing_error(Error::UserRejected), Error::UserRejected);
        assert!(matches!(
            as_signing_error(Error::Network("wallet bridge down".into())),
            Error::Signing(_)
        ));
        assert!(matches!(
            as_chain_error(Error::Network("node down".into())),
            Error::Chain(_)
        ));
    }
}
