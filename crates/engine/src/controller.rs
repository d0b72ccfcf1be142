//! Follow-state controller
//!
//! Owns whether the connected account follows a leader. State moves only on
//! confirmed transactions:
//!
//! ```text
//! NotFollowing --follow ok--> Following --unfollow ok--> NotFollowing
//! Following --update_rules ok--> Following
//! ```
//!
//! Every operation reports exactly one notice, success or failure.

use crate::notifier::Notifier;
use crate::submitter::{
    build_follow_payload, build_unfollow_payload, build_update_payload, TransactionSubmitter,
};
use crate::wallet::WalletSession;
use mirror_core::{
    AccountAddress, Confirmation, ContractConfig, Error, FollowSnapshot, FollowingState,
    LeaderAddress, Notice, Result, RuleSet,
};
use mirror_persistence::Database;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct FollowState {
    state: FollowingState,
    leader: Option<LeaderAddress>,
    rules: RuleSet,
}

impl Default for FollowState {
    fn default() -> Self {
        Self {
            state: FollowingState::NotFollowing,
            leader: None,
            rules: RuleSet::default(),
        }
    }
}

/// One per session; wallet and notifier are injected
pub struct FollowController {
    wallet: Arc<dyn WalletSession>,
    notifier: Arc<dyn Notifier>,
    submitter: TransactionSubmitter,
    state: RwLock<FollowState>,
}

impl FollowController {
    pub fn new(
        wallet: Arc<dyn WalletSession>,
        notifier: Arc<dyn Notifier>,
        contract: ContractConfig,
    ) -> Self {
        let submitter = TransactionSubmitter::new(wallet.clone(), contract);
        Self {
            wallet,
            notifier,
            submitter,
            state: RwLock::new(FollowState::default()),
        }
    }

    /// Journal submissions in the local database
    pub fn with_journal(mut self, db: Database) -> Self {
        self.submitter = self.submitter.with_journal(db);
        self
    }

    pub fn contract(&self) -> &ContractConfig {
        self.submitter.contract()
    }

    pub fn account(&self) -> Option<AccountAddress> {
        self.wallet.account()
    }

    pub async fn state(&self) -> FollowingState {
        self.state.read().await.state
    }

    pub async fn leader(&self) -> Option<LeaderAddress> {
        self.state.read().await.leader.clone()
    }

    pub async fn rules(&self) -> RuleSet {
        self.state.read().await.rules.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.submitter.is_pending()
    }

    pub async fn snapshot(&self) -> FollowSnapshot {
        let guard = self.state.read().await;
        FollowSnapshot {
            state: guard.state,
            leader: guard.leader.clone(),
            rules: guard.rules.clone(),
            pending: self.submitter.is_pending(),
        }
    }

    pub async fn can_follow(&self) -> bool {
        !self.is_pending() && self.account().is_some() && !self.state().await.is_following()
    }

    pub async fn can_unfollow(&self) -> bool {
        !self.is_pending() && self.account().is_some() && self.state().await.is_following()
    }

    pub async fn can_update_rules(&self) -> bool {
        self.can_unfollow().await
    }

    /// Start mirroring `leader_input` under `rules`
    pub async fn follow(&self, leader_input: &str, rules: RuleSet) -> Result<Confirmation> {
        let result = self.follow_inner(leader_input, rules).await;
        self.report(result, "Failed to follow leader", |_, leader| {
            format!("Now following leader {}", leader.map(|l| l.short()).unwrap_or_default())
        })
        .await
    }

    async fn follow_inner(&self, leader_input: &str, rules: RuleSet) -> Result<Confirmation> {
        let leader = LeaderAddress::parse(leader_input)?;
        rules.validate()?;
        let account = self.connected_account()?;

        if !leader.looks_like_hex() {
            warn!("Leader address {} is not a hex account address", leader);
        }

        let guard = self.submitter.try_begin()?;
        if self.state.read().await.state.is_following() {
            return Err(Error::validation("already following a leader; unfollow first"));
        }

        let payload = build_follow_payload(self.contract(), &leader, &rules)?;
        let confirmation = self
            .submitter
            .submit(&guard, &account, &payload, Some(&leader))
            .await?;

        let mut state = self.state.write().await;
        state.state = FollowingState::Following;
        state.leader = Some(leader);
        state.rules = rules;
        drop(state);
        drop(guard);

        Ok(confirmation)
    }

    /// Stop mirroring the current leader
    pub async fn unfollow(&self) -> Result<Confirmation> {
        let result = self.unfollow_inner().await;
        self.report(result, "Failed to unfollow leader", |_, _| {
            "Stopped following leader".to_string()
        })
        .await
    }

    async fn unfollow_inner(&self) -> Result<Confirmation> {
        let account = self.connected_account()?;
        let guard = self.submitter.try_begin()?;

        let leader = {
            let state = self.state.read().await;
            match (&state.state, &state.leader) {
                (FollowingState::Following, Some(leader)) => leader.clone(),
                _ => return Err(Error::validation("not following a leader")),
            }
        };

        let payload = build_unfollow_payload(self.contract(), &leader);
        let confirmation = self
            .submitter
            .submit(&guard, &account, &payload, Some(&leader))
            .await?;

        let mut state = self.state.write().await;
        state.state = FollowingState::NotFollowing;
        state.leader = None;
        drop(state);
        drop(guard);

        Ok(confirmation)
    }

    /// Replace the rules of the current follow
    pub async fn update_rules(&self, rules: RuleSet) -> Result<Confirmation> {
        let result = self.update_rules_inner(rules).await;
        self.report(result, "Failed to update rules", |_, _| {
            "Rules updated successfully".to_string()
        })
        .await
    }

    async fn update_rules_inner(&self, rules: RuleSet) -> Result<Confirmation> {
        rules.validate()?;
        let account = self.connected_account()?;
        let guard = self.submitter.try_begin()?;

        let leader = {
            let state = self.state.read().await;
            if !state.state.is_following() {
                return Err(Error::validation("rules can only be updated while following"));
            }
            state.leader.clone()
        };

        let payload = build_update_payload(self.contract(), &rules)?;
        let confirmation = self
            .submitter
            .submit(&guard, &account, &payload, leader.as_ref())
            .await?;

        self.state.write().await.rules = rules;
        drop(guard);

        Ok(confirmation)
    }

    fn connected_account(&self) -> Result<AccountAddress> {
        self.wallet.account().ok_or(Error::WalletNotConnected)
    }

    /// Turn an operation outcome into exactly one notice
    async fn report<F>(
        &self,
        result: Result<Confirmation>,
        failure: &str,
        success: F,
    ) -> Result<Confirmation>
    where
        F: FnOnce(&Confirmation, Option<&LeaderAddress>) -> String,
    {
        match &result {
            Ok(confirmation) => {
                let leader = self.leader().await;
                let message = success(confirmation, leader.as_ref());
                info!("{} ({})", message, confirmation.hash);
                self.notifier.notify(Notice::success(message));
            }
            Err(e) => {
                warn!("{}: {}", failure, e);
                self.notifier.notify(Notice::failure(failure, e));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mirror_core::{EntryFunctionPayload, PendingTransaction, Severity, TxHash};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockWallet {
        account: Option<AccountAddress>,
        reject_signing: bool,
        fail_confirmation: bool,
        /// Commit, but report a Move abort
        abort_confirmation: AtomicBool,
        submissions: Mutex<Vec<EntryFunctionPayload>>,
        waits: AtomicUsize,
    }

    impl MockWallet {
        fn connected() -> Self {
            Self {
                account: Some(AccountAddress::new("0xf011ower")),
                ..Self::default()
            }
        }

        fn submission_count(&self) -> usize {
            self.submissions.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl WalletSession for MockWallet {
        fn account(&self) -> Option<AccountAddress> {
            self.account.clone()
        }

        async fn connect(&self) -> Result<Option<AccountAddress>> {
            Ok(self.account.clone())
        }

        async fn sign_and_submit(
            &self,
            payload: &EntryFunctionPayload,
        ) -> Result<PendingTransaction> {
            let n = {
                let mut subs = self.submissions.lock().unwrap();
                subs.push(payload.clone());
                subs.len()
            };
            // Give overlapping callers a chance to run while we are "in the wallet"
            tokio::task::yield_now().await;
            if self.reject_signing {
                return Err(Error::UserRejected);
            }
            Ok(PendingTransaction {
                hash: TxHash::new(format!("0xhash{}", n)),
            })
        }

        async fn wait_for_transaction(&self, hash: &TxHash) -> Result<Confirmation> {
            self.waits.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_confirmation {
                return Err(Error::Chain("timed out".into()));
            }
            if self.abort_confirmation.load(Ordering::SeqCst) {
                return Ok(Confirmation {
                    success: false,
                    vm_status: "Move abort in 0x1::mirror_trading: E_NOT_FOLLOWING".into(),
                    ..Confirmation::executed(hash.clone())
                });
            }
            Ok(Confirmation::executed(hash.clone()))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        fn severities(&self) -> Vec<Severity> {
            self.notices.lock().unwrap().iter().map(|n| n.severity).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    fn controller(wallet: MockWallet) -> (FollowController, Arc<MockWallet>, Arc<RecordingNotifier>) {
        let wallet = Arc::new(wallet);
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = FollowController::new(
            wallet.clone(),
            notifier.clone(),
            ContractConfig::new("0x1", "mirror_trading"),
        );
        (controller, wallet, notifier)
    }

    const LEADER: &str = "0x1eade2";

    #[tokio::test]
    async fn test_follow_then_unfollow_round_trip() {
        let (controller, wallet, notifier) = controller(MockWallet::connected());

        for rules in [
            RuleSet::default(),
            RuleSet {
                max_trade_size: 0.25,
                allowed_tokens: vec!["APT".into()],
                delay_seconds: 0,
                stop_loss_percent: 100.0,
                enabled: false,
            },
        ] {
            controller.follow(LEADER, rules.clone()).await.unwrap();
            assert_eq!(controller.state().await, FollowingState::Following);
            assert_eq!(controller.leader().await.unwrap().as_str(), LEADER);
            assert_eq!(controller.rules().await, rules);

            controller.unfollow().await.unwrap();
            assert_eq!(controller.state().await, FollowingState::NotFollowing);
            assert!(controller.leader().await.is_none());
        }

        assert_eq!(wallet.submission_count(), 4);
        assert_eq!(notifier.severities(), vec![Severity::Success; 4]);
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn test_empty_leader_never_reaches_wallet() {
        let (controller, wallet, notifier) = controller(MockWallet::connected());

        for input in ["", "   "] {
            let err = controller.follow(input, RuleSet::default()).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }

        assert_eq!(wallet.submission_count(), 0);
        assert_eq!(notifier.severities(), vec![Severity::Error; 2]);
        assert_eq!(controller.state().await, FollowingState::NotFollowing);
    }

    #[tokio::test]
    async fn test_follow_requires_connected_wallet() {
        let (controller, wallet, _) = controller(MockWallet::default());
        let err = controller.follow(LEADER, RuleSet::default()).await.unwrap_err();
        assert_eq!(err, Error::WalletNotConnected);
        assert!(err.is_local());
        assert_eq!(wallet.submission_count(), 0);
        assert!(!controller.can_follow().await);
    }

    #[tokio::test]
    async fn test_invalid_rules_are_rejected_locally() {
        let (controller, wallet, _) = controller(MockWallet::connected());
        let rules = RuleSet {
            allowed_tokens: Vec::new(),
            ..RuleSet::default()
        };
        let err = controller.follow(LEADER, rules).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(wallet.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_update_rules_requires_following() {
        let (controller, wallet, notifier) = controller(MockWallet::connected());

        let err = controller.update_rules(RuleSet::default()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(controller.state().await, FollowingState::NotFollowing);
        assert_eq!(wallet.submission_count(), 0);
        assert_eq!(notifier.severities(), vec![Severity::Error]);
    }

    #[tokio::test]
    async fn test_update_rules_keeps_following() {
        let (controller, wallet, _) = controller(MockWallet::connected());
        controller.follow(LEADER, RuleSet::default()).await.unwrap();

        let mut rules = RuleSet::default();
        rules.max_trade_size = 42.0;
        controller.update_rules(rules.clone()).await.unwrap();

        assert_eq!(controller.state().await, FollowingState::Following);
        assert_eq!(controller.rules().await.max_trade_size, 42.0);
        let subs = wallet.submissions.lock().unwrap();
        assert_eq!(subs[1].function, "0x1::mirror_trading::update_rules");
        assert_eq!(subs[1].function_arguments.len(), 4);
    }

    #[tokio::test]
    async fn test_unfollow_requires_following() {
        let (controller, wallet, _) = controller(MockWallet::connected());
        assert!(matches!(controller.unfollow().await, Err(Error::Validation(_))));
        assert_eq!(wallet.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_follow_twice_is_rejected() {
        let (controller, wallet, _) = controller(MockWallet::connected());
        controller.follow(LEADER, RuleSet::default()).await.unwrap();
        let err = controller.follow("0xother", RuleSet::default()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(wallet.submission_count(), 1);
        assert_eq!(controller.leader().await.unwrap().as_str(), LEADER);
    }

    #[tokio::test]
    async fn test_overlapping_follows_submit_once() {
        let (controller, wallet, notifier) = controller(MockWallet::connected());

        let (first, second) = tokio::join!(
            controller.follow(LEADER, RuleSet::default()),
            controller.follow(LEADER, RuleSet::default()),
        );

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), Error::SubmissionPending);
        assert_eq!(wallet.submission_count(), 1);
        assert_eq!(controller.state().await, FollowingState::Following);
        assert!(!controller.is_pending());

        let mut severities = notifier.severities();
        severities.sort_by_key(|s| *s as u8);
        assert_eq!(severities, vec![Severity::Success, Severity::Error]);
    }

    #[tokio::test]
    async fn test_confirmation_failure_leaves_state_unchanged() {
        let (controller, wallet, notifier) = controller(MockWallet {
            fail_confirmation: true,
            ..MockWallet::connected()
        });

        let err = controller.follow(LEADER, RuleSet::default()).await.unwrap_err();
        assert!(matches!(err, Error::Chain(_)));
        assert_eq!(controller.state().await, FollowingState::NotFollowing);
        assert!(controller.leader().await.is_none());
        assert_eq!(wallet.waits.load(Ordering::SeqCst), 1);

        let notices = notifier.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Transaction Failed");
        drop(notices);

        // Guard released: the user may retry by hand
        assert!(!controller.is_pending());
        assert!(controller.can_follow().await);
    }

    #[tokio::test]
    async fn test_user_rejection_is_signing_error() {
        let (controller, wallet, notifier) = controller(MockWallet {
            reject_signing: true,
            ..MockWallet::connected()
        });

        let err = controller.follow(LEADER, RuleSet::default()).await.unwrap_err();
        assert_eq!(err, Error::UserRejected);
        assert_eq!(wallet.waits.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.severities(), vec![Severity::Error]);
        assert_eq!(controller.state().await, FollowingState::NotFollowing);
    }

    #[tokio::test]
    async fn test_aborted_transaction_is_chain_error() {
        let wallet = MockWallet::connected();
        wallet.abort_confirmation.store(true, Ordering::SeqCst);
        let (controller, wallet, notifier) = controller(wallet);

        let err = controller.follow(LEADER, RuleSet::default()).await.unwrap_err();
        assert!(matches!(err, Error::Chain(ref msg) if msg.contains("Move abort")), "{:?}", err);
        assert_eq!(controller.state().await, FollowingState::NotFollowing);
        assert!(controller.leader().await.is_none());
        assert_eq!(wallet.submission_count(), 1);

        let notices = notifier.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Transaction Failed");
        drop(notices);
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_rules() {
        let (controller, wallet, notifier) = controller(MockWallet::connected());
        controller.follow(LEADER, RuleSet::default()).await.unwrap();

        wallet.abort_confirmation.store(true, Ordering::SeqCst);
        let mut rules = RuleSet::default();
        rules.max_trade_size = 1.0;
        rules.delay_seconds = 60;
        assert!(matches!(
            controller.update_rules(rules).await,
            Err(Error::Chain(_))
        ));

        assert_eq!(controller.rules().await, RuleSet::default());
        assert_eq!(controller.state().await, FollowingState::Following);
        assert_eq!(controller.leader().await.unwrap().as_str(), LEADER);
        assert_eq!(notifier.severities(), vec![Severity::Success, Severity::Error]);
    }

    #[tokio::test]
    async fn test_journal_failure_does_not_fail_submission() {
        let db = Database::connect_in_memory().await.unwrap();
        db.pool().close().await;

        let wallet = Arc::new(MockWallet::connected());
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = FollowController::new(
            wallet.clone(),
            notifier.clone(),
            ContractConfig::new("0x1", "mirror_trading"),
        )
        .with_journal(db);

        controller.follow(LEADER, RuleSet::default()).await.unwrap();
        assert_eq!(controller.state().await, FollowingState::Following);
        assert_eq!(wallet.submission_count(), 1);
        assert_eq!(notifier.severities(), vec![Severity::Success]);

        controller.unfollow().await.unwrap();
        assert_eq!(controller.state().await, FollowingState::NotFollowing);
    }

    #[tokio::test]
    async fn test_submissions_are_journaled() {
        let db = Database::connect_in_memory().await.unwrap();
        let wallet = Arc::new(MockWallet::connected());
        let controller = FollowController::new(
            wallet.clone(),
            Arc::new(RecordingNotifier::default()),
            ContractConfig::new("0x1", "mirror_trading"),
        )
        .with_journal(db.clone());

        controller.follow(LEADER, RuleSet::default()).await.unwrap();
        controller.unfollow().await.unwrap();

        let rows = mirror_persistence::sqlite::recent_submissions(db.pool(), Some("0xf011ower"), 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].function, "unfollow_leader");
        assert_eq!(rows[1].function, "follow_leader");
        assert!(rows.iter().all(|r| r.status == "confirmed"));
        assert_eq!(rows[1].leader.as_deref(), Some(LEADER));
    }
}
