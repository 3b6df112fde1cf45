//! Orchestration tests against a scripted wallet.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    use vedex_aggregator::{Bribe, BribeClaim, ClaimableRewards, DirectReward, Distribution};
    use vedex_core::{Address, BribeTier, EarnedEntry, RewardToken, TransportError, TxHash, B256, U256};
    use vedex_lifecycle::{JobStatus, StoreEvent, TransactionStore};

    use crate::*;

    /// Wallet whose behaviour is scripted per method signature.
    #[derive(Default)]
    struct ScriptedWallet {
        simulate_reverts: HashMap<&'static str, String>,
        declines: HashMap<&'static str, String>,
        receipt_reverts: HashMap<&'static str, Option<String>>,
        receipt_errors: HashMap<&'static str, TransportError>,
        sent: Mutex<Vec<WriteCall>>,
        simulated: Mutex<Vec<WriteCall>>,
        by_hash: Mutex<HashMap<TxHash, &'static str>>,
        nonce: AtomicU64,
    }

    fn static_signature(call: &WriteCall) -> &'static str {
        match call.method {
            WriteMethod::Approve { .. } => "approve",
            WriteMethod::GetReward { .. } => "getReward",
            WriteMethod::ClaimBribes { .. } => "claimBribes",
            WriteMethod::ClaimDistribution { .. } => "claim",
            WriteMethod::Other { .. } => "other",
        }
    }

    #[async_trait::async_trait]
    impl WalletSigner for ScriptedWallet {
        async fn simulate(&self, call: &WriteCall) -> std::result::Result<PreparedCall, Revert> {
            tokio::task::yield_now().await;
            self.simulated.lock().unwrap().push(call.clone());
            match self.simulate_reverts.get(static_signature(call)) {
                Some(reason) => Err(Revert::new(reason.clone())),
                None => Ok(PreparedCall {
                    call: call.clone(),
                    gas_limit: 100_000,
                }),
            }
        }

        async fn send(&self, prepared: PreparedCall) -> std::result::Result<TxHash, SendError> {
            let sig = static_signature(&prepared.call);
            if let Some(reason) = self.declines.get(sig) {
                return Err(SendError::UserRejected(reason.clone()));
            }
            let n = self.nonce.fetch_add(1, Ordering::SeqCst) + 1;
            let hash = B256::from(U256::from(n).to_be_bytes::<32>());
            self.by_hash.lock().unwrap().insert(hash, sig);
            self.sent.lock().unwrap().push(prepared.call);
            Ok(hash)
        }
    }

    #[async_trait::async_trait]
    impl ReceiptWatcher for ScriptedWallet {
        async fn wait_for_receipt(&self, hash: TxHash) -> std::result::Result<Receipt, TransportError> {
            tokio::task::yield_now().await;
            let sig = self.by_hash.lock().unwrap().get(&hash).copied().unwrap();
            if let Some(err) = self.receipt_errors.get(sig) {
                return Err(err.clone());
            }
            match self.receipt_reverts.get(sig) {
                Some(reason) => Ok(Receipt::reverted(hash, reason.clone())),
                None => Ok(Receipt::success(hash)),
            }
        }
    }

    fn voter() -> Address {
        Address::repeat_byte(0xee)
    }

    fn orchestrator(wallet: ScriptedWallet) -> (Orchestrator, Arc<ScriptedWallet>, Arc<TransactionStore>) {
        let wallet = Arc::new(wallet);
        let store = Arc::new(TransactionStore::new());
        let orch = Orchestrator::new(
            store.clone(),
            wallet.clone(),
            wallet.clone(),
            OrchestratorConfig {
                voter: Some(voter()),
            },
        );
        (orch, wallet, store)
    }

    fn token(byte: u8, symbol: &str) -> RewardToken {
        RewardToken::new(Address::repeat_byte(byte), symbol, 18)
    }

    fn bribe() -> Bribe {
        Bribe {
            pool: Address::repeat_byte(0x10),
            pool_symbol: "vAMM-WETH/USDC".into(),
            lock_id: U256::from(7),
            tiers: vec![BribeClaim {
                tier: BribeTier::A,
                bribe: Address::repeat_byte(0x11),
                earned: vec![EarnedEntry::new(token(0xa1, "OP"), U256::from(3))],
            }],
        }
    }

    fn direct_reward() -> DirectReward {
        DirectReward {
            pool: Address::repeat_byte(0x20),
            pool_symbol: "sAMM-USDC/DAI".into(),
            gauge: Address::repeat_byte(0x21),
            account: Address::repeat_byte(0x01),
            token: token(0xa2, "VELO"),
            earned: vec![
                EarnedEntry::new(token(0xa2, "VELO"), U256::from(5)),
                EarnedEntry::new(token(0xa3, "USDC"), U256::from(9)),
            ],
            emissions: vec![token(0xa2, "VELO"), token(0xa3, "USDC")],
        }
    }

    fn approve_then_stake(current_allowance: U256) -> WriteIntent {
        WriteIntent::ApproveThenAct {
            approval: Approval {
                token: Address::repeat_byte(0x30),
                symbol: "vAMM-WETH/USDC".into(),
                spender: Address::repeat_byte(0x21),
                amount: U256::from(1_000),
                current_allowance,
            },
            action: WriteCall::new(
                Address::repeat_byte(0x21),
                WriteMethod::Other {
                    signature: "deposit(uint256)".into(),
                    args: vec![vedex_core::CallArg::Uint(U256::from(1_000))],
                    value: U256::ZERO,
                },
                "Stake vAMM-WETH/USDC",
            ),
        }
    }

    #[tokio::test]
    async fn test_claim_all_enqueues_one_job_per_call() {
        let (orch, wallet, store) = orchestrator(ScriptedWallet::default());
        let mut events = store.subscribe();

        let claimable = ClaimableRewards::new(vec![bribe()], vec![direct_reward()], vec![]);
        let report = orch.submit(WriteIntent::ClaimAll(claimable)).await.unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert!(report.all_settled());
        assert_eq!(store.groups().len(), 1);
        assert_eq!(store.groups()[0].jobs.len(), 2);

        // Exactly one enqueue, then every job walks the happy path.
        let StoreEvent::Enqueued(group) = events.recv().await.unwrap() else {
            panic!("expected the group to be enqueued first");
        };
        assert_eq!(group.id, report.group);
        let mut seen: HashMap<String, Vec<JobStatus>> = HashMap::new();
        while let Ok(event) = events.try_recv() {
            match event {
                StoreEvent::Transitioned { id, to, .. } => seen.entry(id.to_string()).or_default().push(to),
                other => panic!("unexpected event {other:?}"),
            }
        }
        for id in &group.jobs {
            assert_eq!(
                seen[id.as_str()],
                vec![JobStatus::Pending, JobStatus::Submitted, JobStatus::Confirmed]
            );
        }

        let sent = wallet.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        let bribe_call = sent.iter().find(|c| c.target == voter()).unwrap();
        assert_eq!(
            bribe_call.method,
            WriteMethod::ClaimBribes {
                bribes: vec![Address::repeat_byte(0x11)],
                tokens: vec![vec![Address::repeat_byte(0xa1)]],
                lock_id: U256::from(7),
            }
        );
        let reward_call = sent.iter().find(|c| c.target == Address::repeat_byte(0x21)).unwrap();
        assert_eq!(
            reward_call.method,
            WriteMethod::GetReward {
                account: Address::repeat_byte(0x01),
                tokens: vec![Address::repeat_byte(0xa2), Address::repeat_byte(0xa3)],
            }
        );
    }

    #[tokio::test]
    async fn test_claim_all_reverted_receipt_rejects_one_job() {
        let wallet = ScriptedWallet {
            receipt_reverts: HashMap::from([("getReward", Some("GaugeKilled".to_string()))]),
            ..Default::default()
        };
        let (orch, _, store) = orchestrator(wallet);

        let claimable = ClaimableRewards::new(vec![bribe()], vec![direct_reward()], vec![]);
        let report = orch.submit(WriteIntent::ClaimAll(claimable)).await.unwrap();

        let statuses: Vec<JobStatus> = store.jobs().iter().map(|j| j.status).collect();
        assert_eq!(statuses, vec![JobStatus::Confirmed, JobStatus::Rejected]);
        let rejected = &store.jobs()[1];
        assert_eq!(rejected.error.as_deref(), Some("GaugeKilled"));
        assert!(rejected.hash.is_some());
        assert!(!report.all_settled());
    }

    #[tokio::test]
    async fn test_claim_all_includes_distribution() {
        let (orch, wallet, store) = orchestrator(ScriptedWallet::default());
        let distribution = Distribution {
            lock_id: U256::from(7),
            distributor: Address::repeat_byte(0x40),
            earned: EarnedEntry::new(token(0xa4, "VELO"), U256::from(1)),
        };

        orch.submit(WriteIntent::ClaimAll(ClaimableRewards::new(vec![], vec![], vec![distribution])))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let sent = wallet.sent.lock().unwrap().clone();
        assert_eq!(sent[0].target, Address::repeat_byte(0x40));
        assert_eq!(sent[0].method, WriteMethod::ClaimDistribution { lock_id: U256::from(7) });
    }

    #[tokio::test]
    async fn test_failed_approval_leaves_action_waiting() {
        let wallet = ScriptedWallet {
            simulate_reverts: HashMap::from([("approve", "ERC20: approve from paused".to_string())]),
            ..Default::default()
        };
        let (orch, wallet, store) = orchestrator(wallet);

        let report = orch.submit(approve_then_stake(U256::ZERO)).await.unwrap();

        let jobs = store.jobs();
        assert_eq!(jobs[0].status, JobStatus::Rejected);
        assert_eq!(jobs[0].error.as_deref(), Some("ERC20: approve from paused"));
        assert_eq!(jobs[1].status, JobStatus::Waiting);
        assert_eq!(report.outcomes[1].1, JobOutcome::Skipped);

        // The act was never simulated and nothing was sent.
        assert_eq!(wallet.simulated.lock().unwrap().len(), 1);
        assert!(wallet.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sufficient_allowance_skips_signing() {
        let (orch, wallet, store) = orchestrator(ScriptedWallet::default());

        let report = orch.submit(approve_then_stake(U256::from(5_000))).await.unwrap();

        let jobs = store.jobs();
        assert_eq!(jobs[0].status, JobStatus::Done);
        assert!(jobs[0].hash.is_none());
        assert_eq!(jobs[1].status, JobStatus::Confirmed);
        assert_eq!(report.outcomes[0].1, JobOutcome::Done);

        let sent = wallet.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].description, "Stake vAMM-WETH/USDC");
    }

    #[tokio::test]
    async fn test_approval_runs_before_action() {
        let (orch, wallet, _) = orchestrator(ScriptedWallet::default());

        orch.submit(approve_then_stake(U256::ZERO)).await.unwrap();

        let sent = wallet.sent.lock().unwrap().clone();
        assert!(matches!(sent[0].method, WriteMethod::Approve { .. }));
        assert!(matches!(sent[1].method, WriteMethod::Other { .. }));
    }

    #[tokio::test]
    async fn test_user_rejection_message() {
        let wallet = ScriptedWallet {
            declines: HashMap::from([("other", "denied transaction signature".to_string())]),
            ..Default::default()
        };
        let (orch, _, store) = orchestrator(wallet);

        let call = WriteCall::new(
            Address::repeat_byte(0x50),
            WriteMethod::Other {
                signature: "vote(uint256,address[],uint256[])".into(),
                args: vec![],
                value: U256::ZERO,
            },
            "Vote",
        );
        let report = orch.submit(WriteIntent::Single(call)).await.unwrap();

        let job = &store.jobs()[0];
        assert_eq!(job.status, JobStatus::Rejected);
        assert_eq!(job.error.as_deref(), Some("user rejected: denied transaction signature"));
        assert!(job.hash.is_none());
        assert_eq!(
            report.outcomes[0].1,
            JobOutcome::Rejected("user rejected: denied transaction signature".into())
        );
    }

    #[tokio::test]
    async fn test_empty_reasons_get_fallback() {
        let wallet = ScriptedWallet {
            receipt_reverts: HashMap::from([("claim", None)]),
            ..Default::default()
        };
        let (orch, _, store) = orchestrator(wallet);
        let distribution = Distribution {
            lock_id: U256::from(7),
            distributor: Address::repeat_byte(0x40),
            earned: EarnedEntry::new(token(0xa4, "VELO"), U256::from(1)),
        };

        orch.submit(WriteIntent::ClaimDistribution(distribution)).await.unwrap();

        assert_eq!(store.jobs()[0].error.as_deref(), Some("transaction reverted"));
    }

    #[tokio::test]
    async fn test_receipt_transport_error_rejects() {
        let wallet = ScriptedWallet {
            receipt_errors: HashMap::from([("getReward", TransportError::Timeout)]),
            ..Default::default()
        };
        let (orch, _, store) = orchestrator(wallet);

        orch.submit(WriteIntent::ClaimReward(direct_reward())).await.unwrap();

        let job = &store.jobs()[0];
        assert_eq!(job.status, JobStatus::Rejected);
        assert_eq!(job.error.as_deref(), Some("request timed out"));
    }

    #[tokio::test]
    async fn test_nothing_to_claim_enqueues_nothing() {
        let (orch, _, store) = orchestrator(ScriptedWallet::default());

        let err = orch.submit(WriteIntent::ClaimAll(ClaimableRewards::default())).await.unwrap_err();
        assert_eq!(err, OrchestratorError::NothingToSubmit);
        let err = orch.submit(WriteIntent::ClaimBribes(vec![])).await.unwrap_err();
        assert_eq!(err, OrchestratorError::NothingToSubmit);
        assert!(store.is_empty());
        assert!(store.groups().is_empty());
    }

    #[tokio::test]
    async fn test_bribes_need_voter() {
        let store = Arc::new(TransactionStore::new());
        let wallet = Arc::new(DryRunWallet::new());
        let orch = Orchestrator::new(store.clone(), wallet.clone(), wallet, OrchestratorConfig::default());

        let err = orch.submit(WriteIntent::ClaimBribes(vec![bribe()])).await.unwrap_err();
        assert_eq!(err, OrchestratorError::MissingConfig("voter"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_job_ids_unique_across_submissions() {
        let store = Arc::new(TransactionStore::new());
        let wallet = Arc::new(DryRunWallet::new());
        let orch = Orchestrator::new(store.clone(), wallet.clone(), wallet.clone(), OrchestratorConfig::default());

        orch.submit(WriteIntent::ClaimReward(direct_reward())).await.unwrap();
        orch.submit(WriteIntent::ClaimReward(direct_reward())).await.unwrap();

        let jobs = store.jobs();
        assert_eq!(jobs.len(), 2);
        assert_ne!(jobs[0].id, jobs[1].id);
        assert_eq!(store.groups().len(), 2);
        assert_eq!(wallet.sent_count(), 2);
    }

    #[test]
    fn test_plan_groups_bribes_by_lock() {
        let mut other = bribe();
        other.pool = Address::repeat_byte(0x13);
        other.tiers[0].tier = BribeTier::B;
        other.tiers[0].bribe = Address::repeat_byte(0x12);

        let plan = Plan::build(WriteIntent::ClaimBribes(vec![bribe(), other]), Some(voter())).unwrap();
        assert_eq!(plan.stages.len(), 1);
        assert_eq!(plan.len(), 1);
        let PlanStep::Sign(call) = &plan.stages[0][0] else {
            panic!("expected a signed step");
        };
        let WriteMethod::ClaimBribes { bribes, .. } = &call.method else {
            panic!("expected claimBribes");
        };
        assert_eq!(bribes, &vec![Address::repeat_byte(0x11), Address::repeat_byte(0x12)]);
    }

    #[test]
    fn test_both_tiers_of_one_pool_flatten_into_one_call() {
        let mut both = bribe();
        both.tiers.push(BribeClaim {
            tier: BribeTier::B,
            bribe: Address::repeat_byte(0x12),
            earned: vec![
                EarnedEntry::new(token(0xa1, "OP"), U256::from(4)),
                EarnedEntry::new(token(0xa4, "WETH"), U256::from(1)),
            ],
        });

        let call = WriteCall::claim_bribes(voter(), U256::from(7), &[&both]);
        assert_eq!(
            call.method,
            WriteMethod::ClaimBribes {
                bribes: vec![Address::repeat_byte(0x11), Address::repeat_byte(0x12)],
                tokens: vec![
                    vec![Address::repeat_byte(0xa1)],
                    vec![Address::repeat_byte(0xa1), Address::repeat_byte(0xa4)],
                ],
                lock_id: U256::from(7),
            }
        );
    }
}
