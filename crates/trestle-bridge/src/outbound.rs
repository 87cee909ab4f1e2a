//! Outbound bridge: a fixed adapter exposed as a capability-advertising
//! device.
//!
//! [`OutboundBridge`] wraps an `Arc<dyn Adapter>` plus the chain it serves
//! and an RPC client, and presents the [`Device`] surface so that generic
//! discovery tooling can find the adapter without knowing it is one. Its
//! capability list is derived by probing the adapter's capability set:
//! an operation the adapter leaves unbound is simply absent from the list.
//!
//! Batched operations the adapter only supports singly run strictly
//! serially in input order; the first failure aborts the remaining inputs
//! and propagates.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use trestle_core::{
    Account, Adapter, AdapterEvent, Address, BridgeError, BridgeResult, Capability,
    CapabilityList, ChainId, Commitment, Device, DeviceChange, EventEmitter, ListenerId,
    ReadyState, RpcClient, SendTransactionOptions, SignAndSendOutput, SignAndSendRequest,
    SignInInput, SignInOutput, SignMessageOutput, SignMessageRequest, SignTransactionRequest,
    SignedTransaction, SubmitOptions, Subscription, TransactionMessage, TransactionVersion,
    WireTransaction,
};

/// Device surface over a fixed adapter.
pub struct OutboundBridge {
    adapter: Arc<dyn Adapter>,
    chain: ChainId,
    rpc: Arc<dyn RpcClient>,
    versions: Vec<TransactionVersion>,
    account: Mutex<Option<Account>>,
    changes: EventEmitter<DeviceChange>,
    adapter_listeners: Mutex<Vec<ListenerId>>,
}

impl OutboundBridge {
    /// Wraps an adapter, mirroring its current account and following its
    /// connect/disconnect events from now on.
    pub fn new(
        adapter: Arc<dyn Adapter>,
        chain: ChainId,
        rpc: Arc<dyn RpcClient>,
    ) -> Arc<Self> {
        let mut versions = adapter.supported_transaction_versions();
        if versions.is_empty() {
            versions.push(TransactionVersion::Legacy);
        }

        let bridge = Arc::new(Self {
            adapter: Arc::clone(&adapter),
            chain,
            rpc,
            versions,
            account: Mutex::new(None),
            changes: EventEmitter::new(),
            adapter_listeners: Mutex::new(Vec::new()),
        });

        let weak = Arc::downgrade(&bridge);
        let id = adapter.events().on(move |event| {
            if let Some(bridge) = weak.upgrade() {
                match event {
                    AdapterEvent::Connect { .. } => bridge.mirror_account(),
                    AdapterEvent::Disconnect => bridge.clear_account(),
                    _ => {}
                }
            }
        });
        bridge.adapter_listeners.lock().push(id);

        bridge.mirror_account();
        bridge
    }

    /// Detaches from the adapter's event stream.
    pub fn destroy(&self) {
        for id in self.adapter_listeners.lock().drain(..) {
            self.adapter.events().off(id);
        }
        debug!(adapter = %self.adapter.name(), "Bridge destroyed");
    }

    /// The wrapped adapter.
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    fn mirror_account(&self) {
        let Some(address) = self.adapter.address() else {
            return;
        };

        let rebind = {
            let account = self.account.lock();
            match account.as_ref() {
                // A same-chain account always rebinds, so a repeat connect
                // re-emits the account list.
                Some(current) => {
                    current.address() != address.as_str()
                        || current.chains().contains(&self.chain)
                        || current.public_key() != address.to_bytes().as_slice()
                }
                None => true,
            }
        };

        if rebind {
            *self.account.lock() = Some(self.build_account(&address));
            debug!(adapter = %self.adapter.name(), address = %address, "Account mirrored");
            self.changes.emit(&DeviceChange {
                accounts: Some(self.accounts()),
                capabilities: None,
            });
        }
    }

    fn clear_account(&self) {
        let had_account = self.account.lock().take().is_some();
        if had_account {
            debug!(adapter = %self.adapter.name(), "Account cleared");
            self.changes.emit(&DeviceChange {
                accounts: Some(Vec::new()),
                capabilities: None,
            });
        }
    }

    /// The mirrored account advertises exactly what the adapter binds.
    fn build_account(&self, address: &Address) -> Account {
        let capabilities = self.adapter.capabilities();
        let mut tags = vec![Capability::SignAndSendTransaction];
        if capabilities.sign_transaction.is_some() {
            tags.push(Capability::SignTransaction);
        }
        if capabilities.sign_message.is_some() {
            tags.push(Capability::SignMessage);
        }
        if capabilities.sign_in.is_some() {
            tags.push(Capability::SignIn);
        }
        Account::new(
            address.as_str(),
            address.to_bytes().to_vec(),
            tags,
            vec![self.chain.clone()],
        )
    }

    fn check_request_account(&self, account: &Account) -> BridgeResult<()> {
        if self.account.lock().as_ref() == Some(account) {
            Ok(())
        } else {
            Err(BridgeError::external(
                "request account is not the connected account",
            ))
        }
    }

    fn check_chain(&self, chain: &ChainId) -> BridgeResult<()> {
        if *chain == self.chain {
            Ok(())
        } else {
            Err(BridgeError::external(format!("invalid chain '{chain}'")))
        }
    }

    fn decode_message(&self, wire_bytes: &[u8]) -> BridgeResult<TransactionMessage> {
        let transaction = WireTransaction::from_device_bytes(wire_bytes)
            .decode()
            .map_err(BridgeError::from)?;
        let message = transaction.decompile().map_err(BridgeError::from)?;
        if !self.versions.contains(&message.version) {
            return Err(BridgeError::external(format!(
                "unsupported transaction version '{}'",
                message.version
            )));
        }
        Ok(message)
    }

    fn send_options(options: &SubmitOptions) -> SendTransactionOptions {
        SendTransactionOptions {
            preflight_commitment: options.preflight_commitment,
            skip_preflight: options.skip_preflight,
            max_retries: options.max_retries,
            min_context_slot: options.min_context_slot,
            signers: Vec::new(),
        }
    }
}

#[async_trait]
impl Device for OutboundBridge {
    fn name(&self) -> String {
        self.adapter.name()
    }

    fn icon(&self) -> String {
        self.adapter.icon()
    }

    fn chains(&self) -> Vec<ChainId> {
        vec![self.chain.clone()]
    }

    fn ready_state(&self) -> ReadyState {
        self.adapter.ready_state()
    }

    fn capabilities(&self) -> CapabilityList {
        let mut list = CapabilityList::new()
            .with(Capability::Connect)
            .with(Capability::Disconnect)
            .with(Capability::Events)
            .with_versions(Capability::SignAndSendTransaction, self.versions.clone());

        let bound = self.adapter.capabilities();
        if bound.sign_transaction.is_some() {
            list = list.with_versions(Capability::SignTransaction, self.versions.clone());
        }
        if bound.sign_message.is_some() {
            list = list.with(Capability::SignMessage);
        }
        if bound.sign_in.is_some() {
            list = list.with(Capability::SignIn);
        }
        list
    }

    fn accounts(&self) -> Vec<Account> {
        self.account.lock().iter().cloned().collect()
    }

    async fn connect(&self, silent: bool) -> BridgeResult<Vec<Account>> {
        if !silent && !self.adapter.connected() {
            self.adapter.connect().await?;
        }
        self.mirror_account();
        Ok(self.accounts())
    }

    async fn disconnect(&self) -> BridgeResult<()> {
        self.adapter.disconnect().await
    }

    async fn sign_transaction(
        &self,
        requests: Vec<SignTransactionRequest>,
    ) -> BridgeResult<Vec<SignedTransaction>> {
        if self.adapter.capabilities().sign_transaction.is_none() {
            return Err(BridgeError::Config {
                capability: Capability::SignTransaction,
            });
        }

        let mut messages = Vec::with_capacity(requests.len());
        for request in &requests {
            self.check_request_account(&request.account)?;
            if let Some(chain) = &request.chain {
                self.check_chain(chain)?;
            }
            messages.push(self.decode_message(&request.transaction)?);
        }

        let signed = if messages.len() == 1 {
            match messages.into_iter().next() {
                Some(message) => vec![self.adapter.sign_transaction(message).await?],
                None => Vec::new(),
            }
        } else {
            self.adapter.sign_all_transactions(messages).await?
        };

        Ok(signed
            .iter()
            .map(|transaction| SignedTransaction {
                transaction: WireTransaction::encode(transaction).to_device_bytes(),
            })
            .collect())
    }

    async fn sign_and_send_transaction(
        &self,
        requests: Vec<SignAndSendRequest>,
    ) -> BridgeResult<Vec<SignAndSendOutput>> {
        let mut outputs = Vec::with_capacity(requests.len());
        // Strictly serial so a failure on request N leaves requests beyond N
        // untouched.
        for request in requests {
            self.check_request_account(&request.account)?;
            self.check_chain(&request.chain)?;
            let message = self.decode_message(&request.transaction)?;

            let anchor = match request.options.commitment {
                Some(commitment) => Some(
                    self.rpc
                        .get_latest_blockhash(
                            request.options.preflight_commitment.or(Some(commitment)),
                            request.options.min_context_slot,
                        )
                        .await?,
                ),
                None => None,
            };

            let signature = self
                .adapter
                .send_transaction(
                    message,
                    self.rpc.as_ref(),
                    Self::send_options(&request.options),
                )
                .await?;

            if anchor.is_some() {
                let commitment = request.options.commitment.or(Some(Commitment::Confirmed));
                self.rpc.get_transaction(&signature, commitment).await?;
            }

            outputs.push(SignAndSendOutput {
                signature: signature.to_bytes().to_vec(),
            });
        }
        Ok(outputs)
    }

    async fn sign_message(
        &self,
        requests: Vec<SignMessageRequest>,
    ) -> BridgeResult<Vec<SignMessageOutput>> {
        if self.adapter.capabilities().sign_message.is_none() {
            return Err(BridgeError::Config {
                capability: Capability::SignMessage,
            });
        }

        let mut outputs = Vec::with_capacity(requests.len());
        for request in requests {
            self.check_request_account(&request.account)?;
            let signature = self.adapter.sign_message(&request.message).await?;
            outputs.push(SignMessageOutput {
                signed_message: request.message,
                signature,
            });
        }
        Ok(outputs)
    }

    async fn sign_in(&self, inputs: Vec<SignInInput>) -> BridgeResult<Vec<SignInOutput>> {
        if self.adapter.capabilities().sign_in.is_none() {
            return Err(BridgeError::Config {
                capability: Capability::SignIn,
            });
        }

        let mut outputs = Vec::with_capacity(inputs.len());
        for input in inputs {
            outputs.push(self.adapter.sign_in(input).await?);
        }
        Ok(outputs)
    }

    fn subscribe(&self, listener: trestle_core::ChangeListener) -> Subscription {
        self.changes.subscribe(move |change| listener(change))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trestle_core::{
        AccountMeta, BlockhashInfo, CapabilitySet, Instruction, Keypair, LifetimeAnchor,
        Signature, SignInCapability, SignMessageCapability, SignTransactionCapability,
        Transaction,
    };

    // -- mock adapter --------------------------------------------------------

    struct MockAdapter {
        keypair: Keypair,
        address: Mutex<Option<Address>>,
        events: EventEmitter<AdapterEvent>,
        has_sign_transaction: bool,
        has_sign_message: bool,
        has_sign_in: bool,
        sign_message_calls: AtomicUsize,
        fail_message_call: Option<usize>,
    }

    impl MockAdapter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                keypair: Keypair::from_seed(&[0x11u8; 32]),
                address: Mutex::new(None),
                events: EventEmitter::new(),
                has_sign_transaction: true,
                has_sign_message: true,
                has_sign_in: false,
                sign_message_calls: AtomicUsize::new(0),
                fail_message_call: None,
            })
        }

        fn without_sign_message() -> Arc<Self> {
            let mut adapter = Self::new();
            Arc::get_mut(&mut adapter).unwrap().has_sign_message = false;
            adapter
        }

        fn failing_message_call(call: usize) -> Arc<Self> {
            let mut adapter = Self::new();
            Arc::get_mut(&mut adapter).unwrap().fail_message_call = Some(call);
            adapter
        }
    }

    #[async_trait]
    impl Adapter for MockAdapter {
        fn name(&self) -> String {
            "mock-adapter".into()
        }

        fn address(&self) -> Option<Address> {
            self.address.lock().clone()
        }

        fn ready_state(&self) -> ReadyState {
            ReadyState::Installed
        }

        fn supported_transaction_versions(&self) -> Vec<TransactionVersion> {
            vec![TransactionVersion::Legacy, TransactionVersion::V0]
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet {
                transaction_versions: self.supported_transaction_versions(),
                sign_transaction: self.has_sign_transaction.then(|| {
                    SignTransactionCapability {
                        versions: self.supported_transaction_versions(),
                    }
                }),
                sign_message: self.has_sign_message.then_some(SignMessageCapability),
                sign_in: self.has_sign_in.then_some(SignInCapability),
            }
        }

        fn events(&self) -> &EventEmitter<AdapterEvent> {
            &self.events
        }

        async fn connect(&self) -> BridgeResult<()> {
            let address = self.keypair.address();
            *self.address.lock() = Some(address.clone());
            self.events.emit(&AdapterEvent::Connect { address });
            Ok(())
        }

        async fn disconnect(&self) -> BridgeResult<()> {
            *self.address.lock() = None;
            self.events.emit(&AdapterEvent::Disconnect);
            Ok(())
        }

        async fn send_transaction(
            &self,
            message: TransactionMessage,
            _rpc: &dyn RpcClient,
            _options: SendTransactionOptions,
        ) -> BridgeResult<Signature> {
            let mut transaction = message.compile().map_err(BridgeError::from)?;
            transaction
                .partially_sign(std::slice::from_ref(&self.keypair))
                .map_err(BridgeError::from)?;
            transaction
                .signature()
                .ok_or_else(|| BridgeError::external("nothing signed"))
        }

        async fn sign_transaction(
            &self,
            message: TransactionMessage,
        ) -> BridgeResult<Transaction> {
            let mut transaction = message.compile().map_err(BridgeError::from)?;
            transaction
                .partially_sign(std::slice::from_ref(&self.keypair))
                .map_err(BridgeError::from)?;
            Ok(transaction)
        }

        async fn sign_message(&self, message: &[u8]) -> BridgeResult<Vec<u8>> {
            let call = self.sign_message_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_message_call == Some(call) {
                return Err(BridgeError::external("signing rejected"));
            }
            Ok(self.keypair.sign(message).to_vec())
        }
    }

    // -- mock rpc ------------------------------------------------------------

    struct MockRpc {
        blockhash_calls: AtomicUsize,
        confirmation_calls: AtomicUsize,
    }

    impl MockRpc {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                blockhash_calls: AtomicUsize::new(0),
                confirmation_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RpcClient for MockRpc {
        async fn get_latest_blockhash(
            &self,
            _commitment: Option<Commitment>,
            _min_context_slot: Option<u64>,
        ) -> BridgeResult<BlockhashInfo> {
            self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
            Ok(BlockhashInfo {
                blockhash: [8u8; 32],
                last_valid_block_height: 99,
            })
        }

        async fn send_transaction(
            &self,
            _transaction: WireTransaction,
            _options: &SubmitOptions,
        ) -> BridgeResult<Signature> {
            Ok(Signature::from_bytes(&[1u8; 64]))
        }

        async fn get_transaction(
            &self,
            _signature: &Signature,
            _commitment: Option<Commitment>,
        ) -> BridgeResult<Option<serde_json::Value>> {
            self.confirmation_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(serde_json::json!({ "confirmed": true })))
        }
    }

    // -- helpers -------------------------------------------------------------

    fn bridge_for(adapter: Arc<MockAdapter>) -> Arc<OutboundBridge> {
        OutboundBridge::new(adapter, ChainId::devnet(), MockRpc::new())
    }

    fn wire_bytes_for(payer: &Address, version: TransactionVersion) -> Vec<u8> {
        let message = TransactionMessage {
            version,
            fee_payer: payer.clone(),
            instructions: vec![Instruction {
                program_id: Address::from_bytes(&[0u8; 32]),
                accounts: vec![AccountMeta {
                    address: payer.clone(),
                    is_signer: true,
                    is_writable: true,
                }],
                data: vec![1, 2, 3],
            }],
            lifetime: Some(LifetimeAnchor {
                blockhash: [4u8; 32],
                last_valid_block_height: None,
            }),
        };
        WireTransaction::encode(&message.compile().unwrap()).to_device_bytes()
    }

    async fn connected_bridge(adapter: Arc<MockAdapter>) -> (Arc<OutboundBridge>, Account) {
        let bridge = bridge_for(adapter);
        let accounts = bridge.connect(false).await.unwrap();
        let account = accounts.into_iter().next().unwrap();
        (bridge, account)
    }

    // -- capability advertisement --------------------------------------------

    #[test]
    fn capability_list_omits_unbound_operations() {
        let bridge = bridge_for(MockAdapter::without_sign_message());
        let list = bridge.capabilities();

        assert!(list.contains(Capability::Connect));
        assert!(list.contains(Capability::Disconnect));
        assert!(list.contains(Capability::Events));
        assert!(list.contains(Capability::SignAndSendTransaction));
        assert!(list.contains(Capability::SignTransaction));
        assert!(!list.contains(Capability::SignMessage));
        assert!(!list.contains(Capability::SignIn));
    }

    #[test]
    fn capability_list_carries_adapter_versions() {
        let bridge = bridge_for(MockAdapter::new());
        let list = bridge.capabilities();
        assert_eq!(
            list.versions(Capability::SignAndSendTransaction),
            &[TransactionVersion::Legacy, TransactionVersion::V0]
        );
    }

    // -- account mirroring ---------------------------------------------------

    #[tokio::test]
    async fn connect_mirrors_adapter_account() {
        let adapter = MockAdapter::new();
        let (bridge, account) = connected_bridge(adapter.clone()).await;

        assert_eq!(account.address(), adapter.keypair.address().as_str());
        assert_eq!(account.public_key(), adapter.keypair.public_key());
        assert!(account.supports(Capability::SignAndSendTransaction));
        assert!(account.supports(Capability::SignTransaction));
        assert!(account.supports(Capability::SignMessage));
        assert!(!account.supports(Capability::SignIn));
        assert_eq!(bridge.accounts().len(), 1);
    }

    #[tokio::test]
    async fn disconnect_event_clears_mirror() {
        let adapter = MockAdapter::new();
        let (bridge, _) = connected_bridge(adapter.clone()).await;

        let changes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&changes);
        let _subscription = bridge.subscribe(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        adapter.disconnect().await.unwrap();
        assert!(bridge.accounts().is_empty());
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeat_connect_rebinds_account() {
        // The rebind predicate treats a same-chain account as changed, so a
        // repeat connect with an identical address still emits a fresh
        // account list.
        let adapter = MockAdapter::new();
        let (bridge, first) = connected_bridge(adapter.clone()).await;

        let changes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&changes);
        let _subscription = bridge.subscribe(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        adapter.connect().await.unwrap();

        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.accounts(), vec![first]);
    }

    // -- signing -------------------------------------------------------------

    #[tokio::test]
    async fn sign_transaction_delegates_and_reencodes() {
        let adapter = MockAdapter::new();
        let (bridge, account) = connected_bridge(adapter.clone()).await;

        let outputs = bridge
            .sign_transaction(vec![SignTransactionRequest {
                account,
                chain: Some(ChainId::devnet()),
                transaction: wire_bytes_for(&adapter.keypair.address(), TransactionVersion::Legacy),
                options: SubmitOptions::default(),
            }])
            .await
            .unwrap();

        assert_eq!(outputs.len(), 1);
        let signed = WireTransaction::from_device_bytes(&outputs[0].transaction)
            .decode()
            .unwrap();
        assert!(signed.is_fully_signed());
    }

    #[tokio::test]
    async fn sign_transaction_rejects_foreign_account() {
        let adapter = MockAdapter::new();
        let (bridge, _) = connected_bridge(adapter.clone()).await;

        let stranger = Account::new(
            "11111111111111111111111111111111",
            vec![0u8; 32],
            vec![Capability::SignTransaction],
            vec![ChainId::devnet()],
        );
        let err = bridge
            .sign_transaction(vec![SignTransactionRequest {
                account: stranger,
                chain: None,
                transaction: wire_bytes_for(&adapter.keypair.address(), TransactionVersion::Legacy),
                options: SubmitOptions::default(),
            }])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not the connected account"));
    }

    #[tokio::test]
    async fn sign_transaction_rejects_wrong_chain() {
        let adapter = MockAdapter::new();
        let (bridge, account) = connected_bridge(adapter.clone()).await;

        let err = bridge
            .sign_transaction(vec![SignTransactionRequest {
                account,
                chain: Some(ChainId::mainnet()),
                transaction: wire_bytes_for(&adapter.keypair.address(), TransactionVersion::Legacy),
                options: SubmitOptions::default(),
            }])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid chain"));
    }

    #[tokio::test]
    async fn sign_message_batch_aborts_on_failure() {
        // Three inputs; the second underlying call fails. Exactly one
        // signing succeeds, the third input is never attempted.
        let adapter = MockAdapter::failing_message_call(2);
        let (bridge, account) = connected_bridge(adapter.clone()).await;

        let requests = (0..3)
            .map(|i| SignMessageRequest {
                account: account.clone(),
                message: vec![i as u8],
            })
            .collect();
        let err = bridge.sign_message(requests).await.unwrap_err();

        assert!(err.to_string().contains("signing rejected"));
        assert_eq!(adapter.sign_message_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sign_message_unsupported_reports_config_error() {
        let adapter = MockAdapter::without_sign_message();
        let (bridge, account) = connected_bridge(adapter.clone()).await;

        let err = bridge
            .sign_message(vec![SignMessageRequest {
                account,
                message: b"hello".to_vec(),
            }])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::Config {
                capability: Capability::SignMessage
            }
        );
    }

    // -- sign and send -------------------------------------------------------

    #[tokio::test]
    async fn sign_and_send_confirms_when_commitment_given() {
        let adapter = MockAdapter::new();
        let rpc = MockRpc::new();
        let bridge = OutboundBridge::new(adapter.clone(), ChainId::devnet(), rpc.clone());
        let account = bridge
            .connect(false)
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap();

        let outputs = bridge
            .sign_and_send_transaction(vec![SignAndSendRequest {
                account,
                chain: ChainId::devnet(),
                transaction: wire_bytes_for(&adapter.keypair.address(), TransactionVersion::Legacy),
                options: SubmitOptions {
                    commitment: Some(Commitment::Confirmed),
                    ..SubmitOptions::default()
                },
            }])
            .await
            .unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].signature.len(), 64);
        assert_eq!(rpc.blockhash_calls.load(Ordering::SeqCst), 1);
        assert_eq!(rpc.confirmation_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sign_and_send_skips_confirmation_without_commitment() {
        let adapter = MockAdapter::new();
        let rpc = MockRpc::new();
        let bridge = OutboundBridge::new(adapter.clone(), ChainId::devnet(), rpc.clone());
        let account = bridge
            .connect(false)
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap();

        bridge
            .sign_and_send_transaction(vec![SignAndSendRequest {
                account,
                chain: ChainId::devnet(),
                transaction: wire_bytes_for(&adapter.keypair.address(), TransactionVersion::Legacy),
                options: SubmitOptions::default(),
            }])
            .await
            .unwrap();

        assert_eq!(rpc.blockhash_calls.load(Ordering::SeqCst), 0);
        assert_eq!(rpc.confirmation_calls.load(Ordering::SeqCst), 0);
    }
}
