//! Inbound bridge: a capability-advertising device exposed as an adapter.
//!
//! [`InboundBridge`] wraps an `Arc<dyn Device>` and presents the fixed
//! [`Adapter`] surface over it. It subscribes to the device's change
//! notifications at construction and recomputes its capability bindings
//! synchronously inside the notification handler, so by the time a
//! `Connect`/`Disconnect` event reaches a listener the bindings are already
//! current.
//!
//! Connection states: `disconnected → connecting → connected →
//! disconnecting → disconnected`. The two transient states are re-entrancy
//! guards, not externally meaningful; a `connect` while connecting or
//! connected is a no-op.
//!
//! Every public operation emits its failure as an [`AdapterEvent::Error`]
//! and returns it, so callers get both an observable stream and an error
//! return. Disconnect is the sole exception: it always completes locally
//! and reports device-side trouble via [`AdapterEvent::DisconnectError`]
//! only.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use trestle_core::{
    Account, Adapter, AdapterEvent, Address, BridgeError, BridgeResult, Capability, CapabilitySet,
    ChainId, Device, DeviceChange, EventEmitter, LifetimeAnchor, ReadyState, RpcClient,
    SendTransactionOptions, SignAndSendRequest, SignInInput, SignInOutput, SignMessageRequest,
    SignTransactionRequest, Signature, SubmitOptions, Subscription, Transaction,
    TransactionMessage, TransactionVersion, WireTransaction,
};

#[derive(Default)]
struct BridgeState {
    account: Option<Account>,
    address: Option<Address>,
    connecting: bool,
    disconnecting: bool,
    capabilities: CapabilitySet,
}

/// Adapter surface over a capability-advertising device.
pub struct InboundBridge {
    device: Arc<dyn Device>,
    state: Mutex<BridgeState>,
    events: EventEmitter<AdapterEvent>,
    subscription: Mutex<Option<Subscription>>,
}

impl InboundBridge {
    /// Wraps a device, subscribing to its change notifications immediately.
    pub fn new(device: Arc<dyn Device>) -> Arc<Self> {
        let bridge = Arc::new(Self {
            device: Arc::clone(&device),
            state: Mutex::new(BridgeState::default()),
            events: EventEmitter::new(),
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&bridge);
        let subscription = device.subscribe(Arc::new(move |change| {
            if let Some(bridge) = weak.upgrade() {
                bridge.handle_change(change);
            }
        }));
        *bridge.subscription.lock() = Some(subscription);

        bridge.recompute_capabilities();
        bridge
    }

    /// Clears all state and detaches the change subscription.
    pub fn destroy(&self) {
        {
            let mut state = self.state.lock();
            *state = BridgeState::default();
        }
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.unsubscribe();
        }
        debug!(device = %self.device.name(), "Bridge destroyed");
    }

    /// The wrapped device.
    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    /// The active account, when connected.
    pub fn account(&self) -> Option<Account> {
        self.state.lock().account.clone()
    }

    /// Address of the active account, when connected.
    pub fn address(&self) -> Option<Address> {
        self.state.lock().address.clone()
    }

    /// Whether an account is bound.
    pub fn connected(&self) -> bool {
        self.state.lock().account.is_some()
    }

    /// Whether a connect attempt is in flight.
    pub fn connecting(&self) -> bool {
        self.state.lock().connecting
    }

    /// The current capability bindings.
    pub fn capabilities(&self) -> CapabilitySet {
        self.state.lock().capabilities.clone()
    }

    /// The adapter event stream.
    pub fn events(&self) -> &EventEmitter<AdapterEvent> {
        &self.events
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Connects and binds the device's first account.
    pub async fn connect(&self) -> BridgeResult<()> {
        let result = self.establish(false).await;
        self.report(result)
    }

    /// Prompt-free connect attempt.
    pub async fn auto_connect(&self) -> BridgeResult<()> {
        let result = self.establish(true).await;
        self.report(result)
    }

    /// Disconnects. Always completes locally; a device-side failure is
    /// reported through the event stream only.
    pub async fn disconnect(&self) {
        if self.device.capabilities().contains(Capability::Disconnect) {
            self.state.lock().disconnecting = true;
            if let Err(error) = self.device.disconnect().await {
                self.events.emit(&AdapterEvent::DisconnectError {
                    error: BridgeError::Disconnection {
                        reason: error.to_string(),
                    },
                });
            }
            self.state.lock().disconnecting = false;
        }
        self.unbind_account();
    }

    async fn establish(&self, silent: bool) -> BridgeResult<()> {
        {
            let mut state = self.state.lock();
            if state.account.is_some() || state.connecting {
                return Ok(());
            }
            if !self.device.ready_state().is_usable() {
                return Err(BridgeError::NotReady);
            }
            state.connecting = true;
        }

        let result = self.establish_inner(silent).await;
        self.state.lock().connecting = false;
        result
    }

    async fn establish_inner(&self, silent: bool) -> BridgeResult<()> {
        if self.device.accounts().is_empty() {
            self.device
                .connect(silent)
                .await
                .map_err(|e| BridgeError::Connection {
                    reason: e.to_string(),
                })?;
        }
        let account = self
            .device
            .accounts()
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::account("device exposed no accounts"))?;
        self.bind_account(account)
    }

    // =========================================================================
    // Signing
    // =========================================================================

    /// Signs one transaction, returning the compiled form with its
    /// signature slots filled by the device.
    pub async fn sign_transaction(&self, message: TransactionMessage) -> BridgeResult<Transaction> {
        let result = self
            .sign_transactions_inner(vec![message])
            .await
            .and_then(|mut signed| {
                signed.pop().ok_or_else(|| BridgeError::SignTransaction {
                    reason: "device returned no signed transaction".into(),
                })
            });
        self.report(result)
    }

    /// Signs a batch of transactions in one device call, preserving input
    /// order.
    pub async fn sign_all_transactions(
        &self,
        messages: Vec<TransactionMessage>,
    ) -> BridgeResult<Vec<Transaction>> {
        let result = self.sign_transactions_inner(messages).await;
        self.report(result)
    }

    /// Signs arbitrary bytes with the active account.
    pub async fn sign_message(&self, message: &[u8]) -> BridgeResult<Vec<u8>> {
        let result = self.sign_message_inner(message).await;
        self.report(result)
    }

    /// Performs a sign-in, binding the returned account exactly as a
    /// connect would.
    pub async fn sign_in(&self, input: SignInInput) -> BridgeResult<SignInOutput> {
        let result = self.sign_in_inner(input).await;
        self.report(result)
    }

    async fn sign_transactions_inner(
        &self,
        messages: Vec<TransactionMessage>,
    ) -> BridgeResult<Vec<Transaction>> {
        let account = self.active_account()?;
        self.require_capability(&account, Capability::SignTransaction)?;

        let expected = messages.len();
        let mut requests = Vec::with_capacity(expected);
        for message in &messages {
            let transaction = message.compile().map_err(|e| BridgeError::SignTransaction {
                reason: e.to_string(),
            })?;
            requests.push(SignTransactionRequest {
                account: account.clone(),
                chain: None,
                transaction: WireTransaction::encode(&transaction).to_device_bytes(),
                options: SubmitOptions::default(),
            });
        }

        let outputs = self
            .device
            .sign_transaction(requests)
            .await
            .map_err(|e| e.or_wrap(|reason| BridgeError::SignTransaction { reason }))?;
        if outputs.len() != expected {
            return Err(BridgeError::SignTransaction {
                reason: format!(
                    "expected {expected} signed transactions, got {}",
                    outputs.len()
                ),
            });
        }

        let mut signed = Vec::with_capacity(outputs.len());
        for output in outputs {
            let transaction = WireTransaction::from_device_bytes(&output.transaction)
                .decode()
                .map_err(|e| BridgeError::SignTransaction {
                    reason: e.to_string(),
                })?;
            signed.push(transaction);
        }
        Ok(signed)
    }

    async fn sign_message_inner(&self, message: &[u8]) -> BridgeResult<Vec<u8>> {
        let account = self.active_account()?;
        self.require_capability(&account, Capability::SignMessage)?;

        let outputs = self
            .device
            .sign_message(vec![SignMessageRequest {
                account,
                message: message.to_vec(),
            }])
            .await
            .map_err(|e| e.or_wrap(|reason| BridgeError::SignMessage { reason }))?;
        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::SignMessage {
                reason: "device returned no signature".into(),
            })?;
        Ok(output.signature)
    }

    async fn sign_in_inner(&self, input: SignInInput) -> BridgeResult<SignInOutput> {
        if !self.device.capabilities().contains(Capability::SignIn) {
            return Err(BridgeError::Config {
                capability: Capability::SignIn,
            });
        }

        let outputs = self
            .device
            .sign_in(vec![input])
            .await
            .map_err(|e| e.or_wrap(|reason| BridgeError::SignIn { reason }))?;
        let output = outputs.into_iter().next().ok_or_else(|| BridgeError::SignIn {
            reason: "device returned no sign-in output".into(),
        })?;
        self.bind_account(output.account.clone())?;
        Ok(output)
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Compiles, co-signs, and submits a transaction.
    ///
    /// Prefers the device's combined sign-and-send path when both the device
    /// and the active account support it, else signs locally via the device
    /// and submits through `rpc`.
    pub async fn send_transaction(
        &self,
        message: TransactionMessage,
        rpc: &dyn RpcClient,
        options: SendTransactionOptions,
    ) -> BridgeResult<Signature> {
        let result = self.send_inner(message, rpc, options).await;
        self.report(result)
    }

    async fn send_inner(
        &self,
        mut message: TransactionMessage,
        rpc: &dyn RpcClient,
        options: SendTransactionOptions,
    ) -> BridgeResult<Signature> {
        let account = self.active_account()?;
        let combined = self.choose_send_path(&account)?;
        let wrap = |reason: String| BridgeError::SendTransaction { reason };

        if message.lifetime.is_none() {
            let info = rpc
                .get_latest_blockhash(options.preflight_commitment, options.min_context_slot)
                .await
                .map_err(|e| e.or_wrap(wrap))?;
            message.lifetime = Some(LifetimeAnchor {
                blockhash: info.blockhash,
                last_valid_block_height: Some(info.last_valid_block_height),
            });
        }

        let mut transaction = message.compile().map_err(|e| wrap(e.to_string()))?;
        if !options.signers.is_empty() {
            // Versioned layouts must leave fully signed; legacy tolerates
            // the device filling the remaining slots.
            let signing = match message.version {
                TransactionVersion::Legacy => transaction.partially_sign(&options.signers),
                TransactionVersion::V0 => transaction.sign(&options.signers),
            };
            signing.map_err(|e| wrap(e.to_string()))?;
        }

        let wire = WireTransaction::encode(&transaction);
        let chain = self
            .device
            .chains()
            .into_iter()
            .next()
            .unwrap_or_else(ChainId::mainnet);

        if combined {
            let outputs = self
                .device
                .sign_and_send_transaction(vec![SignAndSendRequest {
                    account,
                    chain,
                    transaction: wire.to_device_bytes(),
                    options: options.submit_options(),
                }])
                .await
                .map_err(|e| e.or_wrap(wrap))?;
            let output = outputs
                .into_iter()
                .next()
                .ok_or_else(|| wrap("device returned no signature".into()))?;
            Signature::try_from_slice(&output.signature).map_err(|e| wrap(e.to_string()))
        } else {
            let outputs = self
                .device
                .sign_transaction(vec![SignTransactionRequest {
                    account,
                    chain: Some(chain),
                    transaction: wire.to_device_bytes(),
                    options: options.submit_options(),
                }])
                .await
                .map_err(|e| e.or_wrap(wrap))?;
            let output = outputs
                .into_iter()
                .next()
                .ok_or_else(|| wrap("device returned no signed transaction".into()))?;
            let signed = WireTransaction::from_device_bytes(&output.transaction);
            rpc.send_transaction(signed, &options.submit_options())
                .await
                .map_err(|e| e.or_wrap(wrap))
        }
    }

    fn choose_send_path(&self, account: &Account) -> BridgeResult<bool> {
        let capabilities = self.device.capabilities();
        if capabilities.contains(Capability::SignAndSendTransaction) {
            if account.supports(Capability::SignAndSendTransaction) {
                Ok(true)
            } else if capabilities.contains(Capability::SignTransaction)
                && account.supports(Capability::SignTransaction)
            {
                Ok(false)
            } else {
                Err(BridgeError::account(
                    "account supports neither sign-and-send nor sign-transaction",
                ))
            }
        } else if capabilities.contains(Capability::SignTransaction) {
            if account.supports(Capability::SignTransaction) {
                Ok(false)
            } else {
                Err(BridgeError::account(
                    "account does not support 'sign-transaction'",
                ))
            }
        } else {
            Err(BridgeError::Config {
                capability: Capability::SignAndSendTransaction,
            })
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    fn bind_account(&self, account: Account) -> BridgeResult<()> {
        let address = Address::parse(account.address()).map_err(|e| BridgeError::PublicKey {
            reason: e.to_string(),
        })?;

        {
            let mut state = self.state.lock();
            state.account = Some(account);
            state.address = Some(address.clone());
            state.capabilities =
                CapabilitySet::derive(&self.device.capabilities(), state.account.as_ref());
        }
        debug!(device = %self.device.name(), address = %address, "Account bound");
        self.events.emit(&AdapterEvent::Connect { address });
        Ok(())
    }

    fn unbind_account(&self) {
        {
            let mut state = self.state.lock();
            state.account = None;
            state.address = None;
            state.capabilities = CapabilitySet::derive(&self.device.capabilities(), None);
        }
        debug!(device = %self.device.name(), "Account cleared");
        self.events.emit(&AdapterEvent::Disconnect);
    }

    fn recompute_capabilities(&self) {
        let mut state = self.state.lock();
        state.capabilities =
            CapabilitySet::derive(&self.device.capabilities(), state.account.as_ref());
    }

    /// Runs synchronously inside the device's notification handler, so the
    /// capability bindings are current before any event listener observes
    /// the change.
    fn handle_change(&self, change: &DeviceChange) {
        if let Some(accounts) = &change.accounts {
            let (held, disconnecting) = {
                let state = self.state.lock();
                (state.account.clone(), state.disconnecting)
            };
            if let Some(current) = held {
                if !disconnecting {
                    match accounts.first() {
                        Some(next) if *next != current => {
                            if let Err(error) = self.bind_account(next.clone()) {
                                self.events.emit(&AdapterEvent::Error { error });
                            }
                        }
                        Some(_) => {}
                        None => {
                            warn!(device = %self.device.name(), "Device dropped its accounts");
                            self.events.emit(&AdapterEvent::Error {
                                error: BridgeError::Disconnected,
                            });
                            self.unbind_account();
                        }
                    }
                }
            }
        }

        if change.capabilities.is_some() {
            self.recompute_capabilities();
        }
    }

    fn active_account(&self) -> BridgeResult<Account> {
        self.state
            .lock()
            .account
            .clone()
            .ok_or(BridgeError::NotConnected)
    }

    fn require_capability(&self, account: &Account, capability: Capability) -> BridgeResult<()> {
        if !self.device.capabilities().contains(capability) {
            return Err(BridgeError::Config { capability });
        }
        if !account.supports(capability) {
            return Err(BridgeError::account(format!(
                "account does not support '{capability}'"
            )));
        }
        Ok(())
    }

    fn report<T>(&self, result: BridgeResult<T>) -> BridgeResult<T> {
        if let Err(error) = &result {
            self.events.emit(&AdapterEvent::Error {
                error: error.clone(),
            });
        }
        result
    }
}

#[async_trait]
impl Adapter for InboundBridge {
    fn name(&self) -> String {
        self.device.name()
    }

    fn icon(&self) -> String {
        self.device.icon()
    }

    fn address(&self) -> Option<Address> {
        InboundBridge::address(self)
    }

    fn ready_state(&self) -> ReadyState {
        self.device.ready_state()
    }

    fn supported_transaction_versions(&self) -> Vec<TransactionVersion> {
        self.state.lock().capabilities.transaction_versions.clone()
    }

    fn capabilities(&self) -> CapabilitySet {
        InboundBridge::capabilities(self)
    }

    fn events(&self) -> &EventEmitter<AdapterEvent> {
        &self.events
    }

    async fn connect(&self) -> BridgeResult<()> {
        InboundBridge::connect(self).await
    }

    async fn auto_connect(&self) -> BridgeResult<()> {
        InboundBridge::auto_connect(self).await
    }

    async fn disconnect(&self) -> BridgeResult<()> {
        InboundBridge::disconnect(self).await;
        Ok(())
    }

    async fn send_transaction(
        &self,
        message: TransactionMessage,
        rpc: &dyn RpcClient,
        options: SendTransactionOptions,
    ) -> BridgeResult<Signature> {
        InboundBridge::send_transaction(self, message, rpc, options).await
    }

    async fn sign_transaction(&self, message: TransactionMessage) -> BridgeResult<Transaction> {
        InboundBridge::sign_transaction(self, message).await
    }

    async fn sign_all_transactions(
        &self,
        messages: Vec<TransactionMessage>,
    ) -> BridgeResult<Vec<Transaction>> {
        InboundBridge::sign_all_transactions(self, messages).await
    }

    async fn sign_message(&self, message: &[u8]) -> BridgeResult<Vec<u8>> {
        InboundBridge::sign_message(self, message).await
    }

    async fn sign_in(&self, input: SignInInput) -> BridgeResult<SignInOutput> {
        InboundBridge::sign_in(self, input).await
    }
}
