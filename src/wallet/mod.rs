// Rust Elements CT Engine
// Written in 2026 by
//   The Elements developers
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication
// along with this software.
// If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.
//

//! # Wallet
//!
//! A [`WalletContext`] owns everything one wallet knows: its keys, the
//! blinding keys it was given, the secrets it decoded so far and a ledger
//! snapshot derived from a [`ChainSource`]. Every operation goes through
//! the context; there is no global wallet state.
//!
//! The context builds transactions but never signs or broadcasts them.
//!

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bitcoin::bip32::{self, ChildNumber, Xpriv};
use bitcoin::{NetworkKind, ScriptBuf};
use log::debug;
use secp256k1_zkp::{
    rand::{CryptoRng, RngCore},
    All, PublicKey, Secp256k1, SecretKey, UpstreamError,
};

use crate::address::{Address, AddressParams};
use crate::blind::{
    BlindError, BlindReport, BlinderConfig, BlindingInputs, IssuanceSecrets, TxOutSecrets,
};
use crate::confidential::{Asset, Nonce, Value};
use crate::hash_types::Txid;
use crate::issuance::AssetId;
use crate::rangeproof::MAX_MONEY;
use crate::slip77::MasterBlindingKey;
use crate::transaction::{op_return_script, OutPoint, Transaction, TxIn, TxOut, TxOutWitness};

mod chain;
mod disclosure;
mod issuance;
mod ledger;

pub use self::chain::{ChainSource, ChainTransaction, Utxo};
pub use self::issuance::{IssuanceResult, IssueRequest};
pub use self::ledger::{
    AssetBalance, BalanceQuery, LedgerSnapshot, ReceivedByAddress, UnspentQuery, WalletOutput,
};

/// Requests the wallet refuses to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// Both the asset and the token amount of an issuance are zero.
    ZeroIssuance,
    /// The asset is a reissuance token; tokens cannot be reissued.
    TokenNotReissuable(AssetId),
    /// No issuance of the asset is visible to this wallet.
    UnknownAsset(AssetId),
    /// No spendable output of the asset's reissuance token.
    MissingToken(AssetId),
    /// Not enough spendable funds of an asset.
    InsufficientFunds {
        /// The asset lacking funds
        asset: AssetId,
        /// Amount the transaction needs
        needed: u64,
        /// Amount the wallet can spend
        available: u64,
    },
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PolicyError::ZeroIssuance => f.write_str("issuance amounts are both zero"),
            PolicyError::TokenNotReissuable(asset) => {
                write!(f, "asset {} is a reissuance token and cannot be reissued", asset)
            }
            PolicyError::UnknownAsset(asset) => write!(f, "no known issuance of asset {}", asset),
            PolicyError::MissingToken(asset) => {
                write!(f, "no spendable reissuance token for asset {}", asset)
            }
            PolicyError::InsufficientFunds {
                asset,
                needed,
                available,
            } => write!(f, "insufficient funds of {}: need {}, have {}", asset, needed, available),
        }
    }
}

impl std::error::Error for PolicyError {}

/// Wallet operation errors.
#[derive(Debug)]
pub enum Error {
    /// Blinding the transaction failed
    Blind(BlindError),
    /// The request breaks a wallet policy
    Policy(PolicyError),
    /// The address is not known to this wallet
    UnknownAddress(Address),
    /// No issuance blinding key for this input
    UnknownIssuance(Txid, u32),
    /// The wallet cannot open the output spent by this input
    UnknownInput(usize),
    /// An amount of zero or above 21 million coins, alone or summed per asset
    InvalidAmount,
    /// A blinding key could not be derived
    Key(UpstreamError),
    /// A wallet key could not be derived
    Bip32(bip32::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Blind(ref e) => write!(f, "{}", e),
            Error::Policy(ref e) => write!(f, "{}", e),
            Error::UnknownAddress(ref a) => write!(f, "address {} is not in the wallet", a),
            Error::UnknownIssuance(txid, vin) => {
                write!(f, "no issuance blinding key for {}:{}", txid, vin)
            }
            Error::UnknownInput(i) => write!(f, "cannot open the output spent by input {}", i),
            Error::InvalidAmount => f.write_str("amount must be positive and within the money range"),
            Error::Key(ref e) => write!(f, "{}", e),
            Error::Bip32(ref e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Blind(ref e) => Some(e),
            Error::Policy(ref e) => Some(e),
            Error::Key(ref e) => Some(e),
            Error::Bip32(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<BlindError> for Error {
    fn from(e: BlindError) -> Self {
        Error::Blind(e)
    }
}

impl From<PolicyError> for Error {
    fn from(e: PolicyError) -> Self {
        Error::Policy(e)
    }
}

impl From<UpstreamError> for Error {
    fn from(e: UpstreamError) -> Self {
        Error::Key(e)
    }
}

impl From<bip32::Error> for Error {
    fn from(e: bip32::Error) -> Self {
        Error::Bip32(e)
    }
}

/// Wallet settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletConfig {
    /// Network of the wallet's addresses
    pub params: &'static AddressParams,
    /// Asset fees are paid in
    pub policy_asset: AssetId,
    /// Fee of every transaction the wallet builds, in `policy_asset`
    pub fee: u64,
    /// Limits handed to the blinder
    pub blinder: BlinderConfig,
    /// Whether reissuance amounts are blinded
    pub blind_issuances: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        WalletConfig {
            params: &AddressParams::ELEMENTS,
            policy_asset: AssetId::ELEMENTS_REGTEST_BTC,
            fee: 1_000,
            blinder: BlinderConfig::default(),
            blind_issuances: true,
        }
    }
}

/// One payment of [`WalletContext::send_many`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Receiver; confidential addresses get a blinded output
    pub address: Address,
    /// Asset sent
    pub asset: AssetId,
    /// Amount sent
    pub amount: u64,
}

/// A script the wallet tracks.
#[derive(Debug, Clone)]
struct ScriptEntry {
    address: Address,
    watch_only: bool,
}

/// Keys and scripts of one wallet.
struct Keystore {
    account: Xpriv,
    master_blinding_key: MasterBlindingKey,
    next_index: u32,
    scripts: BTreeMap<ScriptBuf, ScriptEntry>,
    blinding_keys: BTreeMap<ScriptBuf, SecretKey>,
    issuance_keys: BTreeMap<(Txid, u32), SecretKey>,
}

impl Keystore {
    fn new(secp: &Secp256k1<All>, seed: &[u8]) -> Result<Keystore, Error> {
        let master = Xpriv::new_master(NetworkKind::Test, seed)?;
        let path = [
            ChildNumber::Hardened { index: 84 },
            ChildNumber::Hardened { index: 1776 },
            ChildNumber::Hardened { index: 0 },
        ];
        Ok(Keystore {
            account: master.derive_priv(secp, &path)?,
            master_blinding_key: MasterBlindingKey::new(seed)?,
            next_index: 0,
            scripts: BTreeMap::new(),
            blinding_keys: BTreeMap::new(),
            issuance_keys: BTreeMap::new(),
        })
    }

    fn new_address(
        &mut self,
        secp: &Secp256k1<All>,
        params: &'static AddressParams,
    ) -> Result<Address, Error> {
        let path = [ChildNumber::Normal { index: 0 }, ChildNumber::Normal { index: self.next_index }];
        let child = self.account.derive_priv(secp, &path)?;
        let pk = child.private_key.public_key(secp);
        let script = Address::p2wpkh(&pk, None, params).script_pubkey();
        let blinding_key = self.master_blinding_key.derive_blinding_key(&script)?;
        let address = Address::p2wpkh(&pk, Some(blinding_key.public_key(secp)), params);

        self.next_index += 1;
        self.blinding_keys.insert(script.clone(), blinding_key);
        self.scripts.insert(
            script,
            ScriptEntry {
                address: address.clone(),
                watch_only: false,
            },
        );
        Ok(address)
    }
}

/// Secrets decoded so far. Entries are only ever added.
#[derive(Default)]
struct DecodeCache {
    outputs: BTreeMap<OutPoint, TxOutSecrets>,
    issuances: BTreeMap<(Txid, u32), IssuanceSecrets>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A transaction being put together, with the secrets of what it spends.
struct Draft {
    tx: Transaction,
    spent: Vec<TxOutSecrets>,
}

impl Draft {
    fn new() -> Draft {
        Draft {
            tx: Transaction::new(),
            spent: vec![],
        }
    }

    fn add_input(&mut self, outpoint: OutPoint, secrets: TxOutSecrets) -> &mut TxIn {
        self.tx.input.push(TxIn::new(outpoint));
        self.spent.push(secrets);
        let last = self.tx.input.len() - 1;
        &mut self.tx.input[last]
    }
}

/// Rejects amounts of zero or above [`MAX_MONEY`].
fn check_amount(amount: u64) -> Result<(), Error> {
    if amount == 0 || amount > MAX_MONEY {
        Err(Error::InvalidAmount)
    } else {
        Ok(())
    }
}

/// Adds `amount` to the running total of `asset`, failing once the total
/// leaves the money range.
fn add_amount(totals: &mut BTreeMap<AssetId, u64>, asset: AssetId, amount: u64) -> Result<(), Error> {
    let total = totals.entry(asset).or_default();
    *total = total.checked_add(amount).filter(|t| *t <= MAX_MONEY).ok_or(Error::InvalidAmount)?;
    Ok(())
}

/// An output paying `amount` of `asset` to `address`, left for the blinder
/// when the address is confidential.
fn output_to(address: &Address, asset: AssetId, amount: u64) -> TxOut {
    let script_pubkey = address.script_pubkey();
    match address.blinding_pubkey {
        Some(pk) => TxOut::new_to_blind(amount, asset, script_pubkey, pk),
        None => TxOut {
            asset: Asset::Explicit(asset),
            value: Value::Explicit(amount),
            nonce: Nonce::Null,
            script_pubkey,
            witness: TxOutWitness::default(),
        },
    }
}

/// The wallet: keys, decoded secrets and ledger over one chain source.
pub struct WalletContext<S> {
    chain: S,
    config: WalletConfig,
    secp: Secp256k1<All>,
    keystore: RwLock<Keystore>,
    ledger: RwLock<Arc<LedgerSnapshot>>,
    // Also serialises refreshes.
    cache: Mutex<DecodeCache>,
    reserved: Mutex<BTreeSet<OutPoint>>,
}

impl<S: ChainSource> WalletContext<S> {
    /// Creates a wallet whose keys derive from `seed`.
    pub fn new(chain: S, seed: &[u8], config: WalletConfig) -> Result<Self, Error> {
        let secp = Secp256k1::new();
        let keystore = Keystore::new(&secp, seed)?;
        Ok(WalletContext {
            chain,
            config,
            secp,
            keystore: RwLock::new(keystore),
            ledger: RwLock::new(Arc::new(LedgerSnapshot::default())),
            cache: Mutex::new(DecodeCache::default()),
            reserved: Mutex::new(BTreeSet::new()),
        })
    }

    /// The wallet settings.
    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// The chain source the wallet reads.
    pub fn chain(&self) -> &S {
        &self.chain
    }

    /// The current ledger snapshot. Stays valid, and unchanged, across
    /// later refreshes.
    pub fn snapshot(&self) -> Arc<LedgerSnapshot> {
        Arc::clone(&read(&self.ledger))
    }

    /// A fresh confidential receiving address.
    pub fn get_new_address(&self) -> Result<Address, Error> {
        write(&self.keystore).new_address(&self.secp, self.config.params)
    }

    /// Releases coins reserved by transactions that will not be broadcast.
    pub fn unlock_unspent(&self, outpoints: &[OutPoint]) {
        let mut reserved = lock(&self.reserved);
        for outpoint in outpoints {
            reserved.remove(outpoint);
        }
    }

    /// Pays `amount` of `asset` to `address`.
    pub fn send_to_address<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        address: &Address,
        asset: AssetId,
        amount: u64,
    ) -> Result<Transaction, Error> {
        let recipient = Recipient {
            address: address.clone(),
            asset,
            amount,
        };
        self.send_many(rng, &[recipient])
    }

    /// Pays several recipients, in any mix of assets, in one transaction.
    pub fn send_many<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        recipients: &[Recipient],
    ) -> Result<Transaction, Error> {
        let mut draft = Draft::new();
        for recipient in recipients {
            check_amount(recipient.amount)?;
            draft.tx.output.push(output_to(&recipient.address, recipient.asset, recipient.amount));
        }
        let mut reserved = lock(&self.reserved);
        let (tx, _) = self.complete(rng, draft, BTreeMap::new(), &mut reserved)?;
        Ok(tx)
    }

    /// Blinds a transaction built elsewhere, spending outputs the wallet
    /// can open or explicit outputs. Adds a zero-value balancing output to
    /// the wallet when nothing is left to blind and the commitments do
    /// not balance.
    pub fn blind_raw_transaction<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        tx: &Transaction,
    ) -> Result<Transaction, Error> {
        let mut spent = Vec::with_capacity(tx.input.len());
        {
            let cache = lock(&self.cache);
            for (i, txin) in tx.input.iter().enumerate() {
                let secrets = match cache.outputs.get(&txin.previous_output) {
                    Some(secrets) => *secrets,
                    None => {
                        let utxo = self.chain.utxo(&txin.previous_output).ok_or(Error::UnknownInput(i))?;
                        match (utxo.txout.asset, utxo.txout.value) {
                            (Asset::Explicit(asset), Value::Explicit(value)) => {
                                TxOutSecrets::explicit(asset, value)
                            }
                            _ => return Err(Error::UnknownInput(i)),
                        }
                    }
                };
                spent.push(secrets);
            }
        }

        let inputs = BlindingInputs {
            spent_utxo_secrets: spent,
            balancing_pubkey: Some(self.balancing_pubkey()?),
            ..BlindingInputs::default()
        };
        let mut tx = tx.clone();
        tx.blind(rng, &self.secp, &inputs, &self.config.blinder)?;
        Ok(tx)
    }

    fn balancing_pubkey(&self) -> Result<PublicKey, Error> {
        let keystore = read(&self.keystore);
        Ok(keystore.master_blinding_key.blinding_public_key(&self.secp, &op_return_script())?)
    }

    /// Spendable outputs of `asset`, largest first, skipping reserved ones
    /// and those already in `exclude`.
    fn select_coins(
        &self,
        snapshot: &LedgerSnapshot,
        reserved: &BTreeSet<OutPoint>,
        exclude: &[TxIn],
        asset: AssetId,
        target: u64,
    ) -> Result<Vec<(OutPoint, TxOutSecrets)>, PolicyError> {
        let mut candidates: Vec<_> = snapshot
            .outputs()
            .iter()
            .filter(|o| !o.spent && o.is_spendable() && !reserved.contains(&o.outpoint))
            .filter(|o| !exclude.iter().any(|i| i.previous_output == o.outpoint))
            .filter_map(|o| o.secrets.filter(|s| s.asset == asset).map(|s| (o.outpoint, s)))
            .collect();
        candidates.sort_by(|a, b| b.1.value.cmp(&a.1.value).then(a.0.cmp(&b.0)));

        let mut selected = vec![];
        let mut total = 0u64;
        for (outpoint, secrets) in candidates {
            if total >= target {
                break;
            }
            total = total.saturating_add(secrets.value);
            selected.push((outpoint, secrets));
        }
        if total < target {
            return Err(PolicyError::InsufficientFunds {
                asset,
                needed: target,
                available: total,
            });
        }
        Ok(selected)
    }

    /// Funds, pays change and the fee for, and blinds a draft. Every draft
    /// output must still be explicit. Inputs of the result join `reserved`.
    fn complete<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        mut draft: Draft,
        issuance_keys: BTreeMap<usize, SecretKey>,
        reserved: &mut BTreeSet<OutPoint>,
    ) -> Result<(Transaction, BlindReport), Error> {
        let snapshot = self.snapshot();

        let mut needed: BTreeMap<AssetId, u64> = BTreeMap::new();
        for out in &draft.tx.output {
            if let (Asset::Explicit(asset), Value::Explicit(value)) = (out.asset, out.value) {
                add_amount(&mut needed, asset, value)?;
            }
        }
        if self.config.fee > 0 {
            add_amount(&mut needed, self.config.policy_asset, self.config.fee)?;
        }

        let mut have: BTreeMap<AssetId, u64> = BTreeMap::new();
        for secrets in &draft.spent {
            add_amount(&mut have, secrets.asset, secrets.value)?;
        }
        for (i, txin) in draft.tx.input.iter().enumerate() {
            if !txin.has_issuance() {
                continue;
            }
            let blinded = issuance_keys.contains_key(&i) && !txin.asset_issuance.amount.is_null();
            let (asset, token) = txin.issuance_ids_with(blinded);
            if let Value::Explicit(v) = txin.asset_issuance.amount {
                add_amount(&mut have, asset, v)?;
            }
            if let Value::Explicit(v) = txin.asset_issuance.inflation_keys {
                add_amount(&mut have, token, v)?;
            }
        }

        for (&asset, &need) in &needed {
            let got = have.get(&asset).copied().unwrap_or(0);
            if got >= need {
                continue;
            }
            let coins = self
                .select_coins(&snapshot, reserved, &draft.tx.input, asset, need - got)
                .map_err(|e| match e {
                    PolicyError::InsufficientFunds { available, .. } => {
                        PolicyError::InsufficientFunds {
                            asset,
                            needed: need,
                            available: available.saturating_add(got),
                        }
                    }
                    e => e,
                })?;
            for (outpoint, secrets) in coins {
                add_amount(&mut have, asset, secrets.value)?;
                draft.add_input(outpoint, secrets);
            }
        }

        for (&asset, &got) in &have {
            let change = got - needed.get(&asset).copied().unwrap_or(0);
            if change > 0 {
                let address = self.get_new_address()?;
                draft.tx.output.push(output_to(&address, asset, change));
            }
        }
        if self.config.fee > 0 {
            draft.tx.output.push(TxOut::new_fee(self.config.fee, self.config.policy_asset));
        }

        let inputs = BlindingInputs {
            spent_utxo_secrets: draft.spent,
            output_secrets: BTreeMap::new(),
            issuance_keys,
            balancing_pubkey: Some(self.balancing_pubkey()?),
        };
        let mut tx = draft.tx;
        let report = tx.blind(rng, &self.secp, &inputs, &self.config.blinder)?;
        reserved.extend(tx.input.iter().map(|i| i.previous_output));
        debug!(
            "built transaction {} with {} inputs and {} outputs",
            tx.txid(),
            tx.input.len(),
            tx.output.len()
        );
        Ok((tx, report))
    }
}
