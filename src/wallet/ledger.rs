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

//! # Wallet ledger
//!
//! The ledger is an immutable snapshot derived from the chain, the
//! keystore and the decode cache. [`WalletContext::refresh`] builds a new
//! one and swaps it in; readers keep whatever snapshot they hold.
//!

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::{debug, trace, warn};

use super::{lock, read, write, ChainSource, DecodeCache, Keystore, WalletContext};
use crate::address::Address;
use crate::blind::{TxOutSecrets, UnblindError};
use crate::confidential::{Asset, Value};
use crate::hash_types::Txid;
use crate::issuance::{AssetId, IssuanceAmount, IssuanceRecord};
use crate::transaction::{OutPoint, TxIn, TxOut};

/// Confirmed and unconfirmed amounts of one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetBalance {
    /// Amount in outputs with at least one confirmation
    pub confirmed: u64,
    /// Amount in mempool outputs
    pub unconfirmed: u64,
}

/// An output paying a script the wallet tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletOutput {
    /// Where the output lives
    pub outpoint: OutPoint,
    /// The output as it is on chain
    pub txout: TxOut,
    /// Wallet address of the output script
    pub address: Address,
    /// Opened amount and asset, when the wallet could decode them
    pub secrets: Option<TxOutSecrets>,
    /// Confirmations of the creating transaction
    pub confirmations: u32,
    /// Whether the script is only watched
    pub watch_only: bool,
    /// Whether a known transaction spends the output
    pub spent: bool,
}

impl WalletOutput {
    /// Whether the wallet may spend this output.
    pub fn is_spendable(&self) -> bool {
        !self.watch_only && self.secrets.is_some()
    }

    fn counts(&self, min_confirmations: u32, include_watch_only: bool) -> bool {
        self.confirmations >= min_confirmations && (include_watch_only || !self.watch_only)
    }
}

/// Filter of [`LedgerSnapshot::balance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceQuery {
    /// Only count outputs with this many confirmations
    pub min_confirmations: u32,
    /// Count watched outputs, when their amounts are known
    pub include_watch_only: bool,
    /// Only report this asset
    pub asset: Option<AssetId>,
}

/// Filter of [`LedgerSnapshot::list_unspent`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnspentQuery {
    /// Only outputs with this many confirmations
    pub min_confirmations: u32,
    /// Only outputs with at most this many confirmations
    pub max_confirmations: Option<u32>,
    /// Only outputs paying these addresses; all when empty
    pub addresses: Vec<Address>,
    /// Only outputs known to carry this asset
    pub asset: Option<AssetId>,
    /// Include watched outputs
    pub include_watch_only: bool,
}

/// Amounts received by one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedByAddress {
    /// The receiving address
    pub address: Address,
    /// Decoded amounts received, per asset
    pub amounts: BTreeMap<AssetId, u64>,
    /// Confirmations of the most recent payment
    pub confirmations: u32,
    /// Transactions paying the address
    pub txids: Vec<Txid>,
    /// Whether the address is only watched
    pub watch_only: bool,
}

/// What the wallet knows at one point in time.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    outputs: Vec<WalletOutput>,
    issuances: Vec<IssuanceRecord>,
}

impl LedgerSnapshot {
    /// Every output paying the wallet, spent or not.
    pub fn outputs(&self) -> &[WalletOutput] {
        &self.outputs
    }

    /// Unspent amounts per asset, filtered by `query`. Outputs the wallet
    /// cannot open contribute nothing.
    pub fn balance(&self, query: &BalanceQuery) -> BTreeMap<AssetId, u64> {
        let mut ret = BTreeMap::new();
        for out in &self.outputs {
            if out.spent || !out.counts(query.min_confirmations, query.include_watch_only) {
                continue;
            }
            if let Some(s) = out.secrets {
                if query.asset.map_or(true, |a| a == s.asset) {
                    *ret.entry(s.asset).or_default() += s.value;
                }
            }
        }
        ret.retain(|_, v| *v > 0);
        ret
    }

    /// Spendable balances per asset, split by confirmation.
    pub fn balances(&self) -> BTreeMap<AssetId, AssetBalance> {
        let mut ret: BTreeMap<AssetId, AssetBalance> = BTreeMap::new();
        for out in self.outputs.iter().filter(|o| !o.spent && !o.watch_only) {
            if let Some(s) = out.secrets {
                let entry = ret.entry(s.asset).or_default();
                if out.confirmations > 0 {
                    entry.confirmed += s.value;
                } else {
                    entry.unconfirmed += s.value;
                }
            }
        }
        ret
    }

    /// Unspent outputs matching `query`.
    pub fn list_unspent(&self, query: &UnspentQuery) -> Vec<WalletOutput> {
        self.outputs
            .iter()
            .filter(|o| !o.spent && o.counts(query.min_confirmations, query.include_watch_only))
            .filter(|o| query.max_confirmations.map_or(true, |max| o.confirmations <= max))
            .filter(|o| {
                query.addresses.is_empty()
                    || query.addresses.iter().any(|a| a.script_pubkey() == o.txout.script_pubkey)
            })
            .filter(|o| query.asset.map_or(true, |a| o.secrets.map(|s| s.asset) == Some(a)))
            .cloned()
            .collect()
    }

    /// Amounts received per address, spent or not.
    pub fn list_received_by_address(
        &self,
        min_confirmations: u32,
        include_watch_only: bool,
    ) -> Vec<ReceivedByAddress> {
        let mut by_address: BTreeMap<Address, ReceivedByAddress> = BTreeMap::new();
        for out in self.outputs.iter().filter(|o| o.counts(min_confirmations, include_watch_only)) {
            let entry = by_address.entry(out.address.clone()).or_insert_with(|| ReceivedByAddress {
                address: out.address.clone(),
                amounts: BTreeMap::new(),
                confirmations: out.confirmations,
                txids: vec![],
                watch_only: out.watch_only,
            });
            entry.confirmations = entry.confirmations.min(out.confirmations);
            if !entry.txids.contains(&out.outpoint.txid) {
                entry.txids.push(out.outpoint.txid);
            }
            if let Some(s) = out.secrets {
                *entry.amounts.entry(s.asset).or_default() += s.value;
            }
        }
        by_address.into_values().collect()
    }

    /// Issuances and reissuances visible to the wallet, optionally only
    /// those of `asset`.
    pub fn list_issuances(&self, asset: Option<AssetId>) -> Vec<IssuanceRecord> {
        self.issuances
            .iter()
            .filter(|r| asset.map_or(true, |a| r.asset == a))
            .cloned()
            .collect()
    }
}

fn amount_of(value: Value, opened: Option<Option<TxOutSecrets>>) -> IssuanceAmount {
    match (value, opened) {
        (Value::Null, _) => IssuanceAmount::Known(0),
        (Value::Explicit(v), _) => IssuanceAmount::Known(v),
        (Value::Confidential(_), Some(secrets)) => {
            IssuanceAmount::Known(secrets.map_or(0, |s| s.value))
        }
        (Value::Confidential(_), None) => IssuanceAmount::Unknown,
    }
}

impl<S: ChainSource> WalletContext<S> {
    /// Rebuilds the ledger from the chain source, trying every known
    /// blinding key on outputs not decoded yet. Returns the new snapshot.
    pub fn refresh(&self) -> Arc<LedgerSnapshot> {
        let mut cache = lock(&self.cache);
        let txs = self.chain.transactions();

        let snapshot = {
            let keystore = read(&self.keystore);
            let mut snapshot = LedgerSnapshot::default();
            let mut wallet_outpoints = BTreeSet::new();
            for ctx in &txs {
                let txid = ctx.tx.txid();
                let mut relevant =
                    ctx.tx.input.iter().any(|i| wallet_outpoints.contains(&i.previous_output));

                for (vout, out) in ctx.tx.output.iter().enumerate() {
                    let entry = match keystore.scripts.get(&out.script_pubkey) {
                        Some(entry) => entry,
                        None => continue,
                    };
                    relevant = true;
                    let outpoint = OutPoint::new(txid, vout as u32);
                    wallet_outpoints.insert(outpoint);
                    snapshot.outputs.push(WalletOutput {
                        outpoint,
                        txout: out.clone(),
                        address: entry.address.clone(),
                        secrets: self.decode_output(&mut cache, &keystore, outpoint, out),
                        confirmations: ctx.confirmations,
                        watch_only: entry.watch_only,
                        spent: self.chain.is_spent(&outpoint),
                    });
                }

                for (vin, txin) in ctx.tx.input.iter().enumerate() {
                    let key = keystore.issuance_keys.get(&(txid, vin as u32)).copied();
                    if !txin.has_issuance() || (!relevant && key.is_none()) {
                        continue;
                    }
                    let record = self.issuance_record(&mut cache, &snapshot, txid, vin as u32, txin, key);
                    snapshot.issuances.push(record);
                }
            }
            snapshot
        };

        debug!(
            "ledger refreshed over {} transactions: {} wallet outputs, {} issuances",
            txs.len(),
            snapshot.outputs.len(),
            snapshot.issuances.len()
        );
        let snapshot = Arc::new(snapshot);
        *write(&self.ledger) = Arc::clone(&snapshot);
        lock(&self.reserved).retain(|outpoint| !self.chain.is_spent(outpoint));
        snapshot
    }

    /// Opens an output, once. A decoded output keeps its secrets even if
    /// its blinding key is replaced later.
    fn decode_output(
        &self,
        cache: &mut DecodeCache,
        keystore: &Keystore,
        outpoint: OutPoint,
        out: &TxOut,
    ) -> Option<TxOutSecrets> {
        if let Some(secrets) = cache.outputs.get(&outpoint) {
            return Some(*secrets);
        }
        let secrets = match (out.asset, out.value) {
            (Asset::Explicit(asset), Value::Explicit(value)) => TxOutSecrets::explicit(asset, value),
            _ => {
                let key = keystore.blinding_keys.get(&out.script_pubkey)?;
                match out.unblind(&self.secp, *key) {
                    Ok(secrets) => secrets,
                    Err(UnblindError::NotOwned) => {
                        trace!("blinding key does not open {}", outpoint);
                        return None;
                    }
                    Err(e) => {
                        warn!("cannot unblind wallet output {}: {}", outpoint, e);
                        return None;
                    }
                }
            }
        };
        cache.outputs.insert(outpoint, secrets);
        Some(secrets)
    }

    fn issuance_record(
        &self,
        cache: &mut DecodeCache,
        snapshot: &LedgerSnapshot,
        txid: Txid,
        vin: u32,
        txin: &TxIn,
        key: Option<secp256k1_zkp::SecretKey>,
    ) -> IssuanceRecord {
        let entropy = txin.issuance_entropy();
        let (asset, token) = txin.issuance_ids();
        let is_reissuance = txin.is_reissuance();
        let token = if is_reissuance {
            snapshot
                .issuances
                .iter()
                .find(|r| r.entropy == entropy && !r.is_reissuance)
                .and_then(|r| r.token)
        } else {
            Some(token)
        };

        let opened = match cache.issuances.get(&(txid, vin)) {
            Some(secrets) => Some(*secrets),
            None => match txin.unblind_issuance(&self.secp, key) {
                Ok(secrets) => {
                    cache.issuances.insert((txid, vin), secrets);
                    Some(secrets)
                }
                Err(e) => {
                    trace!("issuance {}:{} stays opaque: {}", txid, vin, e);
                    None
                }
            },
        };

        IssuanceRecord {
            txid,
            vin,
            entropy,
            asset,
            token,
            asset_amount: amount_of(txin.asset_issuance.amount, opened.map(|s| s.amount)),
            token_amount: amount_of(txin.asset_issuance.inflation_keys, opened.map(|s| s.token)),
            is_reissuance,
            blinded: txin.asset_issuance.amount.is_confidential()
                || txin.asset_issuance.inflation_keys.is_confidential(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressParams;
    use crate::transaction::op_return_script;
    use bitcoin::hashes::Hash;
    use secp256k1_zkp::{PublicKey, Secp256k1, SecretKey};

    fn asset(n: u8) -> AssetId {
        AssetId::from_slice(&[n; 32]).unwrap()
    }

    fn output(n: u8, value: u64, confirmations: u32, watch_only: bool, spent: bool) -> WalletOutput {
        let secp = Secp256k1::new();
        let pk = PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&[n.max(1); 32]).unwrap());
        WalletOutput {
            outpoint: OutPoint::new(Txid::from_byte_array([n; 32]), 0),
            txout: TxOut::new_fee(value, asset(n % 2)),
            address: Address::p2wpkh(&pk, None, &AddressParams::ELEMENTS),
            secrets: Some(TxOutSecrets::explicit(asset(n % 2), value)),
            confirmations,
            watch_only,
            spent,
        }
    }

    #[test]
    fn balance_filters() {
        let mut opaque = output(5, 0, 3, false, false);
        opaque.secrets = None;
        opaque.txout.script_pubkey = op_return_script();
        let snapshot = LedgerSnapshot {
            outputs: vec![
                output(2, 10, 1, false, false),
                output(4, 5, 0, false, false),
                output(6, 7, 2, false, true),
                output(3, 20, 1, true, false),
                opaque,
            ],
            issuances: vec![],
        };

        let all = snapshot.balance(&BalanceQuery::default());
        assert_eq!(all.get(&asset(0)), Some(&15));
        assert_eq!(all.get(&asset(1)), None);

        let confirmed = snapshot.balance(&BalanceQuery {
            min_confirmations: 1,
            ..Default::default()
        });
        assert_eq!(confirmed.get(&asset(0)), Some(&10));

        let watched = snapshot.balance(&BalanceQuery {
            include_watch_only: true,
            asset: Some(asset(1)),
            ..Default::default()
        });
        assert_eq!(watched.len(), 1);
        assert_eq!(watched.get(&asset(1)), Some(&20));

        let balances = snapshot.balances();
        assert_eq!(
            balances.get(&asset(0)),
            Some(&AssetBalance {
                confirmed: 10,
                unconfirmed: 5
            })
        );
        assert_eq!(snapshot.list_unspent(&UnspentQuery::default()).len(), 3);
        assert_eq!(
            snapshot
                .list_unspent(&UnspentQuery {
                    asset: Some(asset(0)),
                    max_confirmations: Some(0),
                    ..Default::default()
                })
                .len(),
            1
        );
    }

    #[test]
    fn received_counts_spent_outputs() {
        let mut first = output(2, 10, 3, false, true);
        let mut second = output(4, 5, 1, false, false);
        second.address = first.address.clone();
        first.outpoint.vout = 1;
        let snapshot = LedgerSnapshot {
            outputs: vec![first, second],
            issuances: vec![],
        };
        let received = snapshot.list_received_by_address(0, false);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].amounts.get(&asset(0)), Some(&15));
        assert_eq!(received[0].confirmations, 1);
        assert_eq!(received[0].txids.len(), 2);
        assert!(snapshot.list_received_by_address(2, false)[0].amounts.get(&asset(0)) == Some(&10));
    }
}
