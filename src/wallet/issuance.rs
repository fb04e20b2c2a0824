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

//! # Issuance and reissuance
//!
//! Builds the transactions creating, reissuing and destroying assets.
//!

use std::collections::BTreeMap;

use bitcoin::hashes::{sha256, Hash};
use log::debug;
use secp256k1_zkp::rand::{CryptoRng, RngCore};

use super::{
    check_amount, lock, output_to, read, write, ChainSource, Draft, Error, PolicyError,
    WalletContext,
};
use crate::address::Address;
use crate::issuance::{AssetId, ContractHash};
use crate::rangeproof::MAX_MONEY;
use crate::transaction::{AssetIssuance, Transaction, TxOut};

/// Parameters of [`WalletContext::issue_asset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueRequest {
    /// Amount of the new asset
    pub asset_amount: u64,
    /// Amount of reissuance tokens
    pub token_amount: u64,
    /// Whether the issued amounts are blinded
    pub blind: bool,
    /// Contract committed to by the asset id
    pub contract_hash: Option<ContractHash>,
}

impl IssueRequest {
    /// A blinded issuance with no contract.
    pub fn new(asset_amount: u64, token_amount: u64) -> IssueRequest {
        IssueRequest {
            asset_amount,
            token_amount,
            blind: true,
            contract_hash: None,
        }
    }
}

/// A built issuance or reissuance transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceResult {
    /// The blinded transaction, ready for signing
    pub tx: Transaction,
    /// Index of the input carrying the issuance
    pub vin: u32,
    /// Entropy of the asset
    pub entropy: sha256::Midstate,
    /// The issued asset
    pub asset: AssetId,
    /// The reissuance token
    pub token: Option<AssetId>,
    /// Wallet address receiving the asset, if any is issued
    pub asset_address: Option<Address>,
    /// Wallet address receiving the token, if any is issued or spent
    pub token_address: Option<Address>,
}

impl<S: ChainSource> WalletContext<S> {
    /// Creates a new asset and, optionally, its reissuance token. Both go
    /// to fresh wallet addresses. The issuance rides on input 0.
    pub fn issue_asset<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        request: &IssueRequest,
    ) -> Result<IssuanceResult, Error> {
        if request.asset_amount == 0 && request.token_amount == 0 {
            return Err(PolicyError::ZeroIssuance.into());
        }
        if request.asset_amount > MAX_MONEY || request.token_amount > MAX_MONEY {
            return Err(Error::InvalidAmount);
        }
        let snapshot = self.snapshot();
        let mut reserved = lock(&self.reserved);

        let (prevout, secrets) = self
            .select_coins(&snapshot, &reserved, &[], self.config.policy_asset, 1)?
            .into_iter()
            .next()
            .ok_or(PolicyError::InsufficientFunds {
                asset: self.config.policy_asset,
                needed: 1,
                available: 0,
            })?;
        let contract_hash = request.contract_hash.unwrap_or_else(|| ContractHash::from_byte_array([0; 32]));
        let entropy = AssetId::generate_asset_entropy(prevout, contract_hash);
        let asset = AssetId::from_entropy(entropy);
        let token =
            AssetId::reissuance_token_from_entropy(entropy, request.blind && request.asset_amount > 0);

        let mut draft = Draft::new();
        draft.add_input(prevout, secrets).asset_issuance =
            AssetIssuance::new_issuance(contract_hash, request.asset_amount, request.token_amount);
        let asset_address = self.pay_to_new_address(&mut draft, asset, request.asset_amount)?;
        let token_address = self.pay_to_new_address(&mut draft, token, request.token_amount)?;

        let mut keys = BTreeMap::new();
        if request.blind {
            keys.insert(0, read(&self.keystore).master_blinding_key.issuance_blinding_key(prevout)?);
        }
        let (tx, _) = self.complete(rng, draft, keys.clone(), &mut reserved)?;
        if let Some(key) = keys.get(&0) {
            write(&self.keystore).issuance_keys.insert((tx.txid(), 0), *key);
        }
        debug!("issuing asset {} with token {} in {}", asset, token, tx.txid());

        Ok(IssuanceResult {
            tx,
            vin: 0,
            entropy,
            asset,
            token: Some(token),
            asset_address,
            token_address,
        })
    }

    /// Creates `amount` more of `asset`, spending and returning one of its
    /// reissuance tokens.
    pub fn reissue_asset<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        asset: AssetId,
        amount: u64,
    ) -> Result<IssuanceResult, Error> {
        if amount == 0 {
            return Err(PolicyError::ZeroIssuance.into());
        }
        check_amount(amount)?;
        let snapshot = self.snapshot();
        let issuances = snapshot.list_issuances(None);
        if issuances.iter().any(|r| r.token == Some(asset)) {
            return Err(PolicyError::TokenNotReissuable(asset).into());
        }
        let record = issuances
            .iter()
            .find(|r| r.asset == asset && !r.is_reissuance)
            .ok_or(PolicyError::UnknownAsset(asset))?;
        let token = record.token.ok_or(PolicyError::MissingToken(asset))?;

        let mut reserved = lock(&self.reserved);
        // The token's asset blinding factor becomes the reissuance nonce,
        // so an unblinded token cannot reissue.
        let (prevout, secrets) = snapshot
            .outputs()
            .iter()
            .filter(|o| !o.spent && o.is_spendable() && !reserved.contains(&o.outpoint))
            .filter_map(|o| o.secrets.map(|s| (o.outpoint, s)))
            .find(|(_, s)| s.asset == token && !s.asset_bf.is_zero())
            .ok_or(PolicyError::MissingToken(asset))?;

        let mut draft = Draft::new();
        draft.add_input(prevout, secrets).asset_issuance =
            AssetIssuance::new_reissuance(record.entropy, secrets.asset_bf, amount);
        let token_address = self.pay_to_new_address(&mut draft, token, secrets.value)?;
        let asset_address = self.pay_to_new_address(&mut draft, asset, amount)?;

        let mut keys = BTreeMap::new();
        if self.config.blind_issuances {
            keys.insert(0, read(&self.keystore).master_blinding_key.issuance_blinding_key(prevout)?);
        }
        let (tx, _) = self.complete(rng, draft, keys.clone(), &mut reserved)?;
        if let Some(key) = keys.get(&0) {
            write(&self.keystore).issuance_keys.insert((tx.txid(), 0), *key);
        }
        debug!("reissuing {} of asset {} in {}", amount, asset, tx.txid());

        Ok(IssuanceResult {
            tx,
            vin: 0,
            entropy: record.entropy,
            asset,
            token: Some(token),
            asset_address,
            token_address,
        })
    }

    /// Burns exactly `amount` of `asset` into an explicit, provably
    /// unspendable output.
    ///
    /// The transaction fee is paid on top of the burn, in the policy asset,
    /// so destroying policy coins lowers that balance by `amount` plus
    /// [`WalletConfig::fee`](super::WalletConfig::fee).
    pub fn destroy_amount<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        asset: AssetId,
        amount: u64,
    ) -> Result<Transaction, Error> {
        check_amount(amount)?;
        let mut draft = Draft::new();
        draft.tx.output.push(TxOut::new_burn(amount, asset));
        let mut reserved = lock(&self.reserved);
        let (tx, _) = self.complete(rng, draft, BTreeMap::new(), &mut reserved)?;
        debug!("destroying {} of asset {} in {}", amount, asset, tx.txid());
        Ok(tx)
    }

    fn pay_to_new_address(
        &self,
        draft: &mut Draft,
        asset: AssetId,
        amount: u64,
    ) -> Result<Option<Address>, Error> {
        if amount == 0 {
            return Ok(None);
        }
        let address = self.get_new_address()?;
        draft.tx.output.push(output_to(&address, asset, amount));
        Ok(Some(address))
    }
}
