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

//! # Transactions Blinding
//!
//! Turns a draft transaction into a confidential one: issuance amounts and
//! outputs carrying a receiver blinding key get value and asset
//! commitments, rangeproofs and surjection proofs, with the last value
//! blinding factor solved so that commitments balance. Also the inverse
//! operations: unblinding outputs and issuances, and verifying proofs.
//!

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, trace};
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use secp256k1_zkp::{
    self,
    rand::{CryptoRng, RngCore},
    Generator, PedersenCommitment, PublicKey, RangeProof, Secp256k1, SecretKey, Signing,
    Verification,
};

use crate::confidential::{
    self, ArithmeticError, Asset, AssetBlindingFactor, Nonce, ProofInvalid, Value,
    ValueBlindingFactor,
};
use crate::issuance::AssetId;
use crate::rangeproof::{self, RangeProofMessage, MAX_MONEY};
use crate::surjection::{self, SurjectionError, SurjectionInput};
use crate::transaction::{op_return_script, Transaction, TxIn, TxOut, TxOutWitness};

/// Transaction Output related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TxOutError {
    /// Unexpected Null Value
    UnExpectedNullValue,
    /// Unexpected Null asset
    UnExpectedNullAsset,
}

impl std::error::Error for TxOutError {}

impl fmt::Display for TxOutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            TxOutError::UnExpectedNullValue => write!(f, "UnExpected Null Value"),
            TxOutError::UnExpectedNullAsset => write!(f, "UnExpected Null Asset"),
        }
    }
}

/// Transaction verification errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    /// Verification of rangeproof failed
    RangeProofError(usize, ProofInvalid),
    /// Missing Range Proof
    RangeProofMissing(usize),
    /// Verification of SurjectionProof failed
    SurjectionProofVerificationError(usize),
    /// Surjection Proof is missing
    SurjectionProofMissing(usize),
    /// A confidential issuance amount of an input lacks its rangeproof
    IssuanceRangeProofMissing(usize),
    /// An issuance rangeproof of an input does not verify
    IssuanceRangeProofError(usize, ProofInvalid),
    /// Spent Txout error
    SpentTxOutError(usize, TxOutError),
    /// Current transaction txout error
    TxOutError(usize, TxOutError),
    /// Input commitments do not sum to output commitments
    BalanceCheckFailed,
    /// Spent utxos length mismatch
    UtxoInputLenMismatch,
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationError::RangeProofError(i, e) => {
                write!(f, "Rangeproof Error {} : for output {}", e, i)
            }
            VerificationError::RangeProofMissing(i) => {
                write!(f, "Missing Rangeproof for output {}", i)
            }
            VerificationError::SurjectionProofVerificationError(i) => {
                write!(f, "Surjection proof verification failed for output {}", i)
            }
            VerificationError::SurjectionProofMissing(i) => {
                write!(f, "Missing Surjection Proof for output {}", i)
            }
            VerificationError::IssuanceRangeProofMissing(i) => {
                write!(f, "Missing issuance rangeproof for input {}", i)
            }
            VerificationError::IssuanceRangeProofError(i, e) => {
                write!(f, "Issuance rangeproof error {} : for input {}", e, i)
            }
            VerificationError::SpentTxOutError(i, e) => {
                write!(f, "Input index {} txout error: {}", i, e)
            }
            VerificationError::TxOutError(i, e) => {
                write!(f, "Output index {} txout error: {}", i, e)
            }
            VerificationError::BalanceCheckFailed => {
                write!(f, "Confidential transaction verification balance check failed")
            }
            VerificationError::UtxoInputLenMismatch => {
                write!(f, "Utxo len must be equal to the number of transaction inputs")
            }
        }
    }
}

impl std::error::Error for VerificationError {}

/// Information about Transaction Input Asset
#[cfg_attr(
    feature = "serde",
    derive(actual_serde::Serialize, actual_serde::Deserialize),
    serde(crate = "actual_serde")
)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct TxOutSecrets {
    /// Asset
    pub asset: AssetId,
    /// Asset Blinding Factor
    pub asset_bf: AssetBlindingFactor,
    /// Value
    pub value: u64,
    /// Value Blinding factor
    pub value_bf: ValueBlindingFactor,
}

impl TxOutSecrets {
    /// Create a new [`TxOutSecrets`]
    pub fn new(
        asset: AssetId,
        asset_bf: AssetBlindingFactor,
        value: u64,
        value_bf: ValueBlindingFactor,
    ) -> Self {
        Self {
            asset,
            asset_bf,
            value,
            value_bf,
        }
    }

    /// Secrets of an explicit output: both blinding factors are zero.
    pub fn explicit(asset: AssetId, value: u64) -> Self {
        Self::new(asset, AssetBlindingFactor::zero(), value, ValueBlindingFactor::zero())
    }

    /// Whether the secrets describe an unblinded output.
    pub fn is_explicit(&self) -> bool {
        self.asset_bf.is_zero() && self.value_bf.is_zero()
    }

    /// Gets the required fields for last value blinding factor calculation from [`TxOutSecrets`]
    pub fn value_blind_inputs(&self) -> (u64, AssetBlindingFactor, ValueBlindingFactor) {
        (self.value, self.asset_bf, self.value_bf)
    }

    /// The asset generator these secrets commit to.
    pub fn asset_generator<C: Signing>(&self, secp: &Secp256k1<C>) -> Generator {
        Generator::new_blinded(secp, self.asset.into_tag(), self.asset_bf.into_inner())
    }

    /// The value commitment these secrets open. Returns [None] for an
    /// unblinded zero amount, which commits to the point at infinity.
    pub fn value_commitment<C: Signing>(&self, secp: &Secp256k1<C>) -> Option<PedersenCommitment> {
        value_commitment(secp, self.value, self.value_bf, self.asset_generator(secp))
    }
}

impl From<TxOutSecrets> for SurjectionInput {
    fn from(v: TxOutSecrets) -> Self {
        SurjectionInput::Known {
            asset: v.asset,
            asset_bf: v.asset_bf,
        }
    }
}

fn value_commitment<C: Signing>(
    secp: &Secp256k1<C>,
    value: u64,
    vbf: ValueBlindingFactor,
    gen: Generator,
) -> Option<PedersenCommitment> {
    if vbf.is_zero() {
        if value == 0 {
            None
        } else {
            Some(PedersenCommitment::new_unblinded(secp, value, gen))
        }
    } else {
        Some(PedersenCommitment::new(secp, value, vbf.into_inner(), gen))
    }
}

/// Secrets of the issuance pseudo-inputs of one input.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct IssuanceSecrets {
    /// Secrets of the issued asset amount, if any is issued
    pub amount: Option<TxOutSecrets>,
    /// Secrets of the issued token amount, if any is issued
    pub token: Option<TxOutSecrets>,
}

impl IssuanceSecrets {
    fn iter(&self) -> impl Iterator<Item = &TxOutSecrets> {
        self.amount.iter().chain(self.token.iter())
    }
}

/// Limits the blinder enforces before doing any proof work.
#[cfg_attr(
    feature = "serde",
    derive(actual_serde::Serialize, actual_serde::Deserialize),
    serde(crate = "actual_serde")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinderConfig {
    /// Most distinct assets the inputs of a blinded transaction may carry.
    pub max_surjection_assets: usize,
    /// Largest weight of a blinded transaction.
    pub max_tx_weight: usize,
}

impl Default for BlinderConfig {
    fn default() -> Self {
        BlinderConfig {
            max_surjection_assets: surjection::MAX_SURJECTION_DOMAIN,
            max_tx_weight: 400_000,
        }
    }
}

/// Everything the blinder needs to know besides the transaction itself.
#[derive(Debug, Clone, Default)]
pub struct BlindingInputs {
    /// Secrets of the outputs spent by each input, in input order.
    /// Explicit prevouts use [`TxOutSecrets::explicit`].
    pub spent_utxo_secrets: Vec<TxOutSecrets>,
    /// Secrets of outputs which are already confidential, by output index.
    pub output_secrets: BTreeMap<usize, TxOutSecrets>,
    /// Issuance blinding keys, by input index. Explicit issuances on these
    /// inputs get blinded; confidential ones get opened with the key.
    pub issuance_keys: BTreeMap<usize, SecretKey>,
    /// Receiver of a zero-value balancing output, added when no output
    /// is left to blind but the commitments do not balance.
    pub balancing_pubkey: Option<PublicKey>,
}

/// What a call to [`Transaction::blind`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlindReport {
    /// Secrets of every output blinded by this call, by output index
    pub output_secrets: BTreeMap<usize, TxOutSecrets>,
    /// Secrets of every issuance blinded by this call, by input index
    pub issuance_secrets: BTreeMap<usize, IssuanceSecrets>,
    /// Index of the balancing output added by this call, if any
    pub balancing_output: Option<usize>,
}

impl BlindReport {
    /// Whether the transaction was modified.
    pub fn changed(&self) -> bool {
        !self.output_secrets.is_empty() || !self.issuance_secrets.is_empty()
    }
}

/// Errors from the blinder's resource ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLimitError {
    /// More distinct input assets than a surjection proof can cover.
    TooManyAssets,
    /// The blinded transaction would exceed the weight limit.
    TransactionTooLarge,
}

impl fmt::Display for ResourceLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLimitError::TooManyAssets => f.write_str(
                "Transaction blinding failed. One possible reason is you have over 150 inputs, \
                 which can cause transaction blinding failure in remote cases. Try sending \
                 fewer assets at a single time, or spend fewer inputs.",
            ),
            ResourceLimitError::TransactionTooLarge => f.write_str("Transaction too large"),
        }
    }
}

impl std::error::Error for ResourceLimitError {}

/// Errors encountered when blinding transaction outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlindError {
    /// Number of spent utxo secrets does not match the number of inputs
    UtxoInputLenMismatch,
    /// An output has a null asset or value
    InvalidOutput(usize),
    /// An already confidential output has no secrets, or secrets which do
    /// not open its commitments
    MissingOutputSecrets(usize),
    /// An input has a confidential issuance but no issuance blinding key
    MissingIssuanceSecrets(usize),
    /// An explicit issuance of zero cannot be blinded
    ZeroValueIssuance(usize),
    /// An output amount above 21 million coins
    ValueOutOfRange(usize),
    /// Nothing left to blind, the commitments do not balance and there is
    /// no key to send a balancing output to
    Unbalanceable,
    /// The only output to blind would be solved against unblinded inputs,
    /// which leaves its commitment unhidden, and there is no key to send a
    /// second, balancing output to
    LoneBlindedOutput(usize),
    /// A resource ceiling was hit
    ResourceLimit(ResourceLimitError),
    /// Blinding factor arithmetic failed
    Arithmetic(ArithmeticError),
    /// No input carries the asset of an output
    SurjectionInputMissing(usize, AssetId),
    /// Opening a confidential issuance failed
    Unblind(usize, UnblindError),
    /// Error originated in `secp256k1_zkp`.
    Upstream(secp256k1_zkp::Error),
    /// Error originated in `secp256k1`.
    UpstreamKey(secp256k1_zkp::UpstreamError),
}

impl fmt::Display for BlindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            BlindError::UtxoInputLenMismatch => {
                write!(f, "Utxo secrets len must be equal to the number of transaction inputs")
            }
            BlindError::InvalidOutput(i) => write!(f, "Output {} has a null asset or value", i),
            BlindError::MissingOutputSecrets(i) => {
                write!(f, "Missing or wrong secrets for confidential output {}", i)
            }
            BlindError::MissingIssuanceSecrets(i) => {
                write!(f, "Missing issuance blinding key for confidential issuance on input {}", i)
            }
            BlindError::ZeroValueIssuance(i) => {
                write!(f, "Zero value issuance on input {} cannot be blinded", i)
            }
            BlindError::ValueOutOfRange(i) => write!(f, "Output {} value out of money range", i),
            BlindError::Unbalanceable => write!(
                f,
                "Unable to blind transaction: no output to blind and no key for a balancing output"
            ),
            BlindError::LoneBlindedOutput(i) => write!(
                f,
                "Output {} is the only output to blind and no input is blinded. \
                 Add another output to blind in order to complete the blinding.",
                i
            ),
            BlindError::ResourceLimit(e) => write!(f, "{}", e),
            BlindError::Arithmetic(e) => write!(f, "{}", e),
            BlindError::SurjectionInputMissing(i, asset) => {
                write!(f, "No input of asset {} for output {}", asset, i)
            }
            BlindError::Unblind(i, e) => write!(f, "Unable to open issuance on input {}: {}", i, e),
            BlindError::Upstream(e) => write!(f, "{}", e),
            BlindError::UpstreamKey(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BlindError {}

impl From<secp256k1_zkp::Error> for BlindError {
    fn from(from: secp256k1_zkp::Error) -> Self {
        BlindError::Upstream(from)
    }
}

impl From<secp256k1_zkp::UpstreamError> for BlindError {
    fn from(from: secp256k1_zkp::UpstreamError) -> Self {
        BlindError::UpstreamKey(from)
    }
}

impl From<ResourceLimitError> for BlindError {
    fn from(from: ResourceLimitError) -> Self {
        BlindError::ResourceLimit(from)
    }
}

impl BlindError {
    /// Points issuance errors at input `index`.
    fn at_input(self, index: usize) -> Self {
        match self {
            BlindError::MissingIssuanceSecrets(_) => BlindError::MissingIssuanceSecrets(index),
            BlindError::ZeroValueIssuance(_) => BlindError::ZeroValueIssuance(index),
            e => e,
        }
    }
}

impl From<ArithmeticError> for BlindError {
    fn from(from: ArithmeticError) -> Self {
        BlindError::Arithmetic(from)
    }
}

/// Errors encountered when unblinding `TxOut`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnblindError {
    /// The `TxOut` is not fully confidential.
    NotConfidential,
    /// Transaction output does not have a nonce commitment.
    MissingNonce,
    /// Transaction output does not have a rangeproof.
    MissingRangeproof,
    /// The key does not open this output: it was blinded for someone else.
    NotOwned,
    /// The rewound asset does not match the asset commitment.
    AssetMismatch,
}

impl fmt::Display for UnblindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            UnblindError::MissingNonce => write!(f, "missing nonce in txout"),
            UnblindError::NotConfidential => write!(f, "cannot unblind non-confidential txout"),
            UnblindError::MissingRangeproof => write!(f, "missing rangeproof in txout"),
            UnblindError::NotOwned => write!(f, "blinding key does not open this commitment"),
            UnblindError::AssetMismatch => {
                write!(f, "rangeproof message does not match the asset commitment")
            }
        }
    }
}

impl std::error::Error for UnblindError {}

impl TxOut {
    fn get_asset_gen<C: Signing>(&self, secp: &Secp256k1<C>) -> Result<Generator, TxOutError> {
        self.asset.into_asset_gen(secp).ok_or(TxOutError::UnExpectedNullAsset)
    }

    /// The value commitment of this output. [None] for explicit zero amounts.
    fn get_value_commit<C: Signing>(
        &self,
        secp: &Secp256k1<C>,
    ) -> Result<Option<PedersenCommitment>, TxOutError> {
        match self.value {
            Value::Null => Err(TxOutError::UnExpectedNullValue),
            Value::Explicit(0) => Ok(None),
            Value::Explicit(v) => {
                let gen = self.get_asset_gen(secp)?;
                Ok(Some(PedersenCommitment::new_unblinded(secp, v, gen)))
            }
            Value::Confidential(comm) => Ok(Some(comm)),
        }
    }

    /// Unblinds a transaction output, if it is confidential.
    ///
    /// It returns the secret elements of the value and asset Pedersen
    /// commitments. A key which was not used to blind this output yields
    /// [`UnblindError::NotOwned`].
    pub fn unblind<C: Verification + Signing>(
        &self,
        secp: &Secp256k1<C>,
        blinding_key: SecretKey,
    ) -> Result<TxOutSecrets, UnblindError> {
        let (commitment, additional_generator) = match (self.value, self.asset) {
            (Value::Confidential(com), Asset::Confidential(gen)) => (com, gen),
            _ => return Err(UnblindError::NotConfidential),
        };

        let shared_secret = self
            .nonce
            .shared_secret(&blinding_key)
            .ok_or(UnblindError::MissingNonce)?;
        let proof = self
            .witness
            .rangeproof
            .as_ref()
            .ok_or(UnblindError::MissingRangeproof)?;

        let rewound = rangeproof::rewind(
            secp,
            proof,
            commitment,
            shared_secret,
            &self.script_pubkey,
            additional_generator,
        )
        .map_err(|_| UnblindError::NotOwned)?;

        let secrets = TxOutSecrets::new(
            rewound.message.asset,
            rewound.message.bf,
            rewound.value,
            rewound.value_bf,
        );
        if secrets.asset_generator(secp) != additional_generator {
            return Err(UnblindError::AssetMismatch);
        }
        Ok(secrets)
    }
}

impl TxIn {
    /// Blinds the explicit issuance amounts of this input. The issuance
    /// blinding key is the rangeproof nonce, so whoever holds it can
    /// later open the amounts with [`TxIn::unblind_issuance`].
    ///
    /// Issuance errors name input 0; [`Transaction::blind`] reports the
    /// real input index.
    pub fn blind_issuances_with_key<R, C>(
        &mut self,
        rng: &mut R,
        secp: &Secp256k1<C>,
        issuance_key: SecretKey,
    ) -> Result<IssuanceSecrets, BlindError>
    where
        R: RngCore + CryptoRng,
        C: Signing,
    {
        // The token id depends on whether the asset amount ends up blinded.
        let (asset_id, token_id) = self.issuance_ids_with(!self.asset_issuance.amount.is_null());
        let mut secrets = IssuanceSecrets::default();
        let mut proofs = [None, None];
        let amounts = [
            (self.asset_issuance.amount, asset_id),
            (self.asset_issuance.inflation_keys, token_id),
        ];
        let mut commitments = [Value::Null, Value::Null];
        for (i, (amount, asset)) in amounts.iter().enumerate() {
            let value = match *amount {
                Value::Null => continue,
                Value::Explicit(v) => v,
                Value::Confidential(_) => return Err(BlindError::MissingIssuanceSecrets(0)),
            };
            if value == 0 {
                return Err(BlindError::ZeroValueIssuance(0));
            }
            let vbf = ValueBlindingFactor::new(rng);
            let gen = Generator::new_unblinded(secp, asset.into_tag());
            let comm = Value::new_confidential(secp, value, gen, vbf);
            let msg = RangeProofMessage {
                asset: *asset,
                bf: AssetBlindingFactor::zero(),
            };
            let script = bitcoin::ScriptBuf::new();
            let commitment = comm.commitment().ok_or(BlindError::ZeroValueIssuance(0))?;
            let proof =
                rangeproof::prove(secp, commitment, value, vbf, &msg, &script, issuance_key, gen)?;
            proofs[i] = Some(Box::new(proof));
            commitments[i] = comm;
            let s = TxOutSecrets::new(*asset, AssetBlindingFactor::zero(), value, vbf);
            if i == 0 {
                secrets.amount = Some(s);
            } else {
                secrets.token = Some(s);
            }
        }

        let [amount_proof, token_proof] = proofs;
        if let Some(proof) = amount_proof {
            self.asset_issuance.amount = commitments[0];
            self.witness.amount_rangeproof = Some(proof);
        }
        if let Some(proof) = token_proof {
            self.asset_issuance.inflation_keys = commitments[1];
            self.witness.inflation_keys_rangeproof = Some(proof);
        }
        Ok(secrets)
    }

    /// Opens the issuance amounts of this input. Explicit amounts open
    /// without a key; blinded ones need the issuance blinding key.
    pub fn unblind_issuance<C: Verification + Signing>(
        &self,
        secp: &Secp256k1<C>,
        issuance_key: Option<SecretKey>,
    ) -> Result<IssuanceSecrets, UnblindError> {
        let (asset_id, token_id) = self.issuance_ids();
        let script = bitcoin::ScriptBuf::new();
        let open = |amount: Value,
                    asset: AssetId,
                    proof: Option<&RangeProof>|
         -> Result<Option<TxOutSecrets>, UnblindError> {
            match amount {
                Value::Null => Ok(None),
                Value::Explicit(v) => Ok(Some(TxOutSecrets::explicit(asset, v))),
                Value::Confidential(comm) => {
                    let key = issuance_key.ok_or(UnblindError::NotOwned)?;
                    let proof = proof.ok_or(UnblindError::MissingRangeproof)?;
                    let gen = Generator::new_unblinded(secp, asset.into_tag());
                    let rewound = rangeproof::rewind(secp, proof, comm, key, &script, gen)
                        .map_err(|_| UnblindError::NotOwned)?;
                    Ok(Some(TxOutSecrets::new(
                        asset,
                        AssetBlindingFactor::zero(),
                        rewound.value,
                        rewound.value_bf,
                    )))
                }
            }
        };
        Ok(IssuanceSecrets {
            amount: open(
                self.asset_issuance.amount,
                asset_id,
                self.witness.amount_rangeproof.as_deref(),
            )?,
            token: open(
                self.asset_issuance.inflation_keys,
                token_id,
                self.witness.inflation_keys_rangeproof.as_deref(),
            )?,
        })
    }
}

/// One output the blinder is about to make confidential.
struct OutputJob {
    index: usize,
    secrets: TxOutSecrets,
    receiver: PublicKey,
    seed: [u8; 32],
}

impl Transaction {
    /// Verify that the transaction has correctly calculated blinding
    /// factors and the CT verification equation holds.
    /// This is *NOT* a complete transaction verification check: it does
    /// *NOT* check scripts, signatures or double spends. It checks every
    /// rangeproof (issuances included), every surjection proof against the
    /// input domain, and that the inputs and issuances sum to the outputs.
    /// The order of `spent_utxos` must match the transaction inputs.
    pub fn verify_tx_amt_proofs<C: Verification + Signing>(
        &self,
        secp: &Secp256k1<C>,
        spent_utxos: &[TxOut],
    ) -> Result<(), VerificationError> {
        if spent_utxos.len() != self.input.len() {
            return Err(VerificationError::UtxoInputLenMismatch);
        }
        let mut in_commits = vec![];
        let mut out_commits = vec![];
        for (i, inp) in self.input.iter().enumerate() {
            spent_utxos[i]
                .get_asset_gen(secp)
                .map_err(|e| VerificationError::SpentTxOutError(i, e))?;
            in_commits.extend(
                spent_utxos[i]
                    .get_value_commit(secp)
                    .map_err(|e| VerificationError::SpentTxOutError(i, e))?,
            );
            if !inp.has_issuance() {
                continue;
            }
            let (asset_id, token_id) = inp.issuance_ids();
            let amounts = [
                (inp.asset_issuance.amount, asset_id, inp.witness.amount_rangeproof.as_deref()),
                (
                    inp.asset_issuance.inflation_keys,
                    token_id,
                    inp.witness.inflation_keys_rangeproof.as_deref(),
                ),
            ];
            for (amt, asset, proof) in amounts.iter() {
                let gen = Generator::new_unblinded(secp, asset.into_tag());
                match *amt {
                    // a zero amount commits to nothing, like a zero output
                    Value::Null | Value::Explicit(0) => continue,
                    Value::Explicit(v) => {
                        in_commits.push(PedersenCommitment::new_unblinded(secp, v, gen));
                    }
                    Value::Confidential(comm) => {
                        let proof = proof.ok_or(VerificationError::IssuanceRangeProofMissing(i))?;
                        rangeproof::verify(secp, proof, comm, &bitcoin::ScriptBuf::new(), gen)
                            .map_err(|e| VerificationError::IssuanceRangeProofError(i, e))?;
                        in_commits.push(comm);
                    }
                }
            }
        }
        let domain: Vec<Generator> = surjection::domain(&self.input, spent_utxos)
            .iter()
            .filter_map(|d| d.surjection_target(secp))
            .map(|(gen, _, _)| gen)
            .collect();

        for (i, out) in self.output.iter().enumerate() {
            out_commits.extend(
                out.get_value_commit(secp).map_err(|e| VerificationError::TxOutError(i, e))?,
            );

            if let Some(comm) = out.value.commitment() {
                let gen = out.get_asset_gen(secp).map_err(|e| VerificationError::TxOutError(i, e))?;
                let proof = out
                    .witness
                    .rangeproof
                    .as_ref()
                    .ok_or(VerificationError::RangeProofMissing(i))?;
                rangeproof::verify(secp, proof, comm, &out.script_pubkey, gen)
                    .map_err(|e| VerificationError::RangeProofError(i, e))?;
            }

            if let Some(gen) = out.asset.commitment() {
                let proof = out
                    .witness
                    .surjection_proof
                    .as_ref()
                    .ok_or(VerificationError::SurjectionProofMissing(i))?;
                surjection::verify(secp, proof, gen, &domain)
                    .map_err(|_| VerificationError::SurjectionProofVerificationError(i))?;
            }
        }

        if !confidential::verify_balance(secp, &in_commits, &out_commits) {
            return Err(VerificationError::BalanceCheckFailed);
        }
        Ok(())
    }

    /// Blind a transaction.
    ///
    /// Outputs which are not fees and carry the receiver's blinding public
    /// key in their nonce are blinded; explicit outputs stay explicit and
    /// already confidential outputs are left untouched. Issuances on
    /// inputs with an issuance key are blinded first. When nothing is
    /// left to blind the transaction is returned as is if it balances,
    /// else a zero-value `OP_RETURN` output is added for
    /// [`BlindingInputs::balancing_pubkey`]. The same output is added when
    /// a single output is to be blinded and no input is blinded, since the
    /// solved blinder would otherwise cancel its own asset blinder.
    ///
    /// The transaction is only modified when blinding succeeds.
    pub fn blind<R, C>(
        &mut self,
        rng: &mut R,
        secp: &Secp256k1<C>,
        inputs: &BlindingInputs,
        config: &BlinderConfig,
    ) -> Result<BlindReport, BlindError>
    where
        R: RngCore + CryptoRng,
        C: Signing + Verification,
    {
        if inputs.spent_utxo_secrets.len() != self.input.len() {
            return Err(BlindError::UtxoInputLenMismatch);
        }
        let mut tx = self.clone();
        let mut report = BlindReport::default();

        // Inputs and issuance pseudo-inputs, in domain order.
        let mut in_secrets = Vec::with_capacity(tx.input.len());
        for (i, txin) in tx.input.iter_mut().enumerate() {
            in_secrets.push(inputs.spent_utxo_secrets[i]);
            if !txin.has_issuance() {
                continue;
            }
            let key = inputs.issuance_keys.get(&i).copied();
            let explicit = !txin.asset_issuance.amount.is_confidential()
                && !txin.asset_issuance.inflation_keys.is_confidential();
            let issuance = match key {
                Some(key) if explicit => {
                    let secrets = txin
                        .blind_issuances_with_key(rng, secp, key)
                        .map_err(|e| e.at_input(i))?;
                    debug!("blinded issuance on input {}", i);
                    report.issuance_secrets.insert(i, secrets);
                    secrets
                }
                key => txin
                    .unblind_issuance(secp, key)
                    .map_err(|e| match (key, e) {
                        (None, UnblindError::NotOwned) => BlindError::MissingIssuanceSecrets(i),
                        (_, e) => BlindError::Unblind(i, e),
                    })?,
            };
            in_secrets.extend(issuance.iter().copied());
        }

        // Partition outputs.
        let mut out_secrets = BTreeMap::new();
        let mut to_blind = vec![];
        for (i, out) in tx.output.iter().enumerate() {
            match (out.asset, out.value) {
                (Asset::Null, _) | (_, Value::Null) => return Err(BlindError::InvalidOutput(i)),
                (Asset::Explicit(asset), Value::Explicit(value)) => {
                    let secrets = TxOutSecrets::explicit(asset, value);
                    match out.nonce {
                        Nonce::Confidential(pk) if !out.is_fee() => to_blind.push((i, secrets, pk)),
                        _ => {
                            out_secrets.insert(i, secrets);
                        }
                    }
                }
                _ => {
                    let secrets = inputs
                        .output_secrets
                        .get(&i)
                        .copied()
                        .ok_or(BlindError::MissingOutputSecrets(i))?;
                    if Some(secrets.asset_generator(secp)) != out.asset.into_asset_gen(secp) {
                        return Err(BlindError::MissingOutputSecrets(i));
                    }
                    out_secrets.insert(i, secrets);
                }
            }
        }

        // The solved value blinder only hides an amount when some other
        // blinding factor enters the balance.
        let blinded_inputs = in_secrets
            .iter()
            .chain(out_secrets.values())
            .any(|s| !s.asset_bf.is_zero() || !s.value_bf.is_zero());
        let mut lone_output = None;
        match to_blind.len() {
            0 => {
                if balances(secp, &in_secrets, &tx) {
                    debug!("nothing to blind, transaction already balances");
                    *self = tx;
                    return Ok(report);
                }
                if !blinded_inputs {
                    // explicit amounts which do not add up
                    return Err(BlindError::Unbalanceable);
                }
                let pk = inputs.balancing_pubkey.ok_or(BlindError::Unbalanceable)?;
                let asset = in_secrets.first().map(|s| s.asset).ok_or(BlindError::Unbalanceable)?;
                report.balancing_output = Some(push_balancing_output(&mut tx, &mut to_blind, asset, pk));
            }
            1 if !blinded_inputs => match inputs.balancing_pubkey {
                Some(pk) => {
                    let asset = to_blind[0].1.asset;
                    report.balancing_output = Some(push_balancing_output(&mut tx, &mut to_blind, asset, pk));
                }
                None => lone_output = Some(to_blind[0].0),
            },
            _ => {}
        }

        let domain: Vec<SurjectionInput> = in_secrets.iter().copied().map(SurjectionInput::from).collect();
        check_limits(&tx, &domain, &to_blind, config)?;
        for &(i, secrets, _) in &to_blind {
            if secrets.value > MAX_MONEY {
                return Err(BlindError::ValueOutOfRange(i));
            }
            if !surjection::window(&domain).iter().any(|d| d.asset() == Some(secrets.asset)) {
                return Err(if domain.iter().any(|d| d.asset() == Some(secrets.asset)) {
                    BlindError::ResourceLimit(ResourceLimitError::TooManyAssets)
                } else {
                    BlindError::SurjectionInputMissing(i, secrets.asset)
                });
            }
        }
        if let Some(i) = lone_output {
            return Err(BlindError::LoneBlindedOutput(i));
        }

        // Sample every blinding factor but the last value one, then solve it.
        let mut jobs = Vec::with_capacity(to_blind.len());
        let last = to_blind.len() - 1;
        let mut other_outputs: Vec<_> =
            out_secrets.values().map(TxOutSecrets::value_blind_inputs).collect();
        for (n, (index, mut secrets, receiver)) in to_blind.into_iter().enumerate() {
            secrets.asset_bf = AssetBlindingFactor::new(rng);
            if n < last {
                secrets.value_bf = ValueBlindingFactor::new(rng);
                other_outputs.push(secrets.value_blind_inputs());
            } else {
                let input_triples: Vec<_> =
                    in_secrets.iter().map(TxOutSecrets::value_blind_inputs).collect();
                secrets.value_bf = ValueBlindingFactor::last(
                    secp,
                    secrets.value,
                    secrets.asset_bf,
                    &input_triples,
                    &other_outputs,
                )?;
            }
            let mut seed = [0u8; 32];
            rng.fill_bytes(&mut seed);
            jobs.push(OutputJob {
                index,
                secrets,
                receiver,
                seed,
            });
        }

        debug!(
            "blinding {} outputs over a domain of {} inputs",
            jobs.len(),
            domain.len()
        );
        let blinded = jobs
            .par_iter()
            .map(|job| {
                let spk = &tx.output[job.index].script_pubkey;
                blind_output(secp, job, spk, &domain).map(|out| (job.index, job.secrets, out))
            })
            .collect::<Result<Vec<_>, BlindError>>()?;

        for (index, secrets, out) in blinded {
            tx.output[index] = out;
            report.output_secrets.insert(index, secrets);
        }

        if tx.weight() > config.max_tx_weight {
            return Err(ResourceLimitError::TransactionTooLarge.into());
        }
        *self = tx;
        Ok(report)
    }
}

/// Appends a zero-value `OP_RETURN` output blinded to `pk` and queues it
/// for blinding. Returns its index.
fn push_balancing_output(
    tx: &mut Transaction,
    to_blind: &mut Vec<(usize, TxOutSecrets, PublicKey)>,
    asset: AssetId,
    pk: PublicKey,
) -> usize {
    let index = tx.output.len();
    tx.output.push(TxOut::new_to_blind(0, asset, op_return_script(), pk));
    debug!("adding balancing output {} of asset {}", index, asset);
    to_blind.push((index, TxOutSecrets::explicit(asset, 0), pk));
    index
}

/// Whether the commitments of a transaction balance, with its inputs
/// opened by `in_secrets` (inputs and issuance pseudo-inputs).
fn balances<C: Signing>(secp: &Secp256k1<C>, in_secrets: &[TxOutSecrets], tx: &Transaction) -> bool {
    let in_commits: Vec<_> = in_secrets.iter().filter_map(|s| s.value_commitment(secp)).collect();
    let mut out_commits = vec![];
    for out in &tx.output {
        match out.get_value_commit(secp) {
            Ok(Some(comm)) => out_commits.push(comm),
            Ok(None) => {}
            Err(_) => return false,
        }
    }
    confidential::verify_balance(secp, &in_commits, &out_commits)
}

fn check_limits(
    tx: &Transaction,
    domain: &[SurjectionInput],
    to_blind: &[(usize, TxOutSecrets, PublicKey)],
    config: &BlinderConfig,
) -> Result<(), ResourceLimitError> {
    let assets = surjection::distinct_assets(domain);
    if assets > config.max_surjection_assets {
        debug!("{} distinct input assets, limit is {}", assets, config.max_surjection_assets);
        return Err(ResourceLimitError::TooManyAssets);
    }

    // Committed values are 24 bytes larger than explicit ones; both proofs
    // go to the witness.
    let per_output = 24 * 4 + rangeproof::estimated_size() + surjection::estimated_size(domain.len());
    let witness_overhead = if tx.has_witness() {
        0
    } else {
        tx.input.len() * 4 + tx.output.len() * 2
    };
    let estimated = tx.weight() + witness_overhead + per_output * to_blind.len();
    if estimated > config.max_tx_weight {
        debug!("estimated weight {} above {}", estimated, config.max_tx_weight);
        return Err(ResourceLimitError::TransactionTooLarge);
    }
    Ok(())
}

/// Commits, proves and surjects a single output. Runs on a rayon worker
/// with its own rng.
fn blind_output<C: Signing>(
    secp: &Secp256k1<C>,
    job: &OutputJob,
    script_pubkey: &bitcoin::Script,
    domain: &[SurjectionInput],
) -> Result<TxOut, BlindError> {
    let mut rng = ChaCha20Rng::from_seed(job.seed);
    let secrets = job.secrets;
    trace!("blinding output {}", job.index);

    let (nonce, shared_secret) = Nonce::new_confidential(&mut rng, secp, &job.receiver)?;
    let asset = Asset::new_confidential(secp, secrets.asset, secrets.asset_bf);
    let gen = secrets.asset_generator(secp);
    let value = Value::new_confidential(secp, secrets.value, gen, secrets.value_bf);
    let commitment = value.commitment().ok_or(BlindError::InvalidOutput(job.index))?;
    let msg = RangeProofMessage {
        asset: secrets.asset,
        bf: secrets.asset_bf,
    };
    let rangeproof = rangeproof::prove(
        secp,
        commitment,
        secrets.value,
        secrets.value_bf,
        &msg,
        script_pubkey,
        shared_secret,
        gen,
    )?;
    let surjection_proof = surjection::prove(&mut rng, secp, secrets.asset, secrets.asset_bf, domain)
        .map_err(|e| match e {
            SurjectionError::TooManyAssets => {
                BlindError::ResourceLimit(ResourceLimitError::TooManyAssets)
            }
            SurjectionError::NoMatchingInput(a) => BlindError::SurjectionInputMissing(job.index, a),
            SurjectionError::NullInputAsset(_) => BlindError::InvalidOutput(job.index),
            SurjectionError::Upstream(e) => BlindError::Upstream(e),
        })?;

    Ok(TxOut {
        asset,
        value,
        nonce,
        script_pubkey: script_pubkey.to_owned(),
        witness: TxOutWitness {
            surjection_proof: Some(Box::new(surjection_proof)),
            rangeproof: Some(Box::new(rangeproof)),
        },
    })
}

/// Blinds a transaction with explicitly supplied input secrets and no
/// wallet behind it. Never adds a balancing output: a transaction with
/// nothing to blind that does not balance fails with
/// [`BlindError::Unbalanceable`], and a single output blinded against
/// explicit inputs fails with [`BlindError::LoneBlindedOutput`].
pub fn raw_blind_transaction<R, C>(
    rng: &mut R,
    secp: &Secp256k1<C>,
    tx: &Transaction,
    inputs: &BlindingInputs,
    config: &BlinderConfig,
) -> Result<(Transaction, BlindReport), BlindError>
where
    R: RngCore + CryptoRng,
    C: Signing + Verification,
{
    let inputs = BlindingInputs {
        balancing_pubkey: None,
        ..inputs.clone()
    };
    let mut tx = tx.clone();
    let report = tx.blind(rng, secp, &inputs, config)?;
    Ok((tx, report))
}
