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

//! # Transactions
//!
//! Elements transactions, with the issuance data carried by inputs and the
//! confidential asset, value and nonce carried by outputs.
//!

use std::{fmt, io, str};

use bitcoin::hashes::{sha256, Hash};
use bitcoin::opcodes::all::OP_RETURN;
use bitcoin::{Script, ScriptBuf};
use secp256k1_zkp::{RangeProof, SurjectionProof, Tweak, ZERO_TWEAK};

use crate::confidential;
use crate::encode::{self, impl_vec, Decodable, Encodable, VarInt};
use crate::hash_types::Txid;
use crate::issuance::{AssetId, ContractHash};

/// Scripts longer than this are unspendable by consensus.
const MAX_SCRIPT_SIZE: usize = 10_000;

/// A reference to a transaction output
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct OutPoint {
    /// The referenced transaction's txid
    pub txid: Txid,
    /// The index of the referenced output in its transaction's vout
    pub vout: u32,
}

impl OutPoint {
    /// Create a new outpoint.
    pub fn new(txid: Txid, vout: u32) -> OutPoint {
        OutPoint { txid, vout }
    }

    /// The outpoint of a coinbase input
    pub fn null() -> OutPoint {
        OutPoint {
            txid: Txid::all_zeros(),
            vout: u32::MAX,
        }
    }

    /// Whether this is the null outpoint
    pub fn is_null(&self) -> bool {
        *self == OutPoint::null()
    }
}

impl Default for OutPoint {
    fn default() -> Self {
        OutPoint::null()
    }
}

impl Encodable for OutPoint {
    fn consensus_encode<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        Ok(self.txid.consensus_encode(&mut w)? + self.vout.consensus_encode(&mut w)?)
    }
}

impl Decodable for OutPoint {
    fn consensus_decode<R: io::Read>(mut r: R) -> Result<OutPoint, encode::Error> {
        let txid = Txid::consensus_decode(&mut r)?;
        let vout = u32::consensus_decode(&mut r)?;
        Ok(OutPoint { txid, vout })
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl str::FromStr for OutPoint {
    type Err = encode::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ':');
        let txid = parts
            .next()
            .and_then(|t| t.parse::<Txid>().ok())
            .ok_or(encode::Error::ParseFailed("invalid txid in outpoint"))?;
        let vout = parts
            .next()
            .and_then(|v| v.parse::<u32>().ok())
            .ok_or(encode::Error::ParseFailed("invalid vout in outpoint"))?;
        Ok(OutPoint { txid, vout })
    }
}

/// Issuance data attached to an input
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct AssetIssuance {
    /// Zero for a new asset issuance; otherwise the asset blinding factor
    /// of the reissuance token being spent
    pub asset_blinding_nonce: Tweak,
    /// Freeform entropy field. Holds the contract hash for a new issuance,
    /// and the original asset entropy for a reissuance
    pub asset_entropy: [u8; 32],
    /// Amount of asset to issue
    pub amount: confidential::Value,
    /// Amount of inflation keys to issue
    pub inflation_keys: confidential::Value,
}

impl AssetIssuance {
    /// Checks whether the [`AssetIssuance`] is null
    pub fn is_null(&self) -> bool {
        self.amount.is_null() && self.inflation_keys.is_null()
    }

    /// Issuance data for a brand new asset.
    pub fn new_issuance(contract_hash: ContractHash, amount: u64, token_amount: u64) -> Self {
        let explicit_or_null = |v: u64| {
            if v == 0 {
                confidential::Value::Null
            } else {
                confidential::Value::Explicit(v)
            }
        };
        AssetIssuance {
            asset_blinding_nonce: ZERO_TWEAK,
            asset_entropy: contract_hash.to_byte_array(),
            amount: explicit_or_null(amount),
            inflation_keys: explicit_or_null(token_amount),
        }
    }

    /// Issuance data for a reissuance of an existing asset. `token_abf` is
    /// the asset blinding factor of the token output being spent.
    pub fn new_reissuance(
        entropy: sha256::Midstate,
        token_abf: confidential::AssetBlindingFactor,
        amount: u64,
    ) -> Self {
        AssetIssuance {
            asset_blinding_nonce: token_abf.into_inner(),
            asset_entropy: entropy.to_byte_array(),
            amount: confidential::Value::Explicit(amount),
            inflation_keys: confidential::Value::Null,
        }
    }
}

impl Default for AssetIssuance {
    fn default() -> Self {
        AssetIssuance {
            asset_blinding_nonce: ZERO_TWEAK,
            asset_entropy: [0; 32],
            amount: confidential::Value::Null,
            inflation_keys: confidential::Value::Null,
        }
    }
}

impl Encodable for AssetIssuance {
    fn consensus_encode<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        let mut nonce = [0u8; 32];
        nonce.copy_from_slice(self.asset_blinding_nonce.as_ref());
        Ok(nonce.consensus_encode(&mut w)?
            + self.asset_entropy.consensus_encode(&mut w)?
            + self.amount.consensus_encode(&mut w)?
            + self.inflation_keys.consensus_encode(&mut w)?)
    }
}

impl Decodable for AssetIssuance {
    fn consensus_decode<R: io::Read>(mut r: R) -> Result<AssetIssuance, encode::Error> {
        let nonce = <[u8; 32]>::consensus_decode(&mut r)?;
        Ok(AssetIssuance {
            asset_blinding_nonce: Tweak::from_slice(&nonce)?,
            asset_entropy: Decodable::consensus_decode(&mut r)?,
            amount: Decodable::consensus_decode(&mut r)?,
            inflation_keys: Decodable::consensus_decode(&mut r)?,
        })
    }
}

/// Transaction input witness
#[derive(Clone, Default, PartialEq, Eq, Debug, Hash)]
pub struct TxInWitness {
    /// Amount rangeproof
    pub amount_rangeproof: Option<Box<RangeProof>>,
    /// Rangeproof for inflation keys
    pub inflation_keys_rangeproof: Option<Box<RangeProof>>,
    /// Traditional script witness
    pub script_witness: Vec<Vec<u8>>,
}

impl TxInWitness {
    /// Whether this witness is null
    pub fn is_empty(&self) -> bool {
        self.amount_rangeproof.is_none()
            && self.inflation_keys_rangeproof.is_none()
            && self.script_witness.is_empty()
    }
}

impl Encodable for TxInWitness {
    fn consensus_encode<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        Ok(self.amount_rangeproof.consensus_encode(&mut w)?
            + self.inflation_keys_rangeproof.consensus_encode(&mut w)?
            + self.script_witness.consensus_encode(&mut w)?
            // empty peg-in witness
            + VarInt(0).consensus_encode(&mut w)?)
    }
}

impl Decodable for TxInWitness {
    fn consensus_decode<R: io::Read>(mut r: R) -> Result<TxInWitness, encode::Error> {
        let witness = TxInWitness {
            amount_rangeproof: Decodable::consensus_decode(&mut r)?,
            inflation_keys_rangeproof: Decodable::consensus_decode(&mut r)?,
            script_witness: Decodable::consensus_decode(&mut r)?,
        };
        let pegin_witness: Vec<Vec<u8>> = Decodable::consensus_decode(&mut r)?;
        if !pegin_witness.is_empty() {
            return Err(encode::Error::ParseFailed("peg-in witnesses are not supported"));
        }
        Ok(witness)
    }
}

/// A transaction input, which defines old coins to be consumed
#[derive(Clone, Default, PartialEq, Eq, Debug, Hash)]
pub struct TxIn {
    /// The reference to the previous output that is being used an an input
    pub previous_output: OutPoint,
    /// The script which pushes values on the stack which will cause
    /// the referenced output's script to accept
    pub script_sig: ScriptBuf,
    /// The sequence number, which suggests to miners which of two
    /// conflicting transactions should be preferred, or 0xFFFFFFFF
    /// to ignore this feature. This is generally never used since
    /// the miner behaviour cannot be enforced.
    pub sequence: u32,
    /// Asset issuance data
    pub asset_issuance: AssetIssuance,
    /// Witness data - not deserialized/serialized as part of a `TxIn` object
    /// (rather as part of its containing transaction, if any) but is logically
    /// part of the txin.
    pub witness: TxInWitness,
}

impl TxIn {
    /// An input spending `previous_output` with an empty script and final sequence.
    pub fn new(previous_output: OutPoint) -> TxIn {
        TxIn {
            previous_output,
            script_sig: ScriptBuf::new(),
            sequence: 0xFFFF_FFFE,
            asset_issuance: AssetIssuance::default(),
            witness: TxInWitness::default(),
        }
    }

    /// Whether the input carries an issuance or reissuance
    pub fn has_issuance(&self) -> bool {
        !self.asset_issuance.is_null()
    }

    /// Whether the issuance on this input reissues an existing asset
    pub fn is_reissuance(&self) -> bool {
        self.has_issuance() && self.asset_issuance.asset_blinding_nonce != ZERO_TWEAK
    }

    /// The entropy of the asset issued (or reissued) by this input.
    pub fn issuance_entropy(&self) -> sha256::Midstate {
        if self.asset_issuance.asset_blinding_nonce == ZERO_TWEAK {
            let contract_hash = ContractHash::from_byte_array(self.asset_issuance.asset_entropy);
            AssetId::generate_asset_entropy(self.previous_output, contract_hash)
        } else {
            sha256::Midstate::from_byte_array(self.asset_issuance.asset_entropy)
        }
    }

    /// Compute the issuance asset ids from this [`TxIn`]. This function does not check
    /// whether there is an issuance in this input. Returns (asset_id, token_id)
    pub fn issuance_ids(&self) -> (AssetId, AssetId) {
        self.issuance_ids_with(self.asset_issuance.amount.is_confidential())
    }

    /// Like [`TxIn::issuance_ids`], but with the token flavour chosen by the
    /// caller: an input whose amount is about to be blinded already names
    /// the confidential token.
    pub fn issuance_ids_with(&self, confidential: bool) -> (AssetId, AssetId) {
        let entropy = self.issuance_entropy();
        (
            AssetId::from_entropy(entropy),
            AssetId::reissuance_token_from_entropy(entropy, confidential),
        )
    }
}

const ISSUANCE_FLAG: u32 = 1 << 31;
const PEGIN_FLAG: u32 = 1 << 30;

impl Encodable for TxIn {
    fn consensus_encode<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        let mut ret = 0;
        let mut vout = self.previous_output.vout;
        if self.has_issuance() {
            vout |= ISSUANCE_FLAG;
        }
        ret += self.previous_output.txid.consensus_encode(&mut w)?;
        ret += vout.consensus_encode(&mut w)?;
        ret += self.script_sig.consensus_encode(&mut w)?;
        ret += self.sequence.consensus_encode(&mut w)?;
        if self.has_issuance() {
            ret += self.asset_issuance.consensus_encode(&mut w)?;
        }
        Ok(ret)
    }
}

impl Decodable for TxIn {
    fn consensus_decode<R: io::Read>(mut r: R) -> Result<TxIn, encode::Error> {
        let mut outp = OutPoint::consensus_decode(&mut r)?;
        let script_sig = ScriptBuf::consensus_decode(&mut r)?;
        let sequence = u32::consensus_decode(&mut r)?;
        let mut has_issuance = false;
        if outp.vout != u32::MAX {
            if outp.vout & PEGIN_FLAG != 0 {
                return Err(encode::Error::ParseFailed("peg-in inputs are not supported"));
            }
            has_issuance = outp.vout & ISSUANCE_FLAG != 0;
            outp.vout &= !(ISSUANCE_FLAG | PEGIN_FLAG);
        }
        let asset_issuance = if has_issuance {
            let issuance = AssetIssuance::consensus_decode(&mut r)?;
            if issuance.is_null() {
                return Err(encode::Error::ParseFailed("superfluous asset issuance"));
            }
            issuance
        } else {
            AssetIssuance::default()
        };
        Ok(TxIn {
            previous_output: outp,
            script_sig,
            sequence,
            asset_issuance,
            witness: TxInWitness::default(),
        })
    }
}

/// Transaction output witness
#[derive(Clone, Default, PartialEq, Eq, Debug, Hash)]
pub struct TxOutWitness {
    /// Surjection proof showing that the asset commitment is legitimate
    pub surjection_proof: Option<Box<SurjectionProof>>,
    /// Rangeproof showing that the value commitment is legitimate
    pub rangeproof: Option<Box<RangeProof>>,
}

impl TxOutWitness {
    /// Whether this witness is null
    pub fn is_empty(&self) -> bool {
        self.surjection_proof.is_none() && self.rangeproof.is_none()
    }
}

impl Encodable for TxOutWitness {
    fn consensus_encode<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        Ok(self.surjection_proof.consensus_encode(&mut w)?
            + self.rangeproof.consensus_encode(&mut w)?)
    }
}

impl Decodable for TxOutWitness {
    fn consensus_decode<R: io::Read>(mut r: R) -> Result<TxOutWitness, encode::Error> {
        Ok(TxOutWitness {
            surjection_proof: Decodable::consensus_decode(&mut r)?,
            rangeproof: Decodable::consensus_decode(&mut r)?,
        })
    }
}

/// Transaction output
#[derive(Clone, Default, PartialEq, Eq, Debug, Hash)]
pub struct TxOut {
    /// Committed asset
    pub asset: confidential::Asset,
    /// Committed amount
    pub value: confidential::Value,
    /// Nonce (ECDH key passed to recipient). Before blinding, holds the
    /// recipient's blinding public key.
    pub nonce: confidential::Nonce,
    /// Scriptpubkey
    pub script_pubkey: ScriptBuf,
    /// Witness data - not deserialized/serialized as part of a `TxIn` object
    /// (rather as part of its containing transaction, if any) but is logically
    /// part of the txin.
    pub witness: TxOutWitness,
}

impl TxOut {
    /// Create a new fee output.
    pub fn new_fee(amount: u64, asset: AssetId) -> TxOut {
        TxOut {
            asset: confidential::Asset::Explicit(asset),
            value: confidential::Value::Explicit(amount),
            nonce: confidential::Nonce::Null,
            script_pubkey: ScriptBuf::new(),
            witness: TxOutWitness::default(),
        }
    }

    /// An explicit output which no one can spend, destroying `amount` of `asset`.
    pub fn new_burn(amount: u64, asset: AssetId) -> TxOut {
        TxOut {
            asset: confidential::Asset::Explicit(asset),
            value: confidential::Value::Explicit(amount),
            nonce: confidential::Nonce::Null,
            script_pubkey: op_return_script(),
            witness: TxOutWitness::default(),
        }
    }

    /// An explicit output which the blinder will turn confidential, since
    /// it carries the receiver's blinding key in its nonce.
    pub fn new_to_blind(
        amount: u64,
        asset: AssetId,
        script_pubkey: ScriptBuf,
        blinding_pubkey: secp256k1_zkp::PublicKey,
    ) -> TxOut {
        TxOut {
            asset: confidential::Asset::Explicit(asset),
            value: confidential::Value::Explicit(amount),
            nonce: confidential::Nonce::Confidential(blinding_pubkey),
            script_pubkey,
            witness: TxOutWitness::default(),
        }
    }

    /// Whether or not this output is a fee output
    pub fn is_fee(&self) -> bool {
        self.script_pubkey.is_empty() && self.value.is_explicit() && self.asset.is_explicit()
    }

    /// Whether the output can never be spent, so that a zero amount is allowed.
    pub fn is_provably_unspendable(&self) -> bool {
        is_unspendable(&self.script_pubkey)
    }
}

/// An `OP_RETURN` script with no payload.
pub(crate) fn op_return_script() -> ScriptBuf {
    ScriptBuf::builder().push_opcode(OP_RETURN).into_script()
}

pub(crate) fn is_unspendable(script: &Script) -> bool {
    script.is_op_return() || script.len() > MAX_SCRIPT_SIZE
}

impl Encodable for TxOut {
    fn consensus_encode<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        Ok(self.asset.consensus_encode(&mut w)?
            + self.value.consensus_encode(&mut w)?
            + self.nonce.consensus_encode(&mut w)?
            + self.script_pubkey.consensus_encode(&mut w)?)
    }
}

impl Decodable for TxOut {
    fn consensus_decode<R: io::Read>(mut r: R) -> Result<TxOut, encode::Error> {
        Ok(TxOut {
            asset: Decodable::consensus_decode(&mut r)?,
            value: Decodable::consensus_decode(&mut r)?,
            nonce: Decodable::consensus_decode(&mut r)?,
            script_pubkey: Decodable::consensus_decode(&mut r)?,
            witness: TxOutWitness::default(),
        })
    }
}

impl_vec!(TxIn);
impl_vec!(TxOut);

/// Elements transaction
#[derive(Clone, Default, PartialEq, Eq, Debug, Hash)]
pub struct Transaction {
    /// Transaction version field (should always be 2)
    pub version: u32,
    /// Transaction locktime
    pub lock_time: u32,
    /// Vector of inputs
    pub input: Vec<TxIn>,
    /// Vector of outputs
    pub output: Vec<TxOut>,
}

impl Transaction {
    /// An empty version-2 transaction.
    pub fn new() -> Transaction {
        Transaction {
            version: 2,
            lock_time: 0,
            input: vec![],
            output: vec![],
        }
    }

    /// Whether the transaction has any non-null witness data
    pub fn has_witness(&self) -> bool {
        self.input.iter().any(|i| !i.witness.is_empty())
            || self.output.iter().any(|o| !o.witness.is_empty())
    }

    /// Size of the transaction without witness data
    pub fn base_size(&self) -> usize {
        self.scaled_size(false)
    }

    /// Full serialized size of the transaction
    pub fn total_size(&self) -> usize {
        self.scaled_size(true)
    }

    /// Get the "weight" of this transaction; roughly equivalent to BIP141, in that witness
    /// data is counted as 1 while non-witness data is counted as 4.
    pub fn weight(&self) -> usize {
        self.base_size() * 3 + self.total_size()
    }

    /// Gets the "virtual size" (vsize) of this transaction.
    pub fn vsize(&self) -> usize {
        (self.weight() + 3) / 4
    }

    fn scaled_size(&self, with_witness: bool) -> usize {
        let mut sink = io::sink();
        let mut size = 0;
        // Writing into a sink cannot fail.
        if with_witness {
            size += self.consensus_encode(&mut sink).unwrap_or(0);
        } else {
            size += self.encode_base(&mut sink).unwrap_or(0);
        }
        size
    }

    fn encode_base<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        let mut ret = 0;
        ret += self.version.consensus_encode(&mut w)?;
        ret += 0u8.consensus_encode(&mut w)?;
        ret += self.input.consensus_encode(&mut w)?;
        ret += self.output.consensus_encode(&mut w)?;
        ret += self.lock_time.consensus_encode(&mut w)?;
        Ok(ret)
    }

    /// The txid of the transaction. Witness data (and hence all proofs and
    /// signatures) is not committed to.
    pub fn txid(&self) -> Txid {
        let mut enc = Txid::engine();
        // Writing into a hash engine cannot fail.
        let _ = self.encode_base(&mut enc);
        Txid::from_engine(enc)
    }
}

impl Encodable for Transaction {
    fn consensus_encode<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        if !self.has_witness() {
            return self.encode_base(w);
        }
        let mut ret = 0;
        ret += self.version.consensus_encode(&mut w)?;
        ret += 1u8.consensus_encode(&mut w)?;
        ret += self.input.consensus_encode(&mut w)?;
        ret += self.output.consensus_encode(&mut w)?;
        ret += self.lock_time.consensus_encode(&mut w)?;
        for input in &self.input {
            ret += input.witness.consensus_encode(&mut w)?;
        }
        for output in &self.output {
            ret += output.witness.consensus_encode(&mut w)?;
        }
        Ok(ret)
    }
}

impl Decodable for Transaction {
    fn consensus_decode<R: io::Read>(mut r: R) -> Result<Transaction, encode::Error> {
        let version = u32::consensus_decode(&mut r)?;
        let wit_flag = u8::consensus_decode(&mut r)?;
        let mut input = Vec::<TxIn>::consensus_decode(&mut r)?;
        let mut output = Vec::<TxOut>::consensus_decode(&mut r)?;
        let lock_time = u32::consensus_decode(&mut r)?;

        match wit_flag {
            0 => {}
            1 => {
                for i in &mut input {
                    i.witness = Decodable::consensus_decode(&mut r)?;
                }
                for o in &mut output {
                    o.witness = Decodable::consensus_decode(&mut r)?;
                }
                if input.iter().all(|i| i.witness.is_empty())
                    && output.iter().all(|o| o.witness.is_empty())
                {
                    return Err(encode::Error::ParseFailed(
                        "witness flag set but no witnesses were given",
                    ));
                }
            }
            _ => return Err(encode::Error::ParseFailed("bad witness flag in tx")),
        }

        Ok(Transaction {
            version,
            lock_time,
            input,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{deserialize, serialize};
    use std::str::FromStr;

    fn sample_tx() -> Transaction {
        let prev = OutPoint::from_str(
            "05a047c98e82a848dee94efcf32462b065198bebf2404d201ba2e06db30b28f4:1",
        )
        .unwrap();
        let mut tx = Transaction::new();
        let mut txin = TxIn::new(prev);
        txin.asset_issuance = AssetIssuance::new_issuance(ContractHash::all_zeros(), 500, 1);
        tx.input.push(txin);
        tx.output.push(TxOut::new_burn(100, AssetId::ELEMENTS_REGTEST_BTC));
        tx.output.push(TxOut::new_fee(400, AssetId::ELEMENTS_REGTEST_BTC));
        tx
    }

    #[test]
    fn outpoint_display_parse() {
        let s = "05a047c98e82a848dee94efcf32462b065198bebf2404d201ba2e06db30b28f4:7";
        let outp = OutPoint::from_str(s).unwrap();
        assert_eq!(outp.vout, 7);
        assert_eq!(outp.to_string(), s);
        assert!(OutPoint::from_str("xyz:1").is_err());
        assert!(OutPoint::from_str("05a047c98e82a848dee94efcf32462b065198bebf2404d201ba2e06db30b28f4").is_err());
        assert!(OutPoint::null().is_null());
    }

    #[test]
    fn transaction_roundtrip() {
        let tx = sample_tx();
        assert!(!tx.has_witness());
        let bytes = serialize(&tx);
        assert_eq!(bytes.len(), tx.total_size());
        assert_eq!(tx.base_size(), tx.total_size());
        assert_eq!(tx.weight(), 4 * tx.base_size());

        let back: Transaction = deserialize(&bytes).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.txid(), tx.txid());
        assert!(back.input[0].has_issuance());
        assert!(!back.input[0].is_reissuance());
    }

    #[test]
    fn issuance_flag_is_stripped() {
        let tx = sample_tx();
        let bytes = serialize(&tx);
        // version (4) + flag (1) + input count (1) + txid (32), then the vout
        let vout = u32::from_le_bytes([bytes[38], bytes[39], bytes[40], bytes[41]]);
        assert_eq!(vout, 1 | ISSUANCE_FLAG);
        let back: Transaction = deserialize(&bytes).unwrap();
        assert_eq!(back.input[0].previous_output.vout, 1);
    }

    #[test]
    fn fee_and_burn_outputs() {
        let fee = TxOut::new_fee(10, AssetId::LIQUID_BTC);
        assert!(fee.is_fee());
        assert!(!fee.is_provably_unspendable());
        let burn = TxOut::new_burn(10, AssetId::LIQUID_BTC);
        assert!(!burn.is_fee());
        assert!(burn.is_provably_unspendable());
    }

    #[test]
    fn issuance_ids_follow_blinding() {
        let tx = sample_tx();
        let (asset, token) = tx.input[0].issuance_ids();
        let (conf_asset, conf_token) = tx.input[0].issuance_ids_with(true);
        assert_eq!(asset, conf_asset);
        assert_ne!(token, conf_token);
        let entropy = tx.input[0].issuance_entropy();
        assert_eq!(asset, AssetId::from_entropy(entropy));

        // A reissuance carries the entropy itself.
        let abf = confidential::AssetBlindingFactor::from_slice(&[1; 32]).unwrap();
        let mut reissue = TxIn::new(OutPoint::new(tx.txid(), 0));
        reissue.asset_issuance = AssetIssuance::new_reissuance(entropy, abf, 10);
        assert!(reissue.is_reissuance());
        assert_eq!(reissue.issuance_ids().0, asset);
    }

    #[test]
    fn witness_flag_without_witness_rejected() {
        let mut bytes = serialize(&sample_tx());
        bytes[4] = 1;
        // one input witness and two output witnesses, all empty
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(deserialize::<Transaction>(&bytes).is_err());
    }
}
