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

//! # Asset Issuance
//!
//! Asset identifiers and the entropy they are derived from. An issuance
//! commits to the outpoint it spends and an optional contract hash; the
//! resulting entropy names both the issued asset and its reissuance token,
//! and stays fixed for the lifetime of the asset.
//!

use std::array::TryFromSliceError;
use std::convert::TryFrom;
use std::{fmt, io, str};

use bitcoin::hashes::{hash_newtype, sha256, sha256d, Hash, HashEngine};
use bitcoin::hex::{self, FromHex};
use secp256k1_zkp::Tag;

use crate::encode::{self, Decodable, Encodable};
use crate::hash_types::Txid;
use crate::transaction::OutPoint;

/// The zero hash.
const ZERO32: [u8; 32] = [0; 32];
/// The one hash.
const ONE32: [u8; 32] = [
    1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];
/// The two hash.
const TWO32: [u8; 32] = [
    2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

hash_newtype! {
    /// The hash of an asset contract.
    #[hash_newtype(backward)]
    pub struct ContractHash(sha256::Hash);
}

impl ContractHash {
    /// Calculate the contract hash of a JSON contract object.
    ///
    /// Object keys are sorted lexicographically before hashing, so two
    /// encodings of the same contract produce the same hash.
    #[cfg(feature = "json-contract")]
    pub fn from_json_contract(json: &str) -> Result<ContractHash, serde_json::Error> {
        // serde_json's default map is a BTreeMap, which orders keys on re-serialization.
        let ordered: serde_json::Value = serde_json::from_str(json)?;
        let serialized = serde_json::to_string(&ordered)?;
        Ok(ContractHash::hash(serialized.as_bytes()))
    }
}

/// Compute the Elements fast merkle root of the given leaves.
///
/// Internal nodes are a single SHA256 compression of the two children, with
/// no padding and no length suffix. A node without a sibling is carried up
/// to the next level unchanged.
pub fn fast_merkle_root(leaves: &[[u8; 32]]) -> sha256::Midstate {
    if leaves.is_empty() {
        return sha256::Midstate::from_byte_array(ZERO32);
    }
    let mut level: Vec<[u8; 32]> = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match *pair {
                [left, right] => sha256_compress(&left, &right),
                [single] => single,
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
    }
    sha256::Midstate::from_byte_array(level[0])
}

fn sha256_compress(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut engine = sha256::Hash::engine();
    engine.input(left);
    engine.input(right);
    engine.midstate().to_byte_array()
}

/// An issued asset ID.
#[derive(Copy, Clone, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct AssetId(sha256::Midstate);

impl AssetId {
    /// The asset ID for L-BTC, Bitcoin on the Liquid network.
    pub const LIQUID_BTC: AssetId = AssetId(sha256::Midstate([
        0x6d, 0x52, 0x1c, 0x38, 0xec, 0x1e, 0xa1, 0x57, 0x34, 0xae, 0x22, 0xb7, 0xc4, 0x60, 0x64,
        0x41, 0x28, 0x29, 0xc0, 0xd0, 0x57, 0x9f, 0x0a, 0x71, 0x3d, 0x1c, 0x04, 0xed, 0xe9, 0x79,
        0x02, 0x6f,
    ]));

    /// The policy asset of a default `elementsregtest` chain.
    pub const ELEMENTS_REGTEST_BTC: AssetId = AssetId(sha256::Midstate([
        0x23, 0x0f, 0x4f, 0x5d, 0x4b, 0x7c, 0x6f, 0xa8, 0x45, 0x80, 0x6e, 0xe4, 0xf6, 0x77, 0x13,
        0x45, 0x9e, 0x1b, 0x69, 0xe8, 0xe6, 0x0f, 0xce, 0xe2, 0xe4, 0x94, 0x0c, 0x7a, 0x0d, 0x5d,
        0xe1, 0xb2,
    ]));

    /// Create an [AssetId] from its inner type.
    pub const fn from_inner(midstate: sha256::Midstate) -> AssetId {
        AssetId(midstate)
    }

    /// Convert the [AssetId] into its inner type.
    pub fn into_inner(self) -> sha256::Midstate {
        self.0
    }

    /// Copies a byte slice into an AssetId object
    pub fn from_slice(sl: &[u8]) -> Result<AssetId, TryFromSliceError> {
        let bytes = <[u8; 32]>::try_from(sl)?;
        Ok(AssetId(sha256::Midstate::from_byte_array(bytes)))
    }

    /// The raw bytes, in the order they appear on the wire.
    pub fn to_byte_array(self) -> [u8; 32] {
        self.0.to_byte_array()
    }

    /// Generate the asset entropy from the issuance prevout and the contract hash.
    ///
    /// `E = H( H(I) || C )` where `I` is the serialized prevout.
    pub fn generate_asset_entropy(prevout: OutPoint, contract_hash: ContractHash) -> sha256::Midstate {
        let prevout_hash = sha256d::Hash::hash(&encode::serialize(&prevout));
        fast_merkle_root(&[prevout_hash.to_byte_array(), contract_hash.to_byte_array()])
    }

    /// Calculate the asset ID from the asset entropy.
    pub fn from_entropy(entropy: sha256::Midstate) -> AssetId {
        // A = H( E || 0 )
        AssetId(fast_merkle_root(&[entropy.to_byte_array(), ZERO32]))
    }

    /// Calculate the reissuance token asset ID from the asset entropy.
    ///
    /// The token of an issuance whose amount is blinded differs from the
    /// token of an explicit one, so the choice has to be made at issuance.
    pub fn reissuance_token_from_entropy(entropy: sha256::Midstate, confidential: bool) -> AssetId {
        // T = H( E || 1 ) or H( E || 2 )
        let second = if confidential { TWO32 } else { ONE32 };
        AssetId(fast_merkle_root(&[entropy.to_byte_array(), second]))
    }

    /// Convert an asset into [Tag]
    pub fn into_tag(self) -> Tag {
        Tag::from(self.0.to_byte_array())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for b in self.0.to_byte_array().iter().rev() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

impl fmt::LowerHex for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

impl str::FromStr for AssetId {
    type Err = hex::HexToArrayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = <[u8; 32]>::from_hex(s)?;
        bytes.reverse();
        Ok(AssetId(sha256::Midstate::from_byte_array(bytes)))
    }
}

impl Encodable for AssetId {
    fn consensus_encode<W: io::Write>(&self, w: W) -> Result<usize, encode::Error> {
        self.0.to_byte_array().consensus_encode(w)
    }
}

impl Decodable for AssetId {
    fn consensus_decode<R: io::Read>(r: R) -> Result<Self, encode::Error> {
        Ok(AssetId(sha256::Midstate::from_byte_array(<[u8; 32]>::consensus_decode(r)?)))
    }
}

#[cfg(feature = "serde")]
impl actual_serde::Serialize for AssetId {
    fn serialize<S: actual_serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> actual_serde::Deserialize<'de> for AssetId {
    fn deserialize<D: actual_serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        use actual_serde::de::Error;

        let s = String::deserialize(d)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// An issuance amount as seen by one observer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IssuanceAmount {
    /// The amount is explicit, or its blinding key is known.
    Known(u64),
    /// The amount is blinded and cannot be opened with the keys at hand.
    Unknown,
}

impl IssuanceAmount {
    /// The amount, if known.
    pub fn known(self) -> Option<u64> {
        match self {
            IssuanceAmount::Known(v) => Some(v),
            IssuanceAmount::Unknown => None,
        }
    }
}

impl fmt::Display for IssuanceAmount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            IssuanceAmount::Known(v) => write!(f, "{}", v),
            // Matches what elementsd reports for amounts it cannot read.
            IssuanceAmount::Unknown => f.write_str("-1"),
        }
    }
}

/// A single issuance or reissuance event, from the point of view of one wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuanceRecord {
    /// Transaction carrying the issuance
    pub txid: Txid,
    /// Index of the input carrying the issuance
    pub vin: u32,
    /// Entropy shared by the asset and its token
    pub entropy: sha256::Midstate,
    /// Issued asset
    pub asset: AssetId,
    /// Reissuance token, when it can be determined
    pub token: Option<AssetId>,
    /// Amount of `asset` created
    pub asset_amount: IssuanceAmount,
    /// Amount of `token` created
    pub token_amount: IssuanceAmount,
    /// Whether this is a reissuance of an existing asset
    pub is_reissuance: bool,
    /// Whether the issued amounts are blinded on chain
    pub blinded: bool,
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    // Vectors are written the way Elements Core displays midstates, byte-reversed.
    fn midstate_hex(s: &str) -> [u8; 32] {
        let mut bytes = <[u8; 32]>::from_hex(s).unwrap();
        bytes.reverse();
        bytes
    }

    #[test]
    fn fast_merkle_root_vectors() {
        let test_leaves = [
            "b66b041650db0f297b53f8d93c0e8706925bf3323f8c59c14a6fac37bfdcd06f",
            "99cb2fa68b2294ae133550a9f765fc755d71baa7b24389fed67d1ef3e5cb0255",
            "257e1b2fa49dd15724c67bac4df7911d44f6689860aa9f65a881ae0a2f40a303",
            "b67b0b9f093fa83d5e44b707ab962502b7ac58630e556951136196e65483bb80",
        ];

        let test_roots = [
            "0000000000000000000000000000000000000000000000000000000000000000",
            "b66b041650db0f297b53f8d93c0e8706925bf3323f8c59c14a6fac37bfdcd06f",
            "f752938da0cb71c051aabdd5a86658e8d0b7ac00e1c2074202d8d2a79d8a6cf6",
            "245d364a28e9ad20d522c4a25ffc6a7369ab182f884e1c7dcd01aa3d32896bd3",
            "317d6498574b6ca75ee0368ec3faec75e096e245bdd5f36e8726fa693f775dfc",
        ];

        let mut leaves = vec![];
        for i in 0..4 {
            let root = fast_merkle_root(&leaves);
            assert_eq!(root.to_byte_array(), midstate_hex(test_roots[i]), "root #{}", i);
            leaves.push(midstate_hex(test_leaves[i]));
        }
        assert_eq!(fast_merkle_root(&leaves).to_byte_array(), midstate_hex(test_roots[4]));
    }

    #[test]
    fn odd_leaf_carried_up() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let c = [3u8; 32];
        let ab = sha256_compress(&a, &b);
        assert_eq!(fast_merkle_root(&[a, b, c]).to_byte_array(), sha256_compress(&ab, &c));
    }

    #[test]
    fn example_elements_core() {
        // example test data from Elements Core 0.17
        let prevout_str = "05a047c98e82a848dee94efcf32462b065198bebf2404d201ba2e06db30b28f4:0";
        let entropy_hex = "746f447f691323502cad2ef646f932613d37a83aeaa2133185b316648df4b70a";
        let asset_id_hex = "dcd60818d863b5c026c40b2bc3ba6fdaf5018bcc8606c18adf7db4da0bcd8533";
        let token_id_hex = "c1adb114f4f87d33bf9ce90dd4f9ca523dd414d6cd010a7917903e2009689530";

        let contract_hash = ContractHash::from_byte_array(ZERO32);
        let prevout = OutPoint::from_str(prevout_str).unwrap();
        let entropy = AssetId::generate_asset_entropy(prevout, contract_hash);
        assert_eq!(entropy.to_byte_array(), midstate_hex(entropy_hex));

        let asset_id = AssetId::from_entropy(entropy);
        assert_eq!(asset_id.to_string(), asset_id_hex);
        let token_id = AssetId::reissuance_token_from_entropy(entropy, false);
        assert_eq!(token_id.to_string(), token_id_hex);

        // The confidential token is a different asset altogether.
        let conf_token = AssetId::reissuance_token_from_entropy(entropy, true);
        assert_ne!(conf_token, token_id);
        assert_ne!(conf_token, asset_id);
    }

    #[test]
    fn asset_id_parse_roundtrip() {
        let s = "b2e15d0d7a0c94e4e2ce0fe6e8691b9e451377f6e46e8045a86f7c4b5d4f0f23";
        let id = AssetId::from_str(s).unwrap();
        assert_eq!(id, AssetId::ELEMENTS_REGTEST_BTC);
        assert_eq!(id.to_string(), s);
        assert_eq!(
            AssetId::LIQUID_BTC.to_string(),
            "6f0279e9ed041c3d710a9f57d0c02928416460c4b722ae3457a11eec381c526d"
        );
        assert!(AssetId::from_str("00").is_err());
        assert!(AssetId::from_slice(&[0; 31]).is_err());
    }

    #[test]
    fn unknown_amount_sentinel() {
        assert_eq!(IssuanceAmount::Unknown.to_string(), "-1");
        assert_eq!(IssuanceAmount::Known(5).to_string(), "5");
        assert_eq!(IssuanceAmount::Unknown.known(), None);
    }

    #[cfg(feature = "json-contract")]
    #[test]
    fn contract_hash_ignores_key_order() {
        let a = ContractHash::from_json_contract(r#"{"name":"Test","ticker":"TST","precision":8}"#).unwrap();
        let b = ContractHash::from_json_contract(r#"{"precision":8,"ticker":"TST","name":"Test"}"#).unwrap();
        assert_eq!(a, b);
        assert!(ContractHash::from_json_contract("{").is_err());
    }
}
