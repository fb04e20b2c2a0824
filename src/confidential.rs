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

//! # Confidential Commitments
//!
//! Structures representing Pedersen commitments of various types, the
//! blinding factors which open them, and the balancing arithmetic which
//! ties the blinding factors of a transaction together.
//!

use std::{fmt, io, str};

use bitcoin::hashes::{sha256d, Hash};
use bitcoin::hex::{DisplayHex, FromHex};
use secp256k1_zkp::{
    self, compute_adaptive_blinding_factor, ecdh,
    rand::{CryptoRng, RngCore},
    CommitmentSecrets, Generator, PedersenCommitment, PublicKey, Secp256k1, SecretKey, Signing,
    Tweak, ZERO_TWEAK,
};

use crate::encode::{self, Decodable, Encodable};
use crate::issuance::AssetId;

/// A CT commitment to an amount
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Value {
    /// No value
    Null,
    /// Value is explicitly encoded
    Explicit(u64),
    /// Value is committed
    Confidential(PedersenCommitment),
}

impl Value {
    /// Create value commitment.
    pub fn new_confidential<C: Signing>(
        secp: &Secp256k1<C>,
        value: u64,
        asset: Generator,
        bf: ValueBlindingFactor,
    ) -> Self {
        Value::Confidential(PedersenCommitment::new(secp, value, bf.0, asset))
    }

    /// Serialized length, in bytes
    pub fn encoded_length(&self) -> usize {
        match *self {
            Value::Null => 1,
            Value::Explicit(..) => 9,
            Value::Confidential(..) => 33,
        }
    }

    /// Check if the object is null.
    pub fn is_null(&self) -> bool {
        matches!(*self, Value::Null)
    }

    /// Check if the object is explicit.
    pub fn is_explicit(&self) -> bool {
        matches!(*self, Value::Explicit(_))
    }

    /// Check if the object is confidential.
    pub fn is_confidential(&self) -> bool {
        matches!(*self, Value::Confidential(_))
    }

    /// Returns the explicit inner value.
    /// Returns [None] if [`Value::is_explicit`] returns false.
    pub fn explicit(&self) -> Option<u64> {
        match *self {
            Value::Explicit(i) => Some(i),
            _ => None,
        }
    }

    /// Returns the confidential commitment in case of a confidential value.
    /// Returns [None] if [`Value::is_confidential`] returns false.
    pub fn commitment(&self) -> Option<PedersenCommitment> {
        match *self {
            Value::Confidential(i) => Some(i),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Null => f.write_str("null"),
            Value::Explicit(n) => write!(f, "{}", n),
            Value::Confidential(commitment) => f.write_str(&commitment.serialize().to_lower_hex_string()),
        }
    }
}

impl Encodable for Value {
    fn consensus_encode<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        match *self {
            Value::Null => 0u8.consensus_encode(w),
            Value::Explicit(n) => {
                1u8.consensus_encode(&mut w)?;
                // Explicit amounts are big-endian on the wire.
                w.write_all(&n.to_be_bytes())?;
                Ok(9)
            }
            Value::Confidential(commitment) => {
                w.write_all(&commitment.serialize())?;
                Ok(33)
            }
        }
    }
}

impl Decodable for Value {
    fn consensus_decode<R: io::Read>(mut r: R) -> Result<Value, encode::Error> {
        let prefix = u8::consensus_decode(&mut r)?;
        match prefix {
            0 => Ok(Value::Null),
            1 => {
                let mut bytes = [0u8; 8];
                r.read_exact(&mut bytes)?;
                Ok(Value::Explicit(u64::from_be_bytes(bytes)))
            }
            p if p == 0x08 || p == 0x09 => {
                let mut comm = [0u8; 33];
                comm[0] = p;
                r.read_exact(&mut comm[1..])?;
                Ok(Value::Confidential(PedersenCommitment::from_slice(&comm)?))
            }
            p => Err(encode::Error::InvalidConfidentialPrefix(p)),
        }
    }
}

/// A CT commitment to an asset
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Asset {
    /// No value
    Null,
    /// Asset entropy is explicitly encoded
    Explicit(AssetId),
    /// Asset is committed
    Confidential(Generator),
}

impl Asset {
    /// Create asset commitment.
    pub fn new_confidential<C: Signing>(
        secp: &Secp256k1<C>,
        asset: AssetId,
        bf: AssetBlindingFactor,
    ) -> Self {
        Asset::Confidential(Generator::new_blinded(secp, asset.into_tag(), bf.0))
    }

    /// Serialized length, in bytes
    pub fn encoded_length(&self) -> usize {
        match *self {
            Asset::Null => 1,
            Asset::Explicit(..) => 33,
            Asset::Confidential(..) => 33,
        }
    }

    /// Check if the object is null.
    pub fn is_null(&self) -> bool {
        matches!(*self, Asset::Null)
    }

    /// Check if the object is explicit.
    pub fn is_explicit(&self) -> bool {
        matches!(*self, Asset::Explicit(_))
    }

    /// Check if the object is confidential.
    pub fn is_confidential(&self) -> bool {
        matches!(*self, Asset::Confidential(_))
    }

    /// Returns the explicit inner value.
    /// Returns [None] if [`Asset::is_explicit`] returns false.
    pub fn explicit(&self) -> Option<AssetId> {
        match *self {
            Asset::Explicit(i) => Some(i),
            _ => None,
        }
    }

    /// Returns the confidential commitment in case of a confidential value.
    /// Returns [None] if [`Asset::is_confidential`] returns false.
    pub fn commitment(&self) -> Option<Generator> {
        match *self {
            Asset::Confidential(i) => Some(i),
            _ => None,
        }
    }

    /// Internally used function for getting the generator from asset
    /// Used in the amount verification check
    /// Returns [`None`] is the asset is [`Asset::Null`]
    /// Converts a explicit asset into a generator and returns the confidential
    /// generator as is.
    pub fn into_asset_gen<C: Signing>(self, secp: &Secp256k1<C>) -> Option<Generator> {
        match self {
            // Only error is Null error which is dealt with later
            // when we have more context information about it.
            Asset::Null => None,
            Asset::Explicit(x) => Some(Generator::new_unblinded(secp, x.into_tag())),
            Asset::Confidential(gen) => Some(gen),
        }
    }
}

impl Default for Asset {
    fn default() -> Self {
        Asset::Null
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Asset::Null => f.write_str("null"),
            Asset::Explicit(n) => write!(f, "{}", n),
            Asset::Confidential(generator) => f.write_str(&generator.serialize().to_lower_hex_string()),
        }
    }
}

impl Encodable for Asset {
    fn consensus_encode<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        match *self {
            Asset::Null => 0u8.consensus_encode(w),
            Asset::Explicit(n) => {
                1u8.consensus_encode(&mut w)?;
                Ok(1 + n.consensus_encode(&mut w)?)
            }
            Asset::Confidential(generator) => {
                w.write_all(&generator.serialize())?;
                Ok(33)
            }
        }
    }
}

impl Decodable for Asset {
    fn consensus_decode<R: io::Read>(mut r: R) -> Result<Self, encode::Error> {
        let prefix = u8::consensus_decode(&mut r)?;
        match prefix {
            0 => Ok(Asset::Null),
            1 => Ok(Asset::Explicit(AssetId::consensus_decode(&mut r)?)),
            p if p == 0x0a || p == 0x0b => {
                let mut comm = [0u8; 33];
                comm[0] = p;
                r.read_exact(&mut comm[1..])?;
                Ok(Asset::Confidential(Generator::from_slice(&comm)?))
            }
            p => Err(encode::Error::InvalidConfidentialPrefix(p)),
        }
    }
}

/// A CT commitment to an output nonce (i.e. a public key)
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Nonce {
    /// No value
    Null,
    /// There should be no such thing as an "explicit nonce", but Elements will deserialize
    /// such a thing (and insists that its size be 32 bytes).
    Explicit([u8; 32]),
    /// Nonce is committed
    Confidential(PublicKey),
}

impl Nonce {
    /// Create the nonce of a new confidential output: a fresh ephemeral key
    /// whose public half goes on chain, and the secret shared with the receiver.
    pub fn new_confidential<R: RngCore + CryptoRng, C: Signing>(
        rng: &mut R,
        secp: &Secp256k1<C>,
        receiver_blinding_pk: &PublicKey,
    ) -> Result<(Self, SecretKey), secp256k1_zkp::UpstreamError> {
        let ephemeral_sk = SecretKey::new(rng);
        Self::with_ephemeral_sk(secp, ephemeral_sk, receiver_blinding_pk)
    }

    /// Similar to [Nonce::new_confidential], but with a given `ephemeral_sk`.
    pub fn with_ephemeral_sk<C: Signing>(
        secp: &Secp256k1<C>,
        ephemeral_sk: SecretKey,
        receiver_blinding_pk: &PublicKey,
    ) -> Result<(Self, SecretKey), secp256k1_zkp::UpstreamError> {
        let sender_pk = PublicKey::from_secret_key(secp, &ephemeral_sk);
        let shared_secret = make_shared_secret(receiver_blinding_pk, &ephemeral_sk)?;
        Ok((Nonce::Confidential(sender_pk), shared_secret))
    }

    /// Calculate the shared secret.
    pub fn shared_secret(&self, secret: &SecretKey) -> Option<SecretKey> {
        match self {
            Nonce::Confidential(other) => make_shared_secret(other, secret).ok(),
            _ => None,
        }
    }

    /// Serialized length, in bytes
    pub fn encoded_length(&self) -> usize {
        match *self {
            Nonce::Null => 1,
            Nonce::Explicit(..) => 33,
            Nonce::Confidential(..) => 33,
        }
    }

    /// Check if the object is null.
    pub fn is_null(&self) -> bool {
        matches!(*self, Nonce::Null)
    }

    /// Check if the object is confidential.
    pub fn is_confidential(&self) -> bool {
        matches!(*self, Nonce::Confidential(_))
    }

    /// Returns the confidential commitment in case of a confidential value.
    /// Returns [None] if [`Nonce::is_confidential`] returns false.
    pub fn commitment(&self) -> Option<PublicKey> {
        match *self {
            Nonce::Confidential(i) => Some(i),
            _ => None,
        }
    }
}

/// Shared secret of an ECDH exchange, as used by Elements: the double-SHA256
/// of the compressed shared point.
fn make_shared_secret(
    pk: &PublicKey,
    sk: &SecretKey,
) -> Result<SecretKey, secp256k1_zkp::UpstreamError> {
    let xy = ecdh::shared_secret_point(pk, sk);
    let mut dh_secret = [0u8; 33];
    dh_secret[0] = if xy[63] % 2 == 0 { 0x02 } else { 0x03 };
    dh_secret[1..].copy_from_slice(&xy[0..32]);
    SecretKey::from_slice(&sha256d::Hash::hash(&dh_secret).to_byte_array())
}

impl Default for Nonce {
    fn default() -> Self {
        Nonce::Null
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Nonce::Null => f.write_str("null"),
            Nonce::Explicit(n) => f.write_str(&n.to_lower_hex_string()),
            Nonce::Confidential(pk) => f.write_str(&pk.serialize().to_lower_hex_string()),
        }
    }
}

impl Encodable for Nonce {
    fn consensus_encode<W: io::Write>(&self, mut w: W) -> Result<usize, encode::Error> {
        match *self {
            Nonce::Null => 0u8.consensus_encode(w),
            Nonce::Explicit(n) => {
                1u8.consensus_encode(&mut w)?;
                Ok(1 + n.consensus_encode(&mut w)?)
            }
            Nonce::Confidential(pk) => {
                w.write_all(&pk.serialize())?;
                Ok(33)
            }
        }
    }
}

impl Decodable for Nonce {
    fn consensus_decode<R: io::Read>(mut r: R) -> Result<Self, encode::Error> {
        let prefix = u8::consensus_decode(&mut r)?;
        match prefix {
            0 => Ok(Nonce::Null),
            1 => Ok(Nonce::Explicit(<[u8; 32]>::consensus_decode(&mut r)?)),
            p if p == 0x02 || p == 0x03 => {
                let mut comm = [0u8; 33];
                comm[0] = p;
                r.read_exact(&mut comm[1..])?;
                Ok(Nonce::Confidential(PublicKey::from_slice(&comm)?))
            }
            p => Err(encode::Error::InvalidConfidentialPrefix(p)),
        }
    }
}

/// Blinding factor used for asset commitments.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetBlindingFactor(pub(crate) Tweak);

impl AssetBlindingFactor {
    /// Generate random asset blinding factor.
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        AssetBlindingFactor(Tweak::new(rng))
    }

    /// Create from bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, secp256k1_zkp::Error> {
        Ok(AssetBlindingFactor(Tweak::from_slice(bytes)?))
    }

    /// Returns the inner value.
    pub fn into_inner(self) -> Tweak {
        self.0
    }

    /// Get a unblinded/zero AssetBlinding factor
    pub fn zero() -> Self {
        AssetBlindingFactor(ZERO_TWEAK)
    }

    /// Whether this is the zero factor of an explicit asset.
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_TWEAK
    }
}

/// Blinding factor used for value commitments.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueBlindingFactor(pub(crate) Tweak);

impl ValueBlindingFactor {
    /// Generate random value blinding factor.
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        ValueBlindingFactor(Tweak::new(rng))
    }

    /// Create the value blinding factor of the last output of a transaction.
    ///
    /// `inputs` and `outputs` hold the `(value, abf, vbf)` triples of every
    /// other input and output, explicit ones included with zero factors.
    /// The result makes the sum of input commitments equal the sum of output
    /// commitments once the last output is committed with `value` and `abf`.
    pub fn last<C: Signing>(
        secp: &Secp256k1<C>,
        value: u64,
        abf: AssetBlindingFactor,
        inputs: &[(u64, AssetBlindingFactor, ValueBlindingFactor)],
        outputs: &[(u64, AssetBlindingFactor, ValueBlindingFactor)],
    ) -> Result<Self, ArithmeticError> {
        let set_a = inputs
            .iter()
            .copied()
            .map(|(value, abf, vbf)| CommitmentSecrets::new(value, vbf.0, abf.0))
            .collect::<Vec<_>>();
        let set_b = outputs
            .iter()
            .copied()
            .map(|(value, abf, vbf)| CommitmentSecrets::new(value, vbf.0, abf.0))
            .collect::<Vec<_>>();

        let vbf = compute_adaptive_blinding_factor(secp, value, abf.0, &set_a, &set_b);
        if vbf == ZERO_TWEAK {
            // Every other factor cancels out, e.g. explicit inputs spent to
            // a single output with a zero asset blinder.
            return Err(ArithmeticError::DegenerateBlindingFactor);
        }
        Ok(ValueBlindingFactor(vbf))
    }

    /// Create from bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, secp256k1_zkp::Error> {
        Ok(ValueBlindingFactor(Tweak::from_slice(bytes)?))
    }

    /// Returns the inner value.
    pub fn into_inner(self) -> Tweak {
        self.0
    }

    /// Get a unblinded/zero ValueBlindingFactor
    pub fn zero() -> Self {
        ValueBlindingFactor(ZERO_TWEAK)
    }

    /// Whether this is the zero factor of an explicit value.
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_TWEAK
    }
}

macro_rules! impl_blinding_factor_hex {
    ($name:ident) => {
        // Displayed byte-reversed, like every other 256-bit quantity in Elements.
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                for b in self.0.as_ref().iter().rev() {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }

        impl str::FromStr for $name {
            type Err = encode::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mut slice = <[u8; 32]>::from_hex(s)
                    .map_err(|_| encode::Error::ParseFailed("blinding factor must be 32 hex bytes"))?;
                slice.reverse();
                Ok($name(Tweak::from_slice(&slice)?))
            }
        }

        #[cfg(feature = "serde")]
        impl actual_serde::Serialize for $name {
            fn serialize<S: actual_serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.collect_str(self)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> actual_serde::Deserialize<'de> for $name {
            fn deserialize<D: actual_serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                use actual_serde::de::Error;

                let s = String::deserialize(d)?;
                s.parse().map_err(D::Error::custom)
            }
        }
    };
}

impl_blinding_factor_hex!(AssetBlindingFactor);
impl_blinding_factor_hex!(ValueBlindingFactor);

/// Failure of the blinding-factor arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    /// The balancing blinding factor came out as zero, which would leave the
    /// last output unblinded. Usually caused by reused or malformed secrets.
    DegenerateBlindingFactor,
}

impl fmt::Display for ArithmeticError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ArithmeticError::DegenerateBlindingFactor => {
                f.write_str("balancing value blinding factor is zero")
            }
        }
    }
}

impl std::error::Error for ArithmeticError {}

/// A rangeproof or surjection proof that does not prove what it claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofInvalid {
    /// The rangeproof does not verify against its value commitment.
    RangeProof(secp256k1_zkp::Error),
    /// The surjection proof does not tie the output asset to the inputs.
    SurjectionProof,
    /// A rewound rangeproof message is not an asset id and blinding factor.
    MalformedMessage,
}

impl fmt::Display for ProofInvalid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ProofInvalid::RangeProof(ref e) => write!(f, "invalid rangeproof: {}", e),
            ProofInvalid::SurjectionProof => f.write_str("invalid surjection proof"),
            ProofInvalid::MalformedMessage => f.write_str("malformed rangeproof message"),
        }
    }
}

impl std::error::Error for ProofInvalid {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            ProofInvalid::RangeProof(ref e) => Some(e),
            _ => None,
        }
    }
}

/// Checks that the input commitments sum to the output commitments.
///
/// This is the zero-commitment check of Confidential Transactions: it holds
/// exactly when every asset is conserved and the blinding factors balance.
pub fn verify_balance<C: Signing>(
    secp: &Secp256k1<C>,
    inputs: &[PedersenCommitment],
    outputs: &[PedersenCommitment],
) -> bool {
    secp256k1_zkp::verify_commitments_sum_to_equal(secp, inputs, outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{deserialize, serialize};
    use rand::thread_rng;
    use std::str::FromStr;

    fn asset(n: u8) -> AssetId {
        AssetId::from_slice(&[n; 32]).unwrap()
    }

    #[test]
    fn encode_length() {
        let secp = Secp256k1::new();
        let mut rng = thread_rng();
        let gen = Asset::new_confidential(&secp, asset(1), AssetBlindingFactor::new(&mut rng));
        let comm = Value::new_confidential(
            &secp,
            10,
            gen.commitment().unwrap(),
            ValueBlindingFactor::new(&mut rng),
        );
        let receiver = PublicKey::from_secret_key(&secp, &SecretKey::new(&mut rng));
        let (nonce, _) = Nonce::new_confidential(&mut rng, &secp, &receiver).unwrap();

        for v in &[Value::Null, Value::Explicit(1000), comm] {
            let x = serialize(v);
            assert_eq!(x.len(), v.encoded_length());
            assert_eq!(deserialize::<Value>(&x).unwrap(), *v);
        }
        for a in &[Asset::Null, Asset::Explicit(asset(7)), gen] {
            let x = serialize(a);
            assert_eq!(x.len(), a.encoded_length());
            assert_eq!(deserialize::<Asset>(&x).unwrap(), *a);
        }
        for n in &[Nonce::Null, Nonce::Explicit([3; 32]), nonce] {
            let x = serialize(n);
            assert_eq!(x.len(), n.encoded_length());
            assert_eq!(deserialize::<Nonce>(&x).unwrap(), *n);
        }
    }

    #[test]
    fn explicit_value_is_big_endian() {
        assert_eq!(serialize(&Value::Explicit(1)), vec![1, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn bad_prefix() {
        let mut bytes = vec![0x05];
        bytes.extend_from_slice(&[0; 32]);
        assert!(matches!(
            deserialize::<Value>(&bytes),
            Err(encode::Error::InvalidConfidentialPrefix(0x05))
        ));
        assert!(matches!(
            deserialize::<Asset>(&bytes),
            Err(encode::Error::InvalidConfidentialPrefix(0x05))
        ));
    }

    #[test]
    fn shared_secret_agrees() {
        let secp = Secp256k1::new();
        let mut rng = thread_rng();
        let receiver_sk = SecretKey::new(&mut rng);
        let receiver_pk = PublicKey::from_secret_key(&secp, &receiver_sk);

        let (nonce, sender_secret) = Nonce::new_confidential(&mut rng, &secp, &receiver_pk).unwrap();
        assert_eq!(nonce.shared_secret(&receiver_sk), Some(sender_secret));
        assert_eq!(Nonce::Null.shared_secret(&receiver_sk), None);
    }

    #[test]
    fn last_blinding_factor_balances() {
        let secp = Secp256k1::new();
        let mut rng = thread_rng();
        let a = asset(1);

        let in_abf = AssetBlindingFactor::new(&mut rng);
        let in_vbf = ValueBlindingFactor::new(&mut rng);
        let out_abf_1 = AssetBlindingFactor::new(&mut rng);
        let out_vbf_1 = ValueBlindingFactor::new(&mut rng);
        let out_abf_2 = AssetBlindingFactor::new(&mut rng);

        let inputs = [(100, in_abf, in_vbf)];
        let outputs = [(60, out_abf_1, out_vbf_1)];
        let out_vbf_2 = ValueBlindingFactor::last(&secp, 40, out_abf_2, &inputs, &outputs).unwrap();

        let commit = |v: u64, abf: AssetBlindingFactor, vbf: ValueBlindingFactor| {
            let gen = Asset::new_confidential(&secp, a, abf).commitment().unwrap();
            Value::new_confidential(&secp, v, gen, vbf).commitment().unwrap()
        };
        assert!(verify_balance(
            &secp,
            &[commit(100, in_abf, in_vbf)],
            &[commit(60, out_abf_1, out_vbf_1), commit(40, out_abf_2, out_vbf_2)],
        ));
        // Off by one unit no longer balances.
        assert!(!verify_balance(
            &secp,
            &[commit(100, in_abf, in_vbf)],
            &[commit(60, out_abf_1, out_vbf_1), commit(39, out_abf_2, out_vbf_2)],
        ));
    }

    #[test]
    fn degenerate_last_factor() {
        let secp = Secp256k1::new();
        let zero_abf = AssetBlindingFactor::zero();
        let zero_vbf = ValueBlindingFactor::zero();
        // An explicit input spent to one output with no asset blinder
        // leaves nothing to hide the output with.
        assert_eq!(
            ValueBlindingFactor::last(&secp, 50, zero_abf, &[(50, zero_abf, zero_vbf)], &[]),
            Err(ArithmeticError::DegenerateBlindingFactor)
        );
    }

    #[test]
    fn blinding_factor_hex() {
        let s = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20";
        let abf = AssetBlindingFactor::from_str(s).unwrap();
        assert_eq!(abf.to_string(), s);
        assert_eq!(abf.into_inner().as_ref()[0], 0x20);
        assert!(ValueBlindingFactor::from_str("0102").is_err());
        assert!(AssetBlindingFactor::zero().is_zero());
    }
}
