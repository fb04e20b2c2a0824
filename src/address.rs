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

//! # Addresses
//!
//! Elements addresses: base58 for legacy script types and bech32 for
//! segwit, with the blinded forms carrying the receiver's blinding public
//! key (base58 behind a blinded prefix, blech32 for segwit).
//!

use std::convert::{TryFrom, TryInto};
use std::error;
use std::fmt;
use std::str::FromStr;

use bech32::{Fe32, Hrp};
use bitcoin::base58;
use bitcoin::hashes::{hash160, sha256, Hash};
use bitcoin::{PubkeyHash, Script, ScriptBuf, ScriptHash};
use secp256k1_zkp::PublicKey;

use crate::blech32;

/// Address parsing and encoding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Base58 checksum or character error
    Base58(base58::Error),
    /// Bech32 decoding error
    Bech32(bech32::segwit::DecodeError),
    /// Blech32 decoding error
    Blech32(blech32::Error),
    /// Was unable to parse the address.
    InvalidAddress(String),
    /// A base58 payload of an unexpected length
    InvalidLength(usize),
    /// A base58 version byte which matches no prefix of the network
    InvalidAddressVersion(u8),
    /// Script version must be 0 to 16 inclusive
    InvalidWitnessVersion(u8),
    /// The witness program must be between 2 and 40 bytes in length.
    InvalidWitnessProgramLength(usize),
    /// A v0 witness program must be either of length 20 or 32.
    InvalidSegwitV0ProgramLength(usize),
    /// A v1+ witness program must use b(l)ech32m not b(l)ech32
    InvalidWitnessEncoding,
    /// A v0 witness program must use b(l)ech32 not b(l)ech32m
    InvalidSegwitV0Encoding,
    /// An invalid blinding pubkey was encountered.
    InvalidBlindingPubKey(secp256k1_zkp::UpstreamError),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AddressError::Base58(ref e) => write!(f, "base58 error: {}", e),
            AddressError::Bech32(ref e) => write!(f, "bech32 error: {}", e),
            AddressError::Blech32(ref e) => write!(f, "blech32 error: {}", e),
            AddressError::InvalidAddress(ref a) => {
                write!(f, "was unable to parse the address: {}", a)
            }
            AddressError::InvalidLength(len) => {
                write!(f, "invalid base58 payload length: {}", len)
            }
            AddressError::InvalidAddressVersion(v) => {
                write!(f, "unknown base58 address version: {}", v)
            }
            AddressError::InvalidWitnessVersion(ref wver) => {
                write!(f, "invalid witness script version: {}", wver)
            }
            AddressError::InvalidWitnessProgramLength(ref len) => {
                write!(f, "the witness program must be between 2 and 40 bytes in length, not {}", len)
            }
            AddressError::InvalidSegwitV0ProgramLength(ref len) => {
                write!(f, "a v0 witness program must be length 20 or 32, not {}", len)
            }
            AddressError::InvalidBlindingPubKey(ref e) => {
                write!(f, "an invalid blinding pubkey was encountered: {}", e)
            }
            AddressError::InvalidWitnessEncoding => {
                write!(f, "v1+ witness program must use b(l)ech32m not b(l)ech32")
            }
            AddressError::InvalidSegwitV0Encoding => {
                write!(f, "v0 witness program must use b(l)ech32 not b(l)ech32m")
            }
        }
    }
}

impl error::Error for AddressError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            AddressError::Base58(ref e) => Some(e),
            AddressError::Bech32(ref e) => Some(e),
            AddressError::Blech32(ref e) => Some(e),
            AddressError::InvalidBlindingPubKey(ref e) => Some(e),
            _ => None,
        }
    }
}

#[doc(hidden)]
impl From<base58::Error> for AddressError {
    fn from(e: base58::Error) -> AddressError {
        AddressError::Base58(e)
    }
}

/// The parameters to derive addresses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressParams {
    /// The base58 prefix for p2pkh addresses.
    pub p2pkh_prefix: u8,
    /// The base58 prefix for p2sh addresses.
    pub p2sh_prefix: u8,
    /// The base58 prefix for blinded addresses.
    pub blinded_prefix: u8,
    /// The bech32 HRP for unblinded segwit addresses.
    pub bech_hrp: &'static str,
    /// The bech32 HRP for blinded segwit addresses.
    pub blech_hrp: &'static str,
}

impl AddressParams {
    /// The Liquid network address parameters.
    pub const LIQUID: AddressParams = AddressParams {
        p2pkh_prefix: 57,
        p2sh_prefix: 39,
        blinded_prefix: 12,
        bech_hrp: "ex",
        blech_hrp: "lq",
    };

    /// The default Elements network address parameters.
    pub const ELEMENTS: AddressParams = AddressParams {
        p2pkh_prefix: 235,
        p2sh_prefix: 75,
        blinded_prefix: 4,
        bech_hrp: "ert",
        blech_hrp: "el",
    };

    /// The default liquid testnet network address parameters.
    pub const LIQUID_TESTNET: AddressParams = AddressParams {
        p2pkh_prefix: 36,
        p2sh_prefix: 19,
        blinded_prefix: 23,
        bech_hrp: "tex",
        blech_hrp: "tlq",
    };

    const KNOWN: [&'static AddressParams; 3] = [
        &AddressParams::LIQUID,
        &AddressParams::ELEMENTS,
        &AddressParams::LIQUID_TESTNET,
    ];
}

/// The method used to produce an address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Payload {
    /// pay-to-pkhash address
    PubkeyHash(PubkeyHash),
    /// P2SH address
    ScriptHash(ScriptHash),
    /// Segwit address
    WitnessProgram {
        /// The segwit version.
        version: u8,
        /// The segwit program.
        program: Vec<u8>,
    },
}

/// An Elements address.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    /// the network
    pub params: &'static AddressParams,
    /// the traditional non-confidential payload
    pub payload: Payload,
    /// the blinding pubkey
    pub blinding_pubkey: Option<PublicKey>,
}

impl Address {
    /// Inspect if the address is a blinded address.
    pub fn is_blinded(&self) -> bool {
        self.blinding_pubkey.is_some()
    }

    /// Creates a pay to (compressed) public key hash address from a public key
    pub fn p2pkh(
        pk: &PublicKey,
        blinder: Option<PublicKey>,
        params: &'static AddressParams,
    ) -> Address {
        Address {
            params,
            payload: Payload::PubkeyHash(PubkeyHash::hash(&pk.serialize())),
            blinding_pubkey: blinder,
        }
    }

    /// Creates a pay to script hash P2SH address from a script
    pub fn p2sh(
        script: &Script,
        blinder: Option<PublicKey>,
        params: &'static AddressParams,
    ) -> Address {
        Address {
            params,
            payload: Payload::ScriptHash(ScriptHash::hash(script.as_bytes())),
            blinding_pubkey: blinder,
        }
    }

    /// Create a witness pay to public key address from a public key
    pub fn p2wpkh(
        pk: &PublicKey,
        blinder: Option<PublicKey>,
        params: &'static AddressParams,
    ) -> Address {
        Address {
            params,
            payload: Payload::WitnessProgram {
                version: 0,
                program: hash160::Hash::hash(&pk.serialize()).to_byte_array().to_vec(),
            },
            blinding_pubkey: blinder,
        }
    }

    /// Create a witness pay to script hash address
    pub fn p2wsh(
        script: &Script,
        blinder: Option<PublicKey>,
        params: &'static AddressParams,
    ) -> Address {
        Address {
            params,
            payload: Payload::WitnessProgram {
                version: 0,
                program: sha256::Hash::hash(script.as_bytes()).to_byte_array().to_vec(),
            },
            blinding_pubkey: blinder,
        }
    }

    /// Get an [Address] from an output script.
    pub fn from_script(
        script: &Script,
        blinder: Option<PublicKey>,
        params: &'static AddressParams,
    ) -> Option<Address> {
        let bytes = script.as_bytes();
        let payload = if script.is_p2pkh() {
            Payload::PubkeyHash(PubkeyHash::from_byte_array(bytes[3..23].try_into().ok()?))
        } else if script.is_p2sh() {
            Payload::ScriptHash(ScriptHash::from_byte_array(bytes[2..22].try_into().ok()?))
        } else if let Some(version) = witness_version(bytes) {
            Payload::WitnessProgram {
                version,
                program: bytes[2..].to_vec(),
            }
        } else {
            return None;
        };
        Some(Address {
            params,
            payload,
            blinding_pubkey: blinder,
        })
    }

    /// Generates a script pubkey spending to this address
    pub fn script_pubkey(&self) -> ScriptBuf {
        match self.payload {
            Payload::PubkeyHash(ref hash) => ScriptBuf::new_p2pkh(hash),
            Payload::ScriptHash(ref hash) => ScriptBuf::new_p2sh(hash),
            Payload::WitnessProgram {
                version,
                ref program,
            } => {
                let mut bytes = Vec::with_capacity(2 + program.len());
                bytes.push(if version == 0 { 0 } else { 0x50 + version });
                bytes.push(program.len() as u8);
                bytes.extend_from_slice(program);
                ScriptBuf::from_bytes(bytes)
            }
        }
    }

    /// Convert this address to an unconfidential address.
    pub fn to_unconfidential(&self) -> Address {
        Address {
            params: self.params,
            payload: self.payload.clone(),
            blinding_pubkey: None,
        }
    }

    /// Convert this address to a confidential address with the given blinding pubkey.
    pub fn to_confidential(&self, blinding_pubkey: PublicKey) -> Address {
        Address {
            params: self.params,
            payload: self.payload.clone(),
            blinding_pubkey: Some(blinding_pubkey),
        }
    }

    fn from_bech32(
        s: &str,
        blinded: bool,
        params: &'static AddressParams,
    ) -> Result<Address, AddressError> {
        let (version, data) = if blinded {
            let (_, version, data) = blech32::decode(s).map_err(|e| match e {
                blech32::Error::WrongVariant(0) => AddressError::InvalidSegwitV0Encoding,
                blech32::Error::WrongVariant(_) => AddressError::InvalidWitnessEncoding,
                blech32::Error::InvalidWitnessVersion(v) => AddressError::InvalidWitnessVersion(v),
                e => AddressError::Blech32(e),
            })?;
            (version.to_u8(), data)
        } else {
            let (_, version, program) = bech32::segwit::decode(s).map_err(AddressError::Bech32)?;
            (version.to_u8(), program)
        };

        let (blinding_pubkey, program) = if blinded {
            if data.len() < 33 {
                return Err(AddressError::InvalidWitnessProgramLength(0));
            }
            let pk = PublicKey::from_slice(&data[..33]).map_err(AddressError::InvalidBlindingPubKey)?;
            (Some(pk), data[33..].to_vec())
        } else {
            (None, data)
        };

        if program.len() < 2 || program.len() > 40 {
            return Err(AddressError::InvalidWitnessProgramLength(program.len()));
        }
        if version == 0 && program.len() != 20 && program.len() != 32 {
            return Err(AddressError::InvalidSegwitV0ProgramLength(program.len()));
        }

        Ok(Address {
            params,
            payload: Payload::WitnessProgram {
                version,
                program,
            },
            blinding_pubkey,
        })
    }

    // data.len() should be >= 1 when this method is called
    fn from_base58(data: &[u8], params: &'static AddressParams) -> Result<Address, AddressError> {
        // unblinded: <1: prefix> <20: hash160>
        // blinded: <1: blinded prefix> <1: prefix> <33: blinding pubkey> <20: hash160>
        let (prefix, blinding_pubkey, hash) = if data[0] == params.blinded_prefix {
            if data.len() != 55 {
                return Err(AddressError::InvalidLength(data.len()));
            }
            let pk = PublicKey::from_slice(&data[2..35]).map_err(AddressError::InvalidBlindingPubKey)?;
            (data[1], Some(pk), &data[35..])
        } else {
            if data.len() != 21 {
                return Err(AddressError::InvalidLength(data.len()));
            }
            (data[0], None, &data[1..])
        };

        let mut hash_bytes = [0u8; 20];
        hash_bytes.copy_from_slice(hash);
        let payload = if prefix == params.p2pkh_prefix {
            Payload::PubkeyHash(PubkeyHash::from_byte_array(hash_bytes))
        } else if prefix == params.p2sh_prefix {
            Payload::ScriptHash(ScriptHash::from_byte_array(hash_bytes))
        } else {
            return Err(AddressError::InvalidAddressVersion(prefix));
        };

        Ok(Address {
            params,
            payload,
            blinding_pubkey,
        })
    }

    /// Parse the address using the given parameters.
    /// When using the built-in parameters, you can use [FromStr].
    pub fn parse_with_params(
        s: &str,
        params: &'static AddressParams,
    ) -> Result<Address, AddressError> {
        let prefix = find_prefix(s);
        let b32_ex = match_prefix(prefix, params.bech_hrp);
        let b32_bl = match_prefix(prefix, params.blech_hrp);
        if b32_ex || b32_bl {
            return Address::from_bech32(s, b32_bl, params);
        }

        let data = base58::decode_check(s)?;
        if data.is_empty() {
            return Err(AddressError::InvalidLength(0));
        }
        Address::from_base58(&data, params)
    }
}

/// The witness version of a segwit output script, if it is one.
fn witness_version(script: &[u8]) -> Option<u8> {
    if script.len() < 4 || script.len() > 42 || script[1] as usize != script.len() - 2 {
        return None;
    }
    match script[0] {
        0 => Some(0),
        op @ 0x51..=0x60 => Some(op - 0x50),
        _ => None,
    }
}

impl fmt::Display for Address {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let (prefix, hash) = match self.payload {
            Payload::PubkeyHash(ref hash) => (self.params.p2pkh_prefix, hash.to_byte_array()),
            Payload::ScriptHash(ref hash) => (self.params.p2sh_prefix, hash.to_byte_array()),
            Payload::WitnessProgram {
                version,
                ref program,
            } => {
                let witver = Fe32::try_from(version).map_err(|_| fmt::Error)?;
                return match self.blinding_pubkey {
                    Some(ref blinder) => {
                        let hrp = Hrp::parse(self.params.blech_hrp).map_err(|_| fmt::Error)?;
                        let mut data = Vec::with_capacity(33 + program.len());
                        data.extend_from_slice(&blinder.serialize());
                        data.extend_from_slice(program);
                        fmt.write_str(&blech32::encode(&hrp, witver, &data))
                    }
                    None => {
                        let hrp = Hrp::parse(self.params.bech_hrp).map_err(|_| fmt::Error)?;
                        let s = bech32::segwit::encode(hrp, witver, program).map_err(|_| fmt::Error)?;
                        fmt.write_str(&s)
                    }
                };
            }
        };

        let mut prefixed = Vec::with_capacity(55);
        if let Some(ref blinder) = self.blinding_pubkey {
            prefixed.push(self.params.blinded_prefix);
            prefixed.push(prefix);
            prefixed.extend_from_slice(&blinder.serialize());
        } else {
            prefixed.push(prefix);
        }
        prefixed.extend_from_slice(&hash);
        fmt.write_str(&base58::encode_check(&prefixed))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, fmt)
    }
}

/// Extract the bech32 prefix.
/// Returns the same slice when no prefix is found.
fn find_prefix(bech32: &str) -> &str {
    match bech32.rfind('1') {
        None => bech32,
        Some(sep) => bech32.split_at(sep).0,
    }
}

/// Checks if both prefixes match, regardless of case.
fn match_prefix(prefix_mixed: &str, prefix_lower: &str) -> bool {
    prefix_mixed.eq_ignore_ascii_case(prefix_lower)
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Address, AddressError> {
        let prefix = find_prefix(s);
        for &net in AddressParams::KNOWN.iter() {
            if match_prefix(prefix, net.bech_hrp) {
                return Address::from_bech32(s, false, net);
            }
            if match_prefix(prefix, net.blech_hrp) {
                return Address::from_bech32(s, true, net);
            }
        }

        let data = base58::decode_check(s)?;
        if data.is_empty() {
            return Err(AddressError::InvalidLength(0));
        }
        let p = data[0];
        for &net in AddressParams::KNOWN.iter() {
            if p == net.p2pkh_prefix || p == net.p2sh_prefix || p == net.blinded_prefix {
                return Address::from_base58(&data, net);
            }
        }

        Err(AddressError::InvalidAddress(s.to_owned()))
    }
}

#[cfg(feature = "serde")]
impl<'de> actual_serde::Deserialize<'de> for Address {
    fn deserialize<D: actual_serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = <String as actual_serde::Deserialize>::deserialize(d)?;
        s.parse().map_err(actual_serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl actual_serde::Serialize for Address {
    fn serialize<S: actual_serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use secp256k1_zkp::{Secp256k1, SecretKey};

    fn roundtrips(addr: &Address) {
        assert_eq!(
            Address::from_str(&addr.to_string()).ok().as_ref(),
            Some(addr),
            "string round-trip failed for {}",
            addr,
        );
        assert_eq!(
            Address::from_script(&addr.script_pubkey(), addr.blinding_pubkey, addr.params).as_ref(),
            Some(addr),
            "script round-trip failed for {}",
            addr,
        );
    }

    #[test]
    fn exhaustive() {
        let secp = Secp256k1::new();
        let blinder = PublicKey::from_str(
            "0218845781f631c48f1c9709e23092067d06837f30aa0cd0544ac887fe91ddd166",
        )
        .unwrap();
        let sk = SecretKey::from_slice(&[0x2a; 32]).unwrap();
        let pk = PublicKey::from_secret_key(&secp, &sk);
        let script = ScriptBuf::from_bytes(vec![1u8, 2, 42, 255, 196]);

        for &params in AddressParams::KNOWN.iter() {
            for b in [None, Some(blinder)] {
                roundtrips(&Address::p2pkh(&pk, b, params));
                roundtrips(&Address::p2sh(&script, b, params));
                roundtrips(&Address::p2wpkh(&pk, b, params));
                roundtrips(&Address::p2wsh(&script, b, params));
            }
        }
    }

    #[test]
    fn known_addresses() {
        let addresses = [
            ("2dxmEBXc2qMYcLSKiDBxdEePY3Ytixmnh4E", false, AddressParams::ELEMENTS),
            ("CTEo6VKG8xbe7HnfVW9mQoWTgtgeRSPktwTLbELzGw5tV8Ngzu53EBiasFMQKVbWmKWWTAdN5AUf4M6Y", true, AddressParams::ELEMENTS),
            ("ert1qwhh2n5qypypm0eufahm2pvj8raj9zq5c27cysu", false, AddressParams::ELEMENTS),
            ("el1qq0umk3pez693jrrlxz9ndlkuwne93gdu9g83mhhzuyf46e3mdzfpva0w48gqgzgrklncnm0k5zeyw8my2ypfsmxh4xcjh2rse", true, AddressParams::ELEMENTS),
            ("GqiQRsPEyJLAsEBFB5R34KHuqxDNkG3zur", false, AddressParams::LIQUID),
            ("VJLDwMVWXg8RKq4mRe3YFNTAEykVN6V8x5MRUKKoC3nfRnbpnZeiG3jygMC6A4Gw967GY5EotJ4Rau2F", true, AddressParams::LIQUID),
            ("ex1q7gkeyjut0mrxc3j0kjlt7rmcnvsh0gt45d3fud", false, AddressParams::LIQUID),
            ("lq1qqf8er278e6nyvuwtgf39e6ewvdcnjupn9a86rzpx655y5lhkt0walu3djf9cklkxd3ryld97hu8h3xepw7sh2rlu7q45dcew5", true, AddressParams::LIQUID),
        ];

        for &(a, blinded, ref params) in &addresses {
            let addr: Address = a.parse().unwrap();
            assert_eq!(a, &addr.to_string(), "vector: {}", a);
            assert_eq!(blinded, addr.is_blinded());
            assert_eq!(params, addr.params);
            roundtrips(&addr);
        }
    }

    #[test]
    fn blech32_variant_mismatch() {
        let address: Result<Address, _> = "el1pq0umk3pez693jrrlxz9ndlkuwne93gdu9g83mhhzuyf46e3mdzfpva0w48gqgzgrklncnm0k5zeyw8my2ypfsxguu9nrdg2pc".parse();
        assert_eq!(address.unwrap_err(), AddressError::InvalidWitnessEncoding);

        let address: Result<Address, _> = "el1qq0umk3pez693jrrlxz9ndlkuwne93gdu9g83mhhzuyf46e3mdzfpva0w48gqgzgrklncnm0k5zeyw8my2ypfsnnmzrstzt7de".parse();
        assert_eq!(address.unwrap_err(), AddressError::InvalidSegwitV0Encoding);
    }

    #[test]
    fn parse_with_known_params() {
        for a in &["2dxmEBXc2qMYcLSKiDBxdEePY3Ytixmnh4E", "ert1qwhh2n5qypypm0eufahm2pvj8raj9zq5c27cysu"] {
            let addr = Address::parse_with_params(a, &AddressParams::ELEMENTS).unwrap();
            assert_eq!(addr, a.parse().unwrap());
        }
        // liquid addresses are not elements regtest addresses
        assert!(Address::parse_with_params("GqiQRsPEyJLAsEBFB5R34KHuqxDNkG3zur", &AddressParams::ELEMENTS).is_err());
        assert!(Address::parse_with_params("ex1q7gkeyjut0mrxc3j0kjlt7rmcnvsh0gt45d3fud", &AddressParams::ELEMENTS).is_err());
    }

    #[test]
    fn confidential_conversion() {
        let addr: Address = "ert1qwhh2n5qypypm0eufahm2pvj8raj9zq5c27cysu".parse().unwrap();
        let blinder = PublicKey::from_str(
            "0218845781f631c48f1c9709e23092067d06837f30aa0cd0544ac887fe91ddd166",
        )
        .unwrap();
        let conf = addr.to_confidential(blinder);
        assert!(conf.to_string().starts_with("el1"));
        assert_eq!(conf.script_pubkey(), addr.script_pubkey());
        assert_eq!(conf.to_unconfidential(), addr);
    }
}
