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

//! # SLIP-77
//!
//! Deterministic blinding keys: a master blinding key derived from the
//! wallet seed (through SLIP-21), and per-script blinding keys derived
//! from it by HMAC. Issuance blinding keys are the blinding keys of a
//! synthetic script naming the issuing outpoint.
//!

use bitcoin::hashes::{hmac, sha256, sha512, Hash, HashEngine};
use bitcoin::opcodes::all::OP_RETURN;
use bitcoin::{Script, ScriptBuf};
use secp256k1_zkp::{PublicKey, Secp256k1, SecretKey, Signing, UpstreamError};

use crate::transaction::OutPoint;

const SLIP21_SEED_KEY: &[u8] = b"Symmetric key seed";
const SLIP77_LABEL: &[u8] = b"SLIP-0077";

/// A SLIP-77 master blinding key.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MasterBlindingKey(pub SecretKey);

impl MasterBlindingKey {
    /// Create a new master blinding key from a seed.
    pub fn new(seed: &[u8]) -> Result<MasterBlindingKey, UpstreamError> {
        // SLIP-21 master node, then the single "SLIP-0077" child.
        let master = hmac_sha512(SLIP21_SEED_KEY, &[seed]);
        let child = hmac_sha512(&master[..32], &[&[0u8], SLIP77_LABEL]);
        Ok(MasterBlindingKey(SecretKey::from_slice(&child[32..])?))
    }

    /// Derive a blinding private key for a given scriptPubkey.
    pub fn derive_blinding_key(&self, script_pubkey: &Script) -> Result<SecretKey, UpstreamError> {
        let mut engine = hmac::HmacEngine::<sha256::Hash>::new(&self.0.secret_bytes());
        engine.input(script_pubkey.as_bytes());
        let bytes = hmac::Hmac::<sha256::Hash>::from_engine(engine).to_byte_array();
        SecretKey::from_slice(&bytes)
    }

    /// The blinding public key receivers put in confidential addresses.
    pub fn blinding_public_key<C: Signing>(
        &self,
        secp: &Secp256k1<C>,
        script_pubkey: &Script,
    ) -> Result<PublicKey, UpstreamError> {
        Ok(PublicKey::from_secret_key(secp, &self.derive_blinding_key(script_pubkey)?))
    }

    /// Derive the key blinding the issuance amounts of an input spending `prevout`.
    pub fn issuance_blinding_key(&self, prevout: OutPoint) -> Result<SecretKey, UpstreamError> {
        self.derive_blinding_key(&issuance_script(prevout))
    }
}

/// The script whose blinding key blinds the issuance riding on `prevout`.
fn issuance_script(prevout: OutPoint) -> ScriptBuf {
    ScriptBuf::builder()
        .push_opcode(OP_RETURN)
        .push_slice(prevout.txid.to_byte_array())
        .push_int(i64::from(prevout.vout))
        .into_script()
}

fn hmac_sha512(key: &[u8], data: &[&[u8]]) -> [u8; 64] {
    let mut engine = hmac::HmacEngine::<sha512::Hash>::new(key);
    for d in data {
        engine.input(d);
    }
    hmac::Hmac::<sha512::Hash>::from_engine(engine).to_byte_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hex::FromHex;
    use crate::hash_types::Txid;

    #[test]
    fn test_slip77() {
        // libwally vector
        let seed = Vec::<u8>::from_hex("731e9b42eb9774f8a6b51af35a06f6ef1cdb6cf04402163ceacf0c8bace2831a").unwrap();
        let master = MasterBlindingKey::new(&seed).unwrap();

        let privkey_hex = "c2f338e32ad1a2bd9cac569e67728163bf4c326a1770ec2293ba65548a581e97";
        let privkey = SecretKey::from_slice(&Vec::<u8>::from_hex(privkey_hex).unwrap()).unwrap();
        assert_eq!(master.0, privkey);

        let scriptpk = ScriptBuf::from_bytes(
            Vec::<u8>::from_hex("a914afa92d77cd3541b443771649572db096cf49bf8c87").unwrap(),
        );
        let blindingkey_hex = "02b067c374bb56c54c016fae29218c000ada60f81ef45b4aeebbeb24931bb8bc";
        let blindingkey = SecretKey::from_slice(&Vec::<u8>::from_hex(blindingkey_hex).unwrap()).unwrap();
        assert_eq!(master.derive_blinding_key(&scriptpk).unwrap(), blindingkey);
    }

    #[test]
    fn issuance_keys_differ_per_outpoint() {
        let master = MasterBlindingKey::new(&[7u8; 32]).unwrap();
        let txid = Txid::from_byte_array([1; 32]);
        let k0 = master.issuance_blinding_key(OutPoint::new(txid, 0)).unwrap();
        let k1 = master.issuance_blinding_key(OutPoint::new(txid, 1)).unwrap();
        assert_ne!(k0, k1);
        assert_eq!(k0, master.issuance_blinding_key(OutPoint::new(txid, 0)).unwrap());
    }
}
