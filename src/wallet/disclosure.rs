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

//! # Disclosure
//!
//! Handing out and taking in viewing keys. Imports only ever add
//! visibility: none of them lets the wallet spend anything.
//!

use log::debug;
use secp256k1_zkp::{PublicKey, SecretKey};

use super::{read, write, ChainSource, Error, ScriptEntry, WalletContext};
use crate::address::Address;
use crate::hash_types::Txid;

impl<S: ChainSource> WalletContext<S> {
    /// The blinding key of a wallet or watched address.
    pub fn dump_blinding_key(&self, address: &Address) -> Result<SecretKey, Error> {
        read(&self.keystore)
            .blinding_keys
            .get(&address.script_pubkey())
            .copied()
            .ok_or_else(|| Error::UnknownAddress(address.clone()))
    }

    /// Sets the blinding key of an address's script. Outputs decoded with
    /// a previous key keep their secrets; the new key is tried on the
    /// others at the next refresh.
    pub fn import_blinding_key(&self, address: &Address, key: SecretKey) {
        let script = address.script_pubkey();
        debug!("importing blinding key for {}", address.to_unconfidential());
        write(&self.keystore).blinding_keys.insert(script, key);
    }

    /// The key blinding the issuance on input `vin` of `txid`.
    pub fn dump_issuance_blinding_key(&self, txid: Txid, vin: u32) -> Result<SecretKey, Error> {
        read(&self.keystore)
            .issuance_keys
            .get(&(txid, vin))
            .copied()
            .ok_or(Error::UnknownIssuance(txid, vin))
    }

    /// Lets the wallet audit the issuance on input `vin` of `txid`.
    pub fn import_issuance_blinding_key(&self, txid: Txid, vin: u32, key: SecretKey) {
        debug!("importing issuance blinding key for {}:{}", txid, vin);
        write(&self.keystore).issuance_keys.insert((txid, vin), key);
    }

    /// Watches an address. Its amounts stay hidden until its blinding key
    /// is imported too. Addresses the wallet owns are left alone.
    pub fn import_address(&self, address: &Address) {
        let mut keystore = write(&self.keystore);
        keystore
            .scripts
            .entry(address.script_pubkey())
            .or_insert_with(|| ScriptEntry {
                address: address.clone(),
                watch_only: true,
            });
    }

    /// The confidential form of `address` with `blinding_pubkey`.
    pub fn create_blinded_address(&self, address: &Address, blinding_pubkey: PublicKey) -> Address {
        address.to_unconfidential().to_confidential(blinding_pubkey)
    }
}
