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

//! # Elements Confidential Transactions
//!
//! Blinding and unblinding of Elements transactions: Pedersen value
//! commitments, blinded asset generators, rangeproofs and surjection
//! proofs, asset issuance, and a wallet layer keeping a ledger of the
//! confidential outputs it can open.
//!

// Coding conventions
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(missing_docs)]

pub extern crate bitcoin;
pub extern crate secp256k1_zkp;
#[cfg(feature = "serde")]
extern crate actual_serde;
#[cfg(feature = "json-contract")]
extern crate serde_json;

#[cfg(test)]
extern crate rand;

pub mod address;
pub mod blech32;
pub mod blind;
pub mod confidential;
pub mod encode;
mod hash_types;
pub mod issuance;
pub mod rangeproof;
pub mod slip77;
pub mod surjection;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod transaction;
pub mod wallet;

// export everything at the top level so it can be used as `elements_ct::Transaction` etc.
pub use crate::address::{Address, AddressError, AddressParams};
pub use crate::blind::{
    raw_blind_transaction, BlindError, BlindReport, BlinderConfig, BlindingInputs,
    IssuanceSecrets, ResourceLimitError, TxOutSecrets, UnblindError, VerificationError,
};
pub use crate::confidential::{ArithmeticError, AssetBlindingFactor, ProofInvalid, ValueBlindingFactor};
pub use crate::hash_types::Txid;
pub use crate::issuance::{AssetId, ContractHash, IssuanceAmount, IssuanceRecord};
pub use crate::transaction::{
    AssetIssuance, OutPoint, Transaction, TxIn, TxInWitness, TxOut, TxOutWitness,
};
pub use crate::wallet::{PolicyError, WalletConfig, WalletContext};
