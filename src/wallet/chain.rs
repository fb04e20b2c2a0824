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

//! # Chain source
//!
//! The wallet never talks to a node directly. Everything it knows about
//! the chain comes through [`ChainSource`], which a node client, an
//! indexer or the in-memory test chain implement.
//!

use std::sync::Arc;

use crate::transaction::{OutPoint, Transaction, TxOut};

/// A transaction as seen by the chain, with its depth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainTransaction {
    /// The transaction
    pub tx: Transaction,
    /// Number of confirmations; 0 for mempool transactions
    pub confirmations: u32,
}

/// An unspent output and its depth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utxo {
    /// Where the output lives
    pub outpoint: OutPoint,
    /// The output itself
    pub txout: TxOut,
    /// Confirmations of the transaction creating the output
    pub confirmations: u32,
}

/// Read access to a chain and its mempool.
pub trait ChainSource {
    /// Every known transaction, confirmed ones first in block order,
    /// then the mempool.
    fn transactions(&self) -> Vec<ChainTransaction>;

    /// Looks up an output which is not spent yet.
    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo>;

    /// Whether a transaction, confirmed or in the mempool, spends `outpoint`.
    fn is_spent(&self, outpoint: &OutPoint) -> bool;
}

impl<T: ChainSource + ?Sized> ChainSource for Arc<T> {
    fn transactions(&self) -> Vec<ChainTransaction> {
        (**self).transactions()
    }

    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo> {
        (**self).utxo(outpoint)
    }

    fn is_spent(&self, outpoint: &OutPoint) -> bool {
        (**self).is_spent(outpoint)
    }
}

impl<'a, T: ChainSource + ?Sized> ChainSource for &'a T {
    fn transactions(&self) -> Vec<ChainTransaction> {
        (**self).transactions()
    }

    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo> {
        (**self).utxo(outpoint)
    }

    fn is_spent(&self, outpoint: &OutPoint) -> bool {
        (**self).is_spent(outpoint)
    }
}
