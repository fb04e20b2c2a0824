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

//! # In-memory chain
//!
//! A chain source for tests: a mempool plus a list of blocks. Broadcast
//! transactions must spend existing, unspent outputs and pass
//! [`Transaction::verify_tx_amt_proofs`]; scripts and signatures are not
//! checked.
//!

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use secp256k1_zkp::Secp256k1;

use crate::address::Address;
use crate::blind::VerificationError;
use crate::confidential::{Asset, Nonce, Value};
use crate::hash_types::Txid;
use crate::issuance::AssetId;
use crate::transaction::{OutPoint, Transaction, TxOut, TxOutWitness};
use crate::wallet::{ChainSource, ChainTransaction, Utxo};

/// Why [`MemoryChain::broadcast`] refused a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainError {
    /// An input spends an output the chain does not know
    MissingInput(OutPoint),
    /// An input spends an output already spent
    DoubleSpend(OutPoint),
    /// The confidential amounts do not verify
    Invalid(VerificationError),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ChainError::MissingInput(op) => write!(f, "missing input {}", op),
            ChainError::DoubleSpend(op) => write!(f, "{} is already spent", op),
            ChainError::Invalid(ref e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ChainError {}

#[derive(Default)]
struct State {
    blocks: Vec<Vec<Transaction>>,
    mempool: Vec<Transaction>,
    outputs: BTreeMap<OutPoint, (TxOut, Txid)>,
    spent: BTreeSet<OutPoint>,
    funded: u32,
}

impl State {
    fn confirmations(&self, txid: Txid) -> Option<u32> {
        if self.mempool.iter().any(|tx| tx.txid() == txid) {
            return Some(0);
        }
        let tip = self.blocks.len();
        self.blocks
            .iter()
            .position(|block| block.iter().any(|tx| tx.txid() == txid))
            .map(|height| (tip - height) as u32)
    }

    fn add_outputs(&mut self, tx: &Transaction) {
        let txid = tx.txid();
        for (vout, out) in tx.output.iter().enumerate() {
            self.outputs.insert(OutPoint::new(txid, vout as u32), (out.clone(), txid));
        }
    }
}

/// An in-memory chain and mempool.
#[derive(Default)]
pub struct MemoryChain {
    state: Mutex<State>,
}

impl MemoryChain {
    /// An empty chain.
    pub fn new() -> MemoryChain {
        MemoryChain::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mines a block creating `outputs` out of thin air.
    pub fn fund(&self, outputs: Vec<TxOut>) -> Transaction {
        let mut state = self.state();
        state.funded += 1;
        let tx = Transaction {
            version: 2,
            lock_time: state.funded,
            input: vec![],
            output: outputs,
        };
        state.add_outputs(&tx);
        state.blocks.push(vec![tx.clone()]);
        tx
    }

    /// Mines a block paying explicit `amount` of `asset` to `address`.
    pub fn fund_address(&self, address: &Address, asset: AssetId, amount: u64) -> OutPoint {
        let out = TxOut {
            asset: Asset::Explicit(asset),
            value: Value::Explicit(amount),
            nonce: Nonce::Null,
            script_pubkey: address.script_pubkey(),
            witness: TxOutWitness::default(),
        };
        OutPoint::new(self.fund(vec![out]).txid(), 0)
    }

    /// Adds a transaction to the mempool.
    pub fn broadcast(&self, tx: &Transaction) -> Result<Txid, ChainError> {
        let mut state = self.state();
        let mut spent_utxos = Vec::with_capacity(tx.input.len());
        for txin in &tx.input {
            let op = txin.previous_output;
            if state.spent.contains(&op) {
                return Err(ChainError::DoubleSpend(op));
            }
            let (out, _) = state.outputs.get(&op).ok_or(ChainError::MissingInput(op))?;
            spent_utxos.push(out.clone());
        }
        tx.verify_tx_amt_proofs(&Secp256k1::new(), &spent_utxos).map_err(ChainError::Invalid)?;

        state.spent.extend(tx.input.iter().map(|i| i.previous_output));
        state.add_outputs(tx);
        state.mempool.push(tx.clone());
        Ok(tx.txid())
    }

    /// Confirms the whole mempool in a new block.
    pub fn mine(&self) {
        let mut state = self.state();
        let block = std::mem::take(&mut state.mempool);
        state.blocks.push(block);
    }

    /// Confirmations of a transaction; [None] when unknown.
    pub fn confirmations(&self, txid: Txid) -> Option<u32> {
        self.state().confirmations(txid)
    }
}

impl ChainSource for MemoryChain {
    fn transactions(&self) -> Vec<ChainTransaction> {
        let state = self.state();
        let tip = state.blocks.len();
        let mut ret = vec![];
        for (height, block) in state.blocks.iter().enumerate() {
            for tx in block {
                ret.push(ChainTransaction {
                    tx: tx.clone(),
                    confirmations: (tip - height) as u32,
                });
            }
        }
        for tx in &state.mempool {
            ret.push(ChainTransaction {
                tx: tx.clone(),
                confirmations: 0,
            });
        }
        ret
    }

    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo> {
        let state = self.state();
        if state.spent.contains(outpoint) {
            return None;
        }
        let (txout, txid) = state.outputs.get(outpoint)?;
        Some(Utxo {
            outpoint: *outpoint,
            txout: txout.clone(),
            confirmations: state.confirmations(*txid).unwrap_or(0),
        })
    }

    fn is_spent(&self, outpoint: &OutPoint) -> bool {
        self.state().spent.contains(outpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TxIn;

    fn asset() -> AssetId {
        AssetId::from_slice(&[7; 32]).unwrap()
    }

    #[test]
    fn broadcast_and_mine() {
        let chain = MemoryChain::new();
        let funding = chain.fund(vec![TxOut::new_fee(100, asset())]);
        let op = OutPoint::new(funding.txid(), 0);
        assert_eq!(chain.confirmations(funding.txid()), Some(1));

        let mut tx = Transaction::new();
        tx.input.push(TxIn::new(op));
        tx.output.push(TxOut::new_burn(60, asset()));
        tx.output.push(TxOut::new_fee(40, asset()));
        let txid = chain.broadcast(&tx).unwrap();
        assert_eq!(chain.confirmations(txid), Some(0));
        assert!(chain.is_spent(&op));
        assert!(chain.utxo(&op).is_none());
        assert_eq!(chain.broadcast(&tx), Err(ChainError::DoubleSpend(op)));

        chain.mine();
        assert_eq!(chain.confirmations(txid), Some(1));
        assert_eq!(chain.confirmations(funding.txid()), Some(2));
        assert_eq!(chain.transactions().len(), 2);
    }

    #[test]
    fn rejects_unbalanced() {
        let chain = MemoryChain::new();
        let funding = chain.fund(vec![TxOut::new_fee(100, asset())]);
        let mut tx = Transaction::new();
        tx.input.push(TxIn::new(OutPoint::new(funding.txid(), 0)));
        tx.output.push(TxOut::new_fee(101, asset()));
        assert_eq!(
            chain.broadcast(&tx),
            Err(ChainError::Invalid(VerificationError::BalanceCheckFailed))
        );

        let missing = OutPoint::new(funding.txid(), 1);
        tx.input[0] = TxIn::new(missing);
        assert_eq!(chain.broadcast(&tx), Err(ChainError::MissingInput(missing)));
    }
}
