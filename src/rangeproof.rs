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

//! # Rangeproofs
//!
//! Borromean rangeproofs over value commitments. The proof embeds a
//! 64-byte message (asset id and asset blinding factor) which the holder
//! of the output's nonce secret can rewind together with the amount and
//! the value blinding factor.
//!

use std::ops::Range;

use bitcoin::Script;
use secp256k1_zkp::{
    Generator, PedersenCommitment, RangeProof, Secp256k1, SecretKey, Signing, Verification,
};

use crate::confidential::{AssetBlindingFactor, ProofInvalid, ValueBlindingFactor};
use crate::issuance::AssetId;
use crate::transaction::is_unspendable;

/// No more than 21 million coins of any asset, in satoshis.
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Minimum number of bits hidden by a rangeproof.
pub const RANGEPROOF_MIN_PRIV_BITS: u8 = 52;

/// Base-10 exponent of rangeproofs; zero keeps amounts exact.
pub const RANGEPROOF_EXP_SHIFT: i32 = 0;

/// Serialized size of a rangeproof with the parameters above, length
/// prefix excluded.
const RANGEPROOF_SIZE: usize = 4174;

/// The message embedded in a rangeproof for the receiver to rewind.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct RangeProofMessage {
    /// The asset id
    pub asset: AssetId,
    /// The asset blinding factor
    pub bf: AssetBlindingFactor,
}

impl RangeProofMessage {
    /// Converts the message to bytes
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut message = [0u8; 64];
        message[..32].copy_from_slice(self.asset.into_tag().as_ref());
        message[32..].copy_from_slice(self.bf.into_inner().as_ref());
        message
    }

    /// Parses a rewound message.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofInvalid> {
        if bytes.len() < 64 {
            return Err(ProofInvalid::MalformedMessage);
        }
        let asset = AssetId::from_slice(&bytes[..32]).map_err(|_| ProofInvalid::MalformedMessage)?;
        let bf = AssetBlindingFactor::from_slice(&bytes[32..64])
            .map_err(|_| ProofInvalid::MalformedMessage)?;
        Ok(RangeProofMessage { asset, bf })
    }
}

/// The opening of a value commitment recovered by [`rewind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewound {
    /// Committed amount
    pub value: u64,
    /// Value blinding factor
    pub value_bf: ValueBlindingFactor,
    /// Embedded message
    pub message: RangeProofMessage,
}

/// The smallest amount an output with this script may prove: spendable
/// outputs must carry something, unspendable ones may carry zero.
pub fn min_value(script_pubkey: &Script) -> u64 {
    if is_unspendable(script_pubkey) {
        0
    } else {
        1
    }
}

/// Proves that `commitment` opens to `value` with `vbf`. The script is
/// bound into the proof and the nonce secret lets the receiver rewind it.
#[allow(clippy::too_many_arguments)]
pub fn prove<C: Signing>(
    secp: &Secp256k1<C>,
    commitment: PedersenCommitment,
    value: u64,
    vbf: ValueBlindingFactor,
    message: &RangeProofMessage,
    script_pubkey: &Script,
    nonce: SecretKey,
    asset_gen: Generator,
) -> Result<RangeProof, secp256k1_zkp::Error> {
    RangeProof::new(
        secp,
        min_value(script_pubkey),
        commitment,
        value,
        vbf.into_inner(),
        &message.to_bytes(),
        script_pubkey.as_bytes(),
        nonce,
        RANGEPROOF_EXP_SHIFT,
        RANGEPROOF_MIN_PRIV_BITS,
        asset_gen,
    )
}

/// Verifies a rangeproof, returning the range of amounts it proves.
pub fn verify<C: Verification>(
    secp: &Secp256k1<C>,
    proof: &RangeProof,
    commitment: PedersenCommitment,
    script_pubkey: &Script,
    asset_gen: Generator,
) -> Result<Range<u64>, ProofInvalid> {
    proof
        .verify(secp, commitment, script_pubkey.as_bytes(), asset_gen)
        .map_err(ProofInvalid::RangeProof)
}

/// Recovers the amount, value blinding factor and message of a rangeproof
/// made with `nonce`. A wrong nonce fails like an invalid proof.
pub fn rewind<C: Verification>(
    secp: &Secp256k1<C>,
    proof: &RangeProof,
    commitment: PedersenCommitment,
    nonce: SecretKey,
    script_pubkey: &Script,
    asset_gen: Generator,
) -> Result<Rewound, ProofInvalid> {
    let (opening, _) = proof
        .rewind(secp, commitment, nonce, script_pubkey.as_bytes(), asset_gen)
        .map_err(ProofInvalid::RangeProof)?;
    Ok(Rewound {
        value: opening.value,
        value_bf: ValueBlindingFactor(opening.blinding_factor),
        message: RangeProofMessage::from_bytes(opening.message.as_ref())?,
    })
}

/// Estimated witness bytes of one rangeproof, length prefix included.
pub fn estimated_size() -> usize {
    RANGEPROOF_SIZE + 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidential::{Asset, Value};
    use crate::transaction::op_return_script;
    use bitcoin::ScriptBuf;
    use rand::thread_rng;

    fn commit(
        secp: &Secp256k1<secp256k1_zkp::All>,
        value: u64,
        msg: &RangeProofMessage,
        vbf: ValueBlindingFactor,
    ) -> (PedersenCommitment, Generator) {
        let gen = Asset::new_confidential(secp, msg.asset, msg.bf).commitment().unwrap();
        let comm = Value::new_confidential(secp, value, gen, vbf).commitment().unwrap();
        (comm, gen)
    }

    #[test]
    fn prove_verify_rewind() {
        let secp = Secp256k1::new();
        let mut rng = thread_rng();
        let msg = RangeProofMessage {
            asset: AssetId::LIQUID_BTC,
            bf: AssetBlindingFactor::new(&mut rng),
        };
        let vbf = ValueBlindingFactor::new(&mut rng);
        let (comm, gen) = commit(&secp, 12_345, &msg, vbf);
        let spk = ScriptBuf::from_bytes(vec![0x00, 0x14, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20]);
        let nonce = SecretKey::new(&mut rng);

        let proof = prove(&secp, comm, 12_345, vbf, &msg, &spk, nonce, gen).unwrap();
        let range = verify(&secp, &proof, comm, &spk, gen).unwrap();
        assert!(range.start <= 12_345 && 12_345 < range.end);
        assert_eq!(range.start, 1);

        let rewound = rewind(&secp, &proof, comm, nonce, &spk, gen).unwrap();
        assert_eq!(rewound.value, 12_345);
        assert_eq!(rewound.value_bf, vbf);
        assert_eq!(rewound.message, msg);

        // the script is committed to
        let other = ScriptBuf::from_bytes(vec![0x51]);
        assert!(verify(&secp, &proof, comm, &other, gen).is_err());
        // someone else's nonce
        assert!(rewind(&secp, &proof, comm, SecretKey::new(&mut rng), &spk, gen).is_err());
    }

    #[test]
    fn zero_value_on_unspendable_script() {
        let secp = Secp256k1::new();
        let mut rng = thread_rng();
        let msg = RangeProofMessage {
            asset: AssetId::ELEMENTS_REGTEST_BTC,
            bf: AssetBlindingFactor::new(&mut rng),
        };
        let vbf = ValueBlindingFactor::new(&mut rng);
        let (comm, gen) = commit(&secp, 0, &msg, vbf);
        let spk = op_return_script();
        let nonce = SecretKey::new(&mut rng);
        assert_eq!(min_value(&spk), 0);

        let proof = prove(&secp, comm, 0, vbf, &msg, &spk, nonce, gen).unwrap();
        assert_eq!(verify(&secp, &proof, comm, &spk, gen).unwrap().start, 0);
        assert!(proof.serialize().len() <= RANGEPROOF_SIZE);
    }

    #[test]
    fn message_bytes() {
        assert_eq!(RangeProofMessage::from_bytes(&[0; 10]), Err(ProofInvalid::MalformedMessage));
        let msg = RangeProofMessage {
            asset: AssetId::LIQUID_BTC,
            bf: AssetBlindingFactor::zero(),
        };
        assert_eq!(RangeProofMessage::from_bytes(&msg.to_bytes()).unwrap(), msg);
    }
}
