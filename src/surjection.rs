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

//! # Surjection proofs
//!
//! A surjection proof shows that an output's blinded asset is one of the
//! assets of the transaction's inputs, without saying which one. The
//! domain of a proof is the ordered list of input asset generators:
//! every input, each followed by its issuance pseudo-inputs.
//!

use std::collections::BTreeSet;

use secp256k1_zkp::{
    rand::{CryptoRng, RngCore},
    Generator, Secp256k1, Signing, SurjectionProof, Tag, Tweak, ZERO_TWEAK,
};

use crate::confidential::{Asset, AssetBlindingFactor, ProofInvalid};
use crate::issuance::AssetId;
use crate::transaction::{TxIn, TxOut};

/// The largest domain a surjection proof can range over. Transactions with
/// more inputs prove and verify against the first this many entries.
pub const MAX_SURJECTION_DOMAIN: usize = 256;

/// Number of domain entries a proof actually uses, the real one included.
const SURJECTION_USED_INPUTS: usize = 3;

/// Data structure used to provide inputs to [`SurjectionProof`] methods.
/// Inputs for which we don't know the secrets can be [`SurjectionInput::Unknown`],
/// while inputs from user's wallet should be [`SurjectionInput::Known`]
///
/// Explicit assets can be provided as [`SurjectionInput::Unknown`]. There is no
/// need to construct a `Known` variant with secrets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurjectionInput {
    /// Unknown inputs for whom we don't know the secrets(asset tags/blinding factors)
    Unknown(Asset),
    /// Known inputs for whom we know blinding factors
    Known {
        /// Asset
        asset: AssetId,
        /// Asset Blinding Factor
        asset_bf: AssetBlindingFactor,
    },
}

impl From<Asset> for SurjectionInput {
    fn from(v: Asset) -> Self {
        Self::Unknown(v)
    }
}

impl SurjectionInput {
    /// The asset of this input, when it is known.
    pub fn asset(&self) -> Option<AssetId> {
        match *self {
            SurjectionInput::Known { asset, .. } => Some(asset),
            SurjectionInput::Unknown(asset) => asset.explicit(),
        }
    }

    /// The surjection target of this input: generator, tag and blinding
    /// factor. Unknown inputs get a zero tag so they never anchor a proof.
    ///
    /// Returns [None] when the input asset is null.
    pub fn surjection_target<C: Signing>(&self, secp: &Secp256k1<C>) -> Option<(Generator, Tag, Tweak)> {
        match *self {
            SurjectionInput::Unknown(asset) => {
                let gen = asset.into_asset_gen(secp)?;
                Some((gen, Tag::default(), ZERO_TWEAK))
            }
            SurjectionInput::Known { asset, asset_bf } => {
                let tag = asset.into_tag();
                let bf = asset_bf.into_inner();
                Some((Generator::new_blinded(secp, tag, bf), tag, bf))
            }
        }
    }
}

/// Errors creating a surjection proof
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurjectionError {
    /// No input carries the output asset.
    NoMatchingInput(AssetId),
    /// The output asset only appears beyond the provable domain.
    TooManyAssets,
    /// A domain entry has a null asset.
    NullInputAsset(usize),
    /// Error originated in `secp256k1_zkp`.
    Upstream(secp256k1_zkp::Error),
}

impl std::fmt::Display for SurjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            SurjectionError::NoMatchingInput(asset) => {
                write!(f, "no input of asset {} to surject onto", asset)
            }
            SurjectionError::TooManyAssets => {
                write!(f, "output asset is outside the first {} inputs", MAX_SURJECTION_DOMAIN)
            }
            SurjectionError::NullInputAsset(i) => write!(f, "input {} has a null asset", i),
            SurjectionError::Upstream(ref e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SurjectionError {}

/// The surjection domain of a transaction spending `spent`: each input's
/// spent asset, followed by the assets of that input's issuance.
/// Pairs `inputs` and `spent` by position.
pub fn domain(inputs: &[TxIn], spent: &[TxOut]) -> Vec<SurjectionInput> {
    let mut ret = Vec::with_capacity(inputs.len());
    for (txin, prev) in inputs.iter().zip(spent) {
        ret.push(SurjectionInput::Unknown(prev.asset));
        if txin.has_issuance() {
            let (asset, token) = txin.issuance_ids();
            if !txin.asset_issuance.amount.is_null() {
                ret.push(SurjectionInput::Unknown(Asset::Explicit(asset)));
            }
            if !txin.asset_issuance.inflation_keys.is_null() {
                ret.push(SurjectionInput::Unknown(Asset::Explicit(token)));
            }
        }
    }
    ret
}

/// The provable prefix of a domain.
pub fn window<T>(domain: &[T]) -> &[T] {
    &domain[..domain.len().min(MAX_SURJECTION_DOMAIN)]
}

/// Number of distinct known assets across the whole domain.
pub fn distinct_assets(domain: &[SurjectionInput]) -> usize {
    domain.iter().filter_map(SurjectionInput::asset).collect::<BTreeSet<_>>().len()
}

/// Proves that the output blinded with `asset` and `asset_bf` is one of
/// the inputs of `domain`.
pub fn prove<R, C>(
    rng: &mut R,
    secp: &Secp256k1<C>,
    asset: AssetId,
    asset_bf: AssetBlindingFactor,
    domain: &[SurjectionInput],
) -> Result<SurjectionProof, SurjectionError>
where
    R: RngCore + CryptoRng,
    C: Signing,
{
    let provable = window(domain);
    if !provable.iter().any(|i| matches!(i, SurjectionInput::Known { asset: a, .. } if *a == asset)) {
        return if domain.iter().any(|i| i.asset() == Some(asset)) {
            Err(SurjectionError::TooManyAssets)
        } else {
            Err(SurjectionError::NoMatchingInput(asset))
        };
    }

    let targets = provable
        .iter()
        .enumerate()
        .map(|(i, inp)| inp.surjection_target(secp).ok_or(SurjectionError::NullInputAsset(i)))
        .collect::<Result<Vec<_>, _>>()?;

    SurjectionProof::new(secp, rng, asset.into_tag(), asset_bf.into_inner(), &targets)
        .map_err(SurjectionError::Upstream)
}

/// Verifies a surjection proof of `output_gen` against the input
/// generators of a transaction.
pub fn verify<C: secp256k1_zkp::Verification>(
    secp: &Secp256k1<C>,
    proof: &SurjectionProof,
    output_gen: Generator,
    domain: &[Generator],
) -> Result<(), ProofInvalid> {
    if proof.verify(secp, output_gen, window(domain)) {
        Ok(())
    } else {
        Err(ProofInvalid::SurjectionProof)
    }
}

/// Estimated witness bytes of a surjection proof over `n_inputs` inputs,
/// length prefix included.
pub fn estimated_size(n_inputs: usize) -> usize {
    let n = n_inputs.min(MAX_SURJECTION_DOMAIN);
    let used = n.min(SURJECTION_USED_INPUTS);
    let size = 2 + (n + 7) / 8 + 32 * (1 + used);
    size + if size < 0xfd { 1 } else { 3 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    fn asset(n: u8) -> AssetId {
        AssetId::from_slice(&[n; 32]).unwrap()
    }

    fn known(n: u8, bf: AssetBlindingFactor) -> SurjectionInput {
        SurjectionInput::Known {
            asset: asset(n),
            asset_bf: bf,
        }
    }

    #[test]
    fn prove_and_verify() {
        let secp = Secp256k1::new();
        let mut rng = thread_rng();
        let domain = vec![
            known(1, AssetBlindingFactor::new(&mut rng)),
            SurjectionInput::Unknown(Asset::Explicit(asset(2))),
            known(3, AssetBlindingFactor::new(&mut rng)),
        ];
        let gens: Vec<Generator> =
            domain.iter().map(|i| i.surjection_target(&secp).unwrap().0).collect();

        let out_bf = AssetBlindingFactor::new(&mut rng);
        let out_gen = Asset::new_confidential(&secp, asset(3), out_bf).commitment().unwrap();
        let proof = prove(&mut rng, &secp, asset(3), out_bf, &domain).unwrap();
        verify(&secp, &proof, out_gen, &gens).unwrap();
        assert!(proof.serialize().len() + 1 <= estimated_size(domain.len()));

        // a different output generator does not verify
        let other = Asset::new_confidential(&secp, asset(1), out_bf).commitment().unwrap();
        assert_eq!(verify(&secp, &proof, other, &gens), Err(ProofInvalid::SurjectionProof));
    }

    #[test]
    fn asset_not_among_inputs() {
        let secp = Secp256k1::new();
        let mut rng = thread_rng();
        let domain = vec![known(1, AssetBlindingFactor::new(&mut rng))];
        let out_bf = AssetBlindingFactor::new(&mut rng);
        let res = prove(&mut rng, &secp, asset(9), out_bf, &domain);
        assert_eq!(res.unwrap_err(), SurjectionError::NoMatchingInput(asset(9)));
    }

    #[test]
    fn window_rule() {
        let secp = Secp256k1::new();
        let mut rng = thread_rng();
        // 300 inputs of the same asset stay provable
        let bf = AssetBlindingFactor::new(&mut rng);
        let domain = vec![known(1, bf); 300];
        let gens: Vec<Generator> =
            domain.iter().map(|i| i.surjection_target(&secp).unwrap().0).collect();
        let out_bf = AssetBlindingFactor::new(&mut rng);
        let out_gen = Asset::new_confidential(&secp, asset(1), out_bf).commitment().unwrap();
        let proof = prove(&mut rng, &secp, asset(1), out_bf, &domain).unwrap();
        verify(&secp, &proof, out_gen, &gens).unwrap();
        assert_eq!(distinct_assets(&domain), 1);

        // an asset only past the window is refused
        let mut domain = vec![known(1, bf); MAX_SURJECTION_DOMAIN];
        domain.push(known(2, bf));
        let res = prove(&mut rng, &secp, asset(2), out_bf, &domain);
        assert_eq!(res.unwrap_err(), SurjectionError::TooManyAssets);
        assert_eq!(distinct_assets(&domain), 2);
    }
}
