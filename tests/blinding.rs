extern crate elements_ct;
extern crate rand_chacha;

use elements_ct::bitcoin::hashes::Hash;
use elements_ct::bitcoin::ScriptBuf;
use elements_ct::confidential::{Asset, Nonce, Value};
use elements_ct::secp256k1_zkp::{
    All, Generator, PedersenCommitment, PublicKey, Secp256k1, SecretKey,
};
use elements_ct::{
    raw_blind_transaction, Address, AddressParams, AssetId, AssetIssuance, BlindError,
    BlinderConfig, BlindingInputs, ContractHash, OutPoint, ResourceLimitError, Transaction, TxIn,
    TxOut, TxOutSecrets, TxOutWitness, Txid, UnblindError,
};
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn rng(seed: u8) -> ChaCha20Rng {
    ChaCha20Rng::from_seed([seed; 32])
}

fn asset(n: u16) -> AssetId {
    let mut bytes = [1u8; 32];
    bytes[..2].copy_from_slice(&n.to_le_bytes());
    AssetId::from_slice(&bytes).unwrap()
}

fn keypair(secp: &Secp256k1<All>, n: u8) -> (SecretKey, PublicKey) {
    let sk = SecretKey::from_slice(&[n; 32]).unwrap();
    (sk, PublicKey::from_secret_key(secp, &sk))
}

fn script(secp: &Secp256k1<All>, n: u8) -> ScriptBuf {
    let (_, pk) = keypair(secp, n);
    Address::p2wpkh(&pk, None, &AddressParams::ELEMENTS).script_pubkey()
}

fn explicit(asset: AssetId, value: u64, script_pubkey: ScriptBuf) -> TxOut {
    TxOut {
        asset: Asset::Explicit(asset),
        value: Value::Explicit(value),
        nonce: Nonce::Null,
        script_pubkey,
        witness: TxOutWitness::default(),
    }
}

/// A transaction spending explicit outputs, with the outputs it spends.
fn spending(secp: &Secp256k1<All>, prevouts: &[(AssetId, u64)]) -> (Transaction, Vec<TxOut>, BlindingInputs) {
    let mut tx = Transaction::new();
    let mut spent = vec![];
    let mut inputs = BlindingInputs::default();
    for (i, &(asset, value)) in prevouts.iter().enumerate() {
        let mut txid = [0u8; 32];
        txid[..4].copy_from_slice(&(i as u32).to_le_bytes());
        tx.input.push(TxIn::new(OutPoint::new(Txid::from_byte_array(txid), 0)));
        spent.push(explicit(asset, value, script(secp, 9)));
        inputs.spent_utxo_secrets.push(TxOutSecrets::explicit(asset, value));
    }
    (tx, spent, inputs)
}

/// Blinds two outputs of `asset(0)` to `pk`, returning the transaction and
/// the secrets of both outputs.
fn blinded_prevouts(secp: &Secp256k1<All>, pk: PublicKey) -> (Transaction, Vec<TxOutSecrets>) {
    let (mut tx, _, inputs) = spending(secp, &[(asset(0), 10_000)]);
    tx.output.push(TxOut::new_to_blind(6_000, asset(0), script(secp, 2), pk));
    tx.output.push(TxOut::new_to_blind(4_000, asset(0), script(secp, 2), pk));
    let report = tx.blind(&mut rng(1), secp, &inputs, &BlinderConfig::default()).unwrap();
    let secrets = vec![report.output_secrets[&0], report.output_secrets[&1]];
    (tx, secrets)
}

/// Spends both outputs of `prev` to explicit outputs only.
fn spend_to_explicit(
    secp: &Secp256k1<All>,
    prev: &Transaction,
    secrets: Vec<TxOutSecrets>,
) -> (Transaction, BlindingInputs) {
    let mut tx = Transaction::new();
    tx.input.push(TxIn::new(OutPoint::new(prev.txid(), 0)));
    tx.input.push(TxIn::new(OutPoint::new(prev.txid(), 1)));
    tx.output.push(explicit(asset(0), 9_500, script(secp, 4)));
    tx.output.push(TxOut::new_fee(500, asset(0)));
    let inputs = BlindingInputs {
        spent_utxo_secrets: secrets,
        ..Default::default()
    };
    (tx, inputs)
}

#[test]
fn blind_verify_unblind() {
    let secp = Secp256k1::new();
    let (receiver_sk, receiver_pk) = keypair(&secp, 2);
    let (change_sk, change_pk) = keypair(&secp, 3);
    let (mut tx, spent, inputs) = spending(&secp, &[(asset(0), 50_000), (asset(0), 30_000)]);
    tx.output.push(TxOut::new_to_blind(60_000, asset(0), script(&secp, 2), receiver_pk));
    tx.output.push(TxOut::new_to_blind(19_000, asset(0), script(&secp, 3), change_pk));
    tx.output.push(TxOut::new_fee(1_000, asset(0)));

    let report = tx.blind(&mut rng(1), &secp, &inputs, &BlinderConfig::default()).unwrap();
    assert!(report.changed());
    assert_eq!(report.output_secrets.len(), 2);
    assert_eq!(report.balancing_output, None);
    tx.verify_tx_amt_proofs(&secp, &spent).unwrap();

    // blinded outputs carry both proofs, the fee carries none
    for out in &tx.output[..2] {
        assert!(out.value.is_confidential() && out.asset.is_confidential());
        assert!(out.witness.rangeproof.is_some() && out.witness.surjection_proof.is_some());
    }
    assert!(tx.output[2].witness.is_empty());

    let secrets = tx.output[0].unblind(&secp, receiver_sk).unwrap();
    assert_eq!(secrets.value, 60_000);
    assert_eq!(secrets.asset, asset(0));
    assert_eq!(report.output_secrets[&0], secrets);
    assert_eq!(tx.output[1].unblind(&secp, change_sk).unwrap().value, 19_000);
    assert_eq!(tx.output[0].unblind(&secp, change_sk), Err(UnblindError::NotOwned));
    assert_eq!(tx.output[2].unblind(&secp, change_sk), Err(UnblindError::NotConfidential));
}

#[test]
fn reblinding_is_a_noop() {
    let secp = Secp256k1::new();
    let (_, pk) = keypair(&secp, 2);
    let (mut tx, spent, mut inputs) = spending(&secp, &[(asset(0), 10_000)]);
    tx.output.push(TxOut::new_to_blind(4_000, asset(0), script(&secp, 2), pk));
    tx.output.push(TxOut::new_to_blind(5_000, asset(0), script(&secp, 3), pk));
    tx.output.push(TxOut::new_fee(1_000, asset(0)));
    let report = tx.blind(&mut rng(1), &secp, &inputs, &BlinderConfig::default()).unwrap();

    // without the secrets of the outputs blinded already, nothing happens
    let blinded = tx.clone();
    assert_eq!(
        tx.blind(&mut rng(2), &secp, &inputs, &BlinderConfig::default()),
        Err(BlindError::MissingOutputSecrets(0))
    );
    assert_eq!(tx, blinded);

    inputs.output_secrets = report.output_secrets;
    let again = tx.blind(&mut rng(2), &secp, &inputs, &BlinderConfig::default()).unwrap();
    assert!(!again.changed());
    assert_eq!(tx, blinded);
    tx.verify_tx_amt_proofs(&secp, &spent).unwrap();
}

#[test]
fn blinded_inputs_to_explicit_outputs_are_unbalanceable() {
    let secp = Secp256k1::new();
    let (_, pk) = keypair(&secp, 2);
    let (prev, secrets) = blinded_prevouts(&secp, pk);
    let (tx, inputs) = spend_to_explicit(&secp, &prev, secrets);

    let err = raw_blind_transaction(&mut rng(2), &secp, &tx, &inputs, &BlinderConfig::default());
    assert_eq!(err.unwrap_err(), BlindError::Unbalanceable);
}

#[test]
fn balancing_output() {
    let secp = Secp256k1::new();
    let (sk, pk) = keypair(&secp, 2);
    let (prev, secrets) = blinded_prevouts(&secp, pk);
    let (mut tx, inputs) = spend_to_explicit(&secp, &prev, secrets);
    let spent = prev.output.clone();

    let (_, balancing_pk) = keypair(&secp, 5);
    let inputs = BlindingInputs {
        balancing_pubkey: Some(balancing_pk),
        ..inputs
    };
    let report = tx.blind(&mut rng(3), &secp, &inputs, &BlinderConfig::default()).unwrap();
    assert_eq!(report.balancing_output, Some(2));
    assert_eq!(tx.output.len(), 3);
    assert!(tx.output[2].is_provably_unspendable());
    assert_eq!(report.output_secrets[&2].value, 0);
    tx.verify_tx_amt_proofs(&secp, &spent).unwrap();

    // the first receiver cannot open the balancing output
    assert_eq!(tx.output[2].unblind(&secp, sk), Err(UnblindError::NotOwned));
}

#[test]
fn lone_output_from_explicit_inputs() {
    let secp = Secp256k1::new();
    let (sk, pk) = keypair(&secp, 2);
    let (mut tx, spent, inputs) = spending(&secp, &[(asset(0), 10_000)]);
    tx.output.push(TxOut::new_to_blind(9_000, asset(0), script(&secp, 2), pk));
    tx.output.push(TxOut::new_fee(1_000, asset(0)));

    let err = raw_blind_transaction(&mut rng(1), &secp, &tx, &inputs, &BlinderConfig::default());
    assert_eq!(err.unwrap_err(), BlindError::LoneBlindedOutput(0));

    let (_, balancing_pk) = keypair(&secp, 5);
    let inputs = BlindingInputs {
        balancing_pubkey: Some(balancing_pk),
        ..inputs
    };
    let report = tx.blind(&mut rng(1), &secp, &inputs, &BlinderConfig::default()).unwrap();
    assert_eq!(report.balancing_output, Some(2));
    tx.verify_tx_amt_proofs(&secp, &spent).unwrap();
    assert_eq!(tx.output[0].unblind(&secp, sk).unwrap().value, 9_000);

    // the commitment must not be the unblinded one anybody can recompute
    let unblinded = PedersenCommitment::new_unblinded(
        &secp,
        9_000,
        Generator::new_unblinded(&secp, asset(0).into_tag()),
    );
    assert_ne!(tx.output[0].value.commitment(), Some(unblinded));
}

#[test]
fn balanced_explicit_transaction_is_left_alone() {
    let secp = Secp256k1::new();
    let (mut tx, spent, inputs) = spending(&secp, &[(asset(0), 1_000)]);
    tx.output.push(explicit(asset(0), 900, script(&secp, 2)));
    tx.output.push(TxOut::new_fee(100, asset(0)));
    let (blinded, report) =
        raw_blind_transaction(&mut rng(1), &secp, &tx, &inputs, &BlinderConfig::default()).unwrap();
    assert!(!report.changed());
    assert_eq!(blinded, tx);
    blinded.verify_tx_amt_proofs(&secp, &spent).unwrap();
}

#[test]
fn too_many_assets() {
    let secp = Secp256k1::new();
    let (_, pk) = keypair(&secp, 2);
    let prevouts: Vec<_> = (0..257).map(|n| (asset(n), 1_000)).collect();
    let (mut tx, _, inputs) = spending(&secp, &prevouts);
    tx.output.push(TxOut::new_to_blind(1_000, asset(0), script(&secp, 2), pk));
    let before = tx.clone();

    let err = tx.blind(&mut rng(1), &secp, &inputs, &BlinderConfig::default()).unwrap_err();
    assert_eq!(err, BlindError::ResourceLimit(ResourceLimitError::TooManyAssets));
    assert!(err.to_string().starts_with("Transaction blinding failed."));
    assert_eq!(tx, before);
}

#[test]
fn many_inputs_of_one_asset() {
    let secp = Secp256k1::new();
    let (sk, pk) = keypair(&secp, 2);
    let prevouts = vec![(asset(0), 1_000); 300];
    let (mut tx, spent, inputs) = spending(&secp, &prevouts);
    tx.output.push(TxOut::new_to_blind(200_000, asset(0), script(&secp, 2), pk));
    tx.output.push(TxOut::new_to_blind(99_000, asset(0), script(&secp, 2), pk));
    tx.output.push(TxOut::new_fee(1_000, asset(0)));

    tx.blind(&mut rng(1), &secp, &inputs, &BlinderConfig::default()).unwrap();
    tx.verify_tx_amt_proofs(&secp, &spent).unwrap();
    assert_eq!(tx.output[0].unblind(&secp, sk).unwrap().value, 200_000);
}

#[test]
fn transaction_too_large() {
    let secp = Secp256k1::new();
    let (_, pk) = keypair(&secp, 2);
    let (mut tx, _, inputs) = spending(&secp, &[(asset(0), 1_000)]);
    tx.output.push(TxOut::new_to_blind(1_000, asset(0), script(&secp, 2), pk));
    let config = BlinderConfig {
        max_tx_weight: 4_000,
        ..Default::default()
    };
    let err = tx.blind(&mut rng(1), &secp, &inputs, &config).unwrap_err();
    assert_eq!(err, BlindError::ResourceLimit(ResourceLimitError::TransactionTooLarge));
    assert_eq!(err.to_string(), "Transaction too large");
}

#[test]
fn output_asset_must_be_an_input_asset() {
    let secp = Secp256k1::new();
    let (_, pk) = keypair(&secp, 2);
    let (mut tx, _, inputs) = spending(&secp, &[(asset(0), 1_000)]);
    tx.output.push(TxOut::new_to_blind(1_000, asset(1), script(&secp, 2), pk));
    let err = tx.blind(&mut rng(1), &secp, &inputs, &BlinderConfig::default()).unwrap_err();
    assert_eq!(err, BlindError::SurjectionInputMissing(0, asset(1)));

    let (mut tx, _, mut inputs) = spending(&secp, &[(asset(0), 1_000)]);
    inputs.spent_utxo_secrets.clear();
    tx.output.push(TxOut::new_to_blind(1_000, asset(0), script(&secp, 2), pk));
    let err = tx.blind(&mut rng(1), &secp, &inputs, &BlinderConfig::default()).unwrap_err();
    assert_eq!(err, BlindError::UtxoInputLenMismatch);
}

#[test]
fn blinded_issuance() {
    let secp = Secp256k1::new();
    let (issuance_sk, _) = keypair(&secp, 7);
    let (_, pk) = keypair(&secp, 2);
    let (mut tx, spent, mut inputs) = spending(&secp, &[(asset(0), 10_000)]);
    tx.input[0].asset_issuance = AssetIssuance::new_issuance(ContractHash::from_byte_array([0; 32]), 500, 1);
    let (issued, token) = tx.input[0].issuance_ids_with(true);
    tx.output.push(TxOut::new_to_blind(500, issued, script(&secp, 2), pk));
    tx.output.push(TxOut::new_to_blind(1, token, script(&secp, 2), pk));
    tx.output.push(TxOut::new_to_blind(9_000, asset(0), script(&secp, 2), pk));
    tx.output.push(TxOut::new_fee(1_000, asset(0)));
    inputs.issuance_keys.insert(0, issuance_sk);

    let report = tx.blind(&mut rng(1), &secp, &inputs, &BlinderConfig::default()).unwrap();
    assert_eq!(tx.input[0].issuance_ids(), (issued, token));
    assert!(tx.input[0].asset_issuance.amount.is_confidential());
    assert!(tx.input[0].witness.amount_rangeproof.is_some());
    assert_eq!(report.issuance_secrets[&0].amount.unwrap().value, 500);
    tx.verify_tx_amt_proofs(&secp, &spent).unwrap();

    // only the issuance blinding key opens the amounts
    let opened = tx.input[0].unblind_issuance(&secp, Some(issuance_sk)).unwrap();
    assert_eq!(opened.amount.unwrap().value, 500);
    assert_eq!(opened.token.unwrap().value, 1);
    assert_eq!(opened.token.unwrap().asset, token);
    assert_eq!(tx.input[0].unblind_issuance(&secp, None), Err(UnblindError::NotOwned));
    let (wrong, _) = keypair(&secp, 8);
    assert_eq!(tx.input[0].unblind_issuance(&secp, Some(wrong)), Err(UnblindError::NotOwned));

    // a confidential issuance without its key cannot be re-blinded
    inputs.issuance_keys.clear();
    inputs.output_secrets = report.output_secrets;
    let err = tx.clone().blind(&mut rng(2), &secp, &inputs, &BlinderConfig::default()).unwrap_err();
    assert_eq!(err, BlindError::MissingIssuanceSecrets(0));
}

#[test]
fn tampered_proofs_fail_verification() {
    use elements_ct::VerificationError;

    let secp = Secp256k1::new();
    let (_, pk) = keypair(&secp, 2);
    let (mut tx, spent, inputs) = spending(&secp, &[(asset(0), 10_000)]);
    tx.output.push(TxOut::new_to_blind(5_000, asset(0), script(&secp, 2), pk));
    tx.output.push(TxOut::new_to_blind(5_000, asset(0), script(&secp, 3), pk));
    tx.blind(&mut rng(1), &secp, &inputs, &BlinderConfig::default()).unwrap();

    let mut swapped = tx.clone();
    swapped.output[0].witness.rangeproof = tx.output[1].witness.rangeproof.clone();
    assert!(matches!(
        swapped.verify_tx_amt_proofs(&secp, &spent),
        Err(VerificationError::RangeProofError(0, _))
    ));

    let mut stripped = tx.clone();
    stripped.output[1].witness.surjection_proof = None;
    assert_eq!(
        stripped.verify_tx_amt_proofs(&secp, &spent),
        Err(VerificationError::SurjectionProofMissing(1))
    );

    let mut inflated = tx.clone();
    inflated.output.push(TxOut::new_fee(1, asset(0)));
    assert_eq!(
        inflated.verify_tx_amt_proofs(&secp, &spent),
        Err(VerificationError::BalanceCheckFailed)
    );
}

#[test]
fn zero_explicit_issuance_amount() {
    let secp = Secp256k1::new();
    let (mut tx, spent, _) = spending(&secp, &[(asset(0), 1_000)]);
    tx.input[0].asset_issuance = AssetIssuance::new_issuance(ContractHash::from_byte_array([0; 32]), 0, 5);
    tx.input[0].asset_issuance.amount = Value::Explicit(0);
    let (_, token) = tx.input[0].issuance_ids();
    tx.output.push(explicit(token, 5, script(&secp, 2)));
    tx.output.push(TxOut::new_fee(1_000, asset(0)));
    tx.verify_tx_amt_proofs(&secp, &spent).unwrap();

    tx.output[0].value = Value::Explicit(6);
    assert_eq!(
        tx.verify_tx_amt_proofs(&secp, &spent),
        Err(elements_ct::VerificationError::BalanceCheckFailed)
    );
}
