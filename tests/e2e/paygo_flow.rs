//! PayGo attestation across the full PSBT flow.
//!
//! The authority signs an attestation for the destination address, the
//! builder's PSBT carries the proof on the external output, and a cosigner
//! verifies it before signing.

use bitcoin::bip32::{DerivationPath, Xpriv, Xpub};
use bitcoin::hashes::Hash;
use bitcoin::{Address, Amount, Network, OutPoint, Psbt, Txid};
use rand::RngCore;
use secp256k1::{Secp256k1, SecretKey};
use std::str::FromStr;
use utxo_core::Output;
use utxo_descriptor::{
    create_psbt, derive_descriptor, parse, to_descriptor_map, DescriptorMap,
    DescriptorWalletOutput, PrevOutput, PsbtParams, WithOptDescriptor,
};
use utxo_paygo::{
    add_paygo_address_proof, create_paygo_attestation_buffer,
    get_paygo_address_proof_output_index, output_includes_paygo_proof, sign_paygo_attestation,
    verify_paygo_address_proof, PayGoError,
};

const DESTINATION: &str = "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";

fn wallet() -> DescriptorMap {
    let secp = Secp256k1::new();
    let keys: Vec<String> = (1u8..=3)
        .map(|seed| {
            let master = Xpriv::new_master(Network::Bitcoin, &[seed; 32]).unwrap();
            let account = master
                .derive_priv(&secp, &DerivationPath::from_str("m/48'/0'/0'/2'").unwrap())
                .unwrap();
            format!(
                "[{}/48'/0'/0'/2']{}",
                master.fingerprint(&secp),
                Xpub::from_priv(&secp, &account)
            )
        })
        .collect();
    let multisig = |branch: u32| {
        format!(
            "wsh(multi(2,{}/{b}/*,{}/{b}/*,{}/{b}/*))",
            keys[0],
            keys[1],
            keys[2],
            b = branch
        )
    };
    to_descriptor_map([("external", multisig(0)), ("internal", multisig(1))]).unwrap()
}

fn unsigned_payment(map: &DescriptorMap) -> Psbt {
    let receive = derive_descriptor(map.require("external").unwrap(), Some(0)).unwrap();
    let prevout = DescriptorWalletOutput {
        prev_output: PrevOutput {
            outpoint: OutPoint::new(Txid::from_byte_array([0x11; 32]), 1),
            witness_utxo: Output::new(receive.script_pubkey(), Amount::from_sat(300_000)),
        },
        descriptor_name: "external".to_string(),
        descriptor_index: Some(0),
    }
    .derive(map)
    .unwrap();

    let destination = Address::from_str(DESTINATION)
        .unwrap()
        .require_network(Network::Bitcoin)
        .unwrap();
    let change = derive_descriptor(map.require("internal").unwrap(), Some(0)).unwrap();
    let outputs = vec![
        WithOptDescriptor::to_descriptor(change, Amount::from_sat(99_000)),
        WithOptDescriptor::external(Output::new(
            destination.script_pubkey(),
            Amount::from_sat(200_000),
        )),
    ];
    create_psbt(&PsbtParams::default(), &[prevout.into()], &outputs).unwrap()
}

// ============================================================================
// Attest, embed, verify
// ============================================================================

#[test]
fn test_paygo_attestation_roundtrip() {
    let secp = Secp256k1::new();
    let map = wallet();
    let mut psbt = unsigned_payment(&map);

    // ── Authority side ──────────────────────────────────────────────────
    let authority = SecretKey::new(&mut rand::thread_rng());
    let mut entropy = [0u8; 65];
    rand::thread_rng().fill_bytes(&mut entropy);
    let message = create_paygo_attestation_buffer(DESTINATION, &entropy, Network::Bitcoin).unwrap();
    let signature = sign_paygo_attestation(&secp, &authority, &message);

    // ── Wallet side ─────────────────────────────────────────────────────
    add_paygo_address_proof(&mut psbt, 1, &signature, &entropy).unwrap();
    assert_eq!(get_paygo_address_proof_output_index(&psbt).unwrap(), Some(1));
    assert!(!output_includes_paygo_proof(&psbt, 0).unwrap());

    // ── Cosigner side ───────────────────────────────────────────────────
    let parsed = parse(&psbt, &map, Network::Bitcoin).unwrap();
    let proof_index = get_paygo_address_proof_output_index(&psbt).unwrap().unwrap();
    assert!(parsed.outputs[proof_index].descriptor.is_none());
    assert_eq!(parsed.spend_amount, Amount::from_sat(200_000));

    verify_paygo_address_proof(
        &psbt,
        proof_index,
        &authority.public_key(&secp),
        Network::Bitcoin,
    )
    .unwrap();

    // proof survives PSBT serialization
    let restored = Psbt::deserialize(&psbt.serialize()).unwrap();
    verify_paygo_address_proof(
        &restored,
        proof_index,
        &authority.public_key(&secp),
        Network::Bitcoin,
    )
    .unwrap();
}

#[test]
fn test_paygo_proof_on_wrong_output_fails() {
    let secp = Secp256k1::new();
    let map = wallet();
    let mut psbt = unsigned_payment(&map);

    let authority = SecretKey::new(&mut rand::thread_rng());
    let entropy = [0x5A; 65];
    let message = create_paygo_attestation_buffer(DESTINATION, &entropy, Network::Bitcoin).unwrap();
    let signature = sign_paygo_attestation(&secp, &authority, &message);

    // attached to the change output instead of the destination
    add_paygo_address_proof(&mut psbt, 0, &signature, &entropy).unwrap();
    assert_eq!(
        verify_paygo_address_proof(&psbt, 0, &authority.public_key(&secp), Network::Bitcoin),
        Err(PayGoError::PayGoAddressProofFailedVerification)
    );
    assert_eq!(
        verify_paygo_address_proof(&psbt, 1, &authority.public_key(&secp), Network::Bitcoin),
        Err(PayGoError::NoPayGoProof)
    );
}

#[test]
fn test_attestation_from_hex_fixture() {
    let secp = Secp256k1::new();
    let authority = SecretKey::from_slice(
        &hex::decode("0000000000000000000000000000000000000000000000000000000000000001").unwrap(),
    )
    .unwrap();
    let entropy = hex::decode("00".repeat(65)).unwrap();

    let message = create_paygo_attestation_buffer(DESTINATION, &entropy, Network::Bitcoin).unwrap();
    assert_eq!(message.len(), 65 + DESTINATION.len() + 36);

    let map = wallet();
    let mut psbt = unsigned_payment(&map);
    let signature = sign_paygo_attestation(&secp, &authority, &message);
    add_paygo_address_proof(&mut psbt, 1, &signature, &entropy).unwrap();

    assert!(verify_paygo_address_proof(
        &psbt,
        1,
        &authority.public_key(&secp),
        Network::Bitcoin
    )
    .is_ok());
    assert!(verify_paygo_address_proof(&psbt, 1, &authority.public_key(&secp), Network::Testnet)
        .is_err());
}
