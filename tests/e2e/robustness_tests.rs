//! Malformed-input tests.
//!
//! These verify:
//! 1. Bad descriptor strings are rejected, not accepted partially
//! 2. Hostile PSBTs produce errors, never panics
//! 3. Policy functions answer for every known network
//! 4. PayGo verification rejects garbage proofs

use bitcoin::absolute::LockTime;
use bitcoin::bip32::{ChildNumber, DerivationPath};
use bitcoin::psbt::raw::ProprietaryKey;
use bitcoin::transaction::Version;
use bitcoin::{Amount, Network, Psbt, ScriptBuf, Transaction, TxOut};
use rand::{Rng, RngCore};
use std::str::FromStr;
use utxo_core::{get_dust_threshold_sat, get_dust_threshold_sat_for_coin, DustError, UtxoNetwork};
use utxo_descriptor::{
    find_descriptor, parse, to_descriptor_map, DescriptorError, FindDescriptorError, ParseError,
};
use utxo_paygo::{verify_paygo_address_proof, PayGoError};

// ============================================================================
// 1. Descriptor parsing
// ============================================================================

#[test]
fn test_garbage_descriptors_rejected() {
    for bad in [
        "",
        "wsh(",
        "wsh(multi(2))",
        "wsh(multi(3,02aaaa,02bbbb))",
        "pkh(xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8/0/*)#badchksm",
        "notadescriptor(abc)",
    ] {
        let result = to_descriptor_map([("x", bad)]);
        assert!(
            matches!(result, Err(DescriptorError::Miniscript(_))),
            "accepted {:?}",
            bad
        );
    }
}

#[test]
fn test_duplicate_names_rejected() {
    let d = "wpkh(02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9)";
    assert!(matches!(
        to_descriptor_map([("a", d), ("a", d)]),
        Err(DescriptorError::DuplicateDescriptorName(_))
    ));
}

// ============================================================================
// 2. Hostile PSBTs
// ============================================================================

fn empty_psbt(outputs: usize) -> Psbt {
    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![],
        output: (0..outputs)
            .map(|i| TxOut {
                value: Amount::from_sat(1000 + i as u64),
                script_pubkey: ScriptBuf::from_bytes(vec![0x6a, i as u8]),
            })
            .collect(),
    };
    Psbt::from_unsigned_tx(tx).unwrap()
}

#[test]
fn test_random_bytes_never_panic() {
    let map = to_descriptor_map([(
        "single",
        "wpkh(02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9)",
    )])
    .unwrap();

    let mut rng = rand::thread_rng();
    for _ in 0..500 {
        let len = rng.gen_range(0..512);
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        // prepend the magic so some inputs get past the header
        let mut data = b"psbt\xff".to_vec();
        data.extend_from_slice(&bytes);

        if let Ok(psbt) = Psbt::deserialize(&data) {
            let _ = parse(&psbt, &map, Network::Bitcoin);
        }
    }
}

#[test]
fn test_non_standard_outputs_are_external() {
    let map = to_descriptor_map([(
        "single",
        "wpkh(02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9)",
    )])
    .unwrap();
    let parsed = parse(&empty_psbt(3), &map, Network::Bitcoin).unwrap();

    assert!(parsed.inputs.is_empty());
    assert!(parsed.outputs.iter().all(|o| o.address.is_none()));
    assert_eq!(parsed.spend_amount, Amount::from_sat(3003));
    assert_eq!(parsed.miner_fee.to_sat(), -3003);
}

#[test]
fn test_hardened_hint_is_error_not_guess() {
    let map = to_descriptor_map([(
        "single",
        "wpkh(02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9)",
    )])
    .unwrap();
    let hardened = DerivationPath::from(vec![ChildNumber::from_hardened_idx(5).unwrap()]);
    let result = find_descriptor(&ScriptBuf::new(), &[hardened], &map);
    assert!(matches!(
        result,
        Err(FindDescriptorError::InvalidDerivationPath(_))
    ));

    let plain = DerivationPath::from_str("m/0/1").unwrap();
    assert!(find_descriptor(&ScriptBuf::new(), &[plain], &map)
        .unwrap()
        .is_none());
}

#[test]
fn test_missing_prev_output_is_hard_error() {
    use bitcoin::{OutPoint, Sequence, TxIn, Witness};

    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![],
    };
    let psbt = Psbt::from_unsigned_tx(tx).unwrap();
    let map = to_descriptor_map([(
        "single",
        "wpkh(02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9)",
    )])
    .unwrap();

    assert!(matches!(
        parse(&psbt, &map, Network::Bitcoin),
        Err(ParseError::Find(FindDescriptorError::MissingPrevOutput(0)))
    ));
}

// ============================================================================
// 3. Dust policy coverage
// ============================================================================

#[test]
fn test_dust_defined_for_every_network() {
    for network in UtxoNetwork::ALL {
        for size in [0usize, 31, 34, 43, 10_000] {
            for witness in [false, true] {
                match get_dust_threshold_sat(network, size, witness) {
                    Ok(sat) => assert!(sat > 0 || size == 0),
                    Err(DustError::DeprecatedCoin(mainnet)) => {
                        assert_eq!(mainnet, UtxoNetwork::BitcoinSv)
                    }
                    Err(e) => panic!("{} failed: {}", network, e),
                }
            }
        }
    }
    assert!(matches!(
        get_dust_threshold_sat_for_coin("", 34, false),
        Err(DustError::UnsupportedNetwork(_))
    ));
}

// ============================================================================
// 4. PayGo garbage
// ============================================================================

#[test]
fn test_paygo_garbage_signatures() {
    let secp = secp256k1::Secp256k1::new();
    let pubkey = secp256k1::SecretKey::from_slice(&[9; 32])
        .unwrap()
        .public_key(&secp);
    let address_script = bitcoin::Address::from_str("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4")
        .unwrap()
        .require_network(Network::Bitcoin)
        .unwrap()
        .script_pubkey();

    let mut rng = rand::thread_rng();
    for len in [0usize, 1, 64, 65, 66, 200] {
        let mut psbt = empty_psbt(1);
        psbt.unsigned_tx.output[0].script_pubkey = address_script.clone();

        let mut signature = vec![0u8; len];
        rng.fill_bytes(&mut signature);
        let key = ProprietaryKey {
            prefix: b"BITGO".to_vec(),
            subtype: 0x04,
            key: vec![0; 65],
        };
        psbt.outputs[0].proprietary.insert(key, signature);

        let result = verify_paygo_address_proof(&psbt, 0, &pubkey, Network::Bitcoin);
        assert!(matches!(
            result,
            Err(PayGoError::InvalidSignature(_))
                | Err(PayGoError::PayGoAddressProofFailedVerification)
        ));
    }
}
