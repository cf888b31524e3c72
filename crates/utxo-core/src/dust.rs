//! Dust threshold policy
//!
//! The dust threshold is the smallest output value a network will relay.
//! Two policy shapes exist:
//!
//! - **Fixed**: a size-independent floor (Dogecoin)
//! - **Fee rate**: `ceil(dust_relay_fee * spend_size / 1000)`, where
//!   `spend_size` approximates the serialized output plus the input that
//!   will later spend it (Bitcoin Core's `GetDustThreshold`)
//!
//! ```text
//! spend_size = output_size + 32 (txid) + 4 (vout) + 1 (script len) + sig + 4 (sequence)
//! sig        = 107            legacy spend
//!            = ceil(107 / 4)  segwit spend (witness discount)
//! ```

use crate::network::{CoinFamily, NetworkError, UtxoNetwork};
use thiserror::Error;

/// Signature + pubkey budget for a legacy P2PKH spend
const LEGACY_SPEND_SCRIPT_SIG_SIZE: u64 = 107;

/// Outpoint (32 + 4), script length (1), sequence (4)
const INPUT_FIXED_SIZE: u64 = 32 + 4 + 1 + 4;

/// Bitcoin Core `DUST_RELAY_TX_FEE`, sat/kB
const BITCOIN_DUST_RELAY_FEE: u64 = 3000;

/// Zcash: three times the 100 zat/kB minimum relay fee
const ZCASH_DUST_RELAY_FEE: u64 = 300;

/// Dogecoin soft dust limit: 0.01 DOGE
const DOGECOIN_DUST_LIMIT: u64 = 1_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DustError {
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Deprecated coin: {0}")]
    DeprecatedCoin(UtxoNetwork),

    #[error("Output size {0} overflows the dust computation")]
    OutputSizeOverflow(usize),
}

impl From<NetworkError> for DustError {
    fn from(e: NetworkError) -> Self {
        match e {
            NetworkError::UnsupportedNetwork(name) => DustError::UnsupportedNetwork(name),
        }
    }
}

/// How the spending input of an output is sized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpendSize {
    /// Segwit spends get the witness discount when `is_witness` is set
    WitnessAware,
    /// No segwit on this chain; `is_witness` is ignored
    LegacyOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DustPolicy {
    Fixed(u64),
    FeeRate { sat_per_kb: u64, spend: SpendSize },
}

fn dust_policy(network: UtxoNetwork) -> Result<DustPolicy, DustError> {
    match network.family() {
        CoinFamily::Bitcoin | CoinFamily::Litecoin | CoinFamily::BitcoinGold => {
            Ok(DustPolicy::FeeRate {
                sat_per_kb: BITCOIN_DUST_RELAY_FEE,
                spend: SpendSize::WitnessAware,
            })
        }
        CoinFamily::BitcoinCash | CoinFamily::Ecash | CoinFamily::Dash => Ok(DustPolicy::FeeRate {
            sat_per_kb: BITCOIN_DUST_RELAY_FEE,
            spend: SpendSize::LegacyOnly,
        }),
        CoinFamily::Zcash => Ok(DustPolicy::FeeRate {
            sat_per_kb: ZCASH_DUST_RELAY_FEE,
            spend: SpendSize::LegacyOnly,
        }),
        CoinFamily::Dogecoin => Ok(DustPolicy::Fixed(DOGECOIN_DUST_LIMIT)),
        CoinFamily::BitcoinSv => Err(DustError::DeprecatedCoin(network.mainnet())),
    }
}

fn spend_size(output_size: u64, is_witness: bool, spend: SpendSize) -> Option<u64> {
    let script_sig = match (spend, is_witness) {
        (SpendSize::WitnessAware, true) => LEGACY_SPEND_SCRIPT_SIG_SIZE.div_ceil(4),
        _ => LEGACY_SPEND_SCRIPT_SIG_SIZE,
    };
    output_size
        .checked_add(INPUT_FIXED_SIZE)?
        .checked_add(script_sig)
}

/// Minimum value (in satoshis) of an output that is not dust.
///
/// # Arguments
/// * `network` - Any network; test networks use their mainnet policy
/// * `output_size` - Serialized output length: 8 (value) + script length prefix + script
/// * `is_witness` - Whether the output will be spent with a witness
///
/// # Errors
/// [`DustError::DeprecatedCoin`] for retired networks,
/// [`DustError::OutputSizeOverflow`] when `output_size` is too large to price.
pub fn get_dust_threshold_sat(
    network: UtxoNetwork,
    output_size: usize,
    is_witness: bool,
) -> Result<u64, DustError> {
    match dust_policy(network)? {
        DustPolicy::Fixed(sat) => Ok(sat),
        DustPolicy::FeeRate { sat_per_kb, spend } => {
            let overflow = DustError::OutputSizeOverflow(output_size);
            let size = u64::try_from(output_size).map_err(|_| overflow.clone())?;
            spend_size(size, is_witness, spend)
                .and_then(|size| size.checked_mul(sat_per_kb))
                .map(|fee| fee.div_ceil(1000))
                .ok_or(overflow)
        }
    }
}

/// Like [`get_dust_threshold_sat`], identifying the network by name.
///
/// Unknown names fail with [`DustError::UnsupportedNetwork`].
pub fn get_dust_threshold_sat_for_coin(
    coin: &str,
    output_size: usize,
    is_witness: bool,
) -> Result<u64, DustError> {
    let network: UtxoNetwork = coin.parse()?;
    get_dust_threshold_sat(network, output_size, is_witness)
}
