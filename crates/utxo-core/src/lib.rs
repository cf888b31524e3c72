//! UTXO Core
//!
//! Chain-agnostic building blocks shared by the descriptor wallet crates.
//!
//! # Contents
//!
//! - **Outputs**: fixed-value outputs plus the single `max` placeholder
//!   output that absorbs whatever remains after fees
//! - **Networks**: coin networks, normalized to their mainnet family
//! - **Dust**: per-network minimum economically spendable output value

pub mod dust;
pub mod network;
pub mod output;

pub use dust::{get_dust_threshold_sat, get_dust_threshold_sat_for_coin, DustError};
pub use network::{CoinFamily, NetworkError, UtxoNetwork};
pub use output::{
    get_fixed_output_sum, get_max_output, get_output_sum, is_max_output, to_fixed_outputs,
    Output, OutputError, OutputValue,
};
