//! Coin networks
//!
//! Every test network belongs to the same [`CoinFamily`] as its mainnet, and
//! policy decisions are made per family.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),
}

/// A UTXO coin network (mainnet or one of its test networks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UtxoNetwork {
    Bitcoin,
    BitcoinTestnet,
    BitcoinTestnet4,
    BitcoinSignet,
    BitcoinRegtest,
    BitcoinCash,
    BitcoinCashTestnet,
    Ecash,
    EcashTestnet,
    BitcoinGold,
    BitcoinGoldTestnet,
    BitcoinSv,
    BitcoinSvTestnet,
    Litecoin,
    LitecoinTestnet,
    Dash,
    DashTestnet,
    Dogecoin,
    DogecoinTestnet,
    Zcash,
    ZcashTestnet,
}

/// The mainnet a network belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoinFamily {
    Bitcoin,
    BitcoinCash,
    Ecash,
    BitcoinGold,
    BitcoinSv,
    Litecoin,
    Dash,
    Dogecoin,
    Zcash,
}

impl UtxoNetwork {
    /// All known networks
    pub const ALL: [UtxoNetwork; 21] = [
        UtxoNetwork::Bitcoin,
        UtxoNetwork::BitcoinTestnet,
        UtxoNetwork::BitcoinTestnet4,
        UtxoNetwork::BitcoinSignet,
        UtxoNetwork::BitcoinRegtest,
        UtxoNetwork::BitcoinCash,
        UtxoNetwork::BitcoinCashTestnet,
        UtxoNetwork::Ecash,
        UtxoNetwork::EcashTestnet,
        UtxoNetwork::BitcoinGold,
        UtxoNetwork::BitcoinGoldTestnet,
        UtxoNetwork::BitcoinSv,
        UtxoNetwork::BitcoinSvTestnet,
        UtxoNetwork::Litecoin,
        UtxoNetwork::LitecoinTestnet,
        UtxoNetwork::Dash,
        UtxoNetwork::DashTestnet,
        UtxoNetwork::Dogecoin,
        UtxoNetwork::DogecoinTestnet,
        UtxoNetwork::Zcash,
        UtxoNetwork::ZcashTestnet,
    ];

    /// The coin family this network belongs to
    pub fn family(self) -> CoinFamily {
        match self {
            UtxoNetwork::Bitcoin
            | UtxoNetwork::BitcoinTestnet
            | UtxoNetwork::BitcoinTestnet4
            | UtxoNetwork::BitcoinSignet
            | UtxoNetwork::BitcoinRegtest => CoinFamily::Bitcoin,
            UtxoNetwork::BitcoinCash | UtxoNetwork::BitcoinCashTestnet => CoinFamily::BitcoinCash,
            UtxoNetwork::Ecash | UtxoNetwork::EcashTestnet => CoinFamily::Ecash,
            UtxoNetwork::BitcoinGold | UtxoNetwork::BitcoinGoldTestnet => CoinFamily::BitcoinGold,
            UtxoNetwork::BitcoinSv | UtxoNetwork::BitcoinSvTestnet => CoinFamily::BitcoinSv,
            UtxoNetwork::Litecoin | UtxoNetwork::LitecoinTestnet => CoinFamily::Litecoin,
            UtxoNetwork::Dash | UtxoNetwork::DashTestnet => CoinFamily::Dash,
            UtxoNetwork::Dogecoin | UtxoNetwork::DogecoinTestnet => CoinFamily::Dogecoin,
            UtxoNetwork::Zcash | UtxoNetwork::ZcashTestnet => CoinFamily::Zcash,
        }
    }

    /// Normalize to the mainnet of this network's family
    pub fn mainnet(self) -> UtxoNetwork {
        self.family().mainnet()
    }

    /// True if this is a mainnet
    pub fn is_mainnet(self) -> bool {
        self.mainnet() == self
    }

    /// Ticker-style name, e.g. `btc`, `tbtc`, `ltc`
    pub fn name(self) -> &'static str {
        match self {
            UtxoNetwork::Bitcoin => "btc",
            UtxoNetwork::BitcoinTestnet => "tbtc",
            UtxoNetwork::BitcoinTestnet4 => "tbtc4",
            UtxoNetwork::BitcoinSignet => "tbtcsig",
            UtxoNetwork::BitcoinRegtest => "rbtc",
            UtxoNetwork::BitcoinCash => "bch",
            UtxoNetwork::BitcoinCashTestnet => "tbch",
            UtxoNetwork::Ecash => "bcha",
            UtxoNetwork::EcashTestnet => "tbcha",
            UtxoNetwork::BitcoinGold => "btg",
            UtxoNetwork::BitcoinGoldTestnet => "tbtg",
            UtxoNetwork::BitcoinSv => "bsv",
            UtxoNetwork::BitcoinSvTestnet => "tbsv",
            UtxoNetwork::Litecoin => "ltc",
            UtxoNetwork::LitecoinTestnet => "tltc",
            UtxoNetwork::Dash => "dash",
            UtxoNetwork::DashTestnet => "tdash",
            UtxoNetwork::Dogecoin => "doge",
            UtxoNetwork::DogecoinTestnet => "tdoge",
            UtxoNetwork::Zcash => "zec",
            UtxoNetwork::ZcashTestnet => "tzec",
        }
    }
}

impl CoinFamily {
    /// The mainnet of this family
    pub fn mainnet(self) -> UtxoNetwork {
        match self {
            CoinFamily::Bitcoin => UtxoNetwork::Bitcoin,
            CoinFamily::BitcoinCash => UtxoNetwork::BitcoinCash,
            CoinFamily::Ecash => UtxoNetwork::Ecash,
            CoinFamily::BitcoinGold => UtxoNetwork::BitcoinGold,
            CoinFamily::BitcoinSv => UtxoNetwork::BitcoinSv,
            CoinFamily::Litecoin => UtxoNetwork::Litecoin,
            CoinFamily::Dash => UtxoNetwork::Dash,
            CoinFamily::Dogecoin => UtxoNetwork::Dogecoin,
            CoinFamily::Zcash => UtxoNetwork::Zcash,
        }
    }
}

impl fmt::Display for UtxoNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UtxoNetwork {
    type Err = NetworkError;

    /// Parse a ticker name (`btc`, `tltc`, ...) or a rust-bitcoin network name
    /// (`bitcoin`, `testnet`, `testnet4`, `signet`, `regtest`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "bitcoin" | "mainnet" => return Ok(UtxoNetwork::Bitcoin),
            "testnet" | "testnet3" => return Ok(UtxoNetwork::BitcoinTestnet),
            "testnet4" => return Ok(UtxoNetwork::BitcoinTestnet4),
            "signet" => return Ok(UtxoNetwork::BitcoinSignet),
            "regtest" => return Ok(UtxoNetwork::BitcoinRegtest),
            _ => {}
        }
        UtxoNetwork::ALL
            .iter()
            .copied()
            .find(|n| n.name() == lower)
            .ok_or_else(|| NetworkError::UnsupportedNetwork(s.to_string()))
    }
}

impl From<bitcoin::Network> for UtxoNetwork {
    fn from(network: bitcoin::Network) -> Self {
        match network {
            bitcoin::Network::Bitcoin => UtxoNetwork::Bitcoin,
            bitcoin::Network::Signet => UtxoNetwork::BitcoinSignet,
            bitcoin::Network::Regtest => UtxoNetwork::BitcoinRegtest,
            bitcoin::Network::Testnet4 => UtxoNetwork::BitcoinTestnet4,
            // testnet3, and any variant added later
            _ => UtxoNetwork::BitcoinTestnet,
        }
    }
}
