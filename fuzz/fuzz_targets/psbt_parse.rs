#![no_main]

use bitcoin::{Network, Psbt};
use libfuzzer_sys::fuzz_target;
use utxo_descriptor::{get_virtual_size_estimate_for_psbt, parse, to_descriptor_map};

const EXTERNAL: &str = "wsh(multi(2,xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8/0/*,xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw/0/*))";
const INTERNAL: &str = "wsh(multi(2,xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8/1/*,xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw/1/*))";

fuzz_target!(|data: &[u8]| {
    // Parsing a hostile PSBT must return Ok or Err, never panic.
    let Ok(psbt) = Psbt::deserialize(data) else {
        return;
    };
    let Ok(map) = to_descriptor_map([("external", EXTERNAL), ("internal", INTERNAL)]) else {
        return;
    };

    let _ = parse(&psbt, &map, Network::Bitcoin);
    let _ = get_virtual_size_estimate_for_psbt(&psbt, &map);
});
