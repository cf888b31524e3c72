#![no_main]

use libfuzzer_sys::fuzz_target;
use utxo_descriptor::{derive_descriptor, to_descriptor_map, DescriptorExt};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // One descriptor per line, named by position
    let entries = s
        .lines()
        .enumerate()
        .map(|(i, line)| (i.to_string(), line));

    if let Ok(map) = to_descriptor_map(entries) {
        for (_, descriptor) in map.iter() {
            let _ = descriptor.kind();
            let _ = descriptor.absolute_locktime();
            if let Ok(derived) = derive_descriptor(descriptor, Some(0)) {
                let _ = derived.max_weight_to_satisfy();
            }
        }
    }
});
