#![no_main]
use libfuzzer_sys::fuzz_target;
use bsdelta::patch::{container, control, header};

fuzz_target!(|data: &[u8]| {
    // Header and container parsing over arbitrary bytes.
    let _ = header::PatchHeader::decode(data);
    if let Ok(decoded) = container::decode_container(data) {
        let _ = control::parse_stream(&decoded.control);
    }
});
