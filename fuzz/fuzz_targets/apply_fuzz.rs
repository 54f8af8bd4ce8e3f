#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz the replay path with arbitrary bytes as the patch.
    // It must never panic — only return errors.
    let _ = bsdelta::engine::apply_patch(&[], data);

    // Also fuzz with a non-empty old file.
    if data.len() >= 2 {
        let split = data.len() / 2;
        let (old, patch) = data.split_at(split);
        let _ = bsdelta::engine::apply_patch(old, patch);
    }
});
