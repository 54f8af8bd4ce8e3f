#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // Split the input into "old" and "new"; any split must roundtrip.
    let split = 1 + (data[0] as usize % (data.len() - 1));
    let (old, new) = data.split_at(split);

    let patch = bsdelta::engine::create_patch(old, new).unwrap();
    let rebuilt = bsdelta::engine::apply_patch(old, &patch).unwrap();
    assert_eq!(rebuilt, new);
});
