#![no_main]

use corvid_proto::decode_query;

libfuzzer_sys::fuzz_target!(|data: &[u8]| {
    let _ = decode_query(data);
});
