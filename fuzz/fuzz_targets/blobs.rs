#![no_main]

use libfuzzer_sys::fuzz_target;
use symscope::debuginfo::{
    constants::decode_constant, customdebuginformation::parse_custom_debug_info,
    sequencepoints::parse_sequence_points,
};

fuzz_target!(|data: &[u8]| {
    let _ = parse_sequence_points(data);
    let _ = parse_custom_debug_info(data);
    let _ = decode_constant(data);
});
