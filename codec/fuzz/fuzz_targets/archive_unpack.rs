#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use keystone_codec::{Archive, Limits, SerializeType, Vector3};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Read {
    U16,
    U32,
    U64,
    I32,
    I64,
    F32,
    Bool,
    String,
    List,
    Vector,
    Fixed(u8),
    SingleByte,
    Unencoded,
}

#[derive(Arbitrary, Debug)]
struct Input {
    data: Vec<u8>,
    reads: Vec<Read>,
}

fn fuzz(input: Input) {
    let limits = Limits {
        max_string_length: 1024,
        max_list_length: 1024,
    };
    let Ok(mut archive) =
        Archive::unpacking_with_limits(SerializeType::Transient, Bytes::from(input.data), limits)
    else {
        return;
    };

    let mut failed = false;
    for read in input.reads {
        let position = archive.position();
        let success = match read {
            Read::U16 => archive.transfer(&mut 0u16),
            Read::U32 => archive.transfer(&mut 0u32),
            Read::U64 => archive.transfer(&mut 0u64),
            Read::I32 => archive.transfer(&mut 0i32),
            Read::I64 => archive.transfer(&mut 0i64),
            Read::F32 => archive.transfer(&mut 0f32),
            Read::Bool => archive.transfer(&mut false),
            Read::String => archive.transfer(&mut String::new()),
            Read::List => archive.transfer_list(&mut Vec::<u64>::new()),
            Read::Vector => archive.transfer(&mut Vector3::ZERO),
            Read::Fixed(precision) => archive.transfer_float_fixed(&mut 0.0, precision % 24),
            Read::SingleByte => archive.read_single_byte(&mut 0),
            Read::Unencoded => archive.read_unencoded_stream(&mut 0u64),
        };

        // Failure is sticky and a failed archive never advances.
        if failed {
            assert!(!success);
            assert_eq!(archive.position(), position);
        }
        failed |= !success;
        assert_eq!(archive.is_success(), !failed);
    }
}

fuzz_target!(|input: Input| {
    fuzz(input);
});
