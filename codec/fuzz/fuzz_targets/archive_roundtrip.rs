#![no_main]

use arbitrary::Arbitrary;
use keystone_codec::{
    fixed, Archive, Error, Limits, Orientation, ReplicationPolicy, SerializeType, Transfer,
    Vector3,
};
use libfuzzer_sys::fuzz_target;

const MAX_PRECISION: u8 = 24;

#[derive(Arbitrary, Debug, Clone)]
enum Field {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    Bool(bool),
    String(String),
    List(Vec<u32>),
    Vector([f32; 3]),
    Fixed(f32, u8),
    VectorFixed([f32; 3], u8),
    OrientationFixed([f32; 3], bool, u8),
    SingleByte(u8),
    Unencoded(u64),
}

#[derive(Arbitrary, Debug)]
struct Input {
    policy: u64,
    persistent: bool,
    max_length: u8,
    fields: Vec<Field>,
}

fn fixed_roundtrip(value: f32, precision: u8) -> f32 {
    fixed::from_fixed(fixed::to_fixed(value, precision), precision)
}

fn pack(archive: &mut Archive, field: &Field) -> bool {
    match field.clone() {
        Field::U8(mut v) => archive.transfer(&mut v),
        Field::U16(mut v) => archive.transfer(&mut v),
        Field::U32(mut v) => archive.transfer(&mut v),
        Field::U64(mut v) => archive.transfer(&mut v),
        Field::I16(mut v) => archive.transfer(&mut v),
        Field::I32(mut v) => archive.transfer(&mut v),
        Field::I64(mut v) => archive.transfer(&mut v),
        Field::F32(mut v) => archive.transfer(&mut v),
        Field::Bool(mut v) => archive.transfer(&mut v),
        Field::String(mut v) => archive.transfer(&mut v),
        Field::List(mut v) => archive.transfer_list(&mut v),
        Field::Vector([x, y, z]) => archive.transfer(&mut Vector3::new(x, y, z)),
        Field::Fixed(mut v, p) => archive.transfer_float_fixed(&mut v, p % MAX_PRECISION),
        Field::VectorFixed([x, y, z], p) => {
            archive.transfer_vector_fixed(&mut Vector3::new(x, y, z), p % MAX_PRECISION)
        }
        Field::OrientationFixed([yaw, pitch, roll], yaw_only, p) => archive
            .transfer_orientation_fixed(
                &mut Orientation::new(yaw, pitch, roll),
                yaw_only,
                p % MAX_PRECISION,
            ),
        Field::SingleByte(v) => archive.write_single_byte(v),
        Field::Unencoded(v) => archive.write_unencoded_stream(v),
    }
}

fn transfer<T: Transfer + Default>(archive: &mut Archive) -> T {
    let mut value = T::default();
    assert!(archive.transfer(&mut value));
    value
}

fn unpack_and_check(archive: &mut Archive, field: &Field) {
    match field {
        Field::U8(v) => assert_eq!(transfer::<u8>(archive), *v),
        Field::U16(v) => assert_eq!(transfer::<u16>(archive), *v),
        Field::U32(v) => assert_eq!(transfer::<u32>(archive), *v),
        Field::U64(v) => assert_eq!(transfer::<u64>(archive), *v),
        Field::I16(v) => assert_eq!(transfer::<i16>(archive), *v),
        Field::I32(v) => assert_eq!(transfer::<i32>(archive), *v),
        Field::I64(v) => assert_eq!(transfer::<i64>(archive), *v),
        Field::F32(v) => assert_eq!(transfer::<f32>(archive).to_bits(), v.to_bits()),
        Field::Bool(v) => assert_eq!(transfer::<bool>(archive), *v),
        Field::String(v) => assert_eq!(&transfer::<String>(archive), v),
        Field::List(v) => {
            let mut decoded: Vec<u32> = Vec::new();
            assert!(archive.transfer_list(&mut decoded));
            assert_eq!(&decoded, v);
        }
        Field::Vector([x, y, z]) => {
            let decoded = transfer::<Vector3>(archive);
            assert_eq!(decoded.x.to_bits(), x.to_bits());
            assert_eq!(decoded.y.to_bits(), y.to_bits());
            assert_eq!(decoded.z.to_bits(), z.to_bits());
        }
        Field::Fixed(v, p) => {
            let p = p % MAX_PRECISION;
            let mut decoded = 0.0;
            assert!(archive.transfer_float_fixed(&mut decoded, p));
            assert_eq!(decoded.to_bits(), fixed_roundtrip(*v, p).to_bits());
        }
        Field::VectorFixed([x, y, z], p) => {
            let p = p % MAX_PRECISION;
            let mut decoded = Vector3::ZERO;
            assert!(archive.transfer_vector_fixed(&mut decoded, p));
            assert_eq!(decoded.x.to_bits(), fixed_roundtrip(*x, p).to_bits());
            assert_eq!(decoded.y.to_bits(), fixed_roundtrip(*y, p).to_bits());
            assert_eq!(decoded.z.to_bits(), fixed_roundtrip(*z, p).to_bits());
        }
        Field::OrientationFixed([yaw, pitch, roll], yaw_only, p) => {
            let p = p % MAX_PRECISION;
            let mut decoded = Orientation::new(1.0, 1.0, 1.0);
            assert!(archive.transfer_orientation_fixed(&mut decoded, *yaw_only, p));
            assert_eq!(decoded.yaw.to_bits(), fixed_roundtrip(*yaw, p).to_bits());
            if *yaw_only {
                assert_eq!(decoded.pitch, 0.0);
                assert_eq!(decoded.roll, 0.0);
            } else {
                assert_eq!(decoded.pitch.to_bits(), fixed_roundtrip(*pitch, p).to_bits());
                assert_eq!(decoded.roll.to_bits(), fixed_roundtrip(*roll, p).to_bits());
            }
        }
        Field::SingleByte(v) => {
            let mut decoded = 0;
            assert!(archive.read_single_byte(&mut decoded));
            assert_eq!(decoded, *v);
        }
        Field::Unencoded(v) => {
            let mut decoded = 0u64;
            assert!(archive.read_unencoded_stream(&mut decoded));
            assert_eq!(decoded, *v);
        }
    }
}

fn within(limits: &Limits, field: &Field) -> bool {
    match field {
        Field::String(v) => v.len() <= limits.max_string_length,
        Field::List(v) => v.len() <= limits.max_list_length,
        _ => true,
    }
}

fn fuzz(input: Input) {
    let serialize_type = if input.persistent {
        SerializeType::Persistent
    } else {
        SerializeType::Replication
    };
    let policy = ReplicationPolicy::from_bits(input.policy);

    // Small enough that arbitrary strings and lists cross them.
    let limits = Limits {
        max_string_length: input.max_length as usize,
        max_list_length: input.max_length as usize,
    };

    // Only fields that fit the limits are packed; anything larger must be refused.
    let mut archive = Archive::packing_with_limits(serialize_type, policy, limits);
    let mut packed = Vec::new();
    for field in input.fields {
        if within(&limits, &field) {
            assert!(pack(&mut archive, &field));
            packed.push(field);
        } else {
            let mut rejected = Archive::packing_with_limits(serialize_type, policy, limits);
            assert!(!pack(&mut rejected, &field));
            assert!(matches!(rejected.error(), Some(Error::LengthExceeded(_, _))));
        }
    }
    let bytes = archive.into_bytes();

    let mut archive = Archive::unpacking_with_limits(serialize_type, bytes, limits)
        .expect("header of a packed archive must decode");
    assert_eq!(archive.replication_policy(), policy);
    for field in &packed {
        unpack_and_check(&mut archive, field);
    }
    assert!(archive.is_success());
    assert_eq!(archive.remaining(), 0);
}

fuzz_target!(|input: Input| {
    fuzz(input);
});
