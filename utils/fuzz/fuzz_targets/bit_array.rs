#![no_main]

use arbitrary::Arbitrary;
use keystone_utils::BitArray;
use libfuzzer_sys::fuzz_target;

const MAX_INDEX: u16 = 4096;

#[derive(Arbitrary, Debug)]
enum Operation {
    Set(u16),
    Reset(u16),
    SetTo(u16, bool),
    Get(u16),
    Clear,
    Resize(u16),
    Reserve(u16),
    FirstUnset,
    And(Vec<u16>),
    Or(Vec<u16>),
    Xor(Vec<u16>),
}

/// Reference model: one bool per index, sized to the array's capacity.
struct Model {
    bits: Vec<bool>,
}

impl Model {
    fn grow(&mut self, capacity: usize) {
        if self.bits.len() < capacity {
            self.bits.resize(capacity, false);
        }
    }

    fn check(&self, array: &BitArray) {
        assert_eq!(array.capacity(), self.bits.len());
        for (index, &bit) in self.bits.iter().enumerate() {
            assert_eq!(array.get(index), bit, "index={index}");
        }
        assert_eq!(array.count_ones(), self.bits.iter().filter(|&&bit| bit).count());
        assert_eq!(
            array.iter_ones().collect::<Vec<_>>(),
            self.bits
                .iter()
                .enumerate()
                .filter_map(|(index, &bit)| bit.then_some(index))
                .collect::<Vec<_>>()
        );
    }
}

fn other_array(indices: &[u16]) -> (BitArray, Vec<bool>) {
    let mut array = BitArray::new();
    for &index in indices {
        array.set((index % MAX_INDEX) as usize);
    }
    let mut bits = vec![false; array.capacity()];
    for index in array.iter_ones() {
        bits[index] = true;
    }
    (array, bits)
}

fn combine(model: &mut Model, other: &[bool], op: impl Fn(bool, bool) -> bool) {
    model.grow(other.len());
    for (index, bit) in model.bits.iter_mut().enumerate() {
        *bit = op(*bit, other.get(index).copied().unwrap_or(false));
    }
}

fn fuzz(operations: Vec<Operation>) {
    let mut array = BitArray::new();
    let mut model = Model { bits: Vec::new() };

    for operation in operations {
        match operation {
            Operation::Set(index) => {
                let index = (index % MAX_INDEX) as usize;
                array.set(index);
                model.grow(array.capacity());
                model.bits[index] = true;
            }
            Operation::Reset(index) => {
                let index = (index % MAX_INDEX) as usize;
                array.reset(index);
                model.grow(array.capacity());
                model.bits[index] = false;
            }
            Operation::SetTo(index, value) => {
                let index = (index % MAX_INDEX) as usize;
                array.set_to(index, value);
                model.grow(array.capacity());
                model.bits[index] = value;
            }
            Operation::Get(index) => {
                let index = index as usize;
                let capacity = array.capacity();
                assert_eq!(array.get(index), model.bits.get(index).copied().unwrap_or(false));
                assert_eq!(array.capacity(), capacity);
            }
            Operation::Clear => {
                array.clear();
                model.bits.fill(false);
            }
            Operation::Resize(bits) => {
                let bits = (bits % MAX_INDEX) as usize;
                array.resize(bits);
                for bit in model.bits.iter_mut().skip(bits) {
                    *bit = false;
                }
                model.bits.resize(array.capacity(), false);
            }
            Operation::Reserve(bits) => {
                array.reserve((bits % MAX_INDEX) as usize);
                model.grow(array.capacity());
            }
            Operation::FirstUnset => {
                let first_unset = array.first_unset();
                assert_eq!(first_unset, model.bits.iter().position(|&bit| !bit));
                if let Some(index) = first_unset {
                    assert!(index < array.capacity());
                }
            }
            Operation::And(indices) => {
                let (other, bits) = other_array(&indices);
                array &= &other;
                combine(&mut model, &bits, |a, b| a && b);
            }
            Operation::Or(indices) => {
                let (other, bits) = other_array(&indices);
                array |= &other;
                combine(&mut model, &bits, |a, b| a || b);
            }
            Operation::Xor(indices) => {
                let (other, bits) = other_array(&indices);
                array ^= &other;
                combine(&mut model, &bits, |a, b| a ^ b);
            }
        }
    }

    model.check(&array);
    let copy = array.clone();
    assert_eq!(copy, array);
    assert_eq!(BitArray::from(&model.bits), array);
}

fuzz_target!(|operations: Vec<Operation>| {
    fuzz(operations);
});
