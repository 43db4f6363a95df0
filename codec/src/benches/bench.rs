use criterion::criterion_main;

mod transfer;

criterion_main!(transfer::benches);
