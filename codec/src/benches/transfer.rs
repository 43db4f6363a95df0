use criterion::{criterion_group, BatchSize, Criterion, Throughput};
use keystone_codec::{
    pool::Config, Archive, BufferPool, Orientation, Serialize, SerializeType, Vector3,
};
use prometheus_client::registry::Registry;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

const POLICY: u64 = 0xEF;

#[derive(Clone, Default)]
struct Locomotor {
    id: u64,
    position: Vector3,
    orientation: Orientation,
    speed: f32,
    flags: u32,
}

impl Serialize for Locomotor {
    fn serialize(&mut self, archive: &mut Archive) -> bool {
        let mut success = true;
        success &= archive.transfer(&mut self.id);
        success &= archive.transfer_vector_fixed(&mut self.position, 3);
        success &= archive.transfer_orientation_fixed(&mut self.orientation, true, 6);
        success &= archive.transfer_float_fixed(&mut self.speed, 4);
        success &= archive.transfer(&mut self.flags);
        success
    }
}

fn random_locomotors(count: usize) -> Vec<Locomotor> {
    let mut rng = StdRng::seed_from_u64(count as u64);
    (0..count)
        .map(|_| Locomotor {
            id: rng.gen(),
            position: Vector3::new(
                rng.gen_range(-8192.0..8192.0),
                rng.gen_range(-8192.0..8192.0),
                rng.gen_range(-512.0..512.0),
            ),
            orientation: Orientation::new(rng.gen_range(-3.0..3.0), 0.0, 0.0),
            speed: rng.gen_range(0.0..600.0),
            flags: rng.gen(),
        })
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut registry = Registry::default();
    let pool = BufferPool::new(Config::for_network(), &mut registry);
    for count in [1, 16, 256] {
        let locomotors = random_locomotors(count);
        let mut group = c.benchmark_group(module_path!());
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("fn=pack count={count}"), |b| {
            b.iter_batched_ref(
                || locomotors.clone(),
                |locomotors| {
                    let mut archive = Archive::packing(SerializeType::Replication, POLICY);
                    for locomotor in locomotors.iter_mut() {
                        archive.transfer(locomotor);
                    }
                    black_box(archive.into_bytes())
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("fn=pack_pooled count={count}"), |b| {
            b.iter_batched_ref(
                || locomotors.clone(),
                |locomotors| {
                    let mut archive =
                        Archive::packing_pooled(SerializeType::Replication, POLICY, &pool);
                    for locomotor in locomotors.iter_mut() {
                        archive.transfer(locomotor);
                    }
                    black_box(archive.access_buffer().len())
                },
                BatchSize::SmallInput,
            );
        });
        group.finish();
    }
}

fn bench_unpack(c: &mut Criterion) {
    for count in [1, 16, 256] {
        let mut locomotors = random_locomotors(count);
        let mut archive = Archive::packing(SerializeType::Replication, POLICY);
        for locomotor in locomotors.iter_mut() {
            archive.transfer(locomotor);
        }
        let bytes = archive.into_bytes();

        c.bench_function(
            &format!("{}/fn=unpack count={count}", module_path!()),
            |b| {
                b.iter(|| {
                    let mut archive =
                        Archive::unpacking(SerializeType::Replication, bytes.clone()).unwrap();
                    let mut locomotor = Locomotor::default();
                    for _ in 0..count {
                        archive.transfer(&mut locomotor);
                    }
                    black_box(locomotor.id)
                });
            },
        );
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_pack, bench_unpack,
}
