//! Benchmark for canonical rail sorting.

use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use efa_platform_adapter::error::{PlatformError, Result};
use efa_platform_adapter::rail::{sort_rails, GuidSource};

struct MapGuidSource(HashMap<String, String>);

impl GuidSource for MapGuidSource {
    fn node_guid(&self, device: &str) -> Result<String> {
        self.0.get(device).cloned().ok_or_else(|| {
            PlatformError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                device.to_string(),
            ))
        })
    }
}

/// Build `num_rails` devices alternating between the two VF groups, the
/// discovery order seen on multi-rail instances.
fn interleaved_rails(num_rails: usize) -> (Vec<String>, MapGuidSource) {
    let mut devices = Vec::with_capacity(num_rails);
    let mut guids = HashMap::new();
    for i in 0..num_rails {
        let device = format!("rdmap{}s0", i);
        let guid = format!("{:04x}:{:04x}:0000:000{}", i, i.wrapping_mul(7), i % 2);
        guids.insert(device.clone(), guid);
        devices.push(device);
    }
    (devices, MapGuidSource(guids))
}

fn bench_sort_rails(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_rails");
    for num_rails in [4usize, 8, 16, 32] {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_rails),
            &num_rails,
            |b, &n| {
                let (devices, guids) = interleaved_rails(n);
                b.iter(|| {
                    let sorted = sort_rails(black_box(devices.clone()), &guids).unwrap();
                    black_box(sorted)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_sort_rails);
criterion_main!(benches);
