//! Criterion micro-benchmarks for the scratch allocator.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use petrify_arena::{ArenaConfig, ScratchAllocator};
use petrify_bench::synthetic_spirv;

/// Benchmark: 1K small typed allocations into a fresh arena.
fn bench_arena_alloc_small(c: &mut Criterion) {
    c.bench_function("arena_alloc_small_1k", |b| {
        b.iter_batched(
            ScratchAllocator::new,
            |arena| {
                for i in 0..1_000u32 {
                    let slot = arena.alloc([i, i + 1, i + 2, i + 3]).unwrap();
                    black_box(slot);
                }
                arena
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: copy 64 shader-sized word slices into a fresh arena.
fn bench_arena_copy_spirv(c: &mut Criterion) {
    let code = synthetic_spirv(4096, 1);

    c.bench_function("arena_copy_spirv_64x4k", |b| {
        b.iter_batched(
            ScratchAllocator::new,
            |arena| {
                for _ in 0..64 {
                    let words = arena.alloc_slice_copy(&code).unwrap();
                    black_box(words[0]);
                }
                arena
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: store and read back byte payloads, spilling across blocks.
fn bench_arena_store_bytes(c: &mut Criterion) {
    let payload = vec![0xa5u8; 700];
    let config = ArenaConfig {
        block_size: ArenaConfig::MIN_BLOCK_SIZE,
        max_bytes: None,
    };

    c.bench_function("arena_store_bytes_256x700", |b| {
        b.iter_batched(
            || ScratchAllocator::with_config(config.clone()).unwrap(),
            |arena| {
                for _ in 0..256 {
                    let span = arena.store_bytes(&payload).unwrap();
                    black_box(arena.bytes(span).unwrap().len());
                }
                arena
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_arena_alloc_small,
    bench_arena_copy_spirv,
    bench_arena_store_bytes
);
criterion_main!(benches);
