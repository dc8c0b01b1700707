//! Benchmarks for the add operations of the red-black tree.
//!
//! This benchmark tests the performance of filling an empty tree with random numbers with 32bit, 128bit and 384bit keys.
//!
//! ## Benchmark execution
//!
//! Running this exact benchmark can be done with the following command:
//!
//! `> cargo bench -p rb_index --bench bench_add`
//!
//! If you wish to run a subset of benchmarks in this file, you can filter them by name:
//!
//! `> cargo bench -p rb_index --bench bench_add -- <filter>`
//!
//! ## Examples
//!
//! ```bash
//! > cargo bench -p rb_index --bench bench_add -- rbt
//! > cargo bench -p rb_index --bench bench_add -- 32bit
//! > cargo bench -p rb_index --bench bench_add
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation. All rights reserved.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{prelude::SliceRandom, Rng};
use rb_index::Rbt;
use std::{collections::HashSet, hash::Hash};
use uint::construct_uint;

const MAX_SIZE: usize = 4096;

// A key as wide as a memory space descriptor
construct_uint! {
    pub struct U384(6);
}

fn random_numbers<D>(min: D, max: D) -> Vec<D>
where
    D: Copy + Eq + std::cmp::PartialOrd + Hash + rand::distributions::uniform::SampleUniform,
{
    let mut rng = rand::thread_rng();
    let mut nums: HashSet<D> = HashSet::new();
    while nums.len() < MAX_SIZE {
        let num: D = rng.gen_range(min..=max);
        nums.insert(num);
    }
    nums.into_iter().collect()
}

fn bench_add<D>(c: &mut Criterion, group_name: &str, width: &str, nums: &[D])
where
    D: Ord + Copy,
{
    let mut group = c.benchmark_group(group_name);
    group.bench_with_input(BenchmarkId::new("rbt", width), nums, |b, nums| {
        b.iter(|| {
            let mut rbt: Rbt<D> = Rbt::with_capacity(MAX_SIZE);
            for i in nums {
                rbt.try_insert(*i).unwrap();
            }
        })
    });
    group.finish();
}

pub fn benchmark_add_function(c: &mut Criterion) {
    let nums = random_numbers::<u32>(0, 100_000);
    bench_add(c, "add", "32bit", &nums);

    let nums = random_numbers::<u128>(0, 100_000);
    bench_add(c, "add", "128bit", &nums);

    let nums = random_numbers::<u32>(0, 100_000).into_iter().map(U384::from).collect::<Vec<U384>>();
    bench_add(c, "add", "384bit", &nums);

    // Sorted input exercises the rotation-heavy path.
    let mut nums = random_numbers::<u32>(0, 100_000);
    nums.shuffle(&mut rand::thread_rng());
    nums.sort();
    bench_add(c, "add_sorted", "32bit", &nums);
}

criterion_group!(benches, benchmark_add_function);
criterion_main!(benches);
