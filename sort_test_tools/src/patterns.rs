//! Input patterns for testing and benchmarking, limited to `i32` values.
//!
//! All random patterns derive from one seed per process, so a failing run can be reproduced by
//! setting `OVERRIDE_SEED` to the seed printed by the test suite.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use rand::distributions::Uniform;
use rand::prelude::*;
use zipf::ZipfDistribution;

// --- Public ---

pub fn random(len: usize) -> Vec<i32> {
    //     .
    // : . : :
    // :.:::.::

    let mut rng = new_rng();
    (0..len).map(|_| rng.gen::<i32>()).collect()
}

pub fn random_uniform<R>(len: usize, range: R) -> Vec<i32>
where
    R: Into<Uniform<i32>>,
{
    // :.:.:.::

    let mut rng = new_rng();
    let dist: Uniform<i32> = range.into();

    (0..len).map(|_| dist.sample(&mut rng)).collect()
}

pub fn random_zipf(len: usize, exponent: f64) -> Vec<i32> {
    // https://en.wikipedia.org/wiki/Zipf's_law

    if len == 0 {
        return Vec::new();
    }

    let mut rng = new_rng();
    let dist = match ZipfDistribution::new(len, exponent) {
        Ok(dist) => dist,
        Err(()) => panic!("invalid zipf parameters, len: {len} exponent: {exponent}"),
    };

    (0..len).map(|_| dist.sample(&mut rng) as i32).collect()
}

pub fn random_sorted(len: usize, sorted_percent: f64) -> Vec<i32> {
    //     .:
    //   .:::. :
    // .::::::.::
    // [----][--]
    //  ^      ^
    //  |      |
    // sorted  |
    //     unsorted

    // A presorted prefix followed by new values, the driver merges both parts if the prefix is
    // the longer one.
    let mut v = random(len);
    let sorted_len = ((len as f64) * (sorted_percent / 100.0)).round() as usize;

    v[0..sorted_len].sort_unstable();

    v
}

pub fn random_few_unique(len: usize) -> Vec<i32> {
    // : : : :
    // :.:.:.::

    let unique = ((len as f64).sqrt() as i32).max(1);
    random_uniform(len, 0..unique)
}

pub fn all_equal(len: usize) -> Vec<i32> {
    // ......
    // ::::::

    vec![66; len]
}

pub fn ascending(len: usize) -> Vec<i32> {
    //     .:
    //   .:::
    // .:::::

    (0..len as i32).collect()
}

pub fn descending(len: usize) -> Vec<i32> {
    // :.
    // :::.
    // :::::.

    (0..len as i32).rev().collect()
}

pub fn saw_mixed(len: usize, saw_count: usize) -> Vec<i32> {
    // :.  :.    .::.    .:
    // :::.:::..::::::..:::

    if len == 0 {
        return Vec::new();
    }

    let mut vals = random(len);
    let chunk_size = (len / saw_count.max(1)).max(1);
    let directions = random_uniform((len / chunk_size) + 1, 0..=1);

    for (chunk, direction) in vals.chunks_mut(chunk_size).zip(directions) {
        if direction == 0 {
            chunk.sort_unstable();
        } else {
            chunk.sort_unstable_by(|a, b| b.cmp(a));
        }
    }

    vals
}

pub fn pipe_organ(len: usize) -> Vec<i32> {
    //   .:.
    // .:::::.

    let mut vals = random(len);

    let (first_half, second_half) = vals.split_at_mut(len / 2);
    first_half.sort_unstable();
    second_half.sort_unstable_by(|a, b| b.cmp(a));

    vals
}

/// Musser's median-of-3 killer, which drives a quicksort that picks the median of the first,
/// middle and last element into quadratic behavior.
pub fn median3_killer(len: usize) -> Vec<i32> {
    let k = len / 2;
    let mut v = vec![0i32; len];

    for i in 1..=k {
        if i % 2 == 1 {
            v[i - 1] = i as i32;
        } else {
            v[i - 1] = (k + i - 1) as i32;
        }
        v[k + i - 1] = (2 * i) as i32;
    }

    if len % 2 == 1 {
        v[len - 1] = len as i32;
    }

    v
}

/// Overwrites the default behavior so that each call to a random derived pattern yields new random
/// values.
///
/// By default `patterns::random(4)` will yield the same values per process invocation.
/// For benchmarks it's advised to call this function.
pub fn use_random_seed_each_time() {
    if env::var("OVERRIDE_SEED").is_ok() {
        panic!("Using use_random_seed_each_time conflicts with the external seed override.");
    }

    RANDOM_EACH_TIME.store(true, Ordering::Relaxed);
}

/// The seed all random patterns of this process are derived from.
pub fn random_init_seed() -> u64 {
    *PROCESS_SEED
}

// --- Private ---

static PROCESS_SEED: Lazy<u64> = Lazy::new(|| match env::var("OVERRIDE_SEED") {
    Ok(seed) => match seed.parse() {
        Ok(seed) => seed,
        Err(err) => panic!("OVERRIDE_SEED is not a valid u64: {seed:?} {err}"),
    },
    Err(_) => thread_rng().gen(),
});

static RANDOM_EACH_TIME: AtomicBool = AtomicBool::new(false);

fn new_rng() -> StdRng {
    if RANDOM_EACH_TIME.load(Ordering::Relaxed) {
        StdRng::seed_from_u64(thread_rng().gen())
    } else {
        StdRng::seed_from_u64(random_init_seed())
    }
}
