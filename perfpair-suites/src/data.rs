//! Data processing: collection and string patterns where the obvious loop
//! loses to the idiomatic form.

use fxhash::{FxHashMap, FxHashSet};
use perfpair_core::{Bencher, Capabilities, GroupDef, Suite};

/// Numbers joined by the concatenation group
pub const STRING_COUNT: u32 = 10_000;
/// Lookups made by the membership group
pub const MEMBERSHIP_LOOKUPS: u32 = 10_000;
/// Size of the collection searched for membership
pub const ALLOWED_VALUES: u32 = 1_000;
/// Range scanned when building the list of even squares
pub const LIST_SIZE: u64 = 100_000;
/// Fibonacci index computed by both variants
pub const FIB_N: u32 = 30;
/// Length of the list summed chunk by chunk
pub const CHUNKED_LIST_SIZE: u64 = 100_000;
/// Chunk length
pub const CHUNK: usize = 100;
/// Range squared and filtered by the iteration group
pub const LAZY_SIZE: u64 = 1_000_000;
/// Lookups made by the map access group
pub const DICT_LOOKUPS: u32 = 100_000;
/// Keys in the looked-up map
pub const DICT_KEYS: u32 = 1_000;

const SUMMARY: &str = "\
1. STRINGS
   ✓ Build the pieces, then join once
   ✗ Don't grow a string by reallocating it on every append

2. LOOKUPS
   ✓ Use a hash set for repeated membership tests
   ✗ Avoid linear scans inside loops

3. BUILDING COLLECTIONS
   ✓ Collect from an iterator chain
   ✗ Avoid hand-written push loops when an adapter expresses the intent

4. CACHING
   ✓ Memoize pure recursive computations
   ✗ Don't recompute overlapping subproblems

5. COPIES
   ✓ Borrow slices of existing data
   ✗ Avoid copying chunks just to read them

6. LAZINESS
   ✓ Stream values through iterator adapters
   ✗ Don't materialize intermediate collections you read once

7. MAP ACCESS
   ✓ Use a single get() with a default
   ✗ Avoid a contains check followed by a second lookup";

/// The data processing suite
pub fn suite() -> Suite {
    Suite {
        id: "data",
        title: "Data Processing Performance Examples",
        groups: vec![
            GroupDef {
                id: "string_concat",
                title: "1. String Concatenation (10,000 elements)",
                requires: &[],
                run: string_concat,
            },
            GroupDef {
                id: "membership",
                title: "2. Membership Testing (10,000 lookups)",
                requires: &[],
                run: membership,
            },
            GroupDef {
                id: "list_building",
                title: "3. List Building (100,000 elements)",
                requires: &[],
                run: list_building,
            },
            GroupDef {
                id: "fibonacci",
                title: "4. Fibonacci Calculation (n=30)",
                requires: &[],
                run: fibonacci,
            },
            GroupDef {
                id: "chunked_sum",
                title: "5. Large List Processing (100,000 elements)",
                requires: &[],
                run: chunked_sum,
            },
            GroupDef {
                id: "lazy_iteration",
                title: "6. Materialized vs Lazy Iteration (1,000,000 elements)",
                requires: &[],
                run: lazy_iteration,
            },
            GroupDef {
                id: "dict_access",
                title: "7. Dictionary Access (100,000 lookups)",
                requires: &[],
                run: dict_access,
            },
        ],
        summary_title: "Data Processing Best Practices",
        summary: SUMMARY,
    }
}

fn string_concat(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.time_fn(inefficient_string_concat, STRING_COUNT);
    b.time_fn(efficient_string_concat, STRING_COUNT);
    Ok(())
}

fn membership(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.time_fn(inefficient_membership_test, MEMBERSHIP_LOOKUPS);
    b.time_fn(efficient_membership_test, MEMBERSHIP_LOOKUPS);
    Ok(())
}

fn list_building(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.time_fn(inefficient_list_building, LIST_SIZE);
    b.time_fn(efficient_list_building, LIST_SIZE);
    Ok(())
}

fn fibonacci(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.time_fn(fibonacci_no_cache, FIB_N);
    // Each call starts from an empty cache.
    b.time_fn(fibonacci_with_cache, FIB_N);
    Ok(())
}

fn chunked_sum(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    let data: Vec<u64> = (0..CHUNKED_LIST_SIZE).collect();
    b.time_fn(inefficient_slice_copy, data.as_slice());
    b.time_fn(efficient_slice_iteration, data.as_slice());
    Ok(())
}

fn lazy_iteration(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.time_fn(inefficient_process_large_data, LAZY_SIZE);
    b.time_fn(efficient_process_large_data, LAZY_SIZE);
    Ok(())
}

fn dict_access(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.time_fn(inefficient_dict_access, DICT_LOOKUPS);
    b.time_fn(efficient_dict_access, DICT_LOOKUPS);
    Ok(())
}

/// Quadratic: every append copies the whole string into a new allocation.
pub fn inefficient_string_concat(n: u32) -> String {
    let mut result = String::new();
    for i in 0..n {
        result = format!("{result}{i},");
    }
    result
}

/// Formats each piece once, then joins.
pub fn efficient_string_concat(n: u32) -> String {
    (0..n).map(|i| i.to_string()).collect::<Vec<_>>().join(",")
}

/// Linear scan of a `Vec` per lookup.
pub fn inefficient_membership_test(lookups: u32) -> usize {
    let allowed: Vec<u32> = (0..ALLOWED_VALUES).collect();
    (0..lookups).filter(|i| allowed.contains(&(i % 10))).count()
}

/// Hash-set lookup per query.
pub fn efficient_membership_test(lookups: u32) -> usize {
    let allowed: FxHashSet<u32> = (0..ALLOWED_VALUES).collect();
    (0..lookups).filter(|i| allowed.contains(&(i % 10))).count()
}

/// Push loop with a branch per element.
pub fn inefficient_list_building(n: u64) -> Vec<u64> {
    let mut result = Vec::new();
    for i in 0..n {
        if i % 2 == 0 {
            result.push(i * i);
        }
    }
    result
}

/// Single iterator chain collected into a `Vec`.
pub fn efficient_list_building(n: u64) -> Vec<u64> {
    (0..n).filter(|i| i % 2 == 0).map(|i| i * i).collect()
}

/// Exponential recursion
pub fn fibonacci_no_cache(n: u32) -> u64 {
    if n < 2 {
        return u64::from(n);
    }
    fibonacci_no_cache(n - 1) + fibonacci_no_cache(n - 2)
}

/// Memoized recursion; the cache is fresh on every call.
pub fn fibonacci_with_cache(n: u32) -> u64 {
    fn fib(n: u32, cache: &mut FxHashMap<u32, u64>) -> u64 {
        if n < 2 {
            return u64::from(n);
        }
        if let Some(&hit) = cache.get(&n) {
            return hit;
        }
        let value = fib(n - 1, cache) + fib(n - 2, cache);
        cache.insert(n, value);
        value
    }

    fib(n, &mut FxHashMap::default())
}

/// Copies each chunk into a fresh `Vec` before summing it.
pub fn inefficient_slice_copy(data: &[u64]) -> u64 {
    let mut total = 0;
    for chunk in data.chunks(CHUNK) {
        let copy = chunk.to_vec();
        total += copy.iter().sum::<u64>();
    }
    total
}

/// Sums borrowed chunks in place.
pub fn efficient_slice_iteration(data: &[u64]) -> u64 {
    data.chunks(CHUNK).map(|c| c.iter().sum::<u64>()).sum()
}

/// Materializes every square before filtering.
pub fn inefficient_process_large_data(n: u64) -> u64 {
    let data: Vec<u64> = (0..n).map(|i| i * i).collect();
    data.iter().filter(|&&x| x % 2 == 0).sum()
}

/// Squares, filters and sums lazily without a buffer.
pub fn efficient_process_large_data(n: u64) -> u64 {
    (0..n).map(|i| i * i).filter(|x| x % 2 == 0).sum()
}

fn doubled_keys() -> FxHashMap<u32, u64> {
    (0..DICT_KEYS).map(|i| (i, u64::from(i) * 2)).collect()
}

/// Checks for the key, then indexes: two hash lookups per access.
pub fn inefficient_dict_access(lookups: u32) -> u64 {
    let data = doubled_keys();
    let mut count = 0;
    for i in 0..lookups {
        let key = i % DICT_KEYS;
        if data.contains_key(&key) {
            count += data[&key];
        }
    }
    count
}

/// One `get` per access with a default.
pub fn efficient_dict_access(lookups: u32) -> u64 {
    let data = doubled_keys();
    (0..lookups)
        .map(|i| data.get(&(i % DICT_KEYS)).copied().unwrap_or(0))
        .sum()
}
