//! Systems patterns: ownership, allocation and container choice.
//!
//! Variants here are reported under descriptive labels rather than function
//! names, since several of them differ only in how the caller hands data over.

use fxhash::FxHashSet;
use perfpair_core::{Bencher, Capabilities, GroupDef, Suite};
use rand::Rng;
use std::collections::BTreeSet;

/// Elements summed and indexed by the ownership groups
pub const LARGE_VEC: usize = 1_000_000;
/// Numbers appended by the string building group
pub const STRING_PARTS: u32 = 10_000;
/// Elements pushed by the reserve group
pub const RESERVE_COUNT: u32 = 100_000;
/// Points built by the push/extend group
pub const POINT_COUNT: i32 = 100_000;
/// Entries in each looked-up set
pub const SET_SIZE: u32 = 10_000;
/// Lookups made against each set
pub const SET_LOOKUPS: u32 = 100_000;

const SUMMARY: &str = "\
1. OWNERSHIP
   ✓ Borrow (&[T]) when the callee only reads
   ✗ Don't clone a collection just to pass it to a function

2. STRINGS
   ✓ Reserve capacity when the final size is known
   ✗ Avoid growing a buffer one reallocation at a time

3. VECTORS
   ✓ Use Vec::with_capacity for known sizes
   ✗ Don't rely on repeated doubling in hot paths

4. BULK INSERTION
   ✓ Extend from an iterator so the size hint is used
   ✗ Avoid element-by-element pushes when a bulk form exists

5. CONTAINERS
   ✓ Use a hash set for point lookups
   ✓ Use BTreeSet only when ordering is needed
   ✗ Don't pay O(log n) for lookups that never need order

6. ITERATION
   ✓ Prefer iterators; they avoid bounds checks
   ✗ Avoid manual indexing loops over whole slices

7. MOVES
   ✓ Move or return by value; both are a pointer copy
   ✗ Don't clone large buffers you no longer need";

/// The systems suite
pub fn suite() -> Suite {
    Suite {
        id: "systems",
        title: "Systems Performance Examples",
        groups: vec![
            GroupDef {
                id: "pass_by_reference",
                title: "1. Pass by Value vs Reference (1M elements)",
                requires: &[],
                run: pass_by_reference,
            },
            GroupDef {
                id: "string_building",
                title: "2. String Building (10,000 elements)",
                requires: &[],
                run: string_building,
            },
            GroupDef {
                id: "vector_reserve",
                title: "3. Vector Reserve (100,000 elements)",
                requires: &[],
                run: vector_reserve,
            },
            GroupDef {
                id: "push_vs_extend",
                title: "4. Push vs Extend (100,000 points)",
                requires: &[],
                run: push_vs_extend,
            },
            GroupDef {
                id: "set_lookup",
                title: "5. Ordered vs Hashed Set (100,000 lookups)",
                requires: &[],
                run: set_lookup,
            },
            GroupDef {
                id: "indexing",
                title: "6. Indexing vs Iteration (1M elements)",
                requires: &[],
                run: indexing,
            },
            GroupDef {
                id: "move_semantics",
                title: "7. Copy vs Move Semantics",
                requires: &[],
                run: move_semantics,
            },
        ],
        summary_title: "Systems Best Practices",
        summary: SUMMARY,
    }
}

fn random_vec(len: usize) -> Vec<i64> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(0..1_000)).collect()
}

fn pass_by_reference(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    let data = random_vec(LARGE_VEC);
    b.time("Pass by Value (inefficient)", || sum_by_value(data.clone()));
    b.time("Pass by Reference (efficient)", || sum_by_reference(&data));
    Ok(())
}

fn string_building(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.time("Without capacity (inefficient)", || {
        build_string(String::new(), STRING_PARTS)
    });
    b.time("With capacity (efficient)", || {
        build_string(String::with_capacity(string_len(STRING_PARTS)), STRING_PARTS)
    });
    Ok(())
}

fn vector_reserve(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.time("Without reserve (inefficient)", || {
        fill_vec(Vec::new(), RESERVE_COUNT)
    });
    b.time("With reserve (efficient)", || {
        fill_vec(Vec::with_capacity(RESERVE_COUNT as usize), RESERVE_COUNT)
    });
    Ok(())
}

fn push_vs_extend(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.time("Push each point (inefficient)", || push_points(POINT_COUNT));
    b.time("Extend from iterator (efficient)", || extend_points(POINT_COUNT));
    Ok(())
}

fn set_lookup(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    let ordered: BTreeSet<u32> = (0..SET_SIZE).collect();
    let hashed: FxHashSet<u32> = (0..SET_SIZE).collect();

    b.time("BTreeSet lookup - O(log n)", || {
        count_hits(|k| ordered.contains(&k), SET_LOOKUPS)
    });
    b.time("Hash set lookup - O(1)", || {
        count_hits(|k| hashed.contains(&k), SET_LOOKUPS)
    });
    Ok(())
}

fn indexing(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    let data = random_vec(LARGE_VEC);
    b.time("Indexing with len() in the loop (inefficient)", || {
        sum_indexed(&data)
    });
    b.time("Indexing with cached len (better)", || sum_cached_len(&data));
    b.time("Iterator sum (most efficient)", || sum_iter(&data));
    Ok(())
}

fn move_semantics(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.time("Clone (if used)", || clone_large(LARGE_VEC));
    b.time("Move (efficient)", || move_large(LARGE_VEC));
    b.time("Return by value", || create_large_vector(LARGE_VEC));
    Ok(())
}

/// Takes ownership, so callers holding on to their data must clone it.
#[allow(clippy::needless_pass_by_value)]
pub fn sum_by_value(data: Vec<i64>) -> i64 {
    data.iter().sum()
}

/// Sums a borrowed slice.
pub fn sum_by_reference(data: &[i64]) -> i64 {
    data.iter().sum()
}

/// Upper bound on the length of `"0,1,...,{n-1},"`.
pub fn string_len(n: u32) -> usize {
    n.to_string().len().saturating_add(1) * n as usize
}

/// Appends `0,1,...` to `out`, growing it as needed.
pub fn build_string(mut out: String, n: u32) -> String {
    for i in 0..n {
        out += &i.to_string();
        out.push(',');
    }
    out
}

/// Pushes `0..n` onto `out`.
pub fn fill_vec(mut out: Vec<u32>, n: u32) -> Vec<u32> {
    for i in 0..n {
        out.push(i);
    }
    out
}

/// A small `Copy` value pushed in bulk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
    /// Z coordinate
    pub z: i32,
}

impl Point {
    fn scaled(i: i32) -> Self {
        Self {
            x: i,
            y: i.wrapping_mul(2),
            z: i.wrapping_mul(3),
        }
    }
}

/// One `push` per point.
pub fn push_points(n: i32) -> Vec<Point> {
    let mut points = Vec::new();
    for i in 0..n {
        points.push(Point::scaled(i));
    }
    points
}

/// `extend` from a mapped range.
pub fn extend_points(n: i32) -> Vec<Point> {
    let mut points = Vec::new();
    points.extend((0..n).map(Point::scaled));
    points
}

/// Counts lookups that `contains` accepts.
pub fn count_hits(contains: impl Fn(u32) -> bool, lookups: u32) -> usize {
    (0..lookups).filter(|i| contains(i % SET_SIZE)).count()
}

/// Indexed loop, bounds checked on every access.
#[allow(clippy::needless_range_loop)]
pub fn sum_indexed(data: &[i64]) -> i64 {
    let mut sum = 0;
    for i in 0..data.len() {
        sum += data[i];
    }
    sum
}

/// Indexed loop with the length read once.
#[allow(clippy::needless_range_loop)]
pub fn sum_cached_len(data: &[i64]) -> i64 {
    let len = data.len();
    let mut sum = 0;
    for i in 0..len {
        sum += data[i];
    }
    sum
}

/// Iterator sum.
pub fn sum_iter(data: &[i64]) -> i64 {
    data.iter().sum()
}

/// Clones a freshly built buffer; both copies live until return.
#[allow(clippy::redundant_clone)]
pub fn clone_large(len: usize) -> usize {
    let original = vec![42u32; len];
    let copy = original.clone();
    copy.len() + original.len()
}

/// Moves the buffer; no copy is made.
pub fn move_large(len: usize) -> usize {
    let original = vec![42u32; len];
    let moved = original;
    moved.len()
}

/// Builds and returns a buffer by value.
pub fn create_large_vector(len: usize) -> Vec<u32> {
    let mut v = vec![0u32; len];
    for (i, slot) in v.iter_mut().enumerate() {
        *slot = i as u32;
    }
    v
}
