//! Bucket-hash spatial index over the simulation plane (C4).
//!
//! Grounded on `original_source/Package/src/SpatialHash.hpp` and
//! `original_source/src/Core/SquareLattice.h`, reworked per spec §9's
//! "Design Notes" (back-pointer from bucket to cell record): cells live in
//! a dense `Vec`, addressed indirectly through generational [`CellHandle`]s
//! so that a bucket can hold a stable reference to a cell across the
//! swap-pop that removal performs on the dense array — the same technique
//! `other_examples`'s spatial-hash implementations use (entity indices
//! rather than raw pointers into a vector that can move).

use std::collections::HashMap;

use crate::cell::Cell;
use crate::error::{SimError, SimResult};
use crate::point::{GridPoint, Point};

/// A stable reference to a cell stored in a [`SpatialIndex`]. Remains valid
/// across unrelated inserts/removes; using a handle after its cell has been
/// removed is a programming error, caught by the handle's generation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellHandle {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    dense_index: Option<usize>,
}

/// The bucket-hash grid itself. Owns every live cell.
pub struct SpatialIndex {
    bucket_size: f64,
    cells: Vec<Cell>,
    /// Parallel to `cells`: which handle owns `cells[i]`, so a swap-pop
    /// remove can repoint the moved cell's slot.
    owners: Vec<CellHandle>,
    slots: Vec<Slot>,
    free_slots: Vec<usize>,
    buckets: HashMap<GridPoint, Vec<CellHandle>>,
}

impl SpatialIndex {
    /// Construct an empty index with the given bucket side length.
    ///
    /// `bucket_size` should be chosen (by the Monte Carlo engine) so a
    /// bucket's diagonal bounds the interaction range under consideration —
    /// see spec §9's Open Question on the `sqrt(3/2) - epsilon` constant.
    pub fn new(bucket_size: f64) -> Self {
        debug_assert!(bucket_size > 0.0, "bucket size must be positive");
        Self {
            bucket_size,
            cells: Vec::new(),
            owners: Vec::new(),
            slots: Vec::new(),
            free_slots: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    /// The configured bucket side length.
    pub fn bucket_size(&self) -> f64 {
        self.bucket_size
    }

    /// Hash a point to its bucket coordinate.
    ///
    /// `hx = ceil((|x| - bucket_size/2) / bucket_size) * sign(x)`, with
    /// `sign(0) = +1`, and likewise for `y` — spec §4.1.
    pub fn hash(&self, p: Point) -> GridPoint {
        GridPoint::new(
            Self::hash_axis(p.x, self.bucket_size),
            Self::hash_axis(p.y, self.bucket_size),
        )
    }

    fn hash_axis(v: f64, bucket_size: f64) -> i64 {
        let sign = if v < 0.0 { -1.0 } else { 1.0 };
        let h = ((v.abs() - bucket_size / 2.0) / bucket_size).ceil();
        (h * sign) as i64
    }

    /// The plane point at the center of bucket `g` — a canonical
    /// representative used by the round-trip/idempotence law
    /// `hash(canonical_point(g)) == g`.
    pub fn bucket_center(&self, g: GridPoint) -> Point {
        Point::new(g.x as f64 * self.bucket_size, g.y as f64 * self.bucket_size)
    }

    /// Insert a cell whose center is already set to its intended position.
    ///
    /// Inserting into a bucket that already holds a cell is the caller's
    /// responsibility to avoid (spec §4.1: "undefined at the index level";
    /// the Monte Carlo engine guarantees no overlap before insert).
    pub fn insert(&mut self, cell: Cell) -> CellHandle {
        let coords = cell.coordinates();
        let dense_index = self.cells.len();

        let slot_index = if let Some(i) = self.free_slots.pop() {
            self.slots[i].generation = self.slots[i].generation.wrapping_add(1);
            self.slots[i].dense_index = Some(dense_index);
            i
        } else {
            self.slots.push(Slot {
                generation: 0,
                dense_index: Some(dense_index),
            });
            self.slots.len() - 1
        };
        let handle = CellHandle {
            index: slot_index,
            generation: self.slots[slot_index].generation,
        };

        self.cells.push(cell);
        self.owners.push(handle);
        self.buckets
            .entry(self.hash(coords))
            .or_default()
            .push(handle);

        handle
    }

    /// Remove a cell, returning it. Swap-pops the dense storage and rewrites
    /// the moved cell's slot, matching spec §9's "Design Notes".
    pub fn remove(&mut self, handle: CellHandle) -> SimResult<Cell> {
        let dense_index = self.dense_index(handle)?;

        let bucket_key = self.hash(self.cells[dense_index].coordinates());
        if let Some(bucket) = self.buckets.get_mut(&bucket_key) {
            if let Some(pos) = bucket.iter().position(|h| *h == handle) {
                bucket.swap_remove(pos);
            }
            if bucket.is_empty() {
                self.buckets.remove(&bucket_key);
            }
        }

        let removed = self.cells.swap_remove(dense_index);
        self.owners.swap_remove(dense_index);
        if dense_index < self.cells.len() {
            let moved_handle = self.owners[dense_index];
            self.slots[moved_handle.index].dense_index = Some(dense_index);
        }

        self.slots[handle.index].dense_index = None;
        self.free_slots.push(handle.index);

        Ok(removed)
    }

    /// Move a cell from bucket `old` to bucket `new` (a no-op if both hash
    /// to the same bucket). Passing an `old` that does not match the cell's
    /// last-known bucket is a programming error (spec §4.1).
    pub fn update(&mut self, handle: CellHandle, old: Point, new: Point) -> SimResult<()> {
        let old_key = self.hash(old);
        let new_key = self.hash(new);
        if old_key == new_key {
            return Ok(());
        }

        let bucket = self.buckets.get_mut(&old_key).ok_or_else(|| {
            SimError::invariant("update with stale old coordinate: old bucket is empty")
        })?;
        let pos = bucket.iter().position(|h| *h == handle).ok_or_else(|| {
            SimError::invariant("update with stale old coordinate: handle not present")
        })?;
        bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(&old_key);
        }

        self.buckets.entry(new_key).or_default().push(handle);
        Ok(())
    }

    fn dense_index(&self, handle: CellHandle) -> SimResult<usize> {
        let slot = self
            .slots
            .get(handle.index)
            .ok_or_else(|| SimError::invariant("handle refers to an unknown slot"))?;
        if slot.generation != handle.generation {
            return Err(SimError::invariant("handle is stale (generation mismatch)"));
        }
        slot.dense_index
            .ok_or_else(|| SimError::invariant("handle refers to a removed cell"))
    }

    /// Borrow a live cell. Panics if `handle` is stale — handles are
    /// entirely internal to the engine and are never expected to outlive
    /// their cell in correct code.
    pub fn get(&self, handle: CellHandle) -> &Cell {
        let index = self
            .dense_index(handle)
            .expect("CellHandle used after its cell was removed");
        &self.cells[index]
    }

    /// Mutably borrow a live cell. See [`SpatialIndex::get`].
    pub fn get_mut(&mut self, handle: CellHandle) -> &mut Cell {
        let index = self
            .dense_index(handle)
            .expect("CellHandle used after its cell was removed");
        &mut self.cells[index]
    }

    /// Number of live cells.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// `true` if the index holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// A uniform-random live cell handle, `O(1)`.
    pub fn random_handle(&self, rng: &mut impl rand::Rng) -> CellHandle {
        debug_assert!(!self.cells.is_empty(), "index is empty");
        let idx = rng.random_range(0..self.cells.len());
        self.owners[idx]
    }

    /// Every live cell's handle, in the dense storage order (unspecified
    /// but stable within one iteration — spec §4.1).
    pub fn handles(&self) -> impl Iterator<Item = CellHandle> + '_ {
        self.owners.iter().copied()
    }

    /// Enumerate all cells whose bucket intersects the axis-aligned search
    /// square around `center` of radius `radius` — spec §4.1.
    pub fn local_iterate(&self, center: Point, radius: f64) -> LocalIterator<'_> {
        let hashed_center = self.hash(center);
        let half_width = (radius / (self.bucket_size * std::f64::consts::SQRT_2)).ceil() as i64 + 1;
        let region = SearchRegion {
            left: hashed_center.x - half_width,
            right: hashed_center.x + half_width,
            bottom: hashed_center.y - half_width,
            top: hashed_center.y + half_width,
        };
        LocalIterator {
            index: self,
            region,
            column: region.left,
            row: region.top,
            bucket_pos: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SearchRegion {
    left: i64,
    right: i64,
    bottom: i64,
    top: i64,
}

/// A single-pass forward cursor over the cells in one [`SpatialIndex`]
/// local search square.
///
/// Cheaply [`Copy`]; two iterators compare equal when they're at the same
/// grid position, regardless of which index they borrow from — spec §9's
/// "Design Notes" calls for iterators that are "cheaply copyable... compare
/// equal at the same grid position."
#[derive(Clone, Copy)]
pub struct LocalIterator<'a> {
    index: &'a SpatialIndex,
    region: SearchRegion,
    column: i64,
    row: i64,
    bucket_pos: usize,
}

impl<'a> PartialEq for LocalIterator<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column && self.row == other.row
    }
}

impl<'a> Iterator for LocalIterator<'a> {
    type Item = CellHandle;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.column > self.region.right {
                return None;
            }

            if let Some(bucket) = self
                .index
                .buckets
                .get(&GridPoint::new(self.column, self.row))
            {
                if self.bucket_pos < bucket.len() {
                    let handle = bucket[self.bucket_pos];
                    self.bucket_pos += 1;
                    return Some(handle);
                }
            }

            self.bucket_pos = 0;
            self.row -= 1;
            if self.row < self.region.bottom {
                self.row = self.region.top;
                self.column += 1;
            }
        }
    }
}
