//! Generic containers every placeable piece moves through.
//!
//! Containers store piece handles (small `Copy` ids), never the pieces
//! themselves. The board keeps each piece's location in sync with the
//! container that holds it.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised when a container refuses a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("slot is already occupied")]
    Occupied,
    #[error("container is full (capacity {capacity})")]
    Capacity { capacity: usize },
    #[error("position {pos} is outside a ring of {len} slots")]
    OutOfRange { pos: usize, len: usize },
    #[error("a position is required to place into a ring")]
    PositionRequired,
}

/// Common surface shared by every container kind.
pub trait Container<T: Copy + Eq> {
    /// Insert a piece, returning any pieces evicted to make room.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError` when the container rejects the piece.
    fn place(&mut self, item: T, pos: Option<usize>) -> Result<Vec<T>, ContainerError>;

    /// Remove a piece; a no-op returning `false` when it is not present.
    fn remove(&mut self, item: T) -> bool;

    fn contains(&self, item: T) -> bool;

    /// Snapshot of the current contents.
    fn contents(&self) -> Vec<T>;

    fn len(&self) -> usize {
        self.contents().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds zero or one piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot<T> {
    occupant: Option<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self { occupant: None }
    }
}

impl<T: Copy + Eq> Slot<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self { occupant: None }
    }

    #[must_use]
    pub const fn get(&self) -> Option<T> {
        self.occupant
    }

    #[must_use]
    pub const fn is_vacant(&self) -> bool {
        self.occupant.is_none()
    }

    /// # Errors
    ///
    /// Returns `ContainerError::Occupied` when the slot already holds a piece.
    pub fn set(&mut self, item: T) -> Result<(), ContainerError> {
        if self.occupant.is_some() {
            return Err(ContainerError::Occupied);
        }
        self.occupant = Some(item);
        Ok(())
    }

    /// Empty the slot unconditionally, returning the previous occupant.
    pub fn clear(&mut self) -> Option<T> {
        self.occupant.take()
    }
}

impl<T: Copy + Eq> Container<T> for Slot<T> {
    fn place(&mut self, item: T, _pos: Option<usize>) -> Result<Vec<T>, ContainerError> {
        self.set(item)?;
        Ok(Vec::new())
    }

    fn remove(&mut self, item: T) -> bool {
        if self.occupant == Some(item) {
            self.occupant = None;
            true
        } else {
            false
        }
    }

    fn contains(&self, item: T) -> bool {
        self.occupant == Some(item)
    }

    fn contents(&self) -> Vec<T> {
        self.occupant.into_iter().collect()
    }
}

/// Unordered, unbounded, append-only collection (the crypt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag<T> {
    items: Vec<T>,
}

impl<T> Default for Bag<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Copy + Eq> Bag<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn add(&mut self, item: T) {
        if !self.items.contains(&item) {
            self.items.push(item);
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Copy + Eq> Container<T> for Bag<T> {
    fn place(&mut self, item: T, _pos: Option<usize>) -> Result<Vec<T>, ContainerError> {
        self.add(item);
        Ok(Vec::new())
    }

    fn remove(&mut self, item: T) -> bool {
        let before = self.items.len();
        self.items.retain(|existing| *existing != item);
        self.items.len() != before
    }

    fn contains(&self, item: T) -> bool {
        self.items.contains(&item)
    }

    fn contents(&self) -> Vec<T> {
        self.items.clone()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// What a [`BoundedBox`] does when a piece arrives while it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Refuse the incoming piece.
    Reject,
    /// Evict the longest-resident piece, then append the incoming one.
    EvictOldest,
}

/// Ordered sequence with a fixed capacity and an overflow policy.
///
/// Index 0 is always the longest-resident piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedBox<T> {
    items: Vec<T>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl<T: Copy + Eq> BoundedBox<T> {
    #[must_use]
    pub const fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            items: Vec::new(),
            capacity,
            policy,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.get(index).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn position(&self, item: T) -> Option<usize> {
        self.items.iter().position(|existing| *existing == item)
    }

    /// Insert using the configured overflow policy.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::Capacity` when the box is full and rejects.
    pub fn insert(&mut self, item: T) -> Result<Vec<T>, ContainerError> {
        match self.policy {
            OverflowPolicy::Reject => self.insert_with(item, |_, _| {
                Err(ContainerError::Capacity {
                    capacity: usize::MAX,
                })
            }),
            OverflowPolicy::EvictOldest => self.insert_with(item, |_, items| {
                if items.is_empty() {
                    Ok(Vec::new())
                } else {
                    Ok(vec![items.remove(0)])
                }
            }),
        }
    }

    /// Insert with a caller-supplied overflow policy.
    ///
    /// The policy only runs when the box is full. It receives the incoming
    /// piece and the current contents, and must remove whatever it evicts,
    /// returning the evicted pieces. The incoming piece is appended
    /// afterwards; if the policy freed no room the insert fails.
    ///
    /// # Errors
    ///
    /// Returns the policy's error, or `ContainerError::Capacity` when the
    /// policy left the box full.
    pub fn insert_with<F>(&mut self, item: T, on_overflow: F) -> Result<Vec<T>, ContainerError>
    where
        F: FnOnce(&T, &mut Vec<T>) -> Result<Vec<T>, ContainerError>,
    {
        let capacity = self.capacity;
        let mut evicted = Vec::new();
        if self.is_full() {
            evicted = on_overflow(&item, &mut self.items).map_err(|err| match err {
                ContainerError::Capacity { .. } => ContainerError::Capacity { capacity },
                other => other,
            })?;
            if self.is_full() {
                return Err(ContainerError::Capacity { capacity });
            }
        }
        self.items.push(item);
        Ok(evicted)
    }
}

impl<T: Copy + Eq> Container<T> for BoundedBox<T> {
    fn place(&mut self, item: T, _pos: Option<usize>) -> Result<Vec<T>, ContainerError> {
        self.insert(item)
    }

    fn remove(&mut self, item: T) -> bool {
        match self.position(item) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    fn contains(&self, item: T) -> bool {
        self.items.contains(&item)
    }

    fn contents(&self) -> Vec<T> {
        self.items.clone()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Fixed-size array of slots whose two ends are adjacent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ring<T> {
    slots: Vec<Slot<T>>,
}

impl<T: Copy + Eq> Ring<T> {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(|_| Slot::new()).collect(),
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn get(&self, pos: usize) -> Option<T> {
        self.slots.get(pos).and_then(Slot::get)
    }

    /// # Errors
    ///
    /// Returns `ContainerError` when `pos` is out of range or occupied.
    pub fn set(&mut self, item: T, pos: usize) -> Result<(), ContainerError> {
        let len = self.slots.len();
        self.slots
            .get_mut(pos)
            .ok_or(ContainerError::OutOfRange { pos, len })?
            .set(item)
    }

    #[must_use]
    pub fn index_of(&self, item: T) -> Option<usize> {
        self.slots.iter().position(|slot| slot.get() == Some(item))
    }

    #[must_use]
    pub fn first_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Slot::is_vacant)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.first_free_slot().is_none()
    }

    /// Occupied positions with their occupants, in ring order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(pos, slot)| slot.get().map(|item| (pos, item)))
    }

    /// Whether two positions sit next to each other, wrapping at the ends.
    #[must_use]
    pub fn adjacent_positions(&self, a: usize, b: usize) -> bool {
        let n = self.slots.len();
        if a >= n || b >= n || a == b {
            return false;
        }
        let distance = (a + n - b) % n;
        distance == 1 || distance == n - 1
    }

    /// Whether two pieces occupy neighbouring slots.
    #[must_use]
    pub fn adjacent(&self, a: T, b: T) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(ai), Some(bi)) => self.adjacent_positions(ai, bi),
            _ => false,
        }
    }

    /// Occupants of the slots on either side of `pos`.
    #[must_use]
    pub fn neighbours(&self, pos: usize) -> Vec<T> {
        let n = self.slots.len();
        if n < 2 || pos >= n {
            return Vec::new();
        }
        let mut around = vec![(pos + 1) % n];
        let left = (pos + n - 1) % n;
        if !around.contains(&left) {
            around.push(left);
        }
        around
            .into_iter()
            .filter(|p| *p != pos)
            .filter_map(|p| self.get(p))
            .collect()
    }
}

impl<T: Copy + Eq> Container<T> for Ring<T> {
    fn place(&mut self, item: T, pos: Option<usize>) -> Result<Vec<T>, ContainerError> {
        let pos = pos.ok_or(ContainerError::PositionRequired)?;
        self.set(item, pos)?;
        Ok(Vec::new())
    }

    fn remove(&mut self, item: T) -> bool {
        self.slots.iter_mut().any(|slot| slot.remove(item))
    }

    fn contains(&self, item: T) -> bool {
        self.index_of(item).is_some()
    }

    fn contents(&self) -> Vec<T> {
        self.occupied().map(|(_, item)| item).collect()
    }
}
