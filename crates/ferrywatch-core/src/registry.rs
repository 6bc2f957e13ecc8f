//! [`VehicleRegistry`] – bounded store of tracked vessels.
//!
//! The registry is a fixed-capacity arena: slots are handed out in
//! insertion order starting at zero and are never released. Inserting past
//! capacity is rejected with [`FerryError::RegistryFull`]; an existing entry
//! is never overwritten or evicted.

use ferrywatch_types::{Coordinate, FerryError, VehicleId};

/// Capacity of the reference deployment.
pub const DEFAULT_CAPACITY: usize = 4;

/// Last-known state of one vessel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedVehicle {
    pub id: VehicleId,
    pub last_known: Coordinate,
    /// Current zone membership (`true` ≡ `Near`).
    pub in_zone: bool,
}

impl TrackedVehicle {
    pub fn new(id: VehicleId, last_known: Coordinate, in_zone: bool) -> Self {
        Self {
            id,
            last_known,
            in_zone,
        }
    }
}

/// Fixed-capacity map from [`VehicleId`] to [`TrackedVehicle`].
///
/// # Example
///
/// ```
/// use ferrywatch_core::registry::{TrackedVehicle, VehicleRegistry};
/// use ferrywatch_types::{Coordinate, FerryError, VehicleId};
///
/// let mut registry = VehicleRegistry::with_capacity(1);
/// let here = Coordinate::new(-27.5, 153.0);
///
/// registry.insert(TrackedVehicle::new(VehicleId(1), here, false)).unwrap();
/// assert!(registry.find(VehicleId(1)).is_some());
///
/// let full = registry.insert(TrackedVehicle::new(VehicleId(2), here, false));
/// assert_eq!(full, Err(FerryError::RegistryFull { capacity: 1 }));
/// ```
#[derive(Debug, Clone)]
pub struct VehicleRegistry {
    slots: Vec<TrackedVehicle>,
    capacity: usize,
}

impl Default for VehicleRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl VehicleRegistry {
    /// Create an empty registry holding at most [`DEFAULT_CAPACITY`] vessels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry holding at most `capacity` vessels.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Look up a vessel. No side effects.
    pub fn find(&self, id: VehicleId) -> Option<&TrackedVehicle> {
        self.slots.iter().find(|v| v.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: VehicleId) -> Option<&mut TrackedVehicle> {
        self.slots.iter_mut().find(|v| v.id == id)
    }

    /// Insert a previously unseen vessel.
    ///
    /// # Errors
    ///
    /// - [`FerryError::RegistryFull`] when every slot is taken.
    /// - [`FerryError::DuplicateVehicle`] when `vehicle.id` is already tracked;
    ///   the stored entry is left untouched.
    pub fn insert(&mut self, vehicle: TrackedVehicle) -> Result<(), FerryError> {
        if self.find(vehicle.id).is_some() {
            return Err(FerryError::DuplicateVehicle(vehicle.id));
        }
        if self.is_full() {
            return Err(FerryError::RegistryFull {
                capacity: self.capacity,
            });
        }
        self.slots.push(vehicle);
        Ok(())
    }

    /// Overwrite the last-known position of an already tracked vessel.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::UnknownVehicle`] when `id` is absent.
    pub fn update_position(&mut self, id: VehicleId, coord: Coordinate) -> Result<(), FerryError> {
        let vehicle = self.find_mut(id).ok_or(FerryError::UnknownVehicle(id))?;
        vehicle.last_known = coord;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Iterate tracked vessels in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedVehicle> {
        self.slots.iter()
    }
}
