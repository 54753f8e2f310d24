//! Derived-quantity store.
//!
//! Each evaluator owns one store: a per-entity mapping from quantity name to
//! a dense vector, with dimension metadata carried alongside so downstream
//! consumers can reshape values without re-deriving axes. The store lives on
//! the evaluator rather than on the entities because different evaluators
//! expose different quantities for the same population or fleet, and a
//! `Prepare` must reset exactly the quantities of the current evaluation.
//!
//! Map iteration order is the key order (`BTreeMap`), so resets, reports,
//! and the arithmetic graph built from the store are reproducible run to run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::ObjectId;
use crate::math::Scalar;
use crate::vector::DenseVector;

/// Shape metadata for one derived quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionInfo {
    pub name: String,
    pub dims: Vec<usize>,
    pub dim_names: Vec<String>,
}

impl DimensionInfo {
    pub fn new(name: &str, dims: &[usize], dim_names: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            dims: dims.to_vec(),
            dim_names: dim_names.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Named vectors for one class of entity (populations or fleets).
#[derive(Debug, Clone, Default)]
pub struct EntityQuantities<T> {
    values: BTreeMap<ObjectId, BTreeMap<String, DenseVector<T>>>,
    dims: BTreeMap<ObjectId, BTreeMap<String, DimensionInfo>>,
    /// Returned by [`Self::entity`] on a miss; stays empty forever.
    empty: BTreeMap<String, DenseVector<T>>,
}

impl<T: Scalar> EntityQuantities<T> {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            dims: BTreeMap::new(),
            empty: BTreeMap::new(),
        }
    }

    /// Allocate a zeroed vector of `len` under `(entity, name)` and record
    /// its dimensions. Re-registering replaces the previous allocation.
    pub fn register(&mut self, entity: ObjectId, name: &str, len: usize, info: DimensionInfo) {
        self.values
            .entry(entity)
            .or_default()
            .insert(name.to_string(), DenseVector::zeros(len));
        self.dims.entry(entity).or_default().insert(name.to_string(), info);
    }

    /// Zero every vector registered for `entity`, preserving capacity.
    pub fn reset_all(&mut self, entity: ObjectId) {
        if let Some(map) = self.values.get_mut(&entity) {
            for v in map.values_mut() {
                v.reset();
            }
        }
    }

    /// All quantities for one entity. A lookup for an entity that was never
    /// registered warns and returns an empty record.
    pub fn entity(&self, entity: ObjectId) -> &BTreeMap<String, DenseVector<T>> {
        match self.values.get(&entity) {
            Some(map) => map,
            None => {
                tracing::warn!(entity, "derived-quantity lookup for unknown entity");
                &self.empty
            }
        }
    }

    /// One quantity, read-only. Panics if the name was never registered for
    /// the entity: registration happens during `Initialize`, so a miss here
    /// is a construction bug, which is fatal by contract.
    pub fn get(&self, entity: ObjectId, name: &str) -> &DenseVector<T> {
        self.values
            .get(&entity)
            .and_then(|m| m.get(name))
            .unwrap_or_else(|| panic!("derived quantity `{name}` not registered for entity {entity}"))
    }

    /// One quantity, writable. Same registration contract as [`Self::get`].
    pub fn get_mut(&mut self, entity: ObjectId, name: &str) -> &mut DenseVector<T> {
        self.values
            .get_mut(&entity)
            .and_then(|m| m.get_mut(name))
            .unwrap_or_else(|| panic!("derived quantity `{name}` not registered for entity {entity}"))
    }

    /// Dimension metadata for one quantity, if registered.
    pub fn dims(&self, entity: ObjectId, name: &str) -> Option<&DimensionInfo> {
        self.dims.get(&entity).and_then(|m| m.get(name))
    }

    /// Iterate `(entity, name, vector, dims)` in deterministic order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (ObjectId, &str, &DenseVector<T>, Option<&DimensionInfo>)> + '_ {
        self.values.iter().flat_map(move |(&entity, map)| {
            map.iter().map(move |(name, vec)| {
                (
                    entity,
                    name.as_str(),
                    vec,
                    self.dims.get(&entity).and_then(|m| m.get(name)),
                )
            })
        })
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.values.keys().copied()
    }
}

/// The full store of one evaluator: population-scoped and fleet-scoped
/// quantities kept apart so both sides can be borrowed at once during the
/// traversal.
#[derive(Debug, Clone, Default)]
pub struct QuantityStore<T> {
    pub populations: EntityQuantities<T>,
    pub fleets: EntityQuantities<T>,
}

impl<T: Scalar> QuantityStore<T> {
    pub fn new() -> Self {
        Self {
            populations: EntityQuantities::new(),
            fleets: EntityQuantities::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_reset_preserves_shape() {
        let mut q: EntityQuantities<f64> = EntityQuantities::new();
        q.register(7, "biomass", 4, DimensionInfo::new("biomass", &[4], &["year"]));
        q.get_mut(7, "biomass")[2] = 11.0;
        q.reset_all(7);
        assert_eq!(q.get(7, "biomass").len(), 4);
        assert_eq!(q.get(7, "biomass")[2], 0.0);
    }

    #[test]
    fn test_unknown_entity_returns_empty_record() {
        let q: EntityQuantities<f64> = EntityQuantities::new();
        assert!(q.entity(99).is_empty());
    }

    #[test]
    fn test_dims_travel_with_values() {
        let mut q: EntityQuantities<f64> = EntityQuantities::new();
        q.register(
            1,
            "numbers_at_age",
            12,
            DimensionInfo::new("numbers_at_age", &[4, 3], &["year", "age"]),
        );
        let d = q.dims(1, "numbers_at_age").unwrap();
        assert_eq!(d.dims, vec![4, 3]);
        assert_eq!(d.dim_names, vec!["year", "age"]);
    }
}
