//! Flattened report of a complete evaluation.
//!
//! The bundle is the form a binding layer ships across the language
//! boundary: plain `f64` arrays tagged with their dimension metadata, one
//! entry per `(entity, quantity)`, stamped with when it was computed.

use serde::Serialize;

use crate::context::ObjectId;
use crate::math::Scalar;
use crate::store::DimensionInfo;
use crate::vector::DenseVector;

/// One derived quantity, collapsed to primal values.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub entity_id: ObjectId,
    pub name: String,
    pub values: Vec<f64>,
    pub dims: Vec<usize>,
    pub dim_names: Vec<String>,
}

impl ReportEntry {
    pub(crate) fn new<T: Scalar>(
        entity_id: ObjectId,
        name: &str,
        vector: &DenseVector<T>,
        dims: Option<&DimensionInfo>,
    ) -> Self {
        Self {
            entity_id,
            name: name.to_string(),
            values: vector.to_f64s(),
            dims: dims.map(|d| d.dims.clone()).unwrap_or_else(|| vec![vector.len()]),
            dim_names: dims.map(|d| d.dim_names.clone()).unwrap_or_default(),
        }
    }
}

/// Every derived quantity of one evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct ReportBundle {
    /// RFC 3339 timestamp of when the report was assembled.
    pub computed_at: String,
    pub entries: Vec<ReportEntry>,
}

impl ReportBundle {
    pub(crate) fn new(entries: Vec<ReportEntry>) -> Self {
        Self {
            computed_at: chrono::Utc::now().to_rfc3339(),
            entries,
        }
    }

    /// Look up one quantity by entity and name.
    pub fn get(&self, entity_id: ObjectId, name: &str) -> Option<&ReportEntry> {
        self.entries
            .iter()
            .find(|e| e.entity_id == entity_id && e.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
