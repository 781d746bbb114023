//! Dataset id binding for a single validation pass
//!
//! The first namespaced key fixes the dataset id; every later key must agree.
//! One binding lives for exactly one `validate` call and is threaded through
//! the parse explicitly.

use crate::schema::{split_key, DatasetKind};

use super::ast::FieldRef;
use super::errors::{QueryError, QueryResult};

/// Read-only view of which dataset ids are resident and their kinds
pub trait DatasetCatalog {
    /// Returns the kind of a resident dataset
    fn kind_of(&self, dataset_id: &str) -> Option<DatasetKind>;
}

/// Request-local accumulator of the bound dataset id and kind
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DatasetBinding {
    dataset_id: Option<String>,
    kind: Option<DatasetKind>,
}

impl DatasetBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    pub fn kind(&self) -> Option<DatasetKind> {
        self.kind
    }

    /// Resolves a namespaced key to a field of the bound dataset.
    ///
    /// Binds the dataset id on first use. When the catalog knows the id its
    /// kind decides the field set; otherwise the kind is inferred from the
    /// first field and all later fields must belong to it.
    pub fn resolve<C: DatasetCatalog + ?Sized>(
        &mut self,
        key: &str,
        catalog: &C,
    ) -> QueryResult<FieldRef> {
        let (id, field) = split_key(key)
            .ok_or_else(|| QueryError::malformed(format!("Invalid key '{}'", key)))?;

        match &self.dataset_id {
            None => {
                self.dataset_id = Some(id.to_string());
                self.kind = catalog.kind_of(id);
            }
            Some(bound) if bound != id => {
                return Err(QueryError::malformed(format!(
                    "Cannot query more than one dataset: '{}' and '{}'",
                    bound, id
                )));
            }
            Some(_) => {}
        }

        let def = match self.kind {
            Some(kind) => kind.field(field).ok_or_else(|| {
                QueryError::malformed(format!("Invalid key '{}' for {} dataset", key, kind))
            })?,
            None => {
                let (kind, def) = DatasetKind::owning(field)
                    .ok_or_else(|| QueryError::malformed(format!("Invalid key '{}'", key)))?;
                self.kind = Some(kind);
                def
            }
        };

        Ok(FieldRef {
            key: key.to_string(),
            field: def.name,
            field_type: def.field_type,
        })
    }
}
