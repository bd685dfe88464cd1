//! Capabilities generated DAOs require from entity types

/// An entity whose primary key can be filled in after an insert.
///
/// Generated DAOs implement this for every table entity. When the store
/// reports a generated key greater than zero, `insert`/`upsert` call
/// `set_primary_key`. Keys that do not fit the field's type are ignored,
/// which keeps caller-populated keys intact.
pub trait HasPrimaryKey {
    fn set_primary_key(&mut self, key: u64);
}
