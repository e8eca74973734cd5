//! Module: db::statement
//! Responsibility: statement shapes (the identity under which prepared
//! statements are memoized) and the cache itself.
//! Does not own: CQL text generation or wire-level preparation (the
//! generator supplied to the cache does both).

mod cache;


pub use cache::{CacheStats, DEFAULT_CACHE_CAPACITY, StatementCache};

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

///
/// StatementKind
///
/// Operation family a prepared statement belongs to. Two statements with the
/// same table and field set but different kinds never share a cache slot.
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[remain::sorted]
pub enum StatementKind {
    Delete,
    Insert,
    SelectField,
    SelectSlice,
    UpdateFields,
}

impl StatementKind {
    const fn tag(self) -> u8 {
        match self {
            Self::Delete => 0x01,
            Self::Insert => 0x02,
            Self::SelectField => 0x03,
            Self::SelectSlice => 0x04,
            Self::UpdateFields => 0x05,
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Delete => "delete",
            Self::Insert => "insert",
            Self::SelectField => "select_field",
            Self::SelectSlice => "select_slice",
            Self::UpdateFields => "update_fields",
        };
        write!(f, "{label}")
    }
}

///
/// StatementShape
///
/// Value identity of one preparable statement: operation kind, table, field
/// set, and the mapped entity's path. Fields are a set, so the order a
/// caller happens to list them in never affects cache identity.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct StatementShape {
    kind: StatementKind,
    table: String,
    fields: BTreeSet<String>,
    entity_path: String,
}

impl StatementShape {
    #[must_use]
    pub fn new<F, S>(
        kind: StatementKind,
        table: impl Into<String>,
        fields: F,
        entity_path: impl Into<String>,
    ) -> Self
    where
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            table: table.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            entity_path: entity_path.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub const fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    #[must_use]
    pub fn entity_path(&self) -> &str {
        &self.entity_path
    }

    /// Deterministic digest of the shape. Stable across field listing order
    /// because the set iterates in canonical order.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub fn fingerprint(&self) -> ShapeFingerprint {
        let mut hasher = Sha256::new();
        write_tag(&mut hasher, self.kind.tag());
        write_str(&mut hasher, &self.table);
        write_u32(&mut hasher, self.fields.len() as u32);
        for field in &self.fields {
            write_str(&mut hasher, field);
        }
        write_str(&mut hasher, &self.entity_path);

        ShapeFingerprint(hasher.finalize().into())
    }
}

impl fmt::Display for StatementShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}[{}]",
            self.kind,
            self.table,
            self.fields.len()
        )
    }
}

///
/// ShapeFingerprint
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShapeFingerprint([u8; 32]);

impl ShapeFingerprint {
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ShapeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

// Deterministic tagged hash stream: tags and fixed-width lengths keep
// adjacent variable-length parts from colliding.

fn write_tag(hasher: &mut Sha256, tag: u8) {
    hasher.update([tag]);
}

fn write_u32(hasher: &mut Sha256, value: u32) {
    hasher.update(value.to_be_bytes());
}

#[expect(clippy::cast_possible_truncation)]
fn write_str(hasher: &mut Sha256, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}
