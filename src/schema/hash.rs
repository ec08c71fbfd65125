//! FNV-1a name hashing for schema identity
//!
//! Types, enumerations, and attributes are identified by a stable 64-bit hash
//! of their name. The hash is a pure function of the string, so identifiers
//! are identical across process runs and can tag types in serialized
//! documents (indirectly, via the name they were derived from).

/// FNV-1a 64-bit hash (compile-time capable)
pub const fn fnv1a_64(data: &[u8]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x00000100000001B3;

    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < data.len() {
        hash ^= data[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Identity of a declared type or enumeration.
///
/// Enumerations share the hashed-name namespace with types; the database
/// keeps them in separate tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u64);

impl TypeId {
    /// Hash a name into its stable identifier.
    pub const fn of(name: &str) -> Self {
        Self(fnv1a_64(name.as_bytes()))
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Identity of an attribute, hashed from the attribute name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttributeId(pub u64);

impl AttributeId {
    pub const fn of(name: &str) -> Self {
        Self(fnv1a_64(name.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_64_empty() {
        // Empty input should return the offset basis
        assert_eq!(fnv1a_64(b""), 0xcbf29ce484222325);
    }

    #[test]
    fn test_fnv1a_64_known_vectors() {
        assert_eq!(fnv1a_64(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a_64(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_type_id_stable() {
        // Pure function of the string: repeated calls agree
        assert_eq!(TypeId::of("Asset"), TypeId::of("Asset"));
        assert_ne!(TypeId::of("Asset"), TypeId::of("asset"));
    }

    #[test]
    fn test_const_evaluation() {
        const ID: TypeId = TypeId::of("TerrainLayer");
        assert!(ID.0 != 0);
    }
}
