//! Capability table
//!
//! Scripts declare what they support by name; each known name owns one bit
//! of the descriptor's capability mask. The bit position is the index in
//! [`CAPABILITY_NAMES`].

use serde::{Serialize, Serializer};

/// Known capability names, in bit order
pub const CAPABILITY_NAMES: &[&str] = &["search"];

/// Bitmask of declared capabilities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u32);

impl Capabilities {
    /// The source accepts search queries
    pub const SEARCH: Capabilities = Capabilities(1 << 0);

    pub const fn empty() -> Self {
        Capabilities(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Capabilities(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Capabilities) {
        self.0 |= other.0;
    }

    /// Exact, case-sensitive lookup
    pub fn from_name(name: &str) -> Option<Capabilities> {
        CAPABILITY_NAMES
            .iter()
            .position(|known| *known == name)
            .map(|bit| Capabilities(1u32 << bit))
    }

    /// Names of the set bits, in bit order
    pub fn names(self) -> Vec<&'static str> {
        CAPABILITY_NAMES
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.0 & (1u32 << *bit) != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}

impl Serialize for Capabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.names().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_is_bit_zero() {
        assert_eq!(Capabilities::from_name("search"), Some(Capabilities::SEARCH));
        assert_eq!(Capabilities::SEARCH.bits(), 1);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(Capabilities::from_name("Search"), None);
        assert_eq!(Capabilities::from_name("search "), None);
        assert_eq!(Capabilities::from_name("bogus"), None);
    }

    #[test]
    fn test_insert_and_contains() {
        let mut caps = Capabilities::empty();
        assert!(caps.is_empty());
        caps.insert(Capabilities::SEARCH);
        caps.insert(Capabilities::SEARCH);
        assert!(caps.contains(Capabilities::SEARCH));
        assert_eq!(caps.bits(), 1);
    }

    #[test]
    fn test_names_roundtrip_table() {
        let caps = Capabilities::from_bits(0b1);
        assert_eq!(caps.names(), vec!["search"]);
        assert!(Capabilities::empty().names().is_empty());
    }

    #[test]
    fn test_serializes_as_names() {
        let json = serde_json::to_string(&Capabilities::SEARCH).unwrap();
        assert_eq!(json, r#"["search"]"#);
    }
}
