//! Application-protocol identification surface.
//!
//! The dispatch core never decodes a protocol itself; it deals in opaque
//! [`AppProto`] identifiers handed out by the detector and consumed by the
//! parser. The concrete detection and parsing engines plug in behind the
//! traits in [`detect`] and [`parser`].

pub mod detect;
pub mod parser;

use bimap::BiMap;

/// Opaque identifier for an application-layer protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AppProto(pub u16);

impl AppProto {
    /// Reserved sentinel: protocol not (yet) identified.
    pub const UNKNOWN: AppProto = AppProto(0);

    #[inline]
    pub fn is_unknown(self) -> bool {
        self == AppProto::UNKNOWN
    }
}

/// Transport carrying a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Tcp,
    Udp,
}

/// Bidirectional name to protocol table.
///
/// Building block for detector implementations; identifiers are assigned
/// sequentially starting at 1, with 0 reserved for [`AppProto::UNKNOWN`].
#[derive(Debug)]
pub struct ProtoTable {
    map: BiMap<String, AppProto>,
    next: u16,
}

impl ProtoTable {
    pub fn new() -> Self {
        ProtoTable {
            map: BiMap::new(),
            next: 1,
        }
    }

    /// Registers `name`, returning its identifier. Re-registering a name
    /// returns the identifier it already has.
    pub fn register(&mut self, name: &str) -> AppProto {
        if let Some(proto) = self.map.get_by_left(name) {
            return *proto;
        }
        let proto = AppProto(self.next);
        self.next += 1;
        self.map.insert(name.to_string(), proto);
        proto
    }

    /// Looks up a protocol by name, `UNKNOWN` if not registered.
    pub fn by_name(&self, name: &str) -> AppProto {
        self.map
            .get_by_left(name)
            .copied()
            .unwrap_or(AppProto::UNKNOWN)
    }

    /// Registered name for `proto`, if any.
    pub fn name_of(&self, proto: AppProto) -> Option<&str> {
        self.map.get_by_right(&proto).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for ProtoTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trip() {
        let mut table = ProtoTable::new();
        let http = table.register("http");
        let ssh = table.register("ssh");
        assert_ne!(http, ssh);
        assert!(!http.is_unknown());

        for name in ["http", "ssh"] {
            assert_eq!(table.name_of(table.by_name(name)), Some(name));
        }
    }

    #[test]
    fn register_is_idempotent() {
        let mut table = ProtoTable::new();
        let first = table.register("dns");
        let second = table.register("dns");
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unknown_lookups() {
        let table = ProtoTable::new();
        assert_eq!(table.by_name("nope"), AppProto::UNKNOWN);
        assert_eq!(table.name_of(AppProto::UNKNOWN), None);
        assert_eq!(table.name_of(AppProto(42)), None);
    }
}
