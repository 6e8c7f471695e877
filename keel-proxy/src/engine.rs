//! Engine identity: the closed kind set and uid helpers.

use std::fmt;

use uuid::Uuid;

/// Engine flavor announced in the VERSION handshake.
///
/// The set is closed: an unknown name aborts the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Python,
    Java,
}

impl EngineKind {
    pub const ALL: [EngineKind; 2] = [EngineKind::Python, EngineKind::Java];

    pub fn from_name(name: &str) -> Option<EngineKind> {
        match name {
            "python" => Some(EngineKind::Python),
            "java" => Some(EngineKind::Java),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Python => "python",
            EngineKind::Java => "java",
        }
    }

    /// Dense index for per-kind tables.
    pub(crate) fn index(self) -> usize {
        match self {
            EngineKind::Python => 0,
            EngineKind::Java => 1,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fresh uid for a locally launched engine (UUID v4 textual form).
pub fn new_uid() -> String {
    Uuid::new_v4().to_string()
}

/// Whether a handshake uid has the expected UUID textual shape.
pub fn is_valid_uid(uid: &str) -> bool {
    Uuid::try_parse(uid).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_roundtrip() {
        for kind in EngineKind::ALL {
            assert_eq!(EngineKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EngineKind::from_name("martian"), None);
    }

    #[test]
    fn fresh_uids_are_valid_and_distinct() {
        let a = new_uid();
        let b = new_uid();
        assert!(is_valid_uid(&a));
        assert!(is_valid_uid(&b));
        assert_ne!(a, b);
        assert!(!is_valid_uid("not-a-uuid"));
    }
}
