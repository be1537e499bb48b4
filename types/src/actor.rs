//! Actor identity attached to every ledger-affecting operation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who initiated a ledger operation.
///
/// The ledger's append policy keys off this: `Admin` can never append
/// directly — votes enter only through the voting process or the system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    Voter,
    Admin,
    System,
    /// A peer node, for blocks arriving over the network.
    Node,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voter => "voter",
            Self::Admin => "admin",
            Self::System => "system",
            Self::Node => "node",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_lowercase() {
        assert_eq!(serde_json::to_string(&ActorType::Admin).unwrap(), "\"admin\"");
        let back: ActorType = serde_json::from_str("\"voter\"").unwrap();
        assert_eq!(back, ActorType::Voter);
    }
}
