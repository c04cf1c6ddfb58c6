//! Tool manifest announced to stream subscribers on the handshake.

use serde::{Deserialize, Serialize};

/// One logical operation a connected agent may call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Stable tool name.
    pub name: String,
    /// Short human-readable description.
    pub description: String,
}

/// Static descriptor of the operations the board exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// The advertised tools.
    pub tools: Vec<ToolDescriptor>,
}

impl Default for Manifest {
    fn default() -> Self {
        let tool = |name: &str, description: &str| ToolDescriptor {
            name: name.to_owned(),
            description: description.to_owned(),
        };
        Self {
            tools: vec![
                tool("open_item", "Return first open item"),
                tool("close_item", "Close an item"),
                tool("list_items", "Return full list"),
            ],
        }
    }
}
