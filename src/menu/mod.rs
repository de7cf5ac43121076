//! Renderable menu tree and the click dispatch table built from a config

mod builder;

pub use builder::MenuTreeBuilder;

use std::collections::HashMap;
use std::fmt;

use crate::config::{Action, ItemType};

/// Position of a node in the config tree, e.g. `"0.2.1"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    pub fn root(index: usize) -> Self {
        Self(index.to_string())
    }

    pub fn child(&self, index: usize) -> Self {
        Self(format!("{}.{index}", self.0))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a browser window: the node's explicit id, or its tree path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowKey(String);

impl WindowKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry handed to the presenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderableItem {
    pub id: ItemId,
    pub label: String,
    pub kind: ItemType,
    pub submenu: Vec<RenderableItem>,
}

/// What to do when an item is clicked, captured at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickBinding {
    pub action: Action,
    pub command: Option<String>,
    /// Command output computed while rendering the label
    pub command_value: String,
    pub window_key: WindowKey,
}

/// Output of one build pass
#[derive(Debug, Default)]
pub struct BuiltMenu {
    pub items: Vec<RenderableItem>,
    pub bindings: HashMap<ItemId, ClickBinding>,
}

impl BuiltMenu {
    /// Indented text rendering, one item per line
    pub fn to_text(&self) -> String {
        fn write_items(out: &mut String, items: &[RenderableItem], indent: usize) {
            for item in items {
                let marker = match item.kind {
                    ItemType::Separator => "---".to_string(),
                    ItemType::Checkbox => format!("[ ] {}", item.label),
                    ItemType::Normal => item.label.clone(),
                };
                out.push_str(&"  ".repeat(indent));
                out.push_str(&marker);
                if !item.submenu.is_empty() {
                    out.push_str(" >");
                }
                out.push('\n');
                write_items(out, &item.submenu, indent + 1);
            }
        }

        let mut out = String::new();
        write_items(&mut out, &self.items, 0);
        out
    }
}
