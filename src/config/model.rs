//! Typed menu configuration
//!
//! The file format is deliberately lenient: each menu node is converted on its
//! own, and a node that cannot be understood becomes a separator instead of
//! invalidating the whole document.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::constants::menu::{
    DEFAULT_MAX_LABEL_LENGTH, DEFAULT_TITLE, ERROR_TITLE, MAX_DEPTH, SEPARATOR_LABEL,
};

/// Click behaviour of a menu node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    None,
    BrowserWindow {
        url: Option<String>,
        size: Option<WindowSize>,
    },
    CopyValue {
        value: String,
    },
    ExecuteCommand,
    QuitApp,
}

impl Action {
    fn from_name(
        name: &str,
        url: Option<String>,
        size: Option<WindowSize>,
        value: Option<String>,
    ) -> Option<Self> {
        Some(match name {
            "browser-window" => Action::BrowserWindow { url, size },
            "copy-value" => Action::CopyValue {
                value: value.unwrap_or_default(),
            },
            "execute-command" => Action::ExecuteCommand,
            "quit-app" => Action::QuitApp,
            "none" => Action::None,
            _ => return None,
        })
    }
}

/// Presentation kind of a menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemType {
    #[default]
    Normal,
    Separator,
    Checkbox,
}

impl ItemType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(ItemType::Normal),
            "separator" => Some(ItemType::Separator),
            "checkbox" => Some(ItemType::Checkbox),
            _ => None,
        }
    }
}

/// Named window size, resolved against the screen at click time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeAlias {
    Fullscreen,
    Maximized,
    Minimized,
    Left,
    Right,
    Top,
    Bottom,
}

/// Explicit window geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExplicitSize {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub y: Option<i32>,
    #[serde(default)]
    pub fullscreen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WindowSize {
    Alias(SizeAlias),
    Explicit(ExplicitSize),
}

/// One entry of the menu tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuNode {
    /// Stable identity, used as the window key for browser-window items
    pub id: Option<String>,
    pub label: String,
    pub action: Action,
    pub command: Option<String>,
    pub item_type: ItemType,
    pub max_label_length: usize,
    pub submenu: Vec<MenuNode>,
}

impl MenuNode {
    /// Plain entry with defaults for everything but the label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            action: Action::None,
            command: None,
            item_type: ItemType::Normal,
            max_label_length: DEFAULT_MAX_LABEL_LENGTH,
            submenu: Vec::new(),
        }
    }

    pub fn separator() -> Self {
        Self {
            item_type: ItemType::Separator,
            ..Self::new(SEPARATOR_LABEL)
        }
    }

    /// Convert one JSON node, degrading to a separator when it is malformed
    pub fn from_value(value: Value, depth: usize) -> Self {
        let raw = match serde_json::from_value::<RawMenuNode>(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, depth, "Malformed menu node, replacing with separator");
                return Self::separator();
            }
        };
        raw.into_node(depth)
    }
}

/// On-disk shape of a node before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMenuNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    size: Option<WindowSize>,
    #[serde(default)]
    max_label_length: Option<usize>,
    #[serde(default)]
    submenu: Vec<Value>,
}

impl RawMenuNode {
    fn into_node(self, depth: usize) -> MenuNode {
        let RawMenuNode {
            id,
            label,
            action,
            kind,
            command,
            value,
            url,
            size,
            max_label_length,
            submenu,
        } = self;
        let command = command.filter(|c| !c.is_empty());
        let url = url.filter(|u| !u.is_empty());

        // `type` may carry an action name (older config files) when `action` is absent
        let (action_name, item_type) = match (action, kind.as_deref()) {
            (Some(action), kind) => (Some(action), kind.and_then(ItemType::from_name)),
            (None, Some(kind)) => match ItemType::from_name(kind) {
                Some(item_type) => (None, Some(item_type)),
                None => (Some(kind.to_string()), None),
            },
            (None, None) => (None, None),
        };
        let item_type = item_type.unwrap_or_default();

        let action = match action_name {
            Some(name) => Action::from_name(&name, url, size, value).unwrap_or_else(|| {
                warn!(action = %name, "Unknown menu action, treating as none");
                Action::None
            }),
            None => Action::None,
        };

        let label = match label.filter(|l| !l.is_empty()) {
            Some(label) => label,
            None if item_type == ItemType::Separator => SEPARATOR_LABEL.to_string(),
            None => {
                warn!(id = ?id, "Menu node without label, replacing with separator");
                return MenuNode::separator();
            }
        };

        let submenu = if depth + 1 >= MAX_DEPTH {
            if !submenu.is_empty() {
                warn!(
                    label = %label,
                    max_depth = MAX_DEPTH,
                    "Menu nesting too deep, dropping submenu"
                );
            }
            Vec::new()
        } else {
            submenu
                .into_iter()
                .map(|child| MenuNode::from_value(child, depth + 1))
                .collect()
        };

        MenuNode {
            id,
            label,
            action,
            command,
            item_type,
            max_label_length: max_label_length.unwrap_or(DEFAULT_MAX_LABEL_LENGTH),
            submenu,
        }
    }
}

/// Icon as written in the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl IconSpec {
    /// `"name"` or `{ "name": .., "width": .., "height": .. }`; anything else is no icon
    pub fn from_value(value: &Value) -> Option<Self> {
        use crate::constants::icon::DEFAULT_SIZE;

        match value {
            Value::String(name) if !name.is_empty() => Some(Self {
                name: name.clone(),
                width: DEFAULT_SIZE,
                height: DEFAULT_SIZE,
            }),
            Value::Object(map) => {
                let name = map.get("name")?.as_str().filter(|n| !n.is_empty())?;
                let dimension = |key: &str| {
                    map.get(key)
                        .and_then(Value::as_u64)
                        .and_then(|v| u32::try_from(v).ok())
                        .unwrap_or(DEFAULT_SIZE)
                };
                Some(Self {
                    name: name.to_string(),
                    width: dimension("width"),
                    height: dimension("height"),
                })
            }
            _ => None,
        }
    }
}

/// Resolved tray icon
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Icon {
    #[default]
    Empty,
    File {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// Root of the menu configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub icon: Icon,
    pub title: String,
    pub description: String,
    pub menus: Vec<MenuNode>,
}

impl Config {
    /// Minimal config shown when loading failed
    pub fn fallback(message: impl Into<String>) -> Self {
        Self {
            icon: Icon::Empty,
            title: ERROR_TITLE.to_string(),
            description: message.into(),
            menus: Vec::new(),
        }
    }
}

/// On-disk shape of the root before validation
#[derive(Debug, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub icon: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub menus: Option<Vec<Value>>,
}

impl RawConfig {
    /// Apply defaults; icon resolution is left to the caller
    pub fn into_parts(self) -> (Option<IconSpec>, String, String, Vec<MenuNode>) {
        let icon = self.icon.as_ref().and_then(IconSpec::from_value);
        let title = match (&icon, self.title) {
            (Some(_), title) => title.unwrap_or_default(),
            (None, Some(title)) if !title.is_empty() => title,
            (None, _) => DEFAULT_TITLE.to_string(),
        };
        let menus = self
            .menus
            .unwrap_or_default()
            .into_iter()
            .map(|node| MenuNode::from_value(node, 0))
            .collect();
        (icon, title, self.description.unwrap_or_default(), menus)
    }
}
