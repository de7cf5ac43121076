use std::collections::HashMap;

use tracing::{debug, warn};

use super::{BuiltMenu, ClickBinding, ItemId, RenderableItem, WindowKey};
use crate::command::CommandExecutor;
use crate::config::{Action, ItemType, MenuNode};
use crate::constants::menu::MAX_DEPTH;
use crate::template::{RenderedLabel, TemplateEngine};

/// Turns config nodes into renderable items, running label commands on the way
pub struct MenuTreeBuilder<'a> {
    templates: TemplateEngine<'a>,
    bindings: HashMap<ItemId, ClickBinding>,
}

impl<'a> MenuTreeBuilder<'a> {
    pub fn new(executor: &'a CommandExecutor) -> Self {
        Self {
            templates: TemplateEngine::new(executor),
            bindings: HashMap::new(),
        }
    }

    pub async fn build(mut self, nodes: &[MenuNode]) -> BuiltMenu {
        let mut items = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            items.push(self.build_node(node, ItemId::root(index), 0).await);
        }
        debug!(
            items = items.len(),
            bindings = self.bindings.len(),
            "Built menu tree"
        );
        BuiltMenu {
            items,
            bindings: self.bindings,
        }
    }

    async fn build_node(&mut self, node: &MenuNode, id: ItemId, depth: usize) -> RenderableItem {
        let rendered = match node.item_type {
            ItemType::Separator => RenderedLabel {
                label_value: node.label.clone(),
                command_value: String::new(),
            },
            _ => {
                self.templates
                    .render_label(&node.label, node.command.as_deref(), node.max_label_length)
                    .await
            }
        };

        let mut submenu = Vec::with_capacity(node.submenu.len());
        if depth + 1 < MAX_DEPTH {
            for (index, child) in node.submenu.iter().enumerate() {
                submenu.push(Box::pin(self.build_node(child, id.child(index), depth + 1)).await);
            }
        } else if !node.submenu.is_empty() {
            warn!(item = %id, max_depth = MAX_DEPTH, "Menu nesting too deep, dropping submenu");
        }

        if node.item_type != ItemType::Separator && node.action != Action::None {
            let window_key = WindowKey::new(node.id.clone().unwrap_or_else(|| id.to_string()));
            self.bindings.insert(
                id.clone(),
                ClickBinding {
                    action: node.action.clone(),
                    command: node.command.clone(),
                    command_value: rendered.command_value,
                    window_key,
                },
            );
        }

        RenderableItem {
            id,
            label: rendered.label_value,
            kind: node.item_type,
            submenu,
        }
    }
}
