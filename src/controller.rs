//! Menu lifecycle: load the config, build the tree, present it, dispatch clicks

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::PathBuf;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::command::CommandExecutor;
use crate::config::{self, Action, Config};
use crate::geometry::WindowGeometry;
use crate::menu::{ClickBinding, ItemId, MenuTreeBuilder};
use crate::presenter::{ControllerEvent, Presenter};
use crate::template::TemplateEngine;
use crate::window_cache::WindowCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No load attempted yet
    Uninitialized,
    /// Last load succeeded
    Ready,
    /// Last load failed, the fallback menu is shown
    Error,
}

pub struct Controller<P: Presenter> {
    presenter: P,
    executor: CommandExecutor,
    config_path: PathBuf,
    resources_dir: PathBuf,
    state: ControllerState,
    last_good: Option<Config>,
    bindings: HashMap<ItemId, ClickBinding>,
    windows: WindowCache,
    terminated: bool,
}

impl<P: Presenter> Controller<P> {
    pub fn new(
        presenter: P,
        executor: CommandExecutor,
        config_path: PathBuf,
        resources_dir: PathBuf,
    ) -> Self {
        Self {
            presenter,
            executor,
            config_path,
            resources_dir,
            state: ControllerState::Uninitialized,
            last_good: None,
            bindings: HashMap::new(),
            windows: WindowCache::new(),
            terminated: false,
        }
    }

    /// Read the config file again and present a freshly built menu
    pub async fn refresh(&mut self) {
        if self.terminated {
            return;
        }

        let config = match config::try_load(&self.config_path, &self.resources_dir) {
            Ok(config) => {
                if self.state != ControllerState::Ready {
                    info!(previous = ?self.state, "Config ready");
                }
                self.state = ControllerState::Ready;
                self.last_good = Some(config.clone());
                config
            }
            Err(e) => {
                warn!(
                    error = %e,
                    last_good = ?self.last_good.as_ref().map(|c| &c.title),
                    "Config load failed, showing fallback menu"
                );
                self.state = ControllerState::Error;
                Config::fallback(e.to_string())
            }
        };

        self.present(&config).await;
    }

    async fn present(&mut self, config: &Config) {
        let built = MenuTreeBuilder::new(&self.executor)
            .build(&config.menus)
            .await;

        self.presenter.set_icon(&config.icon).await;
        self.presenter.set_title(&config.title).await;
        self.presenter.set_tool_tip(&config.description).await;
        self.presenter.set_menu_tree(built.items).await;
        self.bindings = built.bindings;
    }

    /// Handle one event; `Break` once the controller has terminated
    pub async fn handle_event(&mut self, event: ControllerEvent) -> ControlFlow<()> {
        if self.terminated {
            return ControlFlow::Break(());
        }

        match event {
            ControllerEvent::ConfigChanged | ControllerEvent::TrayActivated => {
                self.refresh().await;
            }
            ControllerEvent::ItemClicked(id) => {
                self.dispatch(&id).await;
                // Command-derived labels refresh after every click
                self.refresh().await;
            }
            ControllerEvent::WindowClosed(handle) => self.windows.forget(&handle),
            ControllerEvent::Shutdown => {
                info!("Shutdown requested");
                self.terminate().await;
            }
        }

        if self.terminated {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    async fn dispatch(&mut self, id: &ItemId) {
        let Some(binding) = self.bindings.get(id).cloned() else {
            debug!(item = %id, "Click on item without binding");
            return;
        };

        match &binding.action {
            Action::None => {}
            Action::BrowserWindow { url, size } => {
                let Some(url) = url else {
                    warn!(item = %id, "browser-window item has no url");
                    return;
                };
                let geometry = WindowGeometry::resolve(size.as_ref(), self.presenter.screen_size());
                if let Err(e) = self
                    .windows
                    .open_or_focus(&self.presenter, &binding.window_key, url, geometry)
                    .await
                {
                    warn!(item = %id, error = %e, "Failed to open window");
                }
            }
            Action::ExecuteCommand => {
                let Some(command) = binding.command else {
                    warn!(item = %id, "execute-command item has no command");
                    return;
                };
                let executor = self.executor.clone();
                tokio::spawn(async move {
                    let output = executor.run(&command).await;
                    debug!(command = %command, bytes = output.len(), "Executed command");
                });
            }
            Action::CopyValue { value } => {
                let text = TemplateEngine::new(&self.executor)
                    .render_value(value, binding.command.as_deref(), &binding.command_value)
                    .await;
                match self.presenter.write_clipboard(&text) {
                    Ok(()) => info!(item = %id, bytes = text.len(), "Copied value to clipboard"),
                    Err(e) => warn!(item = %id, error = %e, "Failed to copy value"),
                }
            }
            Action::QuitApp => {
                info!("Quit requested from menu");
                self.terminate().await;
            }
        }
    }

    async fn terminate(&mut self) {
        self.terminated = true;
        self.bindings.clear();
        self.presenter.terminate_process().await;
    }

    /// Present the initial menu, then process events until terminated or all senders drop
    pub async fn run(mut self, mut events: UnboundedReceiver<ControllerEvent>) {
        self.refresh().await;
        while let Some(event) = events.recv().await {
            debug!(?event, "Controller event");
            if self.handle_event(event).await.is_break() {
                break;
            }
        }
        info!(state = ?self.state, terminated = self.terminated, "Controller stopped");
    }
}
