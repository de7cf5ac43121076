//! Boundary between the controller and the desktop
//!
//! The controller only talks to a [`Presenter`]. The Linux implementation lives in
//! [`tray`] (StatusNotifierItem + clipboard) and [`browser`] (app-mode windows).

pub mod browser;
pub mod tray;

use crate::config::Icon;
use crate::geometry::{ScreenSize, WindowGeometry};
use crate::menu::{ItemId, RenderableItem, WindowKey};

pub use tray::TrayPresenter;

/// Everything the presentation layer reports back to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The config file changed on disk
    ConfigChanged,
    /// The tray icon itself was clicked
    TrayActivated,
    ItemClicked(ItemId),
    /// The process behind this window exited
    WindowClosed(WindowHandle),
    /// SIGINT/SIGTERM
    Shutdown,
}

/// A live window created for a browser-window item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHandle {
    pub key: WindowKey,
    /// Process owning the window, if the adapter launched one
    pub pid: Option<u32>,
}

/// Host UI operations used by the controller.
///
/// Click listeners are registered when an implementation is constructed with the
/// controller's event sender; clicks then arrive as [`ControllerEvent`]s.
#[allow(async_fn_in_trait)]
pub trait Presenter {
    async fn set_icon(&self, icon: &Icon);

    async fn set_title(&self, title: &str);

    async fn set_tool_tip(&self, text: &str);

    async fn set_menu_tree(&self, items: Vec<RenderableItem>);

    /// Create a new window showing `url`
    async fn create_window(
        &self,
        key: &WindowKey,
        url: &str,
        geometry: WindowGeometry,
    ) -> anyhow::Result<WindowHandle>;

    /// Bring an existing window to the front. An error means the window is gone.
    async fn focus_window(&self, handle: &WindowHandle) -> anyhow::Result<()>;

    fn screen_size(&self) -> ScreenSize;

    fn write_clipboard(&self, text: &str) -> anyhow::Result<()>;

    async fn terminate_process(&self);
}
