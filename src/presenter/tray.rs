//! StatusNotifierItem tray (via `ksni`) backing the [`Presenter`] trait

use std::cell::RefCell;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use ksni::TrayMethods;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use super::browser::{self, BrowserLauncher};
use super::{ControllerEvent, Presenter, WindowHandle};
use crate::config::{Icon, ItemType};
use crate::constants::config::TRAY_ID;
use crate::geometry::{ScreenSize, WindowGeometry};
use crate::menu::{RenderableItem, WindowKey};
use crate::x11_utils::X11Session;

/// Icon in the form the StatusNotifierItem protocol carries it
#[derive(Debug, Clone, Default)]
enum TrayIcon {
    #[default]
    None,
    /// Icon name plus the directory to look it up in
    Themed { name: String, theme_path: String },
    Pixmap(ksni::Icon),
}

/// Tray state published over D-Bus
pub struct MenuTray {
    icon: TrayIcon,
    title: String,
    tool_tip: String,
    items: Vec<RenderableItem>,
    events: UnboundedSender<ControllerEvent>,
}

impl MenuTray {
    fn new(events: UnboundedSender<ControllerEvent>) -> Self {
        Self {
            icon: TrayIcon::None,
            title: String::new(),
            tool_tip: String::new(),
            items: Vec::new(),
            events,
        }
    }

    fn send(&self, event: ControllerEvent) {
        if self.events.send(event).is_err() {
            debug!("Controller gone, dropping tray event");
        }
    }
}

fn to_menu_item(item: &RenderableItem) -> ksni::MenuItem<MenuTray> {
    use ksni::menu::{CheckmarkItem, StandardItem, SubMenu};

    if item.kind == ItemType::Separator {
        return ksni::MenuItem::Separator;
    }
    if !item.submenu.is_empty() {
        return SubMenu {
            label: item.label.clone(),
            submenu: item.submenu.iter().map(to_menu_item).collect(),
            ..Default::default()
        }
        .into();
    }

    let id = item.id.clone();
    let activate = Box::new(move |tray: &mut MenuTray| {
        tray.send(ControllerEvent::ItemClicked(id.clone()));
    });
    match item.kind {
        ItemType::Checkbox => CheckmarkItem {
            label: item.label.clone(),
            checked: false,
            activate,
            ..Default::default()
        }
        .into(),
        _ => StandardItem {
            label: item.label.clone(),
            activate,
            ..Default::default()
        }
        .into(),
    }
}

impl ksni::Tray for MenuTray {
    fn id(&self) -> String {
        TRAY_ID.to_string()
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        self.send(ControllerEvent::TrayActivated);
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn icon_name(&self) -> String {
        match &self.icon {
            TrayIcon::Themed { name, .. } => name.clone(),
            _ => String::new(),
        }
    }

    fn icon_theme_path(&self) -> String {
        match &self.icon {
            TrayIcon::Themed { theme_path, .. } => theme_path.clone(),
            _ => String::new(),
        }
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        match &self.icon {
            TrayIcon::Pixmap(icon) => vec![icon.clone()],
            _ => Vec::new(),
        }
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            title: self.title.clone(),
            description: self.tool_tip.clone(),
            ..Default::default()
        }
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        self.items.iter().map(to_menu_item).collect()
    }
}

/// Linux presenter: `ksni` tray, `arboard` clipboard, browser windows focused over X11
pub struct TrayPresenter {
    handle: ksni::Handle<MenuTray>,
    clipboard: RefCell<Option<arboard::Clipboard>>,
    browser: BrowserLauncher,
    x11: Option<X11Session>,
}

impl TrayPresenter {
    /// Start the tray service; clicks are reported on `events`
    pub async fn spawn(
        events: UnboundedSender<ControllerEvent>,
        browser_program: &str,
        profiles_dir: PathBuf,
    ) -> Result<Self> {
        debug!("Creating tray with ksni");
        let handle = MenuTray::new(events.clone())
            .spawn()
            .await
            .map_err(|e| anyhow!("Failed to start tray service: {e}"))?;
        info!("ksni tray service started");

        let x11 = X11Session::connect()
            .inspect_err(|e| warn!(error = %e, "X11 unavailable, window focus disabled"))
            .ok();

        Ok(Self {
            handle,
            clipboard: RefCell::new(None),
            browser: BrowserLauncher::new(browser_program, profiles_dir, events),
            x11,
        })
    }

    async fn update(&self, what: &str, f: impl FnOnce(&mut MenuTray) + Send + 'static) {
        if self.handle.update(f).await.is_none() {
            warn!(what, "Tray service is gone, update dropped");
        }
    }
}

impl Presenter for TrayPresenter {
    async fn set_icon(&self, icon: &Icon) {
        let icon = tray_icon(icon);
        self.update("icon", move |tray| tray.icon = icon).await;
    }

    async fn set_title(&self, title: &str) {
        let title = title.to_string();
        self.update("title", move |tray| tray.title = title).await;
    }

    async fn set_tool_tip(&self, text: &str) {
        let text = text.to_string();
        self.update("tool tip", move |tray| tray.tool_tip = text).await;
    }

    async fn set_menu_tree(&self, items: Vec<RenderableItem>) {
        self.update("menu", move |tray| tray.items = items).await;
    }

    async fn create_window(
        &self,
        key: &WindowKey,
        url: &str,
        geometry: WindowGeometry,
    ) -> Result<WindowHandle> {
        self.browser.launch(key, url, geometry)
    }

    async fn focus_window(&self, handle: &WindowHandle) -> Result<()> {
        let Some(pid) = handle.pid else {
            return Ok(());
        };
        if !browser::is_running(pid) {
            anyhow::bail!("Window process {} has exited", pid);
        }
        let Some(x11) = &self.x11 else {
            return Ok(());
        };
        // The process may not have mapped its window yet
        match x11.find_window_by_pid(pid) {
            Ok(Some(window)) => {
                if let Err(e) = x11.activate_window(window) {
                    warn!(key = %handle.key, error = %e, "Failed to activate window");
                }
            }
            Ok(None) => debug!(key = %handle.key, pid, "No mapped window for process yet"),
            Err(e) => warn!(key = %handle.key, error = %e, "Failed to look up window"),
        }
        Ok(())
    }

    fn screen_size(&self) -> ScreenSize {
        self.x11
            .as_ref()
            .map(X11Session::screen_size)
            .unwrap_or_default()
    }

    fn write_clipboard(&self, text: &str) -> Result<()> {
        let mut slot = self.clipboard.borrow_mut();
        if slot.is_none() {
            *slot = Some(arboard::Clipboard::new().context("Failed to open clipboard")?);
        }
        let Some(clipboard) = slot.as_mut() else {
            return Ok(());
        };
        clipboard
            .set_text(text)
            .context("Failed to write clipboard")
    }

    async fn terminate_process(&self) {
        info!("Shutting down tray service");
        self.handle.shutdown().await;
    }
}

fn tray_icon(icon: &Icon) -> TrayIcon {
    let Icon::File { path, width, height } = icon else {
        return TrayIcon::None;
    };
    let is_png = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if is_png {
        return match load_png_pixmap(path) {
            Ok(pixmap) => TrayIcon::Pixmap(pixmap),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load tray icon");
                TrayIcon::None
            }
        };
    }

    debug!(path = %path.display(), width, height, "Using themed tray icon");
    TrayIcon::Themed {
        name: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        theme_path: path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
    }
}

/// Decode a PNG into the ARGB32 pixmap StatusNotifierItem expects
fn load_png_pixmap(path: &Path) -> Result<ksni::Icon> {
    let bytes = std::fs::read(path).context(format!("Failed to read {}", path.display()))?;
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let (color_type, _) = reader.output_color_type();
    let (width, height) = (reader.info().width, reader.info().height);
    let mut buf = vec![0; width as usize * height as usize * color_type.samples()];
    let info = reader.next_frame(&mut buf)?;
    let pixels = &buf[..info.buffer_size()];

    let argb = match info.color_type {
        png::ColorType::Rgba => {
            rgba_to_argb(pixels.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]]))
        }
        png::ColorType::Rgb => {
            rgba_to_argb(pixels.chunks_exact(3).map(|p| [p[0], p[1], p[2], 0xFF]))
        }
        png::ColorType::GrayscaleAlpha => {
            rgba_to_argb(pixels.chunks_exact(2).map(|p| [p[0], p[0], p[0], p[1]]))
        }
        png::ColorType::Grayscale => rgba_to_argb(pixels.iter().map(|&g| [g, g, g, 0xFF])),
        other => {
            return Err(anyhow!(
                "Unsupported tray icon color type {:?} (expected RGB or RGBA)",
                other
            ));
        }
    };

    Ok(ksni::Icon {
        width: i32::try_from(info.width).context("Icon too wide")?,
        height: i32::try_from(info.height).context("Icon too tall")?,
        data: argb,
    })
}

fn rgba_to_argb(pixels: impl Iterator<Item = [u8; 4]>) -> Vec<u8> {
    pixels.flat_map(|[r, g, b, a]| [a, r, g, b]).collect()
}
