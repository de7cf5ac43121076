use anyhow::{Context, Result};
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::constants::x11;
use crate::geometry::ScreenSize;

/// EWMH atoms looked up once per session
pub struct CachedAtoms {
    pub net_client_list: Atom,
    pub net_wm_pid: Atom,
    pub net_active_window: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .context(format!("Failed to intern {name}"))?
        .reply()
        .context(format!("No reply interning {name}"))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            net_client_list: intern(conn, "_NET_CLIENT_LIST")?,
            net_wm_pid: intern(conn, "_NET_WM_PID")?,
            net_active_window: intern(conn, "_NET_ACTIVE_WINDOW")?,
        })
    }
}

/// Connection to the X server used for window focus and screen queries
pub struct X11Session {
    conn: RustConnection,
    root: Window,
    screen_size: ScreenSize,
    atoms: CachedAtoms,
}

impl X11Session {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .context(format!("X screen {} not found", screen_num))?;
        let root = screen.root;
        let screen_size = ScreenSize {
            width: u32::from(screen.width_in_pixels),
            height: u32::from(screen.height_in_pixels),
        };
        let atoms = CachedAtoms::new(&conn)?;
        debug!(width = screen_size.width, height = screen_size.height, "Connected to X server");
        Ok(Self {
            conn,
            root,
            screen_size,
            atoms,
        })
    }

    pub fn screen_size(&self) -> ScreenSize {
        self.screen_size
    }

    /// Find the managed top-level window owned by `pid`
    pub fn find_window_by_pid(&self, pid: u32) -> Result<Option<Window>> {
        let clients = self
            .conn
            .get_property(
                false,
                self.root,
                self.atoms.net_client_list,
                AtomEnum::WINDOW,
                0,
                x11::CLIENT_LIST_MAX_LEN,
            )
            .context("Failed to query _NET_CLIENT_LIST property")?
            .reply()
            .context("Failed to get reply for _NET_CLIENT_LIST query")?;
        let Some(windows) = clients.value32() else {
            return Ok(None);
        };

        for window in windows {
            let prop = self
                .conn
                .get_property(false, window, self.atoms.net_wm_pid, AtomEnum::CARDINAL, 0, 1)
                .context(format!("Failed to query _NET_WM_PID property for window {}", window))?
                .reply()
                .context(format!("Failed to get _NET_WM_PID reply for window {}", window))?;
            if prop.value32().and_then(|mut v| v.next()) == Some(pid) {
                return Ok(Some(window));
            }
        }
        Ok(None)
    }

    /// Raise `window` and ask the window manager to focus it
    pub fn activate_window(&self, window: Window) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
            .context(format!("Failed to raise window {window}"))?;

        // data: source indication, timestamp, requestor's active window
        let request = ClientMessageEvent::new(
            32,
            window,
            self.atoms.net_active_window,
            [x11::ACTIVE_WINDOW_SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
        );
        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                request,
            )
            .context(format!("Failed to request focus for window {window}"))?;
        self.conn.flush().context("Failed to flush X11 connection")?;
        debug!(window, "Requested window activation");
        Ok(())
    }
}
