//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Config file location and process settings defaults
pub mod config {
    /// Config file name, resolved under the user's home directory
    pub const FILENAME: &str = "tray-menu.config.json";

    /// Directory name used under the XDG data/cache dirs
    pub const APP_DIR: &str = "tray-menu";

    /// Tray service identifier
    pub const TRAY_ID: &str = "tray-menu";

    /// Default config poll interval
    pub const POLL_INTERVAL_MS: u64 = 100;

    /// Default command timeout (0 disables the timeout)
    pub const COMMAND_TIMEOUT_SECS: u64 = 10;

    /// Default browser program used for browser-window items
    pub const BROWSER: &str = "chromium";
}

/// Placeholder tokens recognized in labels and values
pub mod template {
    /// Replaced by the output of the node's command
    pub const COMMAND_VALUE: &str = "{{CommandValue}}";

    /// Replaced by the command output computed while rendering the label
    pub const COMMAND_VALUE_IN_LABEL: &str = "{{CommandValueInLabel}}";
}

/// Menu tree defaults and limits
pub mod menu {
    /// Default maximum rendered label length (in characters)
    pub const DEFAULT_MAX_LABEL_LENGTH: usize = 50;

    /// Maximum submenu nesting accepted from the config file
    pub const MAX_DEPTH: usize = 32;

    /// Title used when neither icon nor title is configured
    pub const DEFAULT_TITLE: &str = "Untitled";

    /// Title of the fallback config shown after a failed load
    pub const ERROR_TITLE: &str = "Error";

    /// Label given to separators and to nodes that could not be parsed
    pub const SEPARATOR_LABEL: &str = "-";
}

/// Tray icon lookup
pub mod icon {
    /// Icon directory relative to the resources directory
    pub const DIR: &str = "assets/icons";

    /// Extensions tried, in order, for bare icon names
    pub const EXTENSIONS: &[&str] = &["svg", "png"];

    /// Default icon edge length in pixels
    pub const DEFAULT_SIZE: u32 = 16;
}

/// Browser window sizing
pub mod window {
    /// Window width when no size is configured
    pub const DEFAULT_WIDTH: u32 = 1024;

    /// Window height when no size is configured
    pub const DEFAULT_HEIGHT: u32 = 728;

    /// Screen size assumed when the display cannot be queried
    pub const FALLBACK_SCREEN_WIDTH: u32 = 960;
    pub const FALLBACK_SCREEN_HEIGHT: u32 = 540;

    /// Browser profile directories, one per window key, under the cache dir
    pub const PROFILES_DIR: &str = "windows";
}

/// X11 protocol constants
pub mod x11 {
    /// Source indication for _NET_ACTIVE_WINDOW (2 = pager/direct user action)
    pub const ACTIVE_WINDOW_SOURCE_PAGER: u32 = 2;

    /// Upper bound on _NET_CLIENT_LIST entries read in one request
    pub const CLIENT_LIST_MAX_LEN: u32 = 4096;
}
