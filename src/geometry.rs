//! Window size resolution for browser-window items

use crate::config::{SizeAlias, WindowSize};
use crate::constants::window::{
    DEFAULT_HEIGHT, DEFAULT_WIDTH, FALLBACK_SCREEN_HEIGHT, FALLBACK_SCREEN_WIDTH,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            width: FALLBACK_SCREEN_WIDTH,
            height: FALLBACK_SCREEN_HEIGHT,
        }
    }
}

/// Requested window placement; `None` position lets the window manager decide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl WindowGeometry {
    fn at(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x: Some(x as i32),
            y: Some(y as i32),
            width,
            height,
            fullscreen: false,
        }
    }

    fn centered(screen: ScreenSize, width: u32, height: u32) -> Self {
        Self::at(
            (screen.width - width) / 2,
            (screen.height - height) / 2,
            width,
            height,
        )
    }

    /// Resolve a configured size against the current screen
    pub fn resolve(size: Option<&WindowSize>, screen: ScreenSize) -> Self {
        let (w, h) = (screen.width, screen.height);
        match size {
            None => Self {
                x: None,
                y: None,
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
                fullscreen: false,
            },
            Some(WindowSize::Explicit(explicit)) => Self {
                x: explicit.x,
                y: explicit.y,
                width: explicit.width,
                height: explicit.height,
                fullscreen: explicit.fullscreen,
            },
            Some(WindowSize::Alias(alias)) => match alias {
                SizeAlias::Fullscreen => Self {
                    fullscreen: true,
                    ..Self::at(0, 0, w, h)
                },
                SizeAlias::Maximized => Self {
                    fullscreen: true,
                    ..Self::centered(screen, w / 2, h / 2)
                },
                SizeAlias::Minimized => Self::centered(screen, w / 4, h / 4),
                SizeAlias::Left => Self::at(0, 0, w / 2, h),
                SizeAlias::Right => Self::at(w - w / 2, 0, w / 2, h),
                SizeAlias::Top => Self::at(0, 0, w, h / 2),
                SizeAlias::Bottom => Self::at(0, h - h / 2, w, h / 2),
            },
        }
    }
}
