//! Menu configuration: file format, defaults and fail-soft loading
//!
//! - **model**: typed `Config`/`MenuNode` tree and the lenient per-node conversion
//! - **loader**: reading, comment stripping, icon resolution and the `Error` fallback

mod jsonc;
pub mod loader;
pub mod model;

// Re-export commonly used types
pub use loader::{default_config_path, load, try_load};
pub use model::{Action, Config, Icon, ItemType, MenuNode, SizeAlias, WindowSize};
