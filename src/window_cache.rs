//! Per-key window reuse for browser-window items

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::geometry::WindowGeometry;
use crate::menu::WindowKey;
use crate::presenter::{Presenter, WindowHandle};

/// Outcome of [`WindowCache::open_or_focus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOpen {
    Created,
    Focused,
}

/// Live windows keyed by [`WindowKey`].
///
/// Each slot is a `OnceCell`, so overlapping opens for the same key wait on the one
/// in-flight creation instead of spawning a second window.
#[derive(Default)]
pub struct WindowCache {
    slots: RefCell<HashMap<WindowKey, Rc<OnceCell<WindowHandle>>>>,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &WindowKey) -> Rc<OnceCell<WindowHandle>> {
        Rc::clone(
            self.slots
                .borrow_mut()
                .entry(key.clone())
                .or_insert_with(|| Rc::new(OnceCell::new())),
        )
    }

    pub async fn open_or_focus<P: Presenter>(
        &self,
        presenter: &P,
        key: &WindowKey,
        url: &str,
        geometry: WindowGeometry,
    ) -> anyhow::Result<WindowOpen> {
        let slot = self.slot(key);
        let created = Cell::new(false);
        let handle = slot
            .get_or_try_init(|| {
                created.set(true);
                presenter.create_window(key, url, geometry)
            })
            .await?;

        if created.get() {
            info!(key = %key, pid = ?handle.pid, "Opened window");
            return Ok(WindowOpen::Created);
        }

        match presenter.focus_window(handle).await {
            Ok(()) => {
                debug!(key = %key, "Focused existing window");
                Ok(WindowOpen::Focused)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cached window is gone, opening a new one");
                self.remove(key);
                Box::pin(self.open_or_focus(presenter, key, url, geometry)).await
            }
        }
    }

    fn remove(&self, key: &WindowKey) {
        if self.slots.borrow_mut().remove(key).is_some() {
            debug!(key = %key, "Forgot window");
        }
    }

    /// Drop the entry for a closed window so the next open creates a fresh one.
    ///
    /// Only the cached instance is dropped. A close reported for an older window
    /// under the same key, or while a replacement is still being created, is ignored.
    pub fn forget(&self, closed: &WindowHandle) {
        let current = self
            .slots
            .borrow()
            .get(&closed.key)
            .and_then(|slot| slot.get().cloned());
        if current.as_ref() == Some(closed) {
            self.remove(&closed.key);
        } else {
            debug!(key = %closed.key, pid = ?closed.pid, "Ignoring close of a replaced window");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Icon;
    use crate::geometry::ScreenSize;
    use crate::menu::RenderableItem;

    #[derive(Default)]
    struct FakeWindows {
        created: Cell<u32>,
        focused: Cell<u32>,
        fail_create: Cell<bool>,
        fail_focus: Cell<bool>,
    }

    impl Presenter for FakeWindows {
        async fn set_icon(&self, _icon: &Icon) {}
        async fn set_title(&self, _title: &str) {}
        async fn set_tool_tip(&self, _text: &str) {}
        async fn set_menu_tree(&self, _items: Vec<RenderableItem>) {}

        async fn create_window(
            &self,
            key: &WindowKey,
            _url: &str,
            _geometry: WindowGeometry,
        ) -> anyhow::Result<WindowHandle> {
            tokio::task::yield_now().await;
            if self.fail_create.get() {
                anyhow::bail!("no browser");
            }
            self.created.set(self.created.get() + 1);
            Ok(WindowHandle {
                key: key.clone(),
                pid: Some(self.created.get()),
            })
        }

        async fn focus_window(&self, _handle: &WindowHandle) -> anyhow::Result<()> {
            if self.fail_focus.get() {
                anyhow::bail!("window closed");
            }
            self.focused.set(self.focused.get() + 1);
            Ok(())
        }

        fn screen_size(&self) -> ScreenSize {
            ScreenSize::default()
        }

        fn write_clipboard(&self, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn terminate_process(&self) {}
    }

    fn geometry() -> WindowGeometry {
        WindowGeometry::resolve(None, ScreenSize::default())
    }

    #[tokio::test]
    async fn test_concurrent_opens_create_once() {
        let cache = WindowCache::new();
        let presenter = FakeWindows::default();
        let key = WindowKey::new("docs");

        let (first, second) = tokio::join!(
            cache.open_or_focus(&presenter, &key, "https://example.com", geometry()),
            cache.open_or_focus(&presenter, &key, "https://example.com", geometry()),
        );

        assert_eq!(presenter.created.get(), 1);
        let mut outcomes = vec![first.unwrap(), second.unwrap()];
        outcomes.sort_by_key(|o| *o == WindowOpen::Focused);
        assert_eq!(outcomes, vec![WindowOpen::Created, WindowOpen::Focused]);
    }

    #[tokio::test]
    async fn test_sequential_open_focuses_existing() {
        let cache = WindowCache::new();
        let presenter = FakeWindows::default();
        let key = WindowKey::new("0.1");

        let url = "https://example.com";
        assert_eq!(
            cache.open_or_focus(&presenter, &key, url, geometry()).await.unwrap(),
            WindowOpen::Created
        );
        assert_eq!(
            cache.open_or_focus(&presenter, &key, url, geometry()).await.unwrap(),
            WindowOpen::Focused
        );
        assert_eq!(presenter.created.get(), 1);
        assert_eq!(presenter.focused.get(), 1);
    }

    #[tokio::test]
    async fn test_forget_allows_fresh_window() {
        let cache = WindowCache::new();
        let presenter = FakeWindows::default();
        let key = WindowKey::new("docs");

        cache.open_or_focus(&presenter, &key, "u", geometry()).await.unwrap();
        cache.forget(&WindowHandle {
            key: key.clone(),
            pid: Some(1),
        });

        let outcome = cache.open_or_focus(&presenter, &key, "u", geometry()).await.unwrap();
        assert_eq!(outcome, WindowOpen::Created);
        assert_eq!(presenter.created.get(), 2);
    }

    #[tokio::test]
    async fn test_failed_creation_is_retried() {
        let cache = WindowCache::new();
        let presenter = FakeWindows::default();
        let key = WindowKey::new("docs");

        presenter.fail_create.set(true);
        assert!(cache.open_or_focus(&presenter, &key, "u", geometry()).await.is_err());
        assert_eq!(presenter.created.get(), 0);

        presenter.fail_create.set(false);
        let outcome = cache.open_or_focus(&presenter, &key, "u", geometry()).await.unwrap();
        assert_eq!(outcome, WindowOpen::Created);
    }

    #[tokio::test]
    async fn test_dead_window_is_replaced() {
        let cache = WindowCache::new();
        let presenter = FakeWindows::default();
        let key = WindowKey::new("docs");

        cache.open_or_focus(&presenter, &key, "u", geometry()).await.unwrap();
        presenter.fail_focus.set(true);
        let outcome = cache.open_or_focus(&presenter, &key, "u", geometry()).await.unwrap();
        assert_eq!(outcome, WindowOpen::Created);
        assert_eq!(presenter.created.get(), 2);
    }

    #[tokio::test]
    async fn test_close_of_replaced_window_keeps_new_one() {
        let cache = WindowCache::new();
        let presenter = FakeWindows::default();
        let key = WindowKey::new("docs");

        cache.open_or_focus(&presenter, &key, "u", geometry()).await.unwrap();
        presenter.fail_focus.set(true);
        cache.open_or_focus(&presenter, &key, "u", geometry()).await.unwrap();
        presenter.fail_focus.set(false);

        // First window's exit arrives after its replacement opened
        cache.forget(&WindowHandle {
            key: key.clone(),
            pid: Some(1),
        });
        let outcome = cache.open_or_focus(&presenter, &key, "u", geometry()).await.unwrap();
        assert_eq!(outcome, WindowOpen::Focused);
        assert_eq!(presenter.created.get(), 2);

        cache.forget(&WindowHandle {
            key: key.clone(),
            pid: Some(2),
        });
        let outcome = cache.open_or_focus(&presenter, &key, "u", geometry()).await.unwrap();
        assert_eq!(outcome, WindowOpen::Created);
    }
}
