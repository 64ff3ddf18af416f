// File: crates/sextant-core/src/layout.rs
// Summary: Drawing-region handles and the size-change notification source.

use std::collections::BTreeMap;

use tokio::sync::watch;

use crate::geometry::Size;

/// Opaque handle to a drawing region owned by the host UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u32);

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// Current laid-out size of every known container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutSnapshot {
    sizes: BTreeMap<ContainerId, Size>,
}

impl LayoutSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: ContainerId, size: Size) -> Self {
        self.sizes.insert(id, size);
        self
    }

    pub fn set(&mut self, id: ContainerId, size: Size) {
        self.sizes.insert(id, size);
    }

    pub fn size_of(&self, id: ContainerId) -> Option<Size> {
        self.sizes.get(&id).copied()
    }
}

/// Host side of the layout: publishes container size changes to subscribers.
pub struct LayoutHost {
    tx: watch::Sender<LayoutSnapshot>,
}

impl LayoutHost {
    pub fn new(initial: LayoutSnapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Record a new size for `id`; subscribers are notified only when it changed.
    pub fn resize(&self, id: ContainerId, size: Size) {
        self.tx.send_if_modified(|layout| {
            if layout.size_of(id) == Some(size) {
                return false;
            }
            layout.set(id, size);
            true
        });
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LayoutSnapshot> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_only_notifies_on_change() {
        let host = LayoutHost::new(LayoutSnapshot::new().with(ContainerId(1), Size::new(100, 50)));
        let mut rx = host.subscribe();
        host.resize(ContainerId(1), Size::new(100, 50));
        assert!(!rx.has_changed().unwrap());
        host.resize(ContainerId(1), Size::new(120, 50));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().size_of(ContainerId(1)), Some(Size::new(120, 50)));
    }
}
