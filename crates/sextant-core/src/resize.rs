// File: crates/sextant-core/src/resize.rs
// Summary: Propagates container size changes to the panels of one live session.

use tokio::sync::watch;

use crate::geometry::Size;
use crate::layout::{LayoutHost, LayoutSnapshot};
use crate::session::{SessionId, SessionManager};

/// Subscription to the layout bound to a single session. Dropped together with the
/// session; a notification that arrives after disposal reflows nothing.
pub struct ResizeCoordinator {
    rx: watch::Receiver<LayoutSnapshot>,
    session: SessionId,
}

impl ResizeCoordinator {
    /// Subscribe for `session`. The size the panels were just built with counts as seen.
    pub fn subscribe(host: &LayoutHost, session: SessionId) -> Self {
        let mut rx = host.subscribe();
        rx.borrow_and_update();
        Self { rx, session }
    }

    pub fn from_receiver(mut rx: watch::Receiver<LayoutSnapshot>, session: SessionId) -> Self {
        rx.borrow_and_update();
        Self { rx, session }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Next layout change. `None` once the layout host has gone away.
    pub async fn changed(&mut self) -> Option<LayoutSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Apply `layout` to every panel of the bound session. Returns how many panels were
    /// re-sized; zero when the session is no longer live.
    pub fn reflow(&self, manager: &mut SessionManager, layout: &LayoutSnapshot) -> usize {
        let Some(session) = manager.live_session_mut(self.session) else {
            tracing::debug!(session = %self.session, "resize after dispose ignored");
            return 0;
        };
        let mut reflowed = 0;
        for panel in session.panels_mut() {
            let d = *panel.descriptor();
            let Some(region) = layout.size_of(d.container) else { continue };
            if region.width == 0 {
                continue;
            }
            let size = Size::new(region.width, if region.height > 0 { region.height } else { d.height_hint });
            match panel.resize(size) {
                Ok(true) => reflowed += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(container = %d.container, error = %e, "panel resize failed; keeping previous surface"),
            }
        }
        tracing::debug!(session = %self.session, reflowed, "layout applied");
        reflowed
    }
}
