// File: crates/sextant-core/tests/resize.rs
// Purpose: Resize propagation to live panels and safe no-ops after disposal.

mod common;

use std::collections::BTreeSet;

use sextant_core::{ContainerId, LayoutHost, PanelKind, ResizeCoordinator, Size};

#[tokio::test]
async fn layout_changes_reflow_live_panels() {
    let host = LayoutHost::new(common::layout(400));
    let mut m = common::manager();
    let id = m.begin(common::snapshot("AAPL", 40), BTreeSet::new());
    m.build(&host.snapshot()).unwrap();
    let mut resize = ResizeCoordinator::subscribe(&host, id);

    host.resize(ContainerId(1), Size::new(520, 260));
    host.resize(ContainerId(4), Size::new(520, 90));
    let layout = resize.changed().await.expect("host alive");
    assert_eq!(resize.reflow(&mut m, &layout), 2);

    let session = m.session().unwrap();
    assert_eq!(session.panel(PanelKind::Price).unwrap().size(), Size::new(520, 260));
    assert_eq!(session.panel(PanelKind::Volume).unwrap().size(), Size::new(520, 90));
    assert_eq!(session.panel(PanelKind::OscillatorRsi).unwrap().size(), Size::new(400, 100));

    // same layout again reflows nothing
    assert_eq!(resize.reflow(&mut m, &layout), 0);
}

#[test]
fn resize_after_dispose_is_a_no_op_and_does_not_resurrect() {
    let host = LayoutHost::new(common::layout(400));
    let mut m = common::manager();
    let id = m.begin(common::snapshot("AAPL", 40), BTreeSet::new());
    m.build(&host.snapshot()).unwrap();
    let resize = ResizeCoordinator::subscribe(&host, id);

    m.dispose();
    host.resize(ContainerId(1), Size::new(640, 300));
    assert_eq!(resize.reflow(&mut m, &host.snapshot()), 0);
    assert_eq!(m.live_panel_count(), 0);
    assert!(m.session().is_none());
}

#[test]
fn stale_subscription_never_touches_a_newer_session() {
    let host = LayoutHost::new(common::layout(400));
    let mut m = common::manager();
    let old = m.begin(common::snapshot("AAPL", 40), BTreeSet::new());
    m.build(&host.snapshot()).unwrap();
    let stale = ResizeCoordinator::subscribe(&host, old);

    let new = m.begin(common::snapshot("MSFT", 40), BTreeSet::new());
    m.build(&host.snapshot()).unwrap();
    host.resize(ContainerId(2), Size::new(400, 150));

    assert_eq!(stale.reflow(&mut m, &host.snapshot()), 0);
    let fresh = ResizeCoordinator::subscribe(&host, new);
    assert_eq!(fresh.reflow(&mut m, &host.snapshot()), 1);
}

#[tokio::test]
async fn changed_ends_when_the_host_goes_away() {
    let host = LayoutHost::new(common::layout(300));
    let mut m = common::manager();
    let id = m.begin(common::snapshot("AAPL", 20), BTreeSet::new());
    m.build(&host.snapshot()).unwrap();
    let mut resize = ResizeCoordinator::subscribe(&host, id);
    drop(host);
    assert!(resize.changed().await.is_none());
}
