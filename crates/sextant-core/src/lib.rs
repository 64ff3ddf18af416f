// File: crates/sextant-core/src/lib.rs
// Summary: Core library entry point; exports the series model, panel lifecycle and
// forecast/gauge rendering API.

pub mod types;
pub mod geometry;
pub mod grid;
pub mod scale;
pub mod theme;
pub mod text;
pub mod series;
pub mod raster;
mod draw;
pub mod layout;
pub mod panel;
pub mod overlay;
pub mod deferred;
pub mod session;
pub mod resize;
pub mod forecast;
pub mod gauge;

pub use types::{Insets, Period};
pub use geometry::Size;
pub use scale::TimeWindow;
pub use theme::Theme;
pub use text::TextShaper;
pub use series::{
    definite_runs, to_indicator_series, to_ohlc_series, ConfidenceBandPoint, DefinitePoint, ForecastSeries,
    IndicatorPoint, IndicatorSet, MarketSnapshot, OhlcPoint, OhlcSeries, RawCandle, SeriesError,
};
pub use raster::RenderError;
pub use layout::{ContainerId, LayoutHost, LayoutSnapshot};
pub use panel::{BuildError, BuildOptions, PanelDescriptor, PanelFactory, PanelInstance, PanelKind};
pub use overlay::{apply_overlay, remove_overlay, sync_overlays, OverlayKind};
pub use deferred::Deferred;
pub use session::{ManagerState, Session, SessionId, SessionManager, SessionReport, SessionState};
pub use resize::ResizeCoordinator;
pub use forecast::{ForecastLayout, ForecastRenderer, ForecastStyle};
pub use gauge::{GaugeGeometry, GaugeRenderer};
