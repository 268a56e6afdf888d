//! `map`: run the marker engine against an in-memory map and print what a
//! browser map would show.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;

use choprest_core::sdk::{MarkerView, OverlayView};
use choprest_core::{
    EntityId, Geolocator, GeoPoint, HeadlessSdk, MapConfig, MapSdk, MapSession, MapStatus,
    ModeState, RestaurantCatalog, StaticGeolocator,
};

use crate::cli::{GlobalOpts, MapArgs, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Map snapshot ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MapView {
    status: String,
    #[serde(flatten)]
    mode: ModeState,
    selected: Option<EntityId>,
    center: GeoPoint,
    zoom: u8,
    zoom_history: Vec<u8>,
    location: Option<GeoPoint>,
    results: usize,
    markers: Vec<MarkerView>,
    overlay: Option<String>,
    warnings: Vec<String>,
}

#[derive(Tabled)]
struct MarkerRow {
    #[tabled(rename = "Marker")]
    title: String,
    #[tabled(rename = "Position")]
    position: String,
}

fn status_label(status: &MapStatus) -> String {
    match status {
        MapStatus::Loading => "loading".into(),
        MapStatus::Ready => "ready".into(),
        MapStatus::Error(reason) => format!("error: {reason}"),
    }
}

fn mode_label(mode: ModeState) -> String {
    match mode {
        ModeState::Auto => "auto".into(),
        ModeState::Manual(id) => format!("manual ({id})"),
    }
}

fn detail(view: &MapView, painter: Painter) -> String {
    let mut sections = vec![
        painter.heading("Map"),
        output::detail_block(
            painter,
            &[
                ("Status", Some(view.status.clone())),
                ("Mode", Some(mode_label(view.mode))),
                ("Selected", view.selected.map(|id| id.to_string())),
                ("Center", Some(view.center.to_string())),
                ("Zoom", Some(view.zoom.to_string())),
                ("Location", view.location.map(|p| p.to_string())),
                (
                    "Markers",
                    Some(format!("{} of {} results", view.markers.len(), view.results)),
                ),
            ],
        ),
    ];
    if !view.markers.is_empty() {
        let rows: Vec<MarkerRow> = view
            .markers
            .iter()
            .map(|m| MarkerRow {
                title: m.title.clone(),
                position: m.position.to_string(),
            })
            .collect();
        sections.push(
            tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string(),
        );
    }
    if let Some(overlay) = &view.overlay {
        sections.push(format!("{}\n{overlay}", painter.heading("Overlay")));
    }
    for warning in &view.warnings {
        sections.push(format!("{} {warning}", painter.muted("warning:")));
    }
    sections.join("\n\n")
}

// ── Spinner ─────────────────────────────────────────────────────────

fn spinner(global: &GlobalOpts) -> ProgressBar {
    let interactive = matches!(global.output, OutputFormat::Table)
        && !global.quiet
        && std::io::stderr().is_terminal();
    if !interactive {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    catalog: &RestaurantCatalog,
    config: MapConfig,
    args: MapArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let progress = spinner(global);
    progress.set_message("Fetching restaurants");

    let (results, fallback) = match args.keyword.as_deref() {
        Some(keyword) => (catalog.search(keyword).await?, None),
        None => {
            let all = catalog.all().await?;
            (all.clone(), Some(all))
        }
    };

    let geolocator: Option<Arc<dyn Geolocator>> = match args.here {
        Some(here) => Some(Arc::new(StaticGeolocator::at(util::parse_point(
            here.lat, here.lng,
        )?))),
        None => None,
    };

    let sdk = Arc::new(HeadlessSdk::preloaded());
    let session = MapSession::new(config, Arc::clone(&sdk) as Arc<dyn MapSdk>, geolocator);
    session.publish_results(results);
    session.store().set_filter(util::build_filter(&args.filter));
    if let Some(all) = fallback {
        session.set_fallback(all);
    }

    progress.set_message("Loading map");
    let outcome = drive(&session, &args).await;
    progress.finish_and_clear();

    let view = snapshot(&session, &sdk).await;
    session.shutdown().await;
    outcome?;

    let painter = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| detail(v, painter),
        |v| {
            v.markers
                .iter()
                .map(|m| m.title.clone())
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Start the session and apply the requested interactions in the order a
/// user would: locate, narrow to nearby, then pin.
async fn drive(session: &MapSession, args: &MapArgs) -> Result<(), CliError> {
    session.start().await?;

    if args.here.is_some() {
        // A failed fix is kept as a warning; the map stays usable.
        let _ = session.locate_me().await;
    }
    if args.nearby {
        let hits = session.find_nearby(args.radius).await?;
        tracing::info!(hits, "nearby filter applied");
    }
    if let Some(id) = args.select {
        session.select(id).await?;
    }
    session.flush().await?;
    Ok(())
}

async fn snapshot(session: &MapSession, sdk: &HeadlessSdk) -> MapView {
    let status = status_label(&session.status().borrow());
    let (center, zoom, zoom_history) = match session.surface() {
        Some(surface) => (
            surface.center(),
            surface.zoom(),
            sdk.zoom_history(surface.map_id()),
        ),
        None => (
            session.config().default_center,
            session.config().default_zoom,
            Vec::new(),
        ),
    };
    let selected = *session.selected().borrow();

    MapView {
        status,
        mode: session.mode(),
        selected,
        center,
        zoom,
        zoom_history,
        location: session.current_location(),
        results: session.store().filtered_snapshot().len(),
        markers: sdk.markers(),
        overlay: sdk
            .open_overlays()
            .into_iter()
            .next()
            .map(|o: OverlayView| o.content),
        warnings: session.take_warnings().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(status_label(&MapStatus::Error("boom".into())), "error: boom");
        assert_eq!(mode_label(ModeState::Manual(EntityId::new(4))), "manual (4)");
        assert_eq!(mode_label(ModeState::Auto), "auto");
    }
}
