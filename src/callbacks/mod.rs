//! Callback handlers for the annotator window.
//!
//! This module contains all UI callback implementations organized by functionality:
//! - `navigation` - Gallery refresh and image selection with stale-fetch discard
//! - `selection` - Category choice and annotation deletion
//! - `drawing` - Pointer events on the canvas and Escape cancel
//! - `file_ops` - Save and reload through the persistence gateway

pub mod drawing;
pub mod file_ops;
pub mod navigation;
pub mod selection;

use ad_annotator::images::ImageRecord;
use ad_annotator::persistence::AnnotationGateway;
use ad_annotator::state::Session;
use ad_annotator::surface::annotation_label;
use ad_annotator::utils::parse_color;
use slint::{Color, ModelRc, VecModel};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::{AnnotationRow, AppWindow, CategoryItem, ImageItem, OverlayItem};

/// State shared by every callback. Lives on the UI thread.
#[derive(Clone)]
pub struct AppContext {
    pub session: Rc<RefCell<Session>>,
    pub gateway: Arc<AnnotationGateway>,
    pub images: Rc<RefCell<Vec<ImageRecord>>>,
    pub runtime: tokio::runtime::Handle,
    pub fetch_timeout: Duration,
}

impl AppContext {
    /// Run `fut` on the tokio runtime and hand its output to `then` on the UI thread.
    pub fn spawn<T, F, C>(&self, fut: F, then: C)
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
        C: FnOnce(Result<T, tokio::task::JoinError>) + 'static,
    {
        let handle = self.runtime.spawn(fut);
        if let Err(e) = slint::spawn_local(async move { then(handle.await) }) {
            log::error!("Failed to schedule UI continuation: {e}");
        }
    }
}

/// Sets up all callbacks on the UI.
pub fn setup_callbacks(ui: &AppWindow, ctx: &AppContext) {
    navigation::setup_navigation_callbacks(ui, ctx.clone());
    selection::setup_selection_callbacks(ui, ctx.clone());
    drawing::setup_drawing_callbacks(ui, ctx.clone());
    file_ops::setup_file_callbacks(ui, ctx.clone());
}

fn color_of(value: &str) -> Color {
    parse_color(value).unwrap_or_else(|| Color::from_argb_u8(178, 128, 128, 128))
}

/// Push the category buttons.
pub fn show_categories(ui: &AppWindow, session: &Session) {
    let items: Vec<CategoryItem> = session
        .catalog()
        .categories()
        .iter()
        .map(|c| CategoryItem {
            id: c.id as i32,
            name: c.name.clone().into(),
            color: color_of(&c.border_color),
        })
        .collect();
    ui.set_categories(ModelRc::new(VecModel::from(items)));
    ui.set_selected_category(session.selected_category().map(|id| id as i32).unwrap_or(0));
}

/// Rebuild the gallery, marking the selected image.
pub fn show_gallery(ui: &AppWindow, records: &[ImageRecord], session: &Session) {
    let selected = session.selected_image();
    let items: Vec<ImageItem> = records
        .iter()
        .map(|r| ImageItem {
            key: r.id.as_str().into(),
            name: r.name.clone().into(),
            selected: selected == Some(&r.id),
        })
        .collect();
    ui.set_images(ModelRc::new(VecModel::from(items)));
}

/// Rebuild overlays, the annotation list and the region line.
pub fn show_canvas(ui: &AppWindow, session: &Session) {
    let overlays: Vec<OverlayItem> = session
        .overlays()
        .into_iter()
        .map(|o| OverlayItem {
            x: o.rect.x as f32,
            y: o.rect.y as f32,
            width: o.rect.width as f32,
            height: o.rect.height as f32,
            fill: color_of(&o.fill),
            border: color_of(&o.border),
            label: o.label.unwrap_or_default().into(),
            dashed: o.dashed,
        })
        .collect();
    ui.set_overlays(ModelRc::new(VecModel::from(overlays)));

    let annotations = session.annotations();
    let rows: Vec<AnnotationRow> = annotations
        .iter()
        .enumerate()
        .map(|(idx, a)| AnnotationRow {
            label: annotation_label(annotations, idx, session.catalog()).into(),
            bbox: format!(
                "x {:.0}, y {:.0}, {:.0} x {:.0}",
                a.bbox[0], a.bbox[1], a.bbox[2], a.bbox[3]
            )
            .into(),
            color: color_of(session.catalog().border_color_of(a.category_id)),
        })
        .collect();
    ui.set_annotation_rows(ModelRc::new(VecModel::from(rows)));

    let region = session
        .selected_region()
        .map(|r| {
            format!(
                "Selected region: x {:.0}, y {:.0}, {:.0} x {:.0} (area {:.0})",
                r.x, r.y, r.width, r.height, r.area
            )
        })
        .unwrap_or_default();
    ui.set_region_text(region.into());
}
