//! Navigation callbacks: gallery refresh and image selection.
//!
//! Selecting an image starts a dimension fetch tied to a request ticket.
//! When the user picks another image before it returns, the ticket is
//! cancelled and the late result is dropped.

use ad_annotator::error::AnnotatorError;
use ad_annotator::images::ImageId;
use ad_annotator::state::run_tracked;
use ad_annotator::utils::placeholder_image;
use slint::ComponentHandle;

use super::{AppContext, show_canvas, show_gallery};
use crate::AppWindow;

/// Sets up all navigation-related callbacks on the UI.
pub fn setup_navigation_callbacks(ui: &AppWindow, ctx: AppContext) {
    setup_refresh_images(ui, ctx.clone());
    setup_select_image(ui, ctx);
}

fn setup_refresh_images(ui: &AppWindow, ctx: AppContext) {
    let ui_weak = ui.as_weak();
    ui.on_refresh_images(move || {
        if let Some(ui) = ui_weak.upgrade() {
            refresh_images(&ui, &ctx);
        }
    });
}

/// Re-scan the image directory and rebuild the gallery.
pub fn refresh_images(ui: &AppWindow, ctx: &AppContext) {
    ui.set_status_text("Loading images...".into());
    let library = ctx.gateway.library().clone();
    let ui_weak = ui.as_weak();
    let state = ctx.clone();

    ctx.spawn(
        async move {
            tokio::task::spawn_blocking(move || library.list_images())
                .await
                .map_err(|e| AnnotatorError::Task(e.to_string()))
                .and_then(|listed| listed)
        },
        move |joined| {
            let Some(ui) = ui_weak.upgrade() else { return };
            match joined {
                Ok(Ok(records)) => {
                    ui.set_status_text(format!("{} image(s)", records.len()).into());
                    *state.images.borrow_mut() = records;
                    show_gallery(&ui, &state.images.borrow(), &state.session.borrow());
                }
                Ok(Err(e)) => {
                    log::error!("Failed to list images: {e}");
                    ui.set_status_text(format!("Failed to list images: {e}").into());
                }
                Err(e) => log::error!("Image listing task failed: {e}"),
            }
        },
    );
}

fn setup_select_image(ui: &AppWindow, ctx: AppContext) {
    let ui_weak = ui.as_weak();
    ui.on_select_image(move |key| {
        let Some(ui) = ui_weak.upgrade() else { return };
        let id = ImageId::from_raw(key.as_str());
        let record = ctx.images.borrow().iter().find(|r| r.id == id).cloned();
        let Some(record) = record else {
            ui.set_status_text(format!("Unknown image {id}").into());
            return;
        };

        let ticket = ctx.session.borrow_mut().select_image(id);
        ui.set_current_image(placeholder_image());
        ui.set_canvas_width(0.0);
        ui.set_canvas_height(0.0);
        show_gallery(&ui, &ctx.images.borrow(), &ctx.session.borrow());
        show_canvas(&ui, &ctx.session.borrow());
        ui.set_status_text(format!("Loading {}...", record.name).into());

        let library = ctx.gateway.library().clone();
        let name = record.name.clone();
        let timeout = ctx.fetch_timeout;
        let fetch_ticket = ticket.clone();
        let ui_weak = ui.as_weak();
        let state = ctx.clone();

        ctx.spawn(
            async move {
                run_tracked(&fetch_ticket, timeout, async move {
                    tokio::task::spawn_blocking(move || library.dimensions(&name))
                        .await
                        .map_err(|e| AnnotatorError::Task(e.to_string()))
                        .and_then(|read| read)
                })
                .await
            },
            move |joined| {
                let Some(ui) = ui_weak.upgrade() else { return };
                match joined {
                    // Superseded by a newer selection.
                    Ok(None) => {}
                    Ok(Some(Ok(dimensions))) => {
                        if !state.session.borrow_mut().apply_dimensions(&ticket, dimensions) {
                            return;
                        }
                        let image = match slint::Image::load_from_path(&record.path) {
                            Ok(image) => image,
                            Err(_) => {
                                ui.set_status_text(
                                    format!("Image not found: {}", record.path.display()).into(),
                                );
                                return;
                            }
                        };
                        let session = state.session.borrow();
                        let (w, h) = session.display_size().unwrap_or((0, 0));
                        ui.set_current_image(image);
                        ui.set_canvas_width(w as f32);
                        ui.set_canvas_height(h as f32);
                        ui.set_status_text(
                            format!(
                                "{} ({}x{}, shown at {w}x{h})",
                                record.name, dimensions.width, dimensions.height
                            )
                            .into(),
                        );
                        show_canvas(&ui, &session);
                    }
                    Ok(Some(Err(e))) => {
                        if state.session.borrow().is_current(&ticket) {
                            let message = format!("Failed to read {}: {e}", record.name);
                            log::error!("{message}");
                            ui.set_status_text(message.into());
                        }
                    }
                    Err(e) => log::error!("Dimension fetch task failed: {e}"),
                }
            },
        );
    });
}
