//! File operation callbacks.
//!
//! Handles: save and reload of the annotation document

use slint::ComponentHandle;

use super::{AppContext, show_canvas};
use crate::AppWindow;

/// Sets up all file operation callbacks on the UI.
pub fn setup_file_callbacks(ui: &AppWindow, ctx: AppContext) {
    setup_save_annotations(ui, ctx.clone());
    setup_load_annotations(ui, ctx);
}

fn setup_save_annotations(ui: &AppWindow, ctx: AppContext) {
    let ui_weak = ui.as_weak();
    ui.on_save_annotations(move || {
        let Some(ui) = ui_weak.upgrade() else { return };
        let map = ctx.session.borrow().store().map().clone();
        let gateway = ctx.gateway.clone();
        let ui_weak = ui.as_weak();

        ui.set_busy(true);
        ui.set_status_text("Saving...".into());
        ctx.spawn(async move { gateway.save(&map).await }, move |joined| {
            let Some(ui) = ui_weak.upgrade() else { return };
            ui.set_busy(false);
            let status = match joined {
                Ok(Ok(outcome)) => format!("{} ({})", outcome.message, outcome.file_path),
                Ok(Err(e)) if e.is_user_error() => e.to_string(),
                Ok(Err(e)) => format!("Save failed: {e}"),
                Err(e) => format!("Save failed: {e}"),
            };
            ui.set_status_text(status.into());
        });
    });
}

fn setup_load_annotations(ui: &AppWindow, ctx: AppContext) {
    let ui_weak = ui.as_weak();
    ui.on_load_annotations(move || {
        if let Some(ui) = ui_weak.upgrade() {
            load_annotations(&ui, &ctx);
        }
    });
}

/// Merge the stored annotations into the session. Images edited since start keep their boxes.
pub fn load_annotations(ui: &AppWindow, ctx: &AppContext) {
    let gateway = ctx.gateway.clone();
    let ui_weak = ui.as_weak();
    let state = ctx.clone();

    ui.set_busy(true);
    ctx.spawn(async move { gateway.load().await }, move |joined| {
        let Some(ui) = ui_weak.upgrade() else { return };
        ui.set_busy(false);
        match joined {
            Ok(map) => {
                let count = map.len();
                let kept = state.session.borrow_mut().merge_loaded(map);
                show_canvas(&ui, &state.session.borrow());
                let status = if kept > 0 {
                    format!("Loaded {count} image(s); kept unsaved edits on {kept}")
                } else {
                    format!("Loaded annotations for {count} image(s)")
                };
                ui.set_status_text(status.into());
            }
            Err(e) => {
                log::error!("Annotation load task failed: {e}");
                ui.set_status_text(format!("Load failed: {e}").into());
            }
        }
    });
}
