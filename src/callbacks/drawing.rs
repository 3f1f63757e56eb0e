//! Drawing callbacks for rectangle creation.
//!
//! Handles: pointer_down, pointer_move, pointer_up, cancel_drawing

use slint::ComponentHandle;

use super::{AppContext, show_canvas};
use crate::AppWindow;

/// Sets up all drawing-related callbacks on the UI.
pub fn setup_drawing_callbacks(ui: &AppWindow, ctx: AppContext) {
    setup_pointer_down(ui, ctx.clone());
    setup_pointer_move(ui, ctx.clone());
    setup_pointer_up(ui, ctx.clone());
    setup_cancel_drawing(ui, ctx);
}

fn setup_pointer_down(ui: &AppWindow, ctx: AppContext) {
    let ui_weak = ui.as_weak();
    ui.on_pointer_down(move |x, y| {
        let started = ctx.session.borrow_mut().pointer_down(x as f64, y as f64);
        if let (true, Some(ui)) = (started, ui_weak.upgrade()) {
            show_canvas(&ui, &ctx.session.borrow());
        }
    });
}

fn setup_pointer_move(ui: &AppWindow, ctx: AppContext) {
    let ui_weak = ui.as_weak();
    ui.on_pointer_move(move |x, y| {
        ctx.session.borrow_mut().pointer_move(x as f64, y as f64);
        if let Some(ui) = ui_weak.upgrade() {
            show_canvas(&ui, &ctx.session.borrow());
        }
    });
}

fn setup_pointer_up(ui: &AppWindow, ctx: AppContext) {
    let ui_weak = ui.as_weak();
    ui.on_pointer_up(move || {
        let outcome = ctx.session.borrow_mut().pointer_up();
        let Some(ui) = ui_weak.upgrade() else { return };
        let session = ctx.session.borrow();

        if let Some(outcome) = outcome {
            let status = match outcome.annotation {
                Some(_) => {
                    let list = session.annotations();
                    let label = ad_annotator::surface::annotation_label(
                        list,
                        list.len() - 1,
                        session.catalog(),
                    );
                    format!("Added {label}")
                }
                None => "Region selected. Pick a category to annotate.".to_string(),
            };
            ui.set_status_text(status.into());
        }
        show_canvas(&ui, &session);
    });
}

fn setup_cancel_drawing(ui: &AppWindow, ctx: AppContext) {
    let ui_weak = ui.as_weak();
    ui.on_cancel_drawing(move || {
        let cancelled = ctx.session.borrow_mut().cancel_drag();
        if let (true, Some(ui)) = (cancelled, ui_weak.upgrade()) {
            ui.set_status_text("Drawing cancelled".into());
            show_canvas(&ui, &ctx.session.borrow());
        }
    });
}
