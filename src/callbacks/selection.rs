//! Selection callbacks: active category and annotation deletion.

use slint::ComponentHandle;

use super::{AppContext, show_canvas};
use crate::AppWindow;

/// Sets up all selection-related callbacks on the UI.
pub fn setup_selection_callbacks(ui: &AppWindow, ctx: AppContext) {
    setup_select_category(ui, ctx.clone());
    setup_delete_annotation(ui, ctx);
}

fn setup_select_category(ui: &AppWindow, ctx: AppContext) {
    let ui_weak = ui.as_weak();
    ui.on_select_category(move |id| {
        let Some(ui) = ui_weak.upgrade() else { return };
        let Ok(id) = u32::try_from(id) else { return };
        let result = ctx.session.borrow_mut().select_category(id);
        match result {
            Ok(()) => {
                let name = ctx.session.borrow().catalog().name_of(id);
                ui.set_selected_category(id as i32);
                ui.set_status_text(format!("Category: {name}").into());
            }
            Err(e) => ui.set_status_text(e.to_string().into()),
        }
        show_canvas(&ui, &ctx.session.borrow());
    });
}

fn setup_delete_annotation(ui: &AppWindow, ctx: AppContext) {
    let ui_weak = ui.as_weak();
    ui.on_delete_annotation(move |index| {
        let Some(ui) = ui_weak.upgrade() else { return };
        let Ok(index) = usize::try_from(index) else { return };
        let removed = ctx.session.borrow_mut().delete_annotation(index);
        if removed.is_some() {
            ui.set_status_text("Annotation deleted".into());
        }
        show_canvas(&ui, &ctx.session.borrow());
    });
}
