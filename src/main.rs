slint::include_modules!();

mod callbacks;

use ad_annotator::classes::LabelCatalog;
use ad_annotator::state::Session;
use ad_annotator::utils::{init_logging, placeholder_image};
use ad_annotator::{AnnotationGateway, config};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use callbacks::AppContext;

fn main() -> anyhow::Result<()> {
    let mut config = config::load_config();
    if let Some(data_dir) = std::env::args().nth(1) {
        config.storage.data_dir = data_dir;
    }
    init_logging(&config.logging.level);
    log::info!(
        "Image directory {}, annotations at {}",
        config.storage.image_root().display(),
        config.storage.annotation_path().display()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let catalog = Arc::new(LabelCatalog::default());
    let gateway = Arc::new(AnnotationGateway::from_config(&config, catalog.clone()));
    let session = Rc::new(RefCell::new(Session::new(catalog, config.display.clone())));

    let ui = AppWindow::new()?;
    ui.set_current_image(placeholder_image());

    let ctx = AppContext {
        session,
        gateway,
        images: Rc::new(RefCell::new(Vec::new())),
        runtime: runtime.handle().clone(),
        fetch_timeout: Duration::from_secs(config.network.fetch_timeout_secs),
    };

    callbacks::setup_callbacks(&ui, &ctx);
    callbacks::show_categories(&ui, &ctx.session.borrow());
    callbacks::navigation::refresh_images(&ui, &ctx);
    callbacks::file_ops::load_annotations(&ui, &ctx);

    ui.run()?;
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}
