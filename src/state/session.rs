//! Editing session: selection, drawing and in-flight request tracking.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::classes::LabelCatalog;
use crate::config::DisplayConfig;
use crate::error::{AnnotatorError, Result};
use crate::images::{ImageDimensions, ImageId};
use crate::state::store::AnnotationStore;
use crate::state::types::{Annotation, AnnotationMap, SelectedRegion};
use crate::surface::{DrawOutcome, DrawingSurface, Overlay};

/// Handle for one fetch started on behalf of a selected image.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub image_id: ImageId,
    pub generation: u64,
    token: CancellationToken,
}

impl RequestTicket {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Hands out tickets and cancels the previous one whenever a new request starts.
#[derive(Debug, Default)]
pub struct RequestTracker {
    generation: u64,
    current: Option<CancellationToken>,
}

impl RequestTracker {
    pub fn begin(&mut self, image_id: &ImageId) -> RequestTicket {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        self.generation += 1;
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        RequestTicket {
            image_id: image_id.clone(),
            generation: self.generation,
            token,
        }
    }

    /// True when `ticket` belongs to the latest request and was not cancelled.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        ticket.generation == self.generation && !ticket.is_cancelled()
    }
}

/// Await `fut` for `ticket` with a timeout.
///
/// Returns `None` when the ticket is cancelled first (a newer selection won).
pub async fn run_tracked<T, F>(
    ticket: &RequestTicket,
    timeout: Duration,
    fut: F,
) -> Option<Result<T>>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = ticket.token.cancelled() => {
            log::debug!(
                "Discarding stale response for {} (generation {})",
                ticket.image_id,
                ticket.generation
            );
            None
        }
        res = tokio::time::timeout(timeout, fut) => {
            Some(res.unwrap_or_else(|_| Err(AnnotatorError::Timeout(timeout))))
        }
    }
}

/// Everything the editor holds for one user session.
#[derive(Debug)]
pub struct Session {
    catalog: Arc<LabelCatalog>,
    display: DisplayConfig,
    store: AnnotationStore,
    selected_image: Option<ImageId>,
    selected_category: Option<u32>,
    selected_region: Option<SelectedRegion>,
    display_size: Option<(u32, u32)>,
    surface: DrawingSurface,
    requests: RequestTracker,
}

impl Session {
    pub fn new(catalog: Arc<LabelCatalog>, display: DisplayConfig) -> Self {
        let surface = DrawingSurface::new(0.0, 0.0, display.min_selection);
        Self {
            catalog,
            display,
            store: AnnotationStore::new(),
            selected_image: None,
            selected_category: None,
            selected_region: None,
            display_size: None,
            surface,
            requests: RequestTracker::default(),
        }
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn selected_image(&self) -> Option<&ImageId> {
        self.selected_image.as_ref()
    }

    pub fn selected_category(&self) -> Option<u32> {
        self.selected_category
    }

    pub fn selected_region(&self) -> Option<SelectedRegion> {
        self.selected_region
    }

    pub fn display_size(&self) -> Option<(u32, u32)> {
        self.display_size
    }

    /// Switch images. Clears the drag and region and supersedes pending fetches.
    pub fn select_image(&mut self, image_id: ImageId) -> RequestTicket {
        self.selected_region = None;
        self.display_size = None;
        self.surface.reset(0.0, 0.0);
        let ticket = self.requests.begin(&image_id);
        self.selected_image = Some(image_id);
        ticket
    }

    /// Apply fetched dimensions if the ticket still matches the selection.
    pub fn apply_dimensions(
        &mut self,
        ticket: &RequestTicket,
        dimensions: ImageDimensions,
    ) -> bool {
        let selected = self.selected_image.as_ref() == Some(&ticket.image_id);
        if !self.requests.is_current(ticket) || !selected {
            log::debug!("Ignoring dimensions for {} after selection changed", ticket.image_id);
            return false;
        }
        let (w, h) = self.display.display_size(dimensions.width, dimensions.height);
        self.display_size = Some((w, h));
        self.surface.reset(w as f64, h as f64);
        true
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.requests.is_current(ticket)
    }

    pub fn select_category(&mut self, category_id: u32) -> Result<()> {
        if !self.catalog.contains(category_id) {
            return Err(AnnotatorError::validation(format!("unknown category {category_id}")));
        }
        self.selected_category = Some(category_id);
        Ok(())
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        if self.selected_image.is_none() {
            return false;
        }
        self.surface.pointer_down(x, y)
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.surface.pointer_move(x, y);
    }

    /// Finish a drag; a new annotation goes to the selected image and clears the region.
    pub fn pointer_up(&mut self) -> Option<DrawOutcome> {
        let image_id = self.selected_image.clone()?;
        let outcome = self
            .surface
            .pointer_up(self.store.get(&image_id), self.selected_category)?;

        self.selected_region = Some(outcome.region);
        if let Some(annotation) = &outcome.annotation {
            self.store.add(&image_id, annotation.clone());
            self.selected_region = None;
        }
        Some(outcome)
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.surface.cancel()
    }

    pub fn delete_annotation(&mut self, index: usize) -> Option<Annotation> {
        let image_id = self.selected_image.clone()?;
        self.store.remove(&image_id, index)
    }

    /// Annotations of the selected image.
    pub fn annotations(&self) -> &[Annotation] {
        match &self.selected_image {
            Some(id) => self.store.get(id),
            None => &[],
        }
    }

    pub fn overlays(&self) -> Vec<Overlay> {
        self.surface
            .overlays(self.annotations(), &self.catalog, self.selected_category)
    }

    /// Fold in annotations read from disk without touching images edited in this session.
    pub fn merge_loaded(&mut self, map: AnnotationMap) -> usize {
        self.store.merge_loaded(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Arc::new(LabelCatalog::default()), DisplayConfig::default())
    }

    fn ready(session: &mut Session, name: &str) -> ImageId {
        let id = ImageId::from_file_name(name);
        let ticket = session.select_image(id.clone());
        assert!(session.apply_dimensions(&ticket, ImageDimensions { width: 1600, height: 200 }));
        id
    }

    #[test]
    fn test_drag_adds_annotation_to_selected_image() {
        let mut s = session();
        let id = ready(&mut s, "a.png");
        assert_eq!(s.display_size(), Some((800, 100)));
        s.select_category(3).unwrap();

        assert!(s.pointer_down(10.0, 10.0));
        s.pointer_move(60.0, 90.0);
        let outcome = s.pointer_up().unwrap();
        assert_eq!(outcome.annotation.unwrap().ordinal, Some(1));
        assert_eq!(s.store().get(&id).len(), 1);
        assert!(s.selected_region().is_none());
    }

    #[test]
    fn test_region_kept_without_category() {
        let mut s = session();
        let id = ready(&mut s, "a.png");
        s.pointer_down(10.0, 10.0);
        s.pointer_move(60.0, 60.0);
        s.pointer_up().unwrap();
        assert!(s.store().get(&id).is_empty());
        assert_eq!(s.selected_region().unwrap().area, 2500.0);
    }

    #[test]
    fn test_no_image_selected_is_noop() {
        let mut s = session();
        s.select_category(1).unwrap();
        assert!(!s.pointer_down(1.0, 1.0));
        assert!(s.pointer_up().is_none());
        assert!(s.store().is_empty());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut s = session();
        assert!(s.select_category(6).unwrap_err().is_user_error());
        assert_eq!(s.selected_category(), None);
    }

    #[test]
    fn test_switching_image_resets_drag_and_region() {
        let mut s = session();
        ready(&mut s, "a.png");
        s.pointer_down(10.0, 10.0);
        s.pointer_move(60.0, 60.0);
        s.pointer_up();
        s.pointer_down(5.0, 5.0);
        s.pointer_move(50.0, 50.0);

        ready(&mut s, "b.png");
        assert!(s.selected_region().is_none());
        assert!(s.pointer_up().is_none());
    }

    #[test]
    fn test_stale_dimensions_are_ignored() {
        let mut s = session();
        let first = s.select_image(ImageId::from_file_name("a.png"));
        let second = s.select_image(ImageId::from_file_name("b.png"));
        assert!(first.is_cancelled());

        assert!(!s.apply_dimensions(&first, ImageDimensions { width: 100, height: 800 }));
        assert_eq!(s.display_size(), None);
        assert!(s.apply_dimensions(&second, ImageDimensions { width: 100, height: 800 }));
        assert_eq!(s.display_size(), Some((50, 400)));
    }

    #[test]
    fn test_delete_keeps_ordinals() {
        let mut s = session();
        let id = ready(&mut s, "a.png");
        s.select_category(1).unwrap();
        for offset in [0.0, 100.0] {
            s.pointer_down(10.0 + offset, 10.0);
            s.pointer_move(40.0 + offset, 40.0);
            s.pointer_up().unwrap();
        }
        s.delete_annotation(0).unwrap();
        assert_eq!(s.store().get(&id).len(), 1);
        assert_eq!(s.annotations()[0].ordinal, Some(2));
    }

    #[test]
    fn test_late_load_keeps_drawn_boxes() {
        let mut s = session();
        let id = ready(&mut s, "a.png");
        s.select_category(2).unwrap();
        s.pointer_down(10.0, 10.0);
        s.pointer_move(60.0, 60.0);
        s.pointer_up().unwrap();

        let drawn = s.annotations()[0].clone();
        let other = ImageId::from_file_name("b.png");
        let mut loaded = AnnotationMap::new();
        loaded.insert(id.clone(), vec![drawn.clone(), drawn.clone()]);
        loaded.insert(other.clone(), vec![drawn]);

        assert_eq!(s.merge_loaded(loaded), 1);
        assert_eq!(s.store().get(&id).len(), 1);
        assert_eq!(s.store().get(&other).len(), 1);
    }

    #[tokio::test]
    async fn test_run_tracked_discards_cancelled() {
        let mut tracker = RequestTracker::default();
        let stale = tracker.begin(&ImageId::from_file_name("a.png"));
        let fresh = tracker.begin(&ImageId::from_file_name("b.png"));

        let late = run_tracked(&stale, Duration::from_secs(1), async { Ok(1) }).await;
        assert!(late.is_none());

        let value = run_tracked(&fresh, Duration::from_secs(1), async { Ok(2) }).await;
        assert_eq!(value.unwrap().unwrap(), 2);
        assert!(tracker.is_current(&fresh));
        assert!(!tracker.is_current(&stale));
    }

    #[tokio::test]
    async fn test_run_tracked_times_out() {
        let mut tracker = RequestTracker::default();
        let ticket = tracker.begin(&ImageId::from_file_name("a.png"));
        let result = run_tracked(&ticket, Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap();
        let err = result.unwrap_err();
        assert!(matches!(err, AnnotatorError::Timeout(_)));
        assert_eq!(err.to_string(), "operation timed out after 10ms");
    }
}
