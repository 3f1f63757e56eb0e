//! Rectangle drawing on the display canvas.
//!
//! The surface is a small state machine fed with pointer events in canvas
//! coordinates. It owns no annotations: the caller passes the current list in
//! when a drag finishes and decides what to do with the outcome.

use crate::classes::LabelCatalog;
use crate::state::{Annotation, Rect, SelectedRegion, next_ordinal};

/// Colours of the in-progress rectangle when no category is selected.
pub const DRAFT_FILL: &str = "rgba(0, 0, 255, 0.1)";
pub const DRAFT_BORDER: &str = "rgba(0, 0, 255, 0.7)";

pub const DEFAULT_MIN_SELECTION: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceState {
    Idle,
    Dragging { start: (f64, f64), current: (f64, f64) },
}

/// Result of a drag that produced a usable rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutcome {
    pub region: SelectedRegion,
    /// Present only when a category was selected at pointer-up.
    pub annotation: Option<Annotation>,
}

/// One rectangle to paint over the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub rect: Rect,
    pub fill: String,
    pub border: String,
    pub label: Option<String>,
    pub dashed: bool,
}

#[derive(Debug, Clone)]
pub struct DrawingSurface {
    canvas_width: f64,
    canvas_height: f64,
    min_selection: f64,
    state: SurfaceState,
}

impl DrawingSurface {
    pub fn new(canvas_width: f64, canvas_height: f64, min_selection: f64) -> Self {
        Self {
            canvas_width,
            canvas_height,
            min_selection,
            state: SurfaceState::Idle,
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SurfaceState::Dragging { .. })
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        (self.canvas_width, self.canvas_height)
    }

    /// Drop any drag in progress and adopt the canvas of a newly shown image.
    pub fn reset(&mut self, canvas_width: f64, canvas_height: f64) {
        self.canvas_width = canvas_width;
        self.canvas_height = canvas_height;
        self.state = SurfaceState::Idle;
    }

    /// Start a drag. Ignored when the point is outside the canvas.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        let inside =
            (0.0..=self.canvas_width).contains(&x) && (0.0..=self.canvas_height).contains(&y);
        if !inside {
            return false;
        }
        self.state = SurfaceState::Dragging {
            start: (x, y),
            current: (x, y),
        };
        true
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let clamped = self.clamp(x, y);
        if let SurfaceState::Dragging { current, .. } = &mut self.state {
            *current = clamped;
        }
    }

    /// Finish the drag.
    ///
    /// Rectangles under the minimum size on either axis are dropped silently.
    /// Otherwise the region is reported, and when `selected_category` is set an
    /// annotation is built whose ordinal is one more than the number of
    /// `existing` annotations sharing that category.
    pub fn pointer_up(
        &mut self,
        existing: &[Annotation],
        selected_category: Option<u32>,
    ) -> Option<DrawOutcome> {
        let SurfaceState::Dragging { start, current } =
            std::mem::replace(&mut self.state, SurfaceState::Idle)
        else {
            return None;
        };

        let rect = Rect::from_corners(start, current);
        if rect.width < self.min_selection || rect.height < self.min_selection {
            log::debug!(
                "Discarding {:.1}x{:.1} selection below {} px",
                rect.width,
                rect.height,
                self.min_selection
            );
            return None;
        }

        let annotation = selected_category.map(|category_id| {
            Annotation::new(rect, category_id, next_ordinal(existing, category_id))
        });

        Some(DrawOutcome {
            region: SelectedRegion::from(rect),
            annotation,
        })
    }

    /// Abort a drag (Escape). Returns whether one was in progress.
    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = SurfaceState::Idle;
        was_dragging
    }

    /// Rectangle currently being dragged, if any.
    pub fn current_rect(&self) -> Option<Rect> {
        match self.state {
            SurfaceState::Dragging { start, current } => Some(Rect::from_corners(start, current)),
            SurfaceState::Idle => None,
        }
    }

    /// Render model: existing annotations tagged `{name}_{ordinal}`, then the dashed draft.
    pub fn overlays(
        &self,
        existing: &[Annotation],
        catalog: &LabelCatalog,
        selected_category: Option<u32>,
    ) -> Vec<Overlay> {
        let mut overlays: Vec<Overlay> = existing
            .iter()
            .enumerate()
            .map(|(idx, ann)| Overlay {
                rect: ann.rect(),
                fill: catalog.fill_color_of(ann.category_id).to_string(),
                border: catalog.border_color_of(ann.category_id).to_string(),
                label: Some(annotation_label(existing, idx, catalog)),
                dashed: false,
            })
            .collect();

        if let Some(rect) = self.current_rect() {
            let (fill, border) = match selected_category {
                Some(id) => (catalog.fill_color_of(id), catalog.border_color_of(id)),
                None => (DRAFT_FILL, DRAFT_BORDER),
            };
            overlays.push(Overlay {
                rect,
                fill: fill.to_string(),
                border: border.to_string(),
                label: None,
                dashed: true,
            });
        }

        overlays
    }

    fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(0.0, self.canvas_width), y.clamp(0.0, self.canvas_height))
    }
}

/// Display tag of `existing[idx]`.
///
/// Annotations read back from disk carry no ordinal; they are labelled by
/// their rank among same-category annotations on the image.
pub fn annotation_label(existing: &[Annotation], idx: usize, catalog: &LabelCatalog) -> String {
    let ann = &existing[idx];
    let ordinal = ann.ordinal.unwrap_or_else(|| {
        existing[..=idx]
            .iter()
            .filter(|a| a.category_id == ann.category_id)
            .count() as u32
    });
    format!("{}_{}", catalog.name_of(ann.category_id), ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> DrawingSurface {
        DrawingSurface::new(800.0, 400.0, DEFAULT_MIN_SELECTION)
    }

    fn drag(surface: &mut DrawingSurface, from: (f64, f64), to: (f64, f64)) {
        assert!(surface.pointer_down(from.0, from.1));
        surface.pointer_move(to.0, to.1);
    }

    #[test]
    fn test_small_rectangle_is_discarded() {
        let mut s = surface();
        drag(&mut s, (10.0, 10.0), (13.0, 20.0));
        assert!(s.pointer_up(&[], Some(1)).is_none());
        assert_eq!(s.state(), SurfaceState::Idle);
    }

    #[test]
    fn test_ordinal_counts_same_category() {
        let existing = vec![
            Annotation::new(Rect { x: 0.0, y: 0.0, width: 20.0, height: 20.0 }, 2, 1),
            Annotation::new(Rect { x: 0.0, y: 0.0, width: 20.0, height: 20.0 }, 1, 1),
        ];
        let mut s = surface();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        let outcome = s.pointer_up(&existing, Some(2)).unwrap();

        let ann = outcome.annotation.unwrap();
        assert_eq!(ann.category_id, 2);
        assert_eq!(ann.ordinal, Some(2));
        assert_eq!(ann.bbox, [100.0, 100.0, 50.0, 50.0]);
        assert_eq!(ann.area, 2500.0);
        assert_eq!(outcome.region.area, 2500.0);
    }

    #[test]
    fn test_region_without_category() {
        let mut s = surface();
        drag(&mut s, (60.0, 80.0), (20.0, 30.0));
        let outcome = s.pointer_up(&[], None).unwrap();
        assert!(outcome.annotation.is_none());
        assert_eq!(
            outcome.region,
            SelectedRegion { x: 20.0, y: 30.0, width: 40.0, height: 50.0, area: 2000.0 }
        );
    }

    #[test]
    fn test_drag_is_clamped_to_canvas() {
        let mut s = surface();
        drag(&mut s, (790.0, 390.0), (900.0, -50.0));
        assert_eq!(
            s.current_rect().unwrap(),
            Rect { x: 790.0, y: 0.0, width: 10.0, height: 390.0 }
        );
    }

    #[test]
    fn test_pointer_down_outside_canvas_is_ignored() {
        let mut s = surface();
        assert!(!s.pointer_down(801.0, 10.0));
        s.pointer_move(900.0, 300.0);
        assert!(s.pointer_up(&[], Some(1)).is_none());
    }

    #[test]
    fn test_cancel_discards_drag() {
        let mut s = surface();
        drag(&mut s, (10.0, 10.0), (200.0, 200.0));
        assert!(s.cancel());
        assert!(!s.cancel());
        assert!(s.pointer_up(&[], Some(1)).is_none());
    }

    #[test]
    fn test_reset_on_image_change() {
        let mut s = surface();
        drag(&mut s, (10.0, 10.0), (200.0, 200.0));
        s.reset(50.0, 400.0);
        assert!(!s.is_dragging());
        assert_eq!(s.canvas_size(), (50.0, 400.0));
        assert!(!s.pointer_down(60.0, 10.0));
    }

    #[test]
    fn test_overlays_tag_and_draft_colors() {
        let catalog = LabelCatalog::default();
        let existing = vec![
            Annotation::new(Rect { x: 0.0, y: 0.0, width: 20.0, height: 20.0 }, 1, 3),
            Annotation {
                ordinal: None,
                ..Annotation::new(Rect { x: 5.0, y: 5.0, width: 20.0, height: 20.0 }, 1, 1)
            },
        ];
        let mut s = surface();
        drag(&mut s, (10.0, 10.0), (40.0, 40.0));

        let overlays = s.overlays(&existing, &catalog, None);
        assert_eq!(overlays.len(), 3);
        assert_eq!(overlays[0].label.as_deref(), Some("Logo_3"));
        assert_eq!(overlays[1].label.as_deref(), Some("Logo_2"));
        assert!(overlays[2].dashed);
        assert_eq!(overlays[2].border, DRAFT_BORDER);

        let overlays = s.overlays(&existing, &catalog, Some(4));
        assert_eq!(overlays[2].border, catalog.border_color_of(4));
    }
}
