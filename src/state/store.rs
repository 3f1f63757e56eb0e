use crate::images::ImageId;
use crate::state::types::{Annotation, AnnotationMap};

/// In-memory annotations of the running session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    map: AnnotationMap,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the list of `image_id`, creating it on first use.
    pub fn add(&mut self, image_id: &ImageId, annotation: Annotation) {
        self.map.entry(image_id.clone()).or_default().push(annotation);
    }

    /// Remove by position. Ordinals of the remaining annotations are left as they were.
    pub fn remove(&mut self, image_id: &ImageId, index: usize) -> Option<Annotation> {
        let list = self.map.get_mut(image_id)?;
        if index < list.len() {
            Some(list.remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, image_id: &ImageId) -> &[Annotation] {
        self.map.get(image_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ordinal for a new annotation of `category_id` on `image_id`.
    pub fn next_ordinal(&self, image_id: &ImageId, category_id: u32) -> u32 {
        next_ordinal(self.get(image_id), category_id)
    }

    /// True when no image holds a single annotation.
    pub fn is_empty(&self) -> bool {
        self.map.values().all(Vec::is_empty)
    }

    pub fn image_count(&self) -> usize {
        self.map.len()
    }

    pub fn annotation_count(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    pub fn map(&self) -> &AnnotationMap {
        &self.map
    }

    /// Take stored lists for images that have nothing in memory yet.
    ///
    /// Images already holding annotations keep them. Returns how many loaded
    /// images were skipped for that reason.
    pub fn merge_loaded(&mut self, loaded: AnnotationMap) -> usize {
        let mut kept = 0;
        for (image_id, list) in loaded {
            let current = self.map.entry(image_id).or_default();
            if current.is_empty() {
                *current = list;
            } else {
                kept += 1;
            }
        }
        kept
    }
}

pub fn next_ordinal(existing: &[Annotation], category_id: u32) -> u32 {
    let same = existing.iter().filter(|a| a.category_id == category_id).count();
    same as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::types::Rect;

    fn ann(category_id: u32, ordinal: u32) -> Annotation {
        Annotation::new(
            Rect { x: 1.0, y: 2.0, width: 10.0, height: 10.0 },
            category_id,
            ordinal,
        )
    }

    #[test]
    fn test_get_missing_image_is_empty() {
        let store = AnnotationStore::new();
        assert!(store.get(&ImageId::from_file_name("a.png")).is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_keeps_order() {
        let mut store = AnnotationStore::new();
        let id = ImageId::from_file_name("a.png");
        store.add(&id, ann(1, 1));
        store.add(&id, ann(3, 1));
        let cats: Vec<u32> = store.get(&id).iter().map(|a| a.category_id).collect();
        assert_eq!(cats, vec![1, 3]);
        assert_eq!(store.annotation_count(), 2);
    }

    #[test]
    fn test_remove_does_not_renumber() {
        let mut store = AnnotationStore::new();
        let id = ImageId::from_file_name("a.png");
        store.add(&id, ann(1, 1));
        store.add(&id, ann(1, 2));

        let removed = store.remove(&id, 0).unwrap();
        assert_eq!(removed.ordinal, Some(1));
        assert_eq!(store.get(&id).len(), 1);
        assert_eq!(store.get(&id)[0].ordinal, Some(2));

        // A fresh annotation counts what is left, so it repeats ordinal 2.
        assert_eq!(store.next_ordinal(&id, 1), 2);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut store = AnnotationStore::new();
        let id = ImageId::from_file_name("a.png");
        assert!(store.remove(&id, 0).is_none());
        store.add(&id, ann(2, 1));
        assert!(store.remove(&id, 5).is_none());
        assert_eq!(store.get(&id).len(), 1);
    }

    #[test]
    fn test_emptied_image_counts_as_empty() {
        let mut store = AnnotationStore::new();
        let id = ImageId::from_file_name("a.png");
        store.add(&id, ann(2, 1));
        store.remove(&id, 0);
        assert_eq!(store.image_count(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_merge_loaded_keeps_unsaved_edits() {
        let mut store = AnnotationStore::new();
        let drawn = ImageId::from_file_name("drawn.png");
        let untouched = ImageId::from_file_name("untouched.png");
        store.add(&drawn, ann(1, 1));

        let mut loaded = AnnotationMap::new();
        loaded.insert(drawn.clone(), vec![ann(2, 1), ann(3, 1)]);
        loaded.insert(untouched.clone(), vec![ann(4, 1)]);

        assert_eq!(store.merge_loaded(loaded), 1);
        assert_eq!(store.get(&drawn).len(), 1);
        assert_eq!(store.get(&drawn)[0].category_id, 1);
        assert_eq!(store.get(&untouched)[0].category_id, 4);
    }

    #[test]
    fn test_next_ordinal_per_category() {
        let mut store = AnnotationStore::new();
        let id = ImageId::from_file_name("a.png");
        store.add(&id, ann(2, 1));
        store.add(&id, ann(1, 1));
        assert_eq!(store.next_ordinal(&id, 2), 2);
        assert_eq!(store.next_ordinal(&id, 5), 1);
    }
}
