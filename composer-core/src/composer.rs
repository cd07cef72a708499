//! # Composer
//!
//! The single owner of a session: the open folder's layer graph, the current composite, the view, and the
//! export writer. Front ends drive it through plain method calls, and every call that changes which layers
//! are visible (or their order) recomposites before returning.

use crate::{
    catalog::{self, CatalogError},
    compositor::{CompositeError, Compositor},
    export::{ExportError, ExportWriter},
    state::graph::{AnyID, LayerGraph, Location, ReparentError, TargetError},
    view_transform::ViewTransform,
};

#[derive(thiserror::Error, Debug)]
pub enum ComposerError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Composite(#[from] CompositeError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(transparent)]
    Reparent(#[from] ReparentError),
}

pub struct Composer {
    folder: Option<std::path::PathBuf>,
    graph: LayerGraph,
    compositor: Compositor,
    composite: Option<image::RgbaImage>,
    view: ViewTransform,
    exporter: ExportWriter,
}
impl Composer {
    #[must_use]
    pub fn new(exporter: ExportWriter) -> Self {
        Self {
            folder: None,
            graph: LayerGraph::default(),
            compositor: Compositor::with_cache(),
            composite: None,
            view: ViewTransform::default(),
            exporter,
        }
    }
    /// The currently open folder, if any.
    #[must_use]
    pub fn folder(&self) -> Option<&std::path::Path> {
        self.folder.as_deref()
    }
    #[must_use]
    pub fn graph(&self) -> &LayerGraph {
        &self.graph
    }
    /// The current flattened image, or `None` if no layer is visible.
    #[must_use]
    pub fn composite(&self) -> Option<&image::RgbaImage> {
        self.composite.as_ref()
    }
    #[must_use]
    pub fn view(&self) -> &ViewTransform {
        &self.view
    }
    #[must_use]
    pub fn exporter(&self) -> &ExportWriter {
        &self.exporter
    }
    /// Open a folder, replacing the whole layer graph.
    ///
    /// On failure the previously open folder stays as it was.
    pub fn set_folder(&mut self, folder: impl Into<std::path::PathBuf>) -> Result<(), ComposerError> {
        let folder = folder.into();
        let graph = catalog::scan(&folder)?;
        log::info!("opened {folder:?} with {} layers", graph.len());
        self.graph = graph;
        self.folder = Some(folder);
        self.compositor.clear_cache();
        self.recomposite()?;
        Ok(())
    }
    /// Re-read every visible layer and rebuild the composite.
    ///
    /// On failure, the previous composite is kept.
    pub fn recomposite(&mut self) -> Result<(), CompositeError> {
        let paths: Vec<_> = self
            .graph
            .visible_leaves()
            .into_iter()
            .map(|(_, path)| path)
            .collect();
        match self.compositor.composite(&paths) {
            Ok(composite) => {
                self.composite = composite;
                Ok(())
            }
            Err(e) => {
                log::warn!("keeping previous composite: {e}");
                Err(e)
            }
        }
    }
    /// Flip a node's visibility. Returns the new value.
    pub fn toggle(&mut self, id: impl Into<AnyID>) -> Result<bool, ComposerError> {
        let visible = self.graph.toggle(id)?;
        self.recomposite()?;
        Ok(visible)
    }
    /// Set a node's visibility. Returns whether it changed.
    pub fn set_visible(&mut self, id: impl Into<AnyID>, visible: bool) -> Result<bool, ComposerError> {
        let changed = self.graph.set_visible(id, visible)?;
        if changed {
            self.recomposite()?;
        }
        Ok(changed)
    }
    /// Swap a node with its previous sibling. Returns false if it was already first.
    pub fn move_up(&mut self, id: impl Into<AnyID>) -> Result<bool, ComposerError> {
        let moved = self.graph.move_up(id)?;
        if moved {
            self.recomposite()?;
        }
        Ok(moved)
    }
    /// Swap a node with its next sibling. Returns false if it was already last.
    pub fn move_down(&mut self, id: impl Into<AnyID>) -> Result<bool, ComposerError> {
        let moved = self.graph.move_down(id)?;
        if moved {
            self.recomposite()?;
        }
        Ok(moved)
    }
    /// Drag a node, with its children, somewhere else in the graph.
    pub fn reparent(&mut self, id: impl Into<AnyID>, destination: Location) -> Result<(), ComposerError> {
        self.graph.reparent(id, destination)?;
        self.recomposite()?;
        Ok(())
    }
    /// One wheel tick in, anchored at the cursor. Ignored while there's nothing to look at.
    pub fn zoom_in(&mut self, cursor: cgmath::Point2<f32>) -> bool {
        if self.composite.is_none() {
            return false;
        }
        self.view.zoom_in(cursor);
        true
    }
    /// One wheel tick out, anchored at the cursor. Ignored while there's nothing to look at.
    pub fn zoom_out(&mut self, cursor: cgmath::Point2<f32>) -> bool {
        if self.composite.is_none() {
            return false;
        }
        self.view.zoom_out(cursor);
        true
    }
    pub fn pan(&mut self, delta: cgmath::Vector2<f32>) {
        self.view.pan(delta);
    }
    /// Write the current composite according to the export policy. Returns the written path.
    pub fn export(&mut self) -> Result<std::path::PathBuf, ComposerError> {
        Ok(self
            .exporter
            .export(self.composite.as_ref(), self.folder.as_deref())?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        export::ExportPolicy,
        state::graph::AnyID,
        testing::{solid, write_layer},
    };

    struct Fixture {
        _dir: tempfile::TempDir,
        sprites: std::path::PathBuf,
        exports: std::path::PathBuf,
        composer: Composer,
    }
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let sprites = dir.path().join("sprites");
        let exports = dir.path().join("exports");
        std::fs::create_dir(&sprites).unwrap();
        write_layer(&sprites, "bg_sky.webp", &solid(4, 4, [0, 0, 255, 255]));
        let mut sun = solid(4, 4, [0, 0, 0, 0]);
        sun.put_pixel(0, 0, image::Rgba([255, 255, 0, 255]));
        write_layer(&sprites, "bg_sun.webp", &sun);
        write_layer(&sprites, "char_body.webp", &solid(2, 2, [255, 0, 0, 255]));

        let mut composer = Composer::new(ExportWriter::new(ExportPolicy::Numbered {
            directory: exports.clone(),
        }));
        composer.set_folder(&sprites).unwrap();
        Fixture {
            _dir: dir,
            sprites,
            exports,
            composer,
        }
    }
    fn id(composer: &Composer, path: &[&str]) -> AnyID {
        composer.graph().find(path).unwrap()
    }

    #[test]
    fn starts_empty() {
        let Fixture { composer, sprites, _dir, .. } = fixture();
        assert_eq!(composer.folder(), Some(sprites.as_path()));
        assert_eq!(composer.graph().len(), 5);
        assert!(composer.composite().is_none());
    }
    #[test]
    fn toggles_recomposite() {
        let Fixture { mut composer, _dir, .. } = fixture();
        let sky = id(&composer, &["bg", "sky"]);
        let sun = id(&composer, &["bg", "sun"]);
        assert!(composer.toggle(sky).unwrap());
        assert_eq!(composer.composite().unwrap().get_pixel(0, 0).0, [0, 0, 255, 255]);

        composer.toggle(sun).unwrap();
        assert_eq!(composer.composite().unwrap().get_pixel(0, 0).0, [255, 255, 0, 255]);
        assert_eq!(composer.composite().unwrap().get_pixel(1, 1).0, [0, 0, 255, 255]);

        // Hiding the group hides both, and back again.
        let bg = id(&composer, &["bg"]);
        assert!(!composer.toggle(bg).unwrap());
        assert!(composer.composite().is_none());
        assert!(composer.toggle(bg).unwrap());
        assert_eq!(composer.composite().unwrap().get_pixel(0, 0).0, [255, 255, 0, 255]);
    }
    #[test]
    fn reorder_changes_result() {
        let Fixture { mut composer, _dir, .. } = fixture();
        let sky = id(&composer, &["bg", "sky"]);
        let sun = id(&composer, &["bg", "sun"]);
        composer.set_visible(sky, true).unwrap();
        composer.set_visible(sun, true).unwrap();
        assert!(!composer.set_visible(sun, true).unwrap());

        // Sun below the opaque sky disappears.
        assert!(composer.move_up(sky).is_ok_and(|moved| !moved));
        assert!(composer.move_up(sun).unwrap());
        assert_eq!(composer.composite().unwrap().get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert!(composer.move_down(sun).unwrap());
        assert_eq!(composer.composite().unwrap().get_pixel(0, 0).0, [255, 255, 0, 255]);
    }
    #[test]
    fn first_visible_layer_sets_size() {
        let Fixture { mut composer, _dir, .. } = fixture();
        let bg = id(&composer, &["bg"]);
        let char_group = id(&composer, &["char"]);
        composer.toggle(id(&composer, &["char", "body"])).unwrap();
        composer.toggle(id(&composer, &["bg", "sky"])).unwrap();
        assert_eq!(composer.composite().unwrap().dimensions(), (4, 4));

        composer
            .reparent(char_group, Location::BeforeSibling(bg))
            .unwrap();
        let composite = composer.composite().unwrap();
        assert_eq!(composite.dimensions(), (2, 2));
        assert_eq!(composite.get_pixel(0, 0).0, [0, 0, 255, 255]);
    }
    #[test]
    fn decode_failure_keeps_previous() {
        let Fixture {
            mut composer,
            sprites,
            _dir, ..
        } = fixture();
        let sky = id(&composer, &["bg", "sky"]);
        let body = id(&composer, &["char", "body"]);
        composer.toggle(sky).unwrap();
        let before = composer.composite().cloned();

        std::fs::write(sprites.join("char_body.webp"), b"definitely not an image").unwrap();
        let err = composer.toggle(body).unwrap_err();
        assert!(matches!(
            err,
            ComposerError::Composite(CompositeError::Decode { .. })
        ));
        // The toggle itself stands, the picture doesn't change.
        assert!(composer.graph().get(body).unwrap().visible());
        assert_eq!(composer.composite().cloned(), before);

        // Fixing the input set recovers.
        composer.toggle(body).unwrap();
        assert_eq!(composer.composite().cloned(), before);
    }
    #[test]
    fn export_numbering() {
        let Fixture {
            mut composer,
            exports,
            _dir, ..
        } = fixture();
        assert!(matches!(
            composer.export(),
            Err(ComposerError::Export(ExportError::NoComposite))
        ));
        composer.toggle(id(&composer, &["bg", "sky"])).unwrap();
        assert_eq!(composer.export().unwrap(), exports.join("image_001.png"));
        assert_eq!(composer.export().unwrap(), exports.join("image_002.png"));
        assert_eq!(composer.exporter().next_index(), 3);
    }
    #[test]
    fn reopening_invalidates_ids() {
        let Fixture {
            mut composer,
            sprites,
            _dir, ..
        } = fixture();
        let sky = id(&composer, &["bg", "sky"]);
        composer.toggle(sky).unwrap();
        composer.set_folder(&sprites).unwrap();
        assert!(composer.composite().is_none());
        assert!(matches!(
            composer.toggle(sky),
            Err(ComposerError::Target(TargetError::TargetNotFound))
        ));
    }
    #[test]
    fn missing_folder_keeps_session() {
        let Fixture {
            mut composer,
            sprites,
            _dir, ..
        } = fixture();
        composer.toggle(id(&composer, &["bg", "sky"])).unwrap();
        assert!(matches!(
            composer.set_folder(sprites.join("nope")),
            Err(ComposerError::Catalog(CatalogError::Io { .. }))
        ));
        assert_eq!(composer.folder(), Some(sprites.as_path()));
        assert!(composer.composite().is_some());
    }
    #[test]
    fn zoom_needs_a_composite() {
        let Fixture { mut composer, _dir, .. } = fixture();
        let cursor = cgmath::point2(100.0, 100.0);
        assert!(!composer.zoom_in(cursor));
        assert!((composer.view().scale() - 1.0).abs() < f32::EPSILON);

        composer.toggle(id(&composer, &["bg", "sky"])).unwrap();
        assert!(composer.zoom_in(cursor));
        assert!(composer.zoom_out(cursor));
        composer.pan(cgmath::vec2(3.0, 4.0));
        // View survives recomposites.
        let view = *composer.view();
        composer.toggle(id(&composer, &["bg", "sun"])).unwrap();
        assert_eq!(*composer.view(), view);
    }
}
