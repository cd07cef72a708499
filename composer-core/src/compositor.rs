//! # Compositor
//!
//! Flattens an ordered list of layer images into one RGBA8 image. The first layer is the canvas and sets the
//! output size, every later layer is blended over it at the top-left corner, clipped to the canvas.
//!
//! Output depends only on the list of paths and the bytes behind them.

use rayon::prelude::*;

use crate::cache::DecodeCache;

#[derive(thiserror::Error, Debug)]
pub enum CompositeError {
    #[error("failed to read layer {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode layer {path:?}: {source}")]
    Decode {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },
}
impl CompositeError {
    /// The layer that caused the failure.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Decode { path, .. } => path,
        }
    }
}

/// Read and decode a single layer into RGBA8.
///
/// The format is sniffed from the content, falling back on the extension.
pub fn load(path: &std::path::Path) -> Result<image::RgbaImage, CompositeError> {
    let io_err = |source| CompositeError::Io {
        path: path.to_owned(),
        source,
    };
    let image = image::ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?
        .decode()
        .map_err(|source| CompositeError::Decode {
            path: path.to_owned(),
            source,
        })?;
    Ok(image.into_rgba8())
}

/// Blend `layer` over `canvas`, anchored at the top-left. Only the overlapping region is touched.
pub fn blend_onto(canvas: &mut image::RgbaImage, layer: &image::RgbaImage) {
    let width = canvas.width().min(layer.width()) as usize;
    let height = canvas.height().min(layer.height()) as usize;
    if width == 0 || height == 0 {
        return;
    }
    let canvas_stride = canvas.width() as usize * 4;
    let layer_stride = layer.width() as usize * 4;
    let overlap = width * 4;

    let canvas: &mut [u8] = canvas;
    let layer: &[u8] = layer;
    // Rows are independent, so the result doesn't depend on scheduling.
    canvas
        .par_chunks_exact_mut(canvas_stride)
        .zip(layer.par_chunks_exact(layer_stride))
        .take(height)
        .for_each(|(dst, src)| crate::blend::over_row(&src[..overlap], &mut dst[..overlap]));
}

/// Composites layers, optionally remembering decoded layers between calls.
#[derive(Default)]
pub struct Compositor {
    cache: Option<DecodeCache>,
}
impl Compositor {
    /// A compositor that decodes every layer on every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// A compositor that reuses decoded layers while their modification time is unchanged.
    #[must_use]
    pub fn with_cache() -> Self {
        Self {
            cache: Some(DecodeCache::default()),
        }
    }
    pub fn clear_cache(&mut self) {
        if let Some(cache) = &mut self.cache {
            cache.clear();
        }
    }
    fn load(&mut self, path: &std::path::Path) -> Result<std::sync::Arc<image::RgbaImage>, CompositeError> {
        match &mut self.cache {
            Some(cache) => cache.get_or_load(path),
            None => load(path).map(std::sync::Arc::new),
        }
    }
    /// Flatten these layers, bottom first.
    ///
    /// Returns `Ok(None)` for no layers. Any layer failing to load fails the whole composite.
    pub fn composite<P: AsRef<std::path::Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<Option<image::RgbaImage>, CompositeError> {
        let Some((base, rest)) = paths.split_first() else {
            return Ok(None);
        };
        // Load everything up front, so a failure never leaves a half-blended result behind.
        let base = self.load(base.as_ref())?;
        let rest = rest
            .iter()
            .map(|path| self.load(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut canvas = std::sync::Arc::unwrap_or_clone(base);
        for layer in &rest {
            blend_onto(&mut canvas, layer);
        }
        log::debug!(
            "composited {} layers into {}x{}",
            paths.len(),
            canvas.width(),
            canvas.height()
        );
        Ok(Some(canvas))
    }
}

/// Flatten these layers, bottom first, without caching. See [`Compositor::composite`].
pub fn composite<P: AsRef<std::path::Path>>(
    paths: &[P],
) -> Result<Option<image::RgbaImage>, CompositeError> {
    Compositor::new().composite(paths)
}
