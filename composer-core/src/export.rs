//! # Export
//!
//! Writes the flattened composite out as a PNG. Where it goes is decided by an [`ExportPolicy`], and a
//! writer owns its own counter so numbering restarts with each writer instead of being process-global.

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("there is no composed image to export")]
    NoComposite,
    #[error("no source folder is open to export next to")]
    NoSourceFolder,
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path:?}: {source}")]
    Encode {
        path: std::path::PathBuf,
        #[source]
        source: png::EncodingError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportPolicy {
    /// `directory/image_001.png`, `directory/image_002.png`, ... numbered by the writer.
    Numbered { directory: std::path::PathBuf },
    /// `<source folder>/output/exported.png`, overwritten on every export.
    SourceFolder,
}
impl ExportPolicy {
    pub const SOURCE_SUBFOLDER: &'static str = "output";
    pub const SOURCE_FILE_NAME: &'static str = "exported.png";
}

#[derive(Clone, Debug)]
pub struct ExportWriter {
    policy: ExportPolicy,
    next_index: u32,
}
impl ExportWriter {
    #[must_use]
    pub fn new(policy: ExportPolicy) -> Self {
        Self::starting_at(policy, 1)
    }
    /// A writer whose next numbered export uses `next_index`.
    #[must_use]
    pub fn starting_at(policy: ExportPolicy, next_index: u32) -> Self {
        Self { policy, next_index }
    }
    #[must_use]
    pub fn policy(&self) -> &ExportPolicy {
        &self.policy
    }
    /// The number the next successful numbered export will use.
    #[must_use]
    pub fn next_index(&self) -> u32 {
        self.next_index
    }
    /// Where the next export would be written.
    pub fn destination(
        &self,
        source_folder: Option<&std::path::Path>,
    ) -> Result<std::path::PathBuf, ExportError> {
        match &self.policy {
            ExportPolicy::Numbered { directory } => {
                Ok(directory.join(format!("image_{:03}.png", self.next_index)))
            }
            ExportPolicy::SourceFolder => {
                let folder = source_folder.ok_or(ExportError::NoSourceFolder)?;
                Ok(folder
                    .join(ExportPolicy::SOURCE_SUBFOLDER)
                    .join(ExportPolicy::SOURCE_FILE_NAME))
            }
        }
    }
    /// Write the composite, creating missing directories. Returns the written path.
    ///
    /// The counter only advances when the file was written successfully.
    pub fn export(
        &mut self,
        composite: Option<&image::RgbaImage>,
        source_folder: Option<&std::path::Path>,
    ) -> Result<std::path::PathBuf, ExportError> {
        let composite = composite.ok_or(ExportError::NoComposite)?;
        let path = self.destination(source_folder)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
                path: parent.to_owned(),
                source,
            })?;
        }
        write_png(&path, composite)?;
        if matches!(self.policy, ExportPolicy::Numbered { .. }) {
            self.next_index = self.next_index.saturating_add(1);
        }
        log::info!("exported {}x{} to {path:?}", composite.width(), composite.height());
        Ok(path)
    }
}

/// Encode `image` as an 8-bit RGBA PNG at `path`, replacing any existing file.
pub fn write_png(path: &std::path::Path, image: &image::RgbaImage) -> Result<(), ExportError> {
    let encode_err = |source| ExportError::Encode {
        path: path.to_owned(),
        source,
    };
    let file = std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_owned(),
        source,
    })?;
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(encode_err)?;
    writer.write_image_data(image.as_raw()).map_err(encode_err)?;
    writer.finish().map_err(encode_err)
}
