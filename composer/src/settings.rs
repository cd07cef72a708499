//! User settings, read once at startup from the preferences directory.
//! Nothing here is ever written back, edit `settings.toml` by hand:
//!
//! ```toml
//! # "numbered" or "source-folder"
//! export_policy = "numbered"
//! export_directory = "exports"
//! first_export_index = 1
//! ```

use composer_core::export::{ExportPolicy, ExportWriter};

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// `image_001.png`, `image_002.png`, ... in the export directory.
    #[default]
    Numbered,
    /// `output/exported.png` inside the open folder.
    SourceFolder,
}

#[derive(serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub export_policy: PolicyKind,
    /// Relative paths are resolved against the working directory.
    pub export_directory: std::path::PathBuf,
    pub first_export_index: u32,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            export_policy: PolicyKind::default(),
            export_directory: "exports".into(),
            first_export_index: 1,
        }
    }
}
impl Settings {
    const FILENAME: &'static str = "settings.toml";
    /// Load the user's settings, or defaults if they're missing or malformed.
    #[must_use]
    pub fn get() -> Self {
        match preferences_dir() {
            None => {
                log::warn!("No preferences directory, using default settings.");
                Self::default()
            }
            Some(mut dir) => {
                dir.push(Self::FILENAME);
                Self::load_or_default(&dir)
            }
        }
    }
    #[must_use]
    pub fn load_or_default(path: &std::path::Path) -> Self {
        let settings: anyhow::Result<Self> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let settings: Self = toml::from_str(&string)?;
            Ok(settings)
        };
        match settings {
            Ok(settings) => {
                log::debug!("loaded settings from {path:?}");
                settings
            }
            Err(e) => {
                log::warn!("Settings at {path:?} unavailable, using defaults: {e:#}");
                Self::default()
            }
        }
    }
    #[must_use]
    pub fn export_policy(&self) -> ExportPolicy {
        match self.export_policy {
            PolicyKind::Numbered => ExportPolicy::Numbered {
                directory: self.export_directory.clone(),
            },
            PolicyKind::SourceFolder => ExportPolicy::SourceFolder,
        }
    }
    #[must_use]
    pub fn export_writer(&self) -> ExportWriter {
        ExportWriter::starting_at(self.export_policy(), self.first_export_index)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("settings.toml"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.export_writer().next_index(), 1);
    }
    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "export_policy = \"source-folder\"\n").unwrap();
        let settings = Settings::load_or_default(&path);
        assert_eq!(settings.export_policy, PolicyKind::SourceFolder);
        assert_eq!(settings.export_directory, std::path::Path::new("exports"));
        assert_eq!(settings.export_policy(), ExportPolicy::SourceFolder);
    }
    #[test]
    fn numbered_uses_directory_and_index() {
        let settings: Settings = toml::from_str(
            "export_directory = \"/tmp/renders\"\nfirst_export_index = 12\n",
        )
        .unwrap();
        let writer = settings.export_writer();
        assert_eq!(
            writer.policy(),
            &ExportPolicy::Numbered {
                directory: "/tmp/renders".into()
            }
        );
        assert_eq!(writer.next_index(), 12);
    }
    #[test]
    fn malformed_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "export_policy = \"somewhere\"\n").unwrap();
        assert_eq!(Settings::load_or_default(&path), Settings::default());
        std::fs::write(&path, "colour = 3\n").unwrap();
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }
}
