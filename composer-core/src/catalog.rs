//! # Catalog
//!
//! Builds a [`LayerGraph`] out of a flat folder of `.webp` fragments. File names are split on `_`, every
//! segment but the last names a group and the last names the leaf, so `char_arm_left.webp` becomes
//! `char -> arm -> left`.
//!
//! Two files that reduce to the same segment path collide, and the file seen last wins. The same goes for
//! a name that is both a group and a leaf (`bg.webp` next to `bg_sky.webp`): whichever comes later replaces
//! the other. Every such overwrite is logged as a warning, but is not an error.

use crate::state::graph::{LayerGraph, Location};

/// Extension, without the dot, matched case-insensitively.
pub const EXTENSION: &str = "webp";
const SEPARATOR: char = '_';

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("failed to read folder {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An insertion-ordered level of the catalog. Re-assigning a key keeps its original position.
#[derive(Default, Debug)]
struct Level {
    entries: Vec<(String, Entry)>,
}
#[derive(Debug)]
enum Entry {
    Group(Level),
    Leaf(String),
}
impl Level {
    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(name, _)| name == key)
    }
    /// Get the group under `key`, replacing a leaf of the same name.
    fn group_mut(&mut self, key: &str, file_name: &str) -> &mut Level {
        let idx = match self.position(key) {
            Some(idx) => {
                if let Entry::Leaf(previous) = &self.entries[idx].1 {
                    log::warn!("{file_name:?} turns {previous:?} into a group, dropping it");
                    self.entries[idx].1 = Entry::Group(Level::default());
                }
                idx
            }
            None => {
                self.entries
                    .push((key.to_owned(), Entry::Group(Level::default())));
                self.entries.len() - 1
            }
        };
        match &mut self.entries[idx].1 {
            Entry::Group(level) => level,
            // Replaced above.
            Entry::Leaf(_) => unreachable!(),
        }
    }
    fn set_leaf(&mut self, key: &str, file_name: &str) {
        let leaf = Entry::Leaf(file_name.to_owned());
        match self.position(key) {
            Some(idx) => {
                match &self.entries[idx].1 {
                    Entry::Leaf(previous) => {
                        log::warn!("{file_name:?} overwrites {previous:?}");
                    }
                    Entry::Group(_) => {
                        log::warn!("{file_name:?} replaces the group {key:?} and everything in it");
                    }
                }
                self.entries[idx].1 = leaf;
            }
            None => self.entries.push((key.to_owned(), leaf)),
        }
    }
    fn insert(&mut self, file_name: &str) {
        let stem = strip_extension(file_name);
        // rsplit_once leaves the groups in `head`, the leaf in `last`.
        let (head, last) = match stem.rsplit_once(SEPARATOR) {
            Some((head, last)) => (Some(head), last),
            None => (None, stem),
        };
        let mut level = self;
        if let Some(head) = head {
            for segment in head.split(SEPARATOR) {
                level = level.group_mut(segment, file_name);
            }
        }
        level.set_leaf(last, file_name);
    }
    fn build_into(
        self,
        graph: &mut LayerGraph,
        folder: &std::path::Path,
        parent: Option<crate::state::graph::GroupID>,
    ) {
        for (name, entry) in self.entries {
            let location = match parent {
                Some(group) => Location::IndexIntoGroup(group, usize::MAX),
                None => Location::IndexIntoRoot(usize::MAX),
            };
            // Parents were all created just now, so the location is always valid.
            match entry {
                Entry::Group(level) => match graph.add_group(location, name) {
                    Ok(group) => level.build_into(graph, folder, Some(group)),
                    Err(e) => log::error!("failed to add group: {e}"),
                },
                Entry::Leaf(file_name) => {
                    if let Err(e) = graph.add_leaf(location, name, folder.join(file_name)) {
                        log::error!("failed to add leaf: {e}");
                    }
                }
            }
        }
    }
}

/// Remove a trailing `.webp` of any case. Names without it are returned as-is.
fn strip_extension(file_name: &str) -> &str {
    let cut = file_name.len().saturating_sub(EXTENSION.len() + 1);
    match file_name.get(cut..) {
        Some(tail) if is_extension(tail) => &file_name[..cut],
        _ => file_name,
    }
}
fn is_extension(tail: &str) -> bool {
    tail.strip_prefix('.')
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION))
}

/// Build a graph from these file names, found in `folder`. Names are used in the order given.
///
/// Does not touch the filesystem.
pub fn from_file_names<S: AsRef<str>>(
    folder: &std::path::Path,
    file_names: impl IntoIterator<Item = S>,
) -> LayerGraph {
    let mut root = Level::default();
    for file_name in file_names {
        root.insert(file_name.as_ref());
    }
    let mut graph = LayerGraph::default();
    root.build_into(&mut graph, folder, None);
    graph
}

/// List the `.webp` files directly inside `folder`, sorted by name.
///
/// Subfolders and names that aren't valid unicode are skipped.
pub fn list(folder: &std::path::Path) -> Result<Vec<String>, CatalogError> {
    let io_err = |source| CatalogError::Io {
        path: folder.to_owned(),
        source,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        // Follows symlinks, unlike DirEntry::file_type
        if !entry.path().is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            log::warn!("skipping non-unicode file name {:?}", entry.file_name());
            continue;
        };
        let has_extension = std::path::Path::new(&name)
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION));
        if has_extension {
            names.push(name);
        }
    }
    // read_dir order is platform dependent.
    names.sort_unstable();
    Ok(names)
}

/// Scan `folder` and build its layer graph. No image data is read.
pub fn scan(folder: &std::path::Path) -> Result<LayerGraph, CatalogError> {
    let names = list(folder)?;
    log::debug!("found {} layers in {folder:?}", names.len());
    Ok(from_file_names(folder, names))
}
