//! Line-oriented front end. Each line of input is one [`Command`], run against the [`Composer`].
//!
//! Layers are addressed by the row number printed by `tree`, which is only stable until the next reorder.

use composer_core::{
    composer::{Composer, ComposerError},
    state::graph::{AnyID, LayerGraph, Location},
};

pub const HELP: &str = "\
open <dir>                     open a folder of .webp layers
tree                           list layers, bottom first
toggle <n>                     flip visibility of row n
show <n> / hide <n>            set visibility of row n
up <n> / down <n>              swap row n with its previous/next sibling
move <n> <parent|root> <i>     move row n to index i of group row <parent>, or of the root
zoom in|out <x> <y>            zoom one step about a point in the view
pan <dx> <dy>                  move the view
view                           show the view transform
export                         write the composite as PNG
help                           this text
quit";

#[derive(strum::EnumString, Clone, Copy, Debug, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
enum Keyword {
    Open,
    Tree,
    Toggle,
    Show,
    Hide,
    Up,
    Down,
    Move,
    Zoom,
    Pan,
    View,
    Export,
    #[strum(serialize = "help", serialize = "?")]
    Help,
    #[strum(serialize = "quit", serialize = "exit")]
    Quit,
}

#[derive(strum::EnumString, Clone, Copy, Debug, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parent {
    Root,
    Row(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Open(std::path::PathBuf),
    Tree,
    Toggle(usize),
    Show(usize),
    Hide(usize),
    Up(usize),
    Down(usize),
    Move {
        row: usize,
        parent: Parent,
        index: usize,
    },
    Zoom {
        direction: ZoomDirection,
        cursor: cgmath::Point2<f32>,
    },
    Pan(cgmath::Vector2<f32>),
    View,
    Export,
    Help,
    Quit,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command {0:?}, try `help`")]
    UnknownCommand(String),
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("invalid {what}: {value:?}")]
    Invalid { what: &'static str, value: String },
    #[error("unexpected {0:?}")]
    Trailing(String),
}

struct Args<'a>(std::str::SplitWhitespace<'a>);
impl<'a> Args<'a> {
    fn next(&mut self, what: &'static str) -> Result<&'a str, ParseError> {
        self.0.next().ok_or(ParseError::Missing(what))
    }
    fn parse<T: std::str::FromStr>(&mut self, what: &'static str) -> Result<T, ParseError> {
        let value = self.next(what)?;
        value.parse().map_err(|_| ParseError::Invalid {
            what,
            value: value.to_owned(),
        })
    }
    fn finish(mut self) -> Result<(), ParseError> {
        match self.0.next() {
            Some(extra) => Err(ParseError::Trailing(extra.to_owned())),
            None => Ok(()),
        }
    }
}

impl std::str::FromStr for Command {
    type Err = ParseError;
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let keyword: Keyword = word
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| ParseError::UnknownCommand(word.to_owned()))?;
        let rest = rest.trim();

        let mut args = Args(rest.split_whitespace());
        let command = match keyword {
            // Paths may contain spaces, so `open` takes the rest of the line verbatim.
            Keyword::Open if rest.is_empty() => return Err(ParseError::Missing("folder")),
            Keyword::Open => return Ok(Self::Open(rest.into())),
            Keyword::Tree => Self::Tree,
            Keyword::Toggle => Self::Toggle(args.parse("row")?),
            Keyword::Show => Self::Show(args.parse("row")?),
            Keyword::Hide => Self::Hide(args.parse("row")?),
            Keyword::Up => Self::Up(args.parse("row")?),
            Keyword::Down => Self::Down(args.parse("row")?),
            Keyword::Move => {
                let row = args.parse("row")?;
                let parent = match args.next("parent")? {
                    "root" => Parent::Root,
                    other => Parent::Row(other.parse().map_err(|_| ParseError::Invalid {
                        what: "parent",
                        value: other.to_owned(),
                    })?),
                };
                let index = args.parse("index")?;
                Self::Move { row, parent, index }
            }
            Keyword::Zoom => {
                let direction = args.parse("direction")?;
                let x = args.parse("x")?;
                let y = args.parse("y")?;
                Self::Zoom {
                    direction,
                    cursor: cgmath::point2(x, y),
                }
            }
            Keyword::Pan => {
                let dx = args.parse("dx")?;
                let dy = args.parse("dy")?;
                Self::Pan(cgmath::vec2(dx, dy))
            }
            Keyword::View => Self::View,
            Keyword::Export => Self::Export,
            Keyword::Help => Self::Help,
            Keyword::Quit => Self::Quit,
        };
        args.finish()?;
        Ok(command)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ShellError {
    #[error("no row {0}, see `tree`")]
    NoSuchRow(usize),
    #[error("row {0} is not a group")]
    NotAGroup(usize),
    #[error(transparent)]
    Composer(#[from] ComposerError),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Render the graph as numbered rows, bottom layer first, children indented under their group.
///
/// `[x]` marks a node's own visibility, `[-]` a node switched on but hidden by a group above it.
#[must_use]
pub fn format_tree(graph: &LayerGraph) -> String {
    use std::fmt::Write;
    let rows = graph.iter();
    let mut out = String::new();
    for (number, row) in rows.iter().enumerate() {
        let mark = match (row.data.visible(), graph.effective_visible(row.id)) {
            (false, _) => ' ',
            (true, Ok(true)) => 'x',
            (true, _) => '-',
        };
        let suffix = if row.data.is_group() { "/" } else { "" };
        let _ = writeln!(
            out,
            "{:>3} {:indent$}[{mark}] {}{suffix}",
            number + 1,
            "",
            row.data.name(),
            indent = row.depth * 2,
        );
    }
    out
}

pub struct Shell {
    composer: Composer,
}
impl Shell {
    #[must_use]
    pub fn new(composer: Composer) -> Self {
        Self { composer }
    }
    #[must_use]
    pub fn composer(&self) -> &Composer {
        &self.composer
    }
    /// Resolve a 1-based row number from `tree`.
    fn row(&self, row: usize) -> Result<AnyID, ShellError> {
        row.checked_sub(1)
            .and_then(|idx| self.composer.graph().iter().get(idx).map(|row| row.id))
            .ok_or(ShellError::NoSuchRow(row))
    }
    pub fn execute(
        &mut self,
        command: Command,
        out: &mut impl std::io::Write,
    ) -> Result<Flow, ShellError> {
        match command {
            Command::Open(folder) => {
                self.composer.set_folder(folder)?;
                write!(out, "{}", format_tree(self.composer.graph()))?;
            }
            Command::Tree => {
                if self.composer.graph().is_empty() {
                    writeln!(out, "(no layers)")?;
                } else {
                    write!(out, "{}", format_tree(self.composer.graph()))?;
                }
            }
            Command::Toggle(row) => {
                let id = self.row(row)?;
                let visible = self.composer.toggle(id)?;
                writeln!(out, "row {row} {}", if visible { "shown" } else { "hidden" })?;
            }
            Command::Show(row) => {
                let id = self.row(row)?;
                self.composer.set_visible(id, true)?;
            }
            Command::Hide(row) => {
                let id = self.row(row)?;
                self.composer.set_visible(id, false)?;
            }
            Command::Up(row) => {
                let id = self.row(row)?;
                if !self.composer.move_up(id)? {
                    writeln!(out, "row {row} is already first")?;
                }
            }
            Command::Down(row) => {
                let id = self.row(row)?;
                if !self.composer.move_down(id)? {
                    writeln!(out, "row {row} is already last")?;
                }
            }
            Command::Move { row, parent, index } => {
                let target = self.row(row)?;
                let destination = match parent {
                    Parent::Root => Location::IndexIntoRoot(index),
                    Parent::Row(parent) => {
                        let group = self.row(parent)?.group().ok_or(ShellError::NotAGroup(parent))?;
                        Location::IndexIntoGroup(group, index)
                    }
                };
                self.composer.reparent(target, destination)?;
                write!(out, "{}", format_tree(self.composer.graph()))?;
            }
            Command::Zoom { direction, cursor } => {
                let applied = match direction {
                    ZoomDirection::In => self.composer.zoom_in(cursor),
                    ZoomDirection::Out => self.composer.zoom_out(cursor),
                };
                if !applied {
                    writeln!(out, "nothing to zoom")?;
                }
            }
            Command::Pan(delta) => self.composer.pan(delta),
            Command::View => {
                let view = self.composer.view();
                writeln!(
                    out,
                    "scale {:.3}, offset ({:.1}, {:.1})",
                    view.scale(),
                    view.offset.x,
                    view.offset.y
                )?;
                match self.composer.composite() {
                    Some(composite) => {
                        let size = view.display_size(composite.width(), composite.height());
                        writeln!(
                            out,
                            "composite {}x{}, displayed at {:.1}x{:.1}",
                            composite.width(),
                            composite.height(),
                            size.x,
                            size.y
                        )?;
                    }
                    None => writeln!(out, "no composite")?,
                }
            }
            Command::Export => {
                let path = self.composer.export()?;
                writeln!(out, "saved {}", path.display())?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}
