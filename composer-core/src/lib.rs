pub mod blend;
pub mod cache;
pub mod catalog;
pub mod composer;
pub mod compositor;
pub mod export;
pub mod id;
pub mod state;
pub mod view_transform;

#[cfg(test)]
mod testing;

use id::FuzzID;
