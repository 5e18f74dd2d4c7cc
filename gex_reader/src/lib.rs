pub mod cursor;
pub mod level;
pub mod model;
pub mod names;
pub mod packer;
pub mod texture;

use std::io;
use thiserror::Error;

/// Ways a level or texture file can fail to decode. Degradable conditions
/// (unknown pixel formats, material ids with no matching texture, packing
/// exhaustion) are logged and worked around instead of surfacing here.
#[derive(Debug, Error)]
pub enum DecodeError {
	#[error(transparent)]
	Io(#[from] io::Error),
	#[error("read of {width} bytes at {offset:#x} lands outside the {len:#x}-byte buffer")]
	OutOfBounds { offset: usize, width: usize, len: usize },
}

pub use level::{data_origin, load_level};
pub use model::{Instance, Level, Model, Polygon, PolygonFlags, Texture, Vertex};
pub use packer::{pack_images, ImageInfo};
