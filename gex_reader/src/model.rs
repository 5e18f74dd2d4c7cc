use bitfield::bitfield;
use glam::{i16vec3, vec4, I16Vec3, UVec2, Vec2, Vec3, Vec4};
use nonmax::NonMaxU16;
use crate::packer::ImageInfo;

/// Address sentinel for the single level-geometry model.
pub const LEVEL_MODEL_ADDRESS: u32 = u32::MAX;
/// Address sentinel for the synthetic debug-cube model.
pub const PLACEHOLDER_MODEL_ADDRESS: u32 = u32::MAX - 1;

#[derive(Clone, Copy, Debug)]
pub struct Vertex {
	/// Position with the handedness fix applied.
	pub pos: I16Vec3,
	/// Position exactly as stored, for object-space billboard math.
	pub raw_pos: I16Vec3,
	pub normal_id: u16,
	/// Vertex color, RGBA. Alpha is forced opaque on object geometry.
	pub color: [u8; 4],
}

bitfield! {
	#[derive(Clone, Copy)]
	pub struct PolygonFlags(u16);
	/// Level geometry: rendered fully transparent.
	pub invisible, _: 7;
	/// Object geometry: material id goes through the animated texture table.
	pub animated, _: 8;
	/// Level geometry: untextured, the material lookup is skipped.
	pub untextured, _: 15;
}

#[derive(Clone)]
pub struct Polygon {
	pub vertex_indices: [u16; 3],
	pub flags: PolygonFlags,
	/// Index into `Level::textures`. `None` = no texture.
	pub material: Option<NonMaxU16>,
	/// Texture coords, in atlas space once the owning level's images are
	/// packed.
	pub uvs: [Vec2; 3],
}

/// One placement of a model within the level.
#[derive(Clone, Copy, Debug)]
pub struct Instance {
	pub pos: Vec3,
	/// Euler angles in radians.
	pub rot: Vec3,
	pub visible: bool,
}

pub struct Model {
	/// File address this model was decoded from; the de-duplication key for
	/// geometry sharing.
	pub address: u32,
	pub vertices: Vec<Vertex>,
	pub polygons: Vec<Polygon>,
	pub instances: Vec<Instance>,
}

impl Model {
	pub fn new(address: u32) -> Self {
		Self { address, vertices: vec![], polygons: vec![], instances: vec![] }
	}

	/// Debug cube bound to instances whose model pointer is null.
	pub fn placeholder() -> Self {
		const EXTENT: i16 = 500;
		const FACES: [[u16; 3]; 12] = [
			[0, 1, 2], [2, 1, 3],
			[4, 6, 5], [5, 6, 7],
			[0, 4, 1], [1, 4, 5],
			[2, 3, 6], [6, 3, 7],
			[0, 2, 4], [4, 2, 6],
			[1, 5, 3], [3, 5, 7],
		];
		let vertices = (0..8)
			.map(|corner: i16| {
				let pos = i16vec3(
					if corner & 1 == 0 { -EXTENT } else { EXTENT },
					if corner & 2 == 0 { -EXTENT } else { EXTENT },
					if corner & 4 == 0 { -EXTENT } else { EXTENT },
				);
				Vertex { pos, raw_pos: pos, normal_id: 0, color: [255; 4] }
			})
			.collect();
		let polygons = FACES
			.iter()
			.map(|&vertex_indices| Polygon {
				vertex_indices,
				flags: PolygonFlags(0),
				material: None,
				uvs: [Vec2::ZERO; 3],
			})
			.collect();
		Self { address: PLACEHOLDER_MODEL_ADDRESS, vertices, polygons, instances: vec![] }
	}
}

pub struct Texture {
	pub width: u32,
	pub height: u32,
	/// RGBA in [0, 1], row-major. Empty when the encoded format was unknown.
	pub pixels: Vec<Vec4>,
}

impl Texture {
	/// Magenta/purple checkerboard covering any region no image is blitted
	/// over.
	pub fn checkerboard(size: u32) -> Self {
		const CHECK: u32 = 64;
		let tones = [vec4(1.0, 0.0, 1.0, 1.0), vec4(0.5, 0.0, 0.5, 1.0)];
		let pixels = (0..size * size)
			.map(|index| {
				let (x, y) = (index % size, index / size);
				tones[((x / CHECK + y / CHECK) % 2) as usize]
			})
			.collect();
		Self { width: size, height: size, pixels }
	}

	/// Copy `src` over the region with top-left corner `pos`. The packer
	/// guarantees the region lies inside `self`; textures left without
	/// pixels are skipped.
	pub fn blit(&mut self, src: &Texture, pos: UVec2) {
		if src.pixels.len() < (src.width * src.height) as usize {
			return;
		}
		for y in 0..src.height {
			for x in 0..src.width {
				let to = (pos.y + y) * self.width + pos.x + x;
				self.pixels[to as usize] = src.pixels[(y * src.width + x) as usize];
			}
		}
	}
}

pub struct Level {
	pub name: String,
	/// The level-geometry model first, then object models in first-reference
	/// order.
	pub models: Vec<Model>,
	/// Decoded textures in file order.
	pub textures: Vec<Texture>,
	/// All textures consolidated into one square power-of-two image.
	pub atlas: Texture,
	/// Packed placements, sorted by the packer; `tag` is the texture index.
	pub image_infos: Vec<ImageInfo>,
}
