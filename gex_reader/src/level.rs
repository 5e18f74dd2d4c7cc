use std::{
	collections::{hash_map::Entry, HashMap},
	f32::consts::PI,
	fs,
	path::Path,
};
use glam::{i16vec3, vec2, vec3, Vec2};
use log::{debug, warn};
use nonmax::NonMaxU16;
use crate::{
	cursor::Cursor,
	model::{Instance, Level, Model, Polygon, PolygonFlags, Texture, Vertex, LEVEL_MODEL_ADDRESS},
	names,
	packer::{self, ImageInfo},
	texture,
	DecodeError,
};

//header fields, relative to the data origin
const GEOMETRY_ADDRESS_OFFSET: usize = 0x00;
const MODEL_TABLE_OFFSET: usize = 0x3C;
const OBJECT_COUNT_OFFSET: usize = 0x78;
const OBJECT_TABLE_OFFSET: usize = 0x7C;
const NAME_TAG_OFFSET: usize = 0x88;
const NAME_VARIANT_OFFSET: usize = 0x90;

const VERTEX_STRIDE: usize = 12;
const LEVEL_POLYGON_STRIDE: usize = 0x14;
const OBJECT_POLYGON_STRIDE: usize = 0x0C;
const INSTANCE_STRIDE: usize = 0x30;

/// Material record addresses of 0xFFFF mark untextured polygons.
const NO_MATERIAL: u32 = 0xFFFF;

/// Rotations are stored as 1/2048ths of a quarter-turn base.
const ROTATION_SCALE: f32 = PI / 2048.0;
/// Positions are stored in millimeter-like units.
const POSITION_SCALE: f32 = 0.001;

/// Every address stored in a level file is relative to this computed origin:
/// the header seed rounded up to the next 512-byte unit, then rescaled to
/// 2048-byte sectors.
pub fn data_origin(header: u32) -> u32 {
	((header + 0x200) >> 9) << 11
}

/// Placement lookup for UV remapping, keyed by texture index.
struct AtlasMap {
	/// Pixel origin and dimensions per placed texture.
	placements: Vec<Option<(Vec2, Vec2)>>,
	atlas_size: f32,
}

impl AtlasMap {
	fn new(image_infos: &[ImageInfo], atlas_size: u32) -> Self {
		let mut placements = vec![None; image_infos.len()];
		for info in image_infos {
			placements[info.tag] = info
				.pos
				.map(|pos| (pos.as_vec2(), vec2(info.width as f32, info.height as f32)));
		}
		Self { placements, atlas_size: atlas_size as f32 }
	}

	/// Raw 0-1 coords into atlas space via the material's placement.
	/// Materials without a placement keep their raw coords.
	fn remap(&self, material: u16, uv: Vec2) -> Vec2 {
		match self.placements.get(material as usize) {
			Some(&Some((origin, size))) => (uv * size + origin) / self.atlas_size,
			_ => uv,
		}
	}
}

/// Inline material record: three uv byte pairs and the texture id.
fn read_material(
	cur: &mut Cursor,
	origin: usize,
	address: u32,
	atlas: &AtlasMap,
) -> Result<(Option<NonMaxU16>, [Vec2; 3]), DecodeError> {
	let saved = cur.base();
	cur.seek(origin + address as usize);
	let material = cur.read::<u16>(6)?;
	let mut uvs = [Vec2::ZERO; 3];
	for (index, uv) in uvs.iter_mut().enumerate() {
		let u = cur.read::<u8>(index * 4)? as f32 / 255.0;
		let v = cur.read::<u8>(index * 4 + 1)? as f32 / 255.0;
		*uv = atlas.remap(material, vec2(u, v));
	}
	cur.seek(saved);
	let material = NonMaxU16::new(material);
	if let Some(id) = material {
		if id.get() as usize >= atlas.placements.len() {
			warn!("polygon references texture {} of {}", id.get(), atlas.placements.len());
		}
	}
	Ok((material, uvs))
}

fn read_vertices(cur: &Cursor, count: u32, force_opaque: bool) -> Result<Vec<Vertex>, DecodeError> {
	let mut vertices = Vec::with_capacity(count as usize);
	for index in 0..count as usize {
		let at = index * VERTEX_STRIDE;
		let x = cur.read::<i16>(at)?;
		let z = cur.read::<i16>(at + 2)?;
		let y = cur.read::<i16>(at + 4)?;
		let normal_id = cur.read::<u16>(at + 6)?;
		let color = [
			cur.read::<u8>(at + 8)?,
			cur.read::<u8>(at + 9)?,
			cur.read::<u8>(at + 10)?,
			if force_opaque { 255 } else { cur.read::<u8>(at + 11)? },
		];
		vertices.push(Vertex {
			//stored z negates to flip handedness
			pos: i16vec3(x, y, z.wrapping_neg()),
			raw_pos: i16vec3(x, y, z),
			normal_id,
			color,
		});
	}
	Ok(vertices)
}

fn read_level_geometry(
	cur: &mut Cursor,
	origin: usize,
	address: u32,
	atlas: &AtlasMap,
) -> Result<Model, DecodeError> {
	cur.seek(origin + address as usize);
	let _bsp_address = cur.read_seek::<u32>(0)?;
	let vertex_count = cur.read_seek::<u32>(0x14)?;
	let polygon_count = cur.read_seek::<u32>(0)?;
	let _vertex_color_count = cur.read_seek::<u32>(0)?;
	let vertex_address = cur.read_seek::<u32>(0)?;
	let polygon_address = cur.read_seek::<u32>(0)?;
	let _vertex_color_address = cur.read_seek::<u32>(0)?;
	let _material_address = cur.read_seek::<u32>(0)?;
	let mut model = Model::new(LEVEL_MODEL_ADDRESS);
	cur.seek(origin + vertex_address as usize);
	model.vertices = read_vertices(cur, vertex_count, false)?;
	cur.seek(origin + polygon_address as usize);
	for index in 0..polygon_count as usize {
		let at = index * LEVEL_POLYGON_STRIDE;
		let vertex_indices = [
			cur.read::<u16>(at)?,
			cur.read::<u16>(at + 2)?,
			cur.read::<u16>(at + 4)?,
		];
		let flags = PolygonFlags(cur.read::<u16>(at + 6)?);
		let material_address = cur.read::<u32>(at + 0x10)?;
		let (material, uvs) = if material_address != NO_MATERIAL && !flags.untextured() {
			read_material(cur, origin, material_address, atlas)?
		} else {
			(None, [Vec2::ZERO; 3])
		};
		model.polygons.push(Polygon { vertex_indices, flags, material, uvs });
	}
	Ok(model)
}

fn read_object_geometry(
	cur: &mut Cursor,
	origin: usize,
	address: u32,
	atlas: &AtlasMap,
) -> Result<Model, DecodeError> {
	cur.seek(origin + address as usize);
	let vertex_count = cur.read::<u16>(0x00)?;
	let vertex_address = cur.read::<u32>(0x04)?;
	let polygon_count = cur.read::<u16>(0x08)?;
	let polygon_address = cur.read::<u32>(0x0C)?;
	let _bone_count = cur.read::<u16>(0x10)?;
	let _bone_address = cur.read::<u32>(0x14)?;
	//TODO: resolve animated material ids through this table once its
	//semantics are mapped; today the id reads the same either way
	let _animated_table_address = cur.read::<u32>(0x18)?;
	let mut model = Model::new(address);
	cur.seek(origin + vertex_address as usize);
	model.vertices = read_vertices(cur, vertex_count as u32, true)?;
	cur.seek(origin + polygon_address as usize);
	for index in 0..polygon_count as usize {
		let at = index * OBJECT_POLYGON_STRIDE;
		let vertex_indices = [
			cur.read::<u16>(at)?,
			cur.read::<u16>(at + 2)?,
			cur.read::<u16>(at + 4)?,
		];
		let flags = PolygonFlags(cur.read::<u16>(at + 6)?);
		let material_address = cur.read::<u32>(at + 8)?;
		let (material, uvs) = if material_address != NO_MATERIAL {
			read_material(cur, origin, material_address, atlas)?
		} else {
			(None, [Vec2::ZERO; 3])
		};
		model.polygons.push(Polygon { vertex_indices, flags, material, uvs });
	}
	Ok(model)
}

/// Walk the instance table, decoding each referenced model the first time an
/// instance names its address.
fn read_instances(
	cur: &mut Cursor,
	origin: usize,
	count: u32,
	table_address: u32,
	atlas: &AtlasMap,
	models: &mut Vec<Model>,
) -> Result<(), DecodeError> {
	let mut by_address = HashMap::<u32, usize>::new();
	for index in 0..count as usize {
		cur.seek(origin + table_address as usize + index * INSTANCE_STRIDE);
		let model_address = cur.read::<u32>(0x00)?;
		let rot = vec3(
			cur.read::<i16>(0x08)? as f32,
			cur.read::<i16>(0x0A)? as f32,
			cur.read::<i16>(0x0C)? as f32,
		) * ROTATION_SCALE;
		let pos = vec3(
			cur.read::<i16>(0x10)? as f32,
			cur.read::<i16>(0x12)? as f32,
			-(cur.read::<i16>(0x14)? as f32),
		) * POSITION_SCALE;
		let model_index = match by_address.entry(model_address) {
			Entry::Occupied(entry) => *entry.get(),
			Entry::Vacant(entry) => {
				let model = if model_address == 0 {
					Model::placeholder()
				} else {
					read_object_geometry(cur, origin, model_address, atlas)?
				};
				models.push(model);
				*entry.insert(models.len() - 1)
			}
		};
		models[model_index].instances.push(Instance { pos, rot, visible: true });
	}
	Ok(())
}

struct LoadedTextures {
	textures: Vec<Texture>,
	atlas: Texture,
	image_infos: Vec<ImageInfo>,
}

fn read_textures(path: &Path) -> Result<LoadedTextures, DecodeError> {
	let data = fs::read(path)?;
	let mut cur = Cursor::new(&data);
	let count = cur.read_adv::<u32>(0)?;
	//metadata pass: dimensions only, no pixel decode
	let mut records = Vec::with_capacity(count as usize);
	let mut image_infos = Vec::with_capacity(count as usize);
	for tag in 0..count as usize {
		let record = texture::read_record(&mut cur)?;
		let (width, height) = record.size();
		image_infos.push(ImageInfo::new(width, height, tag));
		let payload = cur.base();
		cur.skip(record.large_lod_bytes as usize);
		records.push((record, payload));
	}
	let atlas_size = packer::pack_images(&mut image_infos, packer::DEFAULT_SIZE_HINT);
	if atlas_size.is_none() {
		warn!("no atlas up to {} pixels fits {} textures; keeping the placeholder", packer::MAX_SIZE, count);
	}
	let mut atlas = Texture::checkerboard(atlas_size.unwrap_or(packer::DEFAULT_SIZE_HINT));
	let mut placements = vec![None; count as usize];
	for info in &image_infos {
		placements[info.tag] = info.pos;
	}
	//pixel pass: decode each payload and blit it into its assigned spot
	let mut textures = Vec::with_capacity(count as usize);
	for (tag, (record, payload)) in records.iter().enumerate() {
		cur.seek(*payload);
		let (width, height) = record.size();
		let texture = match texture::decode(&mut cur, record)? {
			Some(pixels) => Texture { width, height, pixels },
			None => Texture { width, height, pixels: vec![] },
		};
		if let Some(pos) = placements[tag] {
			atlas.blit(&texture, pos);
		}
		textures.push(texture);
	}
	Ok(LoadedTextures { textures, atlas, image_infos })
}

fn load_textures(path: &Path) -> LoadedTextures {
	match read_textures(path) {
		Ok(loaded) => loaded,
		Err(err) => {
			warn!("no usable texture file at {}: {}", path.display(), err);
			LoadedTextures {
				textures: vec![],
				atlas: Texture::checkerboard(packer::DEFAULT_SIZE_HINT),
				image_infos: vec![],
			}
		}
	}
}

/// Decode a level file and its texture companion into a fully-assembled
/// `Level`. The level file must parse completely; a missing or unusable
/// companion degrades to a placeholder atlas.
pub fn load_level(path: impl AsRef<Path>) -> Result<Level, DecodeError> {
	let path = path.as_ref();
	let data = fs::read(path)?;
	let mut cur = Cursor::new(&data);
	let origin = data_origin(cur.read::<u32>(0)?) as usize;
	cur.seek(origin);
	let geometry_address = cur.read::<u32>(GEOMETRY_ADDRESS_OFFSET)?;
	let _model_table_address = cur.read::<u32>(MODEL_TABLE_OFFSET)?;
	let object_count = cur.read::<u32>(OBJECT_COUNT_OFFSET)?;
	let object_table_address = cur.read::<u32>(OBJECT_TABLE_OFFSET)?;
	let name_tag = cur.read_bytes::<8>(NAME_TAG_OFFSET)?;
	let name_variant = cur.read::<u32>(NAME_VARIANT_OFFSET)?;
	let name = names::level_title(&name_tag, name_variant).to_string();
	debug!("loading {:?}: {} object instances", name, object_count);

	let LoadedTextures { textures, atlas, image_infos } = load_textures(&path.with_extension("vfx"));
	let atlas_map = AtlasMap::new(&image_infos, atlas.width);

	let mut models = vec![read_level_geometry(&mut cur, origin, geometry_address, &atlas_map)?];
	read_instances(&mut cur, origin, object_count, object_table_address, &atlas_map, &mut models)?;

	Ok(Level { name, models, textures, atlas, image_infos })
}

#[cfg(test)]
mod tests {
	use glam::uvec2;
	use super::*;

	#[test]
	fn data_origin_rounds_to_sector_boundaries() {
		assert_eq!(data_origin(0x1F6), 0x800);
		assert_eq!(data_origin(0), 0x800);
		assert_eq!(data_origin(511), 0x800);
		assert_eq!(data_origin(512), 0x1000);
		assert_eq!(data_origin(513), 0x1000);
	}

	#[test]
	fn remap_scales_into_the_placement() {
		let mut infos = vec![ImageInfo::new(32, 16, 0)];
		infos[0].pos = Some(uvec2(64, 32));
		let atlas = AtlasMap::new(&infos, 128);
		assert_eq!(atlas.remap(0, vec2(0.0, 0.0)), vec2(0.5, 0.25));
		assert_eq!(atlas.remap(0, vec2(1.0, 1.0)), vec2(0.75, 0.375));
		//ids past the table keep their raw coords
		assert_eq!(atlas.remap(5, vec2(0.25, 0.75)), vec2(0.25, 0.75));
	}

	#[test]
	fn remap_passes_unplaced_materials_through() {
		let infos = vec![ImageInfo::new(32, 16, 0)];
		let atlas = AtlasMap::new(&infos, 64);
		assert_eq!(atlas.remap(0, vec2(0.5, 0.5)), vec2(0.5, 0.5));
	}
}
