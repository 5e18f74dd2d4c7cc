use std::{fs, path::Path};
use anyhow::Result;
use gex_reader::{Level, Texture};
use image::{Rgba, RgbaImage};

fn to_image(texture: &Texture) -> RgbaImage {
	let mut img = RgbaImage::new(texture.width, texture.height);
	let count = (texture.width * texture.height) as usize;
	for (pos, pixel) in texture.pixels.iter().take(count).enumerate() {
		let channels = (*pixel * 255.0).to_array().map(|channel| channel as u8);
		img.put_pixel(pos as u32 % texture.width, pos as u32 / texture.width, Rgba(channels));
	}
	img
}

/// Write the atlas and each standalone texture as numbered PNGs.
pub fn save_level_images(level: &Level, out_dir: &Path) -> Result<()> {
	fs::create_dir_all(out_dir)?;
	to_image(&level.atlas).save(out_dir.join("atlas.png"))?;
	for (index, texture) in level.textures.iter().enumerate() {
		if texture.pixels.is_empty() {
			continue;
		}
		to_image(texture).save(out_dir.join(format!("texture_{}.png", index)))?;
	}
	Ok(())
}
