mod save_image;

use std::{env, path::PathBuf};
use anyhow::{bail, Context, Result};
use gex_reader::load_level;

fn main() -> Result<()> {
	env_logger::init();
	let mut args = env::args().skip(1);
	let Some(level_path) = args.next() else {
		bail!("usage: gex_tool <level.dfx> [out_dir]");
	};
	let out_dir = args.next().map(PathBuf::from);

	let level = load_level(&level_path).with_context(|| format!("failed to load {}", level_path))?;

	let polygons: usize = level.models.iter().map(|model| model.polygons.len()).sum();
	let instances: usize = level.models.iter().map(|model| model.instances.len()).sum();
	println!("{}", level.name);
	println!("  models: {}", level.models.len());
	println!("  polygons: {}", polygons);
	println!("  instances: {}", instances);
	println!("  textures: {}", level.textures.len());
	println!("  atlas: {0}x{0}", level.atlas.width);

	if let Some(out_dir) = out_dir {
		save_image::save_level_images(&level, &out_dir)
			.with_context(|| format!("failed to export images to {}", out_dir.display()))?;
	}
	Ok(())
}
