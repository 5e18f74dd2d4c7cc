use std::{cmp::Reverse, mem};
use glam::{uvec2, UVec2};

/// No candidate atlas grows beyond this edge length.
pub const MAX_SIZE: u32 = 4096;
pub const DEFAULT_SIZE_HINT: u32 = 64;

/// Dimensions of one image to pack and, once packing succeeds, the spot
/// assigned to it.
#[derive(Clone, Debug)]
pub struct ImageInfo {
	pub width: u32,
	pub height: u32,
	/// Top-left corner in the atlas. `None` until placed.
	pub pos: Option<UVec2>,
	/// Caller-side key tying this entry back to its source image.
	pub tag: usize,
}

impl ImageInfo {
	pub fn new(width: u32, height: u32, tag: usize) -> Self {
		Self { width, height, pos: None, tag }
	}
}

/// One horizontal band of the atlas: an image at `x`, sub-shelves stacked in
/// the unused space to its right.
struct Shelf {
	/// Index into the image list; the root holds none.
	image: Option<usize>,
	width: u32,
	x: u32,
	height: u32,
	height_used: u32,
	children: Vec<Shelf>,
}

impl Shelf {
	fn new(image: usize, size: UVec2, x: u32) -> Self {
		Self { image: Some(image), width: size.x, x, height: size.y, height_used: 0, children: vec![] }
	}

	fn root(size: u32) -> Self {
		Self { image: None, width: 0, x: 0, height: size, height_used: 0, children: vec![] }
	}

	fn add(&mut self, image: usize, size: UVec2, max: u32) -> bool {
		let column = self.x + self.width;
		for index in 0..self.children.len() {
			if self.children[index].add(image, size, max) {
				return true;
			}
			if size.y >= self.height_used && size.y <= self.height && self.fits_after_shift(size.x, max) {
				//the new image becomes a shelf at the head of this column and
				//the existing stack slides right of it
				let mut shelf = Shelf::new(image, size, self.children[index].x);
				shelf.children = mem::take(&mut self.children);
				for child in &mut shelf.children {
					child.shift(size.x);
				}
				shelf.height_used = self.height_used;
				self.height_used = shelf.height;
				self.children.push(shelf);
				return true;
			}
		}
		if self.height - self.height_used >= size.y && column + size.x <= max {
			self.children.push(Shelf::new(image, size, column));
			self.height_used += size.y;
			return true;
		}
		false
	}

	fn shift(&mut self, w: u32) {
		self.x += w;
		for child in &mut self.children {
			child.shift(w);
		}
	}

	/// Whether every shelf in this chain stays inside `max` after the column
	/// is pushed `w` to the right.
	fn fits_after_shift(&self, w: u32, max: u32) -> bool {
		if self.image.is_some() && self.x + w + self.width >= max {
			return false;
		}
		self.children.iter().all(|child| child.fits_after_shift(w, max))
	}

	fn export(&self, mut y: u32, images: &mut [ImageInfo]) {
		if let Some(image) = self.image {
			images[image].pos = Some(uvec2(self.x, y));
		}
		for child in &self.children {
			child.export(y, images);
			y += child.height;
		}
	}
}

fn try_pack(images: &mut [ImageInfo], size: u32) -> bool {
	let mut root = Shelf::root(size);
	for index in 0..images.len() {
		if !root.add(index, uvec2(images[index].width, images[index].height), size) {
			return false;
		}
	}
	root.export(0, images);
	true
}

/// Pack every image into the smallest power-of-two square that fits, growing
/// from `size_hint`. On success every entry's `pos` is set and its rectangle
/// lies fully inside the returned square; the list is left sorted tallest
/// first, ties in scan order. Returns `None` when nothing up to `MAX_SIZE`
/// fits.
pub fn pack_images(images: &mut [ImageInfo], size_hint: u32) -> Option<u32> {
	images.sort_by_key(|image| Reverse(image.height));
	//a zero hint would double forever
	let mut size = size_hint.max(1);
	while size <= MAX_SIZE {
		if try_pack(images, size) {
			return Some(size);
		}
		size <<= 1;
	}
	None
}
