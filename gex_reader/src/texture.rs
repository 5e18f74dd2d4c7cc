use glam::{vec4, Vec4};
use log::warn;
use crate::{cursor::Cursor, DecodeError};

/// Largest texture edge; LOD tags shift down from here.
pub const MAX_EDGE: u32 = 256;

/// Pixel format tags found in texture records.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Format {
	Yiq422,
	Argb1555,
	Argb4444,
}

impl Format {
	pub fn from_tag(tag: u32) -> Option<Self> {
		match tag {
			0x1 => Some(Self::Yiq422),
			0xB => Some(Self::Argb1555),
			0xC => Some(Self::Argb4444),
			_ => None,
		}
	}
}

/// Narrow-channel-compression lookup tables carried per texture by the
/// chroma-subsampled format.
#[derive(Clone)]
pub struct NccTable {
	pub y: [u8; 16],
	pub i: [[i16; 3]; 4],
	pub q: [[i16; 3]; 4],
}

/// Table entries are 9-bit two's-complement values stored in the low bits of
/// a wider field.
fn sign_extend_9(val: i16) -> i16 {
	if val & 0x100 != 0 {
		(val as u16 | 0xFF00) as i16
	} else {
		val
	}
}

pub struct TexRecord {
	pub small_lod: u32,
	pub large_lod: u32,
	pub aspect: u32,
	pub format: u32,
	pub ncc: NccTable,
	pub small_lod_bytes: u32,
	pub large_lod_bytes: u32,
}

impl TexRecord {
	/// Final dimensions from the LOD exponent and the aspect tag. The byte
	/// counts in the record derive from the same numbers, so this must agree
	/// with the encoder exactly.
	pub fn size(&self) -> (u32, u32) {
		image_size(self.large_lod, self.aspect)
	}
}

/// `edge = 256 >> lod`, squashed along one axis by the aspect tag.
/// Dimensions floor at 1.
pub fn image_size(lod: u32, aspect: u32) -> (u32, u32) {
	let edge = MAX_EDGE >> lod.min(8);
	let (w, h) = match aspect {
		0 => (edge, edge >> 3),
		1 => (edge, edge >> 2),
		2 => (edge, edge >> 1),
		4 => (edge >> 1, edge),
		5 => (edge >> 2, edge),
		6 => (edge >> 3, edge),
		//3 is square; unrecognized tags fall back to square
		_ => (edge, edge),
	};
	(w.max(1), h.max(1))
}

/// Read one texture record header, leaving the cursor on the encoded
/// payload.
pub fn read_record(cur: &mut Cursor) -> Result<TexRecord, DecodeError> {
	let small_lod = cur.read_adv::<u32>(0)?;
	let large_lod = cur.read_adv::<u32>(0)?;
	let aspect = cur.read_adv::<u32>(0)?;
	let format = cur.read_adv::<u32>(0)?;
	cur.read_adv::<u32>(0)?;//texture memory address, meaningless off-card
	let mut ncc = NccTable { y: [0; 16], i: [[0; 3]; 4], q: [[0; 3]; 4] };
	for val in &mut ncc.y {
		*val = cur.read_adv::<u8>(0)?;
	}
	for row in &mut ncc.i {
		for val in row {
			*val = cur.read_adv::<i16>(0)?;
		}
	}
	for row in &mut ncc.q {
		for val in row {
			*val = cur.read_adv::<i16>(0)?;
		}
	}
	for _ in 0..12 {
		cur.read_adv::<u32>(0)?;//reserved words
	}
	let small_lod_bytes = cur.read_adv::<u32>(0)?;
	let large_lod_bytes = cur.read_adv::<u32>(0)?;
	Ok(TexRecord { small_lod, large_lod, aspect, format, ncc, small_lod_bytes, large_lod_bytes })
}

/// 8-bit channels to the normalized output format.
fn rgba(r: u8, g: u8, b: u8, a: u8) -> Vec4 {
	vec4(r as f32, g as f32, b as f32, a as f32) / 255.0
}

fn decode_argb_4444(cur: &mut Cursor, record: &TexRecord) -> Result<Vec<Vec4>, DecodeError> {
	let count = record.large_lod_bytes as usize / 2;
	let mut pixels = Vec::with_capacity(count);
	for _ in 0..count {
		let pixel = cur.read_adv::<u16>(0)?;
		//each nibble doubles up to fill 8 bits
		let a = ((pixel >> 12) & 0xF) as u8 * 0x11;
		let r = ((pixel >> 8) & 0xF) as u8 * 0x11;
		let g = ((pixel >> 4) & 0xF) as u8 * 0x11;
		let b = (pixel & 0xF) as u8 * 0x11;
		pixels.push(rgba(r, g, b, a));
	}
	Ok(pixels)
}

fn decode_argb_1555(cur: &mut Cursor, record: &TexRecord) -> Result<Vec<Vec4>, DecodeError> {
	let count = record.large_lod_bytes as usize / 2;
	let mut pixels = Vec::with_capacity(count);
	for _ in 0..count {
		let pixel = cur.read_adv::<u16>(0)?;
		let a = if pixel & 0x8000 != 0 { 0xFF } else { 0 };
		//5-bit fields scale by 8 to match the encoder, not by 255/31
		let r = ((pixel >> 10) & 0x1F) as u8 * 8;
		let g = ((pixel >> 5) & 0x1F) as u8 * 8;
		let b = (pixel & 0x1F) as u8 * 8;
		pixels.push(rgba(r, g, b, a));
	}
	Ok(pixels)
}

fn decode_yiq_422(cur: &mut Cursor, record: &TexRecord) -> Result<Vec<Vec4>, DecodeError> {
	let mut i_table = record.ncc.i;
	let mut q_table = record.ncc.q;
	for row in i_table.iter_mut().chain(q_table.iter_mut()) {
		for val in row {
			*val = sign_extend_9(*val);
		}
	}
	let count = record.large_lod_bytes as usize;
	let mut pixels = Vec::with_capacity(count);
	for _ in 0..count {
		let encoded = cur.read_adv::<u8>(0)?;
		let y = record.ncc.y[(encoded >> 4) as usize] as i32;
		let i = &i_table[(encoded >> 2 & 0x3) as usize];
		let q = &q_table[(encoded & 0x3) as usize];
		let [r, g, b] = [0, 1, 2].map(|channel| {
			(y + i[channel] as i32 + q[channel] as i32).clamp(0, 255) as u8
		});
		pixels.push(rgba(r, g, b, 0xFF));
	}
	Ok(pixels)
}

/// Decode the payload the cursor sits on into normalized RGBA pixels.
/// Unknown format tags yield `None`: the texture stays blank and the load
/// carries on.
pub fn decode(cur: &mut Cursor, record: &TexRecord) -> Result<Option<Vec<Vec4>>, DecodeError> {
	match Format::from_tag(record.format) {
		Some(Format::Argb4444) => decode_argb_4444(cur, record).map(Some),
		Some(Format::Argb1555) => decode_argb_1555(cur, record).map(Some),
		Some(Format::Yiq422) => decode_yiq_422(cur, record).map(Some),
		None => {
			warn!("unknown texture format tag {:#x}", record.format);
			Ok(None)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(format: u32, large_lod_bytes: u32) -> TexRecord {
		TexRecord {
			small_lod: 8,
			large_lod: 5,
			aspect: 3,
			format,
			ncc: NccTable { y: [0; 16], i: [[0; 3]; 4], q: [[0; 3]; 4] },
			small_lod_bytes: 0,
			large_lod_bytes,
		}
	}

	#[test]
	fn lod_and_aspect_resolve_dimensions() {
		assert_eq!(image_size(0, 3), (256, 256));
		assert_eq!(image_size(3, 0), (32, 4));
		assert_eq!(image_size(1, 6), (16, 128));
		assert_eq!(image_size(8, 3), (1, 1));
		//narrow axes floor at a single pixel
		assert_eq!(image_size(8, 6), (1, 1));
		assert_eq!(image_size(6, 0), (4, 1));
	}

	#[test]
	fn argb_4444_doubles_nibbles() {
		let payload = 0xF84Cu16.to_le_bytes();
		let mut cur = Cursor::new(&payload);
		let pixels = decode_argb_4444(&mut cur, &record(0xC, 2)).unwrap();
		assert_eq!(pixels, [vec4(0x88 as f32, 0x44 as f32, 0xCC as f32, 0xFF as f32) / 255.0]);
	}

	#[test]
	fn argb_1555_splits_alpha_bit() {
		let payload = [0x8000u16.to_le_bytes(), 0x7FFFu16.to_le_bytes()].concat();
		let mut cur = Cursor::new(&payload);
		let pixels = decode_argb_1555(&mut cur, &record(0xB, 4)).unwrap();
		assert_eq!(pixels[0], vec4(0.0, 0.0, 0.0, 1.0));
		assert_eq!(pixels[1], vec4(0xF8 as f32, 0xF8 as f32, 0xF8 as f32, 0.0) / 255.0);
	}

	#[test]
	fn yiq_422_sign_extends_table_entries() {
		let mut rec = record(0x1, 2);
		rec.ncc.y[0xA] = 100;
		//0x1FF is -1 once the ninth bit is carried out
		rec.ncc.i[2] = [0x1FF, 50, 0x1F0];
		rec.ncc.q[1] = [10, 0x180, 200];
		//high nibble 0xA selects y, bits 3:2 the i row, bits 1:0 the q row
		let mut cur = Cursor::new(&[0xA9, 0x00]);
		let pixels = decode_yiq_422(&mut cur, &rec).unwrap();
		//r = 100 - 1 + 10, g = 100 + 50 - 128, b = 100 - 16 + 200, clamped
		assert_eq!(pixels[0], vec4(109.0, 22.0, 255.0, 255.0) / 255.0);
		//second byte indexes the zeroed table rows
		assert_eq!(pixels[1], vec4(0.0, 0.0, 0.0, 255.0) / 255.0);
	}

	#[test]
	fn unknown_format_yields_no_pixels() {
		let mut cur = Cursor::new(&[0; 4]);
		assert!(decode(&mut cur, &record(0x5, 4)).unwrap().is_none());
	}

	#[test]
	fn record_header_spans_140_bytes() {
		let mut bytes = vec![0u8; 160];
		bytes[0] = 8;
		bytes[4] = 5;
		bytes[8] = 3;
		bytes[12] = 0xC;
		bytes[132] = 16;
		bytes[136] = 128;
		let mut cur = Cursor::new(&bytes);
		let record = read_record(&mut cur).unwrap();
		assert_eq!(cur.base(), 140);
		assert_eq!(record.size(), (8, 8));
		assert_eq!(record.format, 0xC);
		assert_eq!(record.small_lod_bytes, 16);
		assert_eq!(record.large_lod_bytes, 128);
	}
}
