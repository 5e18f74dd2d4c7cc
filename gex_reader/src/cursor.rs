use byteorder::{ByteOrder, LE};
use crate::DecodeError;

/// Little-endian scalar that can be pulled out of a byte buffer.
pub trait Scalar: Copy {
	const WIDTH: usize;
	fn get(bytes: &[u8]) -> Self;
}

macro_rules! scalars {
	($($ty:ty: $width:literal, $get:expr;)*) => {
		$(impl Scalar for $ty {
			const WIDTH: usize = $width;
			fn get(bytes: &[u8]) -> Self {
				$get(bytes)
			}
		})*
	};
}

scalars! {
	u8: 1, |bytes: &[u8]| bytes[0];
	i8: 1, |bytes: &[u8]| bytes[0] as i8;
	u16: 2, LE::read_u16;
	i16: 2, LE::read_i16;
	u32: 4, LE::read_u32;
	i32: 4, LE::read_i32;
}

/// Random-access reader over a level or texture file. Every read is taken
/// relative to a movable base offset; values are stored little-endian on
/// disk and come back in host order.
pub struct Cursor<'a> {
	buf: &'a [u8],
	base: usize,
}

impl<'a> Cursor<'a> {
	pub fn new(buf: &'a [u8]) -> Self {
		Self { buf, base: 0 }
	}

	pub fn base(&self) -> usize {
		self.base
	}

	pub fn seek(&mut self, base: usize) {
		self.base = base;
	}

	pub fn skip(&mut self, num: usize) {
		self.base += num;
	}

	fn span(&self, offset: usize, width: usize) -> Result<&'a [u8], DecodeError> {
		self.base
			.checked_add(offset)
			.and_then(|at| self.buf.get(at..at.checked_add(width)?))
			.ok_or(DecodeError::OutOfBounds {
				offset: self.base.saturating_add(offset),
				width,
				len: self.buf.len(),
			})
	}

	/// Read the value `offset` bytes past the base. The base does not move.
	pub fn read<T: Scalar>(&self, offset: usize) -> Result<T, DecodeError> {
		Ok(T::get(self.span(offset, T::WIDTH)?))
	}

	/// Read the value `offset` bytes past the base, then move the base past
	/// the value.
	pub fn read_adv<T: Scalar>(&mut self, offset: usize) -> Result<T, DecodeError> {
		let val = self.read(offset)?;
		self.base += T::WIDTH;
		Ok(val)
	}

	/// Read the value `offset` bytes past the base, then move the base past
	/// both the gap and the value. Level geometry records are walked with
	/// this variant.
	pub fn read_seek<T: Scalar>(&mut self, offset: usize) -> Result<T, DecodeError> {
		let val = self.read(offset)?;
		self.base += offset + T::WIDTH;
		Ok(val)
	}

	pub fn read_bytes<const N: usize>(&self, offset: usize) -> Result<[u8; N], DecodeError> {
		let mut bytes = [0; N];
		bytes.copy_from_slice(self.span(offset, N)?);
		Ok(bytes)
	}
}
