//! Primitive value codec for the XNB wire format.
//!
//! All multi-byte scalars are little-endian; floats are IEEE-754 single
//! precision. Integers in the object stream use the .NET 7-bit-continuation
//! variable-length encoding unless a layout calls for a fixed width. Strings
//! are varint-length-prefixed UTF-8 with no terminator.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::util::{BoundingSphere, Color, Error, Mat4, Quat, Result, Vec2, Vec3, Vec4};

/// Longest legal 7-bit encoding of a 32-bit value, matching
/// `BinaryReader.Read7BitEncodedInt`.
const MAX_VARINT_BYTES: u32 = 5;

/// Decoding side of the primitive codec, blanket-implemented for any
/// [`Read`] source.
pub trait XnbRead: Read {
    /// Read a variable-length unsigned integer: 7 payload bits per byte,
    /// high bit set while more bytes follow.
    fn read_7bit_encoded_int(&mut self) -> Result<u32> {
        let mut result = 0u32;
        let mut shift = 0u32;
        loop {
            if shift >= MAX_VARINT_BYTES * 7 {
                return Err(Error::invalid("7-bit encoded int is too long"));
            }
            let byte = self.read_u8()?;
            result |= ((byte & 0x7f) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    /// Read a varint-length-prefixed UTF-8 string.
    fn read_xnb_string(&mut self) -> Result<String> {
        let len = self.read_7bit_encoded_int()? as usize;
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Read a fixed-width little-endian i32.
    fn read_int32(&mut self) -> Result<i32> {
        Ok(self.read_i32::<LittleEndian>()?)
    }

    /// Read a fixed-width little-endian u32.
    fn read_uint32(&mut self) -> Result<u32> {
        Ok(self.read_u32::<LittleEndian>()?)
    }

    /// Read a single-precision float.
    fn read_single(&mut self) -> Result<f32> {
        Ok(self.read_f32::<LittleEndian>()?)
    }

    /// Read an X,Y pair of singles.
    fn read_vector2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_single()?, self.read_single()?))
    }

    /// Read an X,Y,Z triple of singles.
    fn read_vector3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(
            self.read_single()?,
            self.read_single()?,
            self.read_single()?,
        ))
    }

    /// Read an X,Y,Z,W quadruple of singles.
    fn read_vector4(&mut self) -> Result<Vec4> {
        Ok(Vec4::new(
            self.read_single()?,
            self.read_single()?,
            self.read_single()?,
            self.read_single()?,
        ))
    }

    /// Read a quaternion as X,Y,Z,W singles.
    fn read_quaternion(&mut self) -> Result<Quat> {
        Ok(Quat::from_xyzw(
            self.read_single()?,
            self.read_single()?,
            self.read_single()?,
            self.read_single()?,
        ))
    }

    /// Read a 4x4 matrix as 16 singles in M11..M44 order.
    ///
    /// XNA matrices use the row-vector convention, so their memory order maps
    /// directly onto glam's column array with translation landing in `w_axis`.
    fn read_matrix(&mut self) -> Result<Mat4> {
        let mut m = [0f32; 16];
        for v in &mut m {
            *v = self.read_single()?;
        }
        Ok(Mat4::from_cols_array(&m))
    }

    /// Read a packed color as R,G,B,A bytes.
    fn read_color(&mut self) -> Result<Color> {
        Ok(Color::new(
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
        ))
    }

    /// Read a bounding sphere as a Vector3 center followed by a radius.
    fn read_bounding_sphere(&mut self) -> Result<BoundingSphere> {
        Ok(BoundingSphere::new(self.read_vector3()?, self.read_single()?))
    }

    /// Read an exact number of raw bytes.
    fn read_byte_block(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<R: Read + ?Sized> XnbRead for R {}

/// Encoding side of the primitive codec, blanket-implemented for any
/// [`Write`] sink. Byte layouts match the producer tool exactly.
pub trait XnbWrite: Write {
    /// Write a variable-length unsigned integer.
    fn write_7bit_encoded_int(&mut self, mut value: u32) -> Result<()> {
        while value >= 0x80 {
            self.write_u8((value as u8 & 0x7f) | 0x80)?;
            value >>= 7;
        }
        self.write_u8(value as u8)?;
        Ok(())
    }

    /// Write a varint-length-prefixed UTF-8 string.
    fn write_xnb_string(&mut self, value: &str) -> Result<()> {
        self.write_7bit_encoded_int(value.len() as u32)?;
        self.write_all(value.as_bytes())?;
        Ok(())
    }

    /// Write a fixed-width little-endian i32.
    fn write_int32(&mut self, value: i32) -> Result<()> {
        Ok(self.write_i32::<LittleEndian>(value)?)
    }

    /// Write a fixed-width little-endian u32.
    fn write_uint32(&mut self, value: u32) -> Result<()> {
        Ok(self.write_u32::<LittleEndian>(value)?)
    }

    /// Write a single-precision float.
    fn write_single(&mut self, value: f32) -> Result<()> {
        Ok(self.write_f32::<LittleEndian>(value)?)
    }

    fn write_vector2(&mut self, v: Vec2) -> Result<()> {
        self.write_single(v.x)?;
        self.write_single(v.y)
    }

    fn write_vector3(&mut self, v: Vec3) -> Result<()> {
        self.write_single(v.x)?;
        self.write_single(v.y)?;
        self.write_single(v.z)
    }

    fn write_vector4(&mut self, v: Vec4) -> Result<()> {
        self.write_single(v.x)?;
        self.write_single(v.y)?;
        self.write_single(v.z)?;
        self.write_single(v.w)
    }

    fn write_quaternion(&mut self, q: Quat) -> Result<()> {
        self.write_single(q.x)?;
        self.write_single(q.y)?;
        self.write_single(q.z)?;
        self.write_single(q.w)
    }

    /// Write a 4x4 matrix as 16 singles in M11..M44 order.
    fn write_matrix(&mut self, m: Mat4) -> Result<()> {
        for v in m.to_cols_array() {
            self.write_single(v)?;
        }
        Ok(())
    }

    fn write_color(&mut self, c: Color) -> Result<()> {
        self.write_u8(c.r)?;
        self.write_u8(c.g)?;
        self.write_u8(c.b)?;
        self.write_u8(c.a)?;
        Ok(())
    }

    fn write_bounding_sphere(&mut self, s: &BoundingSphere) -> Result<()> {
        self.write_vector3(s.center)?;
        self.write_single(s.radius)
    }
}

impl<W: Write + ?Sized> XnbWrite for W {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_varint(value: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_7bit_encoded_int(value).unwrap();
        buf
    }

    #[test]
    fn test_varint_roundtrip() {
        for value in [0u32, 1, 0x7f, 0x80, 300, 0x3fff, 0x4000, 1_000_000, i32::MAX as u32, u32::MAX] {
            let buf = encode_varint(value);
            let decoded = Cursor::new(&buf).read_7bit_encoded_int().unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_varint_encoded_length() {
        // ceil(bits_needed / 7) bytes for every n > 0, one byte for zero
        assert_eq!(encode_varint(0).len(), 1);
        for value in [1u32, 0x7f, 0x80, 0x3fff, 0x4000, 0x1f_ffff, 0x20_0000, u32::MAX] {
            let bits = 32 - value.leading_zeros();
            let expected = bits.div_ceil(7) as usize;
            assert_eq!(encode_varint(value).len(), expected, "value {value:#x}");
        }
    }

    #[test]
    fn test_varint_known_bytes() {
        assert_eq!(encode_varint(0x7f), vec![0x7f]);
        assert_eq!(encode_varint(0x80), vec![0x80, 0x01]);
        assert_eq!(encode_varint(300), vec![0xac, 0x02]);
    }

    #[test]
    fn test_varint_too_long() {
        // Six continuation bytes can never be a valid u32
        let buf = [0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        let err = Cursor::new(&buf).read_7bit_encoded_int().unwrap_err();
        assert!(matches!(err, Error::InvalidStructure(_)));
    }

    #[test]
    fn test_varint_truncated() {
        let buf = [0x80];
        let err = Cursor::new(&buf).read_7bit_encoded_int().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_string_roundtrip() {
        let mut buf = Vec::new();
        buf.write_xnb_string("hello цвет").unwrap();
        assert_eq!(Cursor::new(&buf).read_xnb_string().unwrap(), "hello цвет");

        let mut buf = Vec::new();
        buf.write_xnb_string("").unwrap();
        assert_eq!(buf, vec![0]);
        assert_eq!(Cursor::new(&buf).read_xnb_string().unwrap(), "");
    }

    #[test]
    fn test_vector_roundtrip() {
        let values = [0.0f32, -0.0, 1.5, -1.5, f32::MIN, f32::MAX, f32::MIN_POSITIVE];
        for &v in &values {
            let mut buf = Vec::new();
            buf.write_vector3(Vec3::new(v, -v, v * 0.5)).unwrap();
            let out = Cursor::new(&buf).read_vector3().unwrap();
            assert_eq!(out.x.to_bits(), v.to_bits());
            assert_eq!(out.y.to_bits(), (-v).to_bits());
        }

        let mut buf = Vec::new();
        buf.write_vector2(Vec2::new(1.0, 2.0)).unwrap();
        buf.write_vector4(Vec4::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        let mut cur = Cursor::new(&buf);
        assert_eq!(cur.read_vector2().unwrap(), Vec2::new(1.0, 2.0));
        assert_eq!(cur.read_vector4().unwrap(), Vec4::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_quaternion_roundtrip() {
        let q = Quat::from_xyzw(0.1, -0.2, 0.3, 0.9);
        let mut buf = Vec::new();
        buf.write_quaternion(q).unwrap();
        assert_eq!(Cursor::new(&buf).read_quaternion().unwrap(), q);
    }

    #[test]
    fn test_matrix_roundtrip_and_layout() {
        let m = Mat4::from_cols_array(&[
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
        ]);
        let mut buf = Vec::new();
        buf.write_matrix(m).unwrap();
        assert_eq!(buf.len(), 64);
        // M11 is the first single on the wire
        assert_eq!(f32::from_le_bytes(buf[0..4].try_into().unwrap()), 1.0);
        assert_eq!(Cursor::new(&buf).read_matrix().unwrap(), m);

        // Translation occupies the M41..M43 slots
        let t = Mat4::from_translation(Vec3::new(7.0, 8.0, 9.0));
        let mut buf = Vec::new();
        buf.write_matrix(t).unwrap();
        assert_eq!(f32::from_le_bytes(buf[48..52].try_into().unwrap()), 7.0);
    }

    #[test]
    fn test_color_roundtrip() {
        let c = Color::new(1, 2, 3, 254);
        let mut buf = Vec::new();
        buf.write_color(c).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 254]);
        assert_eq!(Cursor::new(&buf).read_color().unwrap(), c);
    }

    #[test]
    fn test_bounding_sphere_roundtrip() {
        let s = BoundingSphere::new(Vec3::new(1.0, -2.0, 3.0), 4.5);
        let mut buf = Vec::new();
        buf.write_bounding_sphere(&s).unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(Cursor::new(&buf).read_bounding_sphere().unwrap(), s);
    }

    #[test]
    fn test_fixed_width_ints() {
        let mut buf = Vec::new();
        buf.write_int32(-5).unwrap();
        buf.write_uint32(0xdead_beef).unwrap();
        let mut cur = Cursor::new(&buf);
        assert_eq!(cur.read_int32().unwrap(), -5);
        assert_eq!(cur.read_uint32().unwrap(), 0xdead_beef);
    }
}
