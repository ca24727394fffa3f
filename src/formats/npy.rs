//! .npy reader - NumPy's binary array format, restricted to 2-D numeric arrays
//!
//! Layout: 6-byte magic, major/minor version bytes, header length (u16 LE for
//! v1, u32 LE for v2/v3), an ASCII Python dict literal padded to 64 bytes,
//! then the raw array data.

use thiserror::Error;

use crate::core::model::Matrix;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const PREAMBLE_V1: usize = 10; // magic + version + u16 header len
const PREAMBLE_V2: usize = 12; // magic + version + u32 header len

#[derive(Debug, Error, PartialEq)]
pub enum NpyError {
    #[error("not a .npy file (bad magic)")]
    BadMagic,

    #[error("unsupported .npy version {0}.{1}")]
    UnsupportedVersion(u8, u8),

    #[error("file truncated: need {needed} bytes, have {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("malformed header: {0}")]
    BadHeader(String),

    #[error("unsupported dtype '{0}'")]
    UnsupportedDtype(String),

    #[error("expected a 2-D array, got shape {0:?}")]
    NotTwoDimensional(Vec<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Bool,
    I1,
    I2,
    I4,
    I8,
    U1,
    U2,
    U4,
    U8,
    F4,
    F8,
}

impl Scalar {
    fn size(self) -> usize {
        match self {
            Scalar::Bool | Scalar::I1 | Scalar::U1 => 1,
            Scalar::I2 | Scalar::U2 => 2,
            Scalar::I4 | Scalar::U4 | Scalar::F4 => 4,
            Scalar::I8 | Scalar::U8 | Scalar::F8 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dtype {
    scalar: Scalar,
    big_endian: bool,
}

impl Dtype {
    /// Parse a simple descr such as `<f8`, `>i4`, `|u1`, `|b1`
    fn parse(descr: &str) -> Result<Self, NpyError> {
        let unsupported = || NpyError::UnsupportedDtype(descr.to_string());

        let mut chars = descr.chars();
        let order = chars.next().ok_or_else(unsupported)?;
        let kind = chars.next().ok_or_else(unsupported)?;
        let size: usize = chars.as_str().parse().map_err(|_| unsupported())?;

        let scalar = match (kind, size) {
            ('b', 1) => Scalar::Bool,
            ('i', 1) => Scalar::I1,
            ('i', 2) => Scalar::I2,
            ('i', 4) => Scalar::I4,
            ('i', 8) => Scalar::I8,
            ('u', 1) => Scalar::U1,
            ('u', 2) => Scalar::U2,
            ('u', 4) => Scalar::U4,
            ('u', 8) => Scalar::U8,
            ('f', 4) => Scalar::F4,
            ('f', 8) => Scalar::F8,
            _ => return Err(unsupported()),
        };

        let big_endian = match order {
            '<' => false,
            '>' => true,
            '=' => cfg!(target_endian = "big"),
            '|' if size == 1 => false,
            _ => return Err(unsupported()),
        };

        Ok(Self { scalar, big_endian })
    }

    /// Decode one element; `bytes` is exactly `scalar.size()` long
    fn decode(self, bytes: &[u8]) -> f64 {
        let mut le = [0u8; 8];
        le[..bytes.len()].copy_from_slice(bytes);
        if self.big_endian {
            le[..bytes.len()].reverse();
        }
        let [b0, b1, b2, b3, ..] = le;

        match self.scalar {
            Scalar::Bool => f64::from(u8::from(b0 != 0)),
            Scalar::I1 => f64::from(b0 as i8),
            Scalar::I2 => f64::from(i16::from_le_bytes([b0, b1])),
            Scalar::I4 => f64::from(i32::from_le_bytes([b0, b1, b2, b3])),
            Scalar::I8 => i64::from_le_bytes(le) as f64,
            Scalar::U1 => f64::from(b0),
            Scalar::U2 => f64::from(u16::from_le_bytes([b0, b1])),
            Scalar::U4 => f64::from(u32::from_le_bytes([b0, b1, b2, b3])),
            Scalar::U8 => u64::from_le_bytes(le) as f64,
            Scalar::F4 => f64::from(f32::from_le_bytes([b0, b1, b2, b3])),
            Scalar::F8 => f64::from_le_bytes(le),
        }
    }
}

#[derive(Debug, PartialEq)]
struct Header {
    dtype: Dtype,
    fortran_order: bool,
    shape: Vec<usize>,
}

impl Header {
    fn parse(text: &str) -> Result<Self, NpyError> {
        let descr = dict_value(text, "descr")?;
        // Structured dtypes are written as a list of fields, not a string
        let descr = quoted(descr).ok_or_else(|| NpyError::UnsupportedDtype("structured".to_string()))?;
        let dtype = Dtype::parse(descr)?;

        let fortran_order = match dict_value(text, "fortran_order")? {
            v if v.starts_with("True") => true,
            v if v.starts_with("False") => false,
            v => return Err(NpyError::BadHeader(format!("fortran_order is {v:?}"))),
        };

        let shape_src = dict_value(text, "shape")?;
        let inner = shape_src
            .strip_prefix('(')
            .and_then(|s| s.split_once(')'))
            .map(|(inner, _)| inner)
            .ok_or_else(|| NpyError::BadHeader(format!("shape is {shape_src:?}")))?;
        let shape = inner
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.trim_end_matches('L')
                    .parse::<usize>()
                    .map_err(|_| NpyError::BadHeader(format!("bad dimension {s:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            dtype,
            fortran_order,
            shape,
        })
    }
}

/// Text following `'key':` in the header dict, leading whitespace stripped
fn dict_value<'a>(text: &'a str, key: &str) -> Result<&'a str, NpyError> {
    for quote in ['\'', '"'] {
        let needle = format!("{quote}{key}{quote}");
        if let Some(pos) = text.find(&needle) {
            let rest = text[pos + needle.len()..].trim_start();
            if let Some(value) = rest.strip_prefix(':') {
                return Ok(value.trim_start());
            }
        }
    }
    Err(NpyError::BadHeader(format!("missing key '{key}'")))
}

/// Contents of a leading single- or double-quoted string
fn quoted(value: &str) -> Option<&str> {
    let quote = value.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &value[1..];
    rest.find(quote).map(|end| &rest[..end])
}

/// Parse a .npy buffer into a row-major [`Matrix`]
pub fn read_npy(bytes: &[u8]) -> Result<Matrix, NpyError> {
    if bytes.len() < PREAMBLE_V1 || !bytes.starts_with(MAGIC) {
        return Err(NpyError::BadMagic);
    }

    let (major, minor) = (bytes[6], bytes[7]);
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, PREAMBLE_V1),
        2 | 3 => {
            ensure_len(bytes, PREAMBLE_V2)?;
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, PREAMBLE_V2)
        }
        _ => return Err(NpyError::UnsupportedVersion(major, minor)),
    };

    let data_start = header_start + header_len;
    ensure_len(bytes, data_start)?;
    let text = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| NpyError::BadHeader("header is not valid text".to_string()))?;
    let header = Header::parse(text)?;

    let (rows, cols) = match header.shape.as_slice() {
        &[rows, cols] => (rows, cols),
        _ => return Err(NpyError::NotTwoDimensional(header.shape.clone())),
    };

    let item = header.dtype.scalar.size();
    let count = rows
        .checked_mul(cols)
        .ok_or_else(|| NpyError::BadHeader(format!("shape ({rows}, {cols}) overflows")))?;
    let data_len = count
        .checked_mul(item)
        .ok_or_else(|| NpyError::BadHeader(format!("shape ({rows}, {cols}) overflows")))?;
    let data_end = data_start
        .checked_add(data_len)
        .ok_or_else(|| NpyError::BadHeader(format!("shape ({rows}, {cols}) overflows")))?;
    ensure_len(bytes, data_end)?;

    let values: Vec<f64> = bytes[data_start..data_end]
        .chunks_exact(item)
        .map(|chunk| header.dtype.decode(chunk))
        .collect();

    let data = if header.fortran_order {
        // Column-major on disk: element (r, c) sits at c * rows + r
        let mut row_major = Vec::with_capacity(count);
        for r in 0..rows {
            for c in 0..cols {
                row_major.push(values[c * rows + r]);
            }
        }
        row_major
    } else {
        values
    };

    Matrix::from_row_major(rows, cols, data)
        .ok_or_else(|| NpyError::BadHeader("element count does not match shape".to_string()))
}

fn ensure_len(bytes: &[u8], needed: usize) -> Result<(), NpyError> {
    if bytes.len() < needed {
        Err(NpyError::Truncated {
            needed,
            actual: bytes.len(),
        })
    } else {
        Ok(())
    }
}

/// Encode a v1.0 .npy buffer
#[cfg(test)]
pub(crate) fn encode_v1(descr: &str, fortran_order: bool, shape: &[usize], data: &[u8]) -> Vec<u8> {
    let shape_text = match shape {
        [n] => format!("({n},)"),
        dims => format!(
            "({})",
            dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        ),
    };
    let order = if fortran_order { "True" } else { "False" };
    let mut dict = format!("{{'descr': '{descr}', 'fortran_order': {order}, 'shape': {shape_text}, }}");
    // Pad so that the data starts on a 64-byte boundary, newline-terminated
    while (PREAMBLE_V1 + dict.len() + 1) % 64 != 0 {
        dict.push(' ');
    }
    dict.push('\n');

    let mut out = Vec::with_capacity(PREAMBLE_V1 + dict.len() + data.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend_from_slice(data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f8_bytes(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_read_f8_c_order() {
        let bytes = encode_v1("<f8", false, &[2, 2], &f8_bytes(&[0.0, 1.5, 1.5, 0.0]));
        let m = read_npy(&bytes).unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 2));
        assert_eq!(m.get(0, 1), Some(1.5));
        assert_eq!(m.get(1, 1), Some(0.0));
        assert!(m.is_square());
    }

    #[test]
    fn test_read_fortran_order_is_transposed() {
        // Column-major [[1, 2, 3], [4, 5, 6]]
        let bytes = encode_v1("<f8", true, &[2, 3], &f8_bytes(&[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]));
        let m = read_npy(&bytes).unwrap();
        assert_eq!(m.row(0), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(m.row(1), Some(&[4.0, 5.0, 6.0][..]));
    }

    #[test]
    fn test_read_integer_and_float32_dtypes() {
        let data: Vec<u8> = [-3i32, 7, 12, 0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let m = read_npy(&encode_v1("<i4", false, &[2, 2], &data)).unwrap();
        assert_eq!(m.get(0, 0), Some(-3.0));
        assert_eq!(m.get(1, 0), Some(12.0));

        let data: Vec<u8> = [600i64, 1200].iter().flat_map(|v| v.to_be_bytes()).collect();
        let m = read_npy(&encode_v1(">i8", false, &[1, 2], &data)).unwrap();
        assert_eq!(m.get(0, 1), Some(1200.0));

        let data: Vec<u8> = [0.25f32, 2.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let m = read_npy(&encode_v1("<f4", false, &[2, 1], &data)).unwrap();
        assert_eq!(m.get(1, 0), Some(2.0));

        let m = read_npy(&encode_v1("|u1", false, &[1, 3], &[0, 128, 255])).unwrap();
        assert_eq!(m.row(0), Some(&[0.0, 128.0, 255.0][..]));

        let m = read_npy(&encode_v1("|b1", false, &[1, 2], &[1, 0])).unwrap();
        assert_eq!(m.row(0), Some(&[1.0, 0.0][..]));
    }

    #[test]
    fn test_read_v2_header() {
        let v1 = encode_v1("<f8", false, &[1, 1], &f8_bytes(&[42.0]));
        let header_len = u16::from_le_bytes([v1[8], v1[9]]) as u32;
        let mut v2 = Vec::new();
        v2.extend_from_slice(MAGIC);
        v2.extend_from_slice(&[2, 0]);
        v2.extend_from_slice(&header_len.to_le_bytes());
        v2.extend_from_slice(&v1[PREAMBLE_V1..]);
        assert_eq!(read_npy(&v2).unwrap().get(0, 0), Some(42.0));
    }

    #[test]
    fn test_rejects_bad_magic() {
        assert_eq!(read_npy(b"StoreName,Latitude\n"), Err(NpyError::BadMagic));
        assert_eq!(read_npy(b""), Err(NpyError::BadMagic));
    }

    #[test]
    fn test_rejects_truncated_data() {
        let mut bytes = encode_v1("<f8", false, &[2, 2], &f8_bytes(&[1.0, 2.0, 3.0, 4.0]));
        bytes.truncate(bytes.len() - 8);
        assert!(matches!(read_npy(&bytes), Err(NpyError::Truncated { .. })));
    }

    #[test]
    fn test_rejects_non_2d_shapes() {
        let bytes = encode_v1("<f8", false, &[3], &f8_bytes(&[1.0, 2.0, 3.0]));
        assert_eq!(read_npy(&bytes), Err(NpyError::NotTwoDimensional(vec![3])));

        let bytes = encode_v1("<f8", false, &[1, 1, 1], &f8_bytes(&[1.0]));
        assert_eq!(read_npy(&bytes), Err(NpyError::NotTwoDimensional(vec![1, 1, 1])));
    }

    #[test]
    fn test_rejects_unsupported_dtypes() {
        let bytes = encode_v1("|O", false, &[1, 1], &[0; 8]);
        assert_eq!(read_npy(&bytes), Err(NpyError::UnsupportedDtype("|O".to_string())));

        let bytes = encode_v1("<f2", false, &[1, 1], &[0; 2]);
        assert_eq!(read_npy(&bytes), Err(NpyError::UnsupportedDtype("<f2".to_string())));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = encode_v1("<f8", false, &[1, 1], &f8_bytes(&[1.0]));
        bytes[6] = 9;
        assert_eq!(read_npy(&bytes), Err(NpyError::UnsupportedVersion(9, 0)));
    }

    #[test]
    fn test_rejects_shapes_past_address_space() {
        let bytes = encode_v1("|u1", false, &[usize::MAX, 1], &[0; 4]);
        assert!(matches!(read_npy(&bytes), Err(NpyError::BadHeader(_))));

        let bytes = encode_v1("<f8", false, &[usize::MAX / 8, 1], &[0; 8]);
        assert!(matches!(read_npy(&bytes), Err(NpyError::BadHeader(_))));

        let bytes = encode_v1("|u1", false, &[1 << 40, 1], &[0; 4]);
        assert!(matches!(read_npy(&bytes), Err(NpyError::Truncated { .. })));
    }
}
