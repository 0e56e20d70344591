//! Embedding table readers
//!
//! `.npy` files (format versions 1-3) holding a 2-D little-endian float32
//! array in C order, or raw little-endian float32 rows whose width comes
//! from the metadata.

use bytes::{Buf, Bytes};
use epicsum_core::{EmbeddingTable, Error, Result};
use std::path::Path;

const MAGIC: &[u8] = b"\x93NUMPY";

fn malformed(path: &Path, reason: impl Into<String>) -> Error {
    Error::MalformedArtifact {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Parsed `.npy` header
#[derive(Debug, Clone, PartialEq)]
struct NpyHeader {
    descr: String,
    fortran_order: bool,
    shape: Vec<usize>,
}

/// Value of `'key': <value>` in the header dict, up to the next top-level comma
fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let quoted = [format!("'{}'", key), format!("\"{}\"", key)];
    let start = quoted.iter().find_map(|k| header.find(k.as_str()).map(|i| i + k.len()))?;
    let rest = header[start..].trim_start().strip_prefix(':')?.trim_start();

    if rest.starts_with('(') {
        let end = rest.find(')')?;
        return Some(&rest[..=end]);
    }
    let end = rest.find([',', '}']).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn parse_header(path: &Path, header: &str) -> Result<NpyHeader> {
    let descr = header_value(header, "descr")
        .ok_or_else(|| malformed(path, "npy header has no 'descr'"))?
        .trim_matches(|c| c == '\'' || c == '"')
        .to_string();

    let fortran_order = match header_value(header, "fortran_order") {
        Some("False") => false,
        Some("True") => true,
        _ => return Err(malformed(path, "npy header has no valid 'fortran_order'")),
    };

    let shape = header_value(header, "shape")
        .ok_or_else(|| malformed(path, "npy header has no 'shape'"))?
        .trim_matches(|c| c == '(' || c == ')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|_| malformed(path, format!("bad shape entry '{}'", s))))
        .collect::<Result<Vec<_>>>()?;

    Ok(NpyHeader {
        descr,
        fortran_order,
        shape,
    })
}

fn read_f32_le(mut buf: Bytes, count: usize) -> Vec<f32> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(buf.get_f32_le());
    }
    values
}

/// Parse an in-memory `.npy` buffer into a table
pub fn parse_npy(path: &Path, raw: Vec<u8>) -> Result<EmbeddingTable> {
    let mut buf = Bytes::from(raw);

    if buf.len() < MAGIC.len() + 2 || &buf[..MAGIC.len()] != MAGIC {
        return Err(malformed(path, "missing npy magic"));
    }
    buf.advance(MAGIC.len());
    let major = buf.get_u8();
    let _minor = buf.get_u8();

    let header_len = match major {
        1 if buf.remaining() >= 2 => buf.get_u16_le() as usize,
        2 | 3 if buf.remaining() >= 4 => buf.get_u32_le() as usize,
        1..=3 => return Err(malformed(path, "truncated npy header")),
        v => return Err(malformed(path, format!("unsupported npy version {}", v))),
    };
    if buf.remaining() < header_len {
        return Err(malformed(path, "truncated npy header"));
    }
    let header_bytes = buf.split_to(header_len);
    let header = std::str::from_utf8(&header_bytes)
        .map_err(|_| malformed(path, "npy header is not valid UTF-8"))?;
    let header = parse_header(path, header)?;

    if header.descr != "<f4" {
        return Err(malformed(
            path,
            format!("expected little-endian float32 ('<f4'), found '{}'", header.descr),
        ));
    }
    if header.fortran_order {
        return Err(malformed(path, "fortran-ordered arrays are not supported"));
    }
    let (rows, dim) = match header.shape.as_slice() {
        [rows, dim] => (*rows, *dim),
        other => {
            return Err(malformed(
                path,
                format!("expected a 2-D array, found shape {:?}", other),
            ))
        }
    };

    let (count, needed) = rows
        .checked_mul(dim)
        .and_then(|count| count.checked_mul(4).map(|bytes| (count, bytes)))
        .ok_or_else(|| malformed(path, format!("array shape ({}, {}) overflows", rows, dim)))?;
    if buf.remaining() != needed {
        return Err(malformed(
            path,
            format!(
                "data section holds {} bytes, shape ({}, {}) needs {}",
                buf.remaining(),
                rows,
                dim,
                needed
            ),
        ));
    }

    EmbeddingTable::from_flat(read_f32_le(buf, count), dim)
}

/// Parse raw little-endian f32 rows of width `dim`
pub fn parse_raw(path: &Path, raw: Vec<u8>, dim: usize) -> Result<EmbeddingTable> {
    if raw.len() % 4 != 0 {
        return Err(malformed(path, "raw table length is not a multiple of 4 bytes"));
    }
    let count = raw.len() / 4;
    EmbeddingTable::from_flat(read_f32_le(Bytes::from(raw), count), dim)
}

/// Read a table from disk; `.npy` by extension, raw rows otherwise
pub fn read_table(path: &Path, dim: usize) -> Result<EmbeddingTable> {
    let raw = std::fs::read(path)?;
    let is_npy = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("npy"));
    if is_npy {
        parse_npy(path, raw)
    } else {
        parse_raw(path, raw, dim)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a version 1.0 `.npy` buffer
    pub(crate) fn npy_bytes(rows: &[Vec<f32>]) -> Vec<u8> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        let mut header = format!(
            "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, {}), }}",
            rows.len(),
            dim
        );
        // pad so the data starts on a 64-byte boundary, header ends with '\n'
        let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
        header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
        header.push('\n');

        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        for row in rows {
            for v in row {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out
    }

    #[test]
    fn test_parse_npy() {
        let rows = vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.6, 0.8]];
        let table = parse_npy(Path::new("t.npy"), npy_bytes(&rows)).unwrap();
        assert_eq!(table.rows(), 2);
        assert_eq!(table.dim(), 3);
        assert_eq!(table.row(1), Some(&[0.0, 0.6, 0.8][..]));
    }

    #[test]
    fn test_header_parsing() {
        let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (10, 384), }";
        let parsed = parse_header(Path::new("x"), header).unwrap();
        assert_eq!(parsed.shape, vec![10, 384]);
        assert!(!parsed.fortran_order);
        assert_eq!(parsed.descr, "<f4");
    }

    #[test]
    fn test_rejects_wrong_dtype_and_truncation() {
        let mut raw = npy_bytes(&[vec![1.0, 2.0]]);
        let pos = raw.windows(3).position(|w| w == b"<f4").unwrap();
        raw[pos + 2] = b'8';
        assert!(parse_npy(Path::new("t.npy"), raw).is_err());

        let mut raw = npy_bytes(&[vec![1.0, 2.0]]);
        raw.pop();
        assert!(parse_npy(Path::new("t.npy"), raw).is_err());

        assert!(parse_npy(Path::new("t.npy"), b"not numpy".to_vec()).is_err());
    }

    #[test]
    fn test_oversized_shape_rejected() {
        let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (4611686018427387904, 1), }\n";
        let mut raw = Vec::new();
        raw.extend_from_slice(MAGIC);
        raw.extend_from_slice(&[1, 0]);
        raw.extend_from_slice(&(header.len() as u16).to_le_bytes());
        raw.extend_from_slice(header.as_bytes());

        match parse_npy(Path::new("t.npy"), raw) {
            Err(Error::MalformedArtifact { reason, .. }) => assert!(reason.contains("overflows")),
            other => panic!("expected MalformedArtifact, got {:?}", other.map(|t| t.rows())),
        }
    }

    #[test]
    fn test_parse_raw() {
        let mut raw = Vec::new();
        for v in [1.0f32, 0.0, 0.0, 1.0] {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let table = parse_raw(Path::new("t.bin"), raw.clone(), 2).unwrap();
        assert_eq!(table.rows(), 2);
        assert!(parse_raw(Path::new("t.bin"), raw, 3).is_err());
    }
}
