//! A minimal COPY BINARY reader, written against the wire layout rather than the encoder,
//! so the integration tests do not check the encoder against itself.
#![allow(dead_code)]

pub const SIGNATURE: &[u8] = b"PGCOPY\n\xff\r\n\0";

/// The fields of one tuple, `None` for NULL.
pub type Tuple = Vec<Option<Vec<u8>>>;

pub struct Decoded {
    pub tuples: Vec<Tuple>,
    /// Bytes following the trailer.
    pub trailing: usize,
}

struct Cursor<'a> {
    bytes: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> &'a [u8] {
        assert!(self.bytes.len() >= n, "stream truncated");
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        head
    }

    fn i16(&mut self) -> i16 {
        i16::from_be_bytes(self.take(2).try_into().unwrap())
    }

    fn i32(&mut self) -> i32 {
        i32::from_be_bytes(self.take(4).try_into().unwrap())
    }
}

/// Decode a whole stream, panicking on any framing error.
pub fn decode(stream: &[u8]) -> Decoded {
    let mut cursor = Cursor { bytes: stream };
    assert_eq!(cursor.take(SIGNATURE.len()), SIGNATURE);
    assert_eq!(cursor.i32(), 0, "flags");
    assert_eq!(cursor.i32(), 0, "header extension");

    let mut tuples = Vec::new();
    loop {
        let count = cursor.i16();
        if count == -1 {
            break;
        }
        let tuple = (0..count)
            .map(|_| match cursor.i32() {
                -1 => None,
                len => Some(cursor.take(len as usize).to_vec()),
            })
            .collect();
        tuples.push(tuple);
    }
    Decoded {
        tuples,
        trailing: cursor.bytes.len(),
    }
}

pub fn as_f64(field: &Option<Vec<u8>>) -> f64 {
    f64::from_be_bytes(field.as_deref().unwrap().try_into().unwrap())
}

pub fn as_f32(field: &Option<Vec<u8>>) -> f32 {
    f32::from_be_bytes(field.as_deref().unwrap().try_into().unwrap())
}

pub fn as_i32(field: &Option<Vec<u8>>) -> i32 {
    i32::from_be_bytes(field.as_deref().unwrap().try_into().unwrap())
}

pub fn as_i64(field: &Option<Vec<u8>>) -> i64 {
    i64::from_be_bytes(field.as_deref().unwrap().try_into().unwrap())
}
