//! RESP Frame Codec
//!
//! Decodes request frames (an array of bulk strings) and encodes the reply
//! types the server sends back.

/// One request: its bulk-string elements in order. `None` is a null element.
pub type Frame = Vec<Option<Vec<u8>>>;

// == Parsing ==
/// Parses one complete request frame from the front of `buf`.
///
/// Returns the frame and the number of bytes it occupied, or `None` when the
/// buffer does not yet hold a complete, well-formed frame. A buffer that does
/// not start with `*` also yields `None`; the caller keeps reading.
pub fn parse_frame(buf: &[u8]) -> Option<(Frame, usize)> {
    if buf.first() != Some(&b'*') {
        return None;
    }
    let (count, mut idx) = read_line_int(buf, 1)?;
    let count = usize::try_from(count).ok()?;

    let mut frame = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        if buf.get(idx) != Some(&b'$') {
            return None;
        }
        let (len, next) = read_line_int(buf, idx + 1)?;
        idx = next;
        if len == -1 {
            frame.push(None);
            continue;
        }
        let len = usize::try_from(len).ok()?;
        let end = idx.checked_add(len)?;
        if buf.get(end..end + 2) != Some(b"\r\n".as_slice()) {
            return None;
        }
        frame.push(Some(buf[idx..end].to_vec()));
        idx = end + 2;
    }
    Some((frame, idx))
}

/// Reads the integer on the line starting at `start`. Returns it together with
/// the index just past the line's `\n`.
fn read_line_int(buf: &[u8], start: usize) -> Option<(i64, usize)> {
    let newline = start + buf.get(start..)?.iter().position(|b| *b == b'\n')?;
    let line = &buf[start..newline];
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let value = std::str::from_utf8(line).ok()?.trim().parse().ok()?;
    Some((value, newline + 1))
}

// == Replies ==
/// A reply to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+text`
    Simple(String),
    /// `-text`
    Error(String),
    /// `:n`
    Integer(i64),
    /// `$len` + data, or `$-1` for null
    Bulk(Option<Vec<u8>>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    pub fn null() -> Self {
        Reply::Bulk(None)
    }

    pub fn bulk(data: impl Into<Vec<u8>>) -> Self {
        Reply::Bulk(Some(data.into()))
    }

    /// Error reply; `message` should start with an error kind such as `ERR`.
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(message.into())
    }

    /// Appends the wire form of this reply to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Reply::Simple(text) => {
                out.push(b'+');
                out.extend_from_slice(text.as_bytes());
            }
            Reply::Error(text) => {
                out.push(b'-');
                out.extend_from_slice(text.as_bytes());
            }
            Reply::Integer(n) => {
                out.push(b':');
                out.extend_from_slice(n.to_string().as_bytes());
            }
            Reply::Bulk(None) => out.extend_from_slice(b"$-1"),
            Reply::Bulk(Some(data)) => {
                out.push(b'$');
                out.extend_from_slice(data.len().to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(data);
            }
        }
        out.extend_from_slice(b"\r\n");
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}
