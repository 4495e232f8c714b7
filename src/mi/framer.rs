/// Splits a byte stream into lines.
///
/// A line ends with LF, CR-LF or a lone CR; terminators are not part of the
/// emitted line. Incomplete data is kept until the next [`LineFramer::feed`] call.
#[derive(Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return all lines completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);

        let mut lines = vec![];
        let mut start = 0;
        let mut i = 0;
        while i < self.buf.len() {
            match self.buf[i] {
                b'\n' => {
                    lines.push(String::from_utf8_lossy(&self.buf[start..i]).into_owned());
                    i += 1;
                    start = i;
                }
                b'\r' => {
                    // need one more byte to tell CR from CR-LF
                    if i + 1 == self.buf.len() {
                        break;
                    }
                    lines.push(String::from_utf8_lossy(&self.buf[start..i]).into_owned());
                    i += if self.buf[i + 1] == b'\n' { 2 } else { 1 };
                    start = i;
                }
                _ => i += 1,
            }
        }

        self.buf.drain(..start);
        lines
    }

    /// Flush the rest of the buffer at the end of a stream.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        let rest = rest.strip_suffix(b"\r").unwrap_or(&rest);
        if rest.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(rest).into_owned())
        }
    }

    /// Number of buffered bytes that do not form a complete line yet.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
