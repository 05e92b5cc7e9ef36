/// Utility to output something as hex
#[derive(Clone, PartialEq, Eq)]
pub struct Hex(Vec<u8>, usize);

impl Hex {
    pub fn new(data: &[u8]) -> Self {
        Self(data.to_vec(), data.len())
    }

    /// Only show the first `len` bytes, followed by the total length
    pub fn partial(data: &[u8], len: usize) -> Self {
        Self(data.to_vec(), len)
    }
}

impl std::fmt::Debug for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::fmt::Display for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.len() > self.1 {
            write!(
                f,
                "[{}..., {} bytes]",
                hex::encode(&self.0[..self.1]),
                self.0.len()
            )
        } else {
            write!(f, "[{}]", hex::encode(&self.0))
        }
    }
}

/// Length in bytes of the common prefix of two strings.
///
/// The result always lies on a char boundary of both strings.
pub(crate) fn common_prefix(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .take_while(|((_, ca), cb)| ca == cb)
        .last()
        .map(|((i, c), _)| i + c.len_utf8())
        .unwrap_or(0)
}
