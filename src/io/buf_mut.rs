/// Writes shared by all three wire protocols.
pub trait BufMutExt {
    /// UTF-8 bytes followed by a NUL terminator.
    fn put_str_nul(&mut self, s: &str);

    /// The string as UTF-16LE code units, no length prefix.
    fn put_utf16_str(&mut self, s: &str);
}

impl BufMutExt for Vec<u8> {
    fn put_str_nul(&mut self, s: &str) {
        self.extend_from_slice(s.as_bytes());
        self.push(0);
    }

    fn put_utf16_str(&mut self, s: &str) {
        for ch in s.encode_utf16() {
            self.extend_from_slice(&ch.to_le_bytes());
        }
    }
}
