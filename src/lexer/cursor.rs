/// Byte position into program text, stepping one `char` at a time.
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Cursor<'a> {
        Cursor { src, pos: 0 }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Text not yet consumed.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume characters while `pred` holds, returning the byte length consumed.
    pub fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> usize {
        let len = self
            .rest()
            .find(|c| !pred(c))
            .unwrap_or_else(|| self.rest().len());
        self.pos += len;
        len
    }

    pub fn pos(&self) -> usize {
        self.pos
    }
}
