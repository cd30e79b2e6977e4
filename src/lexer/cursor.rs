//! Character cursors over source text.
//!
//! [`Cursor`] is the surface handed to token matchers and external scanners.
//! [`TextSource`] adds what the engine itself needs: repositioning, token
//! boundaries and how far a scan looked ahead.

use std::borrow::Cow;
use std::ops::Range;

/// A forward-only view of the text from the current token start.
pub trait Cursor {
    /// The character at the current position, without consuming it.
    fn peek(&mut self) -> Option<char>;
    /// Consume one character. Does nothing at end of input.
    fn advance(&mut self);
    /// Absolute byte offset of the current position.
    fn position(&self) -> usize;
    /// End the token here even if the scanner keeps looking further.
    fn mark_end(&mut self);
}

pub trait TextSource: Cursor {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move to `position` and forget any marked end. The furthest read offset
    /// is kept.
    fn seek(&mut self, position: usize);

    /// Start a new token at the current position.
    fn begin_token(&mut self);

    /// The marked end, or the current position when nothing was marked.
    fn token_end(&self) -> usize;

    /// One past the last byte inspected since [`TextSource::begin_token`].
    /// Peeking at end of input counts as reading one byte past it.
    fn furthest_read(&self) -> usize;

    fn text(&self, range: Range<usize>) -> Cow<'_, str>;
}

/// Cursor over contiguous text.
#[derive(Debug, Clone)]
pub struct StrCursor<'a> {
    text: &'a str,
    position: usize,
    marked: Option<usize>,
    furthest: usize,
}

impl<'a> StrCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            position: 0,
            marked: None,
            furthest: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.text.get(self.position..)?.chars().next()
    }
}

impl Cursor for StrCursor<'_> {
    fn peek(&mut self) -> Option<char> {
        let current = self.current();
        let read_to = self.position + current.map_or(1, char::len_utf8);
        self.furthest = self.furthest.max(read_to);
        current
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.position += c.len_utf8();
            self.furthest = self.furthest.max(self.position);
        }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn mark_end(&mut self) {
        self.marked = Some(self.position);
    }
}

impl TextSource for StrCursor<'_> {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn seek(&mut self, position: usize) {
        self.position = position.min(self.text.len());
        self.marked = None;
    }

    fn begin_token(&mut self) {
        self.marked = None;
        self.furthest = self.position;
    }

    fn token_end(&self) -> usize {
        self.marked.unwrap_or(self.position)
    }

    fn furthest_read(&self) -> usize {
        self.furthest
    }

    fn text(&self, range: Range<usize>) -> Cow<'_, str> {
        Cow::Borrowed(self.text.get(range).unwrap_or_default())
    }
}

/// Cursor over text split into chunks, as held by a rope or a gap buffer.
/// Chunks are never copied; only [`TextSource::text`] across a chunk boundary
/// allocates.
#[derive(Debug, Clone)]
pub struct ChunkedCursor<'a> {
    chunks: Vec<&'a str>,
    starts: Vec<usize>,
    len: usize,
    position: usize,
    marked: Option<usize>,
    furthest: usize,
}

impl<'a> ChunkedCursor<'a> {
    pub fn new(chunks: impl IntoIterator<Item = &'a str>) -> Self {
        let chunks: Vec<&'a str> = chunks.into_iter().filter(|chunk| !chunk.is_empty()).collect();
        let mut starts = Vec::with_capacity(chunks.len());
        let mut len = 0;
        for chunk in &chunks {
            starts.push(len);
            len += chunk.len();
        }
        Self {
            chunks,
            starts,
            len,
            position: 0,
            marked: None,
            furthest: 0,
        }
    }

    fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        if offset >= self.len {
            return None;
        }
        let chunk = self.starts.partition_point(|&start| start <= offset) - 1;
        Some((chunk, offset - self.starts[chunk]))
    }

    fn current(&self) -> Option<char> {
        let (chunk, offset) = self.locate(self.position)?;
        self.chunks[chunk].get(offset..)?.chars().next()
    }
}

impl Cursor for ChunkedCursor<'_> {
    fn peek(&mut self) -> Option<char> {
        let current = self.current();
        let read_to = self.position + current.map_or(1, char::len_utf8);
        self.furthest = self.furthest.max(read_to);
        current
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.position += c.len_utf8();
            self.furthest = self.furthest.max(self.position);
        }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn mark_end(&mut self) {
        self.marked = Some(self.position);
    }
}

impl TextSource for ChunkedCursor<'_> {
    fn len(&self) -> usize {
        self.len
    }

    fn seek(&mut self, position: usize) {
        self.position = position.min(self.len);
        self.marked = None;
    }

    fn begin_token(&mut self) {
        self.marked = None;
        self.furthest = self.position;
    }

    fn token_end(&self) -> usize {
        self.marked.unwrap_or(self.position)
    }

    fn furthest_read(&self) -> usize {
        self.furthest
    }

    fn text(&self, range: Range<usize>) -> Cow<'_, str> {
        let end = range.end.min(self.len);
        let Some((first, offset)) = self.locate(range.start) else {
            return Cow::Borrowed("");
        };
        let chunk = self.chunks[first];
        let local_end = offset + (end - range.start);
        if local_end <= chunk.len() {
            return Cow::Borrowed(chunk.get(offset..local_end).unwrap_or_default());
        }
        let mut text = String::with_capacity(end - range.start);
        let mut at = range.start;
        while at < end {
            let Some((index, offset)) = self.locate(at) else {
                break;
            };
            let chunk = self.chunks[index];
            let take = (chunk.len() - offset).min(end - at);
            text.push_str(chunk.get(offset..offset + take).unwrap_or_default());
            at += take;
        }
        Cow::Owned(text)
    }
}
