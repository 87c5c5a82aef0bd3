/// The per-connection receive buffer.
///
/// Holds bytes pulled from the transport but not yet consumed by the head
/// parser or the active request body. [`push`][ReceiveBuffer::push]
/// appends a chunk at the tail, growing the backing storage by doubling
/// from a floor of 32 bytes; [`consume`][ReceiveBuffer::consume] removes
/// a prefix by shifting the remainder down, so unread bytes always start
/// at index zero and the parsers can work in plain slice offsets.
/// Capacity never shrinks for the life of a connection.
#[derive(Debug, Default)]
#[doc(hidden)]
pub struct ReceiveBuffer {
    bytes: Vec<u8>,
}

const MIN_CAPACITY: usize = 32;

#[doc(hidden)]
impl ReceiveBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// The bytes received but not yet consumed.
    pub fn filled(&self) -> &[u8] {
        &self.bytes
    }

    /// Append a chunk pulled from the transport, or pushed back by a body
    /// reader that over-read.
    pub fn push(&mut self, chunk: &[u8]) {
        let needed = self.bytes.len() + chunk.len();
        if needed > self.bytes.capacity() {
            let mut target = self.bytes.capacity().max(MIN_CAPACITY);
            while target < needed {
                target *= 2;
            }
            self.bytes.reserve_exact(target - self.bytes.len());
        }
        self.bytes.extend_from_slice(chunk);
    }

    /// Remove the first `n` bytes, shifting the remainder to the front.
    /// `n` must not exceed [`len`][ReceiveBuffer::len].
    pub fn consume(&mut self, n: usize) {
        let len = self.bytes.len();
        self.bytes.copy_within(n.., 0);
        self.bytes.truncate(len - n);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
