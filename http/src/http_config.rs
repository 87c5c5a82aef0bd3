/// Tunable parameters for the http protocol engine.
///
/// The defaults in [`DEFAULT_CONFIG`] are reasonable for most servers;
/// construct a modified configuration with the chainable `with_` setters.
#[derive(Clone, Copy, Debug)]
pub struct HttpConfig {
    pub(crate) write_buffer_len: usize,
    pub(crate) request_buffer_initial_len: usize,
    pub(crate) max_head_len: usize,
    pub(crate) copy_buffer_len: usize,
    pub(crate) copy_loops_per_yield: usize,
    pub(crate) received_body_max_len: u64,
    pub(crate) received_body_initial_len: usize,
    pub(crate) received_body_max_preallocate: usize,
}

impl HttpConfig {
    /// Sets the size of the write buffer that response heads are
    /// serialized into. Small response bodies coalesce with the head into
    /// a single transport write.
    #[must_use]
    pub fn with_write_buffer_len(mut self, write_buffer_len: usize) -> Self {
        self.write_buffer_len = write_buffer_len;
        self
    }

    /// Sets the initial allocation for each connection's receive buffer.
    /// The buffer grows as needed regardless of this value.
    #[must_use]
    pub fn with_request_buffer_initial_len(mut self, request_buffer_initial_len: usize) -> Self {
        self.request_buffer_initial_len = request_buffer_initial_len;
        self
    }

    /// Sets the maximum length of a request head, in bytes. A request
    /// whose head exceeds this without completing is answered with a 413
    /// and the connection is closed.
    #[must_use]
    pub fn with_max_head_len(mut self, max_head_len: usize) -> Self {
        self.max_head_len = max_head_len;
        self
    }

    /// Sets the size of the scratch buffer used to pump response bodies
    /// to the transport and to drain unread request bodies. Chunked
    /// framing is assembled inside this buffer, so it must be larger
    /// than the five byte terminating frame.
    #[must_use]
    pub fn with_copy_buffer_len(mut self, copy_buffer_len: usize) -> Self {
        self.copy_buffer_len = copy_buffer_len;
        self
    }

    /// Sets the number of io loop iterations performed before yielding
    /// back to the async runtime.
    #[must_use]
    pub fn with_copy_loops_per_yield(mut self, copy_loops_per_yield: usize) -> Self {
        self.copy_loops_per_yield = copy_loops_per_yield;
        self
    }

    /// Sets the maximum length of a received body that will be read into
    /// memory. Bodies can be streamed past this limit through the
    /// `AsyncRead` interface, except for chunked bodies, for which this
    /// is a hard cap.
    #[must_use]
    pub fn with_received_body_max_len(mut self, received_body_max_len: u64) -> Self {
        self.received_body_max_len = received_body_max_len;
        self
    }

    /// Sets the initial allocation for buffering a received body with no
    /// declared length.
    #[must_use]
    pub fn with_received_body_initial_len(mut self, received_body_initial_len: usize) -> Self {
        self.received_body_initial_len = received_body_initial_len;
        self
    }

    /// Sets the largest allocation a declared content-length can reserve
    /// up front, guarding against peers that declare absurd lengths and
    /// send nothing.
    #[must_use]
    pub fn with_received_body_max_preallocate(
        mut self,
        received_body_max_preallocate: usize,
    ) -> Self {
        self.received_body_max_preallocate = received_body_max_preallocate;
        self
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

pub(crate) const DEFAULT_CONFIG: HttpConfig = HttpConfig {
    write_buffer_len: 512,
    request_buffer_initial_len: 128,
    max_head_len: 8 * 1024,
    copy_buffer_len: 8 * 1024,
    copy_loops_per_yield: 16,
    received_body_max_len: 524_288_000u64,
    received_body_initial_len: 128,
    received_body_max_preallocate: 65_536,
};
