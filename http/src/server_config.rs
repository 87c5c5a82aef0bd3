use crate::{Conn, ConnectionStatus, Error, HttpConfig, ReceiveBuffer, Result};
use futures_lite::{AsyncRead, AsyncWrite};
use std::future::Future;

/// Shared configuration for a http server.
///
/// One of these is constructed per server and drives any number of
/// connections through [`ServerConfig::run`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerConfig {
    http_config: HttpConfig,
}

impl ServerConfig {
    /// Construct a new `ServerConfig`
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the [`HttpConfig`] for this server
    #[must_use]
    pub fn with_http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Borrow the [`HttpConfig`] for this server
    pub fn http_config(&self) -> &HttpConfig {
        &self.http_config
    }

    /// Perform HTTP on the provided transport, applying the provided
    /// `async Conn -> Conn` handler function for every distinct http
    /// request-response exchange.
    ///
    /// For any given invocation of `run`, the handler function may run
    /// any number of times, depending on whether the connection is reused
    /// by the client. The receive buffer persists across requests on one
    /// connection, so a pipelined second request is picked up without
    /// touching the transport.
    ///
    /// A connection on which the peer cleanly disconnects between
    /// requests resolves to `Ok(())`.
    ///
    /// # Errors
    ///
    /// This function returns an [`Error`] if any of the http requests is
    /// irrecoverably malformed or oversized, or if the transport fails.
    /// When the error corresponds to an http status, a minimal error
    /// response has already been written to the transport by the time
    /// this returns.
    pub async fn run<Transport, Handler, Fut>(
        &self,
        transport: Transport,
        mut handler: Handler,
    ) -> Result<()>
    where
        Transport: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static,
        Handler: FnMut(Conn<Transport>) -> Fut,
        Fut: Future<Output = Conn<Transport>>,
    {
        let buffer = ReceiveBuffer::with_capacity(self.http_config.request_buffer_initial_len);

        let mut conn = match Conn::new_internal(self.http_config, transport, buffer).await {
            Ok(conn) => conn,
            Err(Error::Closed) => return Ok(()),
            Err(error) => return Err(error),
        };

        loop {
            conn = match handler(conn).await.send().await? {
                ConnectionStatus::Close => return Ok(()),
                ConnectionStatus::Conn(next) => next,
            };
        }
    }
}
