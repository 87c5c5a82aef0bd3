use async_net::{TcpListener, TcpStream};
use coracle_http::{Conn, ServerConfig};
use std::{fmt, future::Future, io, sync::Arc};

/// A tcp server for the coracle protocol engine.
///
/// Each accepted connection runs as an independent executor task; no
/// state is shared between connections. The handler is an
/// `async Conn -> Conn` function invoked once per request.
pub struct Server<Handler> {
    host: String,
    port: u16,
    server_config: ServerConfig,
    handler: Arc<Handler>,
}

impl<Handler> fmt::Debug for Server<Handler> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("server_config", &self.server_config)
            .field("handler", &"..")
            .finish()
    }
}

impl<Handler, Fut> Server<Handler>
where
    Handler: Fn(Conn<TcpStream>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Conn<TcpStream>> + Send + 'static,
{
    /// Construct a server for the provided handler, listening on
    /// `127.0.0.1:1234` unless overridden with [`Server::with_host`] and
    /// [`Server::with_port`].
    pub fn new(handler: Handler) -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 1234,
            server_config: ServerConfig::new(),
            handler: Arc::new(handler),
        }
    }

    /// set the interface to bind
    #[must_use]
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = String::from(host);
        self
    }

    /// set the port to bind
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// replace the [`ServerConfig`] that governs each connection
    #[must_use]
    pub fn with_server_config(mut self, server_config: ServerConfig) -> Self {
        self.server_config = server_config;
        self
    }

    /// Bind and accept connections until the process exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound. Accept errors
    /// and per-connection errors are logged and do not stop the server.
    pub async fn run_async(self) -> io::Result<()> {
        let listener = TcpListener::bind((&*self.host, self.port)).await?;
        log::info!("listening on http://{}", listener.local_addr()?);

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    log::trace!("accepted connection from {peer}");
                    let handler = Arc::clone(&self.handler);
                    let server_config = self.server_config;

                    async_global_executor::spawn(async move {
                        if let Err(error) = server_config
                            .run(stream, |conn| (*handler)(conn))
                            .await
                        {
                            log::warn!("connection from {peer} ended with an error: {error}");
                        }
                    })
                    .detach();
                }

                Err(error) => log::error!("accept failed: {error}"),
            }
        }
    }

    /// Blocking wrapper around [`Server::run_async`] for use from a
    /// synchronous `main`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub fn run(self) -> io::Result<()> {
        async_global_executor::block_on(self.run_async())
    }
}
