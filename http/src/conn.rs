use crate::{
    body_encoder::BodyEncoder,
    bufwriter::BufWriter,
    copy::copy,
    received_body::ReceivedBodyState,
    Body, Error, Headers, HttpConfig,
    KnownHeaderName::{Connection, ContentLength, Date, Server, TransferEncoding},
    Method, ReceiveBuffer, ReceivedBody, Result, Status, Version,
};
use futures_lite::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use memchr::memmem::Finder;
use std::{
    fmt::{self, Debug, Formatter},
    str,
    time::SystemTime,
};

/// Default Server header
pub const SERVER: &str = concat!("coracle/", env!("CARGO_PKG_VERSION"));

/// A http connection
///
/// Unlike in some other rust http implementations, this struct represents
/// both the request and the response, and holds the transport over which
/// the response will be sent.
///
/// A `Conn` is handed to the handler function once its request head has
/// been fully parsed. The request body has not been read at that point;
/// the handler pulls it on demand through [`Conn::request_body`]. The
/// handler records the response on the same `Conn` and returns it, and
/// the engine then writes the response and either closes the connection
/// or parses the next request out of the same receive buffer.
pub struct Conn<Transport> {
    pub(crate) request_headers: Headers,
    pub(crate) response_headers: Headers,
    pub(crate) path: String,
    pub(crate) method: Method,
    pub(crate) status: Option<Status>,
    pub(crate) version: Version,
    pub(crate) response_body: Option<Body>,
    pub(crate) transport: Transport,
    pub(crate) buffer: ReceiveBuffer,
    pub(crate) request_body_state: ReceivedBodyState,
    pub(crate) content_length: Option<u64>,
    pub(crate) chunked: bool,
    pub(crate) http_config: HttpConfig,
}

impl<Transport> Debug for Conn<Transport> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conn")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("version", &self.version)
            .field("status", &self.status)
            .field("request_headers", &self.request_headers)
            .field("response_headers", &self.response_headers)
            .field("response_body", &self.response_body)
            .field("request_body_state", &self.request_body_state)
            .field("content_length", &self.content_length)
            .field("chunked", &self.chunked)
            .field("transport", &"..")
            .field("buffer", &"..")
            .finish()
    }
}

/// What happened to a connection after a response was fully sent.
#[derive(Debug)]
pub enum ConnectionStatus<Transport> {
    /// The connection has reached end of life, either because the
    /// protocol version or a `Connection` header asked for it, or
    /// because the peer stopped sending requests.
    Close,

    /// Another request arrived over the same transport.
    Conn(Conn<Transport>),
}

struct RequestHead {
    method: Method,
    path: String,
    version: Version,
    request_headers: Headers,
    content_length: Option<u64>,
    chunked: bool,
}

impl<Transport> Conn<Transport>
where
    Transport: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static,
{
    /// returns the http method for this conn's request.
    pub fn method(&self) -> Method {
        self.method
    }

    /// returns the http version for this conn.
    pub fn http_version(&self) -> Version {
        self.version
    }

    /// retrieves the current response status code for this conn, if it
    /// has been set
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// sets the http status code from any `TryInto<Status>`.
    ///
    /// ```
    /// # use coracle_http::{Conn, Method, Status};
    /// # let mut conn = Conn::new_synthetic(Method::Get, "/", ());
    /// assert!(conn.status().is_none());
    ///
    /// conn.set_status(200); // a status can be set as a u16
    /// assert_eq!(conn.status().unwrap(), Status::Ok);
    ///
    /// conn.set_status(Status::NotFound); // or as a Status
    /// assert_eq!(conn.status().unwrap(), Status::NotFound);
    /// ```
    pub fn set_status(&mut self, status: impl TryInto<Status>) {
        self.status = Some(status.try_into().unwrap_or_else(|_| {
            log::error!("attempted to set an invalid status code");
            Status::InternalServerError
        }));
    }

    /// retrieves the path part of the request target, up to and excluding
    /// any query component
    /// ```
    /// # use coracle_http::{Conn, Method};
    /// let mut conn = Conn::new_synthetic(Method::Get, "/some/path?and&a=query", ());
    /// assert_eq!(conn.path(), "/some/path");
    /// ```
    pub fn path(&self) -> &str {
        match self.path.split_once('?') {
            Some((path, _)) => path,
            None => &self.path,
        }
    }

    /// retrieves the request target exactly as it appeared on the request
    /// line
    pub fn path_and_query(&self) -> &str {
        &self.path
    }

    /// retrieves the query component of the request target
    /// ```
    /// # use coracle_http::{Conn, Method};
    /// let mut conn = Conn::new_synthetic(Method::Get, "/some/path?and&a=query", ());
    /// assert_eq!(conn.querystring(), "and&a=query");
    /// ```
    pub fn querystring(&self) -> &str {
        self.path
            .split_once('?')
            .map(|(_, query)| query)
            .unwrap_or_default()
    }

    /// returns a reference to the request headers
    pub fn request_headers(&self) -> &Headers {
        &self.request_headers
    }

    /// returns a mutable reference to the request [headers](Headers)
    pub fn request_headers_mut(&mut self) -> &mut Headers {
        &mut self.request_headers
    }

    /// returns a reference to the response [headers](Headers)
    pub fn response_headers(&self) -> &Headers {
        &self.response_headers
    }

    /// returns a mutable reference to the response [headers](Headers)
    pub fn response_headers_mut(&mut self) -> &mut Headers {
        &mut self.response_headers
    }

    /// Sets the response body to anything that is [`impl Into<Body>`][Body].
    ///
    /// ```
    /// # use coracle_http::{Conn, Method};
    /// # let mut conn = Conn::new_synthetic(Method::Get, "/", ());
    /// conn.set_response_body("hello");
    /// conn.set_response_body(String::from("hello"));
    /// conn.set_response_body(vec![99, 97, 116]);
    /// ```
    pub fn set_response_body(&mut self, body: impl Into<Body>) {
        self.response_body = Some(body.into());
    }

    /// returns a reference to the current response body, if it has been
    /// set
    pub fn response_body(&self) -> Option<&Body> {
        self.response_body.as_ref()
    }

    /// remove the response body from this conn and return it
    pub fn take_response_body(&mut self) -> Option<Body> {
        self.response_body.take()
    }

    /// The declared length of the request body: a `Content-Length` value,
    /// or None for chunked and read-until-close bodies.
    pub fn request_content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// returns a [`ReceivedBody`] that references this conn. the conn
    /// retains all data and holds the singular transport, but the
    /// `ReceivedBody` provides an interface to read body content.
    ///
    /// ```
    /// # futures_lite::future::block_on(async {
    /// # use coracle_http::{Conn, Method};
    /// let mut conn = Conn::new_synthetic(Method::Post, "/", "hello");
    /// let request_body = conn.request_body();
    /// assert_eq!(request_body.content_length(), Some(5));
    /// assert_eq!(request_body.read_string().await.unwrap(), "hello");
    /// # });
    /// ```
    pub fn request_body(&mut self) -> ReceivedBody<'_, Transport> {
        ReceivedBody::new(
            self.content_length,
            self.chunked,
            &mut self.buffer,
            &mut self.transport,
            &mut self.request_body_state,
            &self.http_config,
        )
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub(crate) async fn new_internal(
        http_config: HttpConfig,
        mut transport: Transport,
        mut buffer: ReceiveBuffer,
    ) -> Result<Self> {
        match Self::read_request_head(&mut transport, &mut buffer, &http_config).await {
            Ok(head) => {
                let mut response_headers = Headers::new();
                response_headers.insert(Server, SERVER);

                Ok(Self {
                    request_headers: head.request_headers,
                    response_headers,
                    path: head.path,
                    method: head.method,
                    status: None,
                    version: head.version,
                    response_body: None,
                    transport,
                    buffer,
                    request_body_state: ReceivedBodyState::Start,
                    content_length: head.content_length,
                    chunked: head.chunked,
                    http_config,
                })
            }

            Err(error) => {
                if let Some(status) = error.status() {
                    log::warn!("closing connection after protocol error: {error}");
                    send_error_response(&mut transport, status).await;
                }
                Err(error)
            }
        }
    }

    async fn read_request_head(
        transport: &mut Transport,
        buffer: &mut ReceiveBuffer,
        http_config: &HttpConfig,
    ) -> Result<RequestHead> {
        let head_size = Self::head(transport, buffer, http_config).await?;
        let head = &buffer.filled()[..head_size];

        let first_line_index = Finder::new(b"\r\n").find(head).ok_or(Error::InvalidHead)?;

        let mut spaces = memchr::memchr_iter(b' ', &head[..first_line_index]);
        let first_space = spaces.next().ok_or(Error::MissingMethod)?;
        let method = Method::parse(&head[..first_space])?;
        let second_space = spaces.next().ok_or(Error::RequestPathMissing)?;
        let path = str::from_utf8(&head[first_space + 1..second_space])
            .map_err(|_| Error::RequestPathMissing)?
            .to_string();
        if path.is_empty() {
            return Err(Error::InvalidHead);
        }
        let version = Version::parse(&head[second_space + 1..first_line_index])?;

        let request_headers = Headers::parse(&head[first_line_index + 2..head_size])?;
        log::trace!("received:\n{method} {path} {version}\n{request_headers}");

        let (content_length, chunked) = request_framing(method, &request_headers)?;

        buffer.consume(head_size);

        Ok(RequestHead {
            method,
            path,
            version,
            request_headers,
            content_length,
            chunked,
        })
    }

    /// Accumulate transport bytes into the receive buffer until the head
    /// terminator arrives, and return the head length. The buffer may
    /// already hold bytes from the previous request on this connection;
    /// those are searched before anything is pulled from the transport,
    /// and each pull is one bounded chunk appended to the buffer. The
    /// terminator search resumes three bytes before the previously
    /// scanned end, in case it straddles two chunks.
    async fn head(
        transport: &mut Transport,
        buffer: &mut ReceiveBuffer,
        http_config: &HttpConfig,
    ) -> Result<usize> {
        let finder = Finder::new(b"\r\n\r\n");
        let mut searched: usize = 0;
        let mut chunk = [0; 1024];

        loop {
            let search_start = searched.saturating_sub(3);
            if let Some(index) = finder.find(&buffer.filled()[search_start..]) {
                return Ok(search_start + index + 4);
            }
            searched = buffer.len();

            if searched >= http_config.max_head_len {
                return Err(Error::HeadersTooLong);
            }

            let bytes = transport.read(&mut chunk).await?;
            if bytes == 0 {
                return if buffer.is_empty() {
                    Err(Error::Closed)
                } else {
                    Err(Error::UnexpectedEof)
                };
            }
            buffer.push(&chunk[..bytes]);
        }
    }

    pub(crate) async fn send(mut self) -> Result<ConnectionStatus<Transport>> {
        let mut output_buffer = Vec::with_capacity(self.http_config.write_buffer_len);
        self.write_headers(&mut output_buffer)?;

        let mut bufwriter = BufWriter::new_with_buffer(output_buffer, &mut self.transport);

        if self.method != Method::Head
            && !matches!(self.status, Some(Status::NotModified | Status::NoContent))
        {
            if let Some(body) = self.response_body.take() {
                copy(
                    BodyEncoder::new(body),
                    &mut bufwriter,
                    self.http_config.copy_buffer_len,
                    self.http_config.copy_loops_per_yield,
                )
                .await?;
            }
        }

        bufwriter.flush().await?;
        self.finish().await
    }

    /// Calculates any auto-generated headers for this conn prior to
    /// sending it: `Date`, and the body framing header. The framing is
    /// decided by the body's declared length, never by the handler: a
    /// known length becomes `Content-Length` and an unknown length
    /// becomes `Transfer-Encoding: chunked`. Responses that forbid a body
    /// (204, 304) carry neither.
    pub fn finalize_headers(&mut self) {
        self.response_headers
            .try_insert_with(Date, || httpdate::fmt_http_date(SystemTime::now()));

        if matches!(self.status, Some(Status::NotModified | Status::NoContent)) {
            self.response_headers.remove(ContentLength);
            self.response_headers.remove(TransferEncoding);
        } else if let Some(len) = self.body_len() {
            self.response_headers.try_insert(ContentLength, len);
            self.response_headers.remove(TransferEncoding);
        } else {
            self.response_headers.insert(TransferEncoding, "chunked");
            self.response_headers.remove(ContentLength);
        }
    }

    fn body_len(&self) -> Option<u64> {
        match self.response_body {
            Some(ref body) => body.len(),
            None => Some(0),
        }
    }

    fn write_headers(&mut self, output_buffer: &mut Vec<u8>) -> Result<()> {
        use std::io::Write;
        let status = self.status().unwrap_or(Status::NotFound);

        write!(
            output_buffer,
            "HTTP/1.1 {} {}\r\n",
            status as u16,
            status.canonical_reason()
        )?;

        self.finalize_headers();

        log::trace!(
            "sending:\nHTTP/1.1 {} {}\n{}",
            status as u16,
            status.canonical_reason(),
            &self.response_headers
        );

        for (name, values) in &self.response_headers {
            if name.is_valid() {
                for value in values {
                    if value.is_valid() {
                        write!(output_buffer, "{name}: ")?;
                        output_buffer.extend_from_slice(value.as_ref());
                        write!(output_buffer, "\r\n")?;
                    } else {
                        log::error!("skipping invalid header value {value:?} for header {name}");
                    }
                }
            } else {
                log::error!("skipping invalid header with name {name:?}");
            }
        }

        write!(output_buffer, "\r\n")?;
        Ok(())
    }

    fn should_close(&self) -> bool {
        let request_connection = self
            .request_headers
            .get_str(Connection)
            .map(|s| s.to_ascii_lowercase());
        let response_connection = self
            .response_headers
            .get_str(Connection)
            .map(|s| s.to_ascii_lowercase());

        match (
            request_connection.as_deref(),
            response_connection.as_deref(),
        ) {
            (Some("keep-alive"), Some("keep-alive")) => false,
            (Some("close"), _) | (_, Some("close")) => true,
            _ => self.version == Version::Http1_0,
        }
    }

    async fn next(mut self) -> Result<Self> {
        self.request_body().drain().await?;
        Conn::new_internal(self.http_config, self.transport, self.buffer).await
    }

    async fn finish(self) -> Result<ConnectionStatus<Transport>> {
        if self.should_close() {
            Ok(ConnectionStatus::Close)
        } else {
            match self.next().await {
                Err(Error::Closed) => {
                    log::trace!("connection closed by client");
                    Ok(ConnectionStatus::Close)
                }
                Err(e) => Err(e),
                Ok(conn) => Ok(ConnectionStatus::Conn(conn)),
            }
        }
    }
}

/// Decide how the request body is framed, and reject the combinations
/// that have no coherent reading: a `Content-Length` that does not parse
/// as a decimal integer, both `Content-Length` and
/// `Transfer-Encoding: chunked` on one request, and any declared body on
/// a GET or HEAD request. Of `Transfer-Encoding`, only the first
/// comma-separated token is considered.
fn request_framing(method: Method, request_headers: &Headers) -> Result<(Option<u64>, bool)> {
    let chunked = request_headers
        .get_str(TransferEncoding)
        .and_then(|te| te.split(',').next())
        .is_some_and(|first| first.trim().eq_ignore_ascii_case("chunked"));

    let content_length = match request_headers.get_str(ContentLength) {
        Some(value) => Some(
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::InvalidContentLength)?,
        ),
        None => None,
    };

    if chunked && content_length.is_some() {
        return Err(Error::UnexpectedHeader(ContentLength.into()));
    }

    if matches!(method, Method::Get | Method::Head) {
        if chunked || content_length.is_some_and(|len| len > 0) {
            return Err(Error::UnexpectedBody(method));
        }
        return Ok((Some(0), false));
    }

    Ok((content_length, chunked))
}

/// Write a minimal error response directly to the transport, best
/// effort. This runs outside the normal response path, after request
/// parsing has failed, so there is no `Conn` to speak of; the connection
/// is destroyed as soon as these bytes are accepted.
async fn send_error_response<Transport>(transport: &mut Transport, status: Status)
where
    Transport: AsyncWrite + Unpin,
{
    use std::io::Write;
    let body = format!("{} {}\n", status as u16, status.canonical_reason());
    let mut output_buffer = Vec::with_capacity(128);
    let _ = write!(
        output_buffer,
        "HTTP/1.1 {} {}\r\nConnection: close\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\n\r\n{}",
        status as u16,
        status.canonical_reason(),
        body.len(),
        body
    );

    if let Err(e) = transport.write_all(&output_buffer).await {
        log::trace!("unable to send error response: {e}");
    } else {
        let _ = transport.flush().await;
    }
}
