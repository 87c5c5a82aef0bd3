#![forbid(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations, nonstandard_style)]

/*!
This crate represents the http/1.1 protocol engine for the coracle origin
server. It handles the per-connection request/response cycle over any
transport that implements [`futures_lite::AsyncRead`] and
[`futures_lite::AsyncWrite`]: incremental head parsing out of a growing
receive buffer, pull-based request bodies with fixed-length, chunked, and
read-until-close framing, response bodies with content-length or chunked
framing, and http/1.1 keep-alive.

It contains no tcp listener, no router, and no filesystem layer; those
live in the sibling `coracle-smol` and `coracle-static` crates, or in
whatever handler the application supplies.

```
use coracle_http::{Conn, Method, Status};

async fn handler<T>(mut conn: Conn<T>) -> Conn<T>
where
    T: futures_lite::AsyncRead + futures_lite::AsyncWrite + Unpin + Send + Sync + 'static,
{
    conn.set_status(Status::Ok);
    conn.set_response_body("hello world.\n");
    conn
}
```
*/

mod body;
pub use body::Body;

mod body_encoder;
pub use body_encoder::BodyEncoder;

mod buffer;
#[doc(hidden)]
pub use buffer::ReceiveBuffer;

mod bufwriter;

mod chunked_encoder;
pub use chunked_encoder::ChunkedEncoder;

mod conn;
pub use conn::{Conn, ConnectionStatus, SERVER};

mod copy;

mod error;
pub use error::{Error, Result};

mod headers;
pub use headers::{HeaderName, HeaderValue, HeaderValues, Headers, KnownHeaderName};

mod http_config;
pub use http_config::HttpConfig;

mod method;
pub use method::Method;

mod received_body;
pub use received_body::{ReceivedBody, ReceivedBodyState};

mod server_config;
pub use server_config::ServerConfig;

mod status;
pub use status::Status;

mod synthetic;
pub use synthetic::Synthetic;

mod version;
pub use version::Version;
