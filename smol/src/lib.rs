#![forbid(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations, nonstandard_style)]

/*!
A tcp listener for the coracle origin server, on the smol async stack.

[`Server`] binds an [`async_net::TcpListener`] (to `127.0.0.1:1234`
unless told otherwise), accepts connections in a loop, and drives each
one through [`coracle_http::ServerConfig::run`] on its own detached
executor task. Connections never share state; a connection-level
protocol error ends only that connection, and has already been answered
with an error response by the protocol engine.

```no_run
use coracle_http::Status;
use coracle_smol::Server;

fn main() -> std::io::Result<()> {
    Server::new(|mut conn| async move {
        conn.set_status(Status::Ok);
        conn.set_response_body("hello world.\n");
        conn
    })
    .run()
}
```
*/

mod server;
pub use server::Server;
