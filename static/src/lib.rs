#![forbid(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations, nonstandard_style)]

/*!
Filesystem-backed responses for the coracle origin server.

[`FileHandler`] maps request paths onto a directory tree and answers with
whole-file or byte-range responses, streaming file contents through the
response body rather than buffering them. Paths are resolved strictly
beneath the configured root; anything else, along with every filesystem
error, is a plain 404.

```no_run
use coracle_static::FileHandler;

let files = FileHandler::new("./public");
// inside a handler: `conn = files.respond(conn).await;`
```
*/

mod handler;
pub use handler::FileHandler;

mod range;
