//! Per-connection request loop: frames are processed strictly in order on a
//! single connection, one at a time.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::config::Facility;
use crate::context::AppContext;
use crate::debug_for;

use super::frame::{XaxRequest, REQUEST_LEN};
use super::request::translate;

pub async fn handle<S>(ctx: Arc<AppContext>, mut stream: S)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut buf = [0u8; REQUEST_LEN];
    loop {
        tokio::select! {
            () = ctx.shutdown_requested() => return,
            result = stream.read_exact(&mut buf) => {
                match result {
                    Ok(_) => {}
                    Err(_) => return,
                }
            }
        }

        let request = match XaxRequest::decode(&buf) {
            Ok(request) => request,
            Err(err) => {
                debug_for!(Facility::Xax, "dropping connection on malformed frame: {err}");
                return;
            }
        };

        let response = translate(&ctx.client_mapper, &ctx.substitute_mapper, &request);
        if stream.write_all(&response.encode()).await.is_err() {
            return;
        }
    }
}
