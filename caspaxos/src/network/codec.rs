use std::io::ErrorKind;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// Upper bound on a frame body.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Writes `message` as a 4-byte big-endian length followed by its JSON body.
pub async fn write_frame<W, M>(writer: &mut W, message: &M) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    M: Serialize,
{
    let body = serde_json::to_vec(message)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge {
            size: body.len(),
            limit: MAX_FRAME_LEN,
        });
    }

    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame. Returns `None` if the peer closed the stream between frames.
pub async fn read_frame<R, M>(reader: &mut R) -> Result<Option<M>, TransportError>
where
    R: AsyncRead + Unpin,
    M: DeserializeOwned,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge {
            size: len,
            limit: MAX_FRAME_LEN,
        });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::messages::Request;
    use crate::paxos::ballot::Ballot;

    #[tokio::test]
    async fn frames_cross_a_stream_in_order() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let first: Request<String> = Request::Prepare {
            ballot: Ballot::new(1, 2),
        };
        let second: Request<String> = Request::Propose {
            expected_state: Some(3),
            payload: "v4".to_string(),
        };

        write_frame(&mut client, &first).await.unwrap();
        write_frame(&mut client, &second).await.unwrap();
        drop(client);

        let got: Option<Request<String>> = read_frame(&mut server).await.unwrap();
        assert_eq!(got, Some(first));
        let got: Option<Request<String>> = read_frame(&mut server).await.unwrap();
        assert_eq!(got, Some(second));
        let got: Option<Request<String>> = read_frame(&mut server).await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn oversized_header_is_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client
            .write_all(&((MAX_FRAME_LEN as u32) + 1).to_be_bytes())
            .await
            .unwrap();

        let result: Result<Option<Request<String>>, _> = read_frame(&mut server).await;
        assert!(matches!(
            result,
            Err(TransportError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn garbage_body_is_a_codec_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&3u32.to_be_bytes()).await.unwrap();
        client.write_all(b"{{{").await.unwrap();

        let result: Result<Option<Request<String>>, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(TransportError::Codec(_))));
    }
}
