//! Websocket transport
//!
//! Opens the chat socket with the `chat` sub-protocol and splits it into a
//! reader (owned by the receive loop) and a writer shared by everything that
//! sends: the handshake, the keepalive task and [`ConnectionHandle`]s.
//!
//! Chat servers present self-signed and rotating certificates, so TLS
//! certificate and hostname verification is disabled for this socket. The
//! channel is encrypted but the peer is not authenticated.
//!
//! [`ConnectionHandle`]: super::ConnectionHandle

use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};

use crate::error::TransportError;
use crate::protocol::constants::CHAT_SUBPROTOCOL;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code reported when the stream ends without a close frame
const ABNORMAL_CLOSE: u16 = 1006;

/// Write half of the chat socket
#[derive(Debug)]
pub struct FrameWriter {
    sink: SplitSink<WsStream, Message>,
}

impl FrameWriter {
    /// Send one complete frame as a binary message
    pub async fn send(&mut self, frame: Bytes) -> Result<(), TransportError> {
        self.sink
            .send(Message::Binary(frame.to_vec()))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    /// Send a close frame and shut the sink
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}

/// Writer slot shared between the receive loop, keepalive and handles
///
/// Empty until the socket opens and after it closes. The mutex keeps frames
/// from different senders from interleaving.
pub type SharedWriter = Arc<Mutex<Option<FrameWriter>>>;

/// Read half of the chat socket
#[derive(Debug)]
pub struct FrameReader {
    stream: SplitStream<WsStream>,
}

impl FrameReader {
    /// Receive the next frame
    ///
    /// Text messages are returned as their UTF-8 bytes. Control messages are
    /// skipped. A close frame or end of stream becomes
    /// [`TransportError::Closed`].
    pub async fn recv(&mut self) -> Result<Bytes, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Bytes::from(data)),
                Some(Ok(Message::Text(text))) => return Ok(Bytes::from(text.into_bytes())),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|cf| (u16::from(cf.code), cf.reason.to_string()))
                        .unwrap_or((ABNORMAL_CLOSE, String::new()));
                    return Err(TransportError::Closed { code, reason });
                }
                Some(Err(e)) => return Err(TransportError::Read(e.to_string())),
                None => {
                    return Err(TransportError::Closed {
                        code: ABNORMAL_CLOSE,
                        reason: String::new(),
                    })
                }
            }
        }
    }
}

/// Open the chat socket at `url`
///
/// `wss://` URLs use the relaxed TLS configuration; `ws://` URLs connect in
/// plain text.
pub async fn connect(url: &str) -> Result<(FrameWriter, FrameReader), TransportError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| TransportError::Connect(format!("invalid socket URL {}: {}", url, e)))?;
    request.headers_mut().insert(
        SEC_WEBSOCKET_PROTOCOL,
        HeaderValue::from_static(CHAT_SUBPROTOCOL),
    );

    let connector = Connector::Rustls(Arc::new(relaxed_tls_config()?));

    let (ws, _response) =
        tokio_tungstenite::connect_async_tls_with_config(request, None, true, Some(connector))
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

    let (sink, stream) = ws.split();
    Ok((FrameWriter { sink }, FrameReader { stream }))
}

/// TLS client config that accepts any server certificate
fn relaxed_tls_config() -> Result<rustls::ClientConfig, TransportError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Connect(format!("TLS setup failed: {}", e)))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
        .with_no_client_auth();

    Ok(config)
}

/// Certificate verifier that accepts every certificate and signature
#[derive(Debug)]
struct AcceptAnyCert;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relaxed_tls_config_builds() {
        assert!(relaxed_tls_config().is_ok());
    }

    #[tokio::test]
    async fn test_connect_invalid_url() {
        let result = connect("not a url").await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let result = connect("ws://127.0.0.1:1/Websocket").await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
