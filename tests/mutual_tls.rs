//! Mutual TLS: a real server with `server.tls.enabled`, driven by rustls
//! clients with and without CA-signed certificates.

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer, ServerName};
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use vertexkv::config::{ServerConfig, TlsConfig};
use vertexkv::connection::ConnectionStats;
use vertexkv::server::Server;
use vertexkv::storage::Datastore;

struct Authority {
    cert: Certificate,
    key: KeyPair,
}

impl Authority {
    fn new(name: &str) -> Self {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name.push(DnType::CommonName, name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];

        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        Self { cert, key }
    }

    /// Issues a leaf certificate for `purpose`.
    fn issue(&self, name: &str, purpose: ExtendedKeyUsagePurpose) -> (Certificate, KeyPair) {
        let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, name);
        params.extended_key_usages = vec![purpose];

        let key = KeyPair::generate().unwrap();
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        (cert, key)
    }
}

/// Writes server material signed by `ca` and starts a TLS server.
async fn start_tls_server(dir: &TempDir, ca: &Authority) -> (SocketAddr, Arc<Datastore>) {
    let (server_cert, server_key) = ca.issue("localhost", ExtendedKeyUsagePurpose::ServerAuth);

    let tls = TlsConfig {
        enabled: true,
        cert_path: dir.path().join("server.crt"),
        key_path: dir.path().join("server.key"),
        ca_path: dir.path().join("ca.crt"),
    };
    fs::write(&tls.cert_path, server_cert.pem()).unwrap();
    fs::write(&tls.key_path, server_key.serialize_pem()).unwrap();
    fs::write(&tls.ca_path, ca.cert.pem()).unwrap();

    let config = ServerConfig {
        address: "127.0.0.1".to_string(),
        port: 0,
        tls,
    };
    let store = Arc::new(Datastore::new());
    let server = Server::bind(&config, Arc::clone(&store), Arc::new(ConnectionStats::new()))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    (addr, store)
}

/// Builds a connector trusting `ca`, presenting `identity` if given.
fn connector(ca: &Authority, identity: Option<(Certificate, KeyPair)>) -> TlsConnector {
    let mut roots = RootCertStore::empty();
    roots.add(ca.cert.der().clone()).unwrap();

    let builder = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(roots);

    let config = match identity {
        Some((cert, key)) => builder
            .with_client_auth_cert(
                vec![cert.der().clone()],
                PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
            )
            .unwrap(),
        None => builder.with_no_client_auth(),
    };
    TlsConnector::from(Arc::new(config))
}

async fn connect(
    connector: &TlsConnector,
    addr: SocketAddr,
) -> std::io::Result<TlsStream<TcpStream>> {
    let stream = TcpStream::connect(addr).await?;
    let domain = ServerName::try_from("localhost").unwrap();
    connector.connect(domain, stream).await
}

async fn read_reply(client: &mut TlsStream<TcpStream>, len: usize) -> String {
    let mut buf = vec![0u8; len];
    tokio::time::timeout(Duration::from_secs(5), client.read_exact(&mut buf))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8(buf).unwrap()
}

/// Asserts the server refuses the connection, either during the handshake or
/// on the first request (TLS 1.3 clients finish before the server checks
/// their certificate).
async fn assert_rejected(connector: &TlsConnector, addr: SocketAddr) {
    let mut client = match connect(connector, addr).await {
        Err(_) => return,
        Ok(client) => client,
    };

    let _ = client.write_all(b"SET intruder 1\n").await;
    let _ = client.flush().await;

    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(5), client.read(&mut buf))
        .await
        .unwrap();
    assert!(
        matches!(read, Ok(0) | Err(_)),
        "server answered a client it should have refused: {:?}",
        read
    );
}

#[tokio::test]
async fn client_with_ca_signed_certificate_is_served() {
    let dir = TempDir::new().unwrap();
    let ca = Authority::new("VertexKV Test CA");
    let (addr, store) = start_tls_server(&dir, &ca).await;

    let identity = ca.issue("client", ExtendedKeyUsagePurpose::ClientAuth);
    let mut client = connect(&connector(&ca, Some(identity)), addr)
        .await
        .unwrap();

    client.write_all(b"SET secure yes\n").await.unwrap();
    client.flush().await.unwrap();
    assert_eq!(read_reply(&mut client, 4).await, "OK\r\n");

    client.write_all(b"GET secure\n").await.unwrap();
    client.flush().await.unwrap();
    assert_eq!(read_reply(&mut client, 19).await, "VALUE secure\r\nyes\r\n");

    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn client_without_certificate_is_rejected() {
    let dir = TempDir::new().unwrap();
    let ca = Authority::new("VertexKV Test CA");
    let (addr, store) = start_tls_server(&dir, &ca).await;

    assert_rejected(&connector(&ca, None), addr).await;
    assert!(store.is_empty());
}

#[tokio::test]
async fn client_signed_by_another_ca_is_rejected() {
    let dir = TempDir::new().unwrap();
    let ca = Authority::new("VertexKV Test CA");
    let (addr, store) = start_tls_server(&dir, &ca).await;

    let rogue = Authority::new("Rogue CA");
    let identity = rogue.issue("client", ExtendedKeyUsagePurpose::ClientAuth);

    // Trusts the real server but presents a certificate it cannot verify
    assert_rejected(&connector(&ca, Some(identity)), addr).await;
    assert!(store.is_empty());
}

#[tokio::test]
async fn plain_tcp_client_gets_no_reply() {
    let dir = TempDir::new().unwrap();
    let ca = Authority::new("VertexKV Test CA");
    let (addr, store) = start_tls_server(&dir, &ca).await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"SET plain 1\n").await.unwrap();

    // The handshake fails and the server closes the socket without a reply
    let mut buf = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut buf))
        .await
        .unwrap();
    assert!(read.is_err() || !buf.starts_with(b"OK"));
    assert!(store.is_empty());
}
