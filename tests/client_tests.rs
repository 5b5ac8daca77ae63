//! End-to-end tests pairing the client driver with the in-process server.

use ferroftp::core_client::{FtpClient, FtpError};
use ferroftp::core_network::network::start_server;
use ferroftp::{AccountStore, Config};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;

async fn spawn_server(root: &Path) -> (SocketAddr, watch::Sender<bool>) {
    let config = Config::parse(
        "usernamefile = users.db\nport_mode = YES\npasv_mode = YES\n",
    )
    .unwrap();
    let accounts = AccountStore::parse("alice secret\n").unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(start_server(
        listener,
        Arc::new(config),
        Arc::new(accounts),
        root.to_path_buf(),
        shutdown_rx,
    ));
    (addr, shutdown_tx)
}

async fn connected_client(addr: SocketAddr) -> FtpClient {
    let mut client = FtpClient::connect("127.0.0.1", addr.port()).await.unwrap();
    client.login("alice", "secret").await.unwrap();
    client
}

#[tokio::test]
async fn passive_retr_saves_an_identical_file() {
    let root = TempDir::new().unwrap();
    let payload: Vec<u8> = (0u32..10_000).map(|i| (i * 7 % 256) as u8).collect();
    std::fs::write(root.path().join("blob.bin"), &payload).unwrap();
    let downloads = TempDir::new().unwrap();

    let (addr, _shutdown) = spawn_server(root.path()).await;
    let mut client = connected_client(addr).await;
    client.set_download_dir(downloads.path());

    assert_eq!(client.execute("pasv").await.unwrap().code, 227);
    let final_reply = client.execute("retr blob.bin").await.unwrap();
    assert_eq!(final_reply.code, 226);

    let saved = std::fs::read(downloads.path().join("blob.bin")).unwrap();
    assert_eq!(saved, payload);
}

#[tokio::test]
async fn epsv_retr_saves_an_identical_file() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("f.bin"), b"\x00\xff\r\n\x00").unwrap();
    let downloads = TempDir::new().unwrap();

    let (addr, _shutdown) = spawn_server(root.path()).await;
    let mut client = connected_client(addr).await;
    client.set_download_dir(downloads.path());

    assert_eq!(client.execute("epsv").await.unwrap().code, 229);
    assert_eq!(client.execute("retr f.bin").await.unwrap().code, 226);
    assert_eq!(
        std::fs::read(downloads.path().join("f.bin")).unwrap(),
        b"\x00\xff\r\n\x00"
    );
}

#[tokio::test]
async fn active_list_completes() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), b"a").unwrap();

    let (addr, _shutdown) = spawn_server(root.path()).await;
    let mut client = connected_client(addr).await;

    assert_eq!(client.execute("port").await.unwrap().code, 200);
    assert_eq!(client.execute("list").await.unwrap().code, 226);
}

#[tokio::test]
async fn active_retr_via_eprt_completes() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("tool.bin"), b"0123456789").unwrap();
    let downloads = TempDir::new().unwrap();

    let (addr, _shutdown) = spawn_server(root.path()).await;
    let mut client = connected_client(addr).await;
    client.set_download_dir(downloads.path());

    assert_eq!(client.execute("eprt").await.unwrap().code, 200);
    assert_eq!(client.execute("retr tool.bin").await.unwrap().code, 226);
    assert_eq!(
        std::fs::read(downloads.path().join("tool.bin")).unwrap(),
        b"0123456789"
    );
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let root = TempDir::new().unwrap();
    let (addr, _shutdown) = spawn_server(root.path()).await;
    let mut client = FtpClient::connect("127.0.0.1", addr.port()).await.unwrap();
    let err = client.login("alice", "nope").await.unwrap_err();
    assert!(matches!(err, FtpError::LoginRejected(_)));
}

#[tokio::test]
async fn login_with_unknown_user_is_rejected() {
    let root = TempDir::new().unwrap();
    let (addr, _shutdown) = spawn_server(root.path()).await;
    let mut client = FtpClient::connect("127.0.0.1", addr.port()).await.unwrap();
    let err = client.login("mallory", "x").await.unwrap_err();
    assert!(matches!(err, FtpError::UserRejected(_)));
}

#[tokio::test]
async fn transfer_without_negotiation_returns_426() {
    let root = TempDir::new().unwrap();
    let (addr, _shutdown) = spawn_server(root.path()).await;
    let mut client = connected_client(addr).await;
    assert_eq!(client.execute("list").await.unwrap().code, 426);
}

#[tokio::test]
async fn free_form_commands_pass_through() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir(root.path().join("docs")).unwrap();
    let (addr, _shutdown) = spawn_server(root.path()).await;
    let mut client = connected_client(addr).await;

    assert_eq!(client.execute("cwd docs").await.unwrap().code, 250);
    assert_eq!(client.execute("pwd").await.unwrap().code, 257);
    assert_eq!(client.execute("cdup").await.unwrap().code, 250);
    assert_eq!(client.execute("help").await.unwrap().code, 214);
    assert_eq!(client.execute("quit").await.unwrap().code, 221);
}
