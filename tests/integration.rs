mod common;

use std::time::Duration;

use tokio::net::TcpStream;

use common::{connect, login, payload, start_server, start_server_with};
use rax_ftps_server::transfer::decode_pasv;

#[tokio::test]
async fn admin_session_walkthrough() {
    let server = start_server().await;
    let mut client = connect(&server).await;
    assert_eq!(client.greeting().code, 220);
    assert_eq!(client.greeting().text, "FTP Server Ready");

    let reply = client.login("admin", "admin123").await.unwrap();
    assert_eq!(reply.code, 230);

    assert_eq!(client.mkd("test").await.unwrap().code, 257);
    assert!(server.path("test").is_dir());

    let stored = client
        .store("report.txt", Some("Uploads"), b"quarterly numbers\n")
        .await
        .unwrap();
    assert_eq!(stored.codes(), vec![227, 150, 226]);

    let listing = client.list(Some("Uploads")).await.unwrap();
    assert_eq!(listing.codes(), vec![227, 150, 226]);
    let text = listing.text();
    assert!(text.starts_with("report.txt\t\t18 bytes\t\tPermissions: "), "{text}");
    assert!(text.contains("\t\tCreated: "));

    let retrieved = client.retrieve("report.txt").await.unwrap();
    assert_eq!(retrieved.codes(), vec![227, 150, 226]);
    assert_eq!(retrieved.data, b"quarterly numbers\n");

    assert_eq!(client.dele("report.txt").await.unwrap().code, 250);
    assert!(!server.path("Uploads/report.txt").exists());
    assert_eq!(client.rmd("test").await.unwrap().code, 250);
    assert!(!server.path("test").exists());

    assert_eq!(client.quit().await.unwrap().code, 221);
}

#[tokio::test]
async fn unauthenticated_commands_are_rejected_without_side_effects() {
    let server = start_server().await;
    std::fs::write(server.path("keep.txt"), b"x").unwrap();
    let mut client = connect(&server).await;

    let lines = [
        "PWD",
        "CWD /",
        "CDUP",
        "LIST",
        "RETR keep.txt",
        "STOR a.txt",
        "DELE keep.txt",
        "MKD d",
        "RMD d",
        "SITE HELP",
    ];
    for line in lines {
        let reply = client.command(line).await.unwrap();
        assert_eq!(reply.code, 530, "{line}");
        assert_eq!(reply.text, "Not logged in.");
    }
    assert!(server.path("keep.txt").exists());
    assert!(!server.path("d").exists());
    assert!(!server.path("Uploads").exists());
}

#[tokio::test]
async fn roles_are_enforced() {
    let server = start_server().await;
    std::fs::write(server.path("shared.txt"), b"shared").unwrap();
    std::fs::create_dir(server.path("keep")).unwrap();

    let mut lvl3 = login(&server, "user3", "user789").await;
    assert_eq!(lvl3.command("RETR shared.txt").await.unwrap().text, "Not allowed.");
    assert_eq!(lvl3.command("STOR x.txt").await.unwrap().code, 530);
    assert_eq!(lvl3.mkd("d3").await.unwrap().code, 530);
    assert_eq!(lvl3.list(None).await.unwrap().codes(), vec![227, 150, 226]);

    let mut lvl2 = login(&server, "user2", "user456").await;
    assert_eq!(lvl2.retrieve("shared.txt").await.unwrap().data, b"shared");
    assert_eq!(lvl2.command("STOR x.txt").await.unwrap().code, 530);
    assert_eq!(lvl2.mkd("d2").await.unwrap().code, 530);

    let mut lvl1 = login(&server, "user1", "user123").await;
    assert!(lvl1.store("x.txt", None, b"1").await.unwrap().completed());
    assert_eq!(lvl1.mkd("d1").await.unwrap().code, 257);
    assert_eq!(lvl1.dele("shared.txt").await.unwrap().code, 530);
    assert_eq!(lvl1.rmd("keep").await.unwrap().code, 530);

    assert!(server.path("shared.txt").exists());
    assert!(server.path("keep").is_dir());
    assert!(!server.path("d2").exists());
    assert!(!server.path("d3").exists());
}

#[tokio::test]
async fn stored_files_come_back_byte_identical() {
    let server = start_server().await;
    let mut client = login(&server, "admin", "admin123").await;
    let contents = payload(150_000, 7);

    let stored = client.store("blob.bin", Some("/data/in"), &contents).await.unwrap();
    assert!(stored.completed(), "{:?}", stored.replies);
    assert_eq!(std::fs::read(server.path("data/in/blob.bin")).unwrap(), contents);

    let retrieved = client.retrieve("/data/in/blob.bin").await.unwrap();
    assert!(retrieved.completed());
    assert_eq!(retrieved.data, contents);
}

#[tokio::test]
async fn store_defaults_to_the_upload_directory() {
    let server = start_server().await;
    let mut client = login(&server, "user1", "user123").await;

    assert!(client.store("notes.txt", None, b"hello").await.unwrap().completed());
    assert_eq!(std::fs::read(server.path("Uploads/notes.txt")).unwrap(), b"hello");

    assert_eq!(client.cwd("Uploads").await.unwrap().code, 250);
    assert_eq!(client.retrieve("notes.txt").await.unwrap().data, b"hello");
}

#[tokio::test]
async fn concurrent_uploads_from_two_sessions_do_not_interfere() {
    let server = start_server().await;
    let mut first = login(&server, "admin", "admin123").await;
    let mut second = login(&server, "user1", "user123").await;
    let a = payload(200_000, 1);
    let b = payload(200_000, 2);

    let (ra, rb) = tokio::join!(
        first.store("a.bin", None, &a),
        second.store("b.bin", None, &b)
    );
    assert!(ra.unwrap().completed());
    assert!(rb.unwrap().completed());

    assert_eq!(std::fs::read(server.path("Uploads/a.bin")).unwrap(), a);
    assert_eq!(std::fs::read(server.path("Uploads/b.bin")).unwrap(), b);
}

#[tokio::test]
async fn working_directories_are_per_session() {
    let server = start_server().await;
    std::fs::create_dir_all(server.path("one/two")).unwrap();
    let mut first = login(&server, "user2", "user456").await;
    let mut second = login(&server, "user2", "user456").await;

    assert_eq!(first.cwd("one/two").await.unwrap().code, 250);
    assert_eq!(first.pwd().await.unwrap().text, "\"/one/two\" is the current directory.");
    assert_eq!(second.pwd().await.unwrap().text, "\"/\" is the current directory.");
}

#[tokio::test]
async fn failed_cwd_leaves_the_directory_unchanged() {
    let server = start_server().await;
    std::fs::create_dir(server.path("docs")).unwrap();
    let mut client = login(&server, "user3", "user789").await;

    assert_eq!(client.cwd("docs").await.unwrap().code, 250);
    let reply = client.cwd("does-not-exist").await.unwrap();
    assert_eq!(reply.code, 550);
    assert_eq!(client.pwd().await.unwrap().text, "\"/docs\" is the current directory.");

    assert_eq!(client.cwd("../../..").await.unwrap().code, 550);
    assert_eq!(client.pwd().await.unwrap().text, "\"/docs\" is the current directory.");
}

#[tokio::test]
async fn cdup_stops_at_the_root() {
    let server = start_server().await;
    std::fs::create_dir(server.path("sub")).unwrap();
    let mut client = login(&server, "user3", "user789").await;

    let reply = client.cdup().await.unwrap();
    assert_eq!(reply.code, 550);
    assert_eq!(reply.text, "Already at root directory.");

    client.cwd("sub").await.unwrap();
    assert_eq!(client.cdup().await.unwrap().code, 250);
    assert_eq!(client.pwd().await.unwrap().text, "\"/\" is the current directory.");
}

#[tokio::test]
async fn passive_reply_names_the_listening_port() {
    let server = start_server_with(|c| c.data_accept_timeout_secs = 2).await;
    let mut client = login(&server, "admin", "admin123").await;

    let reply = client.command("LIST").await.unwrap();
    assert_eq!(reply.code, 227);
    let addr = decode_pasv(&reply.text).unwrap();
    assert_eq!(addr.ip().octets(), [127, 0, 0, 1]);

    // Something is listening where the reply says; a plain TCP peer fails
    // the TLS handshake and the transfer is refused.
    let probe = TcpStream::connect(addr).await.unwrap();
    drop(probe);
    assert_eq!(client.read_reply().await.unwrap().code, 425);
    assert_eq!(client.pwd().await.unwrap().code, 257);
}

#[tokio::test]
async fn unanswered_data_channel_times_out() {
    let server = start_server_with(|c| c.data_accept_timeout_secs = 1).await;
    std::fs::write(server.path("file.txt"), b"data").unwrap();
    let mut client = login(&server, "admin", "admin123").await;

    assert_eq!(client.command("RETR file.txt").await.unwrap().code, 227);
    let reply = tokio::time::timeout(Duration::from_secs(5), client.read_reply())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.code, 425);

    // The control channel survives and the next transfer works.
    assert_eq!(client.retrieve("file.txt").await.unwrap().data, b"data");
}

#[tokio::test]
async fn missing_and_escaping_paths_get_550() {
    let server = start_server().await;
    let mut client = login(&server, "admin", "admin123").await;

    let outcome = client.retrieve("ghost.txt").await.unwrap();
    assert_eq!(outcome.codes(), vec![550]);
    assert_eq!(client.retrieve("../../etc/passwd").await.unwrap().codes(), vec![550]);
    assert_eq!(client.list(Some("nowhere")).await.unwrap().codes(), vec![550]);
    assert_eq!(client.dele("ghost.txt").await.unwrap().code, 550);
    assert_eq!(client.rmd("/").await.unwrap().code, 550);
}

#[tokio::test]
async fn empty_directory_listing() {
    let server = start_server().await;
    let mut client = login(&server, "user3", "user789").await;
    let listing = client.list(None).await.unwrap();
    assert!(listing.completed());
    assert_eq!(listing.text(), "No files found.\r\n");
}

#[tokio::test]
async fn connections_beyond_max_clients_are_refused() {
    let server = start_server_with(|c| c.max_clients = 1).await;
    let first = login(&server, "admin", "admin123").await;

    let second = connect(&server).await;
    assert_eq!(second.greeting().code, 421);
    assert_eq!(second.greeting().text, "Too many connections");

    assert_eq!(first.quit().await.unwrap().code, 221);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let third = connect(&server).await;
    assert_eq!(third.greeting().code, 220);
}

#[tokio::test]
async fn bad_password_then_retry() {
    let server = start_server().await;
    let mut client = connect(&server).await;

    let reply = client.login("admin", "wrong").await.unwrap();
    assert_eq!(reply.code, 530);
    assert_eq!(client.command("PASS admin123").await.unwrap().code, 530);
    assert_eq!(client.login("admin", "admin123").await.unwrap().code, 230);
}
