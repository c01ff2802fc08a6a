#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Edge-case tests over real sockets and in-memory pipes
//! Covers transport detection, fragmented delivery, premature close and replay

use easytier_sniff::core::header::{HandshakeHeader, MessageType, HANDSHAKE_LEN};
use easytier_sniff::core::metadata::{MetadataContext, KEY_CONN_ID, KEY_MAGIC, KEY_MSG_TYPE};
use easytier_sniff::protocol::chain::MatcherChain;
use easytier_sniff::protocol::directive::parse_directive;
use easytier_sniff::protocol::matcher::{ConnMatcher, EasyTierConfigServer};
use easytier_sniff::transport::{Flow, LocalAddr};
use std::time::Duration;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};

const REFERENCE_SYN: [u8; HANDSHAKE_LEN] = [
    0xDD, 0xCC, 0xBB, 0xAA, 0x01, 0x00, 0x08, 0x00, 0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01,
];

fn udp_local() -> LocalAddr {
    LocalAddr::Udp("127.0.0.1:11010".parse().unwrap())
}

// ============================================================================
// REFERENCE SCENARIOS
// ============================================================================

#[tokio::test]
async fn test_reference_syn_over_udp_socket() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client
        .send_to(&REFERENCE_SYN, server.local_addr().unwrap())
        .await
        .unwrap();

    let mut buf = [0u8; 1500];
    let (n, peer) = server.recv_from(&mut buf).await.unwrap();
    assert_eq!(peer, client.local_addr().unwrap());

    let mut flow = Flow::from_datagram(
        buf[..n].to_vec(),
        server.local_addr().unwrap(),
        peer,
    );
    let ctx = MetadataContext::new();

    assert!(EasyTierConfigServer.matches(&mut flow, Some(&ctx)).await.unwrap());
    assert_eq!(ctx.get_u32(KEY_CONN_ID), Some(0xAABBCCDD));
    assert_eq!(ctx.get_str(KEY_MSG_TYPE).as_deref(), Some("syn"));
    assert_eq!(ctx.get_u64(KEY_MAGIC), Some(0x0123456789ABCDEF));
}

#[tokio::test]
async fn test_reference_sack_and_unknown_type() {
    let mut sack = REFERENCE_SYN;
    sack[4] = 0x02;
    let mut flow = Flow::new(std::io::Cursor::new(sack), udp_local());
    let ctx = MetadataContext::new();
    assert!(EasyTierConfigServer.matches(&mut flow, Some(&ctx)).await.unwrap());
    assert_eq!(ctx.get_str(KEY_MSG_TYPE).as_deref(), Some("sack"));
    assert_eq!(ctx.get_u32(KEY_CONN_ID), Some(0xAABBCCDD));
    assert_eq!(ctx.get_u64(KEY_MAGIC), Some(0x0123456789ABCDEF));

    let mut unknown = REFERENCE_SYN;
    unknown[4] = 0x03;
    let mut flow = Flow::new(std::io::Cursor::new(unknown), udp_local());
    let ctx = MetadataContext::new();
    assert!(!EasyTierConfigServer.matches(&mut flow, Some(&ctx)).await.unwrap());
    assert!(ctx.is_empty());
}

#[tokio::test]
async fn test_placeholders_after_match() {
    let mut flow = Flow::new(std::io::Cursor::new(REFERENCE_SYN), udp_local());
    let ctx = MetadataContext::new();
    assert!(EasyTierConfigServer.matches(&mut flow, Some(&ctx)).await.unwrap());

    assert_eq!(
        ctx.replace_all("easytier-{l4.easytier.msg_type}-{l4.easytier.conn_id}"),
        "easytier-syn-2864434397"
    );
}

// ============================================================================
// TRANSPORT DETECTION
// ============================================================================

#[tokio::test]
async fn test_tcp_flow_never_matches() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let writer = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(&REFERENCE_SYN).await.unwrap();
        stream.write_all(b"tail").await.unwrap();
        stream.shutdown().await.unwrap();
    });

    let (stream, _) = listener.accept().await.unwrap();
    let mut flow = Flow::from_tcp(stream).unwrap();
    assert!(matches!(flow.local_addr(), LocalAddr::Tcp(_)));
    assert!(flow.peer_addr().is_some());

    let ctx = MetadataContext::new();
    assert!(!EasyTierConfigServer.matches(&mut flow, Some(&ctx)).await.unwrap());
    assert!(ctx.is_empty());

    // Nothing was consumed by the matcher
    writer.await.unwrap();
    let mut all = Vec::new();
    flow.read_to_end(&mut all).await.unwrap();
    assert_eq!(&all[..HANDSHAKE_LEN], &REFERENCE_SYN);
    assert_eq!(&all[HANDSHAKE_LEN..], b"tail");
}

#[tokio::test]
async fn test_other_transport_never_matches() {
    let mut flow = Flow::new(std::io::Cursor::new(REFERENCE_SYN), LocalAddr::Other);
    assert!(!EasyTierConfigServer.matches(&mut flow, None).await.unwrap());
}

// ============================================================================
// FRAGMENTED AND PREMATURE DELIVERY
// ============================================================================

#[tokio::test]
async fn test_fragmented_header_is_assembled() {
    let (mut tx, rx) = duplex(64);
    let mut flow = Flow::new(rx, udp_local());

    let writer = tokio::spawn(async move {
        for chunk in REFERENCE_SYN.chunks(5) {
            tx.write_all(chunk).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let ctx = MetadataContext::new();
    assert!(EasyTierConfigServer.matches(&mut flow, Some(&ctx)).await.unwrap());
    assert_eq!(ctx.get_u32(KEY_CONN_ID), Some(0xAABBCCDD));
    writer.await.unwrap();
}

#[tokio::test]
async fn test_premature_close_is_eof_error() {
    let (mut tx, rx) = duplex(64);
    let mut flow = Flow::new(rx, udp_local());

    tx.write_all(&REFERENCE_SYN[..10]).await.unwrap();
    drop(tx);

    let ctx = MetadataContext::new();
    let err = EasyTierConfigServer
        .matches(&mut flow, Some(&ctx))
        .await
        .expect_err("closed before a full header");
    assert!(err.is_eof(), "expected end-of-input, got {err}");
    assert!(ctx.is_empty());
}

#[tokio::test]
async fn test_garbage_longer_than_header() {
    let garbage: Vec<u8> = (0u8..64).collect();
    let mut flow = Flow::new(std::io::Cursor::new(garbage), udp_local());
    // byte[4] == 0x04, not a known message type
    assert!(!EasyTierConfigServer.matches(&mut flow, None).await.unwrap());
}

// ============================================================================
// PIPELINE
// ============================================================================

#[tokio::test]
async fn test_directive_built_matcher_behaves_like_direct() {
    let matcher = parse_directive("easytier_config_server").unwrap();
    let mut flow = Flow::new(std::io::Cursor::new(REFERENCE_SYN), udp_local());
    assert!(matcher.matches(&mut flow, None).await.unwrap());
}

#[tokio::test]
async fn test_chain_hands_full_datagram_to_handler() {
    let mut chain = MatcherChain::new();
    chain.push("easytier", parse_directive("easytier_config_server").unwrap());

    let header = HandshakeHeader {
        conn_id: 42,
        msg_type: MessageType::Sack,
        magic: u64::MAX,
    };
    let mut datagram = header.to_bytes().to_vec();
    datagram.extend_from_slice(b"config-body");

    let mut flow = Flow::new(std::io::Cursor::new(datagram.clone()), udp_local());
    let ctx = MetadataContext::new();

    assert_eq!(
        chain.classify(&mut flow, Some(&ctx)).await.unwrap(),
        Some("easytier")
    );
    assert_eq!(ctx.get_u32(KEY_CONN_ID), Some(42));
    assert_eq!(ctx.get_u64(KEY_MAGIC), Some(u64::MAX));

    let mut replayed = Vec::new();
    flow.read_to_end(&mut replayed).await.unwrap();
    assert_eq!(replayed, datagram);
}

#[tokio::test]
async fn test_nested_classification_after_partial_read() {
    let mut chain = MatcherChain::new();
    chain.push("easytier", EasyTierConfigServer::boxed());

    // Outer route consumes a 4-byte prefix before handing off
    let mut datagram = b"wrap".to_vec();
    datagram.extend_from_slice(&REFERENCE_SYN);
    datagram.extend_from_slice(b"body");
    let mut flow = Flow::new(std::io::Cursor::new(datagram), udp_local());

    assert_eq!(chain.classify(&mut flow, None).await.unwrap(), None);
    let mut prefix = [0u8; 4];
    flow.read_exact(&mut prefix).await.unwrap();
    assert_eq!(&prefix, b"wrap");

    let ctx = MetadataContext::new();
    assert_eq!(
        chain.classify(&mut flow, Some(&ctx)).await.unwrap(),
        Some("easytier")
    );
    assert_eq!(ctx.get_u32(KEY_CONN_ID), Some(0xAABBCCDD));

    let mut rest = Vec::new();
    flow.read_to_end(&mut rest).await.unwrap();
    assert_eq!(&rest[..HANDSHAKE_LEN], &REFERENCE_SYN);
    assert_eq!(&rest[HANDSHAKE_LEN..], b"body");
}
