#![no_main]

use easytier_sniff::core::header::HandshakeHeader;
use easytier_sniff::core::metadata::MetadataContext;
use easytier_sniff::protocol::matcher::{ConnMatcher, EasyTierConfigServer};
use easytier_sniff::transport::{Flow, LocalAddr};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let parsed = HandshakeHeader::parse_prefix(data);

    // Parsed headers must re-encode to the same prefix
    if let Some(Ok(header)) = parsed {
        assert_eq!(&header.to_bytes()[..], &data[..16]);
    }

    let local = LocalAddr::Udp("127.0.0.1:11010".parse().unwrap());
    let mut flow = Flow::new(std::io::Cursor::new(data.to_vec()), local);
    let ctx = MetadataContext::new();
    let result = futures::executor::block_on(EasyTierConfigServer.matches(&mut flow, Some(&ctx)));

    match (parsed, result) {
        (None, Err(e)) => assert!(e.is_eof()),
        (Some(Ok(_)), Ok(true)) => assert_eq!(ctx.len(), 3),
        (Some(Err(_)), Ok(false)) => assert!(ctx.is_empty()),
        (p, r) => panic!("parser and matcher disagree: {p:?} vs {r:?}"),
    }
});
