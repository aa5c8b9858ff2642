//! Demo CLI driver: feeds a small canned byte sequence through the record
//! classifier and handshake processor and prints the resulting session
//! transitions. Stands in for the teacher's fuzzer-harness binary, which
//! has no counterpart in this crate.

use clap::{app_from_crate, Arg};

use tls_handshake_core::record::{process_packet, Packet, Record};
use tls_handshake_core::session::{ConnectionConfig, Role};
use tls_handshake_core::state::{run, TlsState};
use tls_handshake_core::wire::enums::{ContentType, ProtocolVersion};

fn parse_seed(raw: &str) -> [u8; 32] {
    let digest = ring::digest::digest(&ring::digest::SHA256, raw.as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(digest.as_ref());
    seed
}

fn main() {
    env_logger::init();

    let matches = app_from_crate!()
        .arg(
            Arg::new("role")
                .long("role")
                .takes_value(true)
                .possible_values(["client", "server"])
                .default_value("server"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .takes_value(true)
                .default_value("tlsstate-demo"),
        )
        .get_matches();

    let role = match matches.value_of("role").unwrap() {
        "client" => Role::Client,
        _ => Role::Server,
    };
    let seed = parse_seed(matches.value_of("seed").unwrap());

    let mut session = tls_handshake_core::session::SessionState::new(ConnectionConfig {
        role,
        rng_seed: Some(seed),
        ..ConnectionConfig::default()
    });

    println!("role: {role:?}");

    run(&mut session, |st: &mut TlsState| {
        let app_data = Record {
            content_type: ContentType::ApplicationData,
            version: ProtocolVersion::TLSv1_2,
            fragment: &[0xDE, 0xAD, 0xBE, 0xEF],
        };
        match process_packet(st, app_data)? {
            Packet::AppData(bytes) => println!("classified AppData: {bytes:02x?}"),
            other => println!("unexpected packet: {other:?}"),
        }

        let ccs = Record {
            content_type: ContentType::ChangeCipherSpec,
            version: ProtocolVersion::TLSv1_2,
            fragment: &[1],
        };
        match process_packet(st, ccs)? {
            Packet::ChangeCipherSpec => println!("classified ChangeCipherSpec"),
            other => println!("unexpected packet: {other:?}"),
        }

        Ok(())
    })
    .unwrap_or_else(|err| {
        eprintln!("protocol error: {err}");
        std::process::exit(1);
    });

    println!("final state: {session:#?}");
}
