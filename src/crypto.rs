//! The minimal parts of the "crypto/cipher layer" this core actually calls
//! into directly: the master-secret entry point and the Finished PRF. Full
//! key-schedule derivation (key block expansion, TLS 1.3 HKDF) is out of
//! scope (§1 Non-goals) -- this module exists only so that
//! `set_master_secret_from_pre` and `get_handshake_digest` are real,
//! testable functions rather than bare stubs, grounded in the classic
//! TLS 1.0-1.2 PRF (RFC 5246 §5).

use ring::hmac;

use crate::session::Role;

pub const MASTER_SECRET_LEN: usize = 48;
pub const VERIFY_DATA_LEN: usize = 12;

/// RFC 5246 §5 `P_hash`: `HMAC(secret, A(1) || seed) || HMAC(secret, A(2) || seed) || ...`
fn p_hash(secret: &[u8], seed: &[u8], out_len: usize) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let mut out = Vec::with_capacity(out_len + 32);
    let mut a = hmac::sign(&key, seed).as_ref().to_vec();
    while out.len() < out_len {
        let mut input = a.clone();
        input.extend_from_slice(seed);
        out.extend_from_slice(hmac::sign(&key, &input).as_ref());
        a = hmac::sign(&key, &a).as_ref().to_vec();
    }
    out.truncate(out_len);
    out
}

fn prf(secret: &[u8], label: &[u8], seed: &[u8], out_len: usize) -> Vec<u8> {
    let mut full_seed = Vec::with_capacity(label.len() + seed.len());
    full_seed.extend_from_slice(label);
    full_seed.extend_from_slice(seed);
    p_hash(secret, &full_seed, out_len)
}

/// `setMasterSecretFromPre`: derives the master secret from the premaster
/// and both hello randoms. `role` is accepted (per the external-interface
/// signature in §6) but does not affect this derivation -- both client and
/// server compute the identical master secret from the identical inputs.
pub fn master_secret_from_premaster(
    premaster: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    role: Role,
) -> [u8; MASTER_SECRET_LEN] {
    let _ = role;
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(client_random);
    seed.extend_from_slice(server_random);
    let derived = prf(premaster, b"master secret", &seed, MASTER_SECRET_LEN);
    let mut out = [0u8; MASTER_SECRET_LEN];
    out.copy_from_slice(&derived);
    out
}

/// `getHandshakeDigest(peer)`: the expected Finished verify-data for the
/// given sender (`peer`), computed over the *current* transcript hash.
pub fn handshake_verify_data(
    master_secret: &[u8; MASTER_SECRET_LEN],
    transcript_hash: &[u8],
    peer: Role,
) -> Vec<u8> {
    let label: &[u8] = match peer {
        Role::Client => b"client finished",
        Role::Server => b"server finished",
    };
    prf(master_secret, label, transcript_hash, VERIFY_DATA_LEN)
}

/// Constant-time byte equality -- used both for Finished verification and
/// for the renegotiation-extension comparison (Design Notes O2).
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    ring::constant_time::verify_slices_are_equal(a, b).is_ok()
}
