//! Key-exchange helpers (§4.6): RSA decrypt/verify adapters that thread the
//! RNG and report soft failures. `rsa_decrypt` is deliberately the only
//! place in the crate where a cryptographic failure is swallowed instead
//! of surfaced -- the anti-rollback countermeasure depends on that.

use rsa::pkcs1v15::{Pkcs1v15Encrypt, Pkcs1v15Sign};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::rng::RandomGen;
use crate::wire::enums::ProtocolVersion;
use crate::wire::handshake::{decode_premaster_secret, PREMASTER_LEN};

/// `kxDecrypt`: RSA-decrypts the encrypted premaster. The caller has
/// already stripped the version-dependent two-byte length prefix (see
/// `CurrentParams`/`decode_handshake` for `ClientKeyExchange`).
///
/// Returns `None` on any decryption failure -- deliberately not a
/// `Result`, because §4.6 forbids the caller from branching on success vs.
/// failure here (that branch is exactly what the anti-rollback
/// countermeasure must avoid).
fn rsa_decrypt_raw(
    rng: &mut RandomGen,
    priv_key: &RsaPrivateKey,
    ciphertext: &[u8],
) -> Option<Vec<u8>> {
    rng.with_rng(|r| priv_key.decrypt_blinded(r, Pkcs1v15Encrypt, ciphertext).ok())
}

/// The anti-rollback countermeasure (CVE-2003-0147-style, §4.6): never
/// reveal decryption success/failure via the master secret. Both the
/// "decryption failed" and "decoded fine but version rolled back" cases
/// fall through to a freshly drawn 48-byte premaster -- fully random, with
/// no predictable prefix, so it's statistically indistinguishable from a
/// draw over a fresh seed (I6); the success case uses the decoded bytes.
/// The same code path is taken either way, so an attacker probing with a
/// tampered ciphertext cannot distinguish the branches from the outside.
pub fn rsa_decrypt_with_rollback_countermeasure(
    rng: &mut RandomGen,
    priv_key: &RsaPrivateKey,
    ciphertext: &[u8],
    client_hello_version: ProtocolVersion,
) -> [u8; PREMASTER_LEN] {
    let random_fallback = rng.draw(PREMASTER_LEN);
    let decrypted = rsa_decrypt_raw(rng, priv_key, ciphertext);

    let accepted = decrypted
        .as_deref()
        .and_then(|bytes| decode_premaster_secret(bytes).ok())
        .filter(|pms| pms.client_version == client_hello_version);

    match accepted {
        Some(pms) => pms.to_bytes(),
        None => {
            let mut out = [0u8; PREMASTER_LEN];
            out.copy_from_slice(&random_fallback);
            out
        }
    }
}

/// `kxVerify`: straightforward public-key verify for CertificateVerify.
/// `hashed` is the already-hashed content (this core never hands the RSA
/// layer unhashed bytes); returns `false` on a bad signature rather than
/// an error, matching the spec's `Bool` return.
pub fn rsa_verify(pub_key: &RsaPublicKey, hashed: &[u8], signature: &[u8]) -> bool {
    pub_key
        .verify(Pkcs1v15Sign::new_unprefixed(), hashed, signature)
        .is_ok()
}
