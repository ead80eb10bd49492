//! Identifier generation

use bech32::Bech32m;
use uuid7::uuid7;

/// Mint a uuid7 and render it bech32m with a human-readable prefix, e.g.
/// `cdt` for requests and `user` for customers.
pub fn new_prefixed_id(prefix: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(prefix)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}
