//! Rolling polynomial string hash used to key atlas pages
//!
//! Not cryptographic. Two identities that collide are treated as the same page.

/// Base of the polynomial: the number of printable ASCII characters.
pub const HASH_BASE: u64 = 95;

/// Modulus of the polynomial.
pub const HASH_MODULUS: u64 = 1_000_000_009;

/// Code point the character weights are measured from.
const LOWEST_PRINTABLE: i64 = '!' as i64;

/// Compute the rolling hash of `s`, continuing from `seed`.
///
/// Each character contributes `(code_point - '!' + 1) * p^i mod m`. Characters
/// below `'!'` (such as space) produce a non-positive weight; the weight is
/// reduced into `0..m` so the result is always a valid residue.
///
/// # Examples
///
/// ```
/// use atlasdef::hash::compute_hash_from;
///
/// assert_eq!(compute_hash_from("", 0), 0);
/// assert_eq!(compute_hash_from("!", 0), 1);
/// assert_eq!(compute_hash_from("!!", 0), 1 + 95);
/// ```
pub fn compute_hash_from(s: &str, seed: u64) -> u64 {
    let m = HASH_MODULUS as i64;
    let mut hash = (seed % HASH_MODULUS) as i64;
    let mut p_pow: i64 = 1;

    for c in s.chars() {
        let weight = (c as i64 - LOWEST_PRINTABLE + 1).rem_euclid(m);
        hash = (hash + weight * p_pow) % m;
        p_pow = (p_pow * HASH_BASE as i64) % m;
    }

    hash as u64
}

/// Compute the cache key for an image identity.
pub fn compute_hash(s: &str) -> u64 {
    compute_hash_from(s, 0)
}
