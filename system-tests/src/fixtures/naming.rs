// system-tests/src/fixtures/naming.rs
// ============================================================================
// Module: Resource Naming
// Description: Random names and passwords for created resources.
// Purpose: Keep concurrent runs from colliding on unique-name constraints.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Generated names take the form `<resource_prefix>-<name>-<n>` with a random
//! `u32` suffix, so leaked resources stay attributable to the suite.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Shortest password that can hold one character of every required class.
pub const MIN_PASSWORD_LEN: usize = 3;

/// Uppercase letters.
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Lowercase letters.
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
/// Digits.
const DIGITS: &[u8] = b"0123456789";

// ============================================================================
// SECTION: Generators
// ============================================================================

/// Returns `<resource_prefix>-<name>-<random u32>`.
#[must_use]
pub fn rand_name(resource_prefix: &str, name: &str) -> String {
    let suffix: u32 = rand::thread_rng().r#gen();
    format!("{resource_prefix}-{name}-{suffix}")
}

/// Returns a random alphanumeric password with at least one uppercase
/// letter, one lowercase letter, and one digit.
///
/// Lengths below [`MIN_PASSWORD_LEN`] are raised to it.
#[must_use]
pub fn rand_password(len: usize) -> String {
    let len = len.max(MIN_PASSWORD_LEN);
    let mut rng = rand::thread_rng();
    let mut chars: Vec<char> = [UPPER, LOWER, DIGITS]
        .iter()
        .filter_map(|class| class.choose(&mut rng).copied().map(char::from))
        .collect();
    while chars.len() < len {
        chars.push(char::from(rng.sample(Alphanumeric)));
    }
    chars.shuffle(&mut rng);
    chars.into_iter().collect()
}
