//! Session code normalisation and generation
//!
//! Codes are case-insensitive. They are stored upper-cased, and every lookup
//! key goes through [`normalize_code`] before it reaches the repository.

use rand::Rng;

/// Prefix shared by every generated session code
pub const CODE_PREFIX: char = 'S';

/// Number of random characters after the prefix
pub const CODE_RANDOM_LEN: usize = 6;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Canonical form of a session code: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Source of candidate session codes.
///
/// Candidates only need to be well distributed. Uniqueness is enforced by the
/// repository, and creation retries on conflict.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// `S` followed by six random characters from `[A-Z0-9]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut code = String::with_capacity(CODE_RANDOM_LEN + 1);
        code.push(CODE_PREFIX);
        for _ in 0..CODE_RANDOM_LEN {
            let idx = rng.gen_range(0..ALPHABET.len());
            code.push(ALPHABET[idx] as char);
        }
        code
    }
}

/// Hands out a fixed list of codes in order, then repeats the last one.
#[cfg(test)]
pub(crate) struct SequenceCodeGenerator {
    codes: Vec<String>,
    next: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl SequenceCodeGenerator {
    pub(crate) fn new(codes: &[&str]) -> Self {
        Self {
            codes: codes.iter().map(|c| c.to_string()).collect(),
            next: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
impl CodeGenerator for SequenceCodeGenerator {
    fn generate(&self) -> String {
        let idx = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            .min(self.codes.len() - 1);
        self.codes[idx].clone()
    }
}
