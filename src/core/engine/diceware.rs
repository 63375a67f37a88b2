//! Diceware passphrases built from the EFF large wordlist.

const MIN_WORDS: i64 = 4;
const MAX_WORDS: i64 = 24;

pub const BASIC_WORDS: i64 = 4;
pub const STRONG_WORDS: i64 = 8;
pub const PARANOID_WORDS: i64 = 12;
pub const MASTER_WORDS: i64 = 24;

/// Generate a `-`-joined diceware passphrase. The word count is clamped
/// into `[4, 24]`.
pub fn generate(words: i64) -> String {
    let count = words.clamp(MIN_WORDS, MAX_WORDS) as usize;
    (0..count)
        .map(|_| eff_wordlist::large::random_word())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_is_clamped() {
        assert_eq!(generate(0).split('-').count(), 4);
        assert_eq!(generate(6).split('-').count(), 6);
        assert_eq!(generate(100).split('-').count(), 24);
    }

    #[test]
    fn profiles_stay_in_range() {
        for profile in [BASIC_WORDS, STRONG_WORDS, PARANOID_WORDS, MASTER_WORDS] {
            assert!((MIN_WORDS..=MAX_WORDS).contains(&profile));
        }
    }
}
