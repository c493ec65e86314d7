//! Reading time estimate

use super::ContentSection;

/// Default reading speed in words per minute
pub const WORDS_PER_MINUTE: usize = 200;

/// Count whitespace-delimited words across every heading and body block
pub fn count_words(content: &[ContentSection]) -> usize {
    content
        .iter()
        .map(|section| {
            let heading = section.heading.split_whitespace().count();
            let body: usize = section
                .body
                .iter()
                .map(|block| block.text.split_whitespace().count())
                .sum();
            heading + body
        })
        .sum()
}

/// Estimated minutes to read, rounded up
///
/// Content without any words takes 0 minutes. A speed of 0 falls back to
/// [`WORDS_PER_MINUTE`].
pub fn reading_time(content: &[ContentSection], words_per_minute: usize) -> usize {
    let wpm = if words_per_minute == 0 {
        WORDS_PER_MINUTE
    } else {
        words_per_minute
    };
    count_words(content).div_ceil(wpm)
}
