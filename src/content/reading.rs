//! Reading time estimation

/// Words read per minute
pub const WORDS_PER_MINUTE: usize = 200;

/// Estimated minutes to read `text`, rounded up
///
/// Words are whatever lies between single space characters, so an empty
/// text still counts as one word.
pub fn estimate_minutes(text: &str) -> u32 {
    let words = text.split(' ').count();
    words.div_ceil(WORDS_PER_MINUTE) as u32
}
