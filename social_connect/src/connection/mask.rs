const MASK_CHAR: char = '•';
const FALLBACK_MASK_CHARS: [char; 3] = ['*', '#', '?'];
const MASK_PREFIX_LEN: usize = 8;
const VISIBLE_SUFFIX_LEN: usize = 4;

/// Render a token for display: 8 mask characters and the last 4 characters.
///
/// The output width does not depend on the token length. Tokens too short to
/// reveal a suffix safely are masked entirely. The mask character is `•`
/// unless the token itself contains it; then a character absent from the
/// token is used, so no 5 characters of output ever match the token.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let width = MASK_PREFIX_LEN + VISIBLE_SUFFIX_LEN;
    let mask = mask_char_for(&chars);

    if chars.len() <= VISIBLE_SUFFIX_LEN {
        return std::iter::repeat_n(mask, width).collect();
    }

    std::iter::repeat_n(mask, MASK_PREFIX_LEN)
        .chain(chars[chars.len() - VISIBLE_SUFFIX_LEN..].iter().copied())
        .collect()
}

fn mask_char_for(token: &[char]) -> char {
    std::iter::once(MASK_CHAR)
        .chain(FALLBACK_MASK_CHARS)
        .chain('\u{E000}'..='\u{F8FF}')
        .find(|c| !token.contains(c))
        .unwrap_or(MASK_CHAR)
}
