use std::cmp::Ordering;

/// One run of a natural sort key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Chunk {
    /// Lower-cased text between digit runs (possibly empty).
    Text(String),
    /// A digit run without leading zeros: compared by length, then digits,
    /// which orders it numerically without overflow.
    Number(usize, String),
}

/// Split `s` into alternating text and digit runs so that `wave_2` sorts
/// before `wave_10`. The key always starts and ends with a text chunk, so
/// chunks at the same position have the same variant.
pub fn natural_key(s: &str) -> Vec<Chunk> {
    let mut key = Vec::new();
    let mut text = String::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            key.push(Chunk::Text(std::mem::take(&mut text).to_lowercase()));
            let mut digits = String::new();
            while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(d);
                chars.next();
            }
            let significant = digits.trim_start_matches('0').to_string();
            key.push(Chunk::Number(significant.len(), significant));
        } else {
            text.push(c);
            chars.next();
        }
    }
    key.push(Chunk::Text(text.to_lowercase()));
    key
}

/// Natural order, ties broken by plain string order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b)).then_with(|| a.cmp(b))
}
