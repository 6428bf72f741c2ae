//! Token pattern dialect
//!
//! Patterns are matched against bytes. Supported syntax:
//! literals, `\` escapes (`\d \w \s` and their negations, `\n \t \r \0`,
//! any other escaped byte stands for itself), `.` (any byte but newline),
//! classes `[a-z_]` / `[^"\\]`, groups `( )` and `(?: )`, alternation `|`,
//! and the postfix operators `* + ?`.

/// Inclusive byte ranges, sorted and merged
pub(crate) type ByteSet = Vec<(u8, u8)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Regex {
    Empty,
    Class(ByteSet),
    Concat(Vec<Regex>),
    Alt(Vec<Regex>),
    Star(Box<Regex>),
    Plus(Box<Regex>),
    Optional(Box<Regex>),
}

impl Regex {
    /// Whether the pattern accepts the empty string
    pub(crate) fn matches_empty(&self) -> bool {
        match self {
            Regex::Empty | Regex::Star(_) | Regex::Optional(_) => true,
            Regex::Class(_) => false,
            Regex::Concat(items) => items.iter().all(Regex::matches_empty),
            Regex::Alt(items) => items.iter().any(Regex::matches_empty),
            Regex::Plus(inner) => inner.matches_empty(),
        }
    }
}

/// A literal string, optionally matching ASCII letters in either case
pub(crate) fn literal(text: &str, case_insensitive: bool) -> Regex {
    let items: Vec<Regex> = text
        .bytes()
        .map(|byte| {
            if case_insensitive && byte.is_ascii_alphabetic() {
                Regex::Class(normalize(vec![
                    (byte.to_ascii_lowercase(), byte.to_ascii_lowercase()),
                    (byte.to_ascii_uppercase(), byte.to_ascii_uppercase()),
                ]))
            } else {
                Regex::Class(vec![(byte, byte)])
            }
        })
        .collect();
    match items.len() {
        0 => Regex::Empty,
        1 => items.into_iter().next().unwrap_or(Regex::Empty),
        _ => Regex::Concat(items),
    }
}

pub(crate) fn parse(pattern: &str) -> Result<Regex, String> {
    let mut parser = PatternParser {
        bytes: pattern.as_bytes(),
        pos: 0,
    };
    let regex = parser.alternation()?;
    if parser.pos < parser.bytes.len() {
        return Err(format!("unexpected `)` at offset {}", parser.pos));
    }
    Ok(regex)
}

/// Sort and merge overlapping or adjacent ranges
pub(crate) fn normalize(mut ranges: ByteSet) -> ByteSet {
    ranges.sort_unstable();
    let mut merged: ByteSet = Vec::with_capacity(ranges.len());
    for (min, max) in ranges {
        match merged.last_mut() {
            Some((_, last_max)) if min as u16 <= *last_max as u16 + 1 => {
                *last_max = (*last_max).max(max);
            }
            _ => merged.push((min, max)),
        }
    }
    merged
}

pub(crate) fn complement(ranges: &[(u8, u8)]) -> ByteSet {
    let mut result = Vec::new();
    let mut next: u16 = 0;
    for &(min, max) in ranges {
        if (min as u16) > next {
            result.push((next as u8, min - 1));
        }
        next = max as u16 + 1;
    }
    if next <= 255 {
        result.push((next as u8, 255));
    }
    result
}

const DIGITS: &[(u8, u8)] = &[(b'0', b'9')];
const WORD: &[(u8, u8)] = &[(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')];
const SPACE: &[(u8, u8)] = &[(b'\t', b'\r'), (b' ', b' ')];

struct PatternParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl PatternParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn alternation(&mut self) -> Result<Regex, String> {
        let mut branches = vec![self.concatenation()?];
        while self.peek() == Some(b'|') {
            self.pos += 1;
            branches.push(self.concatenation()?);
        }
        Ok(if branches.len() == 1 {
            branches.pop().unwrap_or(Regex::Empty)
        } else {
            Regex::Alt(branches)
        })
    }

    fn concatenation(&mut self) -> Result<Regex, String> {
        let mut items = Vec::new();
        while let Some(byte) = self.peek() {
            if byte == b'|' || byte == b')' {
                break;
            }
            items.push(self.repetition()?);
        }
        Ok(match items.len() {
            0 => Regex::Empty,
            1 => items.pop().unwrap_or(Regex::Empty),
            _ => Regex::Concat(items),
        })
    }

    fn repetition(&mut self) -> Result<Regex, String> {
        let mut atom = self.atom()?;
        while let Some(op) = self.peek() {
            atom = match op {
                b'*' => Regex::Star(Box::new(atom)),
                b'+' => Regex::Plus(Box::new(atom)),
                b'?' => Regex::Optional(Box::new(atom)),
                _ => break,
            };
            self.pos += 1;
        }
        Ok(atom)
    }

    fn atom(&mut self) -> Result<Regex, String> {
        let start = self.pos;
        let byte = self
            .bump()
            .ok_or_else(|| "unexpected end of pattern".to_string())?;
        match byte {
            b'(' => {
                if self.bytes[self.pos..].starts_with(b"?:") {
                    self.pos += 2;
                }
                let inner = self.alternation()?;
                if self.bump() != Some(b')') {
                    return Err(format!("unclosed group opened at offset {start}"));
                }
                Ok(inner)
            }
            b'[' => self.class(start),
            b'.' => Ok(Regex::Class(complement(&[(b'\n', b'\n')]))),
            b'\\' => Ok(Regex::Class(self.escape()?)),
            b'*' | b'+' | b'?' => Err(format!("nothing to repeat at offset {start}")),
            _ => Ok(Regex::Class(vec![(byte, byte)])),
        }
    }

    fn escape(&mut self) -> Result<ByteSet, String> {
        let byte = self
            .bump()
            .ok_or_else(|| "pattern ends with `\\`".to_string())?;
        Ok(match byte {
            b'd' => DIGITS.to_vec(),
            b'w' => WORD.to_vec(),
            b's' => SPACE.to_vec(),
            b'D' => complement(DIGITS),
            b'W' => complement(WORD),
            b'S' => complement(SPACE),
            b'n' => vec![(b'\n', b'\n')],
            b't' => vec![(b'\t', b'\t')],
            b'r' => vec![(b'\r', b'\r')],
            b'0' => vec![(0, 0)],
            other => vec![(other, other)],
        })
    }

    fn class(&mut self, start: usize) -> Result<Regex, String> {
        let negated = self.peek() == Some(b'^');
        if negated {
            self.pos += 1;
        }
        let mut ranges = Vec::new();
        let mut first = true;
        loop {
            let byte = self
                .bump()
                .ok_or_else(|| format!("unclosed class opened at offset {start}"))?;
            match byte {
                b']' if !first => break,
                b'\\' => {
                    let set = self.escape()?;
                    let single = match set.as_slice() {
                        [(min, max)] if min == max => Some(*min),
                        _ => None,
                    };
                    match single {
                        Some(byte) => ranges.extend(self.class_range(byte)?),
                        None => ranges.extend(set),
                    }
                }
                _ => ranges.extend(self.class_range(byte)?),
            }
            first = false;
        }
        let ranges = normalize(ranges);
        Ok(Regex::Class(if negated {
            complement(&ranges)
        } else {
            ranges
        }))
    }

    /// A single class member, extended to `min-max` when a range follows
    fn class_range(&mut self, min: u8) -> Result<ByteSet, String> {
        let is_range = self.peek() == Some(b'-')
            && self.bytes.get(self.pos + 1).is_some_and(|next| *next != b']');
        if !is_range {
            return Ok(vec![(min, min)]);
        }
        self.pos += 1;
        let max = match self.bump() {
            Some(b'\\') => match self.escape()?.as_slice() {
                [(lo, hi)] if lo == hi => *lo,
                _ => return Err("class range ends in a class escape".to_string()),
            },
            Some(byte) => byte,
            None => return Err("unterminated class range".to_string()),
        };
        if max < min {
            return Err(format!(
                "reversed class range `{}-{}`",
                min as char, max as char
            ));
        }
        Ok(vec![(min, max)])
    }
}
