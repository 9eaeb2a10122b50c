//! String Commands
//!
//! Byte-string manipulation: indexing, searching, trimming, replacement.
//! Offsets are byte offsets and out-of-range accesses yield the empty
//! value rather than errors.

use crate::interp::interp::Interp;
use crate::value::Value;

const DEFAULT_TRIM_CHARS: &[u8] = b" \x0c\n\r\t\x0b";

/// `quote v...`: the arguments joined with spaces, with no substitution.
pub(crate) fn fnc_quote(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }

    let mut r = Value::empty();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            r.append_byte(b' ');
        }
        r.append(arg);
    }
    Some(r)
}

/// `char code`: a one-byte string from an integer (0 is the empty value).
pub(crate) fn fnc_char(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let b = args.first()?.to_integer() as u8;
    if b == 0 {
        return Some(Value::empty());
    }
    Some(Value::from_bytes(&[b]))
}

/// `charat s index`.
pub(crate) fn fnc_charat(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }

    let bytes = args[0].as_bytes();
    let index = args[1].to_integer();
    if index < 0 || index as usize >= bytes.len() {
        return None;
    }
    Some(Value::from_bytes(&bytes[index as usize..index as usize + 1]))
}

/// `codeat s index`: the byte value at an index.
pub(crate) fn fnc_codeat(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }

    let bytes = args[0].as_bytes();
    let index = args[1].to_integer();
    if index < 0 || index as usize >= bytes.len() {
        return None;
    }
    Some(Value::from_integer(bytes[index as usize] as i64))
}

/// `substr s start [end]`: the half-open byte range, `end` clamped to the
/// string length (a negative `end` means the end of the string).
pub(crate) fn fnc_substr(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }

    let bytes = args[0].as_bytes();
    if bytes.is_empty() {
        return None;
    }

    let slen = bytes.len() as i64;
    let start = args[1].to_integer();
    let mut end = args.get(2).map_or(slen, Value::to_integer);
    if end < 0 || end > slen {
        end = slen;
    }
    if start < 0 || start >= end {
        return None;
    }

    Some(Value::from_bytes(&bytes[start as usize..end as usize]))
}

fn find_sub(hay: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from);
    }
    if from > hay.len() {
        return None;
    }
    hay[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// `strpos hay needle [min]`: the first occurrence at or after `min`,
/// or -1.
pub(crate) fn fnc_strpos(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return Some(Value::from_integer(-1));
    }

    let hay = args[0].as_bytes();
    let mut min = 0usize;
    if args.len() > 2 {
        let m = args[2].to_integer();
        if m < 0 || m as usize >= hay.len() {
            return Some(Value::from_integer(-1));
        }
        min = m as usize;
    }

    match find_sub(hay, args[1].as_bytes(), min) {
        Some(pos) => Some(Value::from_integer(pos as i64)),
        None => Some(Value::from_integer(-1)),
    }
}

/// `length v...`: total byte length, counting one separator between
/// arguments.
pub(crate) fn fnc_length(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let mut total = 0usize;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            total += 1;
        }
        total += arg.len();
    }
    Some(Value::from_integer(total as i64))
}

fn real_trim(s: &[u8], chars: &[u8], left: bool, right: bool) -> Value {
    let mut base = 0;
    if left {
        while base < s.len() && chars.contains(&s[base]) {
            base += 1;
        }
    }

    let mut end = s.len();
    if right {
        while end > base && chars.contains(&s[end - 1]) {
            end -= 1;
        }
    }

    Value::from_bytes(&s[base..end])
}

/// `trim s [chars]`.
pub(crate) fn fnc_trim(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }
    let chars = args.get(1).map_or(DEFAULT_TRIM_CHARS, Value::as_bytes);
    Some(real_trim(args[0].as_bytes(), chars, true, true))
}

/// `ltrim s [chars]`.
pub(crate) fn fnc_ltrim(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }
    let chars = args.get(1).map_or(DEFAULT_TRIM_CHARS, Value::as_bytes);
    Some(real_trim(args[0].as_bytes(), chars, true, false))
}

/// `rtrim s [chars]`.
pub(crate) fn fnc_rtrim(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }
    let chars = args.get(1).map_or(DEFAULT_TRIM_CHARS, Value::as_bytes);
    Some(real_trim(args[0].as_bytes(), chars, false, true))
}

/// `streq a b`: 1 when equal, 0 otherwise.
pub(crate) fn fnc_streq(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }
    Some(Value::from_integer(i64::from(
        args[0].as_bytes() == args[1].as_bytes(),
    )))
}

/// `repstr s from to`: replace every non-overlapping occurrence of
/// `from` with `to`, left to right in a single pass.
pub(crate) fn fnc_repstr(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }
    if args.len() < 3 {
        return Some(args[0].clone());
    }

    let src = args[0].as_bytes();
    let from = args[1].as_bytes();
    let to = args[2].as_bytes();
    if from.is_empty() {
        return None;
    }

    let mut r = Value::empty();
    let mut i = 0;
    while let Some(pos) = find_sub(src, from, i) {
        r.append_bytes(&src[i..pos]);
        r.append_bytes(to);
        i = pos + from.len();
    }
    r.append_bytes(&src[i..]);
    Some(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: &str) -> Value {
        let mut lil = Interp::new();
        let r = lil.parse(code, false);
        assert!(!lil.has_error());
        r
    }

    #[test]
    fn test_char_and_codeat() {
        assert_eq!(run("char 97").as_bytes(), b"a");
        assert_eq!(run("char 0").as_bytes(), b"");
        assert_eq!(run("codeat abc 1").as_bytes(), b"98");
        assert_eq!(run("charat abc 2").as_bytes(), b"c");
        assert_eq!(run("charat abc 9").as_bytes(), b"");
    }

    #[test]
    fn test_substr() {
        assert_eq!(run("substr 'hello world' 6").as_bytes(), b"world");
        assert_eq!(run("substr 'hello world' 0 5").as_bytes(), b"hello");
        assert_eq!(run("substr hello 2 99").as_bytes(), b"llo");
        assert_eq!(run("substr hello 3 2").as_bytes(), b"");
        assert_eq!(run("substr hello 2 -1").as_bytes(), b"llo");
    }

    #[test]
    fn test_strpos() {
        assert_eq!(run("strpos 'This is a string' string").as_bytes(), b"10");
        assert_eq!(run("strpos abcabc c 3").as_bytes(), b"5");
        assert_eq!(run("strpos abc zz").as_bytes(), b"-1");
        assert_eq!(run("strpos abc b 99").as_bytes(), b"-1");
    }

    #[test]
    fn test_length() {
        assert_eq!(run("length 'This is a string'").as_bytes(), b"16");
        assert_eq!(run("length ab cd").as_bytes(), b"5");
        assert_eq!(run("length").as_bytes(), b"0");
    }

    #[test]
    fn test_trim_family() {
        assert_eq!(run("trim '  Hello,  world! '").as_bytes(), b"Hello,  world!");
        assert_eq!(run("ltrim '  Hello,  world! '").as_bytes(), b"Hello,  world! ");
        assert_eq!(run("rtrim '  Hello,  world! '").as_bytes(), b"  Hello,  world!");
        assert_eq!(run("trim xxaxx x").as_bytes(), b"a");
        assert_eq!(run("trim xxxx x").as_bytes(), b"");
    }

    #[test]
    fn test_streq() {
        assert_eq!(run("streq a a").as_bytes(), b"1");
        assert_eq!(run("streq a b").as_bytes(), b"0");
    }

    #[test]
    fn test_repstr() {
        assert_eq!(
            run("repstr 'This is a string' string foo").as_bytes(),
            b"This is a foo"
        );
        assert_eq!(run("repstr aaa a bb").as_bytes(), b"bbbbbb");
        // the replacement containing the pattern must not loop
        assert_eq!(run("repstr aa a aa").as_bytes(), b"aaaa");
        assert_eq!(run("repstr abc x y").as_bytes(), b"abc");
    }

    #[test]
    fn test_quote_joins_without_substitution() {
        assert_eq!(run("quote a b c").as_bytes(), b"a b c");
        assert_eq!(run("quote {a $x}").as_bytes(), b"a $x");
    }
}
