//! Parser
//!
//! A re-entrant recursive-descent byte scanner over the cursor held in the
//! interpreter. There is no token stream and no AST: substitution happens
//! while scanning, so a "word" production may already have evaluated a
//! `[...]` sub-command or a `$name` expansion. The output is a list of
//! values per command.
//!
//! Re-entry (bracket bodies, `subst_to_list`, nested `parse`) saves and
//! restores the cursor, which is what makes `$name` expansion (literally
//! re-parsing `<dollar_prefix><name>` as code) cheap to express.

use std::rc::Rc;

use crate::bytes::is_space;
use crate::interp::interp::Interp;
use crate::list::List;
use crate::value::Value;

/// End-of-command bytes. Whether they actually end a command depends on
/// the `ignore_eol` cursor flag.
fn eol_byte(b: u8) -> bool {
    matches!(b, b'\n' | b'\r' | b';')
}

/// Bytes that terminate a bareword.
fn special_byte(b: u8) -> bool {
    matches!(b, b'$' | b'{' | b'}' | b'[' | b']' | b'"' | b'\'' | b';')
}

impl Interp {
    /// The byte at `index`, or 0 past the end (the scanner may peek one or
    /// two bytes ahead).
    pub(crate) fn byte_at(&self, index: usize) -> u8 {
        self.code.get(index).copied().unwrap_or(0)
    }

    fn cur(&self) -> u8 {
        self.byte_at(self.head)
    }

    /// Is the cursor at an effective end of command?
    pub(crate) fn at_eol(&self) -> bool {
        !self.ignore_eol && eol_byte(self.cur())
    }

    /// Skip whitespace, comments and escaped line breaks.
    ///
    /// `#` opens a line comment; `##` (not followed by a third `#`) opens a
    /// multi-line comment closed by the next such `##`, inside which EOL
    /// bytes and semicolons are inert. Three or more `#` in a row are an
    /// ordinary line comment. A backslash before an EOL byte consumes the
    /// backslash and every following EOL byte.
    pub(crate) fn skip_spaces(&mut self) {
        let len = self.code.len();
        while self.head < len {
            let c = self.code[self.head];
            if c == b'#' {
                if self.byte_at(self.head + 1) == b'#' && self.byte_at(self.head + 2) != b'#' {
                    self.head += 2;
                    while self.head < len {
                        if self.code[self.head] == b'#'
                            && self.byte_at(self.head + 1) == b'#'
                            && self.byte_at(self.head + 2) != b'#'
                        {
                            self.head += 2;
                            break;
                        }
                        self.head += 1;
                    }
                } else {
                    while self.head < len && !eol_byte(self.code[self.head]) {
                        self.head += 1;
                    }
                }
            } else if c == b'\\' && eol_byte(self.byte_at(self.head + 1)) {
                self.head += 1;
                while self.head < len && eol_byte(self.code[self.head]) {
                    self.head += 1;
                }
            } else if eol_byte(c) {
                if self.ignore_eol {
                    self.head += 1;
                } else {
                    break;
                }
            } else if is_space(c) {
                self.head += 1;
            } else {
                break;
            }
        }
    }

    /// `[...]`: scan the balanced bracket body, then evaluate it as code
    /// and substitute the result. Bracket bodies are code mode: EOL bytes
    /// separate commands inside them regardless of the surrounding mode.
    fn bracket_part(&mut self) -> Option<Value> {
        let mut cnt = 1usize;
        let mut cmd = Value::empty();
        let save_eol = self.ignore_eol;
        self.ignore_eol = false;
        self.head += 1;

        while self.head < self.code.len() {
            match self.code[self.head] {
                b'[' => {
                    self.head += 1;
                    cnt += 1;
                    cmd.append_byte(b'[');
                }
                b']' => {
                    self.head += 1;
                    cnt -= 1;
                    if cnt == 0 {
                        break;
                    }
                    cmd.append_byte(b']');
                }
                b => {
                    cmd.append_byte(b);
                    self.head += 1;
                }
            }
        }

        let val = if cnt != 0 {
            self.set_error_unbalanced(b']');
            None
        } else {
            Some(self.parse_value(&cmd, false))
        };
        self.ignore_eol = save_eol;
        val
    }

    /// `$name`: read one word as the name, then evaluate
    /// `<dollar_prefix><name>` as code. With the default prefix `"set "`
    /// this makes `$x` equivalent to `[set x]`.
    fn dollar_part(&mut self) -> Value {
        self.head += 1;
        let name = self.next_word();

        let mut code = Value::from_bytes(&self.dollar_prefix);
        code.append(&name);
        self.parse_value(&code, false)
    }

    /// Produce the next word. On a parse error the word is empty and the
    /// error slot is set; the cursor may or may not have advanced, which is
    /// how `substitute` detects that the parser cannot proceed.
    pub(crate) fn next_word(&mut self) -> Value {
        self.skip_spaces();
        match self.cur() {
            b'$' => self.dollar_part(),
            b'{' => {
                let mut cnt = 1usize;
                self.head += 1;
                let mut val = Value::empty();
                while self.head < self.code.len() {
                    match self.code[self.head] {
                        b'{' => {
                            self.head += 1;
                            cnt += 1;
                            val.append_byte(b'{');
                        }
                        b'}' => {
                            self.head += 1;
                            cnt -= 1;
                            if cnt == 0 {
                                break;
                            }
                            val.append_byte(b'}');
                        }
                        b => {
                            val.append_byte(b);
                            self.head += 1;
                        }
                    }
                }
                if cnt != 0 {
                    self.set_error_unbalanced(b'}');
                    Value::empty()
                } else {
                    val
                }
            }
            b'[' => self.bracket_part().unwrap_or_default(),
            quote @ (b'"' | b'\'') => {
                self.head += 1;
                let mut val = Value::empty();
                let mut matched = false;

                while self.head < self.code.len() {
                    let c = self.code[self.head];
                    if c == b'[' || c == b'$' {
                        let part = if c == b'$' {
                            self.dollar_part()
                        } else {
                            self.bracket_part().unwrap_or_default()
                        };
                        val.append(&part);
                        continue;
                    }
                    if c == b'\\' {
                        self.head += 1;
                        match self.byte_at(self.head) {
                            b'b' => val.append_byte(0x08),
                            b't' => val.append_byte(b'\t'),
                            b'n' => val.append_byte(b'\n'),
                            b'v' => val.append_byte(0x0b),
                            b'f' => val.append_byte(0x0c),
                            b'r' => val.append_byte(b'\r'),
                            b'0' => val.append_byte(0),
                            b'a' => val.append_byte(0x07),
                            b'c' => val.append_byte(b'}'),
                            b'o' => val.append_byte(b'{'),
                            other => val.append_byte(other),
                        }
                        self.head += 1;
                        continue;
                    }
                    if c == quote {
                        matched = true;
                        self.head += 1;
                        break;
                    }
                    val.append_byte(c);
                    self.head += 1;
                }

                if matched {
                    val
                } else {
                    self.set_error_unbalanced(quote);
                    Value::empty()
                }
            }
            _ => {
                let start = self.head;
                while self.head < self.code.len()
                    && !is_space(self.code[self.head])
                    && !special_byte(self.code[self.head])
                {
                    self.head += 1;
                }
                Value::from_bytes(&self.code.clone()[start..self.head])
            }
        }
    }

    /// Extract the next command as a list of argument values. Adjacent word
    /// productions concatenate into one argument until raw whitespace or a
    /// raw EOL byte; the command ends at an effective end of command or end
    /// of input. `None` means the parser could not make progress.
    pub(crate) fn substitute(&mut self) -> Option<List> {
        let mut words = List::new();

        self.skip_spaces();
        while self.head < self.code.len() && !self.at_eol() && self.error.is_none() {
            let mut word = Value::empty();
            loop {
                let start = self.head;
                let part = self.next_word();
                if self.head == start {
                    return None;
                }
                word.append(&part);

                let more = self.head < self.code.len()
                    && !eol_byte(self.byte_at(self.head))
                    && !is_space(self.byte_at(self.head))
                    && self.error.is_none();
                if !more {
                    break;
                }
            }
            self.skip_spaces();
            words.append(word);
        }

        Some(words)
    }

    /// Run substitution over `code` in list mode (EOL bytes and semicolons
    /// act as whitespace) and return the resulting words.
    pub fn subst_to_list(&mut self, code: &Value) -> List {
        let save_code = std::mem::replace(&mut self.code, Rc::from(code.as_bytes()));
        let save_head = std::mem::replace(&mut self.head, 0);
        let save_eol = std::mem::replace(&mut self.ignore_eol, true);
        self.cursor_depth += 1;

        let words = self.substitute().unwrap_or_default();

        self.cursor_depth -= 1;
        self.code = save_code;
        self.head = save_head;
        self.ignore_eol = save_eol;
        words
    }

    /// Substitute `code` and join the words back with single spaces.
    pub fn subst_to_value(&mut self, code: &Value) -> Value {
        self.subst_to_list(code).to_value(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_of(lil: &mut Interp, code: &str) -> Vec<Vec<u8>> {
        let list = lil.subst_to_list(&Value::from(code));
        list.iter().map(|v| v.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_barewords() {
        let mut lil = Interp::new();
        assert_eq!(
            words_of(&mut lil, "a bb  ccc"),
            vec![b"a".to_vec(), b"bb".to_vec(), b"ccc".to_vec()]
        );
    }

    #[test]
    fn test_braces_are_literal() {
        let mut lil = Interp::new();
        assert_eq!(words_of(&mut lil, "{a $b [c]}"), vec![b"a $b [c]".to_vec()]);
        assert_eq!(words_of(&mut lil, "{a {b} c}"), vec![b"a {b} c".to_vec()]);
    }

    #[test]
    fn test_adjacent_words_concatenate() {
        let mut lil = Interp::new();
        assert_eq!(words_of(&mut lil, "a{b c}d"), vec![b"ab cd".to_vec()]);
    }

    #[test]
    fn test_quotes_interpolate_escapes() {
        let mut lil = Interp::new();
        assert_eq!(words_of(&mut lil, "\"x\\ty\\o\\c\""), vec![b"x\ty{}".to_vec()]);
        assert_eq!(words_of(&mut lil, r"'a\qb'"), vec![b"aqb".to_vec()]);
        assert_eq!(
            words_of(&mut lil, "\"nul\\0here\""),
            vec![b"nul\0here".to_vec()]
        );
    }

    #[test]
    fn test_bracket_substitution() {
        let mut lil = Interp::new();
        assert_eq!(
            words_of(&mut lil, "a [quote b] c"),
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
        );
        assert_eq!(words_of(&mut lil, "x[quote y]z"), vec![b"xyz".to_vec()]);
    }

    #[test]
    fn test_dollar_expansion() {
        let mut lil = Interp::new();
        lil.parse("set v 42", false);
        assert_eq!(words_of(&mut lil, "$v"), vec![b"42".to_vec()]);
        assert_eq!(words_of(&mut lil, "${v}"), vec![b"42".to_vec()]);
        assert_eq!(words_of(&mut lil, "a$v!"), vec![b"a42!".to_vec()]);
    }

    #[test]
    fn test_dollar_inside_quotes() {
        let mut lil = Interp::new();
        lil.parse("set v 42", false);
        assert_eq!(words_of(&mut lil, "\"v=$v.\""), vec![b"v=42.".to_vec()]);
    }

    #[test]
    fn test_line_comment() {
        let mut lil = Interp::new();
        let r = lil.parse("set x 1 # trailing comment\nset y 2", false);
        assert_eq!(r.as_bytes(), b"2");
        assert_eq!(lil.get_var(b"x").as_bytes(), b"1");
    }

    #[test]
    fn test_semicolon_ends_line_comment() {
        let mut lil = Interp::new();
        lil.parse("# comment ; set ok 1", false);
        assert_eq!(lil.get_var(b"ok").as_bytes(), b"1");
    }

    #[test]
    fn test_multiline_comment() {
        let mut lil = Interp::new();
        lil.parse(
            "set a 1\n## comment ; set b 2\nstill comment ## set c 3",
            false,
        );
        assert!(!lil.has_error());
        assert_eq!(lil.get_var(b"a").as_bytes(), b"1");
        assert!(lil.get_var(b"b").is_empty());
        assert_eq!(lil.get_var(b"c").as_bytes(), b"3");
    }

    #[test]
    fn test_three_hashes_is_line_comment() {
        let mut lil = Interp::new();
        lil.parse("### not a multiline opener\nset ok 1", false);
        assert_eq!(lil.get_var(b"ok").as_bytes(), b"1");
    }

    #[test]
    fn test_backslash_newline_continuation() {
        let mut lil = Interp::new();
        let r = lil.parse("set x [list a \\\n b]", false);
        assert_eq!(r.as_bytes(), b"a b");
    }

    #[test]
    fn test_unbalanced_brace_error() {
        let mut lil = Interp::new();
        lil.parse("set x {oops", false);
        let err = lil.error().expect("unbalanced error");
        assert_eq!(err.kind, crate::ErrorKind::Unbalanced);
        assert_eq!(err.message, "expected }");
    }

    #[test]
    fn test_unbalanced_quote_error() {
        let mut lil = Interp::new();
        lil.parse("set x \"oops", false);
        let err = lil.error().expect("unbalanced error");
        assert_eq!(err.kind, crate::ErrorKind::Unbalanced);
        assert_eq!(err.message, "expected \"");
    }

    #[test]
    fn test_list_mode_treats_eol_as_separator() {
        let mut lil = Interp::new();
        assert_eq!(
            words_of(&mut lil, "one\ntwo;three"),
            vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
        );
    }

    #[test]
    fn test_brackets_inside_list_mode_are_code_mode() {
        let mut lil = Interp::new();
        // inside the brackets the newline separates two commands, so the
        // bracket value is the result of the second one
        assert_eq!(
            words_of(&mut lil, "a [quote first\nquote second] b"),
            vec![b"a".to_vec(), b"second".to_vec(), b"b".to_vec()]
        );
    }

    #[test]
    fn test_escape_round_trip() {
        let mut lil = Interp::new();
        for original in ["a{b}c", "{", "}", "{{}}", "plain", "a b", ""] {
            let mut list = List::new();
            list.append(Value::from(original));
            let rendered = list.to_value(true);
            let back = lil.subst_to_list(&rendered);
            assert_eq!(back.len(), 1, "round-trip of {:?}", original);
            assert_eq!(back.get(0).unwrap().as_bytes(), original.as_bytes());
        }
    }
}
