//! Expression Evaluation
//!
//! The integer-only infix evaluator behind `expr`, `if`, `while`, `for` and
//! `filter`. The expression source is substituted first (`$`, `[...]`,
//! quotes), then evaluated as a C-like expression with the usual precedence
//! ladder. All binary operators are left-associative, unary prefixes are
//! right-associative.
//!
//! Non-digit primaries make the whole expression evaluate to 1, so bare
//! strings are truthy in conditionals; an empty expression is 0 so empty
//! conditionals are false. Trailing bytes after a complete expression are
//! ignored.
//!
//! Without the `full` feature the multiplicative, additive, shift and
//! bitwise levels are compiled down to pass-throughs, leaving unary,
//! comparison, equality and the logical operators.

use crate::bytes::{is_punct, is_space};
use crate::interp::errors::ErrorKind;
use crate::interp::interp::Interp;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprError {
    Syntax,
    DivisionByZero,
    /// Pending marker for a non-digit primary; cleared at each expression
    /// level, forcing the value to 1.
    Invalid,
}

struct ExprEval<'a> {
    code: &'a [u8],
    head: usize,
    ival: i64,
    error: Option<ExprError>,
}

/// Punctuation that may not directly follow a single-character operator;
/// keeps the one-char operator loops from eating compound operators like
/// `&&` or `<=`.
fn invalid_punct(b: u8) -> bool {
    is_punct(b) && !matches!(b, b'!' | b'~' | b'(' | b')' | b'-' | b'+')
}

impl<'a> ExprEval<'a> {
    fn new(code: &'a [u8]) -> Self {
        Self {
            code,
            head: 0,
            ival: 0,
            error: None,
        }
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.code.get(index).copied().unwrap_or(0)
    }

    fn cur(&self) -> u8 {
        self.byte_at(self.head)
    }

    fn skip_spaces(&mut self) {
        while self.head < self.code.len() && is_space(self.code[self.head]) {
            self.head += 1;
        }
    }

    fn numeric_element(&mut self) {
        self.skip_spaces();
        self.ival = 0;
        while self.head < self.code.len() {
            let b = self.code[self.head];
            if !b.is_ascii_digit() {
                break;
            }
            self.ival = self
                .ival
                .wrapping_mul(10)
                .wrapping_add((b - b'0') as i64);
            self.head += 1;
        }
    }

    fn element(&mut self) {
        if self.cur().is_ascii_digit() {
            self.numeric_element();
            return;
        }

        // anything else (usually substituted strings) evaluates as 1 so
        // that strings are "true" in conditionals
        self.ival = 1;
        self.error = Some(ExprError::Invalid);
    }

    fn paren(&mut self) {
        self.skip_spaces();
        if self.cur() == b'(' {
            self.head += 1;
            self.expr();
            self.skip_spaces();

            if self.cur() == b')' {
                self.head += 1;
            } else {
                self.error = Some(ExprError::Syntax);
            }
        } else {
            self.element();
        }
    }

    fn unary(&mut self) {
        self.skip_spaces();
        if self.head < self.code.len()
            && self.error.is_none()
            && matches!(self.cur(), b'-' | b'+' | b'~' | b'!')
        {
            let op = self.code[self.head];
            self.head += 1;

            self.unary();
            if self.error.is_some() {
                return;
            }

            match op {
                b'-' => self.ival = self.ival.wrapping_neg(),
                b'+' => {}
                b'~' => self.ival = !self.ival,
                b'!' => self.ival = i64::from(self.ival == 0),
                _ => unreachable!(),
            }
        } else {
            self.paren();
        }
    }

    fn muldiv(&mut self) {
        self.unary();
        if self.error.is_some() || !cfg!(feature = "full") {
            return;
        }

        self.skip_spaces();
        while self.head < self.code.len()
            && self.error.is_none()
            && !invalid_punct(self.byte_at(self.head + 1))
            && matches!(self.cur(), b'*' | b'/' | b'\\' | b'%')
        {
            let op = self.code[self.head];
            let oival = self.ival;
            self.head += 1;

            self.unary();
            if self.error.is_some() {
                return;
            }

            match op {
                b'*' => self.ival = oival.wrapping_mul(self.ival),
                b'%' => {
                    if self.ival == 0 {
                        self.error = Some(ExprError::DivisionByZero);
                    } else {
                        self.ival = oival.wrapping_rem(self.ival);
                    }
                }
                // backslash is integer division, identical to slash
                b'/' | b'\\' => {
                    if self.ival == 0 {
                        self.error = Some(ExprError::DivisionByZero);
                    } else {
                        self.ival = oival.wrapping_div(self.ival);
                    }
                }
                _ => unreachable!(),
            }

            self.skip_spaces();
        }
    }

    fn addsub(&mut self) {
        self.muldiv();
        if !cfg!(feature = "full") {
            return;
        }

        self.skip_spaces();
        while self.head < self.code.len()
            && self.error.is_none()
            && !invalid_punct(self.byte_at(self.head + 1))
            && matches!(self.cur(), b'+' | b'-')
        {
            let op = self.code[self.head];
            let oival = self.ival;
            self.head += 1;

            self.muldiv();
            if self.error.is_some() {
                return;
            }

            match op {
                b'+' => self.ival = oival.wrapping_add(self.ival),
                b'-' => self.ival = oival.wrapping_sub(self.ival),
                _ => unreachable!(),
            }

            self.skip_spaces();
        }
    }

    fn shift(&mut self) {
        self.addsub();
        if !cfg!(feature = "full") {
            return;
        }

        self.skip_spaces();
        while self.head < self.code.len()
            && self.error.is_none()
            && ((self.cur() == b'<' && self.byte_at(self.head + 1) == b'<')
                || (self.cur() == b'>' && self.byte_at(self.head + 1) == b'>'))
        {
            let op = self.code[self.head];
            let oival = self.ival;
            self.head += 2;

            self.addsub();
            if self.error.is_some() {
                return;
            }

            match op {
                b'<' => self.ival = oival.wrapping_shl(self.ival as u32),
                b'>' => self.ival = oival.wrapping_shr(self.ival as u32),
                _ => unreachable!(),
            }

            self.skip_spaces();
        }
    }

    fn compare(&mut self) {
        self.shift();
        self.skip_spaces();

        loop {
            if self.head >= self.code.len() || self.error.is_some() {
                return;
            }

            let c = self.cur();
            let next = self.byte_at(self.head + 1);
            let op = if c == b'<' && !invalid_punct(next) {
                1
            } else if c == b'>' && !invalid_punct(next) {
                2
            } else if c == b'<' && next == b'=' {
                3
            } else if c == b'>' && next == b'=' {
                4
            } else {
                return;
            };

            let oival = self.ival;
            self.head += if op > 2 { 2 } else { 1 };

            self.shift();
            if self.error.is_some() {
                return;
            }

            self.ival = i64::from(match op {
                1 => oival < self.ival,
                2 => oival > self.ival,
                3 => oival <= self.ival,
                _ => oival >= self.ival,
            });

            self.skip_spaces();
        }
    }

    fn equals(&mut self) {
        self.compare();
        self.skip_spaces();

        while self.head < self.code.len()
            && self.error.is_none()
            && ((self.cur() == b'=' && self.byte_at(self.head + 1) == b'=')
                || (self.cur() == b'!' && self.byte_at(self.head + 1) == b'='))
        {
            let negated = self.cur() == b'!';
            let oival = self.ival;
            self.head += 2;

            self.compare();
            if self.error.is_some() {
                return;
            }

            self.ival = i64::from(if negated {
                oival != self.ival
            } else {
                oival == self.ival
            });

            self.skip_spaces();
        }
    }

    fn bitand(&mut self) {
        self.equals();
        if !cfg!(feature = "full") {
            return;
        }

        self.skip_spaces();
        while self.head < self.code.len()
            && self.error.is_none()
            && self.cur() == b'&'
            && !invalid_punct(self.byte_at(self.head + 1))
        {
            let oival = self.ival;
            self.head += 1;

            self.equals();
            if self.error.is_some() {
                return;
            }

            self.ival = oival & self.ival;
            self.skip_spaces();
        }
    }

    fn bitor(&mut self) {
        self.bitand();
        if !cfg!(feature = "full") {
            return;
        }

        self.skip_spaces();
        while self.head < self.code.len()
            && self.error.is_none()
            && self.cur() == b'|'
            && !invalid_punct(self.byte_at(self.head + 1))
        {
            let oival = self.ival;
            self.head += 1;

            self.bitand();
            if self.error.is_some() {
                return;
            }

            self.ival = oival | self.ival;
            self.skip_spaces();
        }
    }

    fn logand(&mut self) {
        self.bitor();
        self.skip_spaces();

        while self.head < self.code.len()
            && self.error.is_none()
            && self.cur() == b'&'
            && self.byte_at(self.head + 1) == b'&'
        {
            let oival = self.ival;
            self.head += 2;

            self.bitor();
            if self.error.is_some() {
                return;
            }

            self.ival = i64::from(oival != 0 && self.ival != 0);
            self.skip_spaces();
        }
    }

    fn logor(&mut self) {
        self.logand();
        self.skip_spaces();

        while self.head < self.code.len()
            && self.error.is_none()
            && self.cur() == b'|'
            && self.byte_at(self.head + 1) == b'|'
        {
            let oival = self.ival;
            self.head += 2;

            self.logand();
            if self.error.is_some() {
                return;
            }

            self.ival = i64::from(oival != 0 || self.ival != 0);
            self.skip_spaces();
        }
    }

    fn expr(&mut self) {
        self.logor();
        if self.error == Some(ExprError::Invalid) {
            // a pending invalid marker only stops the walk; the expression
            // as a whole is the truthy 1
            self.error = None;
            self.ival = 1;
        }
    }
}

impl Interp {
    /// Substitute and evaluate `code` as an integer expression. `None` with
    /// the error slot set on failure.
    pub fn eval_expr(&mut self, code: &Value) -> Option<Value> {
        if self.host.interrupted() {
            self.set_error(ErrorKind::Interrupted, "interrupted");
            return None;
        }

        let code = self.subst_to_value(code);
        if self.error.is_some() {
            return None;
        }

        // an empty expression equals 0 so it can be used as a false value
        // in conditionals
        if code.is_empty() {
            return Some(Value::from_integer(0));
        }

        let mut ee = ExprEval::new(code.as_bytes());
        ee.expr();

        match ee.error {
            None => Some(Value::from_integer(ee.ival)),
            Some(ExprError::DivisionByZero) => {
                self.set_error(ErrorKind::DivisionByZero, "division by zero in expression");
                None
            }
            Some(ExprError::Syntax) | Some(ExprError::Invalid) => {
                self.set_error(ErrorKind::ExpressionSyntax, "expression syntax error");
                None
            }
        }
    }
}
