//! Evaluation of integer parameter expressions and vector sizes.
use crate::{AplanResult, Error};

/// Evaluate a constant integer expression: decimal literals, parentheses,
/// unary `- ~`, and the binary operators `+ - * / % << >> & ^ |` with
/// conventional precedence. Any malformed input is fatal at the point of
/// evaluation.
pub fn eval_int_expr(expr: &str) -> AplanResult<i64> {
    let mut parser = Parser {
        bytes: expr.as_bytes(),
        pos: 0,
        src: expr,
    };
    let value = parser.bit_or()?;
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(Error::malformed_numeric(format!(
            "trailing input in `{expr}`"
        )));
    }
    Ok(value)
}

/// Project a `[msb:lsb]` vector declaration onto `(width, base)`:
/// a zero base yields `(msb + 1, 0)`, otherwise `(msb - lsb, lsb)`.
/// Missing bounds are fatal.
pub fn aplan_vector_size(
    left: Option<i64>,
    right: Option<i64>,
) -> AplanResult<(i64, i64)> {
    let (Some(left), Some(right)) = (left, right) else {
        return Err(Error::malformed_numeric("vector bound is missing"));
    };
    if right == 0 {
        Ok((left + 1, 0))
    } else {
        Ok((left - right, right))
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    src: &'a str,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len()
            && self.bytes[self.pos].is_ascii_whitespace()
        {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    /// Consume `op` if it is next in the input.
    fn eat(&mut self, op: &str) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(op) {
            self.pos += op.len();
            true
        } else {
            false
        }
    }

    fn bit_or(&mut self) -> AplanResult<i64> {
        let mut left = self.bit_xor()?;
        loop {
            self.skip_ws();
            // `||` would be a boolean operator; only a single `|` binds here.
            if self.src[self.pos..].starts_with('|')
                && !self.src[self.pos..].starts_with("||")
            {
                self.pos += 1;
                left |= self.bit_xor()?;
            } else {
                return Ok(left);
            }
        }
    }

    fn bit_xor(&mut self) -> AplanResult<i64> {
        let mut left = self.bit_and()?;
        while self.eat("^") {
            left ^= self.bit_and()?;
        }
        Ok(left)
    }

    fn bit_and(&mut self) -> AplanResult<i64> {
        let mut left = self.shift()?;
        loop {
            self.skip_ws();
            if self.src[self.pos..].starts_with('&')
                && !self.src[self.pos..].starts_with("&&")
            {
                self.pos += 1;
                left &= self.shift()?;
            } else {
                return Ok(left);
            }
        }
    }

    fn shift(&mut self) -> AplanResult<i64> {
        let mut left = self.additive()?;
        loop {
            if self.eat("<<") {
                left <<= self.additive()?;
            } else if self.eat(">>") {
                left >>= self.additive()?;
            } else {
                return Ok(left);
            }
        }
    }

    fn additive(&mut self) -> AplanResult<i64> {
        let mut left = self.multiplicative()?;
        loop {
            if self.eat("+") {
                left += self.multiplicative()?;
            } else if self.eat("-") {
                left -= self.multiplicative()?;
            } else {
                return Ok(left);
            }
        }
    }

    fn multiplicative(&mut self) -> AplanResult<i64> {
        let mut left = self.unary()?;
        loop {
            if self.eat("*") {
                left *= self.unary()?;
            } else if self.eat("/") {
                let right = self.unary()?;
                if right == 0 {
                    return Err(Error::malformed_numeric(format!(
                        "division by zero in `{}`",
                        self.src
                    )));
                }
                left /= right;
            } else if self.eat("%") {
                let right = self.unary()?;
                if right == 0 {
                    return Err(Error::malformed_numeric(format!(
                        "modulo by zero in `{}`",
                        self.src
                    )));
                }
                left %= right;
            } else {
                return Ok(left);
            }
        }
    }

    fn unary(&mut self) -> AplanResult<i64> {
        if self.eat("-") {
            Ok(-self.unary()?)
        } else if self.eat("~") {
            Ok(!self.unary()?)
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> AplanResult<i64> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let value = self.bit_or()?;
                if !self.eat(")") {
                    return Err(Error::malformed_numeric(format!(
                        "unbalanced parenthesis in `{}`",
                        self.src
                    )));
                }
                Ok(value)
            }
            Some(b) if b.is_ascii_digit() => {
                let start = self.pos;
                while self.pos < self.bytes.len()
                    && self.bytes[self.pos].is_ascii_digit()
                {
                    self.pos += 1;
                }
                self.src[start..self.pos].parse::<i64>().map_err(|_| {
                    Error::malformed_numeric(format!(
                        "integer literal overflow in `{}`",
                        self.src
                    ))
                })
            }
            _ => Err(Error::malformed_numeric(format!(
                "expected a number in `{}`",
                self.src
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_grouping() {
        assert_eq!(eval_int_expr("2 + 3 * 4").unwrap(), 14);
        assert_eq!(eval_int_expr("(2 + 3) * 4").unwrap(), 20);
        assert_eq!(eval_int_expr("1 << 4").unwrap(), 16);
        assert_eq!(eval_int_expr("255 & 15 | 32").unwrap(), 47);
        assert_eq!(eval_int_expr("-3 + 5").unwrap(), 2);
    }

    #[test]
    fn malformed_input_is_fatal() {
        assert!(eval_int_expr("2 +").is_err());
        assert!(eval_int_expr("(2").is_err());
        assert!(eval_int_expr("width - 1").is_err());
        assert!(eval_int_expr("4 / 0").is_err());
    }

    #[test]
    fn vector_sizes() {
        assert_eq!(aplan_vector_size(Some(7), Some(0)).unwrap(), (8, 0));
        assert_eq!(aplan_vector_size(Some(15), Some(8)).unwrap(), (7, 8));
        assert!(aplan_vector_size(Some(7), None).is_err());
    }
}
