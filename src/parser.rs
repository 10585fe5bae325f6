// ABOUTME: Reader — lexes and recursive-descent parses source text into values, per spec.md section 4.1

use nom::{
    branch::alt,
    bytes::complete::take_while,
    bytes::complete::take_while1,
    character::complete::char,
    combinator::{map, opt, value},
    sequence::preceded,
    IResult, Parser,
};

use crate::error::LispError;
use crate::interpreter::Interpreter;
use crate::value::Value;

fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\n'
}

fn is_delimiter(c: char) -> bool {
    c == '(' || c == ')' || is_whitespace(c)
}

fn skip_ws(input: &str) -> &str {
    take_while::<_, _, nom::error::Error<&str>>(is_whitespace)
        .parse(input)
        .map(|(rest, _)| rest)
        .unwrap_or(input)
}

#[derive(Debug, Clone, Copy)]
enum Token<'a> {
    LParen,
    RParen,
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplicing,
    Atom(&'a str),
}

/// One lexical token, per the delimiter/prefix rules of spec.md section 4.1.
/// `,`/`,@` collapse into one branch since both share the same lead byte.
fn next_token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::Quote, char('\'')),
        value(Token::Quasiquote, char('`')),
        map(preceded(char(','), opt(char('@'))), |at| {
            if at.is_some() {
                Token::UnquoteSplicing
            } else {
                Token::Unquote
            }
        }),
        map(take_while1(|c: char| !is_delimiter(c)), Token::Atom),
    ))
    .parse(input)
}

impl Interpreter {
    /// Consume one S-expression from the front of `input`, returning the
    /// value and the unconsumed remainder.
    pub fn read_expr<'a>(&mut self, input: &'a str) -> Result<(Value, &'a str), LispError> {
        let input = skip_ws(input);
        let (rest, token) = next_token(input).map_err(|_| LispError::Syntax)?;
        self.read_from_token(token, rest)
    }

    fn read_from_token<'a>(
        &mut self,
        token: Token<'a>,
        rest: &'a str,
    ) -> Result<(Value, &'a str), LispError> {
        match token {
            Token::LParen => self.read_list(rest),
            Token::RParen => Err(LispError::Syntax),
            Token::Quote => self.read_reader_macro(rest, self.forms.quote),
            Token::Quasiquote => self.read_reader_macro(rest, self.forms.quasiquote),
            Token::Unquote => self.read_reader_macro(rest, self.forms.unquote),
            Token::UnquoteSplicing => self.read_reader_macro(rest, self.forms.unquote_splicing),
            Token::Atom(text) => Ok((self.atom_value(text), rest)),
        }
    }

    fn read_reader_macro<'a>(
        &mut self,
        rest: &'a str,
        head: crate::symbol::Symbol,
    ) -> Result<(Value, &'a str), LispError> {
        let (inner, rest) = self.read_expr(rest)?;
        let wrapped = self.list_of(&[Value::Symbol(head), inner]);
        Ok((wrapped, rest))
    }

    fn read_list<'a>(&mut self, mut input: &'a str) -> Result<(Value, &'a str), LispError> {
        let mut items = Vec::new();
        loop {
            let after_ws = skip_ws(input);
            if after_ws.is_empty() {
                return Err(LispError::Syntax);
            }
            let (rest, token) = next_token(after_ws).map_err(|_| LispError::Syntax)?;
            match token {
                Token::RParen => {
                    let list = self.list_of(&items);
                    return Ok((list, rest));
                }
                Token::Atom(".") => {
                    if items.is_empty() {
                        return Err(LispError::Syntax);
                    }
                    let (tail, rest) = self.read_expr(rest)?;
                    let after_ws = skip_ws(rest);
                    let (rest, closing) = next_token(after_ws).map_err(|_| LispError::Syntax)?;
                    return match closing {
                        Token::RParen => {
                            let list = self.list_with_tail(&items, tail);
                            Ok((list, rest))
                        }
                        _ => Err(LispError::Syntax),
                    };
                }
                other => {
                    let (value, rest) = self.read_from_token(other, rest)?;
                    items.push(value);
                    input = rest;
                }
            }
        }
    }

    /// Classify a bare token: signed integer, the literal `nil`, else intern
    /// it as a symbol (case preserved).
    fn atom_value(&mut self, text: &str) -> Value {
        if let Ok(n) = text.parse::<i64>() {
            return Value::Integer(n);
        }
        if text == "nil" {
            return Value::Nil;
        }
        Value::Symbol(self.intern(text))
    }

    /// Read every top-level form out of `input` in source order. Used by
    /// the file loader, which is not bound by the REPL's one-line-at-a-time
    /// wrapping trick.
    pub fn read_all(&mut self, input: &str) -> Result<Vec<Value>, LispError> {
        let mut forms = Vec::new();
        let mut rest = input;
        loop {
            rest = skip_ws(rest);
            if rest.is_empty() {
                return Ok(forms);
            }
            let (value, next) = self.read_expr(rest)?;
            forms.push(value);
            rest = next;
        }
    }
}
