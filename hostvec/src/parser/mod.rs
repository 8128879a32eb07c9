//! Recursive-descent parser for host scripts
//!
//! ```text
//! script  := stmt*
//! stmt    := "let" IDENT "=" expr ";" | expr ";"
//! expr    := "-" expr | postfix
//! postfix := primary ("." IDENT args?)*
//! primary := literal | IDENT args? | "new" IDENT args?
//!          | "[" exprs "]" | "{" fields "}" | "(" expr ")"
//! ```
//!
//! The final semicolon of a script may be omitted.

use crate::ast::{Expr, Script, Span, Spanned, Stmt};
use crate::error::ScriptError;
use crate::lexer::Token;


type Result<T> = std::result::Result<T, ScriptError>;

/// Deepest expression nesting a script may use
pub const MAX_NESTING: usize = 256;

/// Stack growth parameters for nested expressions
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Parse tokens into a script
pub fn parse(tokens: Vec<(Token, Span)>) -> Result<Script> {
    let end = tokens.last().map_or(0, |(_, span)| span.end);
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        eof: Span::new(end, end),
    };
    parser.script()
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    /// Nesting of the expression being parsed
    depth: usize,
    eof: Span,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens.get(self.pos).map_or(self.eof, |(_, s)| *s)
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn unexpected(&self, expected: &str) -> ScriptError {
        match self.peek() {
            Some(found) => ScriptError::parser(
                format!("expected {expected}, found `{found}`"),
                self.peek_span(),
            ),
            None => ScriptError::parser(
                format!("expected {expected}, found end of input"),
                self.eof,
            ),
        }
    }

    fn expect(&mut self, token: Token) -> Result<Span> {
        if !self.at(&token) {
            return Err(self.unexpected(&format!("`{token}`")));
        }
        let span = self.peek_span();
        self.pos += 1;
        Ok(span)
    }

    fn ident(&mut self) -> Result<Spanned<String>> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = Spanned::new(name.clone(), self.peek_span());
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn script(&mut self) -> Result<Script> {
        let mut stmts = Vec::new();
        while !self.at_end() {
            if self.at(&Token::Semi) {
                self.pos += 1;
                continue;
            }
            stmts.push(self.stmt()?);
        }
        Ok(Script { stmts })
    }

    fn stmt(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.peek_span();
        let stmt = if self.at(&Token::Let) {
            self.pos += 1;
            let name = self.ident()?;
            self.expect(Token::Eq)?;
            let value = self.expr()?;
            Stmt::Let { name, value }
        } else {
            Stmt::Expr(self.expr()?)
        };
        let end = self.terminator()?;
        Ok(Spanned::new(stmt, start.merge(end)))
    }

    /// `;`, optional before end of input
    fn terminator(&mut self) -> Result<Span> {
        if self.at_end() {
            let prev = self.pos.checked_sub(1).and_then(|i| self.tokens.get(i));
            return Ok(prev.map_or(self.eof, |(_, s)| *s));
        }
        self.expect(Token::Semi)
    }

    /// One more level of nesting; fails past [`MAX_NESTING`]
    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(ScriptError::parser(
                format!("expression nested more than {MAX_NESTING} levels deep"),
                self.peek_span(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn expr(&mut self) -> Result<Spanned<Expr>> {
        self.descend()?;
        let expr = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.unary())?;
        self.depth -= 1;
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Spanned<Expr>> {
        if self.at(&Token::Minus) {
            let minus = self.peek_span();
            self.pos += 1;
            let operand = self.expr()?;
            let span = minus.merge(operand.span);
            return Ok(Spanned::new(Expr::Neg(Box::new(operand)), span));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Spanned<Expr>> {
        let base = self.depth;
        let mut expr = self.primary()?;
        while self.at(&Token::Dot) {
            // each link wraps the chain so far
            self.descend()?;
            self.pos += 1;
            let name = self.ident()?;
            if self.at(&Token::LParen) {
                let (args, close) = self.args()?;
                let span = expr.span.merge(close);
                expr = Spanned::new(
                    Expr::MethodCall {
                        receiver: Box::new(expr),
                        method: name,
                        args,
                    },
                    span,
                );
            } else {
                let span = expr.span.merge(name.span);
                expr = Spanned::new(
                    Expr::Property {
                        object: Box::new(expr),
                        name,
                    },
                    span,
                );
            }
        }
        self.depth = base;
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Spanned<Expr>> {
        let span = self.peek_span();
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected("expression"));
        };
        let literal = match token {
            Token::Undefined => Some(Expr::Undefined),
            Token::Null => Some(Expr::Null),
            Token::True => Some(Expr::Bool(true)),
            Token::False => Some(Expr::Bool(false)),
            Token::IntLit(n) => Some(Expr::Int(n)),
            Token::FloatLit(n) => Some(Expr::Float(n)),
            Token::StringLit(ref s) => Some(Expr::Str(s.clone())),
            _ => None,
        };
        if let Some(expr) = literal {
            self.pos += 1;
            return Ok(Spanned::new(expr, span));
        }

        match token {
            Token::Ident(_) => {
                let callee = self.ident()?;
                if self.at(&Token::LParen) {
                    let (args, close) = self.args()?;
                    Ok(Spanned::new(Expr::Call { callee, args }, span.merge(close)))
                } else {
                    Ok(Spanned::new(Expr::Var(callee.node), span))
                }
            }
            Token::New => {
                self.pos += 1;
                let class = self.ident()?;
                let (args, end) = if self.at(&Token::LParen) {
                    self.args()?
                } else {
                    (Vec::new(), class.span)
                };
                Ok(Spanned::new(Expr::New { class, args }, span.merge(end)))
            }
            Token::LBracket => {
                self.pos += 1;
                let (items, close) = self.list(Token::RBracket, Self::expr)?;
                Ok(Spanned::new(Expr::Array(items), span.merge(close)))
            }
            Token::LBrace => {
                self.pos += 1;
                let (fields, close) = self.list(Token::RBrace, Self::field)?;
                Ok(Spanned::new(Expr::Object(fields), span.merge(close)))
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.expr()?;
                let close = self.expect(Token::RParen)?;
                Ok(Spanned::new(inner.node, span.merge(close)))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `key: value` inside an object literal
    fn field(&mut self) -> Result<(String, Spanned<Expr>)> {
        let key = match self.peek() {
            Some(Token::Ident(name)) | Some(Token::StringLit(name)) => name.clone(),
            _ => return Err(self.unexpected("property name")),
        };
        self.pos += 1;
        self.expect(Token::Colon)?;
        Ok((key, self.expr()?))
    }

    /// `( expr, ... )`; returns the arguments and the span of `)`
    fn args(&mut self) -> Result<(Vec<Spanned<Expr>>, Span)> {
        self.expect(Token::LParen)?;
        self.list(Token::RParen, Self::expr)
    }

    /// Comma-separated items up to `close`, trailing comma allowed
    fn list<T>(
        &mut self,
        close: Token,
        mut item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<(Vec<T>, Span)> {
        let mut items = Vec::new();
        loop {
            if self.at(&close) {
                break;
            }
            items.push(item(self)?);
            if self.at(&Token::Comma) {
                self.pos += 1;
            } else {
                break;
            }
        }
        let end = self.expect(close)?;
        Ok((items, end))
    }
}
