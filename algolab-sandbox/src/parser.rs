//! Recursive-descent parser for lesson scripts.
//!
//! Grammar sketch:
//!
//! ```text
//! program   := (stmt sep*)*
//! stmt      := ident "=" expr
//!            | "if" expr block ("else" (block | if-stmt))?
//!            | "while" expr block
//!            | "for" ident "in" expr block
//!            | expr
//! block     := "{" (stmt sep*)* "}"
//! expr      := or
//! or        := and ("or" and)*
//! and       := unary-not ("and" unary-not)*
//! unary-not := "not" unary-not | comparison
//! comparison:= additive (("==" | "!=" | "<" | "<=" | ">" | ">=") additive)*
//! additive  := term (("+" | "-") term)*
//! term      := unary (("*" | "/" | "%") unary)*
//! unary     := "-" unary | power
//! power     := postfix ("**" unary)?
//! postfix   := primary ("[" expr "]")*
//! primary   := number | string | "true" | "false" | ident | ident "(" args ")"
//!            | "[" items "]" | "(" expr ")"
//! ```

use crate::error::SnippetError;
use crate::lexer::{self, Spanned, Token};

/// Nesting guard so hostile input cannot overflow the parser stack.
const MAX_DEPTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    /// Operator spelling used in error messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    List(Vec<Expr>),
    Ident {
        name: String,
        line: u32,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        line: u32,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        line: u32,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: u32,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        name: String,
        value: Expr,
        line: u32,
    },
    Expr {
        expr: Expr,
        line: u32,
    },
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
        line: u32,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        line: u32,
    },
    For {
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
        line: u32,
    },
}

/// Parse `source` into a statement list.
pub fn parse(source: &str) -> Result<Vec<Stmt>, SnippetError> {
    let tokens = lexer::tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    parser.program()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn program(&mut self) -> Result<Vec<Stmt>, SnippetError> {
        let mut stmts = Vec::new();
        self.skip_separators();
        while self.peek().is_some() {
            stmts.push(self.statement()?);
            self.expect_statement_end()?;
            self.skip_separators();
        }
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Stmt, SnippetError> {
        match self.peek() {
            Some(Token::If) => self.if_statement(),
            Some(Token::While) => self.while_statement(),
            Some(Token::For) => self.for_statement(),
            Some(Token::Ident(_)) if self.peek_at(1) == Some(&Token::Assign) => {
                let line = self.line();
                let name = self.expect_ident()?;
                self.advance(); // consume '='
                let value = self.expression()?;
                Ok(Stmt::Assign { name, value, line })
            }
            _ => {
                let line = self.line();
                let expr = self.expression()?;
                if self.peek() == Some(&Token::Assign) {
                    return Err(SnippetError::syntax(
                        "cannot assign to this expression",
                        self.line(),
                    ));
                }
                Ok(Stmt::Expr { expr, line })
            }
        }
    }

    fn if_statement(&mut self) -> Result<Stmt, SnippetError> {
        let line = self.line();
        self.advance(); // 'if'
        let cond = self.expression()?;
        let then_body = self.block()?;
        let mut else_body = Vec::new();
        if self.peek_skipping_newlines() == Some(&Token::Else) {
            self.skip_newlines();
            self.advance(); // 'else'
            if self.peek() == Some(&Token::If) {
                else_body.push(self.if_statement()?);
            } else {
                else_body = self.block()?;
            }
        }
        Ok(Stmt::If {
            cond,
            then_body,
            else_body,
            line,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, SnippetError> {
        let line = self.line();
        self.advance(); // 'while'
        let cond = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::While { cond, body, line })
    }

    fn for_statement(&mut self) -> Result<Stmt, SnippetError> {
        let line = self.line();
        self.advance(); // 'for'
        let var = self.expect_ident()?;
        self.expect(Token::In, "expected 'in' after loop variable")?;
        let iterable = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::For {
            var,
            iterable,
            body,
            line,
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, SnippetError> {
        self.skip_newlines();
        self.expect(Token::LBrace, "expected '{' to open a block")?;
        let mut stmts = Vec::new();
        self.skip_separators();
        while self.peek() != Some(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(SnippetError::syntax(
                    "expected '}' to close a block",
                    self.line(),
                ));
            }
            stmts.push(self.statement()?);
            self.expect_statement_end()?;
            self.skip_separators();
        }
        self.advance(); // consume '}'
        Ok(stmts)
    }

    // -- Expressions ---------------------------------------------------------

    fn expression(&mut self) -> Result<Expr, SnippetError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SnippetError::syntax(
                "expression is nested too deeply",
                self.line(),
            ));
        }
        let expr = self.or_expr();
        self.depth -= 1;
        expr
    }

    fn or_expr(&mut self) -> Result<Expr, SnippetError> {
        let mut lhs = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            let line = self.line();
            self.advance();
            let rhs = self.and_expr()?;
            lhs = Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, SnippetError> {
        let mut lhs = self.not_expr()?;
        while self.peek() == Some(&Token::And) {
            let line = self.line();
            self.advance();
            let rhs = self.not_expr()?;
            lhs = Expr::Binary {
                op: BinaryOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, SnippetError> {
        if self.peek() == Some(&Token::Not) {
            let line = self.line();
            self.advance();
            let operand = self.not_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                line,
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, SnippetError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, SnippetError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, SnippetError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, SnippetError> {
        if self.peek() == Some(&Token::Minus) {
            let line = self.line();
            self.advance();
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                line,
            });
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, SnippetError> {
        let base = self.postfix()?;
        if self.peek() == Some(&Token::StarStar) {
            let line = self.line();
            self.advance();
            // Right-associative: 2 ** 3 ** 2 == 2 ** (3 ** 2).
            let exponent = self.unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
                line,
            });
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, SnippetError> {
        let mut expr = self.primary()?;
        while self.peek() == Some(&Token::LBracket) {
            let line = self.line();
            self.advance();
            let index = self.expression()?;
            self.expect(Token::RBracket, "expected ']' after index")?;
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
                line,
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, SnippetError> {
        let line = self.line();
        match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Some(Token::Str(s)) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            Some(Token::True) => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Some(Token::False) => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Some(Token::Ident(name)) => {
                self.advance();
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let args = self.call_args()?;
                    Ok(Expr::Call { name, args, line })
                } else {
                    Ok(Expr::Ident { name, line })
                }
            }
            Some(Token::LBracket) => {
                self.advance();
                let mut items = Vec::new();
                self.skip_newlines();
                if self.peek() != Some(&Token::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        self.skip_newlines();
                        if self.peek() == Some(&Token::Comma) {
                            self.advance();
                            self.skip_newlines();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(Token::RBracket, "expected ']' after array literal")?;
                Ok(Expr::List(items))
            }
            Some(Token::LParen) => {
                self.advance();
                let expr = self.expression()?;
                self.expect(Token::RParen, "expected ')' after expression")?;
                Ok(expr)
            }
            Some(other) => Err(SnippetError::syntax(
                format!("unexpected token {other:?}"),
                line,
            )),
            None => Err(SnippetError::syntax("unexpected end of input", line)),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, SnippetError> {
        let mut args = Vec::new();
        self.skip_newlines();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.expression()?);
                self.skip_newlines();
                if self.peek() == Some(&Token::Comma) {
                    self.advance();
                    self.skip_newlines();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "expected ')' after call arguments")?;
        Ok(args)
    }

    // -- Cursor helpers ------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn peek_skipping_newlines(&self) -> Option<&Token> {
        self.tokens[self.pos..]
            .iter()
            .map(|s| &s.token)
            .find(|t| **t != Token::Newline)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, token: Token, message: &str) -> Result<(), SnippetError> {
        if self.peek() == Some(&token) {
            self.advance();
            Ok(())
        } else {
            Err(SnippetError::syntax(message, self.line()))
        }
    }

    fn expect_ident(&mut self) -> Result<String, SnippetError> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(SnippetError::syntax("expected an identifier", self.line())),
        }
    }

    /// A statement must be followed by a separator, a closing brace, or EOF.
    fn expect_statement_end(&mut self) -> Result<(), SnippetError> {
        match self.peek() {
            None | Some(Token::Newline) | Some(Token::Semicolon) | Some(Token::RBrace) => Ok(()),
            Some(other) => Err(SnippetError::syntax(
                format!("unexpected token {other:?} after statement"),
                self.line(),
            )),
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(Token::Newline) | Some(Token::Semicolon)) {
            self.advance();
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.advance();
        }
    }
}
