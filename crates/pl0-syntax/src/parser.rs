//! Recursive-descent parser turning a token stream into an [`ast::Program`].

use std::rc::Rc;

use pl0_lexer::{Lexer, Location, Token, TokenKind};
use thiserror::Error;

use crate::ast::{Block, CallTarget, Expression, ProcedureDecl, Program, Statement, VariableProxy};
use crate::scope::{Scope, Symbol, SymbolRef};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Error({location}): expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: Token,
        location: Location,
    },

    #[error("Error({location}): unrecognized character")]
    Lexical { location: Location },

    #[error("Error({location}): '{name}' is already declared in this scope")]
    DuplicateSymbol { name: String, location: Location },

    #[error("Error({location}): '{name}' is undeclared")]
    Undeclared { name: String, location: Location },

    #[error("Error({location}): '{name}' is a {found}, expected a {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
        location: Location,
    },
}

type Result<T> = std::result::Result<T, ParseError>;

/// A forward `call` whose callee hadn't been declared yet when it was parsed.
struct PendingCall {
    name: String,
    location: Location,
    scope: Rc<Scope>,
    target: Rc<CallTarget>,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pending_calls: Vec<PendingCall>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            pending_calls: Vec::new(),
        }
    }

    pub fn parse_program(mut self) -> Result<Program> {
        let root = Scope::root();
        let block = self.parse_block(root)?;
        self.expect(TokenKind::Period)?;
        self.finish_pending_calls()?;
        Ok(Program { block })
    }

    fn finish_pending_calls(&mut self) -> Result<()> {
        for pending in self.pending_calls.drain(..) {
            let symbol = pending
                .scope
                .resolve(&pending.name)
                .ok_or_else(|| ParseError::Undeclared {
                    name: pending.name.clone(),
                    location: pending.location,
                })?;
            if !symbol.is_procedure() {
                return Err(ParseError::WrongKind {
                    name: pending.name,
                    expected: "procedure",
                    found: symbol_kind_name(&symbol),
                    location: pending.location,
                });
            }
            pending.target.resolve(symbol);
        }
        Ok(())
    }

    // ---- token stream helpers -------------------------------------------------

    fn current(&self) -> &Token {
        self.lexer.peek()
    }

    fn location(&self) -> Location {
        self.lexer.location()
    }

    fn check_illegal(&self) -> Result<()> {
        if self.current().kind == TokenKind::Illegal {
            return Err(ParseError::Lexical {
                location: self.location(),
            });
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<Token> {
        self.check_illegal()?;
        Ok(self.lexer.next())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        self.check_illegal()?;
        if self.current().kind != kind {
            return Err(ParseError::UnexpectedToken {
                expected: kind.to_string(),
                found: self.current().clone(),
                location: self.location(),
            });
        }
        Ok(self.lexer.next())
    }

    fn expect_identifier(&mut self) -> Result<(String, Location)> {
        self.check_illegal()?;
        if self.current().kind != TokenKind::Identifier {
            return Err(ParseError::UnexpectedToken {
                expected: "identifier".into(),
                found: self.current().clone(),
                location: self.location(),
            });
        }
        let location = self.location();
        let token = self.lexer.next();
        Ok((token.literal.unwrap_or_default(), location))
    }

    fn expect_number(&mut self) -> Result<i64> {
        self.check_illegal()?;
        if self.current().kind != TokenKind::Number {
            return Err(ParseError::UnexpectedToken {
                expected: "number".into(),
                found: self.current().clone(),
                location: self.location(),
            });
        }
        let token = self.lexer.next();
        let text = token.literal.unwrap_or_default();
        Ok(text.parse().unwrap_or(0))
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    // ---- grammar ---------------------------------------------------------------

    fn parse_block(&mut self, scope: Rc<Scope>) -> Result<Block> {
        let mut constants = Vec::new();
        let mut variables = Vec::new();
        let mut procedures = Vec::new();

        if self.at(TokenKind::Const) {
            self.advance()?;
            loop {
                let (name, location) = self.expect_identifier()?;
                self.expect(TokenKind::Eq)?;
                let value = self.expect_number()?;
                let symbol: SymbolRef = Rc::new(Symbol::Constant {
                    name: name.clone(),
                    value,
                });
                scope
                    .define(Rc::clone(&symbol))
                    .map_err(|name| ParseError::DuplicateSymbol { name, location })?;
                constants.push(symbol);
                if self.at(TokenKind::Comma) {
                    self.advance()?;
                } else {
                    break;
                }
            }
            self.expect(TokenKind::Semicolon)?;
        }

        if self.at(TokenKind::Var) {
            self.advance()?;
            loop {
                let (name, location) = self.expect_identifier()?;
                let index = scope.variable_count();
                let symbol: SymbolRef = Rc::new(Symbol::Variable {
                    name: name.clone(),
                    level: scope.level(),
                    index,
                });
                scope
                    .define(Rc::clone(&symbol))
                    .map_err(|name| ParseError::DuplicateSymbol { name, location })?;
                variables.push(symbol);
                if self.at(TokenKind::Comma) {
                    self.advance()?;
                } else {
                    break;
                }
            }
            self.expect(TokenKind::Semicolon)?;
        }

        while self.at(TokenKind::Procedure) {
            self.advance()?;
            let (name, location) = self.expect_identifier()?;
            let symbol: SymbolRef = Rc::new(Symbol::Procedure {
                name: name.clone(),
                level: scope.level(),
            });
            scope
                .define(Rc::clone(&symbol))
                .map_err(|name| ParseError::DuplicateSymbol { name, location })?;
            self.expect(TokenKind::Semicolon)?;
            let nested_scope = Scope::nested(&scope);
            let block = self.parse_block(nested_scope)?;
            self.expect(TokenKind::Semicolon)?;
            procedures.push(ProcedureDecl { symbol, block });
        }

        let body = Box::new(self.parse_statement(&scope)?);

        Ok(Block {
            scope,
            constants,
            variables,
            procedures,
            body,
        })
    }

    fn parse_statement(&mut self, scope: &Rc<Scope>) -> Result<Statement> {
        match self.current().kind {
            TokenKind::Identifier => self.parse_assign(scope),
            TokenKind::Call => self.parse_call(scope),
            TokenKind::Begin => self.parse_statement_list(scope),
            TokenKind::If => self.parse_if(scope),
            TokenKind::While => self.parse_while(scope),
            TokenKind::Read => self.parse_read(scope),
            TokenKind::Write => self.parse_write(scope),
            TokenKind::Return => {
                let location = self.location();
                self.advance()?;
                Ok(Statement::Return { location })
            }
            _ => Ok(Statement::Empty),
        }
    }

    fn parse_statement_list(&mut self, scope: &Rc<Scope>) -> Result<Statement> {
        self.expect(TokenKind::Begin)?;
        let mut statements = vec![self.parse_statement(scope)?];
        while self.at(TokenKind::Semicolon) {
            self.advance()?;
            statements.push(self.parse_statement(scope)?);
        }
        self.expect(TokenKind::End)?;
        Ok(Statement::StatementList(statements))
    }

    fn parse_if(&mut self, scope: &Rc<Scope>) -> Result<Statement> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_condition(scope)?;
        self.expect(TokenKind::Then)?;
        let then_branch = Box::new(self.parse_statement(scope)?);
        let else_branch = if self.at(TokenKind::Else) {
            self.advance()?;
            Some(Box::new(self.parse_statement(scope)?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self, scope: &Rc<Scope>) -> Result<Statement> {
        self.expect(TokenKind::While)?;
        let condition = self.parse_condition(scope)?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_statement(scope)?);
        Ok(Statement::While { condition, body })
    }

    fn parse_call(&mut self, scope: &Rc<Scope>) -> Result<Statement> {
        self.expect(TokenKind::Call)?;
        let (name, location) = self.expect_identifier()?;

        let target = Rc::new(CallTarget::unresolved());
        match scope.resolve(&name) {
            Some(symbol) => {
                if !symbol.is_procedure() {
                    return Err(ParseError::WrongKind {
                        name,
                        expected: "procedure",
                        found: symbol_kind_name(&symbol),
                        location,
                    });
                }
                target.resolve(symbol);
            }
            None => {
                self.pending_calls.push(PendingCall {
                    name: name.clone(),
                    location,
                    scope: Rc::clone(scope),
                    target: Rc::clone(&target),
                });
            }
        }

        Ok(Statement::Call {
            callee: target,
            name,
            location,
        })
    }

    fn parse_read(&mut self, scope: &Rc<Scope>) -> Result<Statement> {
        self.expect(TokenKind::Read)?;
        let mut targets = vec![self.parse_variable_proxy(scope)?];
        while self.at(TokenKind::Comma) {
            self.advance()?;
            targets.push(self.parse_variable_proxy(scope)?);
        }
        Ok(Statement::Read { targets })
    }

    fn parse_write(&mut self, scope: &Rc<Scope>) -> Result<Statement> {
        self.expect(TokenKind::Write)?;
        let mut expressions = vec![self.parse_expression(scope)?];
        while self.at(TokenKind::Comma) {
            self.advance()?;
            expressions.push(self.parse_expression(scope)?);
        }
        Ok(Statement::Write { expressions })
    }

    fn parse_assign(&mut self, scope: &Rc<Scope>) -> Result<Statement> {
        let target = self.parse_variable_proxy(scope)?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression(scope)?;
        Ok(Statement::Assign { target, value })
    }

    fn parse_variable_proxy(&mut self, scope: &Rc<Scope>) -> Result<VariableProxy> {
        let (name, location) = self.expect_identifier()?;
        let symbol = scope
            .resolve(&name)
            .ok_or_else(|| ParseError::Undeclared {
                name: name.clone(),
                location,
            })?;
        if !symbol.is_variable() {
            return Err(ParseError::WrongKind {
                name,
                expected: "variable",
                found: symbol_kind_name(&symbol),
                location,
            });
        }
        Ok(VariableProxy { symbol, location })
    }

    fn parse_condition(&mut self, scope: &Rc<Scope>) -> Result<Expression> {
        if self.at(TokenKind::Odd) {
            let location = self.location();
            self.advance()?;
            let expr = self.parse_expression(scope)?;
            return Ok(Expression::Unary {
                op: TokenKind::Odd,
                expr: Box::new(expr),
                location,
            });
        }

        let left = self.parse_expression(scope)?;
        let location = self.location();
        if !self.current().kind.is_relational() {
            return Err(ParseError::UnexpectedToken {
                expected: "relational operator".into(),
                found: self.current().clone(),
                location,
            });
        }
        let op = self.advance()?.kind;
        let right = self.parse_expression(scope)?;
        Ok(Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            location,
        })
    }

    /// `["+" | "-"] term { ("+" | "-") term }` — conventional precedence,
    /// lowest-binding `+`/`-` on top of `*`/`/` in [`Self::parse_term`].
    fn parse_expression(&mut self, scope: &Rc<Scope>) -> Result<Expression> {
        let mut expr = if matches!(self.current().kind, TokenKind::Plus | TokenKind::Minus) {
            let location = self.location();
            let op = self.advance()?.kind;
            let operand = self.parse_term(scope)?;
            if op == TokenKind::Minus {
                Expression::Unary {
                    op: TokenKind::Minus,
                    expr: Box::new(operand),
                    location,
                }
            } else {
                operand
            }
        } else {
            self.parse_term(scope)?
        };

        while matches!(self.current().kind, TokenKind::Plus | TokenKind::Minus) {
            let location = self.location();
            let op = self.advance()?.kind;
            let right = self.parse_term(scope)?;
            expr = Expression::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                location,
            };
        }
        Ok(expr)
    }

    /// `factor { ("*" | "/") factor }`.
    fn parse_term(&mut self, scope: &Rc<Scope>) -> Result<Expression> {
        let mut expr = self.parse_factor(scope)?;
        while matches!(self.current().kind, TokenKind::Star | TokenKind::Slash) {
            let location = self.location();
            let op = self.advance()?.kind;
            let right = self.parse_factor(scope)?;
            expr = Expression::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                location,
            };
        }
        Ok(expr)
    }

    fn parse_factor(&mut self, scope: &Rc<Scope>) -> Result<Expression> {
        match self.current().kind {
            TokenKind::Identifier => {
                let (name, location) = self.expect_identifier()?;
                let symbol = scope
                    .resolve(&name)
                    .ok_or_else(|| ParseError::Undeclared {
                        name: name.clone(),
                        location,
                    })?;
                match symbol.as_ref() {
                    Symbol::Constant { value, .. } => Ok(Expression::Literal {
                        value: *value,
                        location,
                    }),
                    Symbol::Variable { .. } => {
                        Ok(Expression::Variable(VariableProxy { symbol, location }))
                    }
                    Symbol::Procedure { .. } => Err(ParseError::WrongKind {
                        name,
                        expected: "variable or constant",
                        found: "procedure",
                        location,
                    }),
                }
            }
            TokenKind::Number => {
                let location = self.location();
                let value = self.expect_number()?;
                Ok(Expression::Literal { value, location })
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression(scope)?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "expression".into(),
                found: self.current().clone(),
                location: self.location(),
            }),
        }
    }
}

fn symbol_kind_name(symbol: &Symbol) -> &'static str {
    match symbol {
        Symbol::Constant { .. } => "constant",
        Symbol::Variable { .. } => "variable",
        Symbol::Procedure { .. } => "procedure",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program> {
        Parser::new(source).parse_program()
    }

    #[test]
    fn parses_minimal_program() {
        assert!(parse("var x; begin x := 1 end.").is_ok());
    }

    #[test]
    fn rejects_duplicate_declaration() {
        let err = parse("var x, x; begin end.").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateSymbol { .. }));
    }

    #[test]
    fn rejects_undeclared_identifier() {
        let err = parse("begin x := 1 end.").unwrap_err();
        assert!(matches!(err, ParseError::Undeclared { .. }));
    }

    #[test]
    fn resolves_forward_call_to_later_sibling() {
        let program = parse(
            "procedure p1; begin call p2 end; \
             procedure p2; begin end; \
             call p1.",
        )
        .unwrap();
        let procs = &program.block.procedures;
        assert_eq!(procs.len(), 2);
        if let Statement::StatementList(stmts) = procs[0].block.body.as_ref() {
            if let Statement::Call { callee, .. } = &stmts[0] {
                assert!(callee.is_resolved());
                assert_eq!(callee.get().name(), "p2");
            } else {
                panic!("expected a call statement");
            }
        } else {
            panic!("expected a statement list");
        }
    }

    #[test]
    fn rejects_call_to_undeclared_procedure() {
        let err = parse("begin call nope end.").unwrap_err();
        assert!(matches!(err, ParseError::Undeclared { .. }));
    }

    #[test]
    fn conventional_precedence_multiplies_before_adding() {
        // 2 + 3 * 4 must parse as 2 + (3 * 4), not (2 + 3) * 4.
        let program = parse("var r; begin r := 2 + 3 * 4 end.").unwrap();
        if let Statement::Assign { value, .. } = program.block.body.as_ref() {
            if let Expression::Binary { op, left, right, .. } = value {
                assert_eq!(*op, TokenKind::Plus);
                assert!(matches!(left.as_ref(), Expression::Literal { value: 2, .. }));
                assert!(matches!(right.as_ref(), Expression::Binary { op: TokenKind::Star, .. }));
            } else {
                panic!("expected a binary expression");
            }
        } else {
            panic!("expected an assignment");
        }
    }

    #[test]
    fn if_without_else_parses() {
        assert!(parse("var x; begin if x = 0 then x := 1 end.").is_ok());
    }

    #[test]
    fn if_with_else_parses() {
        assert!(parse("var x; begin if x = 0 then x := 1 else x := 2 end.").is_ok());
    }

    #[test]
    fn nested_procedures_resolve_outer_variables() {
        let source = "var a; \
             procedure p; \
               begin a := 1 end; \
             begin call p end.";
        assert!(parse(source).is_ok());
    }
}
