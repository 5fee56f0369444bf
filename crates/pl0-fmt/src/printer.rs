//! Indentation-aware recursive AST printer, for the `--show-ast` flag.

use std::fmt::Write as _;

use pl0_syntax::ast::{Block, Expression, Program, Statement};

pub fn print_program(program: &Program) -> String {
    let mut printer = Printer { out: String::new(), depth: 0 };
    printer.block(&program.block);
    printer.out
}

struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        writeln!(&mut self.out, "{text}").unwrap();
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn block(&mut self, block: &Block) {
        self.line(&format!("Block (level {})", block.scope.level()));
        self.indented(|p| {
            for constant in &block.constants {
                p.line(&format!("const {}", constant.name()));
            }
            for variable in &block.variables {
                p.line(&format!("var {}", variable.name()));
            }
            for procedure in &block.procedures {
                p.line(&format!("procedure {}", procedure.symbol.name()));
                p.indented(|p| p.block(&procedure.block));
            }
            p.statement(&block.body);
        });
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::StatementList(statements) => {
                self.line("begin");
                self.indented(|p| {
                    for stmt in statements {
                        p.statement(stmt);
                    }
                });
                self.line("end");
            }
            Statement::If { condition, then_branch, else_branch } => {
                self.line("if");
                self.indented(|p| p.expression(condition));
                self.line("then");
                self.indented(|p| p.statement(then_branch));
                if let Some(else_branch) = else_branch {
                    self.line("else");
                    self.indented(|p| p.statement(else_branch));
                }
            }
            Statement::While { condition, body } => {
                self.line("while");
                self.indented(|p| p.expression(condition));
                self.line("do");
                self.indented(|p| p.statement(body));
            }
            Statement::Call { name, .. } => self.line(&format!("call {name}")),
            Statement::Read { targets } => {
                let names: Vec<_> = targets.iter().map(|t| t.symbol.name()).collect();
                self.line(&format!("read {}", names.join(", ")));
            }
            Statement::Write { expressions } => {
                self.line("write");
                self.indented(|p| {
                    for expr in expressions {
                        p.expression(expr);
                    }
                });
            }
            Statement::Assign { target, value } => {
                self.line(&format!("{} :=", target.symbol.name()));
                self.indented(|p| p.expression(value));
            }
            Statement::Return { .. } => self.line("return"),
            Statement::Empty => self.line("<empty>"),
        }
    }

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal { value, .. } => self.line(&value.to_string()),
            Expression::Variable(proxy) => self.line(proxy.symbol.name()),
            Expression::Unary { op, expr, .. } => {
                self.line(&format!("{op}"));
                self.indented(|p| p.expression(expr));
            }
            Expression::Binary { op, left, right, .. } => {
                self.line(&format!("{op}"));
                self.indented(|p| {
                    p.expression(left);
                    p.expression(right);
                });
            }
        }
    }
}
