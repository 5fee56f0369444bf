//! Renders a parsed program as a GraphViz DOT graph, in the same
//! record-node, top-to-bottom style the bytecode analyzer uses for control
//! flow graphs.

use std::fmt::Write as _;

use pl0_syntax::ast::{Block, Expression, Program, Statement};

pub fn program_to_dot(program: &Program) -> String {
    let mut dot = String::new();
    writeln!(&mut dot, "digraph AST {{").unwrap();
    writeln!(&mut dot, "    rankdir=TB;").unwrap();
    writeln!(&mut dot, "    node [shape=record, fontname=\"Courier\"];").unwrap();

    let mut writer = DotWriter { dot, next_id: 0 };
    writer.block(&program.block);

    writeln!(&mut writer.dot, "}}").unwrap();
    writer.dot
}

struct DotWriter {
    dot: String,
    next_id: usize,
}

impl DotWriter {
    fn node(&mut self, label: &str) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        let escaped = escape(label);
        writeln!(&mut self.dot, "    N{id} [label=\"{escaped}\"];").unwrap();
        id
    }

    fn edge(&mut self, from: usize, to: usize) {
        writeln!(&mut self.dot, "    N{from} -> N{to};").unwrap();
    }

    fn block(&mut self, block: &Block) -> usize {
        let label = format!(
            "{{ Block level {} | {} const, {} var, {} procedure }}",
            block.scope.level(),
            block.constants.len(),
            block.variables.len(),
            block.procedures.len(),
        );
        let id = self.node(&label);

        for procedure in &block.procedures {
            let proc_id = self.node(&format!("Procedure {}", procedure.symbol.name()));
            self.edge(id, proc_id);
            let body_id = self.block(&procedure.block);
            self.edge(proc_id, body_id);
        }

        let body_id = self.statement(&block.body);
        self.edge(id, body_id);
        id
    }

    fn statement(&mut self, statement: &Statement) -> usize {
        match statement {
            Statement::StatementList(statements) => {
                let id = self.node("StatementList");
                for stmt in statements {
                    let child = self.statement(stmt);
                    self.edge(id, child);
                }
                id
            }
            Statement::If { condition, then_branch, else_branch } => {
                let id = self.node("If");
                let cond_id = self.expression(condition);
                self.edge(id, cond_id);
                let then_id = self.statement(then_branch);
                self.edge(id, then_id);
                if let Some(else_branch) = else_branch {
                    let else_id = self.statement(else_branch);
                    self.edge(id, else_id);
                }
                id
            }
            Statement::While { condition, body } => {
                let id = self.node("While");
                let cond_id = self.expression(condition);
                self.edge(id, cond_id);
                let body_id = self.statement(body);
                self.edge(id, body_id);
                id
            }
            Statement::Call { name, .. } => self.node(&format!("Call {name}")),
            Statement::Read { targets } => {
                let id = self.node("Read");
                for target in targets {
                    let child = self.node(&format!("Variable {}", target.symbol.name()));
                    self.edge(id, child);
                }
                id
            }
            Statement::Write { expressions } => {
                let id = self.node("Write");
                for expr in expressions {
                    let child = self.expression(expr);
                    self.edge(id, child);
                }
                id
            }
            Statement::Assign { target, value } => {
                let id = self.node(&format!("Assign {}", target.symbol.name()));
                let value_id = self.expression(value);
                self.edge(id, value_id);
                id
            }
            Statement::Return { .. } => self.node("Return"),
            Statement::Empty => self.node("Empty"),
        }
    }

    fn expression(&mut self, expr: &Expression) -> usize {
        match expr {
            Expression::Literal { value, .. } => self.node(&format!("Literal {value}")),
            Expression::Variable(proxy) => self.node(&format!("Variable {}", proxy.symbol.name())),
            Expression::Unary { op, expr, .. } => {
                let id = self.node(&format!("Unary {op}"));
                let child = self.expression(expr);
                self.edge(id, child);
                id
            }
            Expression::Binary { op, left, right, .. } => {
                let id = self.node(&format!("Binary {op}"));
                let left_id = self.expression(left);
                self.edge(id, left_id);
                let right_id = self.expression(right);
                self.edge(id, right_id);
                id
            }
        }
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
