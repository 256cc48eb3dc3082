//! Selección de instrucciones para expresiones.
//!
//! Toda expresión deja su valor en el acumulador. Para `+` y `-` la forma
//! de los operandos decide la secuencia:
//!
//! | Izquierdo | Derecho  | Secuencia                                         |
//! |-----------|----------|---------------------------------------------------|
//! | literal   | literal  | constante plegada, `LOAD`                         |
//! | cualquiera| directo  | izquierdo al acumulador, `ADD`/`SUB` derecho      |
//! | cualquiera| anidado  | `+`: una temporal; `-`: una temporal por operando |
//!
//! Un operando directo es un literal o una variable. La multiplicación se
//! desenrolla en tiempo de compilación y regenera el operando izquierdo
//! completo en cada iteración.

use std::rc::Rc;

use tracing::debug;

use super::Generator;
use crate::{
    ir::{Instruction, Mnemonic, ZERO},
    parse::{BinOp, Expr},
};

impl Generator {
    pub(super) fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(value) => {
                let constant = self.symbols.constant(*value);
                emit!(self, Load, constant);
            }

            Expr::Variable(id) => {
                let name = self.symbols.register(id.as_ref());
                emit!(self, Load, name);
            }

            Expr::Binary(left, BinOp::Mul, right) => self.multiply(left, right),
            Expr::Binary(left, op, right) => self.additive(*op, left, right),
        }
    }

    fn additive(&mut self, op: BinOp, left: &Expr, right: &Expr) {
        let mnemonic = match op {
            BinOp::Sub => Mnemonic::Sub,
            _ => Mnemonic::Add,
        };

        match (left, right) {
            (Expr::Number(a), Expr::Number(b)) => {
                let value = match op {
                    BinOp::Sub => a.wrapping_sub(*b),
                    _ => a.wrapping_add(*b),
                };

                let folded = self.symbols.constant(value);
                emit!(self, Load, folded);
            }

            (_, Expr::Number(value)) => {
                self.expr(left);
                let constant = self.symbols.constant(*value);
                self.push(Instruction::new(mnemonic, constant));
            }

            (_, Expr::Variable(id)) => {
                self.expr(left);
                let name = self.symbols.register(id.as_ref());
                self.push(Instruction::new(mnemonic, name));
            }

            (_, Expr::Binary(..)) => match op {
                BinOp::Sub => self.spill_difference(left, right),
                _ => self.spill_sum(left, right),
            },
        }
    }

    /// `left + right` con `right` anidado.
    fn spill_sum(&mut self, left: &Expr, right: &Expr) {
        self.expr(left);
        let temp = self.symbols.temporary();
        emit!(self, Store, Rc::clone(&temp));

        self.expr(right);
        emit!(self, Add, temp);
    }

    /// `left - right` con `right` anidado. Ambos operandos pasan por memoria.
    fn spill_difference(&mut self, left: &Expr, right: &Expr) {
        self.expr(left);
        let left_temp = self.symbols.temporary();
        emit!(self, Store, Rc::clone(&left_temp));

        self.expr(right);
        let right_temp = self.symbols.temporary();
        emit!(self, Store, Rc::clone(&right_temp));

        emit!(self, Load, left_temp);
        emit!(self, Sub, right_temp);
    }

    fn multiply(&mut self, left: &Expr, right: &Expr) {
        let product = self.symbols.temporary();
        emit!(self, Load, Rc::from(ZERO));
        emit!(self, Store, Rc::clone(&product));

        // Solo un multiplicador conocido en tiempo de compilación produce código
        let times = match right {
            Expr::Number(value) => Some(*value),
            Expr::Variable(id) => self.symbols.value_of(id.as_ref()),
            Expr::Binary(..) => None,
        };

        let times = times.filter(|&times| times >= 0).unwrap_or(0);
        debug!(times, product = %product, "unrolling multiplication");

        for _ in 0..times {
            self.expr(left);
            emit!(self, Add, Rc::clone(&product));
            emit!(self, Store, Rc::clone(&product));
        }

        emit!(self, Load, product);
    }
}
