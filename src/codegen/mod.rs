//! Generación de código para la máquina de acumulador.
//!
//! Las sentencias se traducen en orden de declaración, seguidas por la
//! expresión de resultado, un `STORE RES` y `HLT`. La sección de datos se
//! construye al final a partir de la tabla de símbolos, de forma que
//! incluye todo nombre que el código llegó a referenciar.

use std::{
    io::{self, Write},
    rc::Rc,
};

use tracing::debug;

use crate::{
    ir::{Assembly, Data, Instruction, FIXED_DATA, RES},
    parse::{Expr, Program, Statement},
    symbols::{Class, SymbolTable},
};

mod expr;

/// Traduce un programa a su listado ensamblador.
pub fn generate(program: &Program) -> Assembly {
    let mut generator = Generator::default();

    for statement in program.statements() {
        generator.assignment(statement);
    }

    generator.expr(program.result());

    let res = Rc::from(RES);
    emit!(generator, Store, res);
    generator.code.push(Instruction::halt());

    debug!(
        program = %program.name(),
        symbols = generator.symbols.len(),
        instructions = generator.code.len(),
        "code generation finished"
    );

    generator.finish()
}

/// Escribe la forma textual de un listado.
pub fn emit<W: Write>(assembly: &Assembly, output: &mut W) -> io::Result<()> {
    writeln!(output, ".DATA")?;
    for Data { name, value } in &assembly.data {
        match value {
            Some(value) => writeln!(output, "{} DB {}", name, value)?,
            None => writeln!(output, "{} DB ?", name)?,
        }
    }

    writeln!(output)?;
    writeln!(output, ".CODE")?;
    writeln!(output, ".ORG 0")?;

    for instruction in &assembly.code {
        writeln!(output, "{}", instruction)?;
    }

    Ok(())
}

#[derive(Default)]
struct Generator {
    symbols: SymbolTable,
    code: Vec<Instruction>,
}

impl Generator {
    fn push(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    fn assignment(&mut self, statement: &Statement) {
        let target = statement.target().as_ref();

        match statement.value() {
            // Un literal se pliega: el destino queda con valor conocido
            Expr::Number(value) => {
                let target = self.symbols.define(target, *value);
                let constant = self.symbols.constant(*value);

                emit!(self, Load, constant);
                emit!(self, Store, target);
            }

            value => {
                self.expr(value);
                let target = self.symbols.register(target);

                emit!(self, Store, target);
            }
        }
    }

    fn finish(self) -> Assembly {
        let fixed = FIXED_DATA.iter().map(|&(name, value)| Data {
            name: Rc::from(name),
            value,
        });

        let rest = self
            .symbols
            .iter()
            .filter(|symbol| !FIXED_DATA.iter().any(|(name, _)| **symbol.name() == **name))
            .map(|symbol| Data {
                name: Rc::clone(symbol.name()),
                value: match symbol.class() {
                    Class::Temporary => None,
                    Class::Constant | Class::Variable => symbol.value(),
                },
            });

        Assembly {
            data: fixed.chain(rest).collect(),
            code: self.code,
        }
    }
}
