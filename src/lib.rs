//! Cadena de herramientas para el lenguaje LPN.
//!
//! # Front end
//! Cada programa deriva de un único archivo de código fuente con la forma
//! `PROGRAMA nombre: INICIO ... RES = expr FIM`. El texto se somete primero
//! a análisis léxico en [`lex`], de lo cual se obtiene una secuencia de
//! tokens. La secuencia se dispone en un AST por medio de análisis
//! sintáctico en [`parse`].
//!
//! # Back end
//! El AST se traduce a un listado para una máquina hipotética de 8 bits con
//! un único acumulador, consultando y poblando la tabla de [`symbols`]. El
//! listado descrito en [`ir`] se escribe como texto por medio de
//! [`target::emit()`]. El ensamblado a imagen binaria es externo a este
//! crate.
//!
//! # Máquina virtual
//! De forma independiente, [`vm`] ejecuta una imagen binaria de memoria
//! para esa misma máquina y reporta su estado final.

#[macro_use]
mod macros;

pub mod error;
pub mod ir;
pub mod lex;
pub mod parse;
pub mod symbols;
pub mod vm;

mod codegen;

use error::Diagnostics;
use lex::Lexer;

/// Emisión de código.
///
/// Este módulo reexporta los ítems internos de generación de código
/// necesarios para traducir un AST a texto ensamblador.
pub mod target {
    pub use crate::codegen::{emit, generate};
}

/// Resultado de una compilación exitosa.
#[derive(Debug)]
pub struct Compilation {
    pub assembly: ir::Assembly,

    /// Errores recuperables; las sentencias afectadas fueron descartadas.
    pub diagnostics: Diagnostics,
}

/// Compila texto fuente a un listado ensamblador.
pub fn compile(source: &str) -> Result<Compilation, Diagnostics> {
    let tokens = Lexer::new(source).tokenize();
    let (program, diagnostics) = parse::parse(&tokens)?;
    let assembly = target::generate(&program);

    Ok(Compilation {
        assembly,
        diagnostics,
    })
}
