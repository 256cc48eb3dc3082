//! Listado ensamblador de la máquina de acumulador.
//!
//! La generación de código no escribe texto directamente, sino que
//! produce un [`Assembly`]: la sección de datos ya ordenada y la
//! secuencia de instrucciones. La forma textual se obtiene con
//! [`crate::target::emit()`].

use std::{
    fmt::{self, Display},
    rc::Rc,
};

/// Nombre de la celda que recibe el resultado del programa.
pub const RES: &str = "RES";

/// Constante cero de máquina, siempre declarada.
pub const ZERO: &str = "CONST_0";

/// Constantes de máquina que siempre encabezan la sección de datos.
pub const FIXED_DATA: [(&str, Option<i32>); 5] = [
    ("ONE", Some(1)),
    (ZERO, Some(0)),
    ("CONST_1", Some(1)),
    ("NEG_1", Some(255)),
    (RES, None),
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Assembly {
    pub data: Vec<Data>,
    pub code: Vec<Instruction>,
}

/// Declaración `NAME DB value` o `NAME DB ?`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Data {
    pub name: Rc<str>,
    pub value: Option<i32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mnemonic {
    Load,
    Store,
    Add,
    Sub,
    Halt,
}

impl Display for Mnemonic {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match self {
            Mnemonic::Load => "LOAD",
            Mnemonic::Store => "STORE",
            Mnemonic::Add => "ADD",
            Mnemonic::Sub => "SUB",
            Mnemonic::Halt => "HLT",
        };

        fmt.write_str(mnemonic)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub operand: Option<Rc<str>>,
}

impl Instruction {
    pub fn new(mnemonic: Mnemonic, operand: Rc<str>) -> Self {
        Instruction {
            mnemonic,
            operand: Some(operand),
        }
    }

    pub fn halt() -> Self {
        Instruction {
            mnemonic: Mnemonic::Halt,
            operand: None,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Some(operand) => write!(fmt, "{} {}", self.mnemonic, operand),
            None => write!(fmt, "{}", self.mnemonic),
        }
    }
}
