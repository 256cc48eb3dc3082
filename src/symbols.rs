//! Tabla de símbolos y constantes.
//!
//! Una única tabla ordenada agrupa tres clases de nombres: variables del
//! usuario, constantes sintetizadas (`CONST_<valor>`) y temporales
//! sintetizadas (`TEMP_<n>`). La tabla solo crece y conserva el orden de
//! primer registro, que es el mismo orden en que se emite la sección de
//! datos. Las búsquedas son lineales.

use std::rc::Rc;

use tracing::debug;

use crate::lex;

/// Prefijo de constantes sintetizadas.
pub const CONST_PREFIX: &str = "CONST_";

/// Prefijo de temporales sintetizadas.
pub const TEMP_PREFIX: &str = "TEMP_";

/// Una entrada de la tabla.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    name: Rc<str>,
    value: i32,
    defined: bool,
}

impl Symbol {
    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    /// Valor conocido en tiempo de compilación, si existe.
    pub fn value(&self) -> Option<i32> {
        if self.defined {
            Some(self.value)
        } else {
            None
        }
    }

    /// Clase del nombre, según su prefijo.
    pub fn class(&self) -> Class {
        Class::of(&self.name)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Class {
    Variable,
    Constant,
    Temporary,
}

impl Class {
    pub fn of(name: &str) -> Class {
        if name.starts_with(TEMP_PREFIX) {
            Class::Temporary
        } else if name.starts_with(CONST_PREFIX) {
            Class::Constant
        } else {
            Class::Variable
        }
    }
}

#[derive(Default, Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    next_temp: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un nombre sin valor si no existe todavía.
    pub fn register(&mut self, name: &str) -> Rc<str> {
        let name = lex::truncate(name);
        if let Some(symbol) = self.lookup(name) {
            return Rc::clone(&symbol.name);
        }

        let name: Rc<str> = Rc::from(name);
        self.symbols.push(Symbol {
            name: Rc::clone(&name),
            value: 0,
            defined: false,
        });

        name
    }

    /// Asocia un valor conocido a un nombre, registrándolo si hace falta.
    pub fn define(&mut self, name: &str, value: i32) -> Rc<str> {
        let name = self.register(name);
        if let Some(symbol) = self.symbols.iter_mut().find(|s| s.name == name) {
            symbol.value = value;
            symbol.defined = true;
        }

        name
    }

    /// Obtiene el nombre de la constante para `value`, creándola una sola vez.
    pub fn constant(&mut self, value: i32) -> Rc<str> {
        let name = format!("{}{}", CONST_PREFIX, value);
        match self.lookup(&name) {
            Some(symbol) => Rc::clone(&symbol.name),
            None => {
                debug!(value, "synthesizing constant");
                self.define(&name, value)
            }
        }
    }

    /// Crea una nueva temporal. Las temporales nunca se reutilizan.
    pub fn temporary(&mut self) -> Rc<str> {
        let name = format!("{}{}", TEMP_PREFIX, self.next_temp);
        self.next_temp += 1;

        self.register(&name)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| &*symbol.name == name)
    }

    /// Valor de un nombre definido en tiempo de compilación.
    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.lookup(name).and_then(Symbol::value)
    }

    /// Recorre las entradas en orden de primer registro.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(table: &SymbolTable) -> Vec<&str> {
        table.iter().map(|s| &**s.name()).collect()
    }

    #[test]
    fn preserves_first_registration_order() {
        let mut table = SymbolTable::new();
        table.register("B");
        table.constant(7);
        table.register("A");
        table.register("B");
        table.define("A", 3);

        assert_eq!(names(&table), ["B", "CONST_7", "A"]);
        assert_eq!(table.value_of("A"), Some(3));
        assert_eq!(table.value_of("B"), None);
    }

    #[test]
    fn constants_are_deduplicated() {
        let mut table = SymbolTable::new();
        let first = table.constant(4);
        let second = table.constant(4);

        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(table.value_of("CONST_4"), Some(4));
    }

    #[test]
    fn temporaries_are_never_reused() {
        let mut table = SymbolTable::new();
        let names: Vec<_> = (0..3).map(|_| table.temporary()).collect();

        assert_eq!(names.iter().map(|n| &**n).collect::<Vec<_>>(), ["TEMP_0", "TEMP_1", "TEMP_2"]);
        assert!(table.iter().all(|s| s.class() == Class::Temporary && s.value().is_none()));
    }

    #[test]
    fn classifies_by_prefix() {
        assert_eq!(Class::of("CONST_-1"), Class::Constant);
        assert_eq!(Class::of("TEMP_9"), Class::Temporary);
        assert_eq!(Class::of("CONSTANT"), Class::Variable);
    }

    #[test]
    fn names_are_truncated_before_lookup() {
        let mut table = SymbolTable::new();
        let long = "v".repeat(80);
        table.define(&long, 1);

        assert_eq!(table.len(), 1);
        assert_eq!(table.value_of(&long[..lex::NAME_MAX]), Some(1));
        assert_eq!(table.register(&long).len(), lex::NAME_MAX);
    }
}
