//! Reporte de errores al usuario.
//!
//! Los errores de este lenguaje no llevan ubicación. Un [`Diagnostics`]
//! acumula errores en el orden en que se encontraron y, si alguno fue
//! fatal, cierra el reporte con un resumen.

use std::{
    error::Error,
    fmt::{self, Display},
};

pub struct Diagnostics {
    kind: &'static str,
    errors: Vec<Box<dyn 'static + Error>>,
    failed: bool,
}

impl Diagnostics {
    pub fn kind(self, kind: &'static str) -> Self {
        Diagnostics { kind, ..self }
    }

    /// Registra un error del cual se logró recuperar.
    pub fn push<E: 'static + Error>(&mut self, error: E) {
        self.errors.push(Box::new(error));
    }

    /// Registra un error fatal.
    pub fn fail<E: 'static + Error>(&mut self, error: E) {
        self.push(error);
        self.failed = true;
    }

    /// Indica si alguno de los errores fue fatal.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Obtiene el último error registrado si es de tipo `E`.
    pub fn last<E: 'static + Error>(&self) -> Option<&E> {
        self.errors.last().and_then(|error| error.downcast_ref())
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            kind: "error",
            errors: Default::default(),
            failed: false,
        }
    }
}

impl<E: 'static + Error> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        let mut diagnostics = Diagnostics::default();
        diagnostics.fail(error);

        diagnostics
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_list()
            .entries(self.errors.iter().map(|error| error.to_string()))
            .finish()
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics {
            kind,
            errors,
            failed,
        } = self;

        for error in errors {
            writeln!(fmt, "{}: {}", kind, error)?;
        }

        if *failed {
            let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
            writeln!(
                fmt,
                "Build failed with {} {}",
                errors.len(),
                error_or_errors
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParserError;

    #[test]
    fn renders_errors_in_order_with_summary() {
        let mut diagnostics = Diagnostics::default().kind("Syntax error");
        diagnostics.push(ParserError::ExpectedId);
        diagnostics.fail(ParserError::ExpectedFim);

        assert_eq!(
            diagnostics.to_string(),
            "Syntax error: Expected identifier\n\
             Syntax error: Expected FIM\n\
             Build failed with 2 errors\n"
        );
    }

    #[test]
    fn recovered_errors_have_no_summary() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.push(ParserError::ExpectedAssign);

        assert!(!diagnostics.failed());
        assert_eq!(diagnostics.to_string(), "error: Expected '='\n");
    }
}
