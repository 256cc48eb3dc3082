//! Análisis sintáctico.
//!
//! Parser descendente recursivo LL(1) sobre la gramática:
//!
//! ```text
//! Program     := 'PROGRAMA' IDENT ':' 'INICIO' {Assignment} 'RES' '=' Expression 'FIM'
//! Assignment  := IDENT '=' Expression
//! Expression  := Term { ('+' | '-') Term }
//! Term        := Factor { '*' Factor }
//! Factor      := '(' Expression ')' | NUMBER | IDENT
//! ```
//!
//! Hay dos severidades de error. Un fallo en la estructura del programa
//! es fatal y detiene el análisis. Un fallo dentro de una asignación
//! descarta únicamente esa sentencia y el análisis continúa con el
//! siguiente token.

use thiserror::Error;

use crate::{
    error::Diagnostics,
    lex::{Identifier, Keyword, Token},
};

/// Un programa completo.
#[derive(Debug)]
pub struct Program {
    name: Identifier,
    statements: Vec<Statement>,
    result: Expr,
}

impl Program {
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// Sentencias en orden de declaración.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Expresión asignada a `RES`.
    pub fn result(&self) -> &Expr {
        &self.result
    }
}

/// Asignación `target = value`.
#[derive(Debug)]
pub struct Statement {
    target: Identifier,
    value: Expr,
}

impl Statement {
    pub fn target(&self) -> &Identifier {
        &self.target
    }

    pub fn value(&self) -> &Expr {
        &self.value
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Expr {
    Number(i32),
    Variable(Identifier),
    Binary(Box<Expr>, BinOp, Box<Expr>),
}

impl Expr {
    /// Determina si el operando puede direccionarse sin cálculo previo.
    pub fn is_direct(&self) -> bool {
        matches!(self, Expr::Number(_) | Expr::Variable(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
}

#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParserError {
    #[error("Expected PROGRAMA")]
    ExpectedPrograma,

    #[error("Expected program name")]
    ExpectedProgramName,

    #[error("Expected ':' after program name")]
    ExpectedColon,

    #[error("Expected INICIO")]
    ExpectedInicio,

    #[error("Expected RES")]
    ExpectedRes,

    #[error("Expected '=' after RES")]
    ExpectedResAssign,

    #[error("Expected FIM")]
    ExpectedFim,

    #[error("Expected identifier")]
    ExpectedId,

    #[error("Expected '='")]
    ExpectedAssign,

    #[error("Expected an expression")]
    ExpectedExpr,

    #[error("Expected ')'")]
    ExpectedCloseParen,
}

/// Resultado exitoso del análisis: el programa y las sentencias descartadas.
pub type Parsed = (Program, Diagnostics);

/// Construye el AST a partir de una secuencia de tokens.
///
/// Los errores recuperables se acumulan en los [`Diagnostics`] que acompañan
/// al programa. Si ocurre un error fatal, el resultado es `Err` y contiene
/// los errores recuperables previos seguidos del fatal.
pub fn parse(tokens: &[Token]) -> Result<Parsed, Diagnostics> {
    let mut parser = Parser {
        tokens,
        position: 0,
        recovered: Diagnostics::default().kind("Syntax error"),
    };

    match parser.program() {
        Ok(program) => Ok((program, parser.recovered)),
        Err(failure) => {
            let mut diagnostics = parser.recovered;
            diagnostics.fail(failure.coerce());

            Err(diagnostics)
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    recovered: Diagnostics,
}

enum Failure {
    Weak(ParserError),
    Strict(ParserError),
}

impl Failure {
    fn strict(self) -> Self {
        Failure::Strict(self.coerce())
    }

    fn coerce(self) -> ParserError {
        match self {
            Failure::Weak(error) => error,
            Failure::Strict(error) => error,
        }
    }
}

type Parse<T> = Result<T, Failure>;

impl<'a> Parser<'a> {
    fn program(&mut self) -> Parse<Program> {
        self.keyword(Keyword::Programa, ParserError::ExpectedPrograma)?;

        let name = match self.next() {
            Some(Token::Id(id)) => id.clone(),
            _ => return Err(Failure::Strict(ParserError::ExpectedProgramName)),
        };

        self.expect(Token::Colon, ParserError::ExpectedColon)?;
        self.keyword(Keyword::Inicio, ParserError::ExpectedInicio)?;

        let mut statements = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::Keyword(Keyword::Res)) => break,
                Some(_) => match self.assignment() {
                    Ok(statement) => statements.push(statement),
                    Err(Failure::Weak(error)) => self.recovered.push(error),
                    Err(error) => return Err(error),
                },
            }
        }

        self.keyword(Keyword::Res, ParserError::ExpectedRes)?;
        self.expect(Token::Assign, ParserError::ExpectedResAssign)?;
        let result = self.expr().map_err(Failure::strict)?;
        self.keyword(Keyword::Fim, ParserError::ExpectedFim)?;

        Ok(Program {
            name,
            statements,
            result,
        })
    }

    fn assignment(&mut self) -> Parse<Statement> {
        let target = match self.next() {
            Some(Token::Id(id)) => id.clone(),
            _ => return Err(Failure::Weak(ParserError::ExpectedId)),
        };

        match self.next() {
            Some(Token::Assign) => (),
            _ => return Err(Failure::Weak(ParserError::ExpectedAssign)),
        }

        let value = self.expr()?;
        Ok(Statement { target, value })
    }

    fn expr(&mut self) -> Parse<Expr> {
        let mut expr = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break Ok(expr),
            };

            self.next();
            let right = self.term()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(right));
        }
    }

    fn term(&mut self) -> Parse<Expr> {
        let mut expr = self.factor()?;
        while let Some(Token::Times) = self.peek() {
            self.next();
            let right = self.factor()?;
            expr = Expr::Binary(Box::new(expr), BinOp::Mul, Box::new(right));
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Parse<Expr> {
        // El token ofensor no se consume, así la recuperación puede verlo
        let expr = match self.peek() {
            Some(Token::IntLiteral(value)) => Expr::Number(*value),
            Some(Token::Id(id)) => Expr::Variable(id.clone()),

            Some(Token::OpenParen) => {
                self.next();
                let inner = self.expr()?;

                return match self.peek() {
                    Some(Token::CloseParen) => {
                        self.next();
                        Ok(inner)
                    }

                    _ => Err(Failure::Weak(ParserError::ExpectedCloseParen)),
                };
            }

            _ => return Err(Failure::Weak(ParserError::ExpectedExpr)),
        };

        self.next();
        Ok(expr)
    }

    fn keyword(&mut self, keyword: Keyword, error: ParserError) -> Parse<()> {
        self.expect(Token::Keyword(keyword), error)
    }

    fn expect(&mut self, token: Token, error: ParserError) -> Parse<()> {
        match self.next() {
            Some(found) if *found == token => Ok(()),
            _ => Err(Failure::Strict(error)),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.peek()?;
        self.position += 1;

        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::Lexer;

    fn parse_source(source: &str) -> Result<Parsed, Diagnostics> {
        parse(&Lexer::new(source).tokenize())
    }

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Variable(Identifier::new(name)))
    }

    fn num(value: i32) -> Box<Expr> {
        Box::new(Expr::Number(value))
    }

    #[test]
    fn parses_statements_in_order() {
        let (program, recovered) =
            parse_source("PROGRAMA T: INICIO A=2 B=3 RES=A+B FIM").unwrap();

        assert!(recovered.is_empty());
        assert_eq!(program.name().as_ref(), "T");

        let targets: Vec<_> = program
            .statements()
            .iter()
            .map(|s| s.target().as_ref())
            .collect();

        assert_eq!(targets, ["A", "B"]);
        assert_eq!(program.statements()[0].value(), &Expr::Number(2));
        assert_eq!(
            program.result(),
            &Expr::Binary(var("A"), BinOp::Add, var("B"))
        );
    }

    #[test]
    fn additive_is_left_associative() {
        let (program, _) = parse_source("PROGRAMA T: INICIO RES=A-B+C FIM").unwrap();

        let inner = Box::new(Expr::Binary(var("A"), BinOp::Sub, var("B")));
        assert_eq!(program.result(), &Expr::Binary(inner, BinOp::Add, var("C")));
    }

    #[test]
    fn multiplication_binds_tighter() {
        let (program, _) = parse_source("PROGRAMA T: INICIO RES=A+B*2 FIM").unwrap();

        let product = Box::new(Expr::Binary(var("B"), BinOp::Mul, num(2)));
        assert_eq!(program.result(), &Expr::Binary(var("A"), BinOp::Add, product));
    }

    #[test]
    fn parentheses_override_precedence() {
        let (program, _) = parse_source("PROGRAMA T: INICIO RES=(A+B)*2 FIM").unwrap();

        let sum = Box::new(Expr::Binary(var("A"), BinOp::Add, var("B")));
        assert_eq!(program.result(), &Expr::Binary(sum, BinOp::Mul, num(2)));
    }

    #[test]
    fn malformed_assignment_is_dropped() {
        let (program, recovered) =
            parse_source("PROGRAMA T: INICIO 5 A 7 B=1 RES=B FIM").unwrap();

        // `5` no es identificador; `A 7` carece de `=` y consume ambos tokens
        assert_eq!(recovered.len(), 2);
        assert_eq!(program.statements().len(), 1);
        assert_eq!(program.statements()[0].target().as_ref(), "B");
    }

    #[test]
    fn missing_operand_drops_only_the_statement() {
        let (program, recovered) = parse_source("PROGRAMA T: INICIO A= RES=1 FIM").unwrap();

        assert_eq!(recovered.len(), 1);
        assert!(program.statements().is_empty());
        assert_eq!(program.result(), &Expr::Number(1));
    }

    #[test]
    fn structural_errors_are_fatal() {
        let cases = [
            ("T: INICIO RES=1 FIM", ParserError::ExpectedPrograma),
            ("PROGRAMA : INICIO RES=1 FIM", ParserError::ExpectedProgramName),
            ("PROGRAMA T INICIO RES=1 FIM", ParserError::ExpectedColon),
            ("PROGRAMA T: RES=1 FIM", ParserError::ExpectedInicio),
            ("PROGRAMA T: INICIO A=1", ParserError::ExpectedRes),
            ("PROGRAMA T: INICIO RES 1 FIM", ParserError::ExpectedResAssign),
            ("PROGRAMA T: INICIO RES=1", ParserError::ExpectedFim),
            ("PROGRAMA T: INICIO RES=(1 FIM", ParserError::ExpectedCloseParen),
        ];

        for (source, expected) in cases.iter() {
            let diagnostics = parse_source(source).unwrap_err();
            assert!(diagnostics.failed());
            assert_eq!(diagnostics.last::<ParserError>(), Some(expected), "{}", source);
        }
    }

    #[test]
    fn fatal_error_keeps_prior_recoveries() {
        let diagnostics = parse_source("PROGRAMA T: INICIO = RES=1").unwrap_err();
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn trailing_tokens_after_fim_are_ignored() {
        assert!(parse_source("PROGRAMA T: INICIO RES=1 FIM garbage = (").is_ok());
    }
}
