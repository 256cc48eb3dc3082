//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone el texto fuente en
//! unidades léxicas denominadas tokens. Los espacios en blanco y los saltos
//! de línea se descartan durante esta operación. No se rastrean ubicaciones:
//! los diagnósticos de fases posteriores son genéricos.
//!
//! # Contenido de un token
//! Operadores, puntuación y palabras clave se identifican por el hecho de lo
//! que son y no incluyen lexemas. Los identificadores sí incluyen su lexema
//! original, truncado a [`NAME_MAX`] caracteres. Las constantes literales se
//! resuelven a sus valores en vez de preservar sus lexemas.
//!
//! # Reglas importantes del lenguaje
//! - Las palabras clave distinguen mayúsculas y minúsculas.
//! - Una palabra clave solo se reconoce si no le sigue inmediatamente una
//!   letra, por lo cual `INICIOX` es un identificador pero `RES1` es la
//!   palabra clave `RES` seguida del literal `1`.
//! - Un tramo entre comillas dobles es un identificador literal. Una comilla
//!   sin cerrar consume hasta el final de la entrada.
//!
//! # Errores
//! El lexer nunca falla. Los caracteres desconocidos se descartan en silencio
//! y los tokens que exceden [`MAX_TOKENS`] se pierden, incluyendo el fin de
//! entrada.

use std::{
    fmt::{self, Display},
    rc::Rc,
};

use tracing::debug;

/// Longitud máxima de un nombre, en caracteres.
pub const NAME_MAX: usize = 63;

/// Capacidad del búfer de tokens.
pub const MAX_TOKENS: usize = 1024;

/// Un identificador.
///
/// Los identificadores se truncan a [`NAME_MAX`] caracteres al construirse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(Rc<str>);

impl Identifier {
    pub fn new(name: &str) -> Self {
        Identifier(Rc::from(truncate(name)))
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

/// Recorta un nombre a lo sumo a [`NAME_MAX`] caracteres.
pub fn truncate(name: &str) -> &str {
    match name.char_indices().nth(NAME_MAX) {
        Some((end, _)) => {
            debug!(name, "name truncated to {} characters", NAME_MAX);
            &name[..end]
        }

        None => name,
    }
}

/// Objeto resultante del análisis léxico.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identificador.
    Id(Identifier),

    /// Palabra clave.
    Keyword(Keyword),

    /// Literal de entero.
    IntLiteral(i32),

    /// `=`
    Assign,

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `*`
    Times,

    /// `(`
    OpenParen,

    /// `)`
    CloseParen,

    /// `:`
    Colon,

    /// Fin de la entrada.
    Eof,

    /// Carácter no reconocido.
    ///
    /// [`Lexer::tokenize()`] nunca emite este token; solo lo observa
    /// quien itera directamente sobre el [`Lexer`].
    Unknown(char),
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Id(id) => write!(fmt, "identifier `{}`", id),
            Keyword(keyword) => write!(fmt, "keyword `{}`", keyword),
            IntLiteral(integer) => write!(fmt, "literal `{}`", integer),
            Assign => fmt.write_str("`=`"),
            Plus => fmt.write_str("`+`"),
            Minus => fmt.write_str("`-`"),
            Times => fmt.write_str("`*`"),
            OpenParen => fmt.write_str("`(`"),
            CloseParen => fmt.write_str("`)`"),
            Colon => fmt.write_str("`:`"),
            Eof => fmt.write_str("end of input"),
            Unknown(c) => write!(fmt, "character {:?}", c),
        }
    }
}

/// Una palabra clave.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Programa,
    Inicio,
    Fim,
    Res,
}

impl Keyword {
    /// Palabras clave en orden de prioridad de reconocimiento.
    const ALL: [Keyword; 4] = [
        Keyword::Programa,
        Keyword::Inicio,
        Keyword::Fim,
        Keyword::Res,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Programa => "PROGRAMA",
            Keyword::Inicio   => "INICIO",
            Keyword::Fim      => "FIM",
            Keyword::Res      => "RES",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Escáner sobre el texto fuente completo.
///
/// Como iterador, el lexer emite todo token encontrado incluyendo
/// [`Token::Unknown`], pero nunca [`Token::Eof`]. La secuencia que
/// consume el parser se obtiene con [`Lexer::tokenize()`].
pub struct Lexer<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Crea un lexer en estado inicial a partir del texto fuente.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            position: 0,
        }
    }

    /// Reduce la entrada a la secuencia de tokens que consume el parser.
    ///
    /// Los caracteres desconocidos se descartan y la secuencia termina con
    /// un único [`Token::Eof`]. A lo sumo se conservan [`MAX_TOKENS`] tokens;
    /// los excedentes, incluso el de fin de entrada, se pierden.
    pub fn tokenize(self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut dropped = 0;

        for token in self.chain(std::iter::once(Token::Eof)) {
            match token {
                Token::Unknown(c) => debug!("discarding unrecognized character {:?}", c),
                _ if tokens.len() >= MAX_TOKENS => dropped += 1,
                token => tokens.push(token),
            }
        }

        if dropped > 0 {
            debug!(dropped, "token buffer full at {} tokens", MAX_TOKENS);
        }

        tokens
    }

    fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    fn bump(&mut self, c: char) {
        self.position += c.len_utf8();
    }

    /// Reconoce una palabra clave si no le sigue una letra.
    fn keyword(&self) -> Option<Keyword> {
        let rest = self.rest();
        Keyword::ALL.iter().copied().find(|keyword| {
            let text = keyword.as_str();
            rest.starts_with(text)
                && !rest[text.len()..]
                    .chars()
                    .next()
                    .map_or(false, |c| c.is_ascii_alphabetic())
        })
    }

    /// Consume un tramo entre comillas. La comilla de apertura ya se consumió.
    fn quoted(&mut self) -> Token {
        let rest = self.rest();
        let (inner, consumed) = match rest.find('"') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };

        self.position += consumed;
        Token::Id(Identifier::new(inner))
    }

    fn word(&mut self) -> Token {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !is_word_char(c))
            .unwrap_or_else(|| rest.len());

        self.position += end;
        Token::Id(Identifier::new(&rest[..end]))
    }

    fn integer(&mut self) -> Token {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or_else(|| rest.len());

        self.position += end;

        // Se acumula con aritmética modular, un literal enorme no es un error
        let value = truncate(&rest[..end]).bytes().fold(0i32, |value, digit| {
            value.wrapping_mul(10).wrapping_add((digit - b'0') as i32)
        });

        Token::IntLiteral(value)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        use Token::*;

        loop {
            let c = self.rest().chars().next()?;

            // Espacios en blanco y fines de línea
            if matches!(c, ' ' | '\t' | '\n' | '\r') {
                self.bump(c);
                continue;
            }

            if let Some(keyword) = self.keyword() {
                self.position += keyword.as_str().len();
                break Some(Keyword(keyword));
            }

            let token = match c {
                '=' | '+' | '-' | '*' | '(' | ')' | ':' | '"' => {
                    self.bump(c);

                    match c {
                        '=' => Assign,
                        '+' => Plus,
                        '-' => Minus,
                        '*' => Times,
                        '(' => OpenParen,
                        ')' => CloseParen,
                        ':' => Colon,
                        _ => self.quoted(),
                    }
                }

                c if c.is_ascii_alphabetic() => self.word(),
                c if c.is_ascii_digit() => self.integer(),

                c => {
                    self.bump(c);
                    Unknown(c)
                }
            };

            break Some(token);
        }
    }
}

/// Determina si un carácter puede pertenecer a un identificador.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c.is_ascii_digit() || c == '_'
}
