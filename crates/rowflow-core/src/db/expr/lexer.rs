use crate::db::expr::ExprError;

///
/// TokenKind
///

#[derive(Clone, Debug, PartialEq)]
pub(super) enum TokenKind {
    Column(usize),
    Int(i64),
    Float(f64),
    Str(String),
    And,
    Or,
    Not,
    Is,
    Null,
    True,
    False,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LeftParen,
    RightParen,
}

///
/// Token
///

#[derive(Clone, Debug, PartialEq)]
pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) position: usize,
}

pub(super) fn tokenize(text: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(position, ch)) = chars.peek() {
        let kind = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' | ')' | '+' | '-' | '*' | '/' | '%' | '=' => {
                chars.next();
                match ch {
                    '(' => TokenKind::LeftParen,
                    ')' => TokenKind::RightParen,
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Star,
                    '/' => TokenKind::Slash,
                    '%' => TokenKind::Percent,
                    _ => TokenKind::Eq,
                }
            }
            '<' => {
                chars.next();
                match chars.peek().map(|&(_, c)| c) {
                    Some('=') => {
                        chars.next();
                        TokenKind::Lte
                    }
                    Some('>') => {
                        chars.next();
                        TokenKind::Ne
                    }
                    _ => TokenKind::Lt,
                }
            }
            '>' => {
                chars.next();
                if chars.peek().map(|&(_, c)| c) == Some('=') {
                    chars.next();
                    TokenKind::Gte
                } else {
                    TokenKind::Gt
                }
            }
            '!' => {
                chars.next();
                if chars.peek().map(|&(_, c)| c) == Some('=') {
                    chars.next();
                    TokenKind::Ne
                } else {
                    return Err(ExprError::UnexpectedChar { ch, position });
                }
            }
            '@' => {
                chars.next();
                let digits = take_while(&mut chars, |c| c.is_ascii_digit());
                match digits.parse::<usize>() {
                    Ok(ordinal) if ordinal > 0 => TokenKind::Column(ordinal - 1),
                    _ => return Err(ExprError::InvalidColumn { position }),
                }
            }
            '\'' => {
                chars.next();
                TokenKind::Str(read_string(&mut chars, position)?)
            }
            c if c.is_ascii_digit() => {
                let text = take_while(&mut chars, |c| c.is_ascii_digit() || c == '.');
                if text.contains('.') {
                    TokenKind::Float(
                        text.parse()
                            .map_err(|_| ExprError::InvalidNumber { text: text.clone() })?,
                    )
                } else {
                    TokenKind::Int(
                        text.parse()
                            .map_err(|_| ExprError::InvalidNumber { text: text.clone() })?,
                    )
                }
            }
            c if c.is_ascii_alphabetic() => {
                let word = take_while(&mut chars, |c| c.is_ascii_alphanumeric() || c == '_');
                match word.to_ascii_uppercase().as_str() {
                    "AND" => TokenKind::And,
                    "OR" => TokenKind::Or,
                    "NOT" => TokenKind::Not,
                    "IS" => TokenKind::Is,
                    "NULL" => TokenKind::Null,
                    "TRUE" => TokenKind::True,
                    "FALSE" => TokenKind::False,
                    _ => return Err(ExprError::UnexpectedChar { ch, position }),
                }
            }
            _ => return Err(ExprError::UnexpectedChar { ch, position }),
        };

        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

fn take_while(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    pred: impl Fn(char) -> bool,
) -> String {
    let mut out = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !pred(c) {
            break;
        }
        out.push(c);
        chars.next();
    }

    out
}

// Single-quoted literal; a doubled quote escapes one quote.
fn read_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
) -> Result<String, ExprError> {
    let mut out = String::new();
    while let Some((_, c)) = chars.next() {
        if c == '\'' {
            if chars.peek().map(|&(_, c)| c) == Some('\'') {
                chars.next();
                out.push('\'');
                continue;
            }
            return Ok(out);
        }
        out.push(c);
    }

    Err(ExprError::UnterminatedString { position: start })
}
