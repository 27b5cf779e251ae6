//! Structured query building.
//!
//! Turns a normalized query string into a backend-neutral [`StructuredQuery`]:
//! a tree of clauses, each bound either to the entity's default field(s) or to
//! one recognized field prefix. Boolean combination follows the classic Lucene
//! rules (`a AND b` makes both sides required, a bare sequence is a
//! disjunction, `NOT`/`-` prohibit, `+` requires); evaluation is left to the
//! backend.

use std::fmt;

use crate::model::EntityType;

use super::descriptor::EntityDescriptor;
use super::error::QueryError;

/// Which field(s) a term is searched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldBinding {
    /// The descriptor's default field(s).
    Default,
    Field(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Should,
    Must,
    MustNot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    Term { field: FieldBinding, text: String },
    Phrase { field: FieldBinding, text: String },
    /// Term containing `*` or `?`, passed to the backend as a pattern.
    Wildcard { field: FieldBinding, pattern: String },
    Group(Vec<Clause>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub occur: Occur,
    pub node: QueryNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredQuery {
    pub entity: EntityType,
    pub clauses: Vec<Clause>,
}

/// Parse `normalized` against `descriptor`'s field prefixes.
pub fn build(normalized: &str, descriptor: &EntityDescriptor) -> Result<StructuredQuery, QueryError> {
    let tokens = lex(normalized)?;
    if tokens.is_empty() {
        return Err(QueryError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        descriptor,
    };
    let clauses = parser.parse_clauses(FieldBinding::Default, false)?;
    if clauses.is_empty() {
        return Err(QueryError::Empty);
    }
    Ok(StructuredQuery {
        entity: descriptor.entity,
        clauses,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Quoted(String),
    Word(String),
}

fn lex(input: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '"' => {
                chars.next();
                let mut phrase = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(ch) => phrase.push(ch),
                        None => return Err(QueryError::UnbalancedQuotes),
                    }
                }
                tokens.push(Token::Quoted(phrase));
            }
            _ => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '(' | ')' | '"') {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Required,
    Prohibited,
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    descriptor: &'a EntityDescriptor,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn at_clause_end(&self) -> bool {
        match self.peek() {
            None | Some(Token::RParen) => true,
            Some(Token::Word(w)) => w == "AND" || w == "OR",
            _ => false,
        }
    }

    fn parse_clauses(
        &mut self,
        binding: FieldBinding,
        nested: bool,
    ) -> Result<Vec<Clause>, QueryError> {
        let mut clauses: Vec<Clause> = Vec::new();
        let mut conjunction: Option<Conjunction> = None;
        loop {
            match self.peek() {
                None if nested => return Err(QueryError::UnbalancedParens),
                None => break,
                Some(Token::RParen) if nested => {
                    self.pos += 1;
                    break;
                }
                Some(Token::RParen) => return Err(QueryError::UnbalancedParens),
                Some(Token::Word(w)) if w == "AND" || w == "OR" => {
                    if conjunction.is_some() || clauses.is_empty() {
                        return Err(QueryError::Syntax(format!("dangling operator {w}")));
                    }
                    conjunction = Some(if w == "AND" {
                        Conjunction::And
                    } else {
                        Conjunction::Or
                    });
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let modifier = self.parse_modifier()?;
            if let Some(node) = self.parse_atom(binding)? {
                add_clause(&mut clauses, conjunction.take(), modifier, node);
            }
        }
        if let Some(op) = conjunction {
            let op = if op == Conjunction::And { "AND" } else { "OR" };
            return Err(QueryError::Syntax(format!("dangling operator {op}")));
        }
        Ok(clauses)
    }

    fn parse_modifier(&mut self) -> Result<Modifier, QueryError> {
        let Some(Token::Word(word)) = self.peek().cloned() else {
            return Ok(Modifier::None);
        };
        let modifier = match word.as_str() {
            "NOT" | "-" => {
                self.pos += 1;
                Modifier::Prohibited
            }
            "+" => {
                self.pos += 1;
                Modifier::Required
            }
            w if w.len() > 1 && (w.starts_with('+') || w.starts_with('-')) => {
                self.tokens[self.pos] = Token::Word(w[1..].to_string());
                if w.starts_with('+') {
                    Modifier::Required
                } else {
                    Modifier::Prohibited
                }
            }
            _ => return Ok(Modifier::None),
        };
        if self.at_clause_end() {
            return Err(QueryError::Syntax(format!("dangling operator {word}")));
        }
        Ok(modifier)
    }

    fn parse_atom(&mut self, binding: FieldBinding) -> Result<Option<QueryNode>, QueryError> {
        match self.next() {
            Some(Token::LParen) => {
                let clauses = self.parse_clauses(binding, true)?;
                if clauses.is_empty() {
                    return Err(QueryError::Syntax("empty group".to_string()));
                }
                Ok(Some(QueryNode::Group(clauses)))
            }
            Some(Token::Quoted(text)) => Ok(phrase_node(binding, &text)),
            Some(Token::Word(word)) => self.word_atom(binding, &word),
            Some(Token::RParen) => Err(QueryError::UnbalancedParens),
            None => Err(QueryError::Syntax("unexpected end of query".to_string())),
        }
    }

    fn word_atom(
        &mut self,
        binding: FieldBinding,
        word: &str,
    ) -> Result<Option<QueryNode>, QueryError> {
        if let Some((prefix, rest)) = word.split_once(':')
            && let Some(spec) = self.descriptor.field(prefix)
        {
            let bound = FieldBinding::Field(spec.name);
            if !rest.is_empty() {
                return term_node(bound, rest).map(Some);
            }
            return match self.peek() {
                Some(Token::Quoted(_)) | Some(Token::LParen) => self.parse_atom(bound),
                _ => Err(QueryError::Syntax(format!("missing value after {prefix}:"))),
            };
        }
        term_node(binding, word).map(Some)
    }
}

fn add_clause(
    clauses: &mut Vec<Clause>,
    conjunction: Option<Conjunction>,
    modifier: Modifier,
    node: QueryNode,
) {
    if conjunction == Some(Conjunction::And)
        && let Some(last) = clauses.last_mut()
        && last.occur == Occur::Should
    {
        last.occur = Occur::Must;
    }
    let occur = match (conjunction, modifier) {
        (_, Modifier::Prohibited) => Occur::MustNot,
        (_, Modifier::Required) | (Some(Conjunction::And), Modifier::None) => Occur::Must,
        _ => Occur::Should,
    };
    clauses.push(Clause { occur, node });
}

fn term_node(field: FieldBinding, text: &str) -> Result<QueryNode, QueryError> {
    if !text.contains(['*', '?']) {
        return Ok(QueryNode::Term {
            field,
            text: text.to_string(),
        });
    }
    if text.chars().all(|c| c == '*' || c == '?') {
        return Err(QueryError::Syntax(format!("bare wildcard {text}")));
    }
    Ok(QueryNode::Wildcard {
        field,
        pattern: text.to_string(),
    })
}

fn phrase_node(field: FieldBinding, text: &str) -> Option<QueryNode> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(QueryNode::Phrase { field, text })
}

impl fmt::Display for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldBinding::Default => Ok(()),
            FieldBinding::Field(name) => write!(f, "{name}:"),
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term { field, text } => write!(f, "{field}{text}"),
            QueryNode::Phrase { field, text } => write!(f, "{field}\"{text}\""),
            QueryNode::Wildcard { field, pattern } => write!(f, "{field}{pattern}"),
            QueryNode::Group(clauses) => {
                f.write_str("(")?;
                write_clauses(f, clauses)?;
                f.write_str(")")
            }
        }
    }
}

fn write_clauses(f: &mut fmt::Formatter<'_>, clauses: &[Clause]) -> fmt::Result {
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        match clause.occur {
            Occur::Should => {}
            Occur::Must => f.write_str("+")?,
            Occur::MustNot => f.write_str("-")?,
        }
        write!(f, "{}", clause.node)?;
    }
    Ok(())
}

impl fmt::Display for StructuredQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_clauses(f, &self.clauses)
    }
}
