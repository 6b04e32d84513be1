//! Operation document parser.
//!
//! Understands the executable subset the gateway needs: operation
//! definitions (named, anonymous or shorthand), aliases and nested selection
//! sets. Arguments, variable definitions and directives are skipped without
//! interpretation. Fragments are rejected.
//!
//! Parsing is panic-free byte scanning; errors carry a 1-based line/column.

use crate::error::{GqlGateError, Result};

/// Deepest selection-set nesting accepted. Keeps the recursive descent off
/// the end of the stack on hostile input.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }

    /// Root type name used by `__typename` and introspection.
    pub fn root_type(self) -> &'static str {
        match self {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
            OperationKind::Subscription => "Subscription",
        }
    }

    fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "query" => Some(OperationKind::Query),
            "mutation" => Some(OperationKind::Mutation),
            "subscription" => Some(OperationKind::Subscription),
            _ => None,
        }
    }
}

/// A parsed executable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub operations: Vec<OperationDefinition>,
}

impl Document {
    /// Pick the operation to run.
    ///
    /// With a name, the operation must exist. Without one, the document must
    /// contain exactly one operation.
    pub fn operation(&self, name: Option<&str>) -> Result<&OperationDefinition> {
        match name.filter(|n| !n.is_empty()) {
            Some(name) => self
                .operations
                .iter()
                .find(|op| op.name.as_deref() == Some(name))
                .ok_or_else(|| GqlGateError::ValidationFailed(format!("operation {name} not found"))),
            None => match self.operations.as_slice() {
                [op] => Ok(op),
                _ => Err(GqlGateError::ValidationFailed(
                    "operation name is required when the document has several operations".into(),
                )),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDefinition {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub selection_set: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub selection_set: Vec<Field>,
}

impl Field {
    /// Key under which the field's value appears in the response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Parse a document.
pub fn parse(source: &str) -> Result<Document> {
    let mut p = Parser {
        src: source.as_bytes(),
        pos: 0,
        depth: 0,
    };

    let mut operations = Vec::new();
    while p.peek().is_some() {
        operations.push(p.operation()?);
    }

    if operations.is_empty() {
        return Err(p.error("Unexpected <EOF>"));
    }
    if operations.len() > 1 && operations.iter().any(|op| op.name.is_none()) {
        return Err(GqlGateError::ValidationFailed(
            "This anonymous operation must be the only defined operation.".into(),
        ));
    }

    Ok(Document { operations })
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn operation(&mut self) -> Result<OperationDefinition> {
        if self.peek() == Some(b'{') {
            return Ok(OperationDefinition {
                kind: OperationKind::Query,
                name: None,
                selection_set: self.selection_set()?,
            });
        }

        let start = self.pos;
        let keyword = self.name()?;
        let Some(kind) = OperationKind::from_keyword(&keyword) else {
            if keyword == "fragment" {
                return Err(GqlGateError::ValidationFailed(
                    "fragments are not supported".into(),
                ));
            }
            self.pos = start;
            return Err(self.error(&format!("Unexpected Name \"{keyword}\"")));
        };

        let name = match self.peek() {
            Some(b) if is_name_start(b) => Some(self.name()?),
            _ => None,
        };
        if self.peek() == Some(b'(') {
            self.skip_balanced(b'(', b')')?;
        }
        self.directives()?;

        Ok(OperationDefinition {
            kind,
            name,
            selection_set: self.selection_set()?,
        })
    }

    fn selection_set(&mut self) -> Result<Vec<Field>> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("Document exceeds maximum nesting depth"));
        }
        self.depth += 1;
        let fields = self.selections();
        self.depth -= 1;
        fields
    }

    fn selections(&mut self) -> Result<Vec<Field>> {
        self.expect(b'{')?;
        let mut fields = Vec::new();
        loop {
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(b'.') => {
                    return Err(GqlGateError::ValidationFailed(
                        "fragments are not supported".into(),
                    ));
                }
                Some(_) => fields.push(self.field()?),
                None => return Err(self.error("Expected Name, found <EOF>")),
            }
        }
        if fields.is_empty() {
            return Err(self.error("Expected Name, found }"));
        }
        Ok(fields)
    }

    fn field(&mut self) -> Result<Field> {
        let first = self.name()?;
        let (alias, name) = if self.peek() == Some(b':') {
            self.pos += 1;
            (Some(first), self.name()?)
        } else {
            (None, first)
        };

        if self.peek() == Some(b'(') {
            self.skip_balanced(b'(', b')')?;
        }
        self.directives()?;

        let selection_set = if self.peek() == Some(b'{') {
            self.selection_set()?
        } else {
            Vec::new()
        };

        Ok(Field {
            alias,
            name,
            selection_set,
        })
    }

    fn directives(&mut self) -> Result<()> {
        while self.peek() == Some(b'@') {
            self.pos += 1;
            self.name()?;
            if self.peek() == Some(b'(') {
                self.skip_balanced(b'(', b')')?;
            }
        }
        Ok(())
    }

    fn name(&mut self) -> Result<String> {
        let found = self.peek();
        match found {
            Some(b) if is_name_start(b) => {}
            Some(b) => return Err(self.error(&format!("Expected Name, found {}", b as char))),
            None => return Err(self.error("Expected Name, found <EOF>")),
        }
        let start = self.pos;
        while self.pos < self.src.len() && is_name_continue(self.src[self.pos]) {
            self.pos += 1;
        }
        // Name bytes are ASCII by construction.
        Ok(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
    }

    fn expect(&mut self, want: u8) -> Result<()> {
        match self.peek() {
            Some(b) if b == want => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.error(&format!("Expected {}, found {}", want as char, b as char))),
            None => Err(self.error(&format!("Expected {}, found <EOF>", want as char))),
        }
    }

    /// Skip a bracketed region, honouring nesting and string literals.
    fn skip_balanced(&mut self, open: u8, close: u8) -> Result<()> {
        self.expect(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            let Some(b) = self.peek() else {
                return Err(self.error(&format!("Expected {}, found <EOF>", close as char)));
            };
            if b == b'"' {
                self.skip_string()?;
                continue;
            }
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn skip_string(&mut self) -> Result<()> {
        let block = self.src[self.pos..].starts_with(b"\"\"\"");
        if block {
            self.pos += 3;
            while self.pos < self.src.len() {
                if self.src[self.pos..].starts_with(b"\\\"\"\"") {
                    self.pos += 4;
                } else if self.src[self.pos..].starts_with(b"\"\"\"") {
                    self.pos += 3;
                    return Ok(());
                } else {
                    self.pos += 1;
                }
            }
        } else {
            self.pos += 1;
            while self.pos < self.src.len() {
                match self.src[self.pos] {
                    b'\\' => self.pos += 2,
                    b'"' => {
                        self.pos += 1;
                        return Ok(());
                    }
                    b'\n' => break,
                    _ => self.pos += 1,
                }
            }
        }
        Err(self.error("Unterminated string"))
    }

    /// Next significant byte, skipping whitespace, commas and comments.
    fn peek(&mut self) -> Option<u8> {
        while self.pos < self.src.len() {
            match self.src[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' | b',' => self.pos += 1,
                b'#' => {
                    while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                // UTF-8 BOM
                0xEF if self.src[self.pos..].starts_with(&[0xEF, 0xBB, 0xBF]) => self.pos += 3,
                b => return Some(b),
            }
        }
        None
    }

    fn error(&self, message: &str) -> GqlGateError {
        let upto = &self.src[..self.pos.min(self.src.len())];
        let line = upto.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = upto.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        GqlGateError::ParseFailed {
            message: message.to_string(),
            line,
            column: self.pos - line_start + 1,
        }
    }
}

fn is_name_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

fn is_name_continue(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}
