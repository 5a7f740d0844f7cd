//! Syntax tree for weave templates

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Function name used in a call (`share`, `current`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parsed template: a sequence of nodes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
}

/// One element of a template body
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text copied to the output
    Text(String),
    /// `{{ pipeline }}`
    Output(Spanned<Pipeline>),
    /// `{{ if p }} ... {{ else }} ... {{ end }}`
    If(Branch),
    /// `{{ range p }} ... {{ else }} ... {{ end }}`
    Range(Branch),
    /// `{{ with p }} ... {{ else }} ... {{ end }}`
    With(Branch),
}

/// Condition plus the two bodies shared by `if`, `range` and `with`.
///
/// An `{{ else if }}` chain is stored as an else body holding a single
/// nested [`Node::If`].
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub pipeline: Spanned<Pipeline>,
    pub body: Vec<Node>,
    pub else_body: Option<Vec<Node>>,
}

/// `command | command | ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<Spanned<Command>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A bare operand such as `.name` or `"text"`
    Operand(Operand),
    /// A function call: `share "header"`
    Call {
        func: Spanned<Identifier>,
        args: Vec<Spanned<Operand>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `.`
    Dot,
    /// `.a.b.c`, relative to dot
    Field(Vec<String>),
    Literal(Literal),
    /// `( pipeline )`
    Paren(Box<Pipeline>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
}

impl Document {
    /// Visit every function call in the document, including nested bodies
    /// and parenthesised pipelines.
    pub fn for_each_call(&self, f: &mut impl FnMut(&Spanned<Identifier>)) {
        visit_nodes(&self.nodes, f);
    }
}

fn visit_nodes(nodes: &[Node], f: &mut impl FnMut(&Spanned<Identifier>)) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Output(p) => visit_pipeline(&p.node, f),
            Node::If(b) | Node::Range(b) | Node::With(b) => {
                visit_pipeline(&b.pipeline.node, f);
                visit_nodes(&b.body, f);
                if let Some(else_body) = &b.else_body {
                    visit_nodes(else_body, f);
                }
            }
        }
    }
}

fn visit_pipeline(pipeline: &Pipeline, f: &mut impl FnMut(&Spanned<Identifier>)) {
    for cmd in &pipeline.commands {
        match &cmd.node {
            Command::Operand(op) => visit_operand(op, f),
            Command::Call { func, args } => {
                f(func);
                for arg in args {
                    visit_operand(&arg.node, f);
                }
            }
        }
    }
}

fn visit_operand(op: &Operand, f: &mut impl FnMut(&Spanned<Identifier>)) {
    if let Operand::Paren(inner) = op {
        visit_pipeline(inner, f);
    }
}
