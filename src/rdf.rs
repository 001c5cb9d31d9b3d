use crate::error::Error;

// https://www.w3.org/TR/n-quads/#terminals
// https://json-ld.github.io/normalization/spec/

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const RDF_JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSet {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Subject,
    pub predicate: Predicate,
    pub object: Object,
    pub graph_label: Option<GraphLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    IRIRef(IRIRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphLabel {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IRIRef(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNodeLabel(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    String {
        string: StringLiteral,
    },
    Typed {
        string: StringLiteral,
        type_: IRIRef,
    },
    LangTagged {
        string: StringLiteral,
        lang: Lang,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringLiteral(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lang(pub String);

/// Position of a blank node within a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Subject,
    Object,
    Graph,
}

impl From<&Statement> for String {
    fn from(statement: &Statement) -> String {
        String::from(&statement.subject)
            + " "
            + &String::from(&statement.predicate)
            + " "
            + &String::from(&statement.object)
            + &match &statement.graph_label {
                Some(graph_label) => " ".to_string() + &String::from(graph_label),
                None => "".to_string(),
            }
            + " .\n"
    }
}

impl From<&Subject> for String {
    fn from(subject: &Subject) -> String {
        match subject {
            Subject::IRIRef(iri_ref) => String::from(iri_ref),
            Subject::BlankNodeLabel(blank_node_label) => String::from(blank_node_label),
        }
    }
}

impl From<&Predicate> for String {
    fn from(predicate: &Predicate) -> String {
        match predicate {
            Predicate::IRIRef(iri_ref) => String::from(iri_ref),
        }
    }
}

impl From<&Object> for String {
    fn from(object: &Object) -> String {
        match object {
            Object::IRIRef(iri_ref) => String::from(iri_ref),
            Object::BlankNodeLabel(blank_node_label) => String::from(blank_node_label),
            Object::Literal(literal) => String::from(literal),
        }
    }
}

impl From<&GraphLabel> for String {
    fn from(graph_label: &GraphLabel) -> String {
        match graph_label {
            GraphLabel::IRIRef(iri_ref) => String::from(iri_ref),
            GraphLabel::BlankNodeLabel(blank_node_label) => String::from(blank_node_label),
        }
    }
}

impl From<&IRIRef> for String {
    fn from(iri_ref: &IRIRef) -> String {
        let string = &iri_ref.0;
        let mut out = String::with_capacity(string.len() + 2);
        out.push('<');
        for c in string.chars() {
            match c {
                '\x00'..='\x20' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                    out.push_str(&format!("\\u{:04X}", u32::from(c)))
                }
                _ => out.push(c),
            }
        }
        out.push('>');
        out
    }
}

impl From<&StringLiteral> for String {
    fn from(string_literal: &StringLiteral) -> String {
        let string = &string_literal.0;
        let mut out = String::with_capacity(string.len() + 2);
        out.push('"');
        for c in string.chars() {
            match c {
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out.push('"');
        out
    }
}

impl From<&BlankNodeLabel> for String {
    fn from(blank_node_label: &BlankNodeLabel) -> String {
        // labels are always generated here, so no escaping
        blank_node_label.0.clone()
    }
}

impl From<&Lang> for String {
    fn from(lang: &Lang) -> String {
        lang.0.clone()
    }
}

impl From<&Literal> for String {
    fn from(literal: &Literal) -> String {
        match literal {
            Literal::String { string } => String::from(string),
            Literal::Typed { string, type_ } => String::from(string) + "^^" + &String::from(type_),
            Literal::LangTagged { string, lang } => {
                String::from(string) + "@" + &String::from(lang)
            }
        }
    }
}

impl Statement {
    /// Blank nodes of this statement, tagged with where they occur.
    pub fn blank_node_components_with_position(&self) -> Vec<(&BlankNodeLabel, Position)> {
        let mut labels = Vec::new();
        if let Subject::BlankNodeLabel(label) = &self.subject {
            labels.push((label, Position::Subject));
        }
        if let Object::BlankNodeLabel(label) = &self.object {
            labels.push((label, Position::Object));
        }
        if let Some(GraphLabel::BlankNodeLabel(label)) = &self.graph_label {
            labels.push((label, Position::Graph));
        }
        labels
    }

    pub fn blank_node_components(&self) -> Vec<&BlankNodeLabel> {
        self.blank_node_components_with_position()
            .into_iter()
            .map(|(label, _)| label)
            .collect()
    }

    pub fn blank_node_components_mut(&mut self) -> Vec<&mut BlankNodeLabel> {
        let mut labels = Vec::new();
        if let Subject::BlankNodeLabel(label) = &mut self.subject {
            labels.push(label);
        }
        if let Object::BlankNodeLabel(label) = &mut self.object {
            labels.push(label);
        }
        if let Some(GraphLabel::BlankNodeLabel(label)) = &mut self.graph_label {
            labels.push(label);
        }
        labels
    }
}

impl DataSet {
    pub fn add_statement(&mut self, statement: Statement) {
        if !self.statements.contains(&statement) {
            self.statements.push(statement);
        }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Serialized statements, one line each (with trailing newline), sorted.
    pub fn to_nquads_lines(&self) -> Vec<String> {
        let mut lines = self
            .statements
            .iter()
            .map(String::from)
            .collect::<Vec<String>>();
        lines.sort();
        lines.dedup();
        lines
    }

    pub fn to_nquads(&self) -> Result<String, Error> {
        Ok(self.to_nquads_lines().join(""))
    }
}
