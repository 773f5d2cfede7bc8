use std::path::Path;

use serde::Deserialize;

use crate::LayoutError;

#[derive(Debug, Deserialize)]
pub struct SourceUnit {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "nodeType")]
pub enum Node {
    ContractDefinition {
        name: String,
        nodes: Vec<Node>,
    },
    VariableDeclaration {
        name: String,
        #[serde(rename = "typeName")]
        type_name: Option<TypeName>,
        #[serde(default)]
        constant: bool,
        #[serde(default)]
        mutability: Option<String>,
    },
    // pragmas, imports, functions, events...
    #[serde(other)]
    Ignored,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "nodeType")]
pub enum TypeName {
    ElementaryTypeName {
        name: String,
    },
    Mapping {
        #[serde(rename = "keyType")]
        key_type: Box<TypeName>,
        #[serde(rename = "valueType")]
        value_type: Box<TypeName>,
    },
    ArrayTypeName {
        #[serde(rename = "baseType")]
        base_type: Box<TypeName>,
        #[serde(default)]
        length: Option<ArrayLength>,
    },
    /// Structs, enums, contract types, function types.
    #[serde(other)]
    UserDefined,
}

#[derive(Debug, Deserialize)]
pub struct ArrayLength {
    value: Option<String>,
}

impl ArrayLength {
    pub fn as_usize(&self) -> Option<usize> {
        self.value.as_ref().and_then(|v| v.parse::<usize>().ok())
    }
}

/// A contract-level variable that occupies storage.
pub struct StateVariable<'a> {
    pub name: &'a str,
    pub type_name: Option<&'a TypeName>,
}

impl SourceUnit {
    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Contract definitions in source order, with their storage variables.
    pub fn contracts(&self) -> impl Iterator<Item = (&str, Vec<StateVariable<'_>>)> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            Node::ContractDefinition { name, nodes } => {
                Some((name.as_str(), state_variables(nodes)))
            }
            _ => None,
        })
    }
}

fn state_variables(nodes: &[Node]) -> Vec<StateVariable<'_>> {
    nodes
        .iter()
        .filter_map(|node| match node {
            Node::VariableDeclaration {
                name,
                type_name,
                constant,
                mutability,
            } => {
                // constants and immutables live in bytecode, not storage
                let in_code = *constant
                    || matches!(mutability.as_deref(), Some("constant" | "immutable"));
                (!in_code).then_some(StateVariable {
                    name: name.as_str(),
                    type_name: type_name.as_ref(),
                })
            }
            _ => None,
        })
        .collect()
}
