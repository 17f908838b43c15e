use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const TREE_VERSION: u32 = 1;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CommandTree {
    pub version: u32,
    pub base_url: String,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub ops: Vec<Operation>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub method: String,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub params: Vec<ParamDef>,
    pub request_body: Option<RequestBodyDef>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ParamDef {
    /// Name as declared in the document; used on the wire.
    pub param_name: String,
    /// Internal key, `{location}__{flag-base}`.
    pub name: String,
    pub flag: String,
    pub location: String,
    pub required: bool,
    pub schema_type: String,
    pub is_array: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RequestBodyDef {
    pub required: bool,
    pub content_type: String,
    pub schema_type: String,
}

impl CommandTree {
    pub fn find_op(&self, res_name: &str, op_name: &str) -> Option<&Operation> {
        self.resources
            .iter()
            .find(|res| res.name == res_name)
            .and_then(|res| res.ops.iter().find(|op| op.name == op_name))
    }

    /// Renders the tree with two-space indentation and sorted object keys, so
    /// identical input always produces byte-identical output.
    pub fn to_json(&self) -> Result<String> {
        // serde_json's default map is ordered by key.
        let value = serde_json::to_value(self).context("encode command tree")?;
        serde_json::to_string_pretty(&value).context("render command tree")
    }
}

pub fn parse_command_tree(raw: &str) -> Result<CommandTree> {
    serde_json::from_str(raw).context("invalid command_tree.json")
}

pub fn load_command_tree() -> Result<CommandTree> {
    parse_command_tree(include_str!("../schemas/command_tree.json"))
}
