use pado_expression::expression_vars;
use serde::{Deserialize, Serialize};

/// Output of compiling one template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledTemplate {
    /// Skeleton markup with directives replaced by marker comments
    pub html: String,
    pub conditions: Vec<ConditionGroup>,
    pub loops: Vec<LoopDefinition>,
    /// Scoped stylesheet attached by the build step, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,
}

impl CompiledTemplate {
    pub fn condition_group(&self, name: &str) -> Option<&ConditionGroup> {
        self.conditions.iter().find(|group| group.group_name == name)
    }

    pub fn loop_definition(&self, name: &str) -> Option<&LoopDefinition> {
        self.loops.iter().find(|def| def.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }
}

/// An if/elseif/else chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    pub group_name: String,
    pub blocks: Vec<Block>,
}

impl ConditionGroup {
    /// Union of the variables referenced by every block condition
    pub fn vars(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        for condition in self.blocks.iter().filter_map(|block| block.condition.as_deref()) {
            for name in expression_vars(condition) {
                if !vars.contains(&name) {
                    vars.push(name);
                }
            }
        }
        vars
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub content: String,
}

impl Block {
    pub fn new(kind: BlockKind, condition: Option<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            condition,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    If,
    Elseif,
    Else,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopDefinition {
    pub name: String,
    pub array_expr: String,
    pub item_name: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_field_names() {
        let template = CompiledTemplate {
            html: "<!-- if:g -->".to_string(),
            conditions: vec![ConditionGroup {
                group_name: "g".to_string(),
                blocks: vec![
                    Block::new(BlockKind::If, Some("a".to_string()), "x"),
                    Block::new(BlockKind::Else, None, "y"),
                ],
            }],
            loops: vec![LoopDefinition {
                name: "l".to_string(),
                array_expr: "items".to_string(),
                item_name: "item".to_string(),
                content: "z".to_string(),
            }],
            styles: None,
        };

        assert_eq!(
            serde_json::to_value(&template).unwrap(),
            json!({
                "html": "<!-- if:g -->",
                "conditions": [{
                    "groupName": "g",
                    "blocks": [
                        {"type": "if", "condition": "a", "content": "x"},
                        {"type": "else", "content": "y"}
                    ]
                }],
                "loops": [{"name": "l", "arrayExpr": "items", "itemName": "item", "content": "z"}]
            })
        );
    }

    #[test]
    fn test_group_vars_union() {
        let group = ConditionGroup {
            group_name: "g".to_string(),
            blocks: vec![
                Block::new(BlockKind::If, Some("n > 0".to_string()), ""),
                Block::new(BlockKind::Elseif, Some("n < min".to_string()), ""),
                Block::new(BlockKind::Else, None, ""),
            ],
        };
        assert_eq!(group.vars(), vec!["n", "min"]);
    }

    #[test]
    fn test_reads_cache_without_styles() {
        let template = CompiledTemplate::from_json(r#"{"html": "<p></p>", "conditions": [], "loops": []}"#).unwrap();
        assert_eq!(template.html, "<p></p>");
        assert!(template.styles.is_none());
    }
}
