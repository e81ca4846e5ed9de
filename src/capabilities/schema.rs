//! 能力调用 JSON Schema（schemars 生成），拼入 agent system prompt，减少格式错误

use schemars::{schema_for, JsonSchema};
use serde_json::{Map, Value};

use crate::capabilities::Capability;

/// 能力调用格式：`{"capability": "...", "args": {...}}`（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
struct CapabilityCallFormat {
    /// 能力名
    capability: Capability,
    /// 能力参数；不需要参数时传 {}
    args: Map<String, Value>,
}

pub fn capability_call_schema_json() -> String {
    let schema = schema_for!(CapabilityCallFormat);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names_capabilities() {
        let schema = capability_call_schema_json();
        assert!(schema.contains("\"capability\""));
        assert!(schema.contains("submit_external_application"));
    }
}
