//! ResponseParser：从模型原始输出中提取问答列表
//!
//! 纯函数，可直接对字面字符串测试。先去掉一层 ```json / ``` 围栏与首尾空白，
//! 再要求是长度等于问题数的 JSON 数组，每个元素含 question / answer。

use serde_json::Value;

use crate::core::ParseFailure;
use crate::types::Answer;

/// 去掉首尾各一个代码围栏标记及空白
pub fn strip_code_fence(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

/// 解析问答 JSON 数组；元素个数必须等于 expected
pub fn parse_answers(raw: &str, expected: usize) -> Result<Vec<Answer>, ParseFailure> {
    let cleaned = strip_code_fence(raw);
    let value: Value =
        serde_json::from_str(cleaned).map_err(|e| ParseFailure::NotJson(e.to_string()))?;
    let items = value.as_array().ok_or(ParseFailure::NotArray)?;
    if items.len() != expected {
        return Err(ParseFailure::CountMismatch {
            expected,
            actual: items.len(),
        });
    }
    items.iter().enumerate().map(|(i, v)| answer_from(i, v)).collect()
}

fn answer_from(index: usize, value: &Value) -> Result<Answer, ParseFailure> {
    let obj = value.as_object().ok_or_else(|| ParseFailure::BadElement {
        index,
        reason: "not an object".to_string(),
    })?;
    let question = obj
        .get("question")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let answer = match obj.get("answer") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => if *b { "Yes" } else { "No" }.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Null) | None => {
            return Err(ParseFailure::BadElement {
                index,
                reason: "missing answer".to_string(),
            })
        }
        Some(other) => other.to_string(),
    };
    Ok(Answer { question, answer })
}
