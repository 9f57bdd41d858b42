// ==========================================
// Kamayan 配置层 - 参数值
// ==========================================
// 接受的值类型: 整数 / 浮点 / 字符串 / 布尔
// 本层不做隐式类型转换，类型协调由后端负责
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 单个运行时参数的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
}

impl ParamValue {
    /// 值类型名（用于错误信息）
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Real(_) => "real",
            ParamValue::Str(_) => "string",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            ParamValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// 输入文件中的文本形式
///
/// 浮点数使用最短可回读表示，且总带有 `.` 或指数（`2.0`、`1e300`），
/// 使后端解析器能把它和整数区分开。
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Real(v) => write!(f, "{:?}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Real(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_for_input_file() {
        assert_eq!(ParamValue::from(32).to_string(), "32");
        assert_eq!(ParamValue::from(2.0).to_string(), "2.0");
        assert_eq!(ParamValue::from(0.1).to_string(), "0.1");
        assert_eq!(ParamValue::from(1.0e300).to_string(), "1e300");
        assert_eq!(ParamValue::from(-1.0e300).to_string(), "-1e300");
        assert_eq!(ParamValue::from(true).to_string(), "true");
        assert_eq!(ParamValue::from("wenoz").to_string(), "wenoz");
    }

    #[test]
    fn test_real_text_parses_back() {
        for v in [5.0 / 3.0, 1.0e-7, 0.8, f64::MAX] {
            let text = ParamValue::from(v).to_string();
            assert_eq!(text.parse::<f64>().unwrap(), v);
        }
    }

    #[test]
    fn test_untagged_deserialize_keeps_kind() {
        let values: Vec<ParamValue> = serde_json::from_str(r#"[1, 1.0, "a", false]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ParamValue::Int(1),
                ParamValue::Real(1.0),
                ParamValue::Str("a".to_string()),
                ParamValue::Bool(false),
            ]
        );
    }
}
