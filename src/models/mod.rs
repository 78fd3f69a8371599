//! 数据模型模块
//! 用户、商品以及认证相关的请求/响应结构

pub mod auth;
pub mod product;
pub mod user;

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A stored enum column held a value outside its closed set
#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Overwrite `target` only when the incoming value is present and non-empty.
pub(crate) fn merge_text(target: &mut String, incoming: &Option<String>) {
    if let Some(value) = incoming.as_deref().filter(|v| !v.is_empty()) {
        *target = value.to_string();
    }
}

/// Optional enum field where `null`, a missing field and `""` all mean "not given".
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.is_empty() => {
            value.parse().map(Some).map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}
