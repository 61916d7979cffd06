//! 运行配置
//!
//! 全部来自环境变量。缺失的上游凭证不在启动时报错，
//! 而是推迟到实际调用对应供应商时才暴露。

use std::env;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// 静态客户端所在目录
pub const STATIC_DIR: &str = "public";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: parse_port(env::var("PORT").ok())?,
            openai_api_key: non_empty(env::var("OPENAI_API_KEY").ok()),
            gemini_api_key: non_empty(env::var("GEMINI_API_KEY").ok()),
            static_dir: PathBuf::from(STATIC_DIR),
        })
    }
}

fn parse_port(raw: Option<String>) -> anyhow::Result<u16> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT no válido: {value}")),
        None => Ok(DEFAULT_PORT),
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}
