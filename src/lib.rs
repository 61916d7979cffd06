//! 课程聊天机器人 API 代理
//!
//! 将浏览器端的提问转发到 OpenAI / Gemini 上游，注入课程固定的
//! 系统提示词，并对思考模型按会话限额。

pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod server;
pub mod session;
