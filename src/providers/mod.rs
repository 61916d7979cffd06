//! 上游模型供应商
pub mod gemini;
pub mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use crate::error::ProviderError;
use crate::models::{ModelDescriptor, ProviderKind, Turn};

/// 课程固定的系统提示词，注入到每次上游调用
pub const COURSE_SYSTEM_PROMPT: &str = r#"Eres un asistente del curso "Usos de la IA en el trabajo académico" del Departamento de Economía Aplicada de la Universidad de Murcia.

Tu objetivo es ayudar a estudiantes y personal docente con:
- Diseño de prompts académicos.
- Búsqueda y revisión bibliográfica asistida por IA.
- Redacción, síntesis y mejora de estructura de textos.
- Buenas prácticas de citación, trazabilidad y ética.
- Automatización ligera del flujo de trabajo académico.

Instrucciones importantes:
1) Responde SIEMPRE en español claro y profesional.
2) Prioriza utilidad práctica para economía aplicada y entornos universitarios.
3) Cuando te pidan recomendaciones, ofrece pasos accionables y ejemplos concretos.
4) Si falta información, haz 1-2 preguntas de aclaración al final.
5) No inventes normas institucionales; cuando no estés seguro, indícalo explícitamente."#;

/// 上游返回内容缺失或形状异常时的占位回答
pub const FALLBACK_ANSWER: &str = "No he podido generar respuesta.";

/// 供应商集合，随 AppState 共享
pub struct Providers {
    pub openai: OpenAiProvider,
    pub gemini: GeminiProvider,
}

impl Providers {
    pub fn new(openai_api_key: Option<String>, gemini_api_key: Option<String>) -> Self {
        Self {
            openai: OpenAiProvider::new(openai_api_key),
            gemini: GeminiProvider::new(gemini_api_key),
        }
    }

    /// 按描述符分发到对应的供应商家族
    pub async fn dispatch(
        &self,
        descriptor: &ModelDescriptor,
        question: &str,
        history: &[Turn],
    ) -> Result<String, ProviderError> {
        match descriptor.kind {
            ProviderKind::OpenAi => self.openai.ask(descriptor, question, history).await,
            ProviderKind::Gemini => self.gemini.ask(descriptor, question, history).await,
        }
    }
}
