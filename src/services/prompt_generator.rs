//! 提示词生成服务 - 业务能力层
//!
//! 把原文段落交给 LLM，换回一条英文视频提示词。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（默认走 Anthropic 的兼容端点）

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, LlmError};
use crate::models::{PromptBatch, PromptRecord};
use crate::utils::logging::truncate_text;

pub const SYSTEM_PROMPT: &str = "You are a film director, anthropologist, and visual historian \
creating cinematic video prompts for Google Veo 3 (fast mode). Your task is to generate 1 prompt \
in English from the provided paragraph.";

/// 文本生成协作方
#[async_trait]
pub trait PromptGenerator: Send + Sync {
    async fn generate(&self, paragraph: &str) -> AppResult<String>;
}

/// 基于 LLM 的提示词生成
pub struct LlmPromptGenerator {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_tokens: u32,
}

impl LlmPromptGenerator {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            max_tokens: config.llm_max_tokens,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl PromptGenerator for LlmPromptGenerator {
    async fn generate(&self, paragraph: &str) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("段落长度: {} 字符", paragraph.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(|e| LlmError::RequestBuild(e.to_string()))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(paragraph)
            .build()
            .map_err(|e| LlmError::RequestBuild(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| LlmError::RequestBuild(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|source| LlmError::ApiCallFailed {
                model: self.model_name.clone(),
                source,
            })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

/// 为选中的段落批量生成提示词
///
/// `indices` 为 1 起的段落编号，`None` 表示全部。越界编号告警后跳过；
/// 单条生成失败记为空提示词，不中断整批。两次调用之间间隔 `pacing`。
pub async fn generate_prompts(
    paragraphs: &[String],
    indices: Option<&[usize]>,
    generator: &dyn PromptGenerator,
    pacing: Duration,
) -> PromptBatch {
    let selected: Vec<usize> = match indices {
        Some(list) => list.to_vec(),
        None => (1..=paragraphs.len()).collect(),
    };
    let total = selected.len();
    let mut batch = PromptBatch::default();

    for (count, idx) in selected.into_iter().enumerate().map(|(i, idx)| (i + 1, idx)) {
        if idx < 1 || idx > paragraphs.len() {
            warn!("段落编号 {} 越界 (共 {} 段)，跳过", idx, paragraphs.len());
            continue;
        }

        info!("处理 {}/{} (第 {} 段)", count, total, idx);
        let paragraph = &paragraphs[idx - 1];
        let prompt = match generator.generate(paragraph).await {
            Ok(prompt) => {
                debug!("✓ 提示词: {}", truncate_text(&prompt, 50));
                prompt
            }
            Err(e) => {
                error!("❌ 第 {} 段生成失败: {}", idx, e);
                String::new()
            }
        };

        batch.records.push(PromptRecord {
            index: idx as u32,
            paragraph: paragraph.clone(),
            prompt,
        });

        if count < total {
            sleep(pacing).await;
        }
    }

    info!("Generated {} prompts", batch.successful());
    batch
}
