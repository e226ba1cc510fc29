impl_openai_provider!(
    /// Deepseek 提供商，API 与 OpenAI 兼容
    ///
    /// 默认 URL: https://api.deepseek.com/v1/chat/completions
    /// 默认 model: deepseek-chat
    DeepseekProvider,
    "Deepseek"
);
