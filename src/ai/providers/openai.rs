impl_openai_provider!(
    /// OpenAI 提供商
    ///
    /// 默认 URL: https://api.openai.com/v1/chat/completions
    /// 默认 model: gpt-4o-mini
    OpenAIProvider,
    "OpenAI"
);
