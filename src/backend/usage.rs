/// Token usage reported by the model for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUsage {
    /// The model version that served the request
    pub model: String,
    /// Number of tokens in the input/prompt
    pub input_tokens: u64,
    /// Number of tokens in the output/completion
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(model: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            model: model.into(),
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens used (input + output)
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Raw result of a model call: the text payload (possibly empty) and optional usage.
#[derive(Debug, Clone, Default)]
pub struct GenerateResult {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl GenerateResult {
    pub fn new(text: impl Into<String>, usage: Option<TokenUsage>) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }

    /// A result carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_tokens() {
        let usage = TokenUsage::new("gemini-3-flash-preview", 120, 80);
        assert_eq!(usage.total_tokens(), 200);
    }
}
