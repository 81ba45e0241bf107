/// Instruction prepended to queries for BGE-family models.
pub const BGE_QUERY_INSTRUCTION: &str = "Represent this query for retrieving relevant documents: ";

/// Query/passage formatting by model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptFormat {
    Bge,
    E5,
    Plain,
}

impl PromptFormat {
    /// Detect from a model name or directory path (`bge` wins over `e5`).
    pub fn detect(model_name: &str) -> Self {
        let m = model_name.to_lowercase();
        if m.contains("bge") {
            PromptFormat::Bge
        } else if m.contains("e5") {
            PromptFormat::E5
        } else {
            PromptFormat::Plain
        }
    }

    pub fn query(self, text: &str) -> String {
        let text = text.trim();
        match self {
            PromptFormat::Bge => format!("{}{}", BGE_QUERY_INSTRUCTION, text),
            PromptFormat::E5 => format!("query: {}", text),
            PromptFormat::Plain => text.to_string(),
        }
    }

    pub fn passage(self, text: &str) -> String {
        let text = text.trim();
        match self {
            PromptFormat::E5 => format!("passage: {}", text),
            PromptFormat::Bge | PromptFormat::Plain => text.to_string(),
        }
    }
}
