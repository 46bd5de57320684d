/// Content of an outbound message, already localized and trimmed to fit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBuilder {
    pub content: Option<String>,
}

impl From<&str> for MessageBuilder {
    fn from(value: &str) -> Self {
        Self {
            content: Some(value.into()),
        }
    }
}
impl From<String> for MessageBuilder {
    fn from(value: String) -> Self {
        Self { content: Some(value) }
    }
}
