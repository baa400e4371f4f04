#[derive(Debug, Clone)]
pub struct SubscriberName(String);

impl SubscriberName {
    /// Any non-blank name is accepted; surrounding whitespace is dropped.
    pub fn parse(s: String) -> Result<Self, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err(format!("'{}' is not a valid subscriber name.", s))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
