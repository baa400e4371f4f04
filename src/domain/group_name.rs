use chrono::{DateTime, Utc};
use rand::{Rng, distr::Alphanumeric};

const SUFFIX_LENGTH: usize = 6;

/// Name of the transient group an invocation enrolls its users into.
///
/// Built from the invocation time (millisecond precision) and a random
/// alphanumeric suffix, so two invocations never share a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupName(String);

impl GroupName {
    pub fn generate(prefix: &str) -> Self {
        Self::generate_at(prefix, Utc::now())
    }

    pub fn generate_at(prefix: &str, now: DateTime<Utc>) -> Self {
        let mut rng = rand::rng();
        let suffix: String = std::iter::repeat_with(|| rng.sample(Alphanumeric))
            .map(char::from)
            .take(SUFFIX_LENGTH)
            .collect();

        Self(format!(
            "{} {}-{}",
            prefix.trim(),
            now.format("%Y%m%d%H%M%S%3f"),
            suffix
        ))
    }
}

impl AsRef<str> for GroupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
