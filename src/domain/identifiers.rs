use serde::{Deserialize, Serialize};

macro_rules! mailer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

mailer_id!(
    /// Identifier the mailer assigns to a subscriber group.
    GroupId
);
mailer_id!(
    /// Identifier the mailer assigns to a subscriber record.
    SubscriberId
);
mailer_id!(
    /// Identifier the mailer assigns to a campaign draft.
    CampaignId
);
