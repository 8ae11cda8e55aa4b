//! User-provider interaction records.
//!
//! Interactions arrive pre-aggregated: one record per `(user, provider, kind)`
//! carrying a repeat count. [`InteractionLog`] performs that aggregation for
//! callers that hold raw events.

use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// The kind of engagement a user had with a provider.
///
/// Kinds outside the known set are preserved verbatim in
/// [`InteractionKind::Other`] so scoring can apply a fallback weight.
///
/// # Examples
/// ```
/// use localpro_core::InteractionKind;
///
/// assert_eq!(InteractionKind::from("hire"), InteractionKind::Hire);
/// assert_eq!(InteractionKind::from("Contact"), InteractionKind::Contact);
/// assert_eq!(
///     InteractionKind::from("share"),
///     InteractionKind::Other("share".into())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "String", into = "String")
)]
pub enum InteractionKind {
    /// Viewed the provider's profile.
    View,
    /// Reached out to the provider.
    Contact,
    /// Marked the provider as a favourite.
    Favorite,
    /// Booked the provider for a job.
    Hire,
    /// Any kind not listed above.
    Other(String),
}

impl InteractionKind {
    /// Return the kind as a lowercase `&str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::View => "view",
            Self::Contact => "contact",
            Self::Favorite => "favorite",
            Self::Hire => "hire",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for InteractionKind {
    fn from(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "view" => Self::View,
            "contact" => Self::Contact,
            "favorite" | "favourite" => Self::Favorite,
            "hire" => Self::Hire,
            _ => Self::Other(raw.to_owned()),
        }
    }
}

impl From<String> for InteractionKind {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<InteractionKind> for String {
    fn from(kind: InteractionKind) -> Self {
        match kind {
            InteractionKind::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated engagement between one user and one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interaction {
    /// User that interacted.
    pub user_id: u64,
    /// Provider the user interacted with.
    pub provider_id: u64,
    /// Kind of engagement.
    #[cfg_attr(feature = "serde", serde(rename = "interaction_type"))]
    pub kind: InteractionKind,
    /// Number of times this engagement happened; at least one.
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "interaction_count",
            default = "one",
            deserialize_with = "positive_count"
        )
    )]
    pub count: u32,
    /// Most recent occurrence, in seconds since the Unix epoch.
    #[cfg_attr(feature = "serde", serde(default))]
    pub last_interaction: u64,
}

#[cfg(feature = "serde")]
const fn one() -> u32 {
    1
}

#[cfg(feature = "serde")]
fn positive_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match u32::deserialize(deserializer)? {
        0 => Err(D::Error::custom("interaction_count must be at least 1")),
        count => Ok(count),
    }
}

impl Interaction {
    /// Construct a single-occurrence interaction.
    #[must_use]
    pub const fn new(
        user_id: u64,
        provider_id: u64,
        kind: InteractionKind,
        last_interaction: u64,
    ) -> Self {
        Self {
            user_id,
            provider_id,
            kind,
            count: 1,
            last_interaction,
        }
    }

    /// Override the repeat count while returning `self` for chaining.
    ///
    /// A zero count is raised to one: a record only exists once the
    /// interaction has happened.
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.max(1);
        self
    }
}

type InteractionKey = (u64, u64, InteractionKind);

/// Collapses raw interaction events into one record per
/// `(user, provider, kind)`.
///
/// # Examples
/// ```
/// use localpro_core::{InteractionKind, InteractionLog};
///
/// let mut log = InteractionLog::new();
/// log.record(1, 10, InteractionKind::View, 100);
/// log.record(1, 10, InteractionKind::View, 250);
/// log.record(1, 10, InteractionKind::Hire, 300);
///
/// assert_eq!(log.len(), 2);
/// let view = &log.as_slice()[0];
/// assert_eq!(view.count, 2);
/// assert_eq!(view.last_interaction, 250);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InteractionLog {
    records: Vec<Interaction>,
    index: HashMap<InteractionKey, usize>,
}

impl InteractionLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence, merging with an existing record when present.
    pub fn record(&mut self, user_id: u64, provider_id: u64, kind: InteractionKind, at: u64) {
        let key = (user_id, provider_id, kind);
        if let Some(existing) = self
            .index
            .get(&key)
            .and_then(|&position| self.records.get_mut(position))
        {
            existing.count = existing.count.saturating_add(1);
            existing.last_interaction = existing.last_interaction.max(at);
            return;
        }
        let (user, provider, kind_owned) = key.clone();
        self.index.insert(key, self.records.len());
        self.records
            .push(Interaction::new(user, provider, kind_owned, at));
    }

    /// Number of distinct `(user, provider, kind)` records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Report whether the log holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow the aggregated records in first-seen order.
    #[must_use]
    pub fn as_slice(&self) -> &[Interaction] {
        &self.records
    }

    /// Consume the log and return the aggregated records.
    #[must_use]
    pub fn into_interactions(self) -> Vec<Interaction> {
        self.records
    }
}
