use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A registered user
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// Always stored trimmed and lowercased
    pub email: String,
    pub password_hash: String,
    pub preferences: PreferenceAggregate,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            preferences: PreferenceAggregate::default(),
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public view of an account, never carries the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Advisory counters of what a user keeps asking for.
///
/// Counters only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceAggregate {
    #[serde(default)]
    pub genres: BTreeMap<String, u64>,
    #[serde(default)]
    pub languages: BTreeMap<String, u64>,
    #[serde(default)]
    pub providers: BTreeMap<String, u64>,
}

impl PreferenceAggregate {
    pub fn record_genre(&mut self, genre: &str) {
        *self.genres.entry(genre.to_string()).or_insert(0) += 1;
    }

    pub fn record_language(&mut self, language: &str) {
        *self.languages.entry(language.to_string()).or_insert(0) += 1;
    }

    pub fn record_provider(&mut self, provider: &str) {
        *self.providers.entry(provider.to_string()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_aggregate_is_empty() {
        let prefs = PreferenceAggregate::default();
        assert!(prefs.genres.is_empty());
        assert!(prefs.languages.is_empty());
        assert!(prefs.providers.is_empty());
    }

    #[test]
    fn test_counters_accumulate() {
        let mut prefs = PreferenceAggregate::default();
        prefs.record_genre("sci-fi");
        prefs.record_genre("sci-fi");
        prefs.record_language("english");
        prefs.record_provider("Netflix");

        assert_eq!(prefs.genres["sci-fi"], 2);
        assert_eq!(prefs.languages["english"], 1);
        assert_eq!(prefs.providers["Netflix"], 1);
    }

    #[test]
    fn test_partial_document_deserializes() {
        let prefs: PreferenceAggregate =
            serde_json::from_str(r#"{"genres": {"drama": 3}}"#).unwrap();
        assert_eq!(prefs.genres["drama"], 3);
        assert!(prefs.providers.is_empty());
    }

    #[test]
    fn test_summary_omits_hash() {
        let account = Account::new("Ana".into(), "ana@x.com".into(), "$2b$10$hash".into());
        let json = serde_json::to_value(account.summary()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ana@x.com");
    }
}
