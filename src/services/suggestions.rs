//! Suggestion box.

use std::sync::Arc;
use validator::Validate;

use crate::db::{collections, Db};
use crate::error::Result;
use crate::models::{NewSuggestion, Suggestion};
use crate::services::Clock;

#[derive(Clone)]
pub struct SuggestionService {
    db: Db,
    clock: Arc<dyn Clock>,
}

impl SuggestionService {
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn add(&self, input: NewSuggestion) -> Result<Suggestion> {
        let input = NewSuggestion {
            name: input
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            message: input.message.trim().to_string(),
        };
        input.validate()?;

        let suggestion = Suggestion {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            message: input.message,
            created_at: self.clock.now(),
        };

        self.db
            .update::<Suggestion, _, _>(collections::SUGGESTIONS, |all| {
                all.push(suggestion.clone());
                Ok(())
            })?;

        tracing::info!(id = %suggestion.id, "Suggestion received");
        Ok(suggestion)
    }

    /// Newest first, optionally filtered on name or message.
    pub fn list(&self, search: Option<&str>) -> Vec<Suggestion> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut all: Vec<Suggestion> = self
            .db
            .read::<Suggestion>(collections::SUGGESTIONS)
            .into_iter()
            .filter(|s| {
                needle.as_ref().is_none_or(|n| {
                    s.message.to_lowercase().contains(n)
                        || s.name
                            .as_deref()
                            .is_some_and(|name| name.to_lowercase().contains(n))
                })
            })
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }
}
