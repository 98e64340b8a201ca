// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin audit log: bounded event recorder and query.

use chrono::{FixedOffset, NaiveDate};
use std::sync::Arc;

use crate::db::{collections, Db, StoreError};
use crate::error::Result;
use crate::models::{AdminLogEntry, AdminLogView, AuditContext, AuditKind};
use crate::services::Clock;
use crate::time_utils::to_local;

/// Filters for reading the audit log.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    /// Case-insensitive substring of the rendered message
    pub search: Option<String>,
    /// First local calendar day to include
    pub from: Option<NaiveDate>,
    /// Last local calendar day to include
    pub to: Option<NaiveDate>,
}

/// Entries kept in `admin_logs`. Older ones are dropped on append.
pub const MAX_LOG_ENTRIES: usize = 10_000;

#[derive(Clone)]
pub struct AuditLog {
    db: Db,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl AuditLog {
    pub fn new(db: Db, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self { db, clock, offset }
    }

    /// Append an event stamped with the current time.
    ///
    /// The log keeps the newest [`MAX_LOG_ENTRIES`] entries. When the
    /// collection would go over the store quota, the oldest half is dropped
    /// until it fits.
    pub fn append(
        &self,
        kind: AuditKind,
        actor: &str,
        context: AuditContext,
    ) -> Result<AdminLogEntry> {
        let entry = AdminLogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            actor: actor.to_string(),
            context,
            timestamp: self.clock.now(),
        };

        let mut logs = self.db.read::<AdminLogEntry>(collections::ADMIN_LOGS);
        logs.push(entry.clone());
        if logs.len() > MAX_LOG_ENTRIES {
            let excess = logs.len() - MAX_LOG_ENTRIES;
            logs.drain(..excess);
        }

        loop {
            match self.db.write(collections::ADMIN_LOGS, &logs) {
                Ok(()) => break,
                Err(StoreError::QuotaExceeded { .. }) if logs.len() > 1 => {
                    let dropped = logs.len() / 2;
                    logs.drain(..dropped);
                    tracing::warn!(dropped, "Audit log over quota, dropping oldest entries");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::debug!(kind = ?entry.kind, actor = %entry.actor, "Audit event recorded");
        Ok(entry)
    }

    /// Record an event for a change that is already stored.
    ///
    /// A failure here is logged and not returned: the change happened, and
    /// the caller must report it as such.
    pub fn record(&self, kind: AuditKind, actor: &str, context: AuditContext) {
        if let Err(e) = self.append(kind, actor, context) {
            tracing::warn!(actor, error = %e, "Failed to record audit event");
        }
    }

    /// Rendered entries matching `query`, newest first.
    pub fn query(&self, query: &LogQuery) -> Vec<AdminLogView> {
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut views: Vec<AdminLogView> = self
            .db
            .read::<AdminLogEntry>(collections::ADMIN_LOGS)
            .into_iter()
            .filter(|entry| {
                let day = to_local(entry.timestamp, self.offset).date();
                query.from.is_none_or(|from| day >= from) && query.to.is_none_or(|to| day <= to)
            })
            .map(|entry| {
                let message = entry.render(self.offset);
                AdminLogView { entry, message }
            })
            .filter(|view| {
                needle
                    .as_ref()
                    .is_none_or(|n| view.message.to_lowercase().contains(n))
            })
            .collect();

        views.sort_by(|a, b| b.entry.timestamp.cmp(&a.entry.timestamp));
        views
    }
}
