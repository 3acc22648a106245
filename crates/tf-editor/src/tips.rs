//! Advisory tips: a trigger-keyed library plus a single display slot.
//!
//! The library answers "which tips belong to this trigger" and records
//! analyzer findings as new tips. The display holds at most one visible tip
//! and hides it after a fixed duration. Time is supplied by the caller as an
//! offset from session start, so replacing or dismissing a tip simply drops
//! its deadline and nothing can fire twice.

use chrono::{DateTime, Utc};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tf_core::{GapKind, Priority, TipId, ValidationError, ZoneId};

// ─── Triggers ────────────────────────────────────────────────────────────

/// What caused a tip: a zone drop, a new connection, or a detected gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TipTrigger {
    Zone(ZoneId),
    Connection,
    Gap(GapKind),
}

impl TipTrigger {
    /// The trigger key: a zone id, `"connection"`, or a gap type.
    pub fn key(self) -> &'static str {
        match self {
            TipTrigger::Zone(zone) => zone.as_str(),
            TipTrigger::Connection => "connection",
            TipTrigger::Gap(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for TipTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TipTrigger {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "connection" {
            return Ok(TipTrigger::Connection);
        }
        if let Ok(zone) = s.parse::<ZoneId>() {
            return Ok(TipTrigger::Zone(zone));
        }
        GapKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .map(TipTrigger::Gap)
            .ok_or_else(|| ValidationError::UnknownTrigger(s.to_string()))
    }
}

impl From<TipTrigger> for String {
    fn from(trigger: TipTrigger) -> Self {
        trigger.key().to_string()
    }
}

impl TryFrom<String> for TipTrigger {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ─── Tips ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    pub id: TipId,
    pub trigger: TipTrigger,
    pub message: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

const BUILTIN_TIPS: &[(TipTrigger, &str, Priority)] = &[
    (
        TipTrigger::Zone(ZoneId::Operations),
        "Operating businesses carry liability. Keep them separate from the entities that hold your assets.",
        Priority::Medium,
    ),
    (
        TipTrigger::Zone(ZoneId::Assets),
        "Hold each significant asset in its own LLC so one claim cannot reach the others.",
        Priority::High,
    ),
    (
        TipTrigger::Zone(ZoneId::Foundation),
        "A living trust at the foundation can own your LLCs and keep them out of probate.",
        Priority::High,
    ),
    (
        TipTrigger::Zone(ZoneId::Flow),
        "Map how income moves between entities to spot distributions that could be taxed twice.",
        Priority::Low,
    ),
    (
        TipTrigger::Connection,
        "Connections show ownership and income flow. Make sure every LLC traces back to a trust.",
        Priority::Medium,
    ),
    (
        TipTrigger::Gap(GapKind::ExposedAsset),
        "An LLC without a trust owner is exposed. Connect a trust to it.",
        Priority::High,
    ),
    (
        TipTrigger::Gap(GapKind::IncomeOptimization),
        "S-corp elections pay off once profits cover a reasonable salary with room to spare.",
        Priority::Medium,
    ),
];

/// The tips collection.
#[derive(Debug, Clone, Default)]
pub struct TipLibrary {
    tips: Vec<Tip>,
}

impl TipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A library seeded with one built-in tip per trigger.
    pub fn with_defaults() -> Self {
        let now = Utc::now();
        let tips = BUILTIN_TIPS
            .iter()
            .zip(1..)
            .map(|((trigger, message, priority), id)| Tip {
                id: TipId(id),
                trigger: *trigger,
                message: (*message).to_string(),
                priority: *priority,
                created_at: now,
            })
            .collect();
        Self { tips }
    }

    pub fn from_tips(tips: Vec<Tip>) -> Self {
        Self { tips }
    }

    pub fn len(&self) -> usize {
        self.tips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tip> {
        self.tips.iter()
    }

    /// Tips for `trigger`, oldest first.
    pub fn tips_by_trigger(&self, trigger: TipTrigger) -> Vec<&Tip> {
        self.tips.iter().filter(|t| t.trigger == trigger).collect()
    }

    /// The tip shown for `trigger`: the first one registered.
    pub fn first_for(&self, trigger: TipTrigger) -> Option<&Tip> {
        self.tips.iter().find(|t| t.trigger == trigger)
    }

    /// Append a tip with a fresh id (`max + 1`). Tips are never removed from
    /// the library, so an id is never handed out twice.
    pub fn record(
        &mut self,
        trigger: TipTrigger,
        message: impl Into<String>,
        priority: Priority,
    ) -> Result<Tip, ValidationError> {
        let tip = Tip {
            id: TipId::next_after(self.tips.iter().map(|t| t.id))
                .ok_or(ValidationError::IdsExhausted)?,
            trigger,
            message: message.into(),
            priority,
            created_at: Utc::now(),
        };
        log::debug!("record tip {} for `{trigger}`", tip.id.0);
        self.tips.push(tip.clone());
        Ok(tip)
    }

    /// Insert or replace a tip by id. Used when a persisted tip comes back.
    pub fn upsert(&mut self, tip: Tip) {
        match self.tips.iter_mut().find(|t| t.id == tip.id) {
            Some(existing) => *existing = tip,
            None => self.tips.push(tip),
        }
    }
}

// ─── Display slot ────────────────────────────────────────────────────────

/// The tip currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleTip {
    pub tip: Tip,
    /// Screen position the tip points at.
    pub anchor: Point,
    #[serde(skip)]
    pub hide_at: Duration,
}

/// Holds at most one visible tip.
#[derive(Debug, Clone)]
pub struct TipDisplay {
    current: Option<VisibleTip>,
    duration: Duration,
}

impl TipDisplay {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn visible(&self) -> Option<&VisibleTip> {
        self.current.as_ref()
    }

    /// Show `tip`, replacing whatever is visible. The replaced tip's
    /// deadline goes with it.
    pub fn show(&mut self, tip: Tip, anchor: Point, now: Duration) {
        let hide_at = now.saturating_add(self.duration);
        log::trace!("show tip {} until {hide_at:?}", tip.id.0);
        self.current = Some(VisibleTip {
            tip,
            anchor,
            hide_at,
        });
    }

    /// Hide the visible tip. Returns `false` if nothing was shown.
    pub fn dismiss(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Advance time. Returns `true` if the visible tip expired on this call.
    pub fn tick(&mut self, now: Duration) -> bool {
        match &self.current {
            Some(visible) if now >= visible.hide_at => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}
