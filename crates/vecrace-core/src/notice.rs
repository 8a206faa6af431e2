use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maximum number of simultaneously visible notices.
pub const MAX_VISIBLE_NOTICES: usize = 3;

/// How long a notice stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NoticeLifetime {
    /// Dismissed automatically once `remaining` runs out.
    Transient { remaining: Duration },
    /// Stays until cleared explicitly (setup errors, the leaderboard).
    Persistent,
}

/// A player-facing message queued for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub text: String,
    pub lifetime: NoticeLifetime,
}

impl Notice {
    pub fn transient(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            lifetime: NoticeLifetime::Transient {
                remaining: duration,
            },
        }
    }

    pub fn persistent(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lifetime: NoticeLifetime::Persistent,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.lifetime, NoticeLifetime::Transient { remaining } if remaining.is_zero())
    }
}

/// Queue managing notice display: a bounded visible list plus overflow.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    visible: Vec<Notice>,
    pending: Vec<Notice>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notice, overflowing into the pending list when the screen is full.
    pub fn push(&mut self, notice: Notice) {
        if self.visible.len() < MAX_VISIBLE_NOTICES {
            self.visible.push(notice);
        } else {
            self.pending.push(notice);
        }
    }

    /// Age transient notices by `dt`, drop the expired ones and promote pending.
    pub fn tick(&mut self, dt: Duration) {
        for notice in &mut self.visible {
            if let NoticeLifetime::Transient { remaining } = &mut notice.lifetime {
                *remaining = remaining.saturating_sub(dt);
            }
        }
        self.visible.retain(|n| !n.is_expired());
        while self.visible.len() < MAX_VISIBLE_NOTICES && !self.pending.is_empty() {
            self.visible.push(self.pending.remove(0));
        }
    }

    /// Drop everything, persistent notices included.
    pub fn clear(&mut self) {
        self.visible.clear();
        self.pending.clear();
    }

    /// Currently visible notices.
    pub fn visible(&self) -> &[Notice] {
        &self.visible
    }

    pub fn has_persistent(&self) -> bool {
        self.visible
            .iter()
            .chain(&self.pending)
            .any(|n| n.lifetime == NoticeLifetime::Persistent)
    }
}
