//! Login sessions and watch-group presence.

use serde::{Deserialize, Serialize};

use crate::core::config::GroupConfig;

/// Passes a member stays highlighted after logging in.
pub const JUST_LOGGED_IN_PASSES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSession {
    pub user: String,
    pub host: String,
}

impl LoginSession {
    pub fn new<U: Into<String>, H: Into<String>>(user: U, host: H) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }

    /// X sessions carry a display (`host:0`) in the host field.
    pub fn is_x_session(&self) -> bool {
        self.host.contains(':')
    }
}

/// Sort sessions by user so per-user runs are adjacent.
pub fn sort_sessions(sessions: &mut [LoginSession]) {
    sessions.sort_by(|a, b| a.user.cmp(&b.user));
}

pub fn is_logged_in(sessions: &[LoginSession], user: &str) -> bool {
    sessions.iter().any(|session| session.user == user)
}

/// Terminal and X login counts, plus how many distinct users hold them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSummary {
    pub tty_logins: usize,
    pub tty_users: usize,
    pub x_logins: usize,
    pub x_users: usize,
}

impl LoginSummary {
    /// `sessions` must be sorted by user.
    pub fn from_sessions(sessions: &[LoginSession]) -> Self {
        let mut summary = Self::default();
        for run in sessions.chunk_by(|a, b| a.user == b.user) {
            let x = run.iter().filter(|s| s.is_x_session()).count();
            let tty = run.len() - x;
            summary.x_logins += x;
            summary.tty_logins += tty;
            if x > 0 {
                summary.x_users += 1;
            }
            if tty > 0 {
                summary.tty_users += 1;
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceStatus {
    NotLoggedIn,
    JustLoggedIn,
    LoggedIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchMember {
    pub id: char,
    pub user: String,
    pub status: PresenceStatus,
    timeout: u32,
}

/// A named set of users whose presence is tracked pass by pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchGroup {
    pub name: String,
    pub members: Vec<WatchMember>,
}

impl WatchGroup {
    pub fn from_config(config: &GroupConfig) -> Self {
        Self {
            name: config.name.clone(),
            members: config
                .members
                .iter()
                .map(|member| WatchMember {
                    id: member.id,
                    user: member.user.clone(),
                    status: PresenceStatus::NotLoggedIn,
                    timeout: 0,
                })
                .collect(),
        }
    }

    pub fn update(&mut self, sessions: &[LoginSession]) {
        for member in &mut self.members {
            if !is_logged_in(sessions, &member.user) {
                member.status = PresenceStatus::NotLoggedIn;
                continue;
            }
            match member.status {
                PresenceStatus::NotLoggedIn => {
                    member.status = PresenceStatus::JustLoggedIn;
                    member.timeout = JUST_LOGGED_IN_PASSES;
                }
                PresenceStatus::JustLoggedIn if member.timeout == 0 => {
                    member.status = PresenceStatus::LoggedIn;
                }
                PresenceStatus::JustLoggedIn => member.timeout -= 1,
                PresenceStatus::LoggedIn => {}
            }
        }
    }
}
