use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl WorkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkStatus::Todo => "todo",
            WorkStatus::InProgress => "in_progress",
            WorkStatus::Completed => "completed",
        }
    }

    /// Unknown labels are treated as not yet started.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" | "done" => WorkStatus::Completed,
            "in_progress" => WorkStatus::InProgress,
            _ => WorkStatus::Todo,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
        }
    }

    /// Unknown labels never count as completed.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => SessionStatus::Completed,
            "paused" => SessionStatus::Paused,
            _ => SessionStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkSession {
    pub id: String,
    pub subtask_id: String,
    pub user_id: String,
    pub accumulated_seconds: i64,
    pub pause_count: i64,
    pub status: SessionStatus,
}

impl WorkSession {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub work_id: String,
    pub title: String,
    pub position: i64,
    pub completed: bool,
    #[serde(default)]
    pub sessions: Vec<WorkSession>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkLog {
    pub id: String,
    pub work_id: String,
    pub user_id: String,
    pub minutes: i64,
    pub logged_at: DateTime<Utc>,
}

/// A unit of assignable work that earns points once it is completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletableWork {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    #[serde(default)]
    pub collaborator_ids: Vec<String>,
    pub difficulty: i64,
    pub priority: String,
    pub status: WorkStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub quality: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub work_logs: Vec<WorkLog>,
    pub created_at: DateTime<Utc>,
}

impl CompletableWork {
    /// Sessions that count toward bonuses; active and paused ones are skipped.
    pub fn completed_sessions(&self) -> impl Iterator<Item = &WorkSession> {
        self.subtasks
            .iter()
            .flat_map(|subtask| subtask.sessions.iter())
            .filter(|session| session.is_completed())
    }

    /// Distinct collaborators other than the owner, in declaration order.
    pub fn non_owner_collaborators(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for id in &self.collaborator_ids {
            if id != &self.owner_id && !seen.contains(&id.as_str()) {
                seen.push(id.as_str());
            }
        }
        seen
    }
}

/// Lightweight projection of a completed (or overdue) work item used for
/// punctuality figures and daily penalties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkCompletion {
    pub work_id: String,
    pub owner_id: String,
    #[serde(default)]
    pub collaborator_ids: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkCompletion {
    pub fn involves(&self, user_id: &str) -> bool {
        self.owner_id == user_id || self.collaborator_ids.iter().any(|id| id == user_id)
    }
}
