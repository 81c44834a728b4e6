use core::str::FromStr;

use serde::{Deserialize, Serialize};

use todolist_auth::Protected;
use todolist_core::{DomainError, DomainResult, Entity, TaskId, UserId};

/// Minimum length of a task name, after trimming.
pub const MIN_TASK_NAME_LEN: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Completed,
    #[default]
    NotCompleted,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::NotCompleted => "NOT_COMPLETED",
        }
    }
}

impl core::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "COMPLETED" => Ok(TaskStatus::Completed),
            // Older records spell it with a space.
            "NOT_COMPLETED" | "NOT COMPLETED" => Ok(TaskStatus::NotCompleted),
            other => Err(DomainError::validation(format!("unknown task status '{other}'"))),
        }
    }
}

/// A task owned by one user and optionally shared with others.
///
/// # Invariants
/// - `owner_id` is always a member of `access`.
/// - `access` holds no duplicates.
/// - `name` is at least [`MIN_TASK_NAME_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    description: Option<String>,
    status: TaskStatus,
    owner_id: UserId,
    access: Vec<UserId>,
}

impl Task {
    /// Create a task owned by `owner_id`, visible only to its owner.
    pub fn new(
        id: TaskId,
        owner_id: UserId,
        name: &str,
        description: Option<&str>,
        status: TaskStatus,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: normalize_name(name)?,
            description: normalize_description(description),
            status,
            owner_id,
            access: vec![owner_id],
        })
    }

    /// Rebuild a task from stored fields, restoring the access-list invariant.
    pub fn from_parts(
        id: TaskId,
        name: String,
        description: Option<String>,
        status: TaskStatus,
        owner_id: UserId,
        access: Vec<UserId>,
    ) -> Self {
        let mut task = Self {
            id,
            name,
            description,
            status,
            owner_id,
            access: vec![owner_id],
        };
        task.share_with(access);
        task
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn access(&self) -> &[UserId] {
        &self.access
    }

    pub fn is_visible_to(&self, user: UserId) -> bool {
        self.owner_id == user || self.access.contains(&user)
    }

    /// Merge the provided fields. Nothing changes if validation fails.
    pub fn apply(&mut self, patch: TaskPatch) -> DomainResult<()> {
        let name = patch.name.as_deref().map(normalize_name).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = normalize_description(Some(&description));
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// Grant read access to `users` (set union, order preserved).
    ///
    /// Returns `true` if the access list grew.
    pub fn share_with(&mut self, users: impl IntoIterator<Item = UserId>) -> bool {
        let before = self.access.len();
        for user in users {
            if !self.access.contains(&user) {
                self.access.push(user);
            }
        }
        self.access.len() != before
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Protected for Task {
    const KIND: &'static str = "task";

    fn owner(&self) -> UserId {
        self.owner_id
    }

    fn readers(&self) -> &[UserId] {
        &self.access
    }
}

/// Partial update of a task. An empty description clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

fn normalize_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.chars().count() < MIN_TASK_NAME_LEN {
        return Err(DomainError::validation(format!(
            "task name must be at least {MIN_TASK_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn task(owner: UserId) -> Task {
        Task::new(TaskId::new(), owner, "Buy milk", Some("2 liters"), TaskStatus::default()).unwrap()
    }

    #[test]
    fn new_task_is_visible_to_owner_only() {
        let owner = UserId::new();
        let t = task(owner);
        assert_eq!(t.access(), &[owner]);
        assert_eq!(t.status(), TaskStatus::NotCompleted);
        assert!(t.is_visible_to(owner));
        assert!(!t.is_visible_to(UserId::new()));
    }

    #[test]
    fn short_names_are_rejected() {
        let err = Task::new(TaskId::new(), UserId::new(), " ab ", None, TaskStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn share_is_a_set_union() {
        let owner = UserId::new();
        let friend = UserId::new();
        let mut t = task(owner);

        assert!(t.share_with([friend]));
        assert_eq!(t.access(), &[owner, friend]);

        assert!(!t.share_with([friend, owner]));
        assert_eq!(t.access(), &[owner, friend]);
    }

    #[test]
    fn from_parts_restores_owner_membership() {
        let owner = UserId::new();
        let other = UserId::new();
        let t = Task::from_parts(
            TaskId::new(),
            "Stored".into(),
            None,
            TaskStatus::Completed,
            owner,
            vec![other, other],
        );
        assert_eq!(t.access(), &[owner, other]);
    }

    #[test]
    fn patch_merges_only_given_fields() {
        let mut t = task(UserId::new());
        t.apply(TaskPatch {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(t.name(), "Buy milk");
        assert_eq!(t.description(), Some("2 liters"));
        assert_eq!(t.status(), TaskStatus::Completed);

        t.apply(TaskPatch {
            description: Some("  ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(t.description(), None);
    }

    #[test]
    fn invalid_patch_leaves_task_unchanged() {
        let mut t = task(UserId::new());
        let before = t.clone();
        assert!(t
            .apply(TaskPatch {
                name: Some("x".into()),
                status: Some(TaskStatus::Completed),
                ..Default::default()
            })
            .is_err());
        assert_eq!(t, before);
    }

    #[test]
    fn status_parses_both_spellings() {
        assert_eq!("NOT COMPLETED".parse::<TaskStatus>().unwrap(), TaskStatus::NotCompleted);
        assert_eq!("NOT_COMPLETED".parse::<TaskStatus>().unwrap(), TaskStatus::NotCompleted);
        assert_eq!(
            serde_json::to_string(&TaskStatus::NotCompleted).unwrap(),
            "\"NOT_COMPLETED\""
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: sharing never drops the owner, never duplicates, and
        /// re-sharing the same ids is a no-op.
        #[test]
        fn sharing_is_idempotent(picks in prop::collection::vec(0usize..6, 0..20)) {
            let owner = UserId::new();
            let pool: Vec<UserId> = (0..6).map(|_| UserId::new()).collect();
            let ids: Vec<UserId> = picks.iter().map(|i| pool[*i]).collect();

            let mut t = task(owner);
            t.share_with(ids.clone());
            let once = t.access().to_vec();

            prop_assert!(!t.share_with(ids));
            prop_assert_eq!(t.access(), once.as_slice());
            prop_assert!(once.contains(&owner));

            let mut dedup = once.clone();
            dedup.sort();
            dedup.dedup();
            prop_assert_eq!(dedup.len(), once.len());
        }
    }
}
