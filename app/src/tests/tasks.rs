use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;

use crate::{
    models::task::TaskStatus,
    models::user::Model as User,
    repos::{
        projects::ProjectsRepo, sprints::SprintsRepo, subtasks::SubtasksRepo, tasks::TasksRepo,
    },
    tests::common::{create_user, create_workspace, test_db},
};

async fn create_project(db: &DatabaseConnection, workspace_id: &str, owner: &User) -> String {
    let project = ProjectsRepo::new(db.clone())
        .create(
            workspace_id.to_string(),
            "Website Revamp".to_string(),
            None,
            owner.id.clone(),
        )
        .await
        .expect("create project");

    project.id
}

#[tokio::test]
async fn test_task_lifecycle_and_progress_counts() {
    let db = test_db().await;
    let owner = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &owner, "Launch Team").await;
    let project_id = create_project(&db, &workspace.id, &owner).await;
    let tasks_repo = TasksRepo::new(db.clone());

    let task = tasks_repo
        .create(
            project_id.clone(),
            None,
            "Design landing page".to_string(),
            None,
            None,
            owner.id.clone(),
        )
        .await
        .expect("create task");
    assert_eq!(task.status, TaskStatus::Todo);

    let other = tasks_repo
        .create(
            project_id.clone(),
            None,
            "Write copy".to_string(),
            None,
            None,
            owner.id.clone(),
        )
        .await
        .expect("create second task");

    let task = tasks_repo
        .change_status(task, TaskStatus::InProgress)
        .await
        .expect("move to in progress");
    assert_eq!(task.status, TaskStatus::InProgress);
    let task = tasks_repo
        .change_status(task, TaskStatus::Done)
        .await
        .expect("move to done");
    assert_eq!(task.status, TaskStatus::Done);

    assert_eq!(
        tasks_repo
            .count_for_project(&project_id)
            .await
            .expect("count tasks"),
        2
    );
    assert_eq!(
        tasks_repo
            .count_done_for_project(&project_id)
            .await
            .expect("count done"),
        1
    );

    tasks_repo.delete(&other.id).await.expect("delete task");
    assert_eq!(
        tasks_repo
            .count_for_project(&project_id)
            .await
            .expect("count after delete"),
        1
    );
}

#[tokio::test]
async fn test_assign_is_idempotent() {
    let db = test_db().await;
    let owner = create_user(&db, "kwame", "kwame@example.com").await;
    let assignee = create_user(&db, "ama", "ama@example.com").await;
    let workspace = create_workspace(&db, &owner, "Launch Team").await;
    let project_id = create_project(&db, &workspace.id, &owner).await;
    let tasks_repo = TasksRepo::new(db.clone());

    let task = tasks_repo
        .create(
            project_id,
            None,
            "Design landing page".to_string(),
            None,
            None,
            owner.id.clone(),
        )
        .await
        .expect("create task");

    let first = tasks_repo
        .assign(&task.id, &assignee.id)
        .await
        .expect("assign");
    assert!(first.is_some());

    let second = tasks_repo
        .assign(&task.id, &assignee.id)
        .await
        .expect("assign again");
    assert!(second.is_none());

    let assignees = tasks_repo.assignees(&task.id).await.expect("list assignees");
    assert_eq!(assignees.len(), 1);
    assert!(tasks_repo
        .is_assignee(&task.id, &assignee.id)
        .await
        .expect("assignee check"));

    assert!(tasks_repo
        .unassign(&task.id, &assignee.id)
        .await
        .expect("unassign"));
    assert!(!tasks_repo
        .unassign(&task.id, &assignee.id)
        .await
        .expect("unassign again"));
}

#[tokio::test]
async fn test_update_clears_sprint_and_due_date() {
    let db = test_db().await;
    let owner = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &owner, "Launch Team").await;
    let project_id = create_project(&db, &workspace.id, &owner).await;

    let today = Utc::now().date_naive();
    let sprint = SprintsRepo::new(db.clone())
        .create(
            project_id.clone(),
            "Sprint 1".to_string(),
            today,
            today + Duration::days(14),
        )
        .await
        .expect("create sprint");

    let tasks_repo = TasksRepo::new(db.clone());
    let task = tasks_repo
        .create(
            project_id,
            Some(sprint.id.clone()),
            "Design landing page".to_string(),
            None,
            Some(today + Duration::days(3)),
            owner.id.clone(),
        )
        .await
        .expect("create task");
    assert_eq!(task.sprint_id.as_deref(), Some(sprint.id.as_str()));

    let task = tasks_repo
        .update(task, None, None, Some(None), Some(None))
        .await
        .expect("clear sprint and due date");
    assert_eq!(task.sprint_id, None);
    assert_eq!(task.due_date, None);
}

#[tokio::test]
async fn test_subtask_assignee_replacement_reports_added() {
    let db = test_db().await;
    let owner = create_user(&db, "kwame", "kwame@example.com").await;
    let ama = create_user(&db, "ama", "ama@example.com").await;
    let yaw = create_user(&db, "yaw", "yaw@example.com").await;
    let workspace = create_workspace(&db, &owner, "Launch Team").await;
    let project_id = create_project(&db, &workspace.id, &owner).await;

    let task = TasksRepo::new(db.clone())
        .create(
            project_id,
            None,
            "Design landing page".to_string(),
            None,
            None,
            owner.id.clone(),
        )
        .await
        .expect("create task");

    let subtasks_repo = SubtasksRepo::new(db.clone());
    let subtask = subtasks_repo
        .create(
            task.id.clone(),
            "Pick a color palette".to_string(),
            None,
            None,
            owner.id.clone(),
        )
        .await
        .expect("create subtask");

    let added = subtasks_repo
        .set_assignees(&subtask.id, vec![owner.id.clone(), ama.id.clone()])
        .await
        .expect("first assignment");
    assert_eq!(added.len(), 2);

    let added = subtasks_repo
        .set_assignees(&subtask.id, vec![ama.id.clone(), yaw.id.clone()])
        .await
        .expect("replace assignment");
    assert_eq!(added, vec![yaw.id.clone()]);

    let mut current: Vec<String> = subtasks_repo
        .assignees(&subtask.id)
        .await
        .expect("list assignees")
        .into_iter()
        .map(|user| user.id)
        .collect();
    current.sort();
    let mut expected = vec![ama.id.clone(), yaw.id.clone()];
    expected.sort();
    assert_eq!(current, expected);
}

#[tokio::test]
async fn test_overdue_count_skips_done_tasks() {
    let db = test_db().await;
    let owner = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &owner, "Launch Team").await;
    let project_id = create_project(&db, &workspace.id, &owner).await;
    let tasks_repo = TasksRepo::new(db.clone());

    let today = Utc::now().date_naive();
    let yesterday = today - Duration::days(1);

    tasks_repo
        .create(
            project_id.clone(),
            None,
            "Missed deadline".to_string(),
            None,
            Some(yesterday),
            owner.id.clone(),
        )
        .await
        .expect("create overdue task");

    let finished = tasks_repo
        .create(
            project_id.clone(),
            None,
            "Finished late".to_string(),
            None,
            Some(yesterday),
            owner.id.clone(),
        )
        .await
        .expect("create finished task");
    tasks_repo
        .change_status(finished, TaskStatus::Done)
        .await
        .expect("finish task");

    tasks_repo
        .create(
            project_id,
            None,
            "Due tomorrow".to_string(),
            None,
            Some(today + Duration::days(1)),
            owner.id.clone(),
        )
        .await
        .expect("create future task");

    let workspace_ids = vec![workspace.id.clone()];
    assert_eq!(
        tasks_repo
            .count_overdue_in_workspaces(&workspace_ids, today)
            .await
            .expect("count overdue"),
        1
    );
    assert_eq!(
        tasks_repo
            .count_in_workspaces(&workspace_ids, None)
            .await
            .expect("count all"),
        3
    );
    assert_eq!(
        tasks_repo
            .count_in_workspaces(&workspace_ids, Some(TaskStatus::Done))
            .await
            .expect("count done"),
        1
    );
}

#[tokio::test]
async fn test_assigned_to_user_spans_projects() {
    let db = test_db().await;
    let owner = create_user(&db, "kwame", "kwame@example.com").await;
    let assignee = create_user(&db, "ama", "ama@example.com").await;
    let workspace = create_workspace(&db, &owner, "Launch Team").await;
    let tasks_repo = TasksRepo::new(db.clone());

    let first_project = create_project(&db, &workspace.id, &owner).await;
    let second_project = ProjectsRepo::new(db.clone())
        .create(
            workspace.id.clone(),
            "Mobile App".to_string(),
            None,
            owner.id.clone(),
        )
        .await
        .expect("create second project")
        .id;

    let mine = tasks_repo
        .create(
            first_project,
            None,
            "Design landing page".to_string(),
            None,
            None,
            owner.id.clone(),
        )
        .await
        .expect("create first task");
    let also_mine = tasks_repo
        .create(
            second_project,
            None,
            "Sketch onboarding flow".to_string(),
            None,
            None,
            owner.id.clone(),
        )
        .await
        .expect("create second task");

    tasks_repo
        .assign(&mine.id, &assignee.id)
        .await
        .expect("assign first");
    tasks_repo
        .assign(&also_mine.id, &assignee.id)
        .await
        .expect("assign second");

    let assigned = tasks_repo
        .assigned_to_user(&assignee.id)
        .await
        .expect("list assigned");
    assert_eq!(assigned.len(), 2);
    assert!(assigned.iter().all(|(_, project)| project.is_some()));

    let unassigned = tasks_repo
        .assigned_to_user(&owner.id)
        .await
        .expect("list for owner");
    assert!(unassigned.is_empty());
}
