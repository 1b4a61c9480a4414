use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{task::TaskStatus, workspace_member::WorkspaceRole};

pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

pub fn invitation_email(
    recipient_name: &str,
    recipient_email: &str,
    inviter_name: &str,
    workspace_name: &str,
    role: &WorkspaceRole,
    link: &str,
    expires_at: &NaiveDateTime,
) -> EmailContent {
    let subject = format!("You're invited to join {} on FlowBoard", workspace_name);

    let body = format!(
        r#"Hello {recipient_name},

{inviter_name} has invited you to join the "{workspace_name}" workspace on FlowBoard.

Invitation details:
  Name: {recipient_name}
  Email: {recipient_email}
  Workspace: {workspace_name}
  Role: {role}
  Expires: {expires}

Accept your invitation here:
{link}

If you already have an account, log in and you will be added to the
workspace right away. If not, register with this email address and the
invitation will be applied automatically.

This link can only be used once.

--
The FlowBoard Team"#,
        recipient_name = recipient_name,
        inviter_name = inviter_name,
        workspace_name = workspace_name,
        recipient_email = recipient_email,
        role = role.label(),
        expires = expires_at.format("%B %d, %Y at %I:%M %p"),
        link = link,
    );

    EmailContent { subject, body }
}

pub fn invitation_sms(
    recipient_name: &str,
    inviter_name: &str,
    workspace_name: &str,
    role: &WorkspaceRole,
    link: &str,
    expires_at: &NaiveDateTime,
) -> String {
    format!(
        "Hi {}! {} invited you to join \"{}\" on FlowBoard as {}.\nAccept: {}\nExpires: {}\n- FlowBoard",
        recipient_name,
        inviter_name,
        workspace_name,
        role.label(),
        link,
        expires_at.format("%b %d, %Y"),
    )
}

pub fn assignment_email(
    username: &str,
    task_title: &str,
    project_name: &str,
    workspace_name: &str,
    status: &TaskStatus,
    due_date: Option<NaiveDate>,
    link: &str,
) -> EmailContent {
    let subject = format!("New task assigned to you: {}", task_title);

    let due = match due_date {
        Some(date) => date.format("%B %d, %Y").to_string(),
        None => "Not set".to_string(),
    };

    let body = format!(
        r#"Hello {username},

You have been assigned a new task on FlowBoard.

Task details:
  Title: {task_title}
  Project: {project_name} ({workspace_name})
  Status: {status}
  Due date: {due}

View the task here:
{link}

--
The FlowBoard Team"#,
        username = username,
        task_title = task_title,
        project_name = project_name,
        workspace_name = workspace_name,
        status = status.label(),
        due = due,
        link = link,
    );

    EmailContent { subject, body }
}

pub fn assignment_sms(
    username: &str,
    task_title: &str,
    workspace_name: &str,
    due_date: Option<NaiveDate>,
) -> String {
    let due = match due_date {
        Some(date) => date.format("%b %d, %Y").to_string(),
        None => "Not set".to_string(),
    };

    format!(
        "Hi {}! New task for you on FlowBoard: \"{}\" in {}. Due: {} - FlowBoard",
        username, task_title, workspace_name, due,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn expiry() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 15)
            .unwrap()
            .and_hms_opt(15, 4, 0)
            .unwrap()
    }

    #[test]
    fn test_invitation_email_content() {
        let content = invitation_email(
            "Ama",
            "ama@example.com",
            "Kofi",
            "Design Team",
            &WorkspaceRole::Pm,
            "http://localhost:8000/invitations/tok123/",
            &expiry(),
        );

        assert_eq!(
            content.subject,
            "You're invited to join Design Team on FlowBoard"
        );
        assert!(content.body.contains("Kofi has invited you"));
        assert!(content.body.contains("Role: Project Manager"));
        assert!(content.body.contains("July 15, 2026 at 03:04 PM"));
        assert!(content
            .body
            .contains("http://localhost:8000/invitations/tok123/"));
    }

    #[test]
    fn test_invitation_sms_content() {
        let sms = invitation_sms(
            "Ama",
            "Kofi",
            "Design Team",
            &WorkspaceRole::Member,
            "http://localhost:8000/invitations/tok123/",
            &expiry(),
        );

        assert!(sms.contains("join \"Design Team\""));
        assert!(sms.contains("as Member"));
        assert!(sms.contains("Jul 15, 2026"));
    }

    #[test]
    fn test_assignment_email_without_due_date() {
        let content = assignment_email(
            "kofi",
            "Design review",
            "Website",
            "Design Team",
            &TaskStatus::Todo,
            None,
            "http://localhost:8000/tasks/t1/",
        );

        assert_eq!(content.subject, "New task assigned to you: Design review");
        assert!(content.body.contains("Status: To Do"));
        assert!(content.body.contains("Due date: Not set"));
    }
}
