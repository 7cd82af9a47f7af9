//! `pmtask read-comments`, `pmtask add-comment`

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use pmtask_client::models::{Comment, CommentCreate, Task};
use pmtask_client::ProjectManagerApi;
use pmtask_sync::find_task;

use crate::commands::AppContext;
use crate::output::write_records;

fn task_id(task: &Task) -> Result<Uuid> {
    task.id
        .with_context(|| format!("task '{}' has no id", task.name))
}

#[derive(Args, Debug)]
pub struct ReadCommentsArgs {
    /// Task short id or id.
    #[arg(long)]
    pub task: String,
}

#[derive(Debug, Serialize)]
struct CommentRow {
    id: Option<Uuid>,
    date: Option<DateTime<Utc>>,
    author: Option<String>,
    text: Option<String>,
    /// `name (count)` pairs separated by `; `.
    reactions: String,
}

impl From<&Comment> for CommentRow {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            date: comment.create_date,
            author: comment.author_name.clone(),
            text: comment.text.clone(),
            reactions: comment
                .emoji
                .iter()
                .map(|e| format!("{} ({})", e.name, e.user_ids.len()))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Console rendering of one task's discussion.
fn format_discussion(task: &Task, comments: &[Comment]) -> String {
    let mut out = format!(
        "Task {} ({})\n",
        task.name,
        task.short_id.as_deref().unwrap_or("-")
    );
    if comments.is_empty() {
        out.push_str("No comments.\n");
        return out;
    }
    for comment in comments {
        let date = comment
            .create_date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "On {date} {} wrote:\n  {}\n",
            comment.author_name.as_deref().unwrap_or("someone"),
            comment.text.as_deref().unwrap_or("")
        ));
        for emoji in &comment.emoji {
            out.push_str(&format!("Reaction: {} ({})\n", emoji.name, emoji.user_ids.len()));
        }
    }
    out
}

impl ReadCommentsArgs {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        let client = ctx.connect()?;
        let task = find_task(&client, &self.task)?;
        let comments = client
            .list_task_comments(task_id(&task)?)
            .with_context(|| format!("failed to read comments on '{}'", task.name))?;

        if ctx.format.is_text() {
            print!("{}", format_discussion(&task, &comments));
            return Ok(());
        }
        let rows: Vec<CommentRow> = comments.iter().map(CommentRow::from).collect();
        write_records(ctx.format, &rows, &mut std::io::stdout().lock())
    }
}

#[derive(Args, Debug)]
pub struct AddCommentArgs {
    /// Task short id or id.
    #[arg(long)]
    pub task: String,

    #[arg(long)]
    pub message: String,
}

#[derive(Debug, Serialize)]
struct AddedRow {
    task: String,
    comment_id: Option<Uuid>,
}

impl AddCommentArgs {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        let client = ctx.connect()?;
        let task = find_task(&client, &self.task)?;
        let created = client
            .create_task_comment(task_id(&task)?, &CommentCreate { text: self.message })
            .with_context(|| format!("failed to comment on '{}'", task.name))?;

        if ctx.format.is_text() {
            println!(
                "Added discussion comment {}.",
                created
                    .discussion_comment_id
                    .map(|id| id.to_string())
                    .unwrap_or_default()
            );
            return Ok(());
        }
        let row = AddedRow {
            task: task.name,
            comment_id: created.discussion_comment_id,
        };
        write_records(ctx.format, &[row], &mut std::io::stdout().lock())
    }
}
