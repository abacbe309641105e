use super::{clip, print_offline_notice};
use crate::ai::session::{synthetic_index, AssistantSession};
use crate::config::Config;
use crate::error::Result;
use crate::remote::HttpTaskRemote;
use crate::storage::{KeyValueStore, TaskCache};
use crate::sync::{TaskSync, TaskView, ViewFilter};
use crate::task::{NewTask, Task, TaskMeta};
use chrono::Local;
use colored::Colorize;
use prettytable::{format, Table};
use std::sync::Arc;

fn task_sync(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Arc<TaskSync>> {
    let remote = HttpTaskRemote::new(&config.api)?;
    Ok(Arc::new(TaskSync::new(Arc::new(remote), TaskCache::new(store))))
}

/// Print the tasks selected by `filter`
pub async fn list_tasks(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    filter: ViewFilter,
) -> Result<()> {
    let include_archived = filter == ViewFilter::Completed;
    let mut view = TaskView::new(task_sync(config, store.clone())?, filter);
    let mut tasks = view.fetch().await?.to_vec();

    if include_archived {
        tasks.extend(AssistantSession::new(store).completed_ai_tasks_as_tasks()?);
    }

    print_offline_notice(view.is_offline());
    print_tasks(&view.filter().label(), &tasks);
    Ok(())
}

/// Create a task
pub async fn add_task(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    new_task: NewTask,
) -> Result<()> {
    let new_task = NewTask {
        meta: Some(TaskMeta {
            category_key: None,
            creation_language: Some(config.language.code().to_string()),
        }),
        ..new_task
    };

    let mut view = TaskView::new(task_sync(config, store)?, ViewFilter::All);
    let created = view.create(new_task).await?;

    print_offline_notice(view.is_offline());
    println!(
        "{}",
        format!("Added task {}: {}", created.id, created.title).green()
    );
    Ok(())
}

/// Mark a task completed or open again
pub async fn set_completed(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    id: i64,
    completed: bool,
) -> Result<()> {
    let mut view = TaskView::new(task_sync(config, store)?, ViewFilter::All);
    view.complete(id, completed).await?;

    print_offline_notice(view.is_offline());
    let state = if completed { "completed" } else { "open" };
    println!("{}", format!("Task {} marked {}", id, state).green());
    Ok(())
}

/// Delete a task, or an archived conversation when `id` is synthetic
pub async fn remove_task(config: &Config, store: Arc<dyn KeyValueStore>, id: i64) -> Result<()> {
    if let Some(index) = synthetic_index(id) {
        let removed = AssistantSession::new(store).delete_completed_ai_task(index)?;
        println!(
            "{}",
            format!("Deleted archived conversation: {}", removed.title).green()
        );
        return Ok(());
    }

    let mut view = TaskView::new(task_sync(config, store)?, ViewFilter::All);
    view.delete(id).await?;

    print_offline_notice(view.is_offline());
    println!("{}", format!("Deleted task {}", id).green());
    Ok(())
}

fn print_tasks(label: &str, tasks: &[Task]) {
    if tasks.is_empty() {
        println!("{}", format!("No tasks in {} view.", label).yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Due".bold(),
        "Category".bold(),
        "Priority".bold(),
        "Done".bold()
    ]);

    for task in tasks {
        let due = task
            .due_date
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let category = task.category.clone().unwrap_or_else(|| "-".to_string());
        let priority = match task.priority.as_deref() {
            Some("High") => "High".red(),
            Some("Medium") => "Medium".yellow(),
            Some(other) => other.normal(),
            None => "-".normal(),
        };
        let done = if task.completed {
            "yes".green()
        } else {
            "no".normal()
        };

        table.add_row(prettytable::row![
            task.id.to_string().cyan(),
            clip(&task.title, 40),
            due,
            category,
            priority,
            done
        ]);
    }

    println!("\nTasks ({}):", label);
    table.printstd();
    println!();
}
