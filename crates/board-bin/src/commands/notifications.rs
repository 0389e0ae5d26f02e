use crate::app::{read_error, BoardApp};
use crate::output;
use clap::Subcommand;
use mutation_orchestrator::{Mutation, MutationOutput};

#[derive(Subcommand)]
pub enum NotificationCommand {
    /// Newest first; unread marked with *
    List,
    /// Mark one notification read
    Read { id: String },
    /// Mark every unread notification read
    ReadAll,
}

pub async fn run(app: &BoardApp, cmd: NotificationCommand) -> anyhow::Result<()> {
    let identity = app.require_identity().await?;
    match cmd {
        NotificationCommand::List => {
            let notifications = app
                .queries
                .notifications(&identity.id)
                .await
                .map_err(read_error)?;
            if notifications.is_empty() {
                println!("No notifications.");
            }
            for n in &notifications {
                println!("{}", output::notification_line(n));
            }
        }
        NotificationCommand::Read { id } => {
            app.mutate(Mutation::MarkNotificationRead { id }).await?;
            println!("Marked as read.");
        }
        NotificationCommand::ReadAll => {
            if let MutationOutput::NotificationsMarked { count } =
                app.mutate(Mutation::MarkAllNotificationsRead).await?
            {
                println!("Marked {} notification(s) as read.", count);
            }
        }
    }
    Ok(())
}
