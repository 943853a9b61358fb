//! Slash command parsing and reply texts.

use teloxide::types::BotCommand;

use tgdrive_queue::{QueueStatus, StatsSnapshot, stats::BYTES_PER_MEGABYTE};

pub const ADMIN_ONLY: &str = "❌ Admin only command!";
pub const UNSUPPORTED_MEDIA: &str = "❌ Unsupported media type.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Queue,
    Stats,
    Bulk,
    Done,
    ClearQueue,
    /// `None` when the folder argument was left out.
    SetFolder(Option<String>),
    Folder,
}

impl Command {
    /// Whether only configured admins may run this command.
    pub fn admin_only(&self) -> bool {
        matches!(
            self,
            Self::Bulk | Self::Done | Self::ClearQueue | Self::SetFolder(_) | Self::Folder
        )
    }
}

/// Parse `/cmd`, `/cmd args` or `/cmd@botname args`.
///
/// Returns `None` for plain text, unknown commands, and commands addressed
/// to another bot.
pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let rest = text.trim().strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = match head.split_once('@') {
        Some((name, target)) => {
            let ours = bot_username.is_some_and(|u| u.eq_ignore_ascii_case(target));
            if !ours {
                return None;
            }
            name
        },
        None => head,
    };

    let cmd = match name.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "queue" => Command::Queue,
        "stats" => Command::Stats,
        "bulk" => Command::Bulk,
        "done" => Command::Done,
        "clear_queue" => Command::ClearQueue,
        "set_folder" => Command::SetFolder(args.split_whitespace().next().map(str::to_string)),
        "folder" => Command::Folder,
        _ => return None,
    };
    Some(cmd)
}

/// The command list registered with Telegram for autocomplete.
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Show the welcome message"),
        BotCommand::new("help", "How to use the bot"),
        BotCommand::new("queue", "View the upload queue"),
        BotCommand::new("stats", "View upload statistics"),
        BotCommand::new("bulk", "Start collecting forwarded media (admin)"),
        BotCommand::new("done", "Finish bulk collection (admin)"),
        BotCommand::new("clear_queue", "Clear the upload queue (admin)"),
        BotCommand::new("set_folder", "Set the Drive folder (admin)"),
        BotCommand::new("folder", "Show the Drive folder (admin)"),
    ]
}

pub fn welcome_text(first_name: &str, admin: bool) -> String {
    let mut text = format!(
        "👋 Welcome {first_name}!\n\n\
         📤 I can upload media files from Telegram to Google Drive.\n\n\
         Commands:\n\
         /queue - View upload queue\n\
         /stats - View upload statistics\n\
         /help - Show help message\n"
    );
    if admin {
        text.push_str(
            "\nAdmin commands:\n\
             /bulk - Collect forwarded media quietly\n\
             /done - Finish bulk collection\n\
             /clear_queue - Clear the upload queue\n\
             /set_folder <folder_id> - Set Google Drive folder\n\
             /folder - Show the current folder\n",
        );
    }
    text
}

pub fn help_text(max_file_size_mb: u64) -> String {
    format!(
        "📚 How to use:\n\n\
         1️⃣ Send me any media file (document, photo, video, audio, voice)\n\
         2️⃣ I'll add it to the upload queue\n\
         3️⃣ Files are uploaded to Google Drive one at a time\n\n\
         Bulk upload:\n\
         • Use /bulk, then forward messages from a channel or group\n\
         • Send /done when finished\n\n\
         Files up to {max_file_size_mb} MiB are accepted."
    )
}

pub fn queue_text(status: &QueueStatus) -> String {
    if status.length == 0 {
        return "📭 Queue is empty!".to_string();
    }
    let mut text = format!("📊 Upload Queue ({} items)\n\n", status.length);
    for (i, name) in status.preview.iter().enumerate() {
        text.push_str(&format!("{}. {name}\n", i + 1));
    }
    if status.remaining > 0 {
        text.push_str(&format!("\n... and {} more", status.remaining));
    }
    text
}

pub fn stats_text(stats: &StatsSnapshot, queue_length: usize) -> String {
    format!(
        "📊 Upload Statistics\n\n\
         📤 Total uploads: {}\n\
         ✅ Successful: {}\n\
         ❌ Failed: {}\n\
         📈 Success rate: {:.1}%\n\
         💾 Total uploaded: {:.2} MB\n\
         📋 Queue length: {queue_length}",
        stats.total_attempts,
        stats.succeeded,
        stats.failed,
        stats.success_rate * 100.0,
        stats.total_megabytes,
    )
}

pub fn bulk_started_text() -> &'static str {
    "📦 Bulk Upload Mode\n\n\
     Forward me messages from a channel or group, and I'll add all media to the queue.\n\n\
     Send /done when finished."
}

pub fn bulk_finished_text(collected: Option<usize>) -> String {
    match collected {
        Some(n) => format!("📦 Bulk upload finished. {n} items queued."),
        None => "Bulk mode is not active.".to_string(),
    }
}

pub fn cleared_text(count: usize) -> String {
    format!("🗑️ Cleared {count} items from queue.")
}

pub fn set_folder_text(folder: Option<&str>) -> String {
    match folder {
        Some(id) => format!("✅ Set folder ID to: {id}"),
        None => "Usage: /set_folder <folder_id>\n\nGet folder ID from Google Drive URL".to_string(),
    }
}

pub fn folder_text(folder: Option<&str>) -> String {
    match folder {
        Some(id) => format!("📁 Current folder ID: {id}"),
        None => "📁 No folder set, uploads go to the Drive root.".to_string(),
    }
}

pub fn enqueued_text(name: &str, position: usize, size_bytes: Option<u64>) -> String {
    format!(
        "✅ Added to queue!\n📁 File: {name}\n📊 Position: {position}\n💾 Size: {}",
        size_text(size_bytes)
    )
}

pub fn too_large_text(name: &str, size_bytes: u64, limit_mb: u64) -> String {
    format!(
        "❌ {name} is too large ({}). The limit is {limit_mb} MiB.",
        size_text(Some(size_bytes))
    )
}

fn size_text(size_bytes: Option<u64>) -> String {
    match size_bytes {
        Some(bytes) => format!("{:.2} MB", bytes as f64 / BYTES_PER_MEGABYTE),
        None => "unknown".to_string(),
    }
}
