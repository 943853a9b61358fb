use tgdrive_config::TelegramConfig;

/// Who sent a message, as far as access control cares.
#[derive(Debug, Clone, Copy)]
pub struct Sender<'a> {
    pub user_id: &'a str,
    pub username: Option<&'a str>,
}

/// Whether the sender may run admin commands.
///
/// An empty admin list means nobody is an admin.
pub fn is_admin(config: &TelegramConfig, sender: Sender<'_>) -> bool {
    !config.admins.is_empty() && matches_any(sender, &config.admins)
}

/// Determine if a message from `sender` should be processed at all.
///
/// Admins always pass. Otherwise an empty allowlist admits everyone.
pub fn check_access(config: &TelegramConfig, sender: Sender<'_>) -> Result<(), AccessDenied> {
    if config.allowlist.is_empty() || is_admin(config, sender) {
        return Ok(());
    }
    if matches_any(sender, &config.allowlist) {
        Ok(())
    } else {
        Err(AccessDenied::NotOnAllowlist)
    }
}

fn matches_any(sender: Sender<'_>, list: &[String]) -> bool {
    is_listed(sender.user_id, list) || sender.username.is_some_and(|u| is_listed(u, list))
}

/// Case-insensitive match against a list of IDs or usernames. Entries may
/// carry a leading `@` and use `*` as a wildcard.
fn is_listed(peer: &str, list: &[String]) -> bool {
    let peer = peer.trim_start_matches('@').to_lowercase();
    list.iter().any(|entry| {
        let pat = entry.trim().trim_start_matches('@').to_lowercase();
        if pat.contains('*') {
            glob_match(&pat, &peer)
        } else {
            pat == peer
        }
    })
}

fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    let last = parts.len() - 1;
    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        match text[pos..].find(part) {
            Some(idx) => {
                if i == 0 && idx != 0 {
                    return false;
                }
                pos += idx + part.len();
            },
            None => return false,
        }
        if i == last && pos != text.len() {
            return text.ends_with(part);
        }
    }
    true
}

/// Reason an inbound message was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    NotOnAllowlist,
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOnAllowlist => write!(f, "user not on allowlist"),
        }
    }
}
