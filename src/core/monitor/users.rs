use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use sysinfo::Users;

/// Resolves numeric user ids to account names.
pub trait UserLookup {
    fn user_name(&self, uid: u32) -> Option<String>;

    /// Name for `uid`, or the id itself when no account matches.
    fn display_name(&self, uid: u32) -> String {
        self.user_name(uid).unwrap_or_else(|| uid.to_string())
    }
}

/// Shortest gap between two reloads of the account list.
const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

type AccountLoader = fn() -> HashMap<u32, String>;

#[derive(Debug)]
struct AccountTable {
    names: HashMap<u32, String>,
    loaded_at: Instant,
}

/// Account table from the system user database. A uid with no entry
/// triggers a reload, at most once per refresh interval, so accounts created
/// while the monitor runs get their names.
#[derive(Debug)]
pub struct SystemUsers {
    table: RwLock<AccountTable>,
    loader: AccountLoader,
    refresh_interval: Duration,
}

fn system_accounts() -> HashMap<u32, String> {
    let users = Users::new_with_refreshed_list();
    users
        .list()
        .iter()
        .map(|user| (**user.id(), user.name().to_string()))
        .collect()
}

impl SystemUsers {
    pub fn load() -> Self {
        Self::with_loader(system_accounts, REFRESH_INTERVAL)
    }

    fn with_loader(loader: AccountLoader, refresh_interval: Duration) -> Self {
        let names = loader();
        log::debug!("Loaded {} user accounts", names.len());
        Self {
            table: RwLock::new(AccountTable {
                names,
                loaded_at: Instant::now(),
            }),
            loader,
            refresh_interval,
        }
    }
}

impl UserLookup for SystemUsers {
    fn user_name(&self, uid: u32) -> Option<String> {
        if let Some(name) = self.table.read().names.get(&uid) {
            return Some(name.clone());
        }

        let mut table = self.table.write();
        if table.loaded_at.elapsed() >= self.refresh_interval {
            table.names = (self.loader)();
            table.loaded_at = Instant::now();
            log::debug!(
                "Reloaded {} user accounts after miss on uid {}",
                table.names.len(),
                uid
            );
        }
        table.names.get(&uid).cloned()
    }
}

impl UserLookup for HashMap<u32, String> {
    fn user_name(&self, uid: u32) -> Option<String> {
        self.get(&uid).cloned()
    }
}
