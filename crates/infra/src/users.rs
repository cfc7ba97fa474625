//! User directory: sign-in and admin-only user management.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use storekeep_auth::{
    BOOTSTRAP_ADMIN, NewUser, PasswordHash, Permission, Principal, Role, User, UserUpdate, authorize,
};
use storekeep_core::{DomainError, position_of};

use crate::ledger::{LedgerError, LedgerResult};
use crate::store::{RecordStore, StorageError};

#[derive(Debug)]
pub struct UserDirectory<S> {
    store: S,
    users: RwLock<Vec<User>>,
    hash_iterations: u32,
    // Checked against for unknown usernames so they cost the same as a real one.
    decoy: PasswordHash,
}

impl<S> UserDirectory<S>
where
    S: RecordStore,
{
    /// Load users. An empty table gets the bootstrap admin with `admin_password`.
    pub fn open(store: S, admin_password: &str, hash_iterations: u32) -> LedgerResult<Self> {
        let mut users: Vec<User> = store.load_all()?;
        if users.is_empty() {
            let admin = User {
                username: BOOTSTRAP_ADMIN.to_string(),
                password: PasswordHash::new(admin_password, hash_iterations),
                full_name: "System Administrator".to_string(),
                role: Role::Admin,
                department: String::new(),
                created_at: Some(Utc::now()),
                created_by: "system".to_string(),
            };
            store.insert(&admin)?;
            info!(username = BOOTSTRAP_ADMIN, "bootstrap admin created");
            users.push(admin);
        }
        Ok(Self {
            store,
            users: RwLock::new(users),
            hash_iterations,
            decoy: PasswordHash::new("storekeep-decoy", hash_iterations),
        })
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, Vec<User>>> {
        self.users
            .read()
            .map_err(|_| StorageError::Lock("user directory".to_string()).into())
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Vec<User>>> {
        self.users
            .write()
            .map_err(|_| StorageError::Lock("user directory".to_string()).into())
    }

    fn position(users: &[User], username: &str) -> LedgerResult<usize> {
        position_of(users, &username.to_string())
            .ok_or_else(|| DomainError::not_found(format!("user {username}")).into())
    }

    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords fail the same way, and take about as
    /// long. Hashing runs under the shared lock; the exclusive lock is taken
    /// only to replace a legacy unsalted hash after a successful check.
    pub fn authenticate(&self, username: &str, password: &str) -> LedgerResult<User> {
        let username = username.trim();
        let user = {
            let users = self.read()?;
            match users.iter().find(|u| u.username == username) {
                Some(u) if u.password.verify(password) => u.clone(),
                Some(_) => return Err(Self::login_failed(username)),
                None => {
                    let _ = self.decoy.verify(password);
                    return Err(Self::login_failed(username));
                }
            }
        };

        let user = if user.password.needs_rehash() {
            self.upgrade_hash(user, password)?
        } else {
            user
        };

        info!(username, role = %user.role, "login");
        Ok(user)
    }

    fn login_failed(username: &str) -> LedgerError {
        warn!(username, "login failed");
        DomainError::InvalidCredentials.into()
    }

    fn upgrade_hash(&self, user: User, password: &str) -> LedgerResult<User> {
        let mut upgraded = user.clone();
        upgraded.password = PasswordHash::new(password, self.hash_iterations);

        let mut users = self.write()?;
        let Some(idx) = position_of(&users, &user.username) else {
            return Ok(user);
        };
        // changed or removed while we were hashing
        if users[idx].password != user.password {
            return Ok(users[idx].clone());
        }
        match self.store.update(&user.username, &upgraded) {
            Ok(()) => {
                users[idx] = upgraded.clone();
                info!(username = %user.username, "legacy password hash upgraded");
                Ok(upgraded)
            }
            Err(e) => {
                warn!(username = %user.username, error = %e, "could not upgrade legacy password hash");
                Ok(user)
            }
        }
    }

    pub fn create_user(&self, actor: &Principal, new: NewUser, now: DateTime<Utc>) -> LedgerResult<User> {
        authorize(actor, Permission::UsersManage).map_err(DomainError::from)?;
        new.validate()?;

        let mut users = self.write()?;
        let username = new.username.trim();
        if users.iter().any(|u| u.username == username) {
            return Err(DomainError::duplicate(format!("user {username} already exists")).into());
        }

        let hash = PasswordHash::new(&new.password, self.hash_iterations);
        let user = User::register(&new, hash, actor.username.clone(), now)?;
        self.store.insert(&user)?;
        users.push(user.clone());
        info!(username = %user.username, role = %user.role, by = %actor.username, "user created");
        Ok(user)
    }

    pub fn update_user(&self, actor: &Principal, username: &str, update: UserUpdate) -> LedgerResult<User> {
        authorize(actor, Permission::UsersManage).map_err(DomainError::from)?;
        update.validate()?;

        let mut users = self.write()?;
        let idx = Self::position(&users, username)?;
        if users[idx].is_bootstrap_admin() && matches!(update.role, Some(r) if r != Role::Admin) {
            return Err(DomainError::forbidden("the bootstrap admin must stay an admin").into());
        }

        let hash = update
            .password
            .as_deref()
            .map(|p| PasswordHash::new(p, self.hash_iterations));
        let mut user = users[idx].clone();
        user.apply_update(&update, hash);
        self.store.update(username, &user)?;
        users[idx] = user.clone();
        info!(username, by = %actor.username, "user updated");
        Ok(user)
    }

    pub fn delete_user(&self, actor: &Principal, username: &str) -> LedgerResult<()> {
        authorize(actor, Permission::UsersManage).map_err(DomainError::from)?;

        let mut users = self.write()?;
        let idx = Self::position(&users, username)?;
        if users[idx].is_bootstrap_admin() {
            return Err(DomainError::forbidden("the bootstrap admin can't be deleted").into());
        }

        self.store.delete::<User>(username)?;
        users.remove(idx);
        info!(username, by = %actor.username, "user deleted");
        Ok(())
    }

    pub fn list_users(&self) -> LedgerResult<Vec<User>> {
        Ok(self.read()?.clone())
    }

    pub fn user(&self, username: &str) -> LedgerResult<User> {
        let users = self.read()?;
        let idx = Self::position(&users, username)?;
        Ok(users[idx].clone())
    }
}
