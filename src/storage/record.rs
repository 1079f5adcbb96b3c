//! User records and their request/response shapes

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric user identity
pub type Uid = u64;

/// Opaque password credential. Stored, never echoed back.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Fields for a new user
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub name: String,
    pub passwd: Credential,
    pub email: String,
    pub addr: String,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        passwd: impl Into<String>,
        email: impl Into<String>,
        addr: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passwd: Credential::new(passwd),
            email: email.into(),
            addr: addr.into(),
        }
    }
}

/// Partial update of the mutable fields.
///
/// An absent field and an empty string both mean "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateRequest {
    pub email: Option<String>,
    pub addr: Option<String>,
}

impl UpdateRequest {
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = Some(addr.into());
        self
    }
}

/// Publicly visible snapshot of a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserView {
    pub name: String,
    pub email: String,
    pub addr: String,
}

/// Field bundle of one record. Name and credential are fixed after
/// `initialize`; only the crate can reach the fields.
#[derive(Debug, Default)]
pub struct RecordFields {
    pub(crate) uid: Uid,
    pub(crate) name: String,
    pub(crate) passwd: Credential,
    pub(crate) email: String,
    pub(crate) addr: String,
}

impl RecordFields {
    /// Populate a freshly allocated slot. Caller holds the record lock.
    pub(crate) fn initialize(&mut self, uid: Uid, user: NewUser) {
        self.uid = uid;
        self.name = user.name;
        self.passwd = user.passwd;
        self.email = user.email;
        self.addr = user.addr;
    }

    pub fn view(&self) -> UserView {
        UserView {
            name: self.name.clone(),
            email: self.email.clone(),
            addr: self.addr.clone(),
        }
    }

    /// Overwrite only the fields carrying a non-empty value
    pub(crate) fn apply(&mut self, update: &UpdateRequest) {
        if let Some(email) = update.email.as_deref().filter(|s| !s.is_empty()) {
            self.email = email.to_string();
        }
        if let Some(addr) = update.addr.as_deref().filter(|s| !s.is_empty()) {
            self.addr = addr.to_string();
        }
    }
}

/// A record slot with its own exclusive lock
///
/// Fields are reachable from outside the crate only through `read` and
/// `mutate`, so a handed-out slot cannot be used to rename a user:
///
/// ```compile_fail
/// let slab = userdb::storage::SlabAllocator::default();
/// let slot = slab.allocate();
/// slot.lock().name = "mallory".to_string();
/// ```
#[derive(Debug, Default)]
pub struct Record {
    fields: Mutex<RecordFields>,
}

impl Record {
    pub(crate) fn lock(&self) -> MutexGuard<'_, RecordFields> {
        self.fields.lock()
    }

    /// Copy out the visible fields
    pub fn read(&self) -> UserView {
        self.lock().view()
    }

    pub fn mutate(&self, update: &UpdateRequest) {
        self.lock().apply(update);
    }
}
