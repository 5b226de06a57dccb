//! Database model for users.

use diesel::prelude::*;

use ledgerfolio_core::users::User;

use crate::errors::StorageError;
use crate::utils::{parse_timestamp, timestamp_to_text};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserDB {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl TryFrom<UserDB> for User {
    type Error = StorageError;

    fn try_from(db: UserDB) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: parse_timestamp(&db.created_at, "users.created_at")?,
            id: db.id,
            name: db.name,
        })
    }
}

impl From<&User> for UserDB {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            created_at: timestamp_to_text(user.created_at),
        }
    }
}
