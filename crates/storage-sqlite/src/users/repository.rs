use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use ledgerfolio_core::errors::Result;
use ledgerfolio_core::users::{NewUser, User, UserRepositoryTrait};

use super::model::UserDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::users;

pub struct UserRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl UserRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = User {
            id: new_user.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: new_user.name,
            created_at: Utc::now(),
        };
        let row = UserDB::from(&user);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<User> {
                diesel::insert_into(users::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(user)
            })
            .await
    }

    fn get_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let mut conn = get_connection(&self.pool)?;
        let row = users::table
            .find(user_id)
            .select(UserDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(User::try_from).transpose()?)
    }
}
