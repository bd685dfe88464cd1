//! The user service the generated `UsersvcClient` talks to

use rdao::client::{FileHeader, Result};
use rdao::Context;

use crate::vo::{UserPage, UserQuery, UserVo};

#[rdao::service]
#[allow(async_fn_in_trait)]
pub trait Usersvc {
    /// Look a user up by id
    async fn get_user(
        &self,
        ctx: &Context,
        #[rdao(rename = "userId")] user_id: i64,
    ) -> Result<UserVo>;

    async fn page_users(&self, ctx: &Context, query: UserQuery) -> Result<UserPage>;

    async fn list_scores(
        &self,
        ctx: &Context,
        ids: Vec<i64>,
        name: Option<String>,
    ) -> Result<Vec<i64>>;

    #[rdao(results(code, msg))]
    async fn create_user(&self, ctx: &Context, name: String, age: i32) -> Result<(i32, String)>;

    async fn upload_avatar(
        &self,
        ctx: &Context,
        #[rdao(rename = "userId")] user_id: i64,
        avatar: FileHeader,
    ) -> Result<String>;

    /// Monthly report as a file attachment
    async fn get_report(&self, ctx: &Context, month: String) -> Result<std::fs::File>;

    async fn delete_user(
        &self,
        ctx: &Context,
        #[rdao(rename = "userId")] user_id: i64,
    ) -> Result<()>;
}
