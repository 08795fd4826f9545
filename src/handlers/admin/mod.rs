// handlers/admin/mod.rs - Admin console endpoints (/admin/*)
//
// Everything except login runs behind `admin_auth_middleware` and reads the
// caller from `Extension<AdminPrincipal>`.

pub mod content;
pub mod login;
pub mod me;
pub mod sources;
pub mod users;

pub use content::{content_get, content_list, content_status_patch};
pub use login::login_post;
pub use me::me_get;
pub use sources::{source_create, source_delete, source_get, source_run, source_update, sources_list};
pub use users::{user_create, user_delete, user_get, user_reset_password, user_update, users_list};
