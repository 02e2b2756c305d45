//! Route keys handed to the revalidation hook.

use uuid::Uuid;

pub fn question(id: Uuid) -> String {
    format!("/questions/{id}")
}

pub fn profile(user_id: Uuid) -> String {
    format!("/profile/{user_id}")
}
