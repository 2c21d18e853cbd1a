use sha2::{Digest, Sha256};
use uuid::Uuid;

const PALETTE: [&str; 6] = [
    "#EF4444", "#F59E0B", "#10B981", "#3B82F6", "#8B5CF6", "#EC4899",
];

pub const ANONYMOUS_COLOR: &str = "#000000";

/// Stable display color for a user, identical on every viewer
pub fn user_color(user_id: Option<&str>) -> &'static str {
    match user_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            let digest = Sha256::digest(id.as_bytes());
            PALETTE[digest[0] as usize % PALETTE.len()]
        }
        None => ANONYMOUS_COLOR,
    }
}

/// Placeholder id for a submitter that did not identify itself
pub fn anonymous_user_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("user-{}", &suffix[..9])
}
