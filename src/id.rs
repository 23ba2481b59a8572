//! ID generation utilities for deskloop

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a unique task ID
///
/// Format: `task-{timestamp_ms}-{random_hex}`
/// Example: `task-1738300800123-9f3a07c2`
pub fn generate_task_id() -> String {
    let random: u32 = rand::rng().random();
    format!("task-{}-{:08x}", now_ms(), random)
}
