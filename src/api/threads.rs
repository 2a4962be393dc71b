pub fn thread_endpoint(id: &str) -> String {
    format!("/gmail/v1/users/me/threads/{id}")
}

pub fn modify_endpoint(id: &str) -> String {
    format!("/gmail/v1/users/me/threads/{id}/modify")
}

pub fn trash_endpoint(id: &str) -> String {
    format!("/gmail/v1/users/me/threads/{id}/trash")
}

/// Label state is all a verifying read needs.
pub fn minimal_query() -> Vec<(String, String)> {
    vec![("format".to_string(), "minimal".to_string())]
}
