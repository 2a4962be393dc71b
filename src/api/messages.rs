pub fn message_endpoint(id: &str) -> String {
    format!("/gmail/v1/users/me/messages/{id}")
}

pub fn trash_endpoint(id: &str) -> String {
    format!("/gmail/v1/users/me/messages/{id}/trash")
}
