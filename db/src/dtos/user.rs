use uuid::Uuid;

/// Identity seen in a validated token, used to create the teacher row on first contact.
pub struct UserProvisionRequest {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub initial_credits: i32,
}
