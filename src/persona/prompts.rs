use super::catalog::PersonaProfile;

/// First reply of the tutor persona, sent before any upstream call.
pub const TUTOR_WELCOME: &str =
    "Hello! I'm your tutor and I'm glad you're here. Before we start, what's your name?";

/// Sent when the tutor asked for a name and got something that isn't one.
pub const TUTOR_NAME_REREQUEST: &str =
    "Sorry, I didn't catch that. Could you tell me just your first name, using letters only?";

pub fn tutor_greeting(student_name: &str) -> String {
    format!("Nice to meet you, {student_name}! What would you like to practice today?")
}

/// System turn for the dialogue API.
pub fn system_context(profile: &PersonaProfile, student_name: Option<&str>) -> String {
    let mut context = if profile.prompt.trim().is_empty() {
        format!("You are {}.", profile.display_name)
    } else {
        profile.prompt.trim().to_string()
    };

    if let Some(name) = student_name {
        context.push_str(&format!(
            " The student's name is {name}. Address them by name now and then."
        ));
    }
    context
}
