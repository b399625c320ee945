//! User listing and conference document fixes.

use std::cmp::Ordering;

use serde_json::{Value, json};

use crate::intent::RequestIntent;

/// Sort a user listing by lower-cased first name, then last name.
pub(crate) fn sort_users(doc: &mut Value) {
    let Some(users) = doc.as_array_mut() else {
        return;
    };
    users.sort_by(compare_users);
}

fn compare_users(a: &Value, b: &Value) -> Ordering {
    name_key(a, "first_name")
        .cmp(&name_key(b, "first_name"))
        .then_with(|| name_key(a, "last_name").cmp(&name_key(b, "last_name")))
}

fn name_key(user: &Value, field: &str) -> String {
    user.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

fn is_non_empty_array(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_array)
        .is_some_and(|a| !a.is_empty())
}

/// Move member numbers into `conference_numbers` when the latter is empty.
///
/// Returns the `conference.update` call persisting the fixed document, or
/// `None` when the document needed no change.
pub(crate) fn migrate_conference_numbers(
    request: &RequestIntent,
    doc: &mut Value,
    fallback_account_id: Option<String>,
) -> Option<RequestIntent> {
    let conference = doc.as_object_mut()?;
    let member_numbers = conference.get("member").and_then(|m| m.get("numbers"));
    if !is_non_empty_array(member_numbers) {
        return None;
    }
    if is_non_empty_array(conference.get("conference_numbers")) {
        return None;
    }

    let numbers = conference
        .get_mut("member")
        .and_then(|m| m.get_mut("numbers"))
        .map(|n| std::mem::replace(n, json!([])))?;
    conference.insert("conference_numbers".to_string(), numbers);

    let account_id = request
        .param_str("accountId")
        .map(str::to_string)
        .or(fallback_account_id);
    let conference_id = conference.get("id").cloned().unwrap_or(Value::Null);

    let mut follow_up = RequestIntent::new("conference.update")
        .with_param("accountId", account_id.map_or(Value::Null, Value::String))
        .with_param("conferenceId", conference_id)
        .with_param("data", Value::Object(conference.clone()));
    follow_up.auth_token.clone_from(&request.auth_token);
    follow_up.api_url.clone_from(&request.api_url);
    follow_up.origin.clone_from(&request.origin);
    follow_up.bypass_progress_indicator = request.bypass_progress_indicator;
    Some(follow_up)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_users_case_insensitive() {
        let mut users = json!([
            {"first_name": "bob", "last_name": "Zed"},
            {"first_name": "Alice", "last_name": "Young"},
            {"first_name": "Bob", "last_name": "Adams"},
        ]);
        sort_users(&mut users);
        let names: Vec<_> = users
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["last_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Young", "Adams", "Zed"]);
    }

    #[test]
    fn test_conference_numbers_migrated() {
        let request = RequestIntent::new("conference.get")
            .with_param("accountId", json!("acc-1"))
            .with_origin("conferences");
        let mut doc = json!({
            "id": "conf-1",
            "member": {"numbers": ["1234"]},
            "conference_numbers": [],
        });

        let follow_up = migrate_conference_numbers(&request, &mut doc, None).unwrap();

        assert_eq!(doc["conference_numbers"], json!(["1234"]));
        assert_eq!(doc["member"]["numbers"], json!([]));
        assert_eq!(follow_up.resource, "conference.update");
        assert_eq!(follow_up.param_str("accountId"), Some("acc-1"));
        assert_eq!(follow_up.param_str("conferenceId"), Some("conf-1"));
        assert_eq!(follow_up.origin.as_deref(), Some("conferences"));
        assert_eq!(follow_up.data["data"], doc);
    }

    #[test]
    fn test_conference_untouched_when_numbers_present() {
        let request = RequestIntent::new("conference.get");
        let mut doc = json!({
            "id": "conf-1",
            "member": {"numbers": ["1234"]},
            "conference_numbers": ["5678"],
        });
        let before = doc.clone();
        assert!(migrate_conference_numbers(&request, &mut doc, None).is_none());
        assert_eq!(doc, before);

        let mut no_members = json!({"id": "conf-2", "member": {"numbers": []}});
        assert!(migrate_conference_numbers(&request, &mut no_members, None).is_none());
    }

    #[test]
    fn test_conference_falls_back_to_session_account() {
        let request = RequestIntent::new("conference.get");
        let mut doc = json!({"id": "c", "member": {"numbers": ["1"]}});
        let follow_up =
            migrate_conference_numbers(&request, &mut doc, Some("acc-session".into())).unwrap();
        assert_eq!(follow_up.param_str("accountId"), Some("acc-session"));
    }
}
