use serde::Deserialize;
use serde_json::Value;

// Request body for creating a new Todo; `todo` stays untyped so a
// non-string value is reported by validation instead of the extractor
#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoSchema {
    pub todo: Option<Value>,
}

// Request body for editing a Todo
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTodoSchema {
    pub id: Option<i64>,
    pub new_text: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteTodoSchema {
    pub id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadTodoQuery {
    pub skip: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterSchema {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSchema {
    pub login_id: Option<String>,
    pub password: Option<String>,
}
