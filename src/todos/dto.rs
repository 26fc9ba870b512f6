use serde::Deserialize;

/// Fields posted by the list and edit forms.
#[derive(Debug, Deserialize)]
pub struct TodoForm {
    pub title: String,
    pub desc: String,
}
