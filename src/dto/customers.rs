use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CustomerStatusForm {
    pub status: String,
}
