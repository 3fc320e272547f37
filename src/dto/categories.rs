use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<(String, Option<String>), Vec<String>> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(vec!["Category name is required".to_string()]);
        }
        let description = self.description.trim();
        let description = if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        };
        Ok((name.to_string(), description))
    }
}
